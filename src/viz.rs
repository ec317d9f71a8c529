//! Chart rendering and CSV summary export
//!
//! Produces the two disk artifacts: `performance_summary.csv` (one row per
//! variant) and `benchmark_analysis.svg`, a 2x2 grid of comparison charts
//! (box plot, density violin, per-run strip plot, mean bar chart). The CSV
//! is written first so the textual artifact survives a chart failure. Any
//! error here is reported to the caller, who treats it as non-fatal.

use crate::collect::VariantSeries;
use crate::stats::{self, VariantStats};
use anyhow::{Context, Result};
use plotters::coord::types::RangedCoordf64;
use plotters::prelude::*;
use rand::{Rng, SeedableRng};
use std::fs;
use std::path::Path;

/// Default artifact directory
pub const DEFAULT_OUTPUT_DIR: &str = "benchmark_results";

const CHART_FILE: &str = "benchmark_analysis.svg";
const SUMMARY_FILE: &str = "performance_summary.csv";

/// Half-width of a category slot used for boxes and bars
const BOX_HALF_WIDTH: f64 = 0.25;

/// Per-variant data prepared for plotting: post-warm-up values plus stats
struct PlotGroup<'a> {
    name: String,
    values: Vec<f64>,
    stats: &'a VariantStats,
}

/// Write the CSV summary and the combined chart image into `output_dir`.
pub fn create_visualizations(
    series: &[VariantSeries],
    stats: &[VariantStats],
    output_dir: &Path,
) -> Result<()> {
    fs::create_dir_all(output_dir)
        .with_context(|| format!("failed to create {}", output_dir.display()))?;

    let csv_path = output_dir.join(SUMMARY_FILE);
    fs::write(&csv_path, summary_csv(stats))
        .with_context(|| format!("failed to write {}", csv_path.display()))?;

    let groups = prepare_groups(series, stats);
    if groups.is_empty() {
        anyhow::bail!("no plottable variant data");
    }

    let chart_path = output_dir.join(CHART_FILE);
    render_charts(&groups, &chart_path)?;

    println!("\nDetailed results saved to {}/", output_dir.display());
    Ok(())
}

/// CSV summary: one row per variant with the full statistics fields
pub fn summary_csv(stats: &[VariantStats]) -> String {
    let mut out = String::from("variant,mean,median,std_dev,min,max,q1,q3,iqr,runs\n");
    for s in stats {
        out.push_str(&format!(
            "{},{:.4},{:.4},{:.4},{:.4},{:.4},{:.4},{:.4},{:.4},{}\n",
            s.variant, s.mean, s.median, s.std_dev, s.min, s.max, s.q1, s.q3, s.iqr, s.count
        ));
    }
    out
}

/// Pair each summarized variant with its post-warm-up values
fn prepare_groups<'a>(series: &[VariantSeries], stats: &'a [VariantStats]) -> Vec<PlotGroup<'a>> {
    stats
        .iter()
        .filter_map(|s| {
            let values = series
                .iter()
                .find(|vs| vs.variant == s.variant)?
                .post_warmup();
            if values.is_empty() {
                return None;
            }
            Some(PlotGroup {
                name: s.variant.to_string(),
                values,
                stats: s,
            })
        })
        .collect()
}

fn plot_err<E: std::fmt::Display>(e: E) -> anyhow::Error {
    anyhow::anyhow!("chart rendering failed: {}", e)
}

/// Render the 2x2 chart grid into one SVG file
fn render_charts(groups: &[PlotGroup<'_>], path: &Path) -> Result<()> {
    let root = SVGBackend::new(path, (1500, 1200)).into_drawing_area();
    root.fill(&WHITE).map_err(plot_err)?;
    let root = root
        .titled(
            "Cubotron Build Variant Performance Analysis",
            ("sans-serif", 30),
        )
        .map_err(plot_err)?;

    let areas = root.split_evenly((2, 2));
    draw_box_plot(&areas[0], groups)?;
    draw_violin_plot(&areas[1], groups)?;
    draw_strip_plot(&areas[2], groups)?;
    draw_mean_bars(&areas[3], groups)?;

    root.present().map_err(plot_err)?;
    Ok(())
}

/// Value range over every group, padded; extra head-room at the bottom
/// leaves space for the category labels drawn inside the plot area.
fn value_range(groups: &[PlotGroup<'_>]) -> (f64, f64) {
    let lo = groups.iter().map(|g| stats::min(&g.values)).fold(f64::MAX, f64::min);
    let hi = groups.iter().map(|g| stats::max(&g.values)).fold(f64::MIN, f64::max);
    let span = if (hi - lo).abs() < f64::EPSILON {
        lo.abs().max(1.0) * 0.1
    } else {
        hi - lo
    };
    (lo - 0.18 * span, hi + 0.08 * span)
}

/// Build an empty chart with the shared category x-axis layout
fn category_chart<'a, 'b>(
    area: &'a DrawingArea<SVGBackend<'b>, plotters::coord::Shift>,
    title: &str,
    n: usize,
    y_lo: f64,
    y_hi: f64,
) -> Result<
    ChartContext<'a, SVGBackend<'b>, Cartesian2d<RangedCoordf64, RangedCoordf64>>,
> {
    let mut chart = ChartBuilder::on(area)
        .caption(title, ("sans-serif", 20))
        .margin(12)
        .x_label_area_size(10)
        .y_label_area_size(60)
        .build_cartesian_2d(0.0..n as f64, y_lo..y_hi)
        .map_err(plot_err)?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(0)
        .y_desc("Solves per Second")
        .label_style(("sans-serif", 13))
        .draw()
        .map_err(plot_err)?;

    Ok(chart)
}

/// Draw the variant names just above the lower edge of the plot area
fn draw_category_labels(
    chart: &mut ChartContext<'_, SVGBackend<'_>, Cartesian2d<RangedCoordf64, RangedCoordf64>>,
    groups: &[PlotGroup<'_>],
    y_lo: f64,
    y_hi: f64,
) -> Result<()> {
    let label_y = y_lo + 0.02 * (y_hi - y_lo);
    chart
        .draw_series(groups.iter().enumerate().map(|(i, g)| {
            Text::new(
                g.name.clone(),
                (i as f64 + 0.35, label_y),
                ("sans-serif", 15),
            )
        }))
        .map_err(plot_err)?;
    Ok(())
}

/// Distribution box plot: IQR box, median line, min/max whiskers
fn draw_box_plot(
    area: &DrawingArea<SVGBackend<'_>, plotters::coord::Shift>,
    groups: &[PlotGroup<'_>],
) -> Result<()> {
    let (y_lo, y_hi) = value_range(groups);
    let mut chart = category_chart(
        area,
        "Performance Distribution by Variant",
        groups.len(),
        y_lo,
        y_hi,
    )?;

    for (i, g) in groups.iter().enumerate() {
        let c = i as f64 + 0.5;
        let s = g.stats;
        let color = Palette99::pick(i);

        // IQR box with median line
        chart
            .draw_series(std::iter::once(Rectangle::new(
                [(c - BOX_HALF_WIDTH, s.q1), (c + BOX_HALF_WIDTH, s.q3)],
                color.mix(0.45).filled(),
            )))
            .map_err(plot_err)?;
        chart
            .draw_series(std::iter::once(Rectangle::new(
                [(c - BOX_HALF_WIDTH, s.q1), (c + BOX_HALF_WIDTH, s.q3)],
                color.stroke_width(1),
            )))
            .map_err(plot_err)?;
        chart
            .draw_series(std::iter::once(PathElement::new(
                vec![(c - BOX_HALF_WIDTH, s.median), (c + BOX_HALF_WIDTH, s.median)],
                BLACK.stroke_width(2),
            )))
            .map_err(plot_err)?;

        // Whiskers with end caps
        for (from, to) in [(s.q3, s.max), (s.q1, s.min)] {
            chart
                .draw_series(std::iter::once(PathElement::new(
                    vec![(c, from), (c, to)],
                    BLACK.stroke_width(1),
                )))
                .map_err(plot_err)?;
            chart
                .draw_series(std::iter::once(PathElement::new(
                    vec![(c - 0.1, to), (c + 0.1, to)],
                    BLACK.stroke_width(1),
                )))
                .map_err(plot_err)?;
        }
    }

    draw_category_labels(&mut chart, groups, y_lo, y_hi)
}

/// Density violin: mirrored gaussian KDE polygon with a median tick
fn draw_violin_plot(
    area: &DrawingArea<SVGBackend<'_>, plotters::coord::Shift>,
    groups: &[PlotGroup<'_>],
) -> Result<()> {
    let (y_lo, y_hi) = value_range(groups);
    let mut chart = category_chart(
        area,
        "Performance Density by Variant",
        groups.len(),
        y_lo,
        y_hi,
    )?;

    for (i, g) in groups.iter().enumerate() {
        let c = i as f64 + 0.5;
        let color = Palette99::pick(i);
        let outline = kde_outline(&g.values, c);

        chart
            .draw_series(std::iter::once(Polygon::new(
                outline.clone(),
                color.mix(0.45).filled(),
            )))
            .map_err(plot_err)?;
        chart
            .draw_series(std::iter::once(PathElement::new(
                outline,
                color.stroke_width(1),
            )))
            .map_err(plot_err)?;
        chart
            .draw_series(std::iter::once(PathElement::new(
                vec![(c - 0.08, g.stats.median), (c + 0.08, g.stats.median)],
                BLACK.stroke_width(2),
            )))
            .map_err(plot_err)?;
    }

    draw_category_labels(&mut chart, groups, y_lo, y_hi)
}

/// Per-run strip plot with deterministic horizontal jitter
fn draw_strip_plot(
    area: &DrawingArea<SVGBackend<'_>, plotters::coord::Shift>,
    groups: &[PlotGroup<'_>],
) -> Result<()> {
    let (y_lo, y_hi) = value_range(groups);
    let mut chart = category_chart(
        area,
        "Individual Run Performance",
        groups.len(),
        y_lo,
        y_hi,
    )?;

    // Seeded so re-runs over the same data produce the same image
    let mut rng = rand::rngs::StdRng::seed_from_u64(42);

    for (i, g) in groups.iter().enumerate() {
        let c = i as f64 + 0.5;
        let color = Palette99::pick(i);
        let points: Vec<(f64, f64)> = g
            .values
            .iter()
            .map(|&v| (c + rng.gen_range(-0.12..0.12), v))
            .collect();

        chart
            .draw_series(
                points
                    .into_iter()
                    .map(|p| Circle::new(p, 4, color.mix(0.7).filled())),
            )
            .map_err(plot_err)?;
    }

    draw_category_labels(&mut chart, groups, y_lo, y_hi)
}

/// Mean throughput bars, ordered by descending mean
fn draw_mean_bars(
    area: &DrawingArea<SVGBackend<'_>, plotters::coord::Shift>,
    groups: &[PlotGroup<'_>],
) -> Result<()> {
    let mut ordered: Vec<&PlotGroup<'_>> = groups.iter().collect();
    ordered.sort_by(|a, b| {
        b.stats
            .mean
            .partial_cmp(&a.stats.mean)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let y_hi = ordered
        .iter()
        .map(|g| g.stats.mean)
        .fold(f64::MIN, f64::max)
        * 1.1;
    let y_hi = if y_hi <= 0.0 { 1.0 } else { y_hi };

    let mut chart = ChartBuilder::on(area)
        .caption("Mean Performance Comparison", ("sans-serif", 20))
        .margin(12)
        .x_label_area_size(10)
        .y_label_area_size(60)
        .build_cartesian_2d(0.0..ordered.len() as f64, 0.0..y_hi)
        .map_err(plot_err)?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(0)
        .y_desc("Solves per Second")
        .label_style(("sans-serif", 13))
        .draw()
        .map_err(plot_err)?;

    for (i, g) in ordered.iter().enumerate() {
        let c = i as f64 + 0.5;
        chart
            .draw_series(std::iter::once(Rectangle::new(
                [(c - 0.3, 0.0), (c + 0.3, g.stats.mean)],
                RGBColor(135, 206, 235).filled(),
            )))
            .map_err(plot_err)?;
        chart
            .draw_series(std::iter::once(Rectangle::new(
                [(c - 0.3, 0.0), (c + 0.3, g.stats.mean)],
                BLACK.stroke_width(1),
            )))
            .map_err(plot_err)?;
        chart
            .draw_series(std::iter::once(Text::new(
                g.name.clone(),
                (c - 0.15, y_hi * 0.03),
                ("sans-serif", 15),
            )))
            .map_err(plot_err)?;
    }

    Ok(())
}

/// Closed outline of a mirrored gaussian KDE around category center `c`
fn kde_outline(values: &[f64], c: f64) -> Vec<(f64, f64)> {
    const POINTS: usize = 48;
    const MAX_HALF_WIDTH: f64 = 0.38;

    let lo = stats::min(values);
    let hi = stats::max(values);
    let mean = stats::mean(values);
    let sd = stats::sample_std_dev(values, mean);
    let iqr = stats::percentile(values, 75.0) - stats::percentile(values, 25.0);

    // Silverman's rule of thumb, with a floor for near-constant data
    let spread = if iqr > 0.0 { sd.min(iqr / 1.34) } else { sd };
    let n = values.len() as f64;
    let mut bandwidth = 0.9 * spread * n.powf(-0.2);
    if bandwidth <= 0.0 {
        bandwidth = (hi - lo).abs().max(mean.abs() * 1e-3).max(1e-9);
    }

    let y_start = lo - 2.5 * bandwidth;
    let y_end = hi + 2.5 * bandwidth;
    let step = (y_end - y_start) / (POINTS - 1) as f64;

    let density: Vec<f64> = (0..POINTS)
        .map(|i| {
            let y = y_start + i as f64 * step;
            values
                .iter()
                .map(|&v| {
                    let z = (y - v) / bandwidth;
                    (-0.5 * z * z).exp()
                })
                .sum::<f64>()
        })
        .collect();
    let peak = density.iter().copied().fold(f64::MIN, f64::max).max(1e-12);

    // Right side top-to-bottom, then mirrored left side bottom-to-top
    let mut outline = Vec::with_capacity(POINTS * 2);
    for i in 0..POINTS {
        let y = y_start + i as f64 * step;
        outline.push((c + MAX_HALF_WIDTH * density[i] / peak, y));
    }
    for i in (0..POINTS).rev() {
        let y = y_start + i as f64 * step;
        outline.push((c - MAX_HALF_WIDTH * density[i] / peak, y));
    }
    outline
}
