//! Formatted result tables for the terminal
//!
//! Pure formatting over the statistics and significance data: a fixed-width
//! summary table, the omnibus block, the pairwise table, and a ranking by
//! descending median. The JSON rendering carries the same data for machine
//! consumption.

use crate::significance::SignificanceReport;
use crate::stats::VariantStats;
use serde::Serialize;
use std::fmt::Write;

/// Combined report payload for JSON output
#[derive(Debug, Serialize)]
struct JsonReport<'a> {
    statistics: &'a [VariantStats],
    tests: &'a SignificanceReport,
}

/// Render the full analysis report as plain text
pub fn render_text(stats: &[VariantStats], tests: &SignificanceReport) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "\n{}", "=".repeat(80));
    let _ = writeln!(out, "BENCHMARK ANALYSIS RESULTS");
    let _ = writeln!(out, "{}", "=".repeat(80));

    out.push_str(&summary_table(stats));
    out.push_str(&omnibus_block(tests));
    out.push_str(&pairwise_table(tests));
    out.push_str(&ranking(stats));

    out
}

/// Render the full analysis report as pretty-printed JSON
pub fn render_json(stats: &[VariantStats], tests: &SignificanceReport) -> String {
    let report = JsonReport {
        statistics: stats,
        tests,
    };
    serde_json::to_string_pretty(&report).unwrap_or_else(|e| format!("{{\"error\": \"{}\"}}", e))
}

/// Per-variant descriptive statistics, one fixed-width row each
fn summary_table(stats: &[VariantStats]) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "\nPERFORMANCE SUMMARY (excluding first run):");
    let _ = writeln!(out, "{}", "-".repeat(70));
    let _ = writeln!(
        out,
        "{:<10} {:<10} {:<10} {:<10} {:<10} {:<10} {:<6}",
        "Variant", "Mean", "Median", "Std Dev", "Min", "Max", "Runs"
    );
    let _ = writeln!(out, "{}", "-".repeat(70));

    for s in stats {
        let _ = writeln!(
            out,
            "{:<10} {:<10.4} {:<10.4} {:<10.4} {:<10.4} {:<10.4} {:<6}",
            s.variant.to_string(),
            s.mean,
            s.median,
            s.std_dev,
            s.min,
            s.max,
            s.count
        );
    }

    out
}

fn omnibus_block(tests: &SignificanceReport) -> String {
    let Some(ref kw) = tests.omnibus else {
        return String::new();
    };

    let mut out = String::new();
    let _ = writeln!(out, "\nKRUSKAL-WALLIS TEST (Non-parametric ANOVA):");
    let _ = writeln!(out, "{}", "-".repeat(50));
    let _ = writeln!(out, "H-statistic: {:.4}", kw.h_statistic);
    let _ = writeln!(out, "P-value: {:.6}", kw.p_value);
    let _ = writeln!(
        out,
        "Significant difference: {} (alpha=0.05)",
        if kw.significant { "YES" } else { "NO" }
    );

    out
}

fn pairwise_table(tests: &SignificanceReport) -> String {
    if tests.pairwise.is_empty() {
        return String::new();
    }

    let mut out = String::new();
    let _ = writeln!(out, "\nPAIRWISE MANN-WHITNEY U TESTS:");
    let _ = writeln!(out, "{}", "-".repeat(50));
    let _ = writeln!(
        out,
        "{:<20} {:<12} {:<12}",
        "Comparison", "P-value", "Significant"
    );
    let _ = writeln!(out, "{}", "-".repeat(50));

    for pair in &tests.pairwise {
        let comparison = format!("{}_vs_{}", pair.first, pair.second);
        let _ = writeln!(
            out,
            "{:<20} {:<12.6} {:<12}",
            comparison,
            pair.p_value,
            if pair.significant { "YES" } else { "NO" }
        );
    }

    out
}

/// Variants ordered by descending median throughput
fn ranking(stats: &[VariantStats]) -> String {
    if stats.len() < 2 {
        return String::new();
    }

    let mut ranked: Vec<&VariantStats> = stats.iter().collect();
    ranked.sort_by(|a, b| {
        b.median
            .partial_cmp(&a.median)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut out = String::new();
    let _ = writeln!(out, "\nPERFORMANCE RANKING (by median):");
    let _ = writeln!(out, "{}", "-".repeat(40));
    for (i, s) in ranked.iter().enumerate() {
        let _ = writeln!(
            out,
            "{}. {:<10} - {:.4} solves/sec",
            i + 1,
            s.variant.to_string(),
            s.median
        );
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collect::VariantSeries;
    use crate::significance::run_tests;
    use crate::stats::summarize_all;
    use crate::variant::Variant;

    fn fixture() -> (Vec<VariantStats>, SignificanceReport) {
        let series = vec![
            VariantSeries::new(Variant::All, vec![9.0, 10.0, 10.1, 10.2, 9.9, 10.05]),
            VariantSeries::new(Variant::Speed, vec![11.0, 12.0, 12.1, 12.2, 11.9, 12.05]),
        ];
        (summarize_all(&series), run_tests(&series))
    }

    #[test]
    fn test_text_report_contains_all_sections() {
        let (stats, tests) = fixture();
        let text = render_text(&stats, &tests);

        assert!(text.contains("BENCHMARK ANALYSIS RESULTS"));
        assert!(text.contains("PERFORMANCE SUMMARY"));
        assert!(text.contains("KRUSKAL-WALLIS TEST"));
        assert!(text.contains("PAIRWISE MANN-WHITNEY U TESTS"));
        assert!(text.contains("PERFORMANCE RANKING"));
    }

    #[test]
    fn test_text_report_lists_variants() {
        let (stats, tests) = fixture();
        let text = render_text(&stats, &tests);
        assert!(text.contains("all"));
        assert!(text.contains("speed"));
        assert!(text.contains("all_vs_speed"));
    }

    #[test]
    fn test_ranking_orders_by_descending_median() {
        let (stats, tests) = fixture();
        let text = render_text(&stats, &tests);
        // speed has the higher median, so it must rank first
        let speed_pos = text.find("1. speed").expect("speed should rank first");
        let all_pos = text.find("2. all").expect("all should rank second");
        assert!(speed_pos < all_pos);
    }

    #[test]
    fn test_omnibus_block_absent_without_result() {
        let (stats, _) = fixture();
        let text = render_text(&stats, &SignificanceReport::default());
        assert!(!text.contains("KRUSKAL-WALLIS TEST"));
        assert!(!text.contains("PAIRWISE"));
    }

    #[test]
    fn test_ranking_absent_for_single_variant() {
        let series = vec![VariantSeries::new(
            Variant::All,
            vec![9.0, 10.0, 10.1, 10.2],
        )];
        let stats = summarize_all(&series);
        let text = render_text(&stats, &SignificanceReport::default());
        assert!(!text.contains("PERFORMANCE RANKING"));
    }

    #[test]
    fn test_json_report_round_trips() {
        let (stats, tests) = fixture();
        let json = render_json(&stats, &tests);
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["statistics"][0]["variant"], "all");
        assert_eq!(value["statistics"][0]["count"], 5);
        assert!(value["tests"]["omnibus"]["p_value"].is_number());
        assert_eq!(value["tests"]["pairwise"][0]["first"], "all");
    }
}
