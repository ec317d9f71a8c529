use anyhow::Result;
use clap::Parser;
use medir::cli::{Cli, OutputFormat};
use medir::collect::{self, CollectorConfig};
use medir::command::CommandRunner;
use medir::variant::Variant;
use medir::{report, significance, stats, viz};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Initialize tracing subscriber for diagnostic output
fn init_tracing(debug: bool) {
    let default_level = if debug { "medir=trace" } else { "medir=info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let args = Cli::parse();

    if args.runs < collect::MIN_SUCCESSFUL_RUNS {
        anyhow::bail!(
            "Invalid value for --runs: {} (must be >= {})",
            args.runs,
            collect::MIN_SUCCESSFUL_RUNS
        );
    }

    init_tracing(args.debug);

    let variants = Variant::ALL;
    println!("Cubotron Build Variant Benchmark Analysis");
    println!("{}", "=".repeat(50));
    println!(
        "Testing variants: {}",
        variants
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    );
    println!(
        "Runs per variant: {} (first run discarded as warmup)",
        args.runs
    );
    println!("Total expected runs: {}", variants.len() * args.runs);

    let runner = CommandRunner::new(Duration::from_secs(args.timeout_secs));
    let config = CollectorConfig {
        runs_per_variant: args.runs,
        ..CollectorConfig::default()
    };

    println!("\nStarting data collection...");
    let series = collect::collect_benchmark_data(&runner, &variants, &config);

    if series.is_empty() {
        anyhow::bail!("No data collected. Exiting.");
    }

    println!("\nCalculating statistics...");
    let stats = stats::summarize_all(&series);

    println!("Performing statistical tests...");
    let tests = significance::run_tests(&series);

    match args.format {
        OutputFormat::Text => print!("{}", report::render_text(&stats, &tests)),
        OutputFormat::Json => println!("{}", report::render_json(&stats, &tests)),
    }

    if !args.no_viz {
        println!("\nCreating visualizations...");
        // Chart failures never invalidate the textual results above
        if let Err(e) = viz::create_visualizations(&series, &stats, &args.output_dir) {
            tracing::warn!(error = %e, "visualization failed");
            println!("Visualization failed: {}", e);
            println!("Results saved as text only.");
        }
    }

    println!("\nAnalysis complete!");
    Ok(())
}
