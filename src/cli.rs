//! CLI argument parsing for Medir

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Output format for the analysis report
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text tables (default)
    Text,
    /// JSON for machine parsing
    Json,
}

#[derive(Parser, Debug)]
#[command(name = "medir")]
#[command(version)]
#[command(about = "Build-variant benchmark runner with significance analysis", long_about = None)]
pub struct Cli {
    /// Benchmark runs per variant (first run is discarded as warmup)
    #[arg(long = "runs", value_name = "N", default_value = "11")]
    pub runs: usize,

    /// Per-command timeout in seconds
    #[arg(long = "timeout", value_name = "SECS", default_value = "300")]
    pub timeout_secs: u64,

    /// Directory for the chart image and CSV summary
    #[arg(
        long = "output-dir",
        value_name = "DIR",
        default_value = "benchmark_results"
    )]
    pub output_dir: PathBuf,

    /// Report format (text or json)
    #[arg(long = "format", value_enum, default_value = "text")]
    pub format: OutputFormat,

    /// Skip chart and CSV generation
    #[arg(long = "no-viz")]
    pub no_viz: bool,

    /// Enable verbose diagnostic logging
    #[arg(long = "debug")]
    pub debug: bool,
}
