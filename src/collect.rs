//! Benchmark execution and sample collection
//!
//! For each variant: build it (skip the variant if the build fails), then run
//! the benchmark binary a fixed number of times. A failed run is retried
//! exactly once after a short delay; a run that fails twice is dropped
//! without a placeholder. Variants that end up with too few successful runs
//! are discarded with a logged reason.

use crate::builder::VariantBuilder;
use crate::command::CommandRunner;
use crate::variant::Variant;
use std::thread;
use std::time::Duration;
use tracing::{info, warn};

/// Benchmark runs per variant (the first is a warm-up)
pub const DEFAULT_RUNS_PER_VARIANT: usize = 11;

/// Minimum successful runs for a variant to be retained
pub const MIN_SUCCESSFUL_RUNS: usize = 5;

/// Delay before the single retry of a failed run
const RETRY_DELAY: Duration = Duration::from_secs(1);

/// Flag passed to the benchmark binary
const BENCHMARK_FLAG: &str = "--benchmarks";

/// A single throughput measurement
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    /// 1-based run index within the variant's series
    pub run: usize,
    /// Throughput reported by the benchmark binary (solves/sec)
    pub value: f64,
}

/// Run-ordered samples for one variant
#[derive(Debug, Clone)]
pub struct VariantSeries {
    pub variant: Variant,
    pub samples: Vec<Sample>,
}

impl VariantSeries {
    pub fn new(variant: Variant, values: impl IntoIterator<Item = f64>) -> Self {
        let samples = values
            .into_iter()
            .enumerate()
            .map(|(i, value)| Sample { run: i + 1, value })
            .collect();
        Self { variant, samples }
    }

    /// All collected values, in run order
    pub fn values(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.value).collect()
    }

    /// Values with the first (warm-up) sample excluded.
    ///
    /// The warm-up is dropped by position, never by value. Series with fewer
    /// than two samples have no post-warm-up data at all.
    pub fn post_warmup(&self) -> Vec<f64> {
        if self.samples.len() < 2 {
            return Vec::new();
        }
        self.samples.iter().skip(1).map(|s| s.value).collect()
    }
}

/// Collection policy knobs (run count is CLI-configurable, the rest is fixed)
#[derive(Debug, Clone)]
pub struct CollectorConfig {
    pub runs_per_variant: usize,
    pub min_successful_runs: usize,
    pub retry_delay: Duration,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            runs_per_variant: DEFAULT_RUNS_PER_VARIANT,
            min_successful_runs: MIN_SUCCESSFUL_RUNS,
            retry_delay: RETRY_DELAY,
        }
    }
}

/// Run one benchmark invocation and parse its entire output as a float.
///
/// Returns `None` on command failure or unparseable output, logging the raw
/// output for diagnosis.
pub fn run_benchmark(runner: &CommandRunner, variant: Variant) -> Option<f64> {
    let cmd = format!("./{} {}", variant.artifact_name(), BENCHMARK_FLAG);
    let output = match runner.run(&cmd) {
        Ok(output) => output,
        Err(e) => {
            warn!(%variant, error = %e, "benchmark run failed");
            return None;
        }
    };

    match output.parse::<f64>() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!(%variant, raw = output, "failed to parse benchmark output");
            None
        }
    }
}

/// Build and benchmark every variant, returning the retained series in
/// variant order. Variants that fail to build or produce too few successful
/// runs are absent from the result.
pub fn collect_benchmark_data(
    runner: &CommandRunner,
    variants: &[Variant],
    config: &CollectorConfig,
) -> Vec<VariantSeries> {
    let builder = VariantBuilder::new(runner);
    let mut data = Vec::new();

    for &variant in variants {
        println!("\n{}", "=".repeat(50));
        println!("Processing variant: {}", variant);
        println!("{}", "=".repeat(50));

        if !builder.build(variant) {
            println!("Failed to build {}, skipping...", variant);
            continue;
        }

        let mut values = Vec::new();
        for run in 1..=config.runs_per_variant {
            println!(
                "Running benchmark {}/{} for {}...",
                run, config.runs_per_variant, variant
            );
            match run_with_retry(runner, variant, config.retry_delay) {
                Some(value) => {
                    println!("  Run {}: {:.4} solves/sec", run, value);
                    values.push(value);
                }
                None => println!("  Benchmark {} failed after retry, skipping...", run),
            }
        }

        if values.len() >= config.min_successful_runs {
            info!(%variant, runs = values.len(), "variant retained");
            println!("Collected {} successful runs for {}", values.len(), variant);
            data.push(VariantSeries::new(variant, values));
        } else {
            warn!(%variant, runs = values.len(), "insufficient data, variant dropped");
            println!(
                "Insufficient data for {} ({} runs), skipping...",
                variant,
                values.len()
            );
        }
    }

    data
}

/// One benchmark run with a single retry after a fixed delay
fn run_with_retry(runner: &CommandRunner, variant: Variant, delay: Duration) -> Option<f64> {
    if let Some(value) = run_benchmark(runner, variant) {
        return Some(value);
    }
    println!("  Benchmark failed, retrying...");
    thread::sleep(delay);
    run_benchmark(runner, variant)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn series(values: &[f64]) -> VariantSeries {
        VariantSeries::new(Variant::All, values.iter().copied())
    }

    #[test]
    fn test_samples_are_tagged_with_run_index() {
        let s = series(&[10.0, 10.2, 9.8]);
        let runs: Vec<usize> = s.samples.iter().map(|s| s.run).collect();
        assert_eq!(runs, vec![1, 2, 3]);
    }

    #[test]
    fn test_post_warmup_drops_first_by_position() {
        // First value is the largest; it must still be the one dropped
        let s = series(&[99.0, 10.2, 9.8, 10.1]);
        assert_eq!(s.post_warmup(), vec![10.2, 9.8, 10.1]);
    }

    #[test]
    fn test_post_warmup_count_is_n_minus_one() {
        for n in 2..12 {
            let values: Vec<f64> = (0..n).map(f64::from).collect();
            let s = series(&values);
            assert_eq!(s.post_warmup().len(), (n - 1) as usize);
        }
    }

    #[test]
    fn test_post_warmup_empty_below_two_samples() {
        assert!(series(&[]).post_warmup().is_empty());
        assert!(series(&[10.0]).post_warmup().is_empty());
    }

    #[test]
    fn test_values_preserve_run_order() {
        let s = series(&[3.0, 1.0, 2.0]);
        assert_eq!(s.values(), vec![3.0, 1.0, 2.0]);
    }

    #[test]
    fn test_default_config_matches_pipeline_constants() {
        let config = CollectorConfig::default();
        assert_eq!(config.runs_per_variant, 11);
        assert_eq!(config.min_successful_runs, 5);
        assert_eq!(config.retry_delay, Duration::from_secs(1));
    }
}
