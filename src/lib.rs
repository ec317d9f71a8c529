//! Medir - build-variant benchmark runner with significance analysis
//!
//! This library drives a fixed benchmarking pipeline: build each variant of
//! the target program, collect repeated throughput samples, compute robust
//! descriptive statistics, test for significant differences between
//! variants, and render comparison charts plus a CSV summary.

pub mod builder;
pub mod cli;
pub mod collect;
pub mod command;
pub mod report;
pub mod significance;
pub mod stats;
pub mod variant;
pub mod viz;
