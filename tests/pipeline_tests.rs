//! End-to-end pipeline tests against stub make/benchmark scripts
//!
//! Each test builds a sandbox directory containing an executable `make` stub
//! and a benchmark stub, puts the sandbox first on PATH, and runs the medir
//! binary with its working directory set to the sandbox.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;
use tempfile::TempDir;

/// Write an executable shell script into `dir`
fn write_script(dir: &Path, name: &str, body: &str) {
    let path = dir.join(name);
    fs::write(&path, body).unwrap();
    let mut perms = fs::metadata(&path).unwrap().permissions();
    perms.set_mode(0o755);
    fs::set_permissions(&path, perms).unwrap();
}

/// A make stub whose targets copy the benchmark stub into place
fn write_make_stub(dir: &Path, failing_targets: &[&str]) {
    let mut body = String::from("#!/bin/sh\nset -e\ntarget=\"$1\"\n");
    for t in failing_targets {
        body.push_str(&format!(
            "if [ \"$target\" = \"{}\" ]; then exit 1; fi\n",
            t
        ));
    }
    body.push_str(
        "case \"$target\" in\n\
         clean) rm -f cubotron cubotron_speed cubotron_ultra cubotron_size ;;\n\
         all) cp bench_stub cubotron ;;\n\
         *) cp bench_stub \"cubotron_$target\" ;;\n\
         esac\n",
    );
    write_script(dir, "make", &body);
}

/// Benchmark stub printing a fixed throughput value
fn write_bench_stub(dir: &Path, output: &str) {
    write_script(dir, "bench_stub", &format!("#!/bin/sh\necho '{}'\n", output));
}

fn medir_in(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("medir").unwrap();
    let path = std::env::var("PATH").unwrap_or_default();
    cmd.current_dir(dir.path())
        .env("PATH", format!("{}:{}", dir.path().display(), path));
    cmd
}

#[test]
fn test_full_pipeline_produces_report_and_artifacts() {
    let dir = TempDir::new().unwrap();
    write_make_stub(dir.path(), &[]);
    write_bench_stub(dir.path(), "42.5");
    let out_dir = dir.path().join("results");

    medir_in(&dir)
        .arg("--runs")
        .arg("6")
        .arg("--output-dir")
        .arg(&out_dir)
        .assert()
        .success()
        .stdout(predicate::str::contains("PERFORMANCE SUMMARY"))
        .stdout(predicate::str::contains("PERFORMANCE RANKING"))
        .stdout(predicate::str::contains("Analysis complete!"));

    let csv = fs::read_to_string(out_dir.join("performance_summary.csv")).unwrap();
    assert!(csv.starts_with("variant,mean,median"));
    // All four variants retained, 5 post-warmup runs each
    assert_eq!(csv.lines().count(), 5);
    assert!(csv.contains("all,42.5000"));
    assert!(csv.contains("ultra,42.5000"));

    assert!(out_dir.join("benchmark_analysis.svg").exists());
}

#[test]
fn test_identical_variants_are_not_significant() {
    let dir = TempDir::new().unwrap();
    write_make_stub(dir.path(), &[]);
    // Constant output: Kruskal-Wallis degenerates and is skipped, but the
    // summary and ranking still appear
    write_bench_stub(dir.path(), "42.5");

    medir_in(&dir)
        .arg("--runs")
        .arg("6")
        .arg("--no-viz")
        .assert()
        .success()
        .stdout(predicate::str::contains("PERFORMANCE SUMMARY"))
        .stdout(predicate::str::contains("42.5000"));
}

#[test]
fn test_failed_build_skips_variant_entirely() {
    let dir = TempDir::new().unwrap();
    write_make_stub(dir.path(), &["speed"]);
    write_bench_stub(dir.path(), "10.0");

    let assert = medir_in(&dir)
        .arg("--runs")
        .arg("6")
        .arg("--no-viz")
        .assert()
        .success()
        .stdout(predicate::str::contains("Failed to build speed, skipping..."));

    // The summary table must not contain a speed row
    let stdout = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
    let summary = stdout
        .split("PERFORMANCE SUMMARY")
        .nth(1)
        .expect("summary section");
    assert!(!summary.contains("speed"));
    assert!(summary.contains("ultra"));
}

#[test]
fn test_all_builds_failing_exits_nonzero() {
    let dir = TempDir::new().unwrap();
    write_make_stub(dir.path(), &["clean"]);
    write_bench_stub(dir.path(), "10.0");

    medir_in(&dir)
        .arg("--runs")
        .arg("6")
        .assert()
        .failure()
        .stderr(predicate::str::contains("No data collected"));
}

#[test]
fn test_unparseable_output_drops_variant() {
    let dir = TempDir::new().unwrap();
    // Only the "all" variant builds; its benchmark prints garbage, so after
    // the retry every run is dropped and no variant survives
    write_make_stub(dir.path(), &["speed", "ultra", "size"]);
    write_bench_stub(dir.path(), "N/A");

    medir_in(&dir)
        .arg("--runs")
        .arg("6")
        .assert()
        .failure()
        .stdout(predicate::str::contains("Benchmark failed, retrying..."))
        .stdout(predicate::str::contains("Insufficient data for all"))
        .stderr(predicate::str::contains("No data collected"));
}

#[test]
fn test_failed_run_is_retried_once_and_recovers() {
    let dir = TempDir::new().unwrap();
    // Only "all" builds. The benchmark fails on every first attempt and
    // succeeds on the retry, so all runs are collected via the retry path.
    write_make_stub(dir.path(), &["speed", "ultra", "size"]);
    write_script(
        dir.path(),
        "bench_stub",
        "#!/bin/sh\nif [ -f attempt_flag ]; then rm -f attempt_flag; echo 42.5; else touch attempt_flag; echo N/A; fi\n",
    );

    medir_in(&dir)
        .arg("--runs")
        .arg("6")
        .arg("--no-viz")
        .assert()
        .success()
        .stdout(predicate::str::contains("Benchmark failed, retrying..."))
        .stdout(predicate::str::contains("Collected 6 successful runs for all"));
}

#[test]
fn test_json_format_emits_parseable_report() {
    let dir = TempDir::new().unwrap();
    write_make_stub(dir.path(), &[]);
    // Varying output keeps the rank tests non-degenerate so every pair is
    // reported
    write_script(
        dir.path(),
        "bench_stub",
        "#!/bin/sh\nn=$(cat counter 2>/dev/null || echo 0)\nn=$((n+1))\necho $n > counter\necho \"42.$n\"\n",
    );

    let assert = medir_in(&dir)
        .arg("--runs")
        .arg("6")
        .arg("--no-viz")
        .arg("--format")
        .arg("json")
        .assert()
        .success();

    let stdout = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
    let start = stdout.find('{').expect("json object in output");
    let end = stdout.rfind('}').expect("json object in output");
    let value: serde_json::Value = serde_json::from_str(&stdout[start..=end]).unwrap();

    assert_eq!(value["statistics"].as_array().unwrap().len(), 4);
    assert_eq!(value["statistics"][0]["variant"], "all");
    // 4 variants -> 6 unordered pairs
    assert_eq!(value["tests"]["pairwise"].as_array().unwrap().len(), 6);
}

#[test]
fn test_runs_below_retention_floor_rejected() {
    let dir = TempDir::new().unwrap();
    medir_in(&dir)
        .arg("--runs")
        .arg("3")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid value for --runs"));
}
