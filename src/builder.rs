//! Cleaning and building one variant via make
//!
//! Sequence per variant: `make clean`, `make <target>`, then a filesystem
//! check for the expected artifact. Any command failure short-circuits to a
//! build failure; the collector then skips the variant entirely.

use crate::command::CommandRunner;
use crate::variant::Variant;
use std::path::Path;
use tracing::warn;

/// Builds variants in the current working directory
#[derive(Debug)]
pub struct VariantBuilder<'a> {
    runner: &'a CommandRunner,
}

impl<'a> VariantBuilder<'a> {
    pub fn new(runner: &'a CommandRunner) -> Self {
        Self { runner }
    }

    /// Clean, build `variant`, and verify its artifact exists.
    ///
    /// Returns `false` on the first failing step.
    pub fn build(&self, variant: Variant) -> bool {
        println!("Building {}...", variant);

        if self.runner.run("make clean").is_err() {
            warn!(%variant, "make clean failed");
            return false;
        }

        if self
            .runner
            .run(&format!("make {}", variant.make_target()))
            .is_err()
        {
            warn!(%variant, "build failed");
            return false;
        }

        let artifact = variant.artifact_name();
        if !Path::new(&artifact).exists() {
            warn!(%variant, artifact, "build succeeded but artifact is missing");
            return false;
        }

        true
    }
}
