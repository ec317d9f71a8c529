//! Build variant model for the benchmarked program
//!
//! The benchmarked program ships four make targets. The default target
//! produces a bare `cubotron` binary; the tuned targets append their name.

use serde::Serialize;
use std::fmt;

/// Name of the benchmarked program's default artifact
pub const BINARY_NAME: &str = "cubotron";

/// One of the four named build configurations
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    /// Default build (`make all`)
    All,
    /// Speed-tuned build (`make speed`)
    Speed,
    /// Aggressively speed-tuned build (`make ultra`)
    Ultra,
    /// Size-tuned build (`make size`)
    Size,
}

impl Variant {
    /// Every variant the pipeline benchmarks, in build order
    pub const ALL: [Variant; 4] = [Variant::All, Variant::Speed, Variant::Ultra, Variant::Size];

    /// Make target used to build this variant
    pub fn make_target(&self) -> &'static str {
        match self {
            Variant::All => "all",
            Variant::Speed => "speed",
            Variant::Ultra => "ultra",
            Variant::Size => "size",
        }
    }

    /// Expected artifact name after a successful build
    pub fn artifact_name(&self) -> String {
        match self {
            Variant::All => BINARY_NAME.to_string(),
            other => format!("{}_{}", BINARY_NAME, other.make_target()),
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.make_target())
    }
}
