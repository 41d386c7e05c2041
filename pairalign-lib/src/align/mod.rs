pub mod aligner;
pub mod alignment;
pub mod constants;
pub mod io;
pub mod scoring;
pub mod traceback;

use std::path::PathBuf;

use anyhow::Result;
use derive_builder::Builder;
use log::debug;

pub use aligner::PairwiseAligner;
pub use alignment::{AlignmentSummary, PairAlignment};
pub use constants::AlignmentMode;
pub use scoring::{Scoring, ScoringFunction, ScoringPreset};

/// The alignment configuration collected from the command line.
#[derive(Clone, Debug, Builder)]
#[builder(name = "Builder", build_fn(name = "build_options"))]
pub struct Options {
    #[builder(default)]
    preset: ScoringPreset,
    #[builder(default)]
    gap_penalty: Option<i32>,
    #[builder(default)]
    matrix: Option<PathBuf>,
    #[builder(default)]
    mode: AlignmentMode,
}

impl Builder {
    /// Builds the scoring function for the configured preset.  Fails if the preset needs a gap
    /// penalty that was not given, or if the substitution matrix cannot be loaded.
    pub fn build_scoring(&self) -> Result<Scoring> {
        let opts = self.build_options()?;
        debug!("Building {} scoring", opts.preset);
        opts.preset.build(opts.gap_penalty, opts.matrix.as_deref())
    }

    pub fn build_aligner(&self) -> Result<PairwiseAligner<Scoring>> {
        let opts = self.build_options()?;
        Ok(PairwiseAligner::new(self.build_scoring()?, opts.mode))
    }
}
