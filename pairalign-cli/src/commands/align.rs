use super::command::{Command, ValueEnum};
use anyhow::{ensure, Result};
use clap::{
    builder::{PossibleValuesParser, TypedValueParser as _},
    Parser,
};
use fgoxide::io::{DelimFile, Io};
use itertools::Itertools;
use log::info;
use pairalign::{
    align::{
        io::{read_sequences, BUFFER_SIZE},
        AlignmentMode, Builder, PairAlignment, ScoringFunction, ScoringPreset,
    },
    util::version::built_info,
};
use std::{
    io::{self, Write},
    path::PathBuf,
};

////////////////////////////////////////////////////////////////////////////////
// Align (main class) and it's impls
////////////////////////////////////////////////////////////////////////////////

impl ValueEnum for ScoringPreset {
    fn variants<'a>() -> &'a [Self] {
        &[Self::Default, Self::DNAFull, Self::BLOSUM62]
    }
}

/// Computes an optimal pairwise alignment of two sequences by dynamic programming.
///
/// Each input is a FASTA file; the first record of each is used.  The alignment uses a linear
/// gap penalty: every symbol aligned against a gap adds the gap penalty to the score.
///
/// By default the alignment is global: both sequences are aligned end-to-end and overhangs are
/// penalized.  With `--optimization` leading and trailing overhangs of either sequence are free,
/// so one sequence may start or end anywhere along the other (a semi-global alignment).  Interior
/// scores are never reset to zero, so this is not a local alignment.
///
/// The aligned sequences are written in blocks of 50 columns, with `_` marking gaps, followed by
/// the alignment score.
#[derive(Parser, Debug, Clone)]
#[clap(version = built_info::VERSION.as_str(), term_width=0)]
pub struct Align {
    /// The paths to the FASTA files with the first and the second sequence.
    #[clap(long, short = 'i', num_args = 2, required = true, display_order = 1)]
    inputs: Vec<PathBuf>,

    /// The scoring preset:
    /// - Default: match 2, mismatch 1, gap -1 (`--gap` is ignored).
    /// - DNAFull: match 5, mismatch -4, gap from `--gap`.
    /// - BLOSUM62: the BLOSUM62 substitution matrix, gap from `--gap`.
    #[clap(
        long,
        short = 'a',
        value_parser = PossibleValuesParser::new(ScoringPreset::possible_values())
            .map(|s| s.parse::<ScoringPreset>().unwrap()),
        default_value_t = ScoringPreset::Default,
        ignore_case = true,
        display_order = 2,
        verbatim_doc_comment
    )]
    alphabet: ScoringPreset,

    /// The gap penalty (should not be positive).  Required for the DNAFull and BLOSUM62 presets.
    #[clap(long = "gap", short = 'g', allow_hyphen_values = true, display_order = 3)]
    gap_penalty: Option<i32>,

    /// Allow free leading and trailing overhangs (semi-global alignment).
    #[clap(
        long,
        visible_alias = "free-boundary",
        default_value = "false",
        display_order = 4
    )]
    optimization: bool,

    /// The path to the output file, otherwise the alignment is written to standard output.
    #[clap(long, short = 'o', display_order = 5)]
    output: Option<PathBuf>,

    /// A substitution matrix file to use instead of the bundled BLOSUM62 table (BLOSUM62 only).
    #[clap(long, display_order = 6)]
    matrix: Option<PathBuf>,

    /// Optional path to write alignment summary metrics (tab-separated).
    #[clap(long, display_order = 7)]
    metrics: Option<PathBuf>,
}

impl Align {
    /// Executes the align command
    pub fn execute(&self) -> anyhow::Result<()> {
        info!("Starting alignment...");
        ensure!(
            self.inputs.len() == 2,
            "Expected exactly two input sequences, found {}: {}",
            self.inputs.len(),
            self.inputs.iter().map(|p| p.display()).join(", ")
        );
        ensure!(
            !self.alphabet.requires_gap_penalty() || self.gap_penalty.is_some(),
            "A gap penalty (-g/--gap) is required for the {} preset",
            self.alphabet
        );

        // Build the aligner first so that configuration errors surface before any input is read
        let mut builder = Builder::default();
        builder
            .preset(self.alphabet)
            .gap_penalty(self.gap_penalty)
            .matrix(self.matrix.clone())
            .mode(AlignmentMode::from(self.optimization));
        let aligner = builder.build_aligner()?;
        info!(
            "Using the {} preset with a gap penalty of {} and the {} policy",
            self.alphabet,
            aligner.scoring().gap_penalty(),
            aligner.mode()
        );

        let sequences = read_sequences(&self.inputs)?;
        let alignment = aligner.align(&sequences[0], &sequences[1])?;
        info!(
            "Aligned {} columns with a score of {}",
            alignment.len(),
            alignment.score()
        );

        self.write_alignment(&alignment)?;
        if let Some(metrics) = &self.metrics {
            DelimFile::default().write_tsv(metrics, [alignment.summary()])?;
            info!("Wrote metrics to {}", metrics.display());
        }
        Ok(())
    }

    fn write_alignment(&self, alignment: &PairAlignment) -> Result<()> {
        match &self.output {
            Some(path) => {
                let fg_io = Io::new(5, BUFFER_SIZE);
                let mut writer = fg_io.new_writer(path)?;
                writeln!(writer, "{alignment}")?;
                writer.flush()?;
                info!("Wrote alignment to {}", path.display());
            }
            None => {
                let mut stdout = io::stdout().lock();
                writeln!(stdout, "{alignment}")?;
                stdout.flush()?;
            }
        }
        Ok(())
    }
}

impl Command for Align {
    fn execute(&self) -> anyhow::Result<()> {
        Align::execute(self)
    }
}
