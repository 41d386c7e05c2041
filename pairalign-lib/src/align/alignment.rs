use std::fmt;

use derive_getters::Getters;
use serde::Serialize;

use super::constants::{AlignmentMode, GAP, LINE_WIDTH};

/// A pairwise alignment of two sequences: the first sequence (`x`) and the second sequence (`y`)
/// with gaps inserted so both have the same length, and the alignment score.
///
/// Every symbol of both input sequences appears in the alignment, in order.  With
/// [`AlignmentMode::FreeBoundary`] the unpenalized overhangs are still present, aligned against
/// gaps.
#[derive(Debug, Eq, PartialEq, Clone, Getters)]
pub struct PairAlignment {
    /// The first sequence with gaps (`_`) inserted.
    aligned_x: Vec<u8>,
    /// The second sequence with gaps (`_`) inserted.
    aligned_y: Vec<u8>,
    /// The alignment score.
    score: i32,
    /// The boundary policy the alignment was computed with.
    mode: AlignmentMode,
}

/// Summary statistics for a [`PairAlignment`], written as one row of a metrics file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlignmentSummary {
    pub mode: String,
    pub score: i32,
    /// The number of aligned columns.
    pub length: usize,
    pub matches: usize,
    pub mismatches: usize,
    /// The number of gaps inserted into the first sequence.
    pub gaps_in_seq1: usize,
    /// The number of gaps inserted into the second sequence.
    pub gaps_in_seq2: usize,
    /// `matches / length`, or zero for an empty alignment.
    pub identity: f64,
}

impl PairAlignment {
    pub fn new(aligned_x: Vec<u8>, aligned_y: Vec<u8>, score: i32, mode: AlignmentMode) -> Self {
        assert_eq!(
            aligned_x.len(),
            aligned_y.len(),
            "Aligned sequences must have the same length"
        );
        Self {
            aligned_x,
            aligned_y,
            score,
            mode,
        }
    }

    /// The number of aligned columns.
    pub fn len(&self) -> usize {
        self.aligned_x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.aligned_x.is_empty()
    }

    /// The first sequence with the gaps removed.
    pub fn ungapped_x(&self) -> Vec<u8> {
        ungapped(&self.aligned_x)
    }

    /// The second sequence with the gaps removed.
    pub fn ungapped_y(&self) -> Vec<u8> {
        ungapped(&self.aligned_y)
    }

    pub fn summary(&self) -> AlignmentSummary {
        let mut matches = 0;
        let mut mismatches = 0;
        let mut gaps_in_seq1 = 0;
        let mut gaps_in_seq2 = 0;
        for (&x, &y) in self.aligned_x.iter().zip(self.aligned_y.iter()) {
            match (x == GAP, y == GAP) {
                (true, _) => gaps_in_seq1 += 1,
                (_, true) => gaps_in_seq2 += 1,
                _ if x == y => matches += 1,
                _ => mismatches += 1,
            }
        }
        let identity = if self.is_empty() {
            0.0
        } else {
            matches as f64 / self.len() as f64
        };
        AlignmentSummary {
            mode: self.mode.to_string(),
            score: self.score,
            length: self.len(),
            matches,
            mismatches,
            gaps_in_seq1,
            gaps_in_seq2,
            identity,
        }
    }
}

fn ungapped(aligned: &[u8]) -> Vec<u8> {
    aligned.iter().copied().filter(|&symbol| symbol != GAP).collect()
}

/// Renders the alignment in blocks of [`LINE_WIDTH`] columns, each block being a `Seq1: ` line, a
/// `Seq2: ` line and a blank line, followed by a final `Score: ` line.  An empty alignment still
/// renders one (empty) block.
impl fmt::Display for PairAlignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let empty: &[u8] = &[];
        let blocks: Vec<(&[u8], &[u8])> = if self.is_empty() {
            vec![(empty, empty)]
        } else {
            self.aligned_x
                .chunks(LINE_WIDTH)
                .zip(self.aligned_y.chunks(LINE_WIDTH))
                .collect()
        };
        for (x, y) in blocks {
            writeln!(f, "Seq1: {}", String::from_utf8_lossy(x))?;
            writeln!(f, "Seq2: {}", String::from_utf8_lossy(y))?;
            writeln!(f)?;
        }
        write!(f, "Score: {}", self.score)
    }
}
