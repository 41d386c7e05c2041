use anyhow::{anyhow, Error};
use std::{fmt::Display, str::FromStr};

/// The symbol used to represent a gap in an aligned sequence.
pub const GAP: u8 = b'_';

/// The number of aligned symbols rendered per line.
pub const LINE_WIDTH: usize = 50;

/// Match score for the `Default` scoring preset.
pub const DEFAULT_MATCH_SCORE: i32 = 2;
/// Mismatch score for the `Default` scoring preset.
pub const DEFAULT_MISMATCH_SCORE: i32 = 1;
/// Gap penalty for the `Default` scoring preset.  This preset does not accept a user gap penalty.
pub const DEFAULT_GAP_PENALTY: i32 = -1;

/// Match score for the `DNAFull` scoring preset.
pub const DNAFULL_MATCH_SCORE: i32 = 5;
/// Mismatch score for the `DNAFull` scoring preset.
pub const DNAFULL_MISMATCH_SCORE: i32 = -4;

/// The boundary policy used when initializing the first row and column of the alignment matrix,
/// which in turn determines where the traceback starts.
///
/// The default alignment mode is Global.
#[derive(Default, Debug, PartialEq, Eq, Copy, Clone, Hash)]
pub enum AlignmentMode {
    /// Aligns the full first sequence versus the full second sequence.  The first row and column
    /// accumulate the gap penalty, and the traceback always starts in the bottom-right cell.
    #[default]
    Global,
    /// The first row and column are zero, so leading overhangs are free, and the traceback starts
    /// at the best cell of the last row or last column, so trailing overhangs are free too.
    /// Interior cells are never floored at zero, so this is not a local alignment.
    FreeBoundary,
}

impl From<bool> for AlignmentMode {
    /// Maps the free-boundary flag to a mode.
    fn from(free_boundary: bool) -> Self {
        if free_boundary {
            AlignmentMode::FreeBoundary
        } else {
            AlignmentMode::Global
        }
    }
}

impl Display for AlignmentMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Global => write!(f, "global"),
            Self::FreeBoundary => write!(f, "free-boundary"),
        }
    }
}

impl FromStr for AlignmentMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "global" => Ok(AlignmentMode::Global),
            "free-boundary" | "free_boundary" | "freeboundary" | "semi-global" | "optimization" => {
                Ok(AlignmentMode::FreeBoundary)
            }
            _ => Err(anyhow!("Invalid alignment mode: {}", s)),
        }
    }
}
