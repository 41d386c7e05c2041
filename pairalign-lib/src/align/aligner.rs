use std::iter::repeat;

use anyhow::{Context, Result};
use log::debug;

use super::{
    alignment::PairAlignment,
    constants::{AlignmentMode, GAP},
    scoring::ScoringFunction,
    traceback::{AlignmentMatrix, Cell, Origin},
};

/// A Needleman-Wunsch style aligner with a linear gap penalty.
///
/// `S(i,j)` is the best score aligning the first `j` symbols of `x` against the first `i` symbols
/// of `y`:
/// ```ignore
///   S(i,j) = max(S(i-1,j-1) + score(x[j-1], y[i-1]),   // diagonal
///                S(i-1,j)   + gap,                      // above: gap in x
///                S(i,j-1)   + gap)                      // left: gap in y
/// ```
/// Ties are broken in the order listed: diagonal, then above, then left.
///
/// With [`AlignmentMode::Global`] the first row and column are `S(0,j) = gap * j` and
/// `S(i,0) = gap * i`, and the traceback starts at `S(m,n)`.  With
/// [`AlignmentMode::FreeBoundary`] the first row and column are zero and the traceback starts at
/// the best cell of the last row or column (see [`AlignmentMatrix::best_boundary_cell`]); the
/// symbols past that cell are appended against gaps.
///
/// The full matrix is kept for the traceback, so time and memory are both `O(m * n)`.
#[derive(Clone, Debug)]
pub struct PairwiseAligner<S: ScoringFunction> {
    scoring: S,
    mode: AlignmentMode,
}

impl<S: ScoringFunction> PairwiseAligner<S> {
    pub fn new(scoring: S, mode: AlignmentMode) -> Self {
        Self { scoring, mode }
    }

    /// Aligns the full sequence `x` against the full sequence `y` under the global policy.
    pub fn global(scoring: S) -> Self {
        Self::new(scoring, AlignmentMode::Global)
    }

    /// Aligns `x` against `y` with free leading and trailing overhangs.
    pub fn free_boundary(scoring: S) -> Self {
        Self::new(scoring, AlignmentMode::FreeBoundary)
    }

    pub fn scoring(&self) -> &S {
        &self.scoring
    }

    pub fn mode(&self) -> AlignmentMode {
        self.mode
    }

    /// Computes the optimal alignment of `x` (the first sequence) against `y` (the second).
    ///
    /// Fails on the first pair of symbols the scoring function does not cover, or when a cell
    /// value does not fit in an `i32`.
    pub fn align(&self, x: &[u8], y: &[u8]) -> Result<PairAlignment> {
        let matrix = self.fill(x, y)?;

        let (i, j) = match self.mode {
            AlignmentMode::Global => (matrix.last_row(), matrix.last_col()),
            AlignmentMode::FreeBoundary => matrix.best_boundary_cell(),
        };
        debug!(
            "Traceback starts at row {i} and column {j} of a {}x{} matrix",
            matrix.rows(),
            matrix.cols()
        );
        let score = matrix.get(i, j).value;
        let (mut aligned_x, mut aligned_y) = matrix.trace(i, j);

        // At most one of these applies: a start cell in the last row leaves a suffix of `x`
        // unaligned, a start cell in the last column leaves a suffix of `y` unaligned.
        if i < matrix.last_row() {
            aligned_x.extend(repeat(GAP).take(y.len() - i));
            aligned_y.extend_from_slice(&y[i..]);
        } else if j < matrix.last_col() {
            aligned_x.extend_from_slice(&x[j..]);
            aligned_y.extend(repeat(GAP).take(x.len() - j));
        }

        Ok(PairAlignment::new(aligned_x, aligned_y, score, self.mode))
    }

    /// Fills the matrix row by row.  Each cell depends on its left, upper, and upper-left
    /// neighbours, so the order must not change.
    fn fill(&self, x: &[u8], y: &[u8]) -> Result<AlignmentMatrix> {
        let m = y.len();
        let n = x.len();
        let gap = self.scoring.gap_penalty();
        let mut matrix = AlignmentMatrix::new(m, n);

        for j in 1..=n {
            let value = self.boundary_value(gap, j)?;
            matrix.set(0, j, Cell::new(value, Origin::Left, x[j - 1], GAP));
        }
        for i in 1..=m {
            let value = self.boundary_value(gap, i)?;
            matrix.set(i, 0, Cell::new(value, Origin::Above, GAP, y[i - 1]));
        }

        for i in 1..=m {
            let b = y[i - 1];
            for j in 1..=n {
                let a = x[j - 1];

                let substitution = self.scoring.score(a, b)?;
                let mut value = checked_sum(matrix.get(i - 1, j - 1).value, substitution)?;
                let mut origin = Origin::Diagonal;

                let above = checked_sum(matrix.get(i - 1, j).value, gap)?;
                if above > value {
                    value = above;
                    origin = Origin::Above;
                }

                let left = checked_sum(matrix.get(i, j - 1).value, gap)?;
                if left > value {
                    value = left;
                    origin = Origin::Left;
                }

                matrix.set(i, j, Cell::new(value, origin, a, b));
            }
        }

        Ok(matrix)
    }

    /// The value of the `k`th cell of the first row or column: `gap * k` globally, zero with free
    /// boundaries.
    fn boundary_value(&self, gap: i32, k: usize) -> Result<i32> {
        match self.mode {
            AlignmentMode::Global => i32::try_from(k)
                .ok()
                .and_then(|k| gap.checked_mul(k))
                .with_context(|| format!("Score overflow: {k} gaps with a gap penalty of {gap}")),
            AlignmentMode::FreeBoundary => Ok(0),
        }
    }
}

/// Adds a score to a cell value, failing instead of wrapping when the sum leaves the `i32` range.
#[inline(always)]
fn checked_sum(value: i32, score: i32) -> Result<i32> {
    value
        .checked_add(score)
        .with_context(|| format!("Score overflow: adding {score} to {value}"))
}
