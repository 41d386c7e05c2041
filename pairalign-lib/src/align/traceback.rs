use super::constants::GAP;

/// The neighbouring cell that produced the value of a cell.
#[derive(Default, Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum Origin {
    /// Only the top-left cell, where every traceback ends.
    #[default]
    None,
    /// A symbol of the first sequence aligned against a gap.
    Left,
    /// A symbol of each sequence aligned against each other.
    Diagonal,
    /// A gap aligned against a symbol of the second sequence.
    Above,
}

/// One cell of the alignment matrix.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct Cell {
    /// The best score of any alignment ending at this cell.
    pub value: i32,
    /// Which neighbour `value` was derived from.
    pub origin: Origin,
    /// The symbol of the first sequence consumed when reaching this cell.
    pub x: u8,
    /// The symbol of the second sequence consumed when reaching this cell.
    pub y: u8,
}

impl Default for Cell {
    fn default() -> Self {
        Self::start()
    }
}

impl Cell {
    pub fn new(value: i32, origin: Origin, x: u8, y: u8) -> Self {
        Self {
            value,
            origin,
            x,
            y,
        }
    }

    /// The top-left cell of every matrix.
    pub fn start() -> Self {
        Self::new(0, Origin::None, GAP, GAP)
    }

    /// The coordinates of the predecessor of the cell at row `i` and column `j`, or `None` for the
    /// start cell.
    #[inline(always)]
    pub fn predecessor(&self, i: usize, j: usize) -> Option<(usize, usize)> {
        match self.origin {
            Origin::None => None,
            Origin::Left => Some((i, j - 1)),
            Origin::Diagonal => Some((i - 1, j - 1)),
            Origin::Above => Some((i - 1, j)),
        }
    }

    /// The pair of aligned symbols (first sequence, second sequence) this cell contributes to the
    /// alignment, with [`GAP`] on the side that consumed nothing.
    #[inline(always)]
    pub fn aligned_pair(&self) -> Option<(u8, u8)> {
        match self.origin {
            Origin::None => None,
            Origin::Left => Some((self.x, GAP)),
            Origin::Diagonal => Some((self.x, self.y)),
            Origin::Above => Some((GAP, self.y)),
        }
    }
}

/// The dynamic-programming matrix, stored row-major in a single vector.
///
/// Rows follow the second sequence and columns follow the first, so for sequences of lengths `n`
/// (first) and `m` (second) there are `m + 1` rows and `n + 1` columns.  Row `0` and column `0`
/// hold the boundary cells.  Each cell refers to its predecessor by direction only, so following
/// the origins from any cell reaches the top-left cell in at most `m + n` steps.
#[derive(Default, Clone, Eq, PartialEq, Hash, Debug)]
pub struct AlignmentMatrix {
    rows: usize,
    cols: usize,
    matrix: Vec<Cell>,
}

impl AlignmentMatrix {
    /// Creates a matrix for a second sequence of length `m` and a first sequence of length `n`,
    /// with every cell set to the start cell.
    pub fn new(m: usize, n: usize) -> Self {
        let rows = m + 1;
        let cols = n + 1;
        AlignmentMatrix {
            rows,
            cols,
            matrix: vec![Cell::start(); rows * cols],
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// The index of the last row (the length of the second sequence).
    pub fn last_row(&self) -> usize {
        self.rows - 1
    }

    /// The index of the last column (the length of the first sequence).
    pub fn last_col(&self) -> usize {
        self.cols - 1
    }

    #[inline(always)]
    pub fn set(&mut self, i: usize, j: usize, v: Cell) {
        assert!(i < self.rows, "row {i} out of bounds ({})", self.rows);
        assert!(j < self.cols, "column {j} out of bounds ({})", self.cols);
        self.matrix[i * self.cols + j] = v;
    }

    #[inline(always)]
    pub fn get(&self, i: usize, j: usize) -> &Cell {
        assert!(i < self.rows, "row {i} out of bounds ({})", self.rows);
        assert!(j < self.cols, "column {j} out of bounds ({})", self.cols);
        &self.matrix[i * self.cols + j]
    }

    /// The cell with the highest value in the last row or last column.
    ///
    /// The bottom-right cell is the initial best.  The last row is scanned left to right, then the
    /// last column top to bottom, and only a strictly greater value replaces the best, so ties go
    /// to the bottom-right cell first, then to the earliest cell in the last row, then to the
    /// earliest cell in the last column.  Returns `(row, column)`.
    pub fn best_boundary_cell(&self) -> (usize, usize) {
        let last_row = self.last_row();
        let last_col = self.last_col();
        let (mut best_i, mut best_j) = (last_row, last_col);
        let mut best = self.get(last_row, last_col).value;
        for j in 1..=last_col {
            let value = self.get(last_row, j).value;
            if value > best {
                best_j = j;
                best = value;
            }
        }
        for i in 1..=last_row {
            let value = self.get(i, last_col).value;
            if value > best {
                best_i = i;
                best_j = last_col;
                best = value;
            }
        }
        (best_i, best_j)
    }

    /// Follows the origins from the cell at row `i` and column `j` back to the start cell,
    /// returning the aligned symbols of the first and second sequence in alignment order.
    pub fn trace(&self, i: usize, j: usize) -> (Vec<u8>, Vec<u8>) {
        let mut xs = Vec::with_capacity(i + j);
        let mut ys = Vec::with_capacity(i + j);
        let (mut i, mut j) = (i, j);
        loop {
            let cell = self.get(i, j);
            match (cell.aligned_pair(), cell.predecessor(i, j)) {
                (Some((x, y)), Some((prev_i, prev_j))) => {
                    xs.push(x);
                    ys.push(y);
                    i = prev_i;
                    j = prev_j;
                }
                _ => break,
            }
        }
        xs.reverse();
        ys.reverse();
        (xs, ys)
    }
}
