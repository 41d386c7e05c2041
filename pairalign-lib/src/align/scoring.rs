//! Scoring functions used to fill the alignment matrix.
//!
//! Every scoring function supplies a single (linear) gap penalty, added once per symbol aligned
//! against a gap, and a substitution score for any pair of symbols.  Three implementations are
//! provided: [`MatchMismatch`] and [`NucleotideMatrix`], which only distinguish between equal and
//! unequal symbols, and [`SubstitutionMatrix`], which looks the pair up in a square table.  The
//! [`Scoring`] enum dispatches to one of them and is what the [`ScoringPreset`]s build.

use std::{fmt::Display, io::BufRead, path::Path, str::FromStr};

use anyhow::{anyhow, bail, ensure, Context, Error, Result};
use enum_dispatch::enum_dispatch;
use fgoxide::io::Io;
use itertools::Itertools;
use log::{debug, warn};

use super::{
    constants::{
        DEFAULT_GAP_PENALTY, DEFAULT_MATCH_SCORE, DEFAULT_MISMATCH_SCORE, DNAFULL_MATCH_SCORE,
        DNAFULL_MISMATCH_SCORE,
    },
    io::BUFFER_SIZE,
};

/// The BLOSUM62 table bundled with the library, in the same format read by
/// [`SubstitutionMatrix::from_path`].
const BLOSUM62_TABLE: &str = include_str!("../../resources/BLOSUM62.dat");

/// Supplies the gap penalty and the substitution scores used by the aligner.
#[enum_dispatch]
pub trait ScoringFunction {
    /// The score added when a single symbol is aligned against a gap (should not be positive).
    fn gap_penalty(&self) -> i32;

    /// The score for aligning symbol `a` from the first sequence against symbol `b` from the
    /// second sequence.  Fails if either symbol is not covered by this scoring function.
    fn score(&self, a: u8, b: u8) -> Result<i32>;
}

/// Scores every match with one constant and every mismatch with another.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct MatchMismatch {
    pub match_score: i32,
    pub mismatch_score: i32,
    pub gap_penalty: i32,
}

impl MatchMismatch {
    pub fn new(match_score: i32, mismatch_score: i32, gap_penalty: i32) -> Self {
        Self {
            match_score,
            mismatch_score,
            gap_penalty,
        }
    }
}

impl Default for MatchMismatch {
    fn default() -> Self {
        Self::new(
            DEFAULT_MATCH_SCORE,
            DEFAULT_MISMATCH_SCORE,
            DEFAULT_GAP_PENALTY,
        )
    }
}

impl ScoringFunction for MatchMismatch {
    fn gap_penalty(&self) -> i32 {
        self.gap_penalty
    }

    #[inline(always)]
    fn score(&self, a: u8, b: u8) -> Result<i32> {
        if a == b {
            Ok(self.match_score)
        } else {
            Ok(self.mismatch_score)
        }
    }
}

/// Match/mismatch scoring for DNA, defaulting to the EDNAFULL identity scores (`5`/`-4`).
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct NucleotideMatrix {
    pub match_score: i32,
    pub mismatch_score: i32,
    pub gap_penalty: i32,
}

impl NucleotideMatrix {
    /// Creates the DNAFull scoring with the given gap penalty.
    pub fn new(gap_penalty: i32) -> Self {
        Self::with_scores(DNAFULL_MATCH_SCORE, DNAFULL_MISMATCH_SCORE, gap_penalty)
    }

    pub fn with_scores(match_score: i32, mismatch_score: i32, gap_penalty: i32) -> Self {
        Self {
            match_score,
            mismatch_score,
            gap_penalty,
        }
    }
}

impl ScoringFunction for NucleotideMatrix {
    fn gap_penalty(&self) -> i32 {
        self.gap_penalty
    }

    #[inline(always)]
    fn score(&self, a: u8, b: u8) -> Result<i32> {
        if a == b {
            Ok(self.match_score)
        } else {
            Ok(self.mismatch_score)
        }
    }
}

/// A square table of substitution scores over a fixed alphabet, e.g. BLOSUM62.
///
/// The text format is whitespace-delimited.  Blank lines and lines starting with `#` are ignored.
/// The first remaining line lists the alphabet, one symbol per column (leading whitespace is
/// allowed).  Every other line holds a row symbol followed by one integer per alphabet symbol, in
/// header order:
///
/// ```text
///    A  R  N
/// A  4 -1 -2
/// R -1  5  0
/// N -2  0  6
/// ```
///
/// Rows are keyed by their row symbol, and every alphabet symbol must have exactly one row.
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct SubstitutionMatrix {
    alphabet: Vec<u8>,
    /// Maps a symbol (as a byte) to its index in `alphabet`.
    index: [Option<usize>; 256],
    /// Row-major, `alphabet.len()` by `alphabet.len()`.
    scores: Vec<i32>,
    gap_penalty: i32,
}

impl SubstitutionMatrix {
    /// The bundled BLOSUM62 table with the given gap penalty.
    pub fn blosum62(gap_penalty: i32) -> Result<Self> {
        Self::parse(BLOSUM62_TABLE.as_bytes(), gap_penalty).context("Invalid bundled BLOSUM62")
    }

    /// Reads a substitution matrix from the given path (GZIP compressed if the path ends with
    /// `.gz` or `.bgz`).
    pub fn from_path<P: AsRef<Path>>(path: &P, gap_penalty: i32) -> Result<Self> {
        let fg_io: Io = Io::new(5, BUFFER_SIZE);
        let reader = fg_io.new_reader(path).with_context(|| {
            format!(
                "Could not open substitution matrix: {}",
                path.as_ref().display()
            )
        })?;
        Self::parse(reader, gap_penalty).with_context(|| {
            format!(
                "Could not parse substitution matrix: {}",
                path.as_ref().display()
            )
        })
    }

    /// Parses a substitution matrix from its text representation.
    pub fn parse<R: BufRead>(reader: R, gap_penalty: i32) -> Result<Self> {
        let mut lines = Vec::new();
        for (line_index, line) in reader.lines().enumerate() {
            let line = line.with_context(|| format!("Could not read line {}", line_index + 1))?;
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            lines.push((line_index + 1, line));
        }
        let Some(((_, header), rows)) = lines.split_first() else {
            bail!("No alphabet header found");
        };

        let alphabet: Vec<u8> = header
            .split_whitespace()
            .map(parse_symbol)
            .collect::<Result<_>>()
            .context("Invalid alphabet header")?;
        ensure!(!alphabet.is_empty(), "Empty alphabet header");

        let mut index = [None; 256];
        for (offset, &symbol) in alphabet.iter().enumerate() {
            ensure!(
                index[symbol as usize].is_none(),
                "Symbol '{}' occurs more than once in the alphabet header",
                symbol as char
            );
            index[symbol as usize] = Some(offset);
        }

        let size = alphabet.len();
        let mut scores = vec![0; size * size];
        let mut seen = vec![false; size];
        for (line_number, line) in rows {
            let mut tokens = line.split_whitespace();
            let symbol = tokens
                .next()
                .map(parse_symbol)
                .transpose()?
                .with_context(|| format!("Missing row symbol on line {line_number}"))?;
            let row = index[symbol as usize].with_context(|| {
                format!(
                    "Row symbol '{}' on line {line_number} is not in the alphabet header",
                    symbol as char
                )
            })?;
            ensure!(
                !seen[row],
                "Row symbol '{}' on line {line_number} occurs more than once",
                symbol as char
            );
            let values: Vec<i32> = tokens
                .map(|token| {
                    token.parse::<i32>().with_context(|| {
                        format!("Invalid score '{token}' on line {line_number}")
                    })
                })
                .collect::<Result<_>>()?;
            ensure!(
                values.len() == size,
                "Expected {size} scores on line {line_number}, found {}",
                values.len()
            );
            scores[row * size..(row + 1) * size].copy_from_slice(&values);
            seen[row] = true;
        }

        let missing = alphabet
            .iter()
            .zip(seen.iter())
            .filter(|&(_, &is_seen)| !is_seen)
            .map(|(&symbol, _)| symbol as char)
            .join(", ");
        ensure!(missing.is_empty(), "Missing rows for symbols: {missing}");

        debug!("Loaded a substitution matrix over {size} symbols");
        Ok(Self {
            alphabet,
            index,
            scores,
            gap_penalty,
        })
    }

    /// The symbols covered by this matrix, in header order.
    pub fn alphabet(&self) -> &[u8] {
        &self.alphabet
    }

    /// True if the symbol has a row (and column) in this matrix.
    pub fn contains(&self, symbol: u8) -> bool {
        self.index[symbol as usize].is_some()
    }

    #[inline(always)]
    fn index_of(&self, symbol: u8) -> Result<usize> {
        self.index[symbol as usize].with_context(|| {
            format!(
                "Symbol '{}' is not in the substitution matrix alphabet: {}",
                symbol.escape_ascii(),
                String::from_utf8_lossy(&self.alphabet)
            )
        })
    }
}

impl ScoringFunction for SubstitutionMatrix {
    fn gap_penalty(&self) -> i32 {
        self.gap_penalty
    }

    #[inline(always)]
    fn score(&self, a: u8, b: u8) -> Result<i32> {
        let row = self.index_of(a)?;
        let col = self.index_of(b)?;
        Ok(self.scores[row * self.alphabet.len() + col])
    }
}

/// Parses a single-character token into a symbol.
fn parse_symbol(token: &str) -> Result<u8> {
    match token.as_bytes() {
        [symbol] => Ok(*symbol),
        _ => Err(anyhow!("Expected a single-character symbol, found '{token}'")),
    }
}

/// One of the supported scoring functions, chosen once before the alignment starts.
#[enum_dispatch(ScoringFunction)]
#[derive(Clone, Debug)]
pub enum Scoring {
    MatchMismatch,
    NucleotideMatrix,
    SubstitutionMatrix,
}

/// The named scoring presets available on the command line.
#[derive(Default, Debug, PartialEq, Eq, Copy, Clone, Hash)]
pub enum ScoringPreset {
    /// Match `2`, mismatch `1`, gap `-1`; any supplied gap penalty is ignored.
    #[default]
    Default,
    /// Match `5`, mismatch `-4`, with the supplied gap penalty.
    DNAFull,
    /// The BLOSUM62 substitution matrix, with the supplied gap penalty.
    BLOSUM62,
}

impl ScoringPreset {
    /// True if a gap penalty must be supplied for this preset.
    pub fn requires_gap_penalty(&self) -> bool {
        !matches!(self, Self::Default)
    }

    /// Builds the scoring function for this preset.
    ///
    /// # Arguments
    ///
    /// * `gap_penalty` - the gap penalty; required by every preset except `Default`
    /// * `matrix` - an optional substitution matrix file replacing the bundled table; only valid
    ///   for `BLOSUM62`
    pub fn build(&self, gap_penalty: Option<i32>, matrix: Option<&Path>) -> Result<Scoring> {
        ensure!(
            matrix.is_none() || *self == Self::BLOSUM62,
            "A substitution matrix file may only be given with the {} preset",
            Self::BLOSUM62
        );
        let gap_penalty = match (self, gap_penalty) {
            (Self::Default, None) => DEFAULT_GAP_PENALTY,
            (Self::Default, Some(gap_penalty)) => {
                warn!(
                    "Ignoring the gap penalty ({gap_penalty}) for the {self} preset, using {}",
                    DEFAULT_GAP_PENALTY
                );
                DEFAULT_GAP_PENALTY
            }
            (_, Some(gap_penalty)) => gap_penalty,
            (_, None) => bail!("A gap penalty is required for the {self} preset"),
        };
        let scoring = match self {
            Self::Default => Scoring::from(MatchMismatch::default()),
            Self::DNAFull => Scoring::from(NucleotideMatrix::new(gap_penalty)),
            Self::BLOSUM62 => match matrix {
                Some(path) => Scoring::from(SubstitutionMatrix::from_path(&path, gap_penalty)?),
                None => Scoring::from(SubstitutionMatrix::blosum62(gap_penalty)?),
            },
        };
        Ok(scoring)
    }
}

impl Display for ScoringPreset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Default => write!(f, "Default"),
            Self::DNAFull => write!(f, "DNAFull"),
            Self::BLOSUM62 => write!(f, "BLOSUM62"),
        }
    }
}

impl FromStr for ScoringPreset {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "default" => Ok(ScoringPreset::Default),
            "dnafull" | "ednafull" => Ok(ScoringPreset::DNAFull),
            "blosum62" => Ok(ScoringPreset::BLOSUM62),
            _ => Err(anyhow!("Invalid scoring preset: {}", s)),
        }
    }
}

#[cfg(test)]
pub mod tests {
    use std::io::Write;

    use rstest::rstest;

    use super::{
        MatchMismatch, NucleotideMatrix, Scoring, ScoringFunction, ScoringPreset,
        SubstitutionMatrix,
    };

    const AMINO_ACIDS: &[u8; 20] = b"ARNDCQEGHILKMFPSTWYV";

    fn parse(table: &str) -> anyhow::Result<SubstitutionMatrix> {
        SubstitutionMatrix::parse(table.as_bytes(), -4)
    }

    #[rstest]
    #[case(b'A', b'A', 2)]
    #[case(b'A', b'C', 1)]
    #[case(b'a', b'A', 1)]
    fn test_default_match_mismatch(#[case] a: u8, #[case] b: u8, #[case] expected: i32) {
        let scoring = MatchMismatch::default();
        assert_eq!(scoring.score(a, b).unwrap(), expected);
        assert_eq!(scoring.gap_penalty(), -1);
    }

    #[rstest]
    fn test_nucleotide_matrix() {
        let scoring = NucleotideMatrix::new(-5);
        assert_eq!(scoring.score(b'G', b'G').unwrap(), 5);
        assert_eq!(scoring.score(b'G', b'T').unwrap(), -4);
        assert_eq!(scoring.gap_penalty(), -5);
        // any symbol is scored, there is no alphabet
        assert_eq!(scoring.score(b'N', b'N').unwrap(), 5);
    }

    #[rstest]
    fn test_bundled_blosum62_agrees_with_rust_bio() {
        let blosum62 = SubstitutionMatrix::blosum62(-1).unwrap();
        assert_eq!(blosum62.alphabet().len(), 24);
        for &a in AMINO_ACIDS {
            for &b in AMINO_ACIDS {
                assert_eq!(
                    blosum62.score(a, b).unwrap(),
                    bio::scores::blosum62(a, b),
                    "{}/{}",
                    a as char,
                    b as char
                );
            }
        }
    }

    #[rstest]
    fn test_bundled_blosum62_is_symmetric() {
        let blosum62 = SubstitutionMatrix::blosum62(-1).unwrap();
        for &a in blosum62.alphabet() {
            for &b in blosum62.alphabet() {
                assert_eq!(blosum62.score(a, b).unwrap(), blosum62.score(b, a).unwrap());
            }
        }
        assert_eq!(blosum62.score(b'W', b'W').unwrap(), 11);
        assert_eq!(blosum62.score(b'*', b'*').unwrap(), 1);
        assert_eq!(blosum62.score(b'X', b'*').unwrap(), -4);
    }

    #[rstest]
    fn test_symbol_outside_alphabet_fails() {
        let blosum62 = SubstitutionMatrix::blosum62(-1).unwrap();
        assert!(!blosum62.contains(b'J'));
        let err = blosum62.score(b'A', b'J').unwrap_err();
        assert!(err.to_string().contains("'J'"), "{err}");
        // case-sensitive
        assert!(blosum62.score(b'a', b'A').is_err());
    }

    #[rstest]
    fn test_parse_with_and_without_leading_blank_token() {
        let with_blank = parse("   A  B\nA  1 -2\nB -2  3\n").unwrap();
        let without_blank = parse("A B\nA 1 -2\nB -2 3\n").unwrap();
        assert_eq!(with_blank, without_blank);
        assert_eq!(with_blank.score(b'A', b'B').unwrap(), -2);
        assert_eq!(with_blank.score(b'B', b'B').unwrap(), 3);
        assert_eq!(with_blank.gap_penalty(), -4);
    }

    #[rstest]
    fn test_parse_skips_comments_and_blank_lines() {
        let matrix = parse("# a comment\n\n  A B\n\nA 1 0\n# another\nB 0 1\n\n").unwrap();
        assert_eq!(matrix.alphabet(), b"AB");
        assert_eq!(matrix.score(b'A', b'A').unwrap(), 1);
    }

    #[rstest]
    fn test_parse_rows_are_keyed_by_symbol() {
        let matrix = parse("A B\nB 7 8\nA 1 2\n").unwrap();
        assert_eq!(matrix.score(b'A', b'B').unwrap(), 2);
        assert_eq!(matrix.score(b'B', b'A').unwrap(), 7);
    }

    #[rstest]
    fn test_parse_asymmetric_lookup_uses_first_symbol_as_row() {
        let matrix = parse("A B\nA 0 -1\nB -3 0\n").unwrap();
        assert_eq!(matrix.score(b'A', b'B').unwrap(), -1);
        assert_eq!(matrix.score(b'B', b'A').unwrap(), -3);
    }

    #[rstest]
    #[case::empty("", "No alphabet header")]
    #[case::only_comments("# nothing\n\n", "No alphabet header")]
    #[case::multi_char_symbol("A BC\nA 1 2\n", "Invalid alphabet header")]
    #[case::duplicate_header("A A\nA 1 2\n", "more than once in the alphabet header")]
    #[case::not_an_integer("A B\nA 1 x\nB 1 1\n", "Invalid score 'x' on line 2")]
    #[case::short_row("A B\nA 1\nB 1 1\n", "Expected 2 scores on line 2, found 1")]
    #[case::long_row("A B\nA 1 1\nB 1 1 1\n", "Expected 2 scores on line 3, found 3")]
    #[case::unknown_row("A B\nA 1 1\nC 1 1\n", "Row symbol 'C' on line 3")]
    #[case::duplicate_row("A B\nA 1 1\nA 1 1\n", "occurs more than once")]
    #[case::missing_row("A B C\nA 1 1 1\nC 1 1 1\n", "Missing rows for symbols: B")]
    fn test_parse_errors(#[case] table: &str, #[case] message: &str) {
        let err = parse(table).unwrap_err();
        let chain = format!("{err:#}");
        assert!(chain.contains(message), "{chain}");
    }

    #[rstest]
    fn test_from_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "  A C\nA 3 -3\nC -3 3\n").unwrap();
        file.flush().unwrap();
        let matrix = SubstitutionMatrix::from_path(&file.path(), -2).unwrap();
        assert_eq!(matrix.score(b'C', b'A').unwrap(), -3);
        assert_eq!(matrix.gap_penalty(), -2);
    }

    #[rstest]
    fn test_from_path_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("BLOSUM62.dat");
        let err = SubstitutionMatrix::from_path(&path, -1).unwrap_err();
        assert!(err.to_string().contains("Could not open"), "{err}");
    }

    #[rstest]
    #[case("Default", ScoringPreset::Default)]
    #[case("default", ScoringPreset::Default)]
    #[case("DNAFull", ScoringPreset::DNAFull)]
    #[case("dnafull", ScoringPreset::DNAFull)]
    #[case("BLOSUM62", ScoringPreset::BLOSUM62)]
    #[case("blosum62", ScoringPreset::BLOSUM62)]
    fn test_preset_from_str(#[case] value: &str, #[case] expected: ScoringPreset) {
        assert_eq!(value.parse::<ScoringPreset>().unwrap(), expected);
    }

    #[rstest]
    fn test_preset_display_round_trips() {
        for preset in [
            ScoringPreset::Default,
            ScoringPreset::DNAFull,
            ScoringPreset::BLOSUM62,
        ] {
            assert_eq!(preset.to_string().parse::<ScoringPreset>().unwrap(), preset);
        }
        assert!("PAM250".parse::<ScoringPreset>().is_err());
    }

    #[rstest]
    fn test_default_preset_ignores_gap_penalty() {
        let scoring = ScoringPreset::Default.build(Some(-5), None).unwrap();
        assert!(matches!(scoring, Scoring::MatchMismatch(_)));
        assert_eq!(scoring.gap_penalty(), -1);
        assert_eq!(scoring.score(b'A', b'A').unwrap(), 2);
        assert_eq!(scoring.score(b'A', b'T').unwrap(), 1);
    }

    #[rstest]
    #[case(ScoringPreset::DNAFull)]
    #[case(ScoringPreset::BLOSUM62)]
    fn test_preset_requires_gap_penalty(#[case] preset: ScoringPreset) {
        assert!(preset.requires_gap_penalty());
        let err = preset.build(None, None).unwrap_err();
        assert!(err.to_string().contains("gap penalty is required"), "{err}");
    }

    #[rstest]
    fn test_dnafull_preset() {
        let scoring = ScoringPreset::DNAFull.build(Some(-5), None).unwrap();
        assert!(matches!(scoring, Scoring::NucleotideMatrix(_)));
        assert_eq!(scoring.gap_penalty(), -5);
        assert_eq!(scoring.score(b'A', b'A').unwrap(), 5);
        assert_eq!(scoring.score(b'A', b'C').unwrap(), -4);
    }

    #[rstest]
    fn test_blosum62_preset() {
        let scoring = ScoringPreset::BLOSUM62.build(Some(-8), None).unwrap();
        assert!(matches!(scoring, Scoring::SubstitutionMatrix(_)));
        assert_eq!(scoring.gap_penalty(), -8);
        assert_eq!(scoring.score(b'W', b'Y').unwrap(), 2);
    }

    #[rstest]
    fn test_blosum62_preset_with_matrix_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "A W\nA 1 2\nW 2 1\n").unwrap();
        file.flush().unwrap();
        let scoring = ScoringPreset::BLOSUM62
            .build(Some(-1), Some(file.path()))
            .unwrap();
        assert_eq!(scoring.score(b'W', b'A').unwrap(), 2);
        assert!(scoring.score(b'R', b'A').is_err());
    }

    #[rstest]
    fn test_matrix_file_only_with_blosum62() {
        let file = tempfile::NamedTempFile::new().unwrap();
        assert!(ScoringPreset::DNAFull
            .build(Some(-1), Some(file.path()))
            .is_err());
    }
}
