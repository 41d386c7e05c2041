use std::{io::BufRead, path::Path};

use anyhow::{ensure, Context, Result};
use fgoxide::io::Io;
use log::{info, warn};
use seq_io::fasta::{Reader as FastaReader, Record as FastaRecord};

/// 128 KB default buffer size, same as pigz.
pub const BUFFER_SIZE: usize = 64 * (1 << 10) * 2;

/// Reads the sequence of the first FASTA record in the given file.
///
/// The header line is discarded and the sequence lines are concatenated.  Symbols are kept as
/// they are in the file (no case conversion).  Any records after the first are ignored.  The file
/// may be GZIP compressed (`.gz` or `.bgz`).
pub fn read_sequence<P: AsRef<Path>>(path: &P) -> Result<Vec<u8>> {
    let path = path.as_ref();
    let fg_io: Io = Io::new(5, BUFFER_SIZE);
    let source: FastaReader<Box<dyn BufRead + Send>> = FastaReader::with_capacity(
        fg_io
            .new_reader(&path)
            .with_context(|| format!("Could not open sequence file: {}", path.display()))?,
        BUFFER_SIZE,
    );
    sequence_from_reader(source)
        .with_context(|| format!("Invalid sequence file: {}", path.display()))
}

/// Reads one sequence from each of the given files, in order.
pub fn read_sequences<P: AsRef<Path>>(paths: &[P]) -> Result<Vec<Vec<u8>>> {
    paths
        .iter()
        .map(|path| {
            let sequence = read_sequence(path)?;
            info!(
                "Read a sequence of length {} from {}",
                sequence.len(),
                path.as_ref().display()
            );
            Ok(sequence)
        })
        .collect()
}

fn sequence_from_reader<R: std::io::Read>(mut source: FastaReader<R>) -> Result<Vec<u8>> {
    let record = source
        .next()
        .context("Found no sequence record")?
        .context("Error reading FASTA")?;
    let sequence = record.full_seq().into_owned();
    let name = String::from_utf8_lossy(record.head()).into_owned();
    ensure!(!sequence.is_empty(), "Empty sequence for record: {name}");

    if let Some(next) = source.next() {
        let next = next.context("Error reading FASTA")?;
        warn!(
            "Ignoring records after '{name}', starting with '{}'",
            String::from_utf8_lossy(next.head())
        );
    }
    Ok(sequence)
}

#[cfg(test)]
pub mod tests {
    use std::io::Write;

    use rstest::rstest;
    use tempfile::NamedTempFile;

    use super::{read_sequence, read_sequences};

    fn fasta(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{contents}").unwrap();
        file.flush().unwrap();
        file
    }

    #[rstest]
    fn test_header_is_discarded_and_lines_are_concatenated() {
        let file = fasta(">seq1 some description\nACGT\nacgt\nNN\n");
        assert_eq!(read_sequence(&file.path()).unwrap(), b"ACGTacgtNN");
    }

    #[rstest]
    fn test_windows_line_endings() {
        let file = fasta(">seq1\r\nACGT\r\nTT\r\n");
        assert_eq!(read_sequence(&file.path()).unwrap(), b"ACGTTT");
    }

    #[rstest]
    fn test_only_the_first_record_is_read() {
        let file = fasta(">first\nAC\nGT\n>second\nTTTT\n");
        assert_eq!(read_sequence(&file.path()).unwrap(), b"ACGT");
    }

    #[rstest]
    fn test_read_sequences_keeps_order() {
        let first = fasta(">a\nAAA\n");
        let second = fasta(">b\nCC\n");
        let sequences = read_sequences(&[first.path(), second.path()]).unwrap();
        assert_eq!(sequences, vec![b"AAA".to_vec(), b"CC".to_vec()]);
    }

    #[rstest]
    #[case::empty_file("")]
    #[case::header_only(">empty\n")]
    #[case::no_header("ACGT\n")]
    fn test_invalid_sequence_files(#[case] contents: &str) {
        let file = fasta(contents);
        let err = read_sequence(&file.path()).unwrap_err();
        assert!(format!("{err:#}").contains("Invalid sequence file"), "{err:#}");
    }

    #[rstest]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_sequence(&dir.path().join("missing.fasta")).unwrap_err();
        assert!(err.to_string().contains("Could not open"), "{err}");
    }
}
