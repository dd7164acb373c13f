//! FASTA alignment parser.
//!
//! Handles single-line and multi-line sequences and checks that every
//! residue belongs to the nucleotide alphabet.
//!
//! ## FASTA Format
//!
//! ```text
//! >sequence_identifier optional description
//! ATGACGTACGT...
//! >another_sequence
//! ATGATGCATGCA...
//! ```

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use thiserror::Error;

use crate::model::{Alignment, Sequence};

/// Errors that can occur during FASTA parsing.
#[derive(Error, Debug)]
pub enum FastaError {
    #[error("Failed to read file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Empty FASTA file")]
    EmptyFile,

    #[error("Invalid FASTA format: {0}")]
    InvalidFormat(String),

    #[error("Sequence without header at line {0}")]
    SequenceWithoutHeader(usize),

    #[error("Invalid nucleotide '{character}' in sequence '{id}' at line {line}")]
    InvalidCharacter { id: String, character: char, line: usize },
}

/// Result type for FASTA operations.
pub type FastaResult<T> = Result<T, FastaError>;

/// Returns true for characters accepted in a nucleotide alignment:
/// bases, IUPAC ambiguity codes, and missing-data symbols.
fn is_nucleotide(byte: u8) -> bool {
    matches!(
        byte.to_ascii_uppercase(),
        b'A' | b'C' | b'G' | b'T' | b'U'
            | b'R' | b'Y' | b'S' | b'W' | b'K' | b'M'
            | b'B' | b'D' | b'H' | b'V' | b'N'
            | b'-' | b'?'
    )
}

/// Parses a FASTA file and returns an Alignment.
///
/// # Examples
///
/// ```no_run
/// use selstats::fasta::parse_fasta_file;
///
/// let alignment = parse_fasta_file("geneA.fasta").unwrap();
/// println!("Loaded {} sequences", alignment.sequence_count());
/// ```
pub fn parse_fasta_file<P: AsRef<Path>>(path: P) -> FastaResult<Alignment> {
    let file = File::open(path)?;
    parse_fasta(BufReader::new(file))
}

/// Parses FASTA content from a reader.
pub fn parse_fasta<R: BufRead>(reader: R) -> FastaResult<Alignment> {
    let mut sequences = Vec::new();
    let mut current_id: Option<String> = None;
    let mut current_seq: Vec<u8> = Vec::new();

    for (index, line_result) in reader.lines().enumerate() {
        let line_number = index + 1;
        let line = line_result?;
        let line = line.trim();

        if line.is_empty() {
            continue;
        }

        if let Some(header) = line.strip_prefix('>') {
            if let Some(id) = current_id.take() {
                sequences.push(finish_record(id, std::mem::take(&mut current_seq))?);
            }

            // Everything before the first space is the label
            let id = header.split_whitespace().next().unwrap_or(header);
            if id.is_empty() {
                return Err(FastaError::InvalidFormat(format!(
                    "Empty sequence identifier at line {}",
                    line_number
                )));
            }
            current_id = Some(id.to_string());
        } else {
            let Some(id) = current_id.as_ref() else {
                return Err(FastaError::SequenceWithoutHeader(line_number));
            };

            for byte in line.bytes().filter(|b| !b.is_ascii_whitespace()) {
                if !is_nucleotide(byte) {
                    return Err(FastaError::InvalidCharacter {
                        id: id.clone(),
                        character: byte as char,
                        line: line_number,
                    });
                }
                current_seq.push(byte);
            }
        }
    }

    if let Some(id) = current_id {
        sequences.push(finish_record(id, current_seq)?);
    }

    if sequences.is_empty() {
        return Err(FastaError::EmptyFile);
    }

    Ok(Alignment::new(sequences))
}

/// Closes a record. A header followed by no residues is an error.
fn finish_record(id: String, data: Vec<u8>) -> FastaResult<Sequence> {
    if data.is_empty() {
        return Err(FastaError::InvalidFormat(format!("Sequence '{}' has no residues", id)));
    }
    Ok(Sequence::from_bytes(id, data))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_fasta_str(content: &str) -> FastaResult<Alignment> {
        parse_fasta(content.as_bytes())
    }

    #[test]
    fn test_parse_simple_fasta() {
        let content = ">seq1\nACGT\n>seq2\nTGCA\n";
        let alignment = parse_fasta_str(content).unwrap();

        assert_eq!(alignment.sequence_count(), 2);
        assert_eq!(alignment.get(0).unwrap().id, "seq1");
        assert_eq!(alignment.get(0).unwrap().as_str(), "ACGT");
        assert_eq!(alignment.get(1).unwrap().id, "seq2");
        assert_eq!(alignment.get(1).unwrap().as_str(), "TGCA");
    }

    #[test]
    fn test_parse_multiline_sequence() {
        let content = ">seq1\nACGT\nTGCA\nAAAA\n";
        let alignment = parse_fasta_str(content).unwrap();

        assert_eq!(alignment.sequence_count(), 1);
        assert_eq!(alignment.get(0).unwrap().as_str(), "ACGTTGCAAAAA");
    }

    #[test]
    fn test_parse_with_description() {
        let content = ">seq1 This is a description\nACGT\n";
        let alignment = parse_fasta_str(content).unwrap();

        assert_eq!(alignment.get(0).unwrap().id, "seq1");
    }

    #[test]
    fn test_parse_with_empty_lines_and_gaps() {
        let content = ">seq1\nAC-T\n\n>seq2\n\nTNCA\n";
        let alignment = parse_fasta_str(content).unwrap();

        assert_eq!(alignment.sequence_count(), 2);
        assert_eq!(alignment.get(0).unwrap().as_str(), "AC-T");
        assert_eq!(alignment.get(1).unwrap().as_str(), "TNCA");
    }

    #[test]
    fn test_empty_file() {
        let result = parse_fasta_str("");
        assert!(matches!(result, Err(FastaError::EmptyFile)));
    }

    #[test]
    fn test_sequence_without_header() {
        let content = "ACGT\n>seq1\nTGCA\n";
        let result = parse_fasta_str(content);
        assert!(matches!(result, Err(FastaError::SequenceWithoutHeader(1))));
    }

    #[test]
    fn test_empty_identifier() {
        let result = parse_fasta_str(">\nACGT\n");
        assert!(matches!(result, Err(FastaError::InvalidFormat(_))));
    }

    #[test]
    fn test_record_without_residues() {
        let content = ">ind1\nATGAAA\n>dsim\n\n>ind2\nATGAAG\n";
        match parse_fasta_str(content) {
            Err(FastaError::InvalidFormat(msg)) => assert!(msg.contains("'dsim'")),
            other => panic!("expected InvalidFormat, got {:?}", other),
        }

        let trailing = parse_fasta_str(">ind1\nATGAAA\n>dsim\n");
        assert!(matches!(trailing, Err(FastaError::InvalidFormat(_))));
    }

    #[test]
    fn test_rejects_protein_residues() {
        let content = ">seq1\nACGT\n>seq2\nMKLE\n";
        match parse_fasta_str(content) {
            Err(FastaError::InvalidCharacter { id, character, line }) => {
                assert_eq!(id, "seq2");
                assert_eq!(character, 'L');
                assert_eq!(line, 4);
            }
            other => panic!("expected InvalidCharacter, got {:?}", other),
        }
    }

    #[test]
    fn test_alignment_validation() {
        let alignment = parse_fasta_str(">seq1\nACGT\n>seq2\nTGCA\n").unwrap();
        assert!(alignment.is_valid_alignment);

        let alignment = parse_fasta_str(">seq1\nACGT\n>seq2\nTG\n").unwrap();
        assert!(!alignment.is_valid_alignment);
        assert!(alignment.warning.is_some());
    }

    #[test]
    fn test_case_preservation() {
        let alignment = parse_fasta_str(">seq1\nacgt\n").unwrap();
        assert_eq!(alignment.get(0).unwrap().as_str(), "acgt");
    }
}
