//! Data model for sequence alignments.
//!
//! Alignments are treated as values: masking, trimming and pruning return a
//! new `Alignment` and leave the original untouched, so every MK working copy
//! is built independently from the loaded alignment.

use std::ops::Range;

use crate::genetic_code::mask_stop_codons;

/// Represents a single sequence with its identifier and data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sequence {
    /// The sequence identifier (from FASTA header, without '>')
    pub id: String,
    /// The nucleotide data, as read from the file
    data: Vec<u8>,
}

impl Sequence {
    /// Creates a new sequence.
    pub fn new(id: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            data: data.into().into_bytes(),
        }
    }

    /// Creates a sequence from raw bytes.
    pub fn from_bytes(id: impl Into<String>, data: Vec<u8>) -> Self {
        Self { id: id.into(), data }
    }

    /// Returns the length of the sequence.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns true if the sequence is empty.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Sequence data as text. Parsed sequences are always ASCII.
    pub fn as_str(&self) -> &str {
        std::str::from_utf8(&self.data).unwrap_or_default()
    }

    /// Codon at a codon index, if complete.
    pub fn codon(&self, index: usize) -> Option<&[u8]> {
        self.data.get(index * 3..index * 3 + 3)
    }

    /// Returns true if the label matches `name`: equality when `strict`,
    /// prefix otherwise.
    pub fn matches(&self, name: &str, strict: bool) -> bool {
        if strict {
            self.id == name
        } else {
            self.id.starts_with(name)
        }
    }
}

/// Represents an alignment of multiple sequences.
#[derive(Debug, Clone)]
pub struct Alignment {
    /// All sequences in the alignment
    pub sequences: Vec<Sequence>,
    /// The expected length of all sequences (if aligned)
    alignment_length: Option<usize>,
    /// Whether all sequences have the same length
    pub is_valid_alignment: bool,
    /// Warning message if sequences have different lengths
    pub warning: Option<String>,
}

impl Alignment {
    /// Creates a new alignment from a vector of sequences.
    pub fn new(sequences: Vec<Sequence>) -> Self {
        let (is_valid, alignment_length, warning) = Self::validate_alignment(&sequences);
        Self {
            sequences,
            alignment_length,
            is_valid_alignment: is_valid,
            warning,
        }
    }

    /// Validates that all sequences have the same length.
    fn validate_alignment(sequences: &[Sequence]) -> (bool, Option<usize>, Option<String>) {
        if sequences.is_empty() {
            return (true, None, None);
        }

        let first_len = sequences[0].len();
        let all_same = sequences.iter().all(|s| s.len() == first_len);

        if all_same {
            (true, Some(first_len), None)
        } else {
            let min_len = sequences.iter().map(|s| s.len()).min().unwrap_or(0);
            let max_len = sequences.iter().map(|s| s.len()).max().unwrap_or(0);
            let warning = format!(
                "Sequences have different lengths (min: {}, max: {}). Not a valid alignment.",
                min_len, max_len
            );
            (false, Some(max_len), Some(warning))
        }
    }

    /// Returns the number of sequences.
    pub fn sequence_count(&self) -> usize {
        self.sequences.len()
    }

    /// Returns the alignment length (max sequence length).
    pub fn alignment_length(&self) -> usize {
        self.alignment_length.unwrap_or(0)
    }

    /// Number of complete codons.
    pub fn codon_count(&self) -> usize {
        self.alignment_length() / 3
    }

    /// Returns true if the alignment length is a multiple of 3.
    pub fn is_in_frame(&self) -> bool {
        self.alignment_length() % 3 == 0
    }

    /// Gets a sequence by index.
    pub fn get(&self, index: usize) -> Option<&Sequence> {
        self.sequences.get(index)
    }

    /// Returns true if the alignment is empty.
    pub fn is_empty(&self) -> bool {
        self.sequences.is_empty()
    }

    /// Index of the first sequence whose label matches `name`.
    pub fn find(&self, name: &str, strict: bool) -> Option<usize> {
        self.sequences.iter().position(|s| s.matches(name, strict))
    }

    /// Applies a transform to every sequence, keeping labels.
    pub fn map_sequences<F>(&self, f: F) -> Alignment
    where
        F: Fn(&[u8]) -> Vec<u8>,
    {
        Alignment::new(
            self.sequences
                .iter()
                .map(|s| Sequence::from_bytes(s.id.clone(), f(s.as_bytes())))
                .collect(),
        )
    }

    /// Copy with every in-frame stop codon replaced by `---`.
    pub fn mask_stop_codons(&self) -> Alignment {
        self.map_sequences(mask_stop_codons)
    }

    /// Copy restricted to the columns in `range`.
    pub fn extract(&self, range: Range<usize>) -> Alignment {
        self.map_sequences(|data| {
            let start = range.start.min(data.len());
            let end = range.end.min(data.len()).max(start);
            data[start..end].to_vec()
        })
    }

    /// Copy without the last codon (three columns).
    pub fn without_last_codon(&self) -> Alignment {
        self.extract(0..self.alignment_length().saturating_sub(3))
    }

    /// Copy without the sequence at `index`.
    pub fn without(&self, index: usize) -> Alignment {
        Alignment::new(
            self.sequences
                .iter()
                .enumerate()
                .filter(|&(i, _)| i != index)
                .map(|(_, s)| s.clone())
                .collect(),
        )
    }

    /// Splits the sequence at `index` off into its own alignment.
    ///
    /// Returns `(rest, selected)`.
    pub fn split_off(&self, index: usize) -> (Alignment, Alignment) {
        let selected = self.sequences.get(index).cloned().into_iter().collect();
        (self.without(index), Alignment::new(selected))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alignment(rows: &[(&str, &str)]) -> Alignment {
        Alignment::new(rows.iter().map(|(id, data)| Sequence::new(*id, *data)).collect())
    }

    #[test]
    fn test_sequence_creation() {
        let seq = Sequence::new("seq1", "ACGT");
        assert_eq!(seq.id, "seq1");
        assert_eq!(seq.as_str(), "ACGT");
        assert_eq!(seq.len(), 4);
    }

    #[test]
    fn test_sequence_codon() {
        let seq = Sequence::new("seq1", "ATGCCCTA");
        assert_eq!(seq.codon(0), Some(&b"ATG"[..]));
        assert_eq!(seq.codon(1), Some(&b"CCC"[..]));
        assert_eq!(seq.codon(2), None);
    }

    #[test]
    fn test_label_matching() {
        let seq = Sequence::new("Dsim_ref", "ACGT");
        assert!(seq.matches("Dsim", false));
        assert!(!seq.matches("Dsim", true));
        assert!(seq.matches("Dsim_ref", true));
        assert!(!seq.matches("ref", false));
    }

    #[test]
    fn test_alignment_valid() {
        let aln = alignment(&[("seq1", "ACGT"), ("seq2", "TGCA")]);
        assert!(aln.is_valid_alignment);
        assert!(aln.warning.is_none());
        assert_eq!(aln.alignment_length(), 4);
        assert!(!aln.is_in_frame());
    }

    #[test]
    fn test_alignment_invalid() {
        let aln = alignment(&[("seq1", "ACGT"), ("seq2", "TG")]);
        assert!(!aln.is_valid_alignment);
        assert!(aln.warning.is_some());
    }

    #[test]
    fn test_mask_returns_new_alignment() {
        let aln = alignment(&[("a", "ATGTAA"), ("b", "ATGTGG")]);
        let masked = aln.mask_stop_codons();
        assert_eq!(masked.get(0).unwrap().as_str(), "ATG---");
        assert_eq!(masked.get(1).unwrap().as_str(), "ATGTGG");
        assert_eq!(aln.get(0).unwrap().as_str(), "ATGTAA");
    }

    #[test]
    fn test_without_last_codon() {
        let aln = alignment(&[("a", "ATGCCCTAA"), ("b", "ATGCCTTAG")]);
        let trimmed = aln.without_last_codon();
        assert_eq!(trimmed.alignment_length(), 6);
        assert_eq!(trimmed.get(1).unwrap().as_str(), "ATGCCT");

        let tiny = alignment(&[("a", "AT")]);
        assert_eq!(tiny.without_last_codon().alignment_length(), 0);
    }

    #[test]
    fn test_find_and_remove() {
        let aln = alignment(&[("in1", "AAA"), ("outA", "CCC"), ("in2", "GGG")]);
        assert_eq!(aln.find("out", false), Some(1));
        assert_eq!(aln.find("out", true), None);

        let pruned = aln.without(1);
        assert_eq!(pruned.sequence_count(), 2);
        assert!(pruned.find("out", false).is_none());
        assert_eq!(aln.sequence_count(), 3);
    }

    #[test]
    fn test_split_off() {
        let aln = alignment(&[("in1", "AAA"), ("outA", "CCC"), ("in2", "GGG")]);
        let (rest, selected) = aln.split_off(1);
        assert_eq!(rest.sequence_count(), 2);
        assert_eq!(selected.sequence_count(), 1);
        assert_eq!(selected.get(0).unwrap().id, "outA");
    }
}
