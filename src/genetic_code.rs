//! Genetic code definitions and codon-level synonymy.
//!
//! This module provides:
//! - NCBI genetic code tables
//! - In-frame stop codon masking
//! - Codon indexing
//! - Nei-Gojobori synonymous site counts and pathway-averaged differences

use std::ops::AddAssign;

/// Stop codons masked before any statistic is computed (standard code).
pub const STOP_CODONS: [&[u8; 3]; 3] = [b"TAA", b"TAG", b"TGA"];

/// Replacement written over a masked stop codon.
pub const GAP_CODON: &[u8; 3] = b"---";

/// Weight of each codon position in a codon index (NCBI TCAG order).
const POSITION_WEIGHTS: [usize; 3] = [16, 4, 1];

/// Replaces every codon-aligned stop codon (case-insensitive) by `---`.
///
/// The output has the same length as the input. A trailing partial codon is
/// copied unchanged.
pub fn mask_stop_codons(sequence: &[u8]) -> Vec<u8> {
    let mut masked = Vec::with_capacity(sequence.len());
    for codon in sequence.chunks(3) {
        let is_stop = codon.len() == 3
            && STOP_CODONS
                .iter()
                .any(|stop| codon.eq_ignore_ascii_case(&stop[..]));
        if is_stop {
            masked.extend_from_slice(GAP_CODON);
        } else {
            masked.extend_from_slice(codon);
        }
    }
    masked
}

/// Maps a nucleotide to its NCBI rank (T, C, A, G). `U` is read as `T`.
fn base_rank(base: u8) -> Option<usize> {
    match base.to_ascii_uppercase() {
        b'T' | b'U' => Some(0),
        b'C' => Some(1),
        b'A' => Some(2),
        b'G' => Some(3),
        _ => None,
    }
}

/// Returns the index (0..64) of a complete codon, or `None` if the codon is
/// incomplete, gapped or ambiguous.
pub fn codon_index(codon: &[u8]) -> Option<usize> {
    if codon.len() != 3 {
        return None;
    }
    codon
        .iter()
        .zip(POSITION_WEIGHTS)
        .try_fold(0, |acc, (&base, weight)| Some(acc + base_rank(base)? * weight))
}

fn base_at(codon: usize, position: usize) -> usize {
    (codon / POSITION_WEIGHTS[position]) % 4
}

fn with_base(codon: usize, position: usize, base: usize) -> usize {
    codon - base_at(codon, position) * POSITION_WEIGHTS[position] + base * POSITION_WEIGHTS[position]
}

/// Synonymous and non-synonymous substitution counts.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Substitutions {
    pub synonymous: f64,
    pub nonsynonymous: f64,
}

impl Substitutions {
    pub fn new(synonymous: f64, nonsynonymous: f64) -> Self {
        Self {
            synonymous,
            nonsynonymous,
        }
    }

    pub fn total(&self) -> f64 {
        self.synonymous + self.nonsynonymous
    }
}

impl AddAssign for Substitutions {
    fn add_assign(&mut self, other: Self) {
        self.synonymous += other.synonymous;
        self.nonsynonymous += other.nonsynonymous;
    }
}

/// A genetic code table.
#[derive(Debug, Clone)]
pub struct GeneticCode {
    /// NCBI genetic code ID
    pub id: u8,
    /// Name of the genetic code
    pub name: String,
    /// Amino acid of each codon index, `*` for stops
    amino_acids: [u8; 64],
    /// Nei-Gojobori synonymous site count of each codon index
    synonymous_sites: [f64; 64],
}

impl GeneticCode {
    /// Creates a genetic code from an NCBI `ncbieaa` string (64 amino acids
    /// in TCAG order).
    fn new(id: u8, name: &str, ncbieaa: &str) -> Self {
        let mut amino_acids = [b'X'; 64];
        for (slot, aa) in amino_acids.iter_mut().zip(ncbieaa.bytes()) {
            *slot = aa;
        }

        let mut code = Self {
            id,
            name: name.to_string(),
            amino_acids,
            synonymous_sites: [0.0; 64],
        };
        for codon in 0..64 {
            code.synonymous_sites[codon] = code.count_synonymous_sites(codon);
        }
        code
    }

    /// Returns true if the codon index is a stop in this code.
    pub fn is_stop(&self, codon: usize) -> bool {
        self.amino_acids[codon] == b'*'
    }

    /// Index of a complete, non-stop codon.
    pub fn sense_codon(&self, codon: &[u8]) -> Option<usize> {
        codon_index(codon).filter(|&idx| !self.is_stop(idx))
    }

    /// Number of synonymous sites of a codon (0 to 3). Non-synonymous sites
    /// are `3 - synonymous_sites`.
    pub fn synonymous_sites(&self, codon: usize) -> f64 {
        self.synonymous_sites[codon]
    }

    fn count_synonymous_sites(&self, codon: usize) -> f64 {
        if self.is_stop(codon) {
            return 0.0;
        }
        let mut sites = 0.0;
        for position in 0..3 {
            let mut synonymous = 0;
            let mut sense = 0;
            for base in 0..4 {
                if base == base_at(codon, position) {
                    continue;
                }
                let mutant = with_base(codon, position, base);
                if self.is_stop(mutant) {
                    continue;
                }
                sense += 1;
                if self.amino_acids[mutant] == self.amino_acids[codon] {
                    synonymous += 1;
                }
            }
            if sense > 0 {
                sites += synonymous as f64 / sense as f64;
            }
        }
        sites
    }

    /// Synonymous and non-synonymous differences between two codons,
    /// averaged over all mutational pathways that avoid stop codons.
    ///
    /// If every pathway crosses a stop codon, all pathways are used.
    pub fn differences(&self, from: usize, to: usize) -> Substitutions {
        let positions: Vec<usize> = (0..3)
            .filter(|&p| base_at(from, p) != base_at(to, p))
            .collect();
        if positions.is_empty() {
            return Substitutions::default();
        }

        let paths = orderings(&positions);
        let walk = |order: &[usize], allow_stops: bool| -> Option<Substitutions> {
            let mut current = from;
            let mut counts = Substitutions::default();
            for &position in order {
                let next = with_base(current, position, base_at(to, position));
                if !allow_stops && next != to && self.is_stop(next) {
                    return None;
                }
                if self.amino_acids[next] == self.amino_acids[current] {
                    counts.synonymous += 1.0;
                } else {
                    counts.nonsynonymous += 1.0;
                }
                current = next;
            }
            Some(counts)
        };

        let mut valid: Vec<Substitutions> = paths.iter().filter_map(|p| walk(p, false)).collect();
        if valid.is_empty() {
            valid = paths.iter().filter_map(|p| walk(p, true)).collect();
        }

        let n = valid.len() as f64;
        let mut total = Substitutions::default();
        for counts in valid {
            total += counts;
        }
        Substitutions::new(total.synonymous / n, total.nonsynonymous / n)
    }
}

/// All orderings of a small set of codon positions.
fn orderings(positions: &[usize]) -> Vec<Vec<usize>> {
    if positions.len() <= 1 {
        return vec![positions.to_vec()];
    }
    let mut result = Vec::new();
    for (i, &first) in positions.iter().enumerate() {
        let mut rest = positions.to_vec();
        rest.remove(i);
        for mut tail in orderings(&rest) {
            tail.insert(0, first);
            result.push(tail);
        }
    }
    result
}

/// Genetic codes available on the command line.
pub struct GeneticCodes {
    codes: Vec<GeneticCode>,
}

impl GeneticCodes {
    pub fn new() -> Self {
        let codes = vec![
            GeneticCode::new(1, "Standard",
                "FFLLSSSSYY**CC*WLLLLPPPPHHQQRRRRIIIMTTTTNNKKSSRRVVVVAAAADDEEGGGG"),
            GeneticCode::new(2, "Vertebrate Mitochondrial",
                "FFLLSSSSYY**CCWWLLLLPPPPHHQQRRRRIIMMTTTTNNKKSS**VVVVAAAADDEEGGGG"),
            GeneticCode::new(3, "Yeast Mitochondrial",
                "FFLLSSSSYY**CCWWTTTTPPPPHHQQRRRRIIMMTTTTNNKKSSRRVVVVAAAADDEEGGGG"),
            GeneticCode::new(4, "Mold/Protozoan/Coelenterate Mitochondrial",
                "FFLLSSSSYY**CCWWLLLLPPPPHHQQRRRRIIIMTTTTNNKKSSRRVVVVAAAADDEEGGGG"),
            GeneticCode::new(5, "Invertebrate Mitochondrial",
                "FFLLSSSSYY**CCWWLLLLPPPPHHQQRRRRIIMMTTTTNNKKSSSSVVVVAAAADDEEGGGG"),
            GeneticCode::new(6, "Ciliate/Dasycladacean/Hexamita Nuclear",
                "FFLLSSSSYYQQCC*WLLLLPPPPHHQQRRRRIIIMTTTTNNKKSSRRVVVVAAAADDEEGGGG"),
            GeneticCode::new(9, "Echinoderm/Flatworm Mitochondrial",
                "FFLLSSSSYY**CCWWLLLLPPPPHHQQRRRRIIIMTTTTNNNKSSSSVVVVAAAADDEEGGGG"),
            GeneticCode::new(10, "Euplotid Nuclear",
                "FFLLSSSSYY**CCCWLLLLPPPPHHQQRRRRIIIMTTTTNNKKSSRRVVVVAAAADDEEGGGG"),
            GeneticCode::new(11, "Bacterial/Archaeal/Plant Plastid",
                "FFLLSSSSYY**CC*WLLLLPPPPHHQQRRRRIIIMTTTTNNKKSSRRVVVVAAAADDEEGGGG"),
            GeneticCode::new(12, "Alternative Yeast Nuclear",
                "FFLLSSSSYY**CC*WLLLSPPPPHHQQRRRRIIIMTTTTNNKKSSRRVVVVAAAADDEEGGGG"),
            GeneticCode::new(13, "Ascidian Mitochondrial",
                "FFLLSSSSYY**CCWWLLLLPPPPHHQQRRRRIIMMTTTTNNKKSSGGVVVVAAAADDEEGGGG"),
            GeneticCode::new(14, "Alternative Flatworm Mitochondrial",
                "FFLLSSSSYYY*CCWWLLLLPPPPHHQQRRRRIIIMTTTTNNNKSSSSVVVVAAAADDEEGGGG"),
            GeneticCode::new(21, "Trematode Mitochondrial",
                "FFLLSSSSYY**CCWWLLLLPPPPHHQQRRRRIIMMTTTTNNNKSSSSVVVVAAAADDEEGGGG"),
        ];

        Self { codes }
    }

    /// Returns all genetic codes.
    pub fn all(&self) -> &[GeneticCode] {
        &self.codes
    }

    /// Gets a genetic code by ID.
    pub fn get(&self, id: u8) -> Option<&GeneticCode> {
        self.codes.iter().find(|c| c.id == id)
    }

    /// Gets the default (Standard) genetic code.
    pub fn default_code(&self) -> &GeneticCode {
        self.get(1).expect("Standard genetic code should always exist")
    }
}

impl Default for GeneticCodes {
    fn default() -> Self {
        Self::new()
    }
}

impl Default for GeneticCode {
    fn default() -> Self {
        GeneticCodes::new().default_code().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn idx(codon: &str) -> usize {
        codon_index(codon.as_bytes()).unwrap()
    }

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn test_mask_replaces_stop_codons() {
        assert_eq!(mask_stop_codons(b"ATGTAAGGG"), b"ATG---GGG".to_vec());
        assert_eq!(mask_stop_codons(b"TAGTGAtaa"), b"---------".to_vec());
        assert_eq!(mask_stop_codons(b"ATGtGa"), b"ATG---".to_vec());
    }

    #[test]
    fn test_mask_only_codon_aligned_windows() {
        // TAA straddles codons 1 and 2, so it is not in frame
        assert_eq!(mask_stop_codons(b"ATAAGG"), b"ATAAGG".to_vec());
    }

    #[test]
    fn test_mask_keeps_partial_codon() {
        let masked = mask_stop_codons(b"ATGTAGTA");
        assert_eq!(masked, b"ATG---TA".to_vec());
        assert_eq!(masked.len(), 8);
    }

    #[test]
    fn test_mask_is_idempotent() {
        for seq in [&b"TAATAGTGA"[..], &b"ATGCCCTGAT"[..], &b"tagNNN---"[..], &b""[..]] {
            let once = mask_stop_codons(seq);
            assert_eq!(once.len(), seq.len());
            assert_eq!(mask_stop_codons(&once), once);
        }
    }

    #[test]
    fn test_codon_index() {
        assert_eq!(codon_index(b"TTT"), Some(0));
        assert_eq!(codon_index(b"GGG"), Some(63));
        assert_eq!(codon_index(b"uuu"), Some(0));
        assert_eq!(codon_index(b"ATN"), None);
        assert_eq!(codon_index(b"A-G"), None);
        assert_eq!(codon_index(b"AT"), None);
    }

    #[test]
    fn test_sense_codon_rejects_stops() {
        let code = GeneticCode::default();
        assert!(code.sense_codon(b"TGA").is_none());
        assert!(code.sense_codon(b"NNN").is_none());
        assert_eq!(code.sense_codon(b"ATG"), Some(idx("ATG")));
    }

    #[test]
    fn test_synonymous_sites() {
        let code = GeneticCode::default();
        assert_close(code.synonymous_sites(idx("TTT")), 1.0 / 3.0);
        assert_close(code.synonymous_sites(idx("CTG")), 4.0 / 3.0);
        assert_close(code.synonymous_sites(idx("GGG")), 1.0);
        assert_close(code.synonymous_sites(idx("ATG")), 0.0);
    }

    #[test]
    fn test_single_position_differences() {
        let code = GeneticCode::default();
        assert_eq!(code.differences(idx("TTT"), idx("TTC")), Substitutions::new(1.0, 0.0));
        assert_eq!(code.differences(idx("TTT"), idx("CTT")), Substitutions::new(0.0, 1.0));
        assert_eq!(code.differences(idx("GGG"), idx("GGG")), Substitutions::default());
    }

    #[test]
    fn test_pathway_averaging() {
        let code = GeneticCode::default();
        // TTT->CTT->CTC and TTT->TTC->CTC both give one of each
        let diff = code.differences(idx("TTT"), idx("CTC"));
        assert_close(diff.synonymous, 1.0);
        assert_close(diff.nonsynonymous, 1.0);
    }

    #[test]
    fn test_pathways_through_stop_are_skipped() {
        let code = GeneticCode::default();
        // TAT->TAG is a stop, so only TAT->TGT->TGG counts
        let diff = code.differences(idx("TAT"), idx("TGG"));
        assert_close(diff.synonymous, 0.0);
        assert_close(diff.nonsynonymous, 2.0);
    }

    #[test]
    fn test_different_genetic_codes() {
        let codes = GeneticCodes::new();
        let standard = codes.get(1).unwrap();
        assert!(standard.is_stop(idx("TGA")));

        let vert_mito = codes.get(2).unwrap();
        assert!(!vert_mito.is_stop(idx("TGA")));
        assert_eq!(vert_mito.amino_acids[idx("TGA")], b'W');
        assert!(vert_mito.is_stop(idx("AGA")));
        assert!(codes.get(7).is_none());
    }
}
