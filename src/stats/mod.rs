//! Population genetics statistics over nucleotide alignments.
//!
//! - Diversity metrics with a per-site missing-data threshold (θ_W, π,
//!   Tajima's D)
//! - Coding diversity (πN, πS)
//! - McDonald-Kreitman tables and the neutrality index

pub mod coding;
pub mod diversity;

pub use coding::{coding_diversity, mk_table, CodingDiversity, MkTable};
pub use diversity::{site_diversity, Diversity, DiversityOutcome, DEFAULT_MAX_MISSING};

/// Returns true when the fraction of missing entries exceeds `max_missing`.
pub(crate) fn exceeds_missing(missing: usize, total: usize, max_missing: f64) -> bool {
    total == 0 || missing as f64 / total as f64 > max_missing
}
