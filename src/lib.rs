//! # selstats - Diversity and selection statistics for coding alignments
//!
//! Computes Watterson's θ, nucleotide diversity π, Tajima's D, πN/πS and
//! McDonald-Kreitman tables over FASTA alignments, and writes one
//! tab-separated report.
//!
//! ## Architecture
//!
//! The tool is a single linear pipeline:
//! - `input`: resolves a file or a directory of `*.fasta` files
//! - `fasta`: FASTA parsing and validation
//! - `model`: sequences and alignments, with pure transforms
//! - `genetic_code`: genetic codes, stop codon masking, codon synonymy
//! - `stats`: diversity, coding diversity and MK estimators
//! - `analysis`: per-alignment orchestration and aggregation
//! - `report`: tab-separated output

pub mod analysis;
pub mod fasta;
pub mod genetic_code;
pub mod input;
pub mod model;
pub mod report;
pub mod stats;
