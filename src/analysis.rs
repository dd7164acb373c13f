//! Per-alignment statistics pipeline.
//!
//! Each alignment goes through:
//! - frame validation and stop codon masking (frame mode)
//! - diversity statistics (θ_W, π, Tajima's D)
//! - coding diversity (πN, πS) and one MK test per outgroup (frame mode)
//!
//! Configuration is passed explicitly through `AnalysisConfig`.

use std::borrow::Cow;
use std::path::PathBuf;

use log::{debug, warn};
use thiserror::Error;

use crate::fasta::{parse_fasta_file, FastaError};
use crate::genetic_code::GeneticCode;
use crate::input::AlignmentInput;
use crate::model::Alignment;
use crate::report::ReportTable;
use crate::stats::{
    coding_diversity, mk_table, site_diversity, DiversityOutcome, MkTable, DEFAULT_MAX_MISSING,
};

/// Settings shared by every alignment of a run.
#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    /// Alignments are in-frame coding sequences
    pub frame: bool,
    /// Outgroup labels, in report order
    pub outgroups: Vec<String>,
    /// Maximum fraction of missing data per site
    pub max_missing: f64,
    /// Code used to classify synonymous changes
    pub genetic_code: GeneticCode,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            frame: false,
            outgroups: Vec::new(),
            max_missing: DEFAULT_MAX_MISSING,
            genetic_code: GeneticCode::default(),
        }
    }
}

/// Errors that stop the whole run.
#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("Failed to load alignment {}: {source}", .path.display())]
    Fasta {
        path: PathBuf,
        #[source]
        source: FastaError,
    },

    #[error("{name} is not a valid alignment: {reason}")]
    Unaligned { name: String, reason: String },

    #[error("Outgroup '{outgroup}' is not present in alignment {alignment}")]
    MissingOutgroup { outgroup: String, alignment: String },
}

/// πN and πS of a coding alignment.
#[derive(Debug, Clone, PartialEq)]
pub struct CodingStats {
    pub pi_n: Option<f64>,
    pub pi_s: Option<f64>,
}

/// MK test against one outgroup.
#[derive(Debug, Clone, PartialEq)]
pub struct OutgroupTest {
    pub outgroup: String,
    pub table: MkTable,
    pub neutrality_index: Option<f64>,
}

/// Statistics of one accepted alignment.
#[derive(Debug, Clone, PartialEq)]
pub struct AlignmentStats {
    /// Watterson's θ per effective site
    pub theta: Option<f64>,
    /// π per effective site
    pub pi: Option<f64>,
    pub tajima_d: Option<f64>,
    pub nseff: Option<f64>,
    /// Present in frame mode only
    pub coding: Option<CodingStats>,
    /// One entry per outgroup, in configuration order
    pub outgroup_tests: Vec<OutgroupTest>,
}

impl AlignmentStats {
    pub fn outgroup_test(&self, outgroup: &str) -> Option<&OutgroupTest> {
        self.outgroup_tests.iter().find(|t| t.outgroup == outgroup)
    }
}

/// Result of analysing one alignment.
#[derive(Debug, Clone, PartialEq)]
pub enum StatResult {
    /// Rejected: frame mode is on and the length is not a multiple of 3
    OutOfFrame,
    Computed(AlignmentStats),
}

impl StatResult {
    pub fn stats(&self) -> Option<&AlignmentStats> {
        match self {
            StatResult::OutOfFrame => None,
            StatResult::Computed(stats) => Some(stats),
        }
    }
}

/// Ingroup and outgroup of one MK test.
#[derive(Debug, Clone)]
pub struct OutgroupPartition {
    pub ingroup: Alignment,
    pub outgroup: Alignment,
}

/// Builds the working alignment for the MK test against `outgroup`.
///
/// The last codon is dropped, every other outgroup of `outgroups` is removed
/// (first prefix match), and the first sequence matching `outgroup` becomes
/// the outgroup partition.
pub fn outgroup_partition(
    alignment: &Alignment,
    alignment_name: &str,
    outgroup: &str,
    outgroups: &[String],
) -> Result<OutgroupPartition, AnalysisError> {
    let mut working = alignment.without_last_codon();
    for other in outgroups.iter().filter(|o| o.as_str() != outgroup) {
        if let Some(index) = working.find(other, false) {
            working = working.without(index);
        }
    }

    let index = working
        .find(outgroup, false)
        .ok_or_else(|| AnalysisError::MissingOutgroup {
            outgroup: outgroup.to_string(),
            alignment: alignment_name.to_string(),
        })?;
    let (ingroup, outgroup) = working.split_off(index);
    Ok(OutgroupPartition { ingroup, outgroup })
}

/// Computes the statistics of one alignment.
pub fn analyze_alignment(
    name: &str,
    alignment: &Alignment,
    config: &AnalysisConfig,
) -> Result<StatResult, AnalysisError> {
    if !alignment.is_valid_alignment {
        return Err(AnalysisError::Unaligned {
            name: name.to_string(),
            reason: alignment.warning.clone().unwrap_or_default(),
        });
    }

    if config.frame && !alignment.is_in_frame() {
        warn!(
            "Alignment {} is not in frame (length {}), skipping",
            name,
            alignment.alignment_length()
        );
        return Ok(StatResult::OutOfFrame);
    }

    let alignment: Cow<'_, Alignment> = if config.frame {
        Cow::Owned(alignment.mask_stop_codons())
    } else {
        Cow::Borrowed(alignment)
    };

    let outcome = site_diversity(&alignment, config.max_missing);
    let mut stats = AlignmentStats {
        theta: None,
        pi: None,
        tajima_d: None,
        nseff: outcome.nseff(),
        coding: None,
        outgroup_tests: Vec::new(),
    };
    match outcome {
        DiversityOutcome::Estimated(d) => {
            stats.theta = Some(d.theta_per_site());
            stats.pi = Some(d.pi_per_site());
            stats.tajima_d = d.tajima_d;
        }
        DiversityOutcome::InsufficientData { .. } => {
            debug!("{}: not enough effective sites for diversity estimates", name);
        }
    }

    if !config.frame {
        return Ok(StatResult::Computed(stats));
    }

    let coding = coding_diversity(&alignment, &config.genetic_code, config.max_missing);
    debug!("{}: {} codon sites analysed", name, coding.codon_sites);
    stats.coding = Some(CodingStats {
        pi_n: coding.pi_n(),
        pi_s: coding.pi_s(),
    });

    for outgroup in &config.outgroups {
        let partition = outgroup_partition(&alignment, name, outgroup, &config.outgroups)?;
        let table = mk_table(&partition.ingroup, &partition.outgroup, &config.genetic_code);
        debug!("{}: MK table against {}: {}", name, outgroup, table);
        stats.outgroup_tests.push(OutgroupTest {
            outgroup: outgroup.clone(),
            neutrality_index: table.neutrality_index(),
            table,
        });
    }

    Ok(StatResult::Computed(stats))
}

/// Loads and analyses every input in order, collecting the results.
///
/// Stops at the first fatal error; no partial table is returned.
pub fn analyze_inputs(
    inputs: &[AlignmentInput],
    config: &AnalysisConfig,
) -> Result<ReportTable, AnalysisError> {
    let mut table = ReportTable::new(config.frame, config.outgroups.clone());

    for input in inputs {
        debug!("Loading {} from {}", input.name, input.path.display());
        let alignment = parse_fasta_file(&input.path).map_err(|source| AnalysisError::Fasta {
            path: input.path.clone(),
            source,
        })?;
        let result = analyze_alignment(&input.name, &alignment, config)?;
        table.insert(input.name.clone(), result);
    }

    Ok(table)
}
