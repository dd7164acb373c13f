//! Diversity metrics for nucleotide alignments
//!
//! Implements the standard per-site estimators:
//! - Watterson's estimator (θ_W)
//! - Nucleotide diversity (π)
//! - Tajima's D
//!
//! Sites with too much missing data are excluded. The remaining sites give
//! the effective length (`lseff`) and the effective sample size (`nseff`).

use crate::model::Alignment;

use super::exceeds_missing;

/// Default maximum fraction of missing samples for a site to be analysed.
pub const DEFAULT_MAX_MISSING: f64 = 0.2;

/// Maps an exploitable base to an allele index. Anything else is missing.
fn allele(base: u8) -> Option<usize> {
    match base.to_ascii_uppercase() {
        b'A' => Some(0),
        b'C' => Some(1),
        b'G' => Some(2),
        b'T' | b'U' => Some(3),
        _ => None,
    }
}

/// a_n = sum of 1/i for i in 1..n
pub fn harmonic_number(n: usize) -> f64 {
    (1..n).map(|i| 1.0 / i as f64).sum()
}

/// Diversity statistics of one alignment.
#[derive(Debug, Clone, PartialEq)]
pub struct Diversity {
    /// Number of analysed sites
    pub lseff: usize,
    /// Mean number of exploitable samples over analysed sites
    pub nseff: f64,
    /// Number of polymorphic analysed sites
    pub segregating_sites: usize,
    /// Watterson's θ summed over sites
    pub theta_w: f64,
    /// π summed over sites
    pub pi: f64,
    /// Tajima's D, if defined
    pub tajima_d: Option<f64>,
}

impl Diversity {
    pub fn theta_per_site(&self) -> f64 {
        self.theta_w / self.lseff as f64
    }

    pub fn pi_per_site(&self) -> f64 {
        self.pi / self.lseff as f64
    }
}

/// Outcome of a diversity computation.
#[derive(Debug, Clone, PartialEq)]
pub enum DiversityOutcome {
    Estimated(Diversity),
    /// Too few effective sites or samples. `nseff` is still reported when at
    /// least one site passed the missing-data filter.
    InsufficientData { nseff: Option<f64> },
}

impl DiversityOutcome {
    pub fn nseff(&self) -> Option<f64> {
        match self {
            DiversityOutcome::Estimated(d) => Some(d.nseff),
            DiversityOutcome::InsufficientData { nseff } => *nseff,
        }
    }
}

/// Computes θ_W, π and Tajima's D over the sites of `alignment` whose
/// fraction of missing data does not exceed `max_missing`.
///
/// Per analysed site with n exploitable samples:
///
/// $$\theta_W = \sum \frac{1}{a_n}, \quad \pi = \sum \frac{n}{n-1}\left(1 - \sum_k p_k^2\right)$$
///
/// # References
///
/// Watterson, G. A. (1975). On the number of segregating sites in genetical
/// models without recombination. Theoretical Population Biology, 7(2), 256-276.
///
/// Tajima, F. (1989). Statistical method for testing the neutral mutation
/// hypothesis by DNA polymorphism. Genetics, 123(3), 585-595.
pub fn site_diversity(alignment: &Alignment, max_missing: f64) -> DiversityOutcome {
    let ns = alignment.sequence_count();
    let mut lseff = 0usize;
    let mut samples = 0usize;
    let mut segregating = 0usize;
    let mut theta_w = 0.0;
    let mut pi = 0.0;

    for site in 0..alignment.alignment_length() {
        let mut counts = [0usize; 4];
        for seq in &alignment.sequences {
            if let Some(a) = seq.as_bytes().get(site).copied().and_then(allele) {
                counts[a] += 1;
            }
        }
        let n: usize = counts.iter().sum();
        if exceeds_missing(ns - n, ns, max_missing) {
            continue;
        }

        lseff += 1;
        samples += n;
        if n < 2 {
            continue;
        }

        let alleles = counts.iter().filter(|&&c| c > 0).count();
        if alleles > 1 {
            segregating += 1;
            theta_w += 1.0 / harmonic_number(n);
        }
        let homozygosity: f64 = counts
            .iter()
            .map(|&c| {
                let p = c as f64 / n as f64;
                p * p
            })
            .sum();
        pi += n as f64 / (n - 1) as f64 * (1.0 - homozygosity);
    }

    if lseff == 0 {
        return DiversityOutcome::InsufficientData { nseff: None };
    }
    let nseff = samples as f64 / lseff as f64;
    if nseff < 2.0 {
        return DiversityOutcome::InsufficientData { nseff: Some(nseff) };
    }

    let n = nseff.round() as usize;
    DiversityOutcome::Estimated(Diversity {
        lseff,
        nseff,
        segregating_sites: segregating,
        theta_w,
        pi,
        tajima_d: tajimas_d(n, segregating, pi),
    })
}

/// Tajima's D from the sample size, the number of segregating sites and π.
///
/// Returns `None` without segregating sites or when the variance term is
/// not positive (n < 3).
pub fn tajimas_d(n: usize, segregating_sites: usize, pi: f64) -> Option<f64> {
    if segregating_sites == 0 || n < 3 {
        return None;
    }

    let n_f64 = n as f64;
    let s = segregating_sites as f64;
    let a1 = harmonic_number(n);
    let a2: f64 = (1..n).map(|i| 1.0 / (i * i) as f64).sum();

    let b1 = (n_f64 + 1.0) / (3.0 * (n_f64 - 1.0));
    let b2 = 2.0 * (n_f64 * n_f64 + n_f64 + 3.0) / (9.0 * n_f64 * (n_f64 - 1.0));

    let c1 = b1 - 1.0 / a1;
    let c2 = b2 - (n_f64 + 2.0) / (a1 * n_f64) + a2 / (a1 * a1);

    let e1 = c1 / a1;
    let e2 = c2 / (a1 * a1 + a2);

    let var = e1 * s + e2 * s * (s - 1.0);
    if var <= 0.0 {
        return None;
    }

    Some((pi - s / a1) / var.sqrt())
}
