//! Coding-sequence polymorphism: πN/πS and McDonald-Kreitman tables.
//!
//! Both statistics work on codon columns. A codon is usable when it is
//! complete (no gap or ambiguity) and is not a stop codon in the chosen
//! genetic code.

use std::fmt;

use crate::genetic_code::{GeneticCode, Substitutions};
use crate::model::Alignment;

use super::exceeds_missing;

/// Usable codon indices of every sequence at one codon column.
fn codon_column(alignment: &Alignment, column: usize, code: &GeneticCode) -> Vec<Option<usize>> {
    alignment
        .sequences
        .iter()
        .map(|seq| seq.codon(column).and_then(|c| code.sense_codon(c)))
        .collect()
}

/// Synonymous and non-synonymous diversity of a coding alignment.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CodingDiversity {
    /// Number of codon columns analysed
    pub codon_sites: usize,
    /// Mean number of synonymous sites, summed over analysed codons
    pub synonymous_sites: f64,
    /// Mean number of non-synonymous sites, summed over analysed codons
    pub nonsynonymous_sites: f64,
    /// Mean pairwise differences, summed over analysed codons
    pub differences: Substitutions,
}

impl CodingDiversity {
    /// πS: synonymous differences per synonymous site.
    pub fn pi_s(&self) -> Option<f64> {
        (self.synonymous_sites > 0.0).then(|| self.differences.synonymous / self.synonymous_sites)
    }

    /// πN: non-synonymous differences per non-synonymous site.
    pub fn pi_n(&self) -> Option<f64> {
        (self.nonsynonymous_sites > 0.0)
            .then(|| self.differences.nonsynonymous / self.nonsynonymous_sites)
    }
}

/// Computes πN and πS with the Nei-Gojobori method.
///
/// Codon columns with more than `max_missing` unusable codons, or with fewer
/// than two usable ones, are skipped.
///
/// # References
///
/// Nei, M., & Gojobori, T. (1986). Simple methods for estimating the numbers
/// of synonymous and nonsynonymous nucleotide substitutions. Mol. Biol. Evol.
/// 3(5), 418-426.
pub fn coding_diversity(alignment: &Alignment, code: &GeneticCode, max_missing: f64) -> CodingDiversity {
    let ns = alignment.sequence_count();
    let mut result = CodingDiversity::default();

    for column in 0..alignment.codon_count() {
        let codons: Vec<usize> = codon_column(alignment, column, code)
            .into_iter()
            .flatten()
            .collect();
        let n = codons.len();
        if n < 2 || exceeds_missing(ns - n, ns, max_missing) {
            continue;
        }

        let syn_sites = codons.iter().map(|&c| code.synonymous_sites(c)).sum::<f64>() / n as f64;
        result.codon_sites += 1;
        result.synonymous_sites += syn_sites;
        result.nonsynonymous_sites += 3.0 - syn_sites;

        let mut pairwise = Substitutions::default();
        for i in 0..n {
            for j in i + 1..n {
                pairwise += code.differences(codons[i], codons[j]);
            }
        }
        let pairs = (n * (n - 1) / 2) as f64;
        result.differences += Substitutions::new(
            pairwise.synonymous / pairs,
            pairwise.nonsynonymous / pairs,
        );
    }

    result
}

/// McDonald-Kreitman contingency table.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MkTable {
    /// Non-synonymous polymorphisms within the ingroup
    pub pn: f64,
    /// Synonymous polymorphisms within the ingroup
    pub ps: f64,
    /// Non-synonymous fixed differences with the outgroup
    pub dn: f64,
    /// Synonymous fixed differences with the outgroup
    pub ds: f64,
}

impl MkTable {
    /// NI = (Pn/Ps) / (Dn/Ds). Undefined when Ps or Dn is zero.
    pub fn neutrality_index(&self) -> Option<f64> {
        if self.ps == 0.0 || self.dn == 0.0 {
            return None;
        }
        Some((self.pn * self.ds) / (self.ps * self.dn))
    }
}

impl fmt::Display for MkTable {
    /// `Pn,Ps,Dn,Ds`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{},{}", self.pn, self.ps, self.dn, self.ds)
    }
}

/// Number of differing nucleotides between two codon indices.
fn codon_distance(a: usize, b: usize) -> usize {
    [16, 4, 1]
        .iter()
        .filter(|&&w| (a / w) % 4 != (b / w) % 4)
        .count()
}

/// Substitutions needed to connect a set of codons, counted along a minimum
/// spanning tree. Each edge is split by pathway averaging.
fn minimum_substitutions(codons: &[usize], code: &GeneticCode) -> Substitutions {
    let mut distinct = codons.to_vec();
    distinct.sort_unstable();
    distinct.dedup();

    let mut total = Substitutions::default();
    if distinct.len() < 2 {
        return total;
    }

    // Prim's algorithm, ties broken by codon order
    let mut in_tree = vec![false; distinct.len()];
    let mut best: Vec<Option<(usize, usize)>> = vec![None; distinct.len()];
    in_tree[0] = true;
    for j in 1..distinct.len() {
        best[j] = Some((codon_distance(distinct[0], distinct[j]), 0));
    }

    for _ in 1..distinct.len() {
        let next = (0..distinct.len())
            .filter(|&j| !in_tree[j])
            .min_by_key(|&j| best[j].map_or(usize::MAX, |(d, _)| d));
        let Some(next) = next else { break };
        let Some((_, parent)) = best[next] else { break };

        in_tree[next] = true;
        total += code.differences(distinct[parent], distinct[next]);

        for j in 0..distinct.len() {
            if in_tree[j] {
                continue;
            }
            let d = codon_distance(distinct[next], distinct[j]);
            if best[j].map_or(true, |(current, _)| d < current) {
                best[j] = Some((d, next));
            }
        }
    }

    total
}

/// Builds the McDonald-Kreitman table of `ingroup` against `outgroup`.
///
/// Only codon columns where every sequence of both groups carries a usable
/// codon are counted. Polymorphisms are the substitutions within the
/// ingroup; fixed differences are the substitutions of the pooled column not
/// explained by either group alone.
///
/// # References
///
/// McDonald, J. H., & Kreitman, M. (1991). Adaptive protein evolution at
/// the Adh locus in Drosophila. Nature, 351, 652-654.
pub fn mk_table(ingroup: &Alignment, outgroup: &Alignment, code: &GeneticCode) -> MkTable {
    let mut table = MkTable::default();
    if ingroup.is_empty() || outgroup.is_empty() {
        return table;
    }

    let columns = ingroup.codon_count().min(outgroup.codon_count());
    for column in 0..columns {
        let Some(inner) = codon_column(ingroup, column, code).into_iter().collect::<Option<Vec<_>>>() else {
            continue;
        };
        let Some(outer) = codon_column(outgroup, column, code).into_iter().collect::<Option<Vec<_>>>() else {
            continue;
        };

        let within = minimum_substitutions(&inner, code);
        let outside = minimum_substitutions(&outer, code);
        let pooled: Vec<usize> = inner.iter().chain(outer.iter()).copied().collect();
        let all = minimum_substitutions(&pooled, code);

        table.pn += within.nonsynonymous;
        table.ps += within.synonymous;
        table.dn += (all.nonsynonymous - within.nonsynonymous - outside.nonsynonymous).max(0.0);
        table.ds += (all.synonymous - within.synonymous - outside.synonymous).max(0.0);
    }

    table
}
