//! Permutation-based group comparison of syllable statistics
//!
//! Sessions are compared across experimental groups one syllable at a time:
//!
//! 1. **Omnibus** ([`kruskal_wallis_permutation`]): a Kruskal-Wallis H test
//!    whose p-value comes from a permutation null rather than the chi-square
//!    approximation. The same session permutations are used for every
//!    syllable. P-values are corrected across syllables.
//! 2. **Post-hoc** ([`dunn_test_pairs`]): Dunn's z statistic for every
//!    unordered pair of groups, with a null obtained by permuting the ranks of
//!    the pair's sessions.
//! 3. **Correction** ([`correct_pairwise`]): empirical p-values of the pairwise
//!    statistics, corrected per syllable across pairs. A syllable is
//!    significant for a pair only if it is also significant in the omnibus
//!    test.
//!
//! [`run_kruskal`] runs all three on a syllable usage table.
//!
//! # Reference check
//!
//! The permutation statistic is computed from pre-ranked data with explicit
//! tie correction. One randomly chosen (permutation, syllable) pair is
//! recomputed from the raw values with [`moseq_stats::kruskal::kruskal_wallis`],
//! which ranks on its own and uses the rank-variance form of `H`; a
//! disagreement is reported as [`GroupStatsError::ReferenceMismatch`].
//!
//! # Session order
//!
//! Sessions are ordered by (group, session) so every group occupies a
//! contiguous span. Groups are compared in name order, and each unordered
//! pair appears once with the earlier name first.

use std::collections::{BTreeMap, BTreeSet};

use log::{debug, info, warn};
use moseq_stats::{
    correction::CorrectionMethod,
    distribution::chi_squared_sf,
    kruskal::{h_statistic, kruskal_wallis},
    permutation::random_permutation,
    rank::{average_ranks, dunn_tie_term, tie_correction_factor},
};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::usage::{Statistic, SyllableStats};

/// Relative tolerance of the reference check.
const REFERENCE_TOLERANCE: f64 = 1e-9;

/// An unordered pair of group names, stored in name order.
pub type GroupPair = (String, String);

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SessionKey {
    pub group: String,
    pub session: String,
}

/// Sessions `start..start + len` of a [`UsageMatrix`] belong to `name`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupSpan {
    pub name: String,
    pub start: usize,
    pub len: usize,
}

impl GroupSpan {
    fn range(&self) -> std::ops::Range<usize> {
        self.start..self.start + self.len
    }
}

/// Sessions × syllables table of one statistic.
#[derive(Debug, Clone, PartialEq)]
pub struct UsageMatrix {
    sessions: Vec<SessionKey>,
    syllables: Vec<u32>,
    /// One column per syllable, one value per session
    columns: Vec<Vec<f64>>,
    groups: Vec<GroupSpan>,
}

impl UsageMatrix {
    /// Builds a matrix from per-syllable columns given in `sessions` order.
    ///
    /// Sessions are re-sorted by (group, session).
    pub fn from_columns(
        sessions: Vec<SessionKey>,
        syllables: Vec<u32>,
        columns: Vec<Vec<f64>>,
    ) -> Result<Self, GroupStatsError> {
        if columns.len() != syllables.len() {
            return Err(GroupStatsError::ColumnCount {
                expected: syllables.len(),
                found: columns.len(),
            });
        }
        if let Some((&syllable, column)) = syllables
            .iter()
            .zip(&columns)
            .find(|(_, c)| c.len() != sessions.len())
        {
            return Err(GroupStatsError::ColumnLength {
                syllable,
                expected: sessions.len(),
                found: column.len(),
            });
        }

        let mut order = (0..sessions.len()).collect::<Vec<_>>();
        order.sort_by(|&a, &b| sessions[a].cmp(&sessions[b]));
        let columns = columns
            .iter()
            .map(|column| order.iter().map(|&i| column[i]).collect())
            .collect();
        let sessions = order
            .into_iter()
            .map(|i| sessions[i].clone())
            .collect::<Vec<_>>();
        let groups = group_spans(&sessions);

        Ok(Self {
            sessions,
            syllables,
            columns,
            groups,
        })
    }

    /// Pivots usage rows into a (group, session) × syllable matrix.
    ///
    /// Missing rows and missing values count as `0`.
    #[must_use]
    pub fn pivot(rows: &[SyllableStats], statistic: Statistic) -> Self {
        let sessions = rows
            .iter()
            .map(|r| SessionKey {
                group: r.group.clone(),
                session: r.session.clone(),
            })
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect::<Vec<_>>();
        let syllables = rows
            .iter()
            .map(|r| r.syllable)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect::<Vec<_>>();

        let mut columns = vec![vec![0.0; sessions.len()]; syllables.len()];
        for row in rows {
            let key = SessionKey {
                group: row.group.clone(),
                session: row.session.clone(),
            };
            // both lookups succeed: the keys were collected from `rows`
            if let (Ok(i), Ok(s)) = (
                sessions.binary_search(&key),
                syllables.binary_search(&row.syllable),
            ) {
                columns[s][i] = row.get(statistic).unwrap_or(0.0);
            }
        }

        let groups = group_spans(&sessions);
        Self {
            sessions,
            syllables,
            columns,
            groups,
        }
    }

    /// Keeps only sessions of the named groups.
    pub fn select_groups(&self, names: &[String]) -> Result<Self, GroupStatsError> {
        if let Some(name) = names
            .iter()
            .find(|name| !self.groups.iter().any(|g| &g.name == *name))
        {
            return Err(GroupStatsError::UnknownGroup { name: name.clone() });
        }
        let keep = self
            .sessions
            .iter()
            .map(|key| names.contains(&key.group))
            .collect::<Vec<_>>();
        let pick = |values: &[f64]| {
            values
                .iter()
                .zip(&keep)
                .filter(|(_, k)| **k)
                .map(|(v, _)| *v)
                .collect::<Vec<_>>()
        };
        let sessions = self
            .sessions
            .iter()
            .zip(&keep)
            .filter(|(_, k)| **k)
            .map(|(s, _)| s.clone())
            .collect::<Vec<_>>();
        let groups = group_spans(&sessions);
        Ok(Self {
            columns: self.columns.iter().map(|c| pick(c)).collect(),
            syllables: self.syllables.clone(),
            sessions,
            groups,
        })
    }

    #[must_use]
    pub fn sessions(&self) -> &[SessionKey] {
        &self.sessions
    }

    #[must_use]
    pub fn syllables(&self) -> &[u32] {
        &self.syllables
    }

    #[must_use]
    pub fn groups(&self) -> &[GroupSpan] {
        &self.groups
    }

    /// Values of the `index`-th syllable, in session order.
    #[must_use]
    pub fn column(&self, index: usize) -> &[f64] {
        &self.columns[index]
    }

    #[must_use]
    pub fn num_sessions(&self) -> usize {
        self.sessions.len()
    }
}

fn group_spans(sessions: &[SessionKey]) -> Vec<GroupSpan> {
    let mut groups: Vec<GroupSpan> = vec![];
    for (i, key) in sessions.iter().enumerate() {
        match groups.last_mut() {
            Some(span) if span.name == key.group => span.len += 1,
            _ => groups.push(GroupSpan {
                name: key.group.clone(),
                start: i,
                len: 1,
            }),
        }
    }
    groups
}

/// Within-syllable ranks and tie terms.
#[derive(Debug, Clone, PartialEq)]
pub struct RankMatrix {
    /// Average ranks across sessions, one column per syllable
    pub ranks: Vec<Vec<f64>>,
    /// `Σ(t³ - t) / (12 (N - 1))` per syllable, used by Dunn's test
    pub tie_terms: Vec<f64>,
    /// `1 - Σ(t³ - t) / (N³ - N)` per syllable, used by Kruskal-Wallis
    pub tie_factors: Vec<f64>,
}

impl RankMatrix {
    #[must_use]
    pub fn new(usage: &UsageMatrix) -> Self {
        Self {
            ranks: usage.columns.iter().map(|c| average_ranks(c)).collect(),
            tie_terms: usage.columns.iter().map(|c| dunn_tie_term(c)).collect(),
            tie_factors: usage
                .columns
                .iter()
                .map(|c| tie_correction_factor(c))
                .collect(),
        }
    }
}

#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum GroupStatsError {
    #[display(
        "permutation Kruskal-Wallis disagrees with the reference for syllable {syllable}: \
         {quantity} {manual} vs {reference}"
    )]
    ReferenceMismatch {
        syllable: u32,
        quantity: &'static str,
        manual: f64,
        reference: f64,
    },
    #[display("n_permutations must be at least 1")]
    ZeroPermutations,
    #[display("thresh must be in (0, 1], got {thresh}")]
    InvalidThreshold { thresh: f64 },
    #[display("unknown group '{name}'")]
    UnknownGroup { name: String },
    #[display("at least 2 groups are needed for comparison, got {found}")]
    TooFewGroups { found: usize },
    #[display("{found} columns given for {expected} syllables")]
    ColumnCount { expected: usize, found: usize },
    #[display("column of syllable {syllable} has {found} values, expected {expected}")]
    ColumnLength {
        syllable: u32,
        expected: usize,
        found: usize,
    },
}

/// Omnibus result of one syllable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyllableKruskal {
    pub syllable: u32,
    /// Tie-corrected H statistic of the observed grouping
    pub statistic: f64,
    /// Chi-square approximation of the p-value
    pub reference_pvalue: f64,
    /// Permutation p-value
    pub pvalue: f64,
    pub adjusted_pvalue: f64,
    pub is_significant: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OmnibusTest {
    /// One entry per syllable, in matrix order (empty with fewer than 2 groups)
    pub results: Vec<SyllableKruskal>,
    pub ranks: RankMatrix,
}

/// Dunn's z statistics per unordered group pair.
#[derive(Debug, Clone, PartialEq)]
pub struct DunnTest {
    /// `[permutation][syllable]` null statistics
    pub null_z: BTreeMap<GroupPair, Vec<Vec<f64>>>,
    /// Observed statistic per syllable
    pub real_z: BTreeMap<GroupPair, Vec<f64>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PairwiseCorrection {
    /// Adjusted p-value per syllable
    pub pvalues: BTreeMap<GroupPair, Vec<f64>>,
    /// Syllables significant for the pair and in the omnibus test
    pub significant: BTreeMap<GroupPair, Vec<u32>>,
}

fn check_settings(n_perm: usize, thresh: f64) -> Result<(), GroupStatsError> {
    if n_perm == 0 {
        return Err(GroupStatsError::ZeroPermutations);
    }
    if !(thresh > 0.0 && thresh <= 1.0) {
        return Err(GroupStatsError::InvalidThreshold { thresh });
    }
    Ok(())
}

/// Tie-corrected H of one syllable when session `perm[i]` takes slot `i`.
fn permuted_h(ranks: &[f64], tie_factor: f64, groups: &[GroupSpan], perm: &[usize]) -> f64 {
    if tie_factor == 0.0 {
        return 0.0;
    }
    let rank_sums = groups
        .iter()
        .map(|g| g.range().map(|i| ranks[perm[i]]).sum::<f64>())
        .collect::<Vec<_>>();
    let sizes = groups.iter().map(|g| g.len).collect::<Vec<_>>();
    h_statistic(&rank_sums, &sizes, perm.len()) / tie_factor
}

#[expect(clippy::cast_precision_loss)]
fn empirical_pvalue(exceeding: usize, n_perm: usize) -> f64 {
    (exceeding + 1) as f64 / n_perm as f64
}

fn agrees(manual: f64, reference: f64) -> bool {
    (manual - reference).abs() <= REFERENCE_TOLERANCE * manual.abs().max(reference.abs()).max(1.0)
}

/// Permutation Kruskal-Wallis test of every syllable.
///
/// `p = (count(H_null > H_real) + 1) / n_perm`; p-values are corrected across
/// syllables with `method` and a syllable is significant when its adjusted
/// p-value is at most `thresh`. A syllable with identical values in every
/// session has `H = 0` and `p = 1`.
pub fn kruskal_wallis_permutation<R>(
    usage: &UsageMatrix,
    n_perm: usize,
    thresh: f64,
    method: CorrectionMethod,
    rng: &mut R,
) -> Result<OmnibusTest, GroupStatsError>
where
    R: Rng + ?Sized,
{
    check_settings(n_perm, thresh)?;
    let ranks = RankMatrix::new(usage);
    let groups = &usage.groups;
    let n = usage.num_sessions();
    let num_syllables = usage.syllables.len();
    if groups.len() < 2 || num_syllables == 0 {
        warn!(
            "Kruskal-Wallis needs at least 2 groups and 1 syllable (got {} groups, {num_syllables} syllables)",
            groups.len()
        );
        return Ok(OmnibusTest {
            results: vec![],
            ranks,
        });
    }

    let identity = (0..n).collect::<Vec<_>>();
    let real_h = (0..num_syllables)
        .map(|s| permuted_h(&ranks.ranks[s], ranks.tie_factors[s], groups, &identity))
        .collect::<Vec<_>>();

    let check_perm = rng.random_range(0..n_perm);
    let check_syllable = rng.random_range(0..num_syllables);

    info!("Running {n_perm} permutations over {num_syllables} syllables, {n} sessions");
    let mut exceeding = vec![0; num_syllables];
    for p in 0..n_perm {
        let perm = random_permutation(n, rng);
        for (s, count) in exceeding.iter_mut().enumerate() {
            let h = permuted_h(&ranks.ranks[s], ranks.tie_factors[s], groups, &perm);
            if h > real_h[s] {
                *count += 1;
            }
            if p == check_perm && s == check_syllable {
                check_reference(usage, s, &perm, h)?;
            }
        }
    }

    let pvalues = (0..num_syllables)
        .map(|s| {
            if ranks.tie_factors[s] == 0.0 {
                1.0
            } else {
                empirical_pvalue(exceeding[s], n_perm)
            }
        })
        .collect::<Vec<_>>();
    let (rejected, adjusted) = method.reject(&pvalues, thresh);

    #[expect(clippy::cast_precision_loss)]
    let dof = (groups.len() - 1) as f64;
    let results = usage
        .syllables
        .iter()
        .enumerate()
        .map(|(s, &syllable)| SyllableKruskal {
            syllable,
            statistic: real_h[s],
            reference_pvalue: if ranks.tie_factors[s] == 0.0 {
                1.0
            } else {
                chi_squared_sf(real_h[s], dof)
            },
            pvalue: pvalues[s],
            adjusted_pvalue: adjusted[s],
            is_significant: rejected[s],
        })
        .collect::<Vec<_>>();
    info!(
        "{} of {num_syllables} syllables significant at {thresh} ({method})",
        results.iter().filter(|r| r.is_significant).count()
    );

    Ok(OmnibusTest { results, ranks })
}

/// Recomputes one permuted statistic from raw values with the reference test.
fn check_reference(
    usage: &UsageMatrix,
    s: usize,
    perm: &[usize],
    manual_h: f64,
) -> Result<(), GroupStatsError> {
    let syllable = usage.syllables[s];
    let column = &usage.columns[s];
    let samples = usage
        .groups
        .iter()
        .map(|g| g.range().map(|i| column[perm[i]]).collect::<Vec<_>>())
        .collect::<Vec<_>>();
    let samples = samples.iter().map(Vec::as_slice).collect::<Vec<_>>();

    let Some(reference) = kruskal_wallis(&samples) else {
        // undefined only when every value is tied, which is H = 0 here
        return if manual_h == 0.0 {
            Ok(())
        } else {
            Err(GroupStatsError::ReferenceMismatch {
                syllable,
                quantity: "statistic",
                manual: manual_h,
                reference: f64::NAN,
            })
        };
    };

    #[expect(clippy::cast_precision_loss)]
    let dof = (samples.len() - 1) as f64;
    let manual_p = chi_squared_sf(manual_h, dof);
    for (quantity, manual, reference) in [
        ("statistic", manual_h, reference.statistic),
        ("pvalue", manual_p, reference.pvalue),
    ] {
        if !agrees(manual, reference) {
            return Err(GroupStatsError::ReferenceMismatch {
                syllable,
                quantity,
                manual,
                reference,
            });
        }
    }
    debug!("reference check passed for syllable {syllable}: H = {manual_h}");
    Ok(())
}

/// Dunn's z statistic for every unordered group pair.
///
/// For a pair `(i, j)` the observed statistic of each syllable is
/// `|mean_rank_i - mean_rank_j| / sqrt((A - tie_term) (1/n_i + 1/n_j))` with
/// `A = N (N + 1) / 12` and `N` the number of sessions in the matrix. The
/// null permutes the pair's ranks `n_perm` times, one permutation shared by
/// all syllables. A non-positive variance term yields `z = 0`.
pub fn dunn_test_pairs<R>(
    usage: &UsageMatrix,
    ranks: &RankMatrix,
    n_perm: usize,
    rng: &mut R,
) -> DunnTest
where
    R: Rng + ?Sized,
{
    #[expect(clippy::cast_precision_loss)]
    let n = usage.num_sessions() as f64;
    let a = n * (n + 1.0) / 12.0;

    let mut null_z = BTreeMap::new();
    let mut real_z = BTreeMap::new();
    for (gi, first) in usage.groups.iter().enumerate() {
        for second in &usage.groups[gi + 1..] {
            let pair = (first.name.clone(), second.name.clone());
            let members = first.range().chain(second.range()).collect::<Vec<_>>();
            #[expect(clippy::cast_precision_loss)]
            let b = 1.0 / first.len as f64 + 1.0 / second.len as f64;
            let scales = ranks
                .tie_terms
                .iter()
                .map(|tie| {
                    let variance = (a - tie) * b;
                    (variance > 0.0).then(|| variance.sqrt())
                })
                .collect::<Vec<_>>();

            let z_of = |order: &[usize]| {
                ranks
                    .ranks
                    .iter()
                    .zip(&scales)
                    .map(|(column, scale)| {
                        let Some(scale) = scale else {
                            return 0.0;
                        };
                        let (head, tail) = order.split_at(first.len);
                        let diff = mean_of(column, &members, head) - mean_of(column, &members, tail);
                        diff.abs() / scale
                    })
                    .collect::<Vec<_>>()
            };

            let identity = (0..members.len()).collect::<Vec<_>>();
            real_z.insert(pair.clone(), z_of(&identity));
            let null = (0..n_perm)
                .map(|_| z_of(&random_permutation(members.len(), rng)))
                .collect::<Vec<_>>();
            debug!("Dunn null drawn for {} vs {}", pair.0, pair.1);
            null_z.insert(pair, null);
        }
    }

    DunnTest { null_z, real_z }
}

#[expect(clippy::cast_precision_loss)]
fn mean_of(column: &[f64], members: &[usize], slots: &[usize]) -> f64 {
    let sum = slots.iter().map(|&k| column[members[k]]).sum::<f64>();
    sum / slots.len().max(1) as f64
}

/// Empirical p-values of the pairwise statistics, corrected per syllable
/// across pairs.
///
/// A syllable is significant for a pair when its adjusted p-value is below
/// `thresh` and it is significant in `omnibus`.
pub fn correct_pairwise(
    dunn: &DunnTest,
    omnibus: &[SyllableKruskal],
    n_perm: usize,
    thresh: f64,
    method: CorrectionMethod,
) -> Result<PairwiseCorrection, GroupStatsError> {
    check_settings(n_perm, thresh)?;
    let pairs = dunn.real_z.keys().cloned().collect::<Vec<_>>();

    // raw[pair][syllable]
    let raw = pairs
        .iter()
        .map(|pair| {
            let real = &dunn.real_z[pair];
            let null = dunn.null_z.get(pair).map_or(&[][..], Vec::as_slice);
            real.iter()
                .enumerate()
                .map(|(s, z)| {
                    let exceeding = null.iter().filter(|perm| perm[s] > *z).count();
                    empirical_pvalue(exceeding, n_perm)
                })
                .collect::<Vec<_>>()
        })
        .collect::<Vec<_>>();

    let mut adjusted = vec![vec![0.0; omnibus.len()]; pairs.len()];
    for s in 0..omnibus.len() {
        let across_pairs = raw.iter().map(|p| p[s]).collect::<Vec<_>>();
        for (row, value) in adjusted.iter_mut().zip(method.adjust(&across_pairs)) {
            row[s] = value;
        }
    }

    let mut pvalues = BTreeMap::new();
    let mut significant = BTreeMap::new();
    for (pair, adjusted) in pairs.into_iter().zip(adjusted) {
        let syllables = omnibus
            .iter()
            .zip(&adjusted)
            .filter(|(result, p)| **p < thresh && result.is_significant)
            .map(|(result, _)| result.syllable)
            .collect::<Vec<_>>();
        debug!(
            "{} vs {}: {} significant syllables",
            pair.0,
            pair.1,
            syllables.len()
        );
        significant.insert(pair.clone(), syllables);
        pvalues.insert(pair, adjusted);
    }

    Ok(PairwiseCorrection {
        pvalues,
        significant,
    })
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KruskalParams {
    pub n_permutations: usize,
    /// Significance level of both the omnibus and the pairwise tests
    pub thresh: f64,
    pub correction: CorrectionMethod,
    /// Restrict the comparison to these groups
    pub groups: Option<Vec<String>>,
}

impl Default for KruskalParams {
    fn default() -> Self {
        Self {
            n_permutations: 10000,
            thresh: 0.05,
            correction: CorrectionMethod::FdrBh,
            groups: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupSummary {
    pub name: String,
    pub sessions: usize,
}

/// Post-hoc results of one group pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairReport {
    pub groups: [String; 2],
    /// Observed Dunn's z per syllable
    pub dunn_z: Vec<f64>,
    pub adjusted_pvalues: Vec<f64>,
    pub significant_syllables: Vec<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KruskalReport {
    pub statistic: Statistic,
    pub n_permutations: usize,
    pub thresh: f64,
    pub correction: CorrectionMethod,
    pub groups: Vec<GroupSummary>,
    /// Column order of every per-syllable vector in `pairs`
    pub syllables: Vec<u32>,
    pub omnibus: Vec<SyllableKruskal>,
    pub pairs: Vec<PairReport>,
}

/// Compares groups on one statistic of a syllable usage table.
///
/// With `params.groups` set, only those groups are compared and naming fewer
/// than two is an error. Otherwise a table with a single group yields an
/// empty report.
pub fn run_kruskal<R>(
    rows: &[SyllableStats],
    statistic: Statistic,
    params: &KruskalParams,
    rng: &mut R,
) -> Result<KruskalReport, GroupStatsError>
where
    R: Rng + ?Sized,
{
    check_settings(params.n_permutations, params.thresh)?;
    let mut usage = UsageMatrix::pivot(rows, statistic);
    if let Some(groups) = &params.groups {
        usage = usage.select_groups(groups)?;
        if usage.groups.len() < 2 {
            return Err(GroupStatsError::TooFewGroups {
                found: usage.groups.len(),
            });
        }
    }
    info!(
        "Comparing {statistic} across {} groups: {}",
        usage.groups.len(),
        usage
            .groups
            .iter()
            .map(|g| format!("{} ({})", g.name, g.len))
            .collect::<Vec<_>>()
            .join(", ")
    );

    let omnibus = kruskal_wallis_permutation(
        &usage,
        params.n_permutations,
        params.thresh,
        params.correction,
        rng,
    )?;
    let dunn = if omnibus.results.is_empty() {
        DunnTest {
            null_z: BTreeMap::new(),
            real_z: BTreeMap::new(),
        }
    } else {
        dunn_test_pairs(&usage, &omnibus.ranks, params.n_permutations, rng)
    };
    let mut correction = correct_pairwise(
        &dunn,
        &omnibus.results,
        params.n_permutations,
        params.thresh,
        params.correction,
    )?;

    let pairs = dunn
        .real_z
        .into_iter()
        .map(|(pair, dunn_z)| PairReport {
            adjusted_pvalues: correction.pvalues.remove(&pair).unwrap_or_default(),
            significant_syllables: correction.significant.remove(&pair).unwrap_or_default(),
            groups: [pair.0, pair.1],
            dunn_z,
        })
        .collect();

    Ok(KruskalReport {
        statistic,
        n_permutations: params.n_permutations,
        thresh: params.thresh,
        correction: params.correction,
        groups: usage
            .groups
            .iter()
            .map(|g| GroupSummary {
                name: g.name.clone(),
                sessions: g.len,
            })
            .collect(),
        syllables: usage.syllables.clone(),
        omnibus: omnibus.results,
        pairs,
    })
}
