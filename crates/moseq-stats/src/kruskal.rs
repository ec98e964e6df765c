//! Kruskal-Wallis H test.
//!
//! [`kruskal_wallis`] is the reference test. It ranks the pooled sample itself
//! and computes `H` as a ratio of rank variances,
//!
//! ```text
//! H = (N - 1) Σ_g n_g (r̄_g - r̄)² / Σ_i (r_i - r̄)²
//! ```
//!
//! which already accounts for ties. [`h_statistic`] is the rank-sum form used
//! by permutation engines; it needs the separate tie-correction factor from
//! [`crate::rank::tie_correction_factor`]. The two formulations agree on every
//! input, so one can check the other.

use crate::distribution::chi_squared_sf;

/// Result of a Kruskal-Wallis H test.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KruskalWallis {
    /// Tie-corrected H statistic.
    pub statistic: f64,
    /// Chi-square p-value with `groups - 1` degrees of freedom.
    pub pvalue: f64,
}

/// Uncorrected H statistic from per-group rank sums.
///
/// `H = 12 / (N (N + 1)) * Σ R_g² / n_g - 3 (N + 1)`
///
/// `rank_sums` and `group_sizes` are paired by index.
///
/// # Examples
///
/// ```
/// use moseq_stats::kruskal::h_statistic;
///
/// // ranks 1..=3 vs 4..=6
/// let h = h_statistic(&[6.0, 15.0], &[3, 3], 6);
/// assert!((h - 27.0 / 7.0).abs() < 1e-12);
/// ```
#[expect(clippy::cast_precision_loss)]
#[must_use]
pub fn h_statistic(rank_sums: &[f64], group_sizes: &[usize], total: usize) -> f64 {
    let n = total as f64;
    let ssbn = rank_sums
        .iter()
        .zip(group_sizes)
        .fold(0.0, |acc, (r, &size)| acc + r * r / size as f64);
    12.0 / (n * (n + 1.0)) * ssbn - 3.0 * (n + 1.0)
}

/// Midranks of the pooled sample, as `(group, rank)` pairs in value order.
#[expect(clippy::cast_precision_loss)]
fn pooled_midranks(groups: &[&[f64]]) -> Vec<(usize, f64)> {
    let mut pooled = groups
        .iter()
        .enumerate()
        .flat_map(|(g, values)| values.iter().map(move |&v| (v, g)))
        .collect::<Vec<_>>();
    pooled.sort_by(|a, b| a.0.total_cmp(&b.0));

    let mut ranked = Vec::with_capacity(pooled.len());
    let mut start = 0;
    while start < pooled.len() {
        let value = pooled[start].0;
        let end = start + pooled[start..].iter().take_while(|(v, _)| *v == value).count();
        // 1-based positions start+1 ..= end share their mean
        let midrank = (start + end + 1) as f64 / 2.0;
        ranked.extend(pooled[start..end].iter().map(|&(_, g)| (g, midrank)));
        start = end;
    }
    ranked
}

/// Runs the Kruskal-Wallis H test on two or more samples.
///
/// # Returns
///
/// * `Some(KruskalWallis)` - the tie-corrected statistic and its p-value
/// * `None` - if fewer than two groups are given, a group is empty, or all
///   values are identical (the statistic is undefined)
///
/// # Examples
///
/// ```
/// use moseq_stats::kruskal::kruskal_wallis;
///
/// let a = [2.9, 3.0, 2.5, 2.6, 3.2];
/// let b = [3.8, 2.7, 4.0, 2.4];
/// let c = [2.8, 3.4, 3.7, 2.2, 2.0];
/// let result = kruskal_wallis(&[&a, &b, &c]).unwrap();
/// assert!((result.statistic - 0.771_428_571_428_57).abs() < 1e-9);
/// assert!((result.pvalue - 0.679_964_773_578_8).abs() < 1e-9);
/// ```
#[expect(clippy::cast_precision_loss)]
#[must_use]
pub fn kruskal_wallis(groups: &[&[f64]]) -> Option<KruskalWallis> {
    if groups.len() < 2 || groups.iter().any(|g| g.is_empty()) {
        return None;
    }

    let ranked = pooled_midranks(groups);
    let n = ranked.len() as f64;
    let grand_mean = (n + 1.0) / 2.0;

    let mut group_sums = vec![0.0; groups.len()];
    let mut total_ss = 0.0;
    for &(g, rank) in &ranked {
        group_sums[g] += rank;
        total_ss += (rank - grand_mean).powi(2);
    }
    if total_ss == 0.0 {
        return None;
    }

    let between_ss = group_sums
        .iter()
        .zip(groups)
        .map(|(sum, values)| {
            let size = values.len() as f64;
            size * (sum / size - grand_mean).powi(2)
        })
        .sum::<f64>();

    let statistic = (n - 1.0) * between_ss / total_ss;
    let dof = (groups.len() - 1) as f64;
    Some(KruskalWallis {
        statistic,
        pvalue: chi_squared_sf(statistic, dof),
    })
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn test_fewer_than_two_groups() {
        assert!(kruskal_wallis(&[&[1.0, 2.0]]).is_none());
        assert!(kruskal_wallis(&[&[1.0, 2.0], &[]]).is_none());
    }

    #[test]
    fn test_all_identical_is_undefined() {
        assert!(kruskal_wallis(&[&[1.0, 1.0], &[1.0, 1.0]]).is_none());
    }

    #[test]
    fn test_tied_two_groups_match_published_values() {
        // midranks 1.5 1.5 3.5 | 3.5 5.5 5.5
        let result = kruskal_wallis(&[&[1.0, 1.0, 2.0], &[2.0, 3.0, 3.0]]).unwrap();
        assert_relative_eq!(result.statistic, 10.0 / 3.0, max_relative = 1e-12);
        assert_relative_eq!(result.pvalue, 0.067_889_154_861_829, max_relative = 1e-8);
    }

    #[test]
    fn test_tied_three_groups_match_published_values() {
        let result = kruskal_wallis(&[
            &[1.0, 2.0, 2.0, 3.0],
            &[2.0, 3.0, 3.0, 3.0, 4.0],
            &[4.0, 4.0, 5.0],
        ])
        .unwrap();
        assert_relative_eq!(result.statistic, 7.482_120_646_766_17, max_relative = 1e-10);
        assert_relative_eq!(result.pvalue, 0.023_728_929_448_791, max_relative = 1e-8);
    }

    #[test]
    fn test_rank_sum_form_agrees_after_tie_correction() {
        // same tied sample as above, through h_statistic and the tie factor
        let ranks = crate::rank::average_ranks(&[1.0, 1.0, 2.0, 2.0, 3.0, 3.0]);
        let rank_sums = [ranks[..3].iter().sum(), ranks[3..].iter().sum()];
        let factor = crate::rank::tie_correction_factor(&ranks);
        let h = h_statistic(&rank_sums, &[3, 3], 6) / factor;
        assert_relative_eq!(h, 10.0 / 3.0, max_relative = 1e-12);
    }

    #[test]
    fn test_perfect_separation_two_groups() {
        // ranks 1..=3 vs 4..=6: H = 12/42 * (36/3 + 225/3) - 21
        let result = kruskal_wallis(&[&[1.0, 2.0, 3.0], &[4.0, 5.0, 6.0]]).unwrap();
        let expected = 12.0 / 42.0 * (36.0 / 3.0 + 225.0 / 3.0) - 21.0;
        assert_relative_eq!(result.statistic, expected, max_relative = 1e-12);
        assert_relative_eq!(result.pvalue, chi_squared_sf(expected, 1.0), max_relative = 1e-12);
    }

    #[test]
    fn test_statistic_is_invariant_to_group_order() {
        let a = [0.3, 0.1, 0.7];
        let b = [0.5, 0.5, 0.9, 0.2];
        let ab = kruskal_wallis(&[&a, &b]).unwrap();
        let ba = kruskal_wallis(&[&b, &a]).unwrap();
        assert_relative_eq!(ab.statistic, ba.statistic, max_relative = 1e-12);
        assert_relative_eq!(ab.pvalue, ba.pvalue, max_relative = 1e-12);
    }
}
