//! Ranking with ties.
//!
//! Ranks are 1-based. Tied values receive the average of the ranks they would
//! have received had they been distinct, so ranks of a dataset always sum to
//! `n (n + 1) / 2`.

/// Returns the average rank of every value, in input order.
///
/// # Examples
///
/// ```
/// use moseq_stats::rank::average_ranks;
///
/// assert_eq!(average_ranks(&[3.0, 1.0, 2.0]), vec![3.0, 1.0, 2.0]);
/// assert_eq!(average_ranks(&[5.0, 5.0, 1.0]), vec![2.5, 2.5, 1.0]);
/// ```
#[expect(clippy::cast_precision_loss)]
#[must_use]
pub fn average_ranks(values: &[f64]) -> Vec<f64> {
    let mut order = (0..values.len()).collect::<Vec<_>>();
    order.sort_by(|&a, &b| values[a].total_cmp(&values[b]));

    let mut ranks = vec![0.0; values.len()];
    for (start, end) in tie_runs(values, &order) {
        // positions start..end hold 1-based ranks start+1 ..= end
        let rank = (start + 1 + end) as f64 / 2.0;
        for &idx in &order[start..end] {
            ranks[idx] = rank;
        }
    }
    ranks
}

/// Sizes of the groups of equal values, in ascending value order.
///
/// Distinct values form groups of size 1.
///
/// # Examples
///
/// ```
/// use moseq_stats::rank::tie_group_sizes;
///
/// assert_eq!(tie_group_sizes(&[2.0, 1.0, 2.0, 3.0]), vec![1, 2, 1]);
/// ```
#[must_use]
pub fn tie_group_sizes(values: &[f64]) -> Vec<usize> {
    let mut order = (0..values.len()).collect::<Vec<_>>();
    order.sort_by(|&a, &b| values[a].total_cmp(&values[b]));
    tie_runs(values, &order)
        .map(|(start, end)| end - start)
        .collect()
}

/// Tie-correction term used by Dunn's test: `Σ(t³ - t) / (12 (N - 1))`.
///
/// `t` ranges over the sizes of groups of tied values and `N` is the number of
/// values. Returns `0.0` when there are no ties or fewer than two values.
///
/// # Examples
///
/// ```
/// use moseq_stats::rank::dunn_tie_term;
///
/// assert_eq!(dunn_tie_term(&[1.0, 2.0, 3.0]), 0.0);
/// assert_eq!(dunn_tie_term(&[1.0, 1.0, 2.0]), 6.0 / 24.0);
/// ```
#[expect(clippy::cast_precision_loss)]
#[must_use]
pub fn dunn_tie_term(values: &[f64]) -> f64 {
    let n = values.len();
    if n < 2 {
        return 0.0;
    }
    let tie_sum = tie_cube_sum(values);
    tie_sum / (12.0 * (n - 1) as f64)
}

/// Standard Kruskal-Wallis tie correction factor: `1 - Σ(t³ - t) / (N³ - N)`.
///
/// Returns `1.0` for fewer than two values and `0.0` when all values are equal.
///
/// # Examples
///
/// ```
/// use moseq_stats::rank::tie_correction_factor;
///
/// assert_eq!(tie_correction_factor(&[1.0, 2.0, 3.0]), 1.0);
/// assert_eq!(tie_correction_factor(&[4.0, 4.0, 4.0]), 0.0);
/// ```
#[expect(clippy::cast_precision_loss)]
#[must_use]
pub fn tie_correction_factor(values: &[f64]) -> f64 {
    let n = values.len();
    if n < 2 {
        return 1.0;
    }
    let n = n as f64;
    1.0 - tie_cube_sum(values) / (n * n * n - n)
}

#[expect(clippy::cast_precision_loss)]
fn tie_cube_sum(values: &[f64]) -> f64 {
    tie_group_sizes(values)
        .into_iter()
        .filter(|&t| t > 1)
        .map(|t| {
            let t = t as f64;
            t * t * t - t
        })
        .sum()
}

/// Half-open `[start, end)` ranges of `order` whose values compare equal.
fn tie_runs<'a>(values: &'a [f64], order: &'a [usize]) -> impl Iterator<Item = (usize, usize)> + 'a {
    let mut start = 0;
    std::iter::from_fn(move || {
        if start >= order.len() {
            return None;
        }
        let mut end = start + 1;
        while end < order.len() && values[order[end]] == values[order[start]] {
            end += 1;
        }
        let run = (start, end);
        start = end;
        Some(run)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ranks_sum_to_triangular_number() {
        let values = [3.0, 1.0, 3.0, 2.0, 3.0, 0.5];
        let sum = average_ranks(&values).iter().sum::<f64>();
        assert_eq!(sum, 21.0);
    }

    #[test]
    fn test_empty_input() {
        assert!(average_ranks(&[]).is_empty());
        assert!(tie_group_sizes(&[]).is_empty());
        assert_eq!(dunn_tie_term(&[]), 0.0);
        assert_eq!(tie_correction_factor(&[]), 1.0);
    }

    #[test]
    fn test_dunn_tie_term_distinct_values_is_zero() {
        let values = (0..10).map(f64::from).collect::<Vec<_>>();
        assert_eq!(dunn_tie_term(&values), 0.0);
    }

    #[test]
    fn test_dunn_tie_term_single_pair_of_ten() {
        let mut values = (0..10).map(f64::from).collect::<Vec<_>>();
        values[7] = values[3];
        assert_eq!(dunn_tie_term(&values), (8.0 - 2.0) / (12.0 * 9.0));
    }

    #[test]
    fn test_tie_correction_factor_matches_definition() {
        // one group of three, one of two, N = 6
        let values = [1.0, 1.0, 1.0, 2.0, 2.0, 3.0];
        let expected = 1.0 - (24.0 + 6.0) / (216.0 - 6.0);
        assert_eq!(tie_correction_factor(&values), expected);
    }
}
