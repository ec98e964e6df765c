//! Syllable orderings for reports
//!
//! Syllables are ranked by the mean of a statistic over sessions, either
//! overall or as the difference between two groups. Means skip sessions in
//! which the statistic is undefined; syllables without any defined value sort
//! last. Ties keep ascending syllable order.

use std::{cmp::Ordering, collections::BTreeMap};

use serde::{Deserialize, Serialize};

use crate::usage::{Statistic, SyllableStats};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyllableOrdering {
    /// Syllables from the highest to the lowest mean
    pub ordering: Vec<u32>,
    /// Position of each syllable in `ordering`
    pub relabel: BTreeMap<u32, usize>,
}

impl SyllableOrdering {
    /// Builds the relabeling map of an existing ordering.
    #[must_use]
    pub fn from_ordering(ordering: Vec<u32>) -> Self {
        let relabel = ordering
            .iter()
            .enumerate()
            .map(|(position, &syllable)| (syllable, position))
            .collect();
        Self { ordering, relabel }
    }
}

#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum OrderingError {
    #[display("unknown group '{name}'")]
    UnknownGroup { name: String },
}

/// Mean of `stat` per syllable over the rows accepted by `filter`.
#[expect(clippy::cast_precision_loss)]
fn syllable_means<F>(rows: &[SyllableStats], stat: Statistic, filter: F) -> BTreeMap<u32, f64>
where
    F: Fn(&SyllableStats) -> bool,
{
    let mut sums = BTreeMap::<u32, (f64, usize)>::new();
    for row in rows.iter().filter(|r| filter(r)) {
        let entry = sums.entry(row.syllable).or_default();
        if let Some(value) = row.get(stat) {
            entry.0 += value;
            entry.1 += 1;
        }
    }
    sums.into_iter()
        .map(|(syllable, (sum, n))| {
            let mean = if n == 0 { f64::NAN } else { sum / n as f64 };
            (syllable, mean)
        })
        .collect()
}

fn descending(means: &BTreeMap<u32, f64>) -> Vec<u32> {
    let mut ordering = means.keys().copied().collect::<Vec<_>>();
    // stable sort over ascending keys keeps ties in syllable order
    ordering.sort_by(|a, b| match (means[a].is_nan(), means[b].is_nan()) {
        (false, false) => means[b].total_cmp(&means[a]),
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (true, true) => Ordering::Equal,
    });
    ordering
}

/// Orders syllables by their mean `stat`, highest first.
#[must_use]
pub fn sort_syllables_by_stat(rows: &[SyllableStats], stat: Statistic) -> SyllableOrdering {
    SyllableOrdering::from_ordering(descending(&syllable_means(rows, stat, |_| true)))
}

/// Orders syllables by `mean(exp_group) - mean(ctrl_group)`, largest first.
pub fn sort_syllables_by_stat_difference(
    rows: &[SyllableStats],
    ctrl_group: &str,
    exp_group: &str,
    stat: Statistic,
) -> Result<Vec<u32>, OrderingError> {
    for name in [ctrl_group, exp_group] {
        if !rows.iter().any(|r| r.group == name) {
            return Err(OrderingError::UnknownGroup {
                name: name.to_owned(),
            });
        }
    }

    let ctrl = syllable_means(rows, stat, |r| r.group == ctrl_group);
    let exp = syllable_means(rows, stat, |r| r.group == exp_group);
    let difference = ctrl
        .keys()
        .chain(exp.keys())
        .map(|syllable| {
            let diff = match (exp.get(syllable), ctrl.get(syllable)) {
                (Some(e), Some(c)) => e - c,
                _ => f64::NAN,
            };
            (*syllable, diff)
        })
        .collect();
    Ok(descending(&difference))
}
