//! Syllable transition matrices
//!
//! A transition is a change of syllable label between consecutive frames.
//! Bigram matrices count transitions `from -> to` for labels below
//! `max_syllable`; labels at or above it (rare syllables) are skipped.
//!
//! ```text
//! labels       0 0 1 1 1 2 0 0
//! transitions      1     2 0
//! bigrams          (1,2) (2,0)
//! ```
//!
//! Note that the first label of a sequence is not a transition.

use log::debug;
use serde::{Deserialize, Serialize};

use crate::{trajectory::SessionMap, usage::SessionResults};

/// `max_syllable × max_syllable` matrix indexed as `[from][to]`.
pub type TransitionMatrix = Vec<Vec<f64>>;

#[derive(
    Default, Debug, Clone, Copy, PartialEq, Eq, derive_more::FromStr, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Normalization {
    /// Divide by the total number of transitions
    #[default]
    Bigram,
    /// Each row sums to 1 (outgoing probabilities)
    Rows,
    /// Each column sums to 1 (incoming probabilities)
    Columns,
    /// Raw counts
    None,
}

#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum TransitionError {
    #[display("no session belongs to group '{name}'")]
    EmptyGroup { name: String },
}

/// Labels at every change point of `labels`, and where they occur.
#[must_use]
pub fn get_transitions(labels: &[u32]) -> (Vec<u32>, Vec<usize>) {
    let locations = labels
        .windows(2)
        .enumerate()
        .filter(|(_, w)| w[0] != w[1])
        .map(|(i, _)| i + 1)
        .collect::<Vec<_>>();
    let transitions = locations.iter().map(|&i| labels[i]).collect();
    (transitions, locations)
}

/// Counts consecutive pairs of `labels`, skipping pairs that contain a label
/// `>= max_label`.
#[must_use]
pub fn n_gram_transition_matrix(labels: &[u32], max_label: usize) -> TransitionMatrix {
    let mut matrix = vec![vec![0.0; max_label]; max_label];
    for pair in labels.windows(2) {
        let (from, to) = (pair[0] as usize, pair[1] as usize);
        if from < max_label && to < max_label {
            matrix[from][to] += 1.0;
        }
    }
    matrix
}

/// Normalizes a transition matrix.
///
/// Rows, columns or matrices that sum to zero are left as they are.
#[must_use]
pub fn normalize_transition_matrix(
    mut matrix: TransitionMatrix,
    normalize: Normalization,
) -> TransitionMatrix {
    match normalize {
        Normalization::None => {}
        Normalization::Bigram => {
            let total = matrix.iter().flatten().sum::<f64>();
            if total > 0.0 {
                matrix.iter_mut().flatten().for_each(|v| *v /= total);
            }
        }
        Normalization::Rows => {
            for row in &mut matrix {
                let total = row.iter().sum::<f64>();
                if total > 0.0 {
                    row.iter_mut().for_each(|v| *v /= total);
                }
            }
        }
        Normalization::Columns => {
            let width = matrix.first().map_or(0, Vec::len);
            for col in 0..width {
                let total = matrix.iter().map(|row| row[col]).sum::<f64>();
                if total > 0.0 {
                    matrix.iter_mut().for_each(|row| row[col] /= total);
                }
            }
        }
    }
    matrix
}

/// Transition matrix of each label sequence, or a single matrix of all of
/// them when `combine` is set.
///
/// `smoothing` is a pseudo-count added to every entry before normalization
/// (once to the combined sum when combining).
#[must_use]
pub fn get_transition_matrix(
    sessions: &[&[u32]],
    max_syllable: usize,
    normalize: Normalization,
    smoothing: f64,
    combine: bool,
) -> Vec<TransitionMatrix> {
    let counts = sessions
        .iter()
        .map(|labels| n_gram_transition_matrix(&get_transitions(labels).0, max_syllable));

    let smooth = |mut matrix: TransitionMatrix| {
        matrix
            .iter_mut()
            .flatten()
            .for_each(|v| *v += smoothing);
        matrix
    };

    if combine {
        let sum = counts.fold(vec![vec![0.0; max_syllable]; max_syllable], |mut acc, m| {
            for (acc_row, row) in acc.iter_mut().zip(&m) {
                for (a, v) in acc_row.iter_mut().zip(row) {
                    *a += v;
                }
            }
            acc
        });
        vec![normalize_transition_matrix(smooth(sum), normalize)]
    } else {
        counts
            .map(|m| normalize_transition_matrix(smooth(m), normalize))
            .collect()
    }
}

/// Combined transition matrix and syllable usage of one group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupTransitions {
    pub group: String,
    pub matrix: TransitionMatrix,
    /// Share of syllable instances (not frames) for each label below
    /// `max_syllable`
    pub usage: Vec<f64>,
}

/// Per-group transition matrices over the reindexed syllable labels.
pub fn get_group_trans_mats(
    sessions: &SessionMap<SessionResults>,
    groups: &[String],
    max_syllable: usize,
    normalize: Normalization,
) -> Result<Vec<GroupTransitions>, TransitionError> {
    groups
        .iter()
        .map(|group| {
            let labels = sessions
                .values()
                .filter(|s| &s.group == group)
                .map(|s| s.syllables_reindexed.as_slice())
                .collect::<Vec<_>>();
            if labels.is_empty() {
                return Err(TransitionError::EmptyGroup {
                    name: group.clone(),
                });
            }

            let matrix = get_transition_matrix(&labels, max_syllable, normalize, 0.0, true)
                .into_iter()
                .next()
                .unwrap_or_default();
            let usage = instance_usage(&labels, max_syllable);
            debug!("{group}: {} sessions", labels.len());
            Ok(GroupTransitions {
                group: group.clone(),
                matrix,
                usage,
            })
        })
        .collect()
}

/// Share of run-length segments per label, after dropping labels
/// `>= max_syllable`.
fn instance_usage(sessions: &[&[u32]], max_syllable: usize) -> Vec<f64> {
    let mut counts = vec![0.0; max_syllable];
    for labels in sessions {
        let mut previous = None;
        for &label in labels.iter().filter(|&&l| (l as usize) < max_syllable) {
            if previous != Some(label) {
                counts[label as usize] += 1.0;
            }
            previous = Some(label);
        }
    }
    let total = counts.iter().sum::<f64>();
    if total > 0.0 {
        counts.iter_mut().for_each(|c| *c /= total);
    }
    counts
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn test_get_transitions() {
        let (transitions, locations) = get_transitions(&[0, 0, 1, 1, 1, 2, 0, 0]);
        assert_eq!(transitions, vec![1, 2, 0]);
        assert_eq!(locations, vec![2, 5, 6]);
        assert_eq!(get_transitions(&[3]), (vec![], vec![]));
    }

    #[test]
    fn test_bigram_counts_skip_rare_labels() {
        let matrix = n_gram_transition_matrix(&[0, 1, 0, 1, 5, 0], 2);
        assert_eq!(matrix, vec![vec![0.0, 2.0], vec![1.0, 0.0]]);
    }

    #[test]
    fn test_normalizations() {
        let counts = vec![vec![1.0, 3.0], vec![0.0, 0.0]];
        let rows = normalize_transition_matrix(counts.clone(), Normalization::Rows);
        assert_eq!(rows, vec![vec![0.25, 0.75], vec![0.0, 0.0]]);
        let cols = normalize_transition_matrix(counts.clone(), Normalization::Columns);
        assert_eq!(cols, vec![vec![1.0, 1.0], vec![0.0, 0.0]]);
        let bigram = normalize_transition_matrix(counts.clone(), Normalization::Bigram);
        assert_eq!(bigram, vec![vec![0.25, 0.75], vec![0.0, 0.0]]);
        assert_eq!(
            normalize_transition_matrix(counts.clone(), Normalization::None),
            counts
        );
    }

    #[test]
    fn test_parse_normalization() {
        assert_eq!("rows".parse::<Normalization>().unwrap(), Normalization::Rows);
        assert_eq!("none".parse::<Normalization>().unwrap(), Normalization::None);
        assert!("diagonal".parse::<Normalization>().is_err());
    }

    #[test]
    fn test_combined_matrix_sums_sessions() {
        let a: &[u32] = &[0, 0, 1, 0];
        let b: &[u32] = &[1, 1, 0];
        let separate = get_transition_matrix(&[a, b], 2, Normalization::None, 0.0, false);
        assert_eq!(separate.len(), 2);
        let combined = get_transition_matrix(&[a, b], 2, Normalization::None, 0.5, true);
        assert_eq!(combined.len(), 1);
        // transitions: a -> [1, 0], b -> [0]; the only bigram is (1, 0)
        assert_eq!(combined[0], vec![vec![0.5, 0.5], vec![1.5, 0.5]]);
    }

    #[test]
    fn test_group_usage_counts_instances() {
        let session = |group: &str, labels: Vec<u32>| SessionResults {
            group: group.to_owned(),
            syllables: labels.clone(),
            centroid: vec![[0.0, 0.0]; labels.len()],
            heading: vec![0.0; labels.len()],
            syllables_reindexed: labels,
        };
        let sessions = [
            ("s1".to_owned(), session("g", vec![0, 0, 0, 1, 0])),
            ("s2".to_owned(), session("g", vec![1, 1])),
            ("s3".to_owned(), session("h", vec![2, 2])),
        ]
        .into_iter()
        .collect();

        let groups = ["g".to_owned()];
        let result = get_group_trans_mats(&sessions, &groups, 2, Normalization::Bigram).unwrap();
        // instances: 0, 1, 0 in s1 and 1 in s2
        assert_relative_eq!(result[0].usage[0], 0.5);
        assert_relative_eq!(result[0].usage[1], 0.5);

        let missing = ["x".to_owned()];
        assert!(get_group_trans_mats(&sessions, &missing, 2, Normalization::Bigram).is_err());
    }
}
