/// Descriptive statistics summarizing a dataset.
///
/// This structure contains common measures of central tendency and dispersion
/// for a dataset of `f64` values.
#[derive(Debug, Clone, PartialEq)]
pub struct DescriptiveStats {
    /// Number of values in the dataset.
    pub count: usize,
    /// The minimum value in the dataset.
    pub min: f64,
    /// The maximum value in the dataset.
    pub max: f64,
    /// The arithmetic mean (average) of the dataset.
    pub mean: f64,
    /// The population variance of the dataset (divides by `n`).
    pub variance: f64,
    /// The population standard deviation.
    pub std_dev: f64,
    /// The sample standard deviation (divides by `n - 1`).
    ///
    /// `None` when the dataset has a single value.
    pub sample_std_dev: Option<f64>,
}

impl DescriptiveStats {
    /// Computes descriptive statistics from values in any order.
    ///
    /// # Returns
    ///
    /// * `Some(DescriptiveStats)` - if the dataset contains at least one value
    /// * `None` - if the dataset is empty
    ///
    /// # Examples
    ///
    /// ```
    /// # use moseq_stats::descriptive::DescriptiveStats;
    /// let values = [5.0, 2.0, 4.0, 1.0, 3.0];
    /// let stats = DescriptiveStats::new(values).unwrap();
    /// assert_eq!(stats.min, 1.0);
    /// assert_eq!(stats.max, 5.0);
    /// assert_eq!(stats.mean, 3.0);
    /// assert_eq!(stats.variance, 2.0);
    /// assert_eq!(stats.sample_std_dev, Some(2.5_f64.sqrt()));
    /// ```
    #[expect(clippy::cast_precision_loss)]
    #[must_use]
    pub fn new<I>(values: I) -> Option<Self>
    where
        I: IntoIterator<Item = f64>,
    {
        let values = values.into_iter().collect::<Vec<_>>();
        let count = values.len();
        if count == 0 {
            return None;
        }

        let min = values.iter().copied().min_by(f64::total_cmp)?;
        let max = values.iter().copied().max_by(f64::total_cmp)?;
        let n = count as f64;
        let mean = values.iter().sum::<f64>() / n;
        let sum_sq = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>();
        let variance = sum_sq / n;
        let sample_std_dev = (count > 1).then(|| (sum_sq / (n - 1.0)).sqrt());

        Some(Self {
            count,
            min,
            max,
            mean,
            variance,
            std_dev: variance.sqrt(),
            sample_std_dev,
        })
    }
}

/// Mean of the values whose mask entry is `true`.
///
/// Returns `0.0` when no entry is selected, so that callers never divide by zero.
///
/// # Panics
///
/// Panics if `values` and `mask` have different lengths.
///
/// # Examples
///
/// ```
/// # use moseq_stats::descriptive::masked_mean;
/// assert_eq!(masked_mean(&[1.0, 100.0, 3.0], &[true, false, true]), 2.0);
/// assert_eq!(masked_mean(&[1.0], &[false]), 0.0);
/// ```
#[expect(clippy::cast_precision_loss)]
#[must_use]
pub fn masked_mean(values: &[f64], mask: &[bool]) -> f64 {
    assert_eq!(values.len(), mask.len(), "values and mask must match");
    let (sum, count) = values
        .iter()
        .zip(mask)
        .filter(|(_, m)| **m)
        .fold((0.0, 0usize), |(s, c), (v, _)| (s + v, c + 1));
    sum / count.max(1) as f64
}

/// Population standard deviation of the masked values around `mean`.
///
/// Returns `0.0` when no entry is selected.
///
/// # Panics
///
/// Panics if `values` and `mask` have different lengths.
#[expect(clippy::cast_precision_loss)]
#[must_use]
pub fn masked_std_dev(values: &[f64], mask: &[bool], mean: f64) -> f64 {
    assert_eq!(values.len(), mask.len(), "values and mask must match");
    let (sum_sq, count) = values
        .iter()
        .zip(mask)
        .filter(|(_, m)| **m)
        .fold((0.0, 0usize), |(s, c), (v, _)| (s + (v - mean).powi(2), c + 1));
    (sum_sq / count.max(1) as f64).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_values() {
        assert!(DescriptiveStats::new(Vec::<f64>::new()).is_none());
    }

    #[test]
    fn test_single_value_has_no_sample_std_dev() {
        let stats = DescriptiveStats::new([4.0]).unwrap();
        assert_eq!(stats.count, 1);
        assert_eq!(stats.std_dev, 0.0);
        assert_eq!(stats.sample_std_dev, None);
    }

    #[test]
    fn test_masked_std_dev_ignores_unselected() {
        let values = [1.0, 3.0, 1000.0];
        let mask = [true, true, false];
        let mean = masked_mean(&values, &mask);
        assert_eq!(mean, 2.0);
        assert_eq!(masked_std_dev(&values, &mask, mean), 1.0);
    }

    #[test]
    fn test_masked_all_false_is_finite() {
        let values = [1.0, 2.0];
        let mask = [false, false];
        let mean = masked_mean(&values, &mask);
        assert!(masked_std_dev(&values, &mask, mean).is_finite());
    }
}
