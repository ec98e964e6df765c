//! One-dimensional filters over time series.
//!
//! All filters extend the signal past its ends by reflection about the edge
//! (`d c b a | a b c d | d c b a`), so every output sample has a full window
//! regardless of the series length.

/// Maps a possibly out-of-range position into `0..len` by edge reflection.
///
/// # Panics
///
/// Panics if `len` is zero.
///
/// # Examples
///
/// ```
/// use moseq_stats::signal::reflect_index;
///
/// assert_eq!(reflect_index(-1, 4), 0);
/// assert_eq!(reflect_index(-2, 4), 1);
/// assert_eq!(reflect_index(4, 4), 3);
/// assert_eq!(reflect_index(5, 4), 2);
/// assert_eq!(reflect_index(-3, 1), 0);
/// ```
#[expect(clippy::cast_possible_wrap, clippy::cast_sign_loss)]
#[must_use]
pub fn reflect_index(pos: isize, len: usize) -> usize {
    assert!(len > 0, "cannot reflect into an empty series");
    let period = 2 * len as isize;
    let p = pos.rem_euclid(period);
    let p = if p >= len as isize { period - 1 - p } else { p };
    p as usize
}

/// Symmetric finite-difference derivative of width `ksize`.
///
/// `d_t = (1 / k) * Σ_{i=1..=k} (x_{t+i} - x_{t-i})`
///
/// # Examples
///
/// ```
/// use moseq_stats::signal::filtered_derivative;
///
/// let ramp = [0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
/// let d = filtered_derivative(&ramp, 1);
/// assert_eq!(d[3], 2.0);
/// ```
#[expect(clippy::cast_precision_loss, clippy::cast_possible_wrap)]
#[must_use]
pub fn filtered_derivative(values: &[f64], ksize: usize) -> Vec<f64> {
    let len = values.len();
    if len == 0 || ksize == 0 {
        return vec![0.0; len];
    }
    let k = ksize as f64;
    (0..len as isize)
        .map(|t| {
            let diff = (1..=ksize as isize)
                .map(|i| values[reflect_index(t + i, len)] - values[reflect_index(t - i, len)])
                .sum::<f64>();
            diff / k
        })
        .collect()
}

/// Normalized Gaussian kernel of standard deviation `sigma` truncated at `4σ`.
#[expect(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss,
    clippy::cast_possible_wrap
)]
#[must_use]
pub fn gaussian_kernel(sigma: f64) -> Vec<f64> {
    let radius = (4.0 * sigma + 0.5) as usize;
    let weights = (-(radius as isize)..=radius as isize)
        .map(|x| {
            let x = x as f64;
            (-0.5 * x * x / (sigma * sigma)).exp()
        })
        .collect::<Vec<_>>();
    let total = weights.iter().sum::<f64>();
    weights.into_iter().map(|w| w / total).collect()
}

/// Gaussian smoothing with standard deviation `sigma`.
///
/// A non-positive `sigma` returns the input unchanged.
///
/// # Examples
///
/// ```
/// use moseq_stats::signal::gaussian_filter1d;
///
/// let constant = [2.0; 6];
/// let smoothed = gaussian_filter1d(&constant, 1.0);
/// assert!(smoothed.iter().all(|v| (v - 2.0).abs() < 1e-12));
/// ```
#[expect(clippy::cast_possible_wrap)]
#[must_use]
pub fn gaussian_filter1d(values: &[f64], sigma: f64) -> Vec<f64> {
    let len = values.len();
    if len == 0 || sigma <= 0.0 {
        return values.to_vec();
    }
    let kernel = gaussian_kernel(sigma);
    let radius = (kernel.len() / 2) as isize;
    (0..len as isize)
        .map(|t| {
            kernel
                .iter()
                .enumerate()
                .map(|(j, w)| w * values[reflect_index(t + j as isize - radius, len)])
                .sum()
        })
        .collect()
}

/// Running median over a centered window of `size` samples.
///
/// # Examples
///
/// ```
/// use moseq_stats::signal::median_filter1d;
///
/// let spiky = [1.0, 1.0, 9.0, 1.0, 1.0];
/// assert_eq!(median_filter1d(&spiky, 3), vec![1.0; 5]);
/// ```
#[expect(clippy::cast_possible_wrap)]
#[must_use]
pub fn median_filter1d(values: &[f64], size: usize) -> Vec<f64> {
    let len = values.len();
    if len == 0 || size <= 1 {
        return values.to_vec();
    }
    let half = (size / 2) as isize;
    let mut window = Vec::with_capacity(size);
    (0..len as isize)
        .map(|t| {
            window.clear();
            window.extend((0..size as isize).map(|j| values[reflect_index(t + j - half, len)]));
            window.sort_by(f64::total_cmp);
            window[size / 2]
        })
        .collect()
}

/// Indices that are strictly greater than both immediate neighbours.
///
/// The first and last samples never qualify, so series shorter than three
/// samples have no local maxima.
///
/// # Examples
///
/// ```
/// use moseq_stats::signal::local_maxima;
///
/// assert_eq!(local_maxima(&[0.0, 2.0, 1.0, 1.0, 3.0, 0.0]), vec![1, 4]);
/// assert!(local_maxima(&[1.0, 2.0]).is_empty());
/// ```
#[must_use]
pub fn local_maxima(values: &[f64]) -> Vec<usize> {
    values
        .windows(3)
        .enumerate()
        .filter(|(_, w)| w[1] > w[0] && w[1] > w[2])
        .map(|(i, _)| i + 1)
        .collect()
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn test_derivative_of_constant_is_zero() {
        let d = filtered_derivative(&[3.0; 10], 3);
        assert!(d.iter().all(|v| *v == 0.0));
    }

    #[test]
    fn test_derivative_of_ramp_interior() {
        let ramp = (0..20).map(f64::from).collect::<Vec<_>>();
        let d = filtered_derivative(&ramp, 3);
        // (1 + 2 + 3) * 2 / 3 = 4 for every interior sample
        for v in &d[3..17] {
            assert_relative_eq!(*v, 4.0);
        }
    }

    #[test]
    fn test_derivative_short_series() {
        assert_eq!(filtered_derivative(&[1.0], 3), vec![0.0]);
        assert!(filtered_derivative(&[], 3).is_empty());
    }

    #[test]
    fn test_gaussian_kernel_is_normalized_and_symmetric() {
        let kernel = gaussian_kernel(1.0);
        assert_eq!(kernel.len(), 9);
        assert_relative_eq!(kernel.iter().sum::<f64>(), 1.0, epsilon = 1e-12);
        for i in 0..kernel.len() / 2 {
            assert_relative_eq!(kernel[i], kernel[kernel.len() - 1 - i]);
        }
    }

    #[test]
    fn test_gaussian_filter_preserves_sum_of_interior_impulse() {
        let mut impulse = vec![0.0; 21];
        impulse[10] = 1.0;
        let smoothed = gaussian_filter1d(&impulse, 1.0);
        assert_relative_eq!(smoothed.iter().sum::<f64>(), 1.0, epsilon = 1e-12);
        assert_eq!(local_maxima(&smoothed), vec![10]);
    }

    #[test]
    fn test_gaussian_filter_zero_sigma_is_identity() {
        let values = [1.0, 5.0, 2.0];
        assert_eq!(gaussian_filter1d(&values, 0.0), values.to_vec());
    }

    #[test]
    fn test_median_filter_edges_use_reflection() {
        let values = [5.0, 0.0, 0.0, 0.0];
        // window at t = 0 is [0, 5, 5, 0, 0] reflected for size 5
        let filtered = median_filter1d(&values, 5);
        assert_eq!(filtered[0], 0.0);
    }

    #[test]
    fn test_local_maxima_plateau_is_not_a_peak() {
        assert!(local_maxima(&[0.0, 1.0, 1.0, 0.0]).is_empty());
    }
}
