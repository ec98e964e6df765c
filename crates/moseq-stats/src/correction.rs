//! Multiple-testing correction of p-values.
//!
//! Each [`CorrectionMethod`] maps a vector of raw p-values to adjusted p-values
//! of the same length and order. Adjusted values are clipped to 1. A hypothesis
//! is rejected at level `alpha` when its adjusted p-value is at most `alpha`.
//!
//! Method names follow the widely used `statsmodels` spelling (`fdr_bh`,
//! `holm-sidak`, ...), which is also what [`CorrectionMethod::from_str`]
//! accepts.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

/// Supported multiple-testing correction procedures.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CorrectionMethod {
    /// Single-step Bonferroni: `min(p * m, 1)`.
    #[serde(rename = "bonferroni")]
    Bonferroni,
    /// Single-step Šidák: `1 - (1 - p)^m`.
    #[serde(rename = "sidak")]
    Sidak,
    /// Holm step-down (Bonferroni based).
    #[serde(rename = "holm")]
    Holm,
    /// Holm step-down with Šidák adjustments.
    #[serde(rename = "holm-sidak")]
    HolmSidak,
    /// Simes-Hochberg step-up.
    #[serde(rename = "simes-hochberg")]
    SimesHochberg,
    /// Benjamini-Hochberg false discovery rate.
    #[default]
    #[serde(rename = "fdr_bh")]
    FdrBh,
    /// Benjamini-Yekutieli false discovery rate (arbitrary dependence).
    #[serde(rename = "fdr_by")]
    FdrBy,
}

#[derive(Debug, derive_more::Display, derive_more::Error)]
#[display(
    "unknown correction method '{name}' (expected one of: {})",
    CorrectionMethod::ALL.map(CorrectionMethod::name).join(", ")
)]
pub struct CorrectionMethodParseError {
    pub name: String,
}

impl CorrectionMethod {
    pub const ALL: [Self; 7] = [
        Self::Bonferroni,
        Self::Sidak,
        Self::Holm,
        Self::HolmSidak,
        Self::SimesHochberg,
        Self::FdrBh,
        Self::FdrBy,
    ];

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Bonferroni => "bonferroni",
            Self::Sidak => "sidak",
            Self::Holm => "holm",
            Self::HolmSidak => "holm-sidak",
            Self::SimesHochberg => "simes-hochberg",
            Self::FdrBh => "fdr_bh",
            Self::FdrBy => "fdr_by",
        }
    }

    /// Adjusts `pvalues` for multiple comparisons.
    ///
    /// The output has the same length and order as the input.
    ///
    /// # Examples
    ///
    /// ```
    /// use moseq_stats::correction::CorrectionMethod;
    ///
    /// let p = [0.01, 0.02, 0.03, 0.04];
    /// assert_eq!(CorrectionMethod::Bonferroni.adjust(&p)[0], 0.04);
    /// let bh = CorrectionMethod::FdrBh.adjust(&p);
    /// assert!(bh.iter().all(|v| (v - 0.04).abs() < 1e-12));
    /// ```
    #[expect(clippy::cast_precision_loss)]
    #[must_use]
    pub fn adjust(self, pvalues: &[f64]) -> Vec<f64> {
        let m = pvalues.len();
        if m == 0 {
            return vec![];
        }
        let mf = m as f64;

        match self {
            Self::Bonferroni => pvalues.iter().map(|p| (p * mf).min(1.0)).collect(),
            Self::Sidak => pvalues.iter().map(|p| sidak(*p, mf)).collect(),
            Self::Holm | Self::HolmSidak => {
                step_down(pvalues, |p, rank| {
                    let remaining = (m - rank) as f64;
                    if self == Self::Holm {
                        p * remaining
                    } else {
                        sidak(p, remaining)
                    }
                })
            }
            Self::SimesHochberg => step_up(pvalues, |p, rank| p * (m - rank) as f64),
            Self::FdrBh => step_up(pvalues, |p, rank| p * mf / (rank + 1) as f64),
            Self::FdrBy => {
                let harmonic = (1..=m).map(|k| 1.0 / k as f64).sum::<f64>();
                step_up(pvalues, |p, rank| p * mf * harmonic / (rank + 1) as f64)
            }
        }
    }

    /// Adjusts `pvalues` and flags the hypotheses rejected at `alpha`.
    #[must_use]
    pub fn reject(self, pvalues: &[f64], alpha: f64) -> (Vec<bool>, Vec<f64>) {
        let adjusted = self.adjust(pvalues);
        let rejected = adjusted.iter().map(|p| *p <= alpha).collect();
        (rejected, adjusted)
    }
}

impl fmt::Display for CorrectionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for CorrectionMethod {
    type Err = CorrectionMethodParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|method| method.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| CorrectionMethodParseError { name: s.to_owned() })
    }
}

fn sidak(p: f64, m: f64) -> f64 {
    -(m * (-p).ln_1p()).exp_m1()
}

fn sorted_order(pvalues: &[f64]) -> Vec<usize> {
    let mut order = (0..pvalues.len()).collect::<Vec<_>>();
    order.sort_by(|&a, &b| pvalues[a].total_cmp(&pvalues[b]));
    order
}

/// Step-down procedure: running maximum from the smallest p-value upwards.
fn step_down<F>(pvalues: &[f64], raw: F) -> Vec<f64>
where
    F: Fn(f64, usize) -> f64,
{
    let order = sorted_order(pvalues);
    let mut adjusted = vec![0.0; pvalues.len()];
    let mut running = 0.0_f64;
    for (rank, &idx) in order.iter().enumerate() {
        running = running.max(raw(pvalues[idx], rank));
        adjusted[idx] = running.min(1.0);
    }
    adjusted
}

/// Step-up procedure: running minimum from the largest p-value downwards.
fn step_up<F>(pvalues: &[f64], raw: F) -> Vec<f64>
where
    F: Fn(f64, usize) -> f64,
{
    let order = sorted_order(pvalues);
    let mut adjusted = vec![0.0; pvalues.len()];
    let mut running = f64::INFINITY;
    for (rank, &idx) in order.iter().enumerate().rev() {
        running = running.min(raw(pvalues[idx], rank));
        adjusted[idx] = running.min(1.0);
    }
    adjusted
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn test_parse_names() {
        for method in CorrectionMethod::ALL {
            assert_eq!(method.name().parse::<CorrectionMethod>().unwrap(), method);
        }
        assert_eq!("FDR_BH".parse::<CorrectionMethod>().unwrap(), CorrectionMethod::FdrBh);
    }

    #[test]
    fn test_parse_unknown_lists_options() {
        let err = "bogus".parse::<CorrectionMethod>().unwrap_err();
        let message = err.to_string();
        assert!(message.contains("bogus"));
        assert!(message.contains("fdr_bh"));
    }

    #[test]
    fn test_fdr_bh_known_values() {
        // p * m / rank, then running minimum from the top
        let p = [0.01, 0.04, 0.03, 0.5];
        let adjusted = CorrectionMethod::FdrBh.adjust(&p);
        assert_relative_eq!(adjusted[0], 0.04);
        assert_relative_eq!(adjusted[1], 0.04 * 4.0 / 3.0);
        assert_relative_eq!(adjusted[2], 0.04 * 4.0 / 3.0);
        assert_relative_eq!(adjusted[3], 0.5);
    }

    #[test]
    fn test_holm_known_values() {
        let p = [0.01, 0.04, 0.03];
        let adjusted = CorrectionMethod::Holm.adjust(&p);
        assert_relative_eq!(adjusted[0], 0.03);
        assert_relative_eq!(adjusted[2], 0.06);
        assert_relative_eq!(adjusted[1], 0.06);
    }

    #[test]
    fn test_simes_hochberg_known_values() {
        let p = [0.01, 0.04, 0.03];
        let adjusted = CorrectionMethod::SimesHochberg.adjust(&p);
        assert_relative_eq!(adjusted[0], 0.03);
        assert_relative_eq!(adjusted[2], 0.04);
        assert_relative_eq!(adjusted[1], 0.04);
    }

    #[test]
    fn test_adjusted_values_are_clipped() {
        for method in CorrectionMethod::ALL {
            let adjusted = method.adjust(&[0.9, 0.95, 1.2]);
            assert!(adjusted.iter().all(|p| *p <= 1.0), "{method}");
        }
    }

    #[test]
    fn test_single_value_is_unchanged_by_most_methods() {
        for method in CorrectionMethod::ALL {
            assert_relative_eq!(method.adjust(&[0.02])[0], 0.02, max_relative = 1e-12);
        }
    }

    #[test]
    fn test_adjusted_never_below_raw() {
        let p = [0.001, 0.2, 0.03, 0.04, 0.7, 0.011];
        for method in CorrectionMethod::ALL {
            let adjusted = method.adjust(&p);
            for (raw, adj) in p.iter().zip(&adjusted) {
                assert!(adj + 1e-15 >= *raw, "{method}: {adj} < {raw}");
            }
        }
    }
}
