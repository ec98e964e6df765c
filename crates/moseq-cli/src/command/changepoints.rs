use std::path::PathBuf;

use anyhow::Context as _;
use log::info;
use moseq_analysis::{
    changepoint::{self, ChangepointResult},
    trajectory::{Frame, SessionMap},
};
use serde::{Deserialize, Serialize};

use crate::util::{self, Output, Report};

#[derive(Default, Debug, Clone, clap::Args)]
pub(crate) struct ChangepointsArg {
    /// Keypoint trajectories (JSON object keyed by session name)
    #[arg(long)]
    input: PathBuf,
    /// Project config with body-part names and changepoint parameters
    #[arg(long)]
    config: Option<PathBuf>,
    /// Anterior keypoint indices, used when no config is given
    #[arg(long, value_delimiter = ',', conflicts_with = "config")]
    anterior: Vec<usize>,
    /// Posterior keypoint indices, used when no config is given
    #[arg(long, value_delimiter = ',', conflicts_with = "config")]
    posterior: Vec<usize>,
    /// Random seed of the shuffled null
    #[arg(long, default_value_t = 0)]
    seed: u64,
    /// Significance level of a changepoint (overrides the config)
    #[arg(long)]
    alpha: Option<f64>,
    /// Include aligned coordinates and z-scored derivatives in the output
    #[arg(long)]
    full: bool,
    /// Output file path
    #[arg(long)]
    output: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ChangepointReport {
    seed: u64,
    alpha: f64,
    threshold: f64,
    num_changepoints: usize,
    changepoints: SessionMap<Vec<usize>>,
    change_scores: SessionMap<Vec<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    aligned_coordinates: Option<SessionMap<Vec<Frame>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    zscored_derivatives: Option<SessionMap<Vec<Frame>>>,
}

pub(crate) fn run(arg: &ChangepointsArg) -> anyhow::Result<()> {
    let ChangepointsArg {
        input,
        config,
        anterior,
        posterior,
        seed,
        alpha,
        full,
        output,
    } = arg;

    let trajectories = util::read_trajectories_file(input)?;
    let mut project = util::read_config_file(config.as_deref())?;
    if let Some(alpha) = alpha {
        project.changepoint.alpha = *alpha;
    }
    let params = project.changepoint;
    let mut rng = util::seeded_rng(*seed);

    let result = if config.is_some() {
        project.validate().context("Invalid body-part configuration")?;
        changepoint::detect_changepoints_with_config(&trajectories, &project, &mut rng)?
    } else {
        changepoint::detect_changepoints(&trajectories, anterior, posterior, &params, &mut rng)?
    };

    info!(
        "Found {} changepoints at threshold {:.3}",
        result.num_changepoints(),
        result.threshold
    );

    let report = Report::new(ChangepointReport::new(result, *seed, params.alpha, *full));
    Output::save_json(&report, output.clone())?;
    Ok(())
}

impl ChangepointReport {
    fn new(result: ChangepointResult, seed: u64, alpha: f64, full: bool) -> Self {
        let num_changepoints = result.num_changepoints();
        let ChangepointResult {
            changepoints,
            change_scores,
            aligned_coordinates,
            zscored_derivatives,
            threshold,
        } = result;
        Self {
            seed,
            alpha,
            threshold,
            num_changepoints,
            changepoints,
            change_scores,
            aligned_coordinates: full.then_some(aligned_coordinates),
            zscored_derivatives: full.then_some(zscored_derivatives),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn one_session<T>(value: T) -> SessionMap<T> {
        [("s1".to_owned(), value)].into_iter().collect()
    }

    fn result() -> ChangepointResult {
        ChangepointResult {
            changepoints: one_session(vec![3, 9]),
            change_scores: one_session(vec![0.0; 12]),
            aligned_coordinates: one_session(vec![]),
            zscored_derivatives: one_session(vec![]),
            threshold: 1.5,
        }
    }

    #[test]
    fn test_summary_report_omits_signals() {
        let report = ChangepointReport::new(result(), 0, 0.1, false);
        assert_eq!(report.num_changepoints, 2);
        let json = serde_json::to_value(&report).unwrap();
        assert!(json.get("aligned_coordinates").is_none());
        assert!(json.get("zscored_derivatives").is_none());
        assert_eq!(json["changepoints"]["s1"], serde_json::json!([3, 9]));
    }

    #[test]
    fn test_full_report_keeps_signals() {
        let report = ChangepointReport::new(result(), 0, 0.1, true);
        let json = serde_json::to_value(&report).unwrap();
        assert!(json["aligned_coordinates"]["s1"].is_array());
    }
}
