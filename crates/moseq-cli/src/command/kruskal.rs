use std::path::PathBuf;

use log::info;
use moseq_analysis::{group_stats, usage::Statistic};
use moseq_stats::correction::CorrectionMethod;
use serde::Serialize;

use super::syllable_stats;
use crate::util::{self, Output, Report};

#[derive(Default, Debug, Clone, clap::Args)]
pub(crate) struct KruskalArg {
    /// Usage table written by `syllable-stats`
    #[arg(long)]
    input: PathBuf,
    /// Project config providing the test parameters
    #[arg(long)]
    config: Option<PathBuf>,
    /// Statistic to compare
    #[arg(long, default_value = "frequency")]
    pub(super) statistic: Statistic,
    /// Number of permutations (overrides the config)
    #[arg(long)]
    n_perm: Option<usize>,
    /// Random seed of the permutations
    #[arg(long, default_value_t = 42)]
    pub(super) seed: u64,
    /// Significance level (overrides the config)
    #[arg(long)]
    thresh: Option<f64>,
    /// Multiple-testing correction (overrides the config)
    #[arg(long)]
    method: Option<CorrectionMethod>,
    /// Comma-separated groups to compare (overrides the config)
    #[arg(long, value_delimiter = ',')]
    pub(super) groups: Option<Vec<String>>,
    /// Output file path
    #[arg(long)]
    output: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
struct KruskalOutput {
    seed: u64,
    #[serde(flatten)]
    report: group_stats::KruskalReport,
}

pub(crate) fn run(arg: &KruskalArg) -> anyhow::Result<()> {
    let KruskalArg {
        input,
        config,
        statistic,
        n_perm,
        seed,
        thresh,
        method,
        groups,
        output,
    } = arg;

    let rows = syllable_stats::read_stats_file(input)?;
    let mut params = util::read_config_file(config.as_deref())?.kruskal;
    if let Some(n_perm) = n_perm {
        params.n_permutations = *n_perm;
    }
    if let Some(thresh) = thresh {
        params.thresh = *thresh;
    }
    if let Some(method) = method {
        params.correction = *method;
    }
    if groups.is_some() {
        params.groups.clone_from(groups);
    }

    info!(
        "Comparing {statistic} with {} permutations ({} correction, thresh {})",
        params.n_permutations, params.correction, params.thresh
    );
    let mut rng = util::seeded_rng(*seed);
    let report = group_stats::run_kruskal(&rows, *statistic, &params, &mut rng)?;

    let significant = report.omnibus.iter().filter(|r| r.is_significant).count();
    info!(
        "{significant} of {} syllables differ between {} groups",
        report.omnibus.len(),
        report.groups.len()
    );
    for pair in &report.pairs {
        info!(
            "  {} vs {}: {:?}",
            pair.groups[0], pair.groups[1], pair.significant_syllables
        );
    }

    let output_report = Report::new(KruskalOutput {
        seed: *seed,
        report,
    });
    Output::save_json(&output_report, output.clone())?;
    Ok(())
}
