use std::path::PathBuf;

use log::info;
use moseq_analysis::{
    ordering::{self, SyllableOrdering},
    usage::Statistic,
};
use serde::Serialize;

use super::syllable_stats;
use crate::util::{Output, Report};

#[derive(Default, Debug, Clone, clap::Args)]
pub(crate) struct OrderArg {
    /// Usage table written by `syllable-stats`
    #[arg(long)]
    input: PathBuf,
    /// Statistic to order by
    #[arg(long, default_value = "frequency")]
    statistic: Statistic,
    /// Control group; orders by the experimental minus control difference
    #[arg(long, requires = "exp")]
    ctrl: Option<String>,
    /// Experimental group
    #[arg(long, requires = "ctrl")]
    exp: Option<String>,
    /// Output file path
    #[arg(long)]
    output: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
struct OrderReport {
    statistic: Statistic,
    #[serde(skip_serializing_if = "Option::is_none")]
    ctrl: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    exp: Option<String>,
    #[serde(flatten)]
    ordering: SyllableOrdering,
}

pub(crate) fn run(arg: &OrderArg) -> anyhow::Result<()> {
    let OrderArg {
        input,
        statistic,
        ctrl,
        exp,
        output,
    } = arg;

    let rows = syllable_stats::read_stats_file(input)?;
    let ordering = match (ctrl, exp) {
        (Some(ctrl), Some(exp)) => {
            let ordering =
                ordering::sort_syllables_by_stat_difference(&rows, ctrl, exp, *statistic)?;
            SyllableOrdering::from_ordering(ordering)
        }
        _ => ordering::sort_syllables_by_stat(&rows, *statistic),
    };
    info!("Syllable order: {:?}", ordering.ordering);

    let report = Report::new(OrderReport {
        statistic: *statistic,
        ctrl: ctrl.clone(),
        exp: exp.clone(),
        ordering,
    });
    Output::save_json(&report, output.clone())?;
    Ok(())
}
