use std::{collections::BTreeSet, path::PathBuf};

use log::info;
use moseq_analysis::transitions::{self, GroupTransitions, Normalization};
use serde::Serialize;

use crate::util::{self, Output, Report};

#[derive(Default, Debug, Clone, clap::Args)]
pub(crate) struct TransitionsArg {
    /// Per-session model results (JSON object keyed by session name)
    #[arg(long)]
    input: PathBuf,
    /// Reindexed syllables at or above this label are ignored
    #[arg(long, default_value_t = 40)]
    max_syllable: usize,
    /// Normalization: bigram, rows, columns or none
    #[arg(long, default_value = "bigram")]
    normalize: Normalization,
    /// Comma-separated groups (default: every group in the input)
    #[arg(long, value_delimiter = ',')]
    groups: Option<Vec<String>>,
    /// Output file path
    #[arg(long)]
    output: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
struct TransitionsReport {
    max_syllable: usize,
    normalize: Normalization,
    groups: Vec<GroupTransitions>,
}

pub(crate) fn run(arg: &TransitionsArg) -> anyhow::Result<()> {
    let TransitionsArg {
        input,
        max_syllable,
        normalize,
        groups,
        output,
    } = arg;

    let sessions = util::read_sessions_file(input)?;
    let groups = groups.clone().unwrap_or_else(|| {
        sessions
            .values()
            .map(|s| s.group.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    });
    info!("Computing transitions for groups {groups:?}");

    let matrices =
        transitions::get_group_trans_mats(&sessions, &groups, *max_syllable, *normalize)?;

    let report = Report::new(TransitionsReport {
        max_syllable: *max_syllable,
        normalize: *normalize,
        groups: matrices,
    });
    Output::save_json(&report, output.clone())?;
    Ok(())
}
