use std::path::{Path, PathBuf};

use log::info;
use moseq_analysis::usage::{self, FrameRecord, StatsParams, SyllableStats};
use serde::{Deserialize, Serialize};

use crate::util::{self, Output, Report};

#[derive(Default, Debug, Clone, clap::Args)]
pub(crate) struct SyllableStatsArg {
    /// Per-session model results (JSON object keyed by session name)
    #[arg(long)]
    input: PathBuf,
    /// Project config providing the frame rate
    #[arg(long)]
    config: Option<PathBuf>,
    /// Minimum share of frames a syllable needs to be kept
    #[arg(long, default_value_t = 0.0)]
    threshold: f64,
    /// Frame rate (overrides the config)
    #[arg(long)]
    fps: Option<f64>,
    /// Report frame counts instead of frequencies
    #[arg(long)]
    counts: bool,
    /// Use the raw heading instead of the median-filtered one
    #[arg(long)]
    no_smooth_heading: bool,
    /// Also write the per-frame table to this path
    #[arg(long)]
    frames_output: Option<PathBuf>,
    /// Output file path
    #[arg(long)]
    output: Option<PathBuf>,
}

/// Usage table as written by `syllable-stats` and read by `kruskal` and `order`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct SyllableStatsReport {
    pub(crate) params: StatsParams,
    pub(crate) stats: Vec<SyllableStats>,
}

#[derive(Debug, Serialize)]
struct FrameTable<'a> {
    frames: &'a [FrameRecord],
}

pub(crate) fn read_stats_file(path: &Path) -> anyhow::Result<Vec<SyllableStats>> {
    let report: Report<SyllableStatsReport> = util::read_json_file("syllable stats", path)?;
    info!(
        "Loaded {} rows (generated at {})",
        report.body.stats.len(),
        report.generated_at
    );
    Ok(report.body.stats)
}

pub(crate) fn run(arg: &SyllableStatsArg) -> anyhow::Result<()> {
    let SyllableStatsArg {
        input,
        config,
        threshold,
        fps,
        counts,
        no_smooth_heading,
        frames_output,
        output,
    } = arg;

    let sessions = util::read_sessions_file(input)?;
    let project = util::read_config_file(config.as_deref())?;
    let params = StatsParams {
        threshold: *threshold,
        fps: fps.unwrap_or(project.fps),
        normalize: !counts,
    };

    let frames = usage::compute_moseq_df(&sessions, params.fps, !no_smooth_heading)?;
    info!("Built frame table with {} rows", frames.len());
    if let Some(path) = frames_output {
        Output::save_json(&Report::new(FrameTable { frames: &frames }), Some(path.clone()))?;
    }

    let stats = usage::compute_stats_df(&frames, &params)?;
    info!("Built usage table with {} rows", stats.len());

    let report = Report::new(SyllableStatsReport { params, stats });
    Output::save_json(&report, output.clone())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use moseq_analysis::{trajectory::SessionMap, usage::SessionResults};

    use super::*;

    #[test]
    fn test_written_table_reads_back() {
        let labels = vec![0, 0, 1, 1, 1, 0];
        let sessions: SessionMap<SessionResults> = [(
            "m1".to_owned(),
            SessionResults {
                group: "ctrl".to_owned(),
                syllables: labels.clone(),
                syllables_reindexed: labels,
                centroid: vec![[0.0, 0.0]; 6],
                heading: vec![0.0; 6],
            },
        )]
        .into_iter()
        .collect();
        let params = StatsParams::default();
        let frames = usage::compute_moseq_df(&sessions, params.fps, true).unwrap();
        let stats = usage::compute_stats_df(&frames, &params).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stats.json");
        let report = Report::new(SyllableStatsReport {
            params,
            stats: stats.clone(),
        });
        Output::save_json(&report, Some(path.clone())).unwrap();

        assert_eq!(read_stats_file(&path).unwrap(), stats);
    }
}
