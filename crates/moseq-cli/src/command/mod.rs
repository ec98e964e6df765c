use clap::{Parser, Subcommand};

use self::{
    changepoints::ChangepointsArg, kruskal::KruskalArg, order::OrderArg,
    syllable_stats::SyllableStatsArg, transitions::TransitionsArg,
};

mod changepoints;
mod kruskal;
mod order;
mod syllable_stats;
mod transitions;

#[derive(Debug, Clone, Parser)]
#[command(author, version, about, long_about = None)]
pub struct CommandArgs {
    /// What analysis to run
    #[command(subcommand)]
    mode: Mode,
}

#[derive(Debug, Clone, Subcommand)]
enum Mode {
    /// Detect pose changepoints in keypoint trajectories
    Changepoints(#[clap(flatten)] ChangepointsArg),
    /// Summarize syllable usage per session
    SyllableStats(#[clap(flatten)] SyllableStatsArg),
    /// Compare syllable usage between groups (Kruskal-Wallis and Dunn's tests)
    Kruskal(#[clap(flatten)] KruskalArg),
    /// Compute syllable transition matrices per group
    Transitions(#[clap(flatten)] TransitionsArg),
    /// Order syllables by a statistic or a group difference
    Order(#[clap(flatten)] OrderArg),
}

pub fn run() -> anyhow::Result<()> {
    let args = CommandArgs::parse();
    match args.mode {
        Mode::Changepoints(arg) => changepoints::run(&arg)?,
        Mode::SyllableStats(arg) => syllable_stats::run(&arg)?,
        Mode::Kruskal(arg) => kruskal::run(&arg)?,
        Mode::Transitions(arg) => transitions::run(&arg)?,
        Mode::Order(arg) => order::run(&arg)?,
    }
    Ok(())
}
