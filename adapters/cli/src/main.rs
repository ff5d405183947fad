#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that plays a simulated corridor run headlessly.

mod manifest;
mod simulation;

use std::{path::PathBuf, time::Duration};

use anyhow::{Context, Result};
use clap::Parser;
use corridor_runtime::RunContext;
use tracing_subscriber::EnvFilter;

use crate::simulation::{EndReason, PlayerProfile};

/// play a headless endless-corridor run with a scripted player
#[derive(Parser, Debug, Clone)]
#[clap(version, about)]
struct Cli {
    /// course manifest to load instead of the built-in course
    #[clap(short = 'c', long)]
    course: Option<PathBuf>,

    /// unscaled seconds after which the run is ended
    #[clap(short = 's', long, default_value_t = 60)]
    seconds: u64,

    /// travel speed of the simulated player in world units per second
    #[clap(long, default_value_t = 14.0)]
    speed: f32,

    /// probability in [0, 1] that the player handles an obstacle or pickup well
    #[clap(long, default_value_t = 0.75)]
    skill: f32,

    /// seed of the simulated player's decisions
    #[clap(long, default_value_t = 1)]
    seed: u64,

    /// best score known before the run starts
    #[clap(long, default_value_t = 0)]
    high_score: u32,

    /// log pool and stream activity at debug level
    #[clap(short = 'v', long)]
    verbose: bool,
}

/// Entry point for the corridor command-line interface.
fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let course = manifest::load(cli.course.as_deref())?;
    let mut context = RunContext::new(course.config, &course.templates, cli.high_score)
        .context("course configuration was rejected")?;

    let profile = PlayerProfile {
        skill: cli.skill.clamp(0.0, 1.0),
        speed: cli.speed.max(0.0),
        seed: cli.seed,
    };
    let report = simulation::run(&mut context, profile, Duration::from_secs(cli.seconds));

    let ending = match report.end {
        EndReason::TimeLimit => "time limit reached",
        EndReason::Exhausted => "freshness ran out",
    };
    let summary = report.summary;
    let tally = report.tally;
    println!(
        "run over after {:.1}s ({ending}), distance {:.1}",
        report.elapsed.as_secs_f32(),
        report.distance
    );
    println!(
        "score {} (best {}{})",
        summary.score,
        summary.best_score,
        if summary.new_record { ", new record" } else { "" }
    );
    println!(
        "segments: {} activated, {} cleared, {} released, {} deferred, {} substituted",
        tally.activated,
        summary.segments_cleared,
        tally.released,
        tally.deferred,
        tally.substituted
    );
    println!(
        "player: {} hits, {} near misses, {} pickups, {} bonuses, longest clean streak {}",
        tally.hits,
        tally.near_misses,
        tally.pickups,
        tally.bonuses,
        summary.longest_survival_streak
    );
    println!("effects finished: {}", tally.effects_finished);
    Ok(())
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
