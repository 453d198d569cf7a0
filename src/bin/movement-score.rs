//! `movement-score` binary: score a recorded session against a reference.
//!
//! Replays every frame of a recording CSV through a [`RepetitionSession`]
//! and prints the session summary.
//!
//! # Usage
//!
//! ```bash
//! # Text report
//! movement-score --reference ideal_squat.csv --recording data.csv
//!
//! # Repair a glued recording first, then print JSON
//! movement-score --reference ideal_squat.csv --recording data.csv --repair --json
//!
//! # Delta comparison only, no per-frame replay
//! movement-score --reference ideal_squat.csv --recording data.csv --deltas-only
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use movement_scoring::store::{load_trajectory, repair_recording, CsvTrajectory};
use movement_scoring::wire::SessionReport;
use movement_scoring::{
    DeltaCache, RepetitionSession, Result, ScoringConfig, ScoringError, SessionSummary,
};

// ---------------------------------------------------------------------------
// CLI arguments
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "movement-score",
    version,
    about = "Score a recorded exercise session against a reference trajectory",
    long_about = None,
)]
struct Args {
    /// Reference trajectory CSV (X, Y, Z, Height columns).
    #[arg(long)]
    reference: PathBuf,

    /// Recorded session CSV.
    #[arg(long)]
    recording: PathBuf,

    /// JSON file with scoring configuration overrides.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Sensor sample rate in Hz (overrides the config file).
    #[arg(long)]
    sample_rate: Option<f64>,

    /// Deviation threshold (overrides the config file).
    #[arg(long)]
    threshold: Option<f64>,

    /// Re-chunk the recording file in place before reading it.
    #[arg(long, default_value_t = false)]
    repair: bool,

    /// Compare delta patterns only, without replaying frames.
    #[arg(long, default_value_t = false)]
    deltas_only: bool,

    /// Print the report as JSON.
    #[arg(long, default_value_t = false)]
    json: bool,
}

// ---------------------------------------------------------------------------
// main
// ---------------------------------------------------------------------------

fn main() -> ExitCode {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<()> {
    let config = load_config(args)?;
    config.validate()?;

    if args.repair {
        let kept = repair_recording(&args.recording)?;
        info!(rows = kept, "recording repaired");
    }

    let summary = if args.deltas_only {
        compare_deltas_only(args, &config)?
    } else {
        replay(args, config)?
    };

    if args.json {
        let report = SessionReport::from(&summary);
        let json = serde_json::to_string_pretty(&report)
            .map_err(|e| ScoringError::invalid_input(e.to_string()))?;
        println!("{json}");
    } else {
        println!("{summary}");
    }
    Ok(())
}

fn load_config(args: &Args) -> Result<ScoringConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let text = std::fs::read_to_string(path)?;
            serde_json::from_str(&text).map_err(|e| ScoringError::invalid_config(e.to_string()))?
        }
        None => ScoringConfig::default(),
    };
    if let Some(hz) = args.sample_rate {
        config = config.with_sample_rate(hz);
    }
    if let Some(threshold) = args.threshold {
        config = config.with_deviation_threshold(threshold);
    }
    Ok(config)
}

fn replay(args: &Args, config: ScoringConfig) -> Result<SessionSummary> {
    let reference = load_trajectory(&args.reference)?;
    let recording = load_trajectory(&args.recording)?;
    info!(
        reference = reference.len(),
        recording = recording.len(),
        "replaying recording"
    );

    let mut session = RepetitionSession::new(config);
    session.start_from_frames(reference)?;
    for frame in recording {
        session.observe(frame)?;
    }
    session.end()
}

fn compare_deltas_only(args: &Args, config: &ScoringConfig) -> Result<SessionSummary> {
    let mut cache = DeltaCache::new();
    let actual = cache.get_or_compute(&CsvTrajectory::new(args.recording.clone()))?;
    let reference = cache.get_or_compute(&CsvTrajectory::new(args.reference.clone()))?;
    SessionSummary::from_deltas(&actual, &reference, &[], Vec::new(), config)
}
