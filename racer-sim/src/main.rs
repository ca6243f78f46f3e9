use std::path::PathBuf;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use racer_core::race_event::RaceEvent;
use racer_core::settings::Settings;
use racer_core::GLOBAL_CONFIG;
use racer_sim::map::TrackMap;
use racer_sim::session::{PlayerCommand, RaceSession};

/// Runs a race on a track with the player's car on autopilot.
#[derive(Parser, Debug)]
#[command(name = "racer-sim", version)]
struct Args {
    /// Track file, JSON or YAML
    #[arg(long, default_value = "racer-sim/tracks/oval.yaml")]
    track: PathBuf,

    /// Overrides the configured lap count
    #[arg(long)]
    laps: Option<u32>,

    /// Give up after this many ticks
    #[arg(long, default_value_t = 60_000)]
    max_ticks: u64,

    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Sleep between ticks so the race runs at wall-clock speed
    #[arg(long)]
    realtime: bool,

    /// Settings file layered over the defaults
    #[arg(long)]
    config: Option<String>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let mut settings = match &args.config {
        Some(path) => Settings::from_file(path)
            .with_context(|| format!("failed to load settings from {path}"))?,
        None => GLOBAL_CONFIG.clone(),
    };
    if let Some(laps) = args.laps {
        settings.race.total_laps = laps;
    }

    let map = TrackMap::load(&args.track)?;
    let mut session = RaceSession::new(map, settings, args.seed);
    session.hooks_mut().add_catch_all(|event| {
        if matches!(
            event,
            RaceEvent::LapCompleted { .. } | RaceEvent::RaceFinished { .. } | RaceEvent::Go
        ) {
            info!("{:?}", event);
        }
    });

    let tick_duration = Duration::from_millis(session.settings().tick_ms);
    let time_step = tick_duration.as_secs_f64();
    loop {
        let start_time = Instant::now();

        let report = session.tick(time_step, PlayerCommand::Autopilot);
        if report.stop {
            break;
        }
        if session.ticks() >= args.max_ticks {
            warn!("stopping after {} ticks without a finish", session.ticks());
            break;
        }

        // wait out the rest of the tick
        if args.realtime {
            if let Some(remaining) = tick_duration.checked_sub(start_time.elapsed()) {
                thread::sleep(remaining);
            }
        }
    }

    println!("{}", serde_json::to_string_pretty(&session.summary())?);
    Ok(())
}
