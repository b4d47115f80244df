use anyhow::Context;
use clap::{Parser, ValueEnum};
use replay::capture::{Capture, DEFAULT_REPLAY_INTERVAL_MS};
use std::path::PathBuf;
use sweepcore::protocol::{Mode, TrackingType};
use tokio::runtime::Builder as TokioBuilder;
use workflow::config::ClientConfig;
use workflow::runner::{RunPlan, Runner};
use workflow::session::Intent;

mod replay;
mod report;
mod workflow;

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ModeArg {
    Radar,
    Tracking,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum TrackingArg {
    Face,
    Hand,
}

#[derive(Parser)]
#[command(author, version, about = "Terminal client for the sweep radar controller")]
struct Args {
    /// Controller WebSocket endpoint
    #[arg(long)]
    url: Option<String>,
    /// Load the client config from YAML (overrides --url and --frame-interval-ms)
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long, default_value_t = 16)]
    frame_interval_ms: u64,
    /// Request this mode once the controller answers
    #[arg(long, value_enum)]
    mode: Option<ModeArg>,
    /// Request this camera tracking type once the controller answers
    #[arg(long, value_enum)]
    tracking: Option<TrackingArg>,
    /// Fire the controller's action once connected
    #[arg(long, default_value_t = false)]
    shoot: bool,
    /// Ask the controller for its radar status once connected
    #[arg(long, default_value_t = false)]
    radar_status: bool,
    /// Start with the display frozen
    #[arg(long, default_value_t = false)]
    freeze: bool,
    /// Stop after this many display ticks
    #[arg(long)]
    ticks: Option<u64>,
    /// Replay a capture file (one JSON frame per line) instead of connecting
    #[arg(long)]
    replay: Option<PathBuf>,
    #[arg(long, default_value_t = DEFAULT_REPLAY_INTERVAL_MS)]
    replay_interval_ms: u64,
    /// Append a one-line session summary to this file on exit
    #[arg(long)]
    report: Option<PathBuf>,
    /// Do not print status lines
    #[arg(long, default_value_t = false)]
    quiet: bool,
}

impl Args {
    fn intents(&self) -> Vec<Intent> {
        let mut intents = Vec::new();
        if self.freeze {
            intents.push(Intent::ToggleFreeze);
        }
        if let Some(mode) = self.mode {
            intents.push(Intent::SwitchMode(match mode {
                ModeArg::Radar => Mode::Scanning,
                ModeArg::Tracking => Mode::Tracking,
            }));
        }
        if let Some(kind) = self.tracking {
            intents.push(Intent::Tracking(match kind {
                TrackingArg::Face => TrackingType::Face,
                TrackingArg::Hand => TrackingType::Hand,
            }));
        }
        if self.shoot {
            intents.push(Intent::Shoot);
        }
        if self.radar_status {
            intents.push(Intent::RadarStatus);
        }
        intents
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let client_config = if let Some(path) = &args.config {
        ClientConfig::load(path)?
    } else {
        ClientConfig::from_args(args.url.clone(), args.frame_interval_ms)
    };
    let plan = RunPlan {
        intents: args.intents(),
        max_ticks: args.ticks,
        quiet: args.quiet,
    };
    let runner = Runner::new(client_config);

    let runtime = TokioBuilder::new_current_thread()
        .enable_all()
        .build()
        .context("creating session runtime")?;
    let report = runtime.block_on(async {
        match &args.replay {
            Some(path) => {
                let capture = Capture::open(path, args.replay_interval_ms)?;
                runner.run_replay(capture, &plan).await
            }
            None => runner.run_live(&plan).await,
        }
    })?;

    println!("Session finished -> {}", report);
    if let Some(path) = &args.report {
        report.append_to(path)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_become_intents_in_dispatch_order() {
        let args = Args::try_parse_from([
            "headless",
            "--freeze",
            "--mode",
            "tracking",
            "--shoot",
            "--radar-status",
        ])
        .unwrap();
        assert_eq!(
            args.intents(),
            vec![
                Intent::ToggleFreeze,
                Intent::SwitchMode(Mode::Tracking),
                Intent::Shoot,
                Intent::RadarStatus,
            ]
        );
    }
}
