use crate::replay::capture::Capture;
use crate::report::console::SessionReport;
use crate::workflow::config::ClientConfig;
use crate::workflow::session::{Intent, Session};
use anyhow::Context;
use log::{info, warn};
use std::sync::Arc;
use std::time::Instant;
use sweepcore::channel::{ChannelAdapter, ChannelNotice};
use sweepcore::dispatch::CommandDispatcher;
use sweepcore::telemetry::MetricsRecorder;
use tokio::time::{interval, MissedTickBehavior};

/// What to do during a run besides watching.
#[derive(Debug, Clone, Default)]
pub struct RunPlan {
    /// Issued once, after the first frame of the first connection.
    pub intents: Vec<Intent>,
    /// Stop after this many display ticks.
    pub max_ticks: Option<u64>,
    pub quiet: bool,
}

impl RunPlan {
    fn done(&self, ticks: u64) -> bool {
        self.max_ticks.is_some_and(|max| ticks >= max)
    }
}

#[derive(Clone)]
pub struct Runner {
    config: ClientConfig,
}

impl Runner {
    pub fn new(config: ClientConfig) -> Self {
        Self { config }
    }

    /// Drives a session against the controller until Ctrl+C or the tick limit.
    pub async fn run_live(&self, plan: &RunPlan) -> anyhow::Result<SessionReport> {
        let metrics = Arc::new(MetricsRecorder::new());
        let mut session = Session::new(&self.config, metrics.clone(), plan.quiet);
        let adapter = ChannelAdapter::with_metrics(
            self.config.url.clone(),
            self.config.reconnect.clone(),
            metrics,
        );
        let (handle, mut notices, task) = adapter.split();
        let channel = tokio::spawn(task.run());
        let mut dispatcher = CommandDispatcher::new(handle.clone());
        let mut pending = plan.intents.clone();
        let mut awaiting_first_frame = false;

        let mut frames = interval(self.config.frame_interval());
        frames.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let interrupt = tokio::signal::ctrl_c();
        tokio::pin!(interrupt);
        let mut ticks = 0u64;

        info!("connecting to {}", self.config.url);
        loop {
            tokio::select! {
                _ = &mut interrupt => {
                    info!("interrupted, closing session");
                    break;
                }
                notice = notices.recv() => {
                    let Some(notice) = notice else { break };
                    match &notice {
                        ChannelNotice::Connected => awaiting_first_frame = true,
                        ChannelNotice::Event(_) if awaiting_first_frame => {
                            awaiting_first_frame = false;
                            session.handle_notice(&notice, Instant::now());
                            for intent in pending.drain(..) {
                                session.dispatch(&mut dispatcher, intent);
                            }
                            continue;
                        }
                        _ => {}
                    }
                    session.handle_notice(&notice, Instant::now());
                }
                _ = frames.tick() => {
                    session.tick(Instant::now());
                    ticks += 1;
                    if plan.done(ticks) {
                        break;
                    }
                }
            }
        }

        info!("{}", session.summary(Instant::now()).debug);
        session.teardown();
        handle.close();
        channel.await.context("joining channel task")?;
        Ok(session.report())
    }

    /// Feeds a recorded capture through the same session logic, one frame per
    /// replay interval, and stops once the capture is drained.
    pub async fn run_replay(
        &self,
        mut capture: Capture,
        plan: &RunPlan,
    ) -> anyhow::Result<SessionReport> {
        let metrics = Arc::new(MetricsRecorder::new());
        let mut session = Session::new(&self.config, metrics.clone(), plan.quiet);
        let mut dispatcher = CommandDispatcher::new(ReplaySink);
        for intent in &plan.intents {
            match intent {
                Intent::ToggleFreeze => session.dispatch(&mut dispatcher, *intent),
                other => warn!("{:?} has no controller to reach during replay", other),
            }
        }

        info!("replaying {} frame(s)", capture.len());
        let mut feed = interval(capture.interval());
        let mut frames = interval(self.config.frame_interval());
        frames.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let interrupt = tokio::signal::ctrl_c();
        tokio::pin!(interrupt);
        let mut ticks = 0u64;

        loop {
            tokio::select! {
                _ = &mut interrupt => break,
                _ = feed.tick(), if !capture.is_empty() => {
                    if let Some(notice) = capture.next_notice() {
                        if matches!(notice, ChannelNotice::Rejected { .. }) {
                            metrics.record_rejected();
                        }
                        session.handle_notice(&notice, Instant::now());
                    }
                }
                _ = frames.tick() => {
                    session.tick(Instant::now());
                    ticks += 1;
                    if capture.is_empty() || plan.done(ticks) {
                        break;
                    }
                }
            }
        }

        info!("{}", session.summary(Instant::now()).debug);
        session.teardown();
        Ok(session.report())
    }
}

/// Replay has no controller; every outbound command fails as disconnected.
struct ReplaySink;

impl sweepcore::dispatch::CommandSink for ReplaySink {
    fn is_connected(&self) -> bool {
        false
    }

    fn deliver(&self, _command: sweepcore::protocol::Command) -> sweepcore::SweepResult<()> {
        Err(sweepcore::SweepError::NotConnected)
    }
}
