//! One client session: synchronizer, scheduler and reflector wired together.
//!
//! All methods take `now` explicitly so the live loop and the replay loop
//! share the same step logic.

use crate::report::console::{SessionReport, StatusPrinter};
use crate::workflow::config::ClientConfig;
use std::sync::Arc;
use std::time::Instant;
use sweepcore::channel::ChannelNotice;
use sweepcore::dispatch::{CommandDispatcher, CommandSink};
use sweepcore::protocol::{Mode, TrackingType};
use sweepcore::reflect::{UiReflector, UiSummary};
use sweepcore::render::{DrawCommand, Viewport};
use sweepcore::scheduler::{AnimationScheduler, TickOutcome};
use sweepcore::sync::{ApplyOutcome, StateSynchronizer};
use sweepcore::telemetry::MetricsRecorder;

/// Off-screen surface size used for the terminal driver.
const SURFACE_WIDTH: f32 = 800.0;
const SURFACE_HEIGHT: f32 = 480.0;

/// Operator intents the driver can issue once connected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    SwitchMode(Mode),
    Tracking(TrackingType),
    Shoot,
    ToggleFreeze,
    RadarStatus,
}

impl Intent {
    fn label(self) -> &'static str {
        match self {
            Intent::SwitchMode(_) => "switch mode",
            Intent::Tracking(_) => "change tracking type",
            Intent::Shoot => "shoot",
            Intent::ToggleFreeze => "toggle freeze",
            Intent::RadarStatus => "request radar status",
        }
    }
}

pub struct Session {
    sync: StateSynchronizer,
    scheduler: AnimationScheduler,
    reflector: UiReflector,
    printer: StatusPrinter,
    surface: Vec<DrawCommand>,
    metrics: Arc<MetricsRecorder>,
}

impl Session {
    pub fn new(config: &ClientConfig, metrics: Arc<MetricsRecorder>, quiet: bool) -> Self {
        Self {
            sync: StateSynchronizer::with_metrics(config.sync.clone(), metrics.clone()),
            scheduler: AnimationScheduler::new(
                config.render.clone(),
                Viewport::from_container(SURFACE_WIDTH, SURFACE_HEIGHT),
            ),
            reflector: UiReflector::new(),
            printer: StatusPrinter::new(quiet),
            surface: Vec::new(),
            metrics,
        }
    }

    pub fn last_frame(&self) -> &[DrawCommand] {
        &self.surface
    }

    pub fn handle_notice(&mut self, notice: &ChannelNotice, now: Instant) -> Option<ApplyOutcome> {
        self.reflector.on_notice(notice);
        let outcome = match notice {
            ChannelNotice::Event(event) => {
                let outcome = self.sync.apply(event, now);
                self.reflector.on_event(event, &outcome);
                Some(outcome)
            }
            _ => None,
        };
        self.printer.observe(self.reflector.status());
        outcome
    }

    pub fn tick(&mut self, now: Instant) -> TickOutcome {
        self.surface.clear();
        self.scheduler.tick(&mut self.sync, &mut self.surface, now)
    }

    pub fn dispatch<S: CommandSink>(
        &mut self,
        dispatcher: &mut CommandDispatcher<S>,
        intent: Intent,
    ) {
        let result = match intent {
            Intent::SwitchMode(mode) => dispatcher.switch_mode(self.sync.state().mode, mode),
            Intent::Tracking(kind) => dispatcher.set_tracking_type(kind),
            Intent::Shoot => dispatcher.trigger_action(),
            Intent::RadarStatus => dispatcher.request_radar_status(),
            Intent::ToggleFreeze => {
                self.sync.toggle_freeze();
                return;
            }
        };
        self.reflector.on_command(intent.label(), &result);
        self.printer.observe(self.reflector.status());
    }

    pub fn summary(&self, now: Instant) -> UiSummary {
        self.reflector
            .summary(self.sync.state(), self.scheduler.fps(), now)
    }

    /// Stops the animation; later ticks report `Cancelled`.
    pub fn teardown(&mut self) {
        self.scheduler.cancel();
    }

    pub fn report(&self) -> SessionReport {
        let state = self.sync.state();
        SessionReport {
            mode: state.mode,
            has_live_data: state.has_live_data,
            display_frozen: state.display_frozen(),
            metrics: self.metrics.snapshot(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sweepcore::channel::decode_frame;
    use sweepcore::prelude::{SweepError, SweepResult};
    use sweepcore::protocol::Command;
    use std::cell::RefCell;
    use std::time::Duration;

    fn event(text: &str) -> ChannelNotice {
        ChannelNotice::Event(decode_frame(text).unwrap())
    }

    fn session() -> Session {
        Session::new(
            &ClientConfig::default(),
            Arc::new(MetricsRecorder::new()),
            true,
        )
    }

    struct Offline;

    impl CommandSink for Offline {
        fn is_connected(&self) -> bool {
            false
        }

        fn deliver(&self, _command: Command) -> SweepResult<()> {
            Err(SweepError::NotConnected)
        }
    }

    #[test]
    fn live_samples_render_and_mode_switch_holds_frame() {
        let t0 = Instant::now();
        let mut session = session();
        session.handle_notice(
            &event(r#"{"type":"init","mode":"RADAR","angle":90,"distance":0,"message":"ready"}"#),
            t0,
        );
        session.handle_notice(&event(r#"{"type":"radar","angle":100,"distance":30}"#), t0);
        assert!(matches!(session.tick(t0), TickOutcome::Rendered(_)));
        assert!(!session.last_frame().is_empty());

        session.handle_notice(
            &event(r#"{"type":"mode_change","mode":"RADAR","hard_freeze":true,"message":"hold"}"#),
            t0,
        );
        let later = t0 + Duration::from_millis(16);
        assert_eq!(session.tick(later), TickOutcome::Frozen);
        assert!(session.last_frame().is_empty());

        let report = session.report();
        assert!(report.display_frozen);
        assert_eq!(report.metrics.frozen_frames, 1);
        assert_eq!(report.metrics.rendered_frames, 1);
    }

    #[derive(Default)]
    struct Recording {
        sent: RefCell<Vec<Command>>,
    }

    impl CommandSink for &Recording {
        fn is_connected(&self) -> bool {
            true
        }

        fn deliver(&self, command: Command) -> SweepResult<()> {
            self.sent.borrow_mut().push(command);
            Ok(())
        }
    }

    #[test]
    fn status_queries_reach_the_controller() {
        let sink = Recording::default();
        let mut session = session();
        let mut dispatcher = CommandDispatcher::new(&sink);
        session.dispatch(&mut dispatcher, Intent::RadarStatus);
        session.dispatch(&mut dispatcher, Intent::Shoot);
        assert_eq!(
            sink.sent.borrow().as_slice(),
            &[Command::GetRadarStatus, Command::Shoot]
        );
        assert!(session.summary(Instant::now()).status.is_none());
    }

    #[test]
    fn offline_dispatch_surfaces_status() {
        let mut session = session();
        let mut dispatcher = CommandDispatcher::new(Offline);
        session.dispatch(&mut dispatcher, Intent::Shoot);
        let summary = session.summary(Instant::now());
        assert_eq!(
            summary.status.unwrap().message,
            "Cannot shoot: channel not connected"
        );
    }

    #[test]
    fn teardown_stops_ticks() {
        let mut session = session();
        session.teardown();
        assert_eq!(session.tick(Instant::now()), TickOutcome::Cancelled);
    }
}
