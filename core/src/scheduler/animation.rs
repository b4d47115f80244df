//! Per-refresh animation step.
//!
//! The scheduler is driven by whatever owns the display refresh (an iced
//! subscription, a tokio interval). Each call to [`AnimationScheduler::tick`]
//! is one cooperative step; the scheduler never renders concurrently with
//! itself and owns only its frame bookkeeping, never sweep data.

use crate::protocol::Mode;
use crate::render::{render_frame, FrameSummary, RenderConfig, Surface, Viewport};
use crate::scheduler::timing::FrameTiming;
use crate::sync::StateSynchronizer;
use crate::telemetry::LogManager;
use std::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Frozen in scanning mode: nothing drawn, next tick still scheduled.
    Frozen,
    Rendered(FrameSummary),
    /// Scheduler was cancelled; no further frames.
    Cancelled,
}

pub struct AnimationScheduler {
    config: RenderConfig,
    viewport: Viewport,
    timing: FrameTiming,
    frames: u64,
    active: bool,
    logger: LogManager,
}

impl AnimationScheduler {
    pub fn new(config: RenderConfig, viewport: Viewport) -> Self {
        Self {
            config,
            viewport,
            timing: FrameTiming::default(),
            frames: 0,
            active: true,
            logger: LogManager::new("scheduler"),
        }
    }

    pub fn resize(&mut self, width: f32, height: f32) {
        self.viewport = Viewport::from_container(width, height);
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn fps(&self) -> f32 {
        self.timing.fps()
    }

    pub fn tick<S: Surface + ?Sized>(
        &mut self,
        sync: &mut StateSynchronizer,
        surface: &mut S,
        now: Instant,
    ) -> TickOutcome {
        if !self.active {
            return TickOutcome::Cancelled;
        }
        self.timing.record(now);

        let state = sync.state();
        if state.display_frozen() && state.mode == Mode::Scanning {
            sync.metrics().record_frozen();
            return TickOutcome::Frozen;
        }

        sync.advance(now);
        let snapshot = sync.snapshot(now);
        let summary = render_frame(&snapshot, &self.viewport, &self.config, surface);
        if summary.popup || (summary.marker && snapshot.proximity_alert) {
            sync.step_pulse();
        }
        self.frames += 1;
        sync.metrics().record_rendered();
        self.logger.trace_frame(&format!(
            "frame {} angle {:.1} commands {}",
            self.frames, snapshot.angle, summary.commands
        ));
        TickOutcome::Rendered(summary)
    }

    /// Cancels the pending reschedule; later ticks are no-ops.
    pub fn cancel(&mut self) {
        if self.active {
            self.active = false;
            self.timing.reset();
            self.logger.record("animation cancelled");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{InboundEvent, InitFrame, ModeChangeFrame, RadarSample};
    use crate::render::DrawCommand;
    use crate::sync::SyncConfig;
    use std::time::Duration;

    fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    fn scheduler() -> AnimationScheduler {
        AnimationScheduler::new(
            RenderConfig::default(),
            Viewport::from_container(640.0, 360.0),
        )
    }

    fn radar(angle: f32) -> InboundEvent {
        InboundEvent::Radar(RadarSample {
            angle,
            distance: 70.0,
            direction: None,
            moving: None,
            detection: None,
        })
    }

    fn switch(mode: Mode) -> InboundEvent {
        InboundEvent::ModeChange(ModeChangeFrame {
            mode,
            message: String::new(),
            stop_animation: None,
            hard_freeze: None,
            waiting_for_data: None,
            angle: None,
            distance: None,
            detection: None,
            moving: None,
        })
    }

    fn live_sync(t0: Instant) -> StateSynchronizer {
        let mut sync = StateSynchronizer::new(SyncConfig::default());
        sync.apply(
            &InboundEvent::Init(InitFrame {
                mode: Mode::Scanning,
                angle: 90.0,
                distance: 0.0,
                direction: None,
                moving: None,
                message: String::new(),
                missing_libraries: Vec::new(),
            }),
            t0,
        );
        sync.apply(&radar(100.0), t0 + ms(5));
        sync
    }

    #[test]
    fn frozen_scanning_ticks_draw_nothing_and_hold_angle() {
        let t0 = Instant::now();
        let mut sync = live_sync(t0);
        sync.apply(&switch(Mode::Tracking), t0 + ms(10));
        sync.apply(&switch(Mode::Scanning), t0 + ms(20));
        let angle = sync.state().current_angle;

        let mut scheduler = scheduler();
        let mut commands: Vec<DrawCommand> = Vec::new();
        for frame in 0..400u64 {
            let outcome = scheduler.tick(&mut sync, &mut commands, t0 + ms(30 + frame * 16));
            assert_eq!(outcome, TickOutcome::Frozen);
        }
        assert!(commands.is_empty());
        assert_eq!(sync.state().current_angle, angle);
        assert_eq!(scheduler.frames(), 0);
        assert_eq!(sync.metrics().snapshot().frozen_frames, 400);
    }

    #[test]
    fn frozen_tracking_still_renders_static_frame() {
        let t0 = Instant::now();
        let mut sync = live_sync(t0);
        sync.apply(&switch(Mode::Tracking), t0 + ms(10));
        let mut scheduler = scheduler();
        let mut commands = Vec::new();
        let outcome = scheduler.tick(&mut sync, &mut commands, t0 + ms(20));
        assert!(matches!(outcome, TickOutcome::Rendered(summary) if summary.waiting));
        assert!(!commands.is_empty());
    }

    #[test]
    fn live_ticks_render_and_extrapolate_when_stale() {
        let t0 = Instant::now();
        let mut sync = live_sync(t0);
        let mut scheduler = scheduler();
        let mut commands = Vec::new();
        let mut now = t0 + ms(16);
        while now < t0 + ms(3000) {
            let outcome = scheduler.tick(&mut sync, &mut commands, now);
            assert!(matches!(outcome, TickOutcome::Rendered(_)));
            now += ms(16);
        }
        assert!(sync.state().simulated);
        assert!(sync.state().current_angle > 100.0);
        assert!(scheduler.fps() > 50.0);
    }

    #[test]
    fn cancelled_scheduler_stops_touching_state() {
        let t0 = Instant::now();
        let mut sync = live_sync(t0);
        let mut scheduler = scheduler();
        scheduler.cancel();
        let mut commands = Vec::new();
        assert_eq!(
            scheduler.tick(&mut sync, &mut commands, t0 + ms(5000)),
            TickOutcome::Cancelled
        );
        assert!(commands.is_empty());
        assert_eq!(sync.state().current_angle, 100.0);
        assert!(!scheduler.is_active());
    }

    #[test]
    fn resize_recentres_the_sweep_for_the_next_frame() {
        let mut scheduler = scheduler();
        scheduler.resize(1000.0, 500.0);
        let viewport = scheduler.viewport();
        assert_eq!(viewport.width, 1000.0);
        assert!((viewport.center.x - 500.0).abs() < 1e-3);
        assert!((viewport.center.y - 450.0).abs() < 1e-3);
        assert!((viewport.radius - 400.0).abs() < 1e-3);

        scheduler.resize(0.0, 0.0);
        assert_eq!(scheduler.viewport().width, 1.0);
    }
}
