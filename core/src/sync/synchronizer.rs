//! The authoritative sweep state machine.
//!
//! Every inbound telemetry event and every animation tick passes through
//! [`StateSynchronizer`]; nothing else mutates [`SweepState`]. The composite
//! state is `{Scanning, Tracking} x {live, awaiting data} x {frozen, active}`.
//! A mode transition always lands in `awaiting data + frozen`, and only a
//! qualifying sample in scanning mode (or the operator) leaves the frozen
//! state again.

use crate::math::geometry::clamp_angle;
use crate::protocol::{
    DetectionFrame, InboundEvent, InitFrame, Mode, ModeChangeFrame, RadarSample,
};
use crate::sync::config::SyncConfig;
use crate::sync::state::{
    DetectionEvent, FreezeCause, SweepDirection, SweepState, TrailSample,
};
use crate::telemetry::{LogManager, MetricsRecorder};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Result of applying one inbound event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ApplyOutcome {
    /// Sample applied to the live state.
    Applied,
    /// Sample cleared a mode-transition freeze.
    Released,
    /// Sample recorded while the display stays frozen.
    Recorded,
    /// Sample repeats the pre-transition reading and was dropped.
    Duplicate,
    ModeSwitched { from: Mode, to: Mode },
    /// Controller imposed a freeze without changing mode.
    Frozen,
    SessionStarted,
    /// Stored reading after clamping.
    DetectionRecorded {
        angle: f32,
        distance: f32,
        renderable: bool,
    },
    TrackLost,
    /// Event lacked the fields it needs; state untouched.
    Ignored,
    /// Event carries nothing for the sweep state.
    Passthrough,
}

/// Cycling pulse ring radius for the detection marker.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PulseState {
    pub size: f32,
}

impl PulseState {
    pub fn step(&mut self, step: f32, max: f32) {
        self.size += step;
        if self.size > max {
            self.size = 0.0;
        }
    }

    pub fn reset(&mut self) {
        self.size = 0.0;
    }
}

/// One afterglow segment ready to draw.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrailGlow {
    pub angle: f32,
    /// 0.0 for a fresh sample, 1.0 at the max trail age.
    pub age_fraction: f32,
    pub simulated: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DetectionView {
    pub angle: f32,
    pub distance: f32,
    pub age: Duration,
}

/// Read-only per-frame view handed to the renderer.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderState {
    pub mode: Mode,
    pub angle: f32,
    pub distance: f32,
    pub has_live_data: bool,
    pub display_frozen: bool,
    pub proximity_alert: bool,
    pub simulated: bool,
    pub trail: Vec<TrailGlow>,
    /// Present only while the detection is within its window and renderable.
    pub detection: Option<DetectionView>,
    pub pulse: f32,
    pub pulse_max: f32,
    pub min_angle: f32,
    pub max_angle: f32,
}

pub struct StateSynchronizer {
    config: SyncConfig,
    state: SweepState,
    pulse: PulseState,
    /// Reading in effect when the current hard freeze began.
    frozen_reference: Option<(f32, f32)>,
    last_advance: Option<Instant>,
    logger: LogManager,
    metrics: Arc<MetricsRecorder>,
}

impl StateSynchronizer {
    pub fn new(config: SyncConfig) -> Self {
        Self::with_metrics(config, Arc::new(MetricsRecorder::new()))
    }

    pub fn with_metrics(config: SyncConfig, metrics: Arc<MetricsRecorder>) -> Self {
        let initial = clamp_angle(90.0, config.min_angle, config.max_angle);
        let state = SweepState::new(initial, config.normalized_capacity());
        Self {
            config,
            state,
            pulse: PulseState::default(),
            frozen_reference: None,
            last_advance: None,
            logger: LogManager::new("sync"),
            metrics,
        }
    }

    pub fn state(&self) -> &SweepState {
        &self.state
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    pub fn metrics(&self) -> &Arc<MetricsRecorder> {
        &self.metrics
    }

    pub fn apply(&mut self, event: &InboundEvent, now: Instant) -> ApplyOutcome {
        let outcome = match event {
            InboundEvent::Init(frame) => self.handle_init(frame, now),
            InboundEvent::Radar(sample) => self.handle_sample(sample, now),
            InboundEvent::Detection(frame) => self.handle_detection(frame, now),
            InboundEvent::ModeChange(frame) => self.handle_mode_change(frame),
            InboundEvent::Camera(_)
            | InboundEvent::SystemMessage(_)
            | InboundEvent::ShootResponse(_) => ApplyOutcome::Passthrough,
        };
        if !matches!(
            outcome,
            ApplyOutcome::Passthrough | ApplyOutcome::Duplicate | ApplyOutcome::Ignored
        ) {
            self.metrics.record_applied();
        }
        outcome
    }

    fn clamp_reading(&self, angle: f32, distance: f32) -> (f32, f32) {
        let clamped_angle = clamp_angle(angle, self.config.min_angle, self.config.max_angle);
        let clamped_distance = if distance.is_nan() {
            0.0
        } else {
            distance.clamp(0.0, self.config.max_distance_cm)
        };
        if clamped_angle != angle || clamped_distance != distance {
            self.metrics.record_clamped();
            self.logger.trace_frame(&format!(
                "clamped reading {:.1}deg/{:.1}cm -> {:.1}deg/{:.1}cm",
                angle, distance, clamped_angle, clamped_distance
            ));
        }
        (clamped_angle, clamped_distance)
    }

    fn handle_init(&mut self, frame: &InitFrame, now: Instant) -> ApplyOutcome {
        let (angle, distance) = self.clamp_reading(frame.angle, frame.distance);
        let state = &mut self.state;
        state.mode = frame.mode;
        state.current_angle = angle;
        state.current_distance = distance;
        if let Some(direction) = frame.direction.and_then(SweepDirection::from_wire) {
            state.sweep_direction = direction;
        }
        state.servo_moving = frame.moving.unwrap_or(false);
        state.has_live_data = false;
        state.detection = None;
        state.trail.clear();
        state.simulated = false;
        state.proximity_alert = false;
        state.last_event_at = Some(now);
        if state.display_frozen() {
            state.frozen_angle = angle;
        }
        if state.hard_frozen() {
            self.frozen_reference = Some((angle, distance));
        }
        self.pulse.reset();
        self.last_advance = None;
        self.logger.record(&format!(
            "session start in {} at {:.1}deg",
            frame.mode, angle
        ));
        ApplyOutcome::SessionStarted
    }

    fn handle_sample(&mut self, sample: &RadarSample, now: Instant) -> ApplyOutcome {
        let (angle, distance) = self.clamp_reading(sample.angle, sample.distance);
        match self.state.freeze {
            Some(FreezeCause::ModeTransition) => {
                if self.state.mode == Mode::Scanning {
                    if self.frozen_reference == Some((angle, distance)) {
                        self.logger
                            .trace_frame("dropping pre-transition echo while frozen");
                        return ApplyOutcome::Duplicate;
                    }
                    self.write_sample(sample, angle, distance, now);
                    self.state.freeze = None;
                    self.frozen_reference = None;
                    self.logger.record(&format!(
                        "live data at {:.1}deg, releasing freeze",
                        angle
                    ));
                    ApplyOutcome::Released
                } else {
                    self.write_sample(sample, angle, distance, now);
                    ApplyOutcome::Recorded
                }
            }
            Some(FreezeCause::Operator) => {
                self.write_sample(sample, angle, distance, now);
                ApplyOutcome::Recorded
            }
            None => {
                self.write_sample(sample, angle, distance, now);
                ApplyOutcome::Applied
            }
        }
    }

    fn write_sample(&mut self, sample: &RadarSample, angle: f32, distance: f32, now: Instant) {
        let state = &mut self.state;
        let direction = sample
            .direction
            .and_then(SweepDirection::from_wire)
            .unwrap_or_else(|| {
                let delta = angle - state.current_angle;
                if delta.abs() > 1.0 {
                    if delta > 0.0 {
                        SweepDirection::Increasing
                    } else {
                        SweepDirection::Decreasing
                    }
                } else {
                    state.sweep_direction
                }
            });
        state.current_angle = angle;
        state.current_distance = distance;
        state.sweep_direction = direction;
        state.has_live_data = true;
        state.simulated = false;
        state.last_event_at = Some(now);
        state.proximity_alert =
            sample.detection.unwrap_or(false) || distance < self.config.proximity_distance_cm;
        if let Some(moving) = sample.moving {
            state.servo_moving = moving;
        }
        state.trail.push(TrailSample {
            angle,
            observed_at: now,
            simulated: false,
        });
    }

    fn handle_detection(&mut self, frame: &DetectionFrame, now: Instant) -> ApplyOutcome {
        if frame.is_lost_track() {
            self.state.detection = None;
            self.logger.record("tracking lost");
            return ApplyOutcome::TrackLost;
        }
        let Some((angle, distance)) = frame.position() else {
            self.logger.warn("detection without coordinates ignored");
            return ApplyOutcome::Ignored;
        };
        let (angle, distance) = self.clamp_reading(angle, distance);
        self.state.detection = Some(DetectionEvent {
            angle,
            distance,
            observed_at: now,
        });
        self.pulse.reset();
        let renderable = self.detection_renderable(now);
        self.logger.record(&format!(
            "object detected at {:.1}deg / {:.1}cm (renderable: {})",
            angle, distance, renderable
        ));
        ApplyOutcome::DetectionRecorded {
            angle,
            distance,
            renderable,
        }
    }

    fn handle_mode_change(&mut self, frame: &ModeChangeFrame) -> ApplyOutcome {
        let from = self.state.mode;
        let transition = frame.mode != from;
        let forced = frame.hard_freeze.unwrap_or(false) || frame.stop_animation.unwrap_or(false);

        if let (Some(angle), Some(distance)) = (frame.angle, frame.distance) {
            let (angle, distance) = self.clamp_reading(angle, distance);
            self.state.current_angle = angle;
            self.state.current_distance = distance;
        } else if let Some(angle) = frame.angle {
            let (angle, _) = self.clamp_reading(angle, self.state.current_distance);
            self.state.current_angle = angle;
        }
        if let Some(moving) = frame.moving {
            self.state.servo_moving = moving;
        }
        if let Some(flag) = frame.detection {
            self.state.proximity_alert = flag;
        }

        if transition || forced {
            self.hard_freeze(frame.mode);
            if transition {
                self.logger.record(&format!(
                    "mode {} -> {}, hard freeze until live data",
                    from, frame.mode
                ));
                return ApplyOutcome::ModeSwitched {
                    from,
                    to: frame.mode,
                };
            }
            self.logger.record("controller requested hard freeze");
            return ApplyOutcome::Frozen;
        }

        if frame.waiting_for_data.unwrap_or(false) {
            self.state.has_live_data = false;
        }
        ApplyOutcome::Applied
    }

    fn hard_freeze(&mut self, mode: Mode) {
        let state = &mut self.state;
        state.mode = mode;
        state.has_live_data = false;
        state.detection = None;
        state.trail.clear();
        state.simulated = false;
        state.freeze = Some(FreezeCause::ModeTransition);
        state.frozen_angle = state.current_angle;
        self.frozen_reference = Some((state.current_angle, state.current_distance));
        self.pulse.reset();
        self.last_advance = None;
    }

    /// Operator freeze/unfreeze. Independent of the live-data flag.
    pub fn set_frozen(&mut self, frozen: bool) {
        if frozen {
            if self.state.freeze != Some(FreezeCause::Operator) {
                self.state.frozen_angle = self.state.current_angle;
                self.state.freeze = Some(FreezeCause::Operator);
                self.logger.record("display frozen by operator");
            }
        } else if self.state.freeze.take().is_some() {
            self.frozen_reference = None;
            self.last_advance = None;
            self.logger.record("display released by operator");
        }
    }

    pub fn toggle_freeze(&mut self) -> bool {
        let frozen = !self.state.display_frozen();
        self.set_frozen(frozen);
        frozen
    }

    pub fn detection_renderable(&self, now: Instant) -> bool {
        let window = self.config.detection_window();
        self.state.has_live_data
            && !self.state.display_frozen()
            && self
                .state
                .detection
                .map(|d| d.is_visible(now, window))
                .unwrap_or(false)
    }

    fn fallback_eligible(&self, now: Instant) -> bool {
        self.state.mode == Mode::Scanning
            && !self.state.display_frozen()
            && self.state.has_live_data
            && self
                .state
                .last_event_at
                .map(|at| now.saturating_duration_since(at) > self.config.staleness())
                .unwrap_or(false)
    }

    /// Per-tick housekeeping: expires the detection and, when the link is
    /// stale, extrapolates the sweep. Returns true when the angle was
    /// simulated on this tick.
    pub fn advance(&mut self, now: Instant) -> bool {
        let elapsed = self
            .last_advance
            .map(|at| now.saturating_duration_since(at))
            .unwrap_or_default();
        self.last_advance = Some(now);

        let window = self.config.detection_window();
        if matches!(self.state.detection, Some(d) if !d.is_visible(now, window)) {
            self.state.detection = None;
        }

        if !self.fallback_eligible(now) {
            return false;
        }
        if !self.state.simulated {
            self.logger
                .warn("telemetry stale, extrapolating sweep locally");
        }

        let (min, max) = (self.config.min_angle, self.config.max_angle);
        let state = &mut self.state;
        let mut angle = state.current_angle
            + state.sweep_direction.sign()
                * self.config.simulation_rate_deg_per_s
                * elapsed.as_secs_f32();
        if angle >= max {
            angle = max;
            state.sweep_direction = SweepDirection::Decreasing;
        } else if angle <= min {
            angle = min;
            state.sweep_direction = SweepDirection::Increasing;
        }
        state.current_angle = angle;
        state.simulated = true;
        state.trail.push(TrailSample {
            angle,
            observed_at: now,
            simulated: true,
        });
        self.metrics.record_simulated();
        true
    }

    pub fn step_pulse(&mut self) {
        self.pulse
            .step(self.config.pulse_step, self.config.pulse_max);
    }

    pub fn pulse(&self) -> PulseState {
        self.pulse
    }

    pub fn snapshot(&self, now: Instant) -> RenderState {
        let max_age = self.config.trail_max_age();
        let max_age_secs = max_age.as_secs_f32().max(f32::EPSILON);
        let trail = self
            .state
            .trail
            .recent(now, max_age)
            .map(|(sample, age)| TrailGlow {
                angle: sample.angle,
                age_fraction: (age.as_secs_f32() / max_age_secs).clamp(0.0, 1.0),
                simulated: sample.simulated,
            })
            .collect();

        let detection = if self.detection_renderable(now) {
            self.state.detection.map(|d| DetectionView {
                angle: d.angle,
                distance: d.distance,
                age: d.age(now),
            })
        } else {
            None
        };

        let frozen = self.state.display_frozen();
        RenderState {
            mode: self.state.mode,
            angle: if frozen {
                self.state.frozen_angle
            } else {
                self.state.current_angle
            },
            distance: self.state.current_distance,
            has_live_data: self.state.has_live_data,
            display_frozen: frozen,
            proximity_alert: self.state.proximity_alert,
            simulated: self.state.simulated,
            trail,
            detection,
            pulse: self.pulse.size,
            pulse_max: self.config.pulse_max,
            min_angle: self.config.min_angle,
            max_angle: self.config.max_angle,
        }
    }
}
