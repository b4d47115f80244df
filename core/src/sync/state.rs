use crate::protocol::Mode;
use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Direction of servo travel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SweepDirection {
    Increasing,
    Decreasing,
}

impl SweepDirection {
    pub fn from_wire(value: i8) -> Option<Self> {
        match value.signum() {
            1 => Some(SweepDirection::Increasing),
            -1 => Some(SweepDirection::Decreasing),
            _ => None,
        }
    }

    pub fn sign(self) -> f32 {
        match self {
            SweepDirection::Increasing => 1.0,
            SweepDirection::Decreasing => -1.0,
        }
    }
}

/// Why the display is frozen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FreezeCause {
    /// Imposed by a mode transition; released only by a qualifying sample.
    ModeTransition,
    /// Imposed by the operator; released only by the operator.
    Operator,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DetectionEvent {
    pub angle: f32,
    pub distance: f32,
    pub observed_at: Instant,
}

impl DetectionEvent {
    pub fn age(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.observed_at)
    }

    pub fn is_visible(&self, now: Instant, window: Duration) -> bool {
        self.age(now) < window
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrailSample {
    pub angle: f32,
    pub observed_at: Instant,
    /// Produced by the degraded-link fallback rather than the controller.
    pub simulated: bool,
}

/// Bounded afterglow history, most recent first.
#[derive(Debug, Clone)]
pub struct Trail {
    samples: VecDeque<TrailSample>,
    capacity: usize,
}

impl Trail {
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: VecDeque::with_capacity(capacity + 1),
            capacity,
        }
    }

    pub fn push(&mut self, sample: TrailSample) {
        self.samples.push_front(sample);
        while self.samples.len() > self.capacity {
            self.samples.pop_back();
        }
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn iter(&self) -> impl Iterator<Item = &TrailSample> {
        self.samples.iter()
    }

    /// Samples younger than `max_age`, paired with their age.
    pub fn recent(
        &self,
        now: Instant,
        max_age: Duration,
    ) -> impl Iterator<Item = (&TrailSample, Duration)> {
        self.samples.iter().filter_map(move |sample| {
            let age = now.saturating_duration_since(sample.observed_at);
            (age < max_age).then_some((sample, age))
        })
    }
}

/// Authoritative snapshot owned by the state synchronizer.
#[derive(Debug, Clone)]
pub struct SweepState {
    pub mode: Mode,
    pub current_angle: f32,
    pub sweep_direction: SweepDirection,
    pub current_distance: f32,
    pub has_live_data: bool,
    pub freeze: Option<FreezeCause>,
    /// Angle shown while frozen; captured when the freeze begins.
    pub frozen_angle: f32,
    pub last_event_at: Option<Instant>,
    pub detection: Option<DetectionEvent>,
    pub trail: Trail,
    pub proximity_alert: bool,
    pub servo_moving: bool,
    /// `current_angle` currently comes from local extrapolation.
    pub simulated: bool,
}

impl SweepState {
    pub fn new(initial_angle: f32, trail_capacity: usize) -> Self {
        Self {
            mode: Mode::Scanning,
            current_angle: initial_angle,
            sweep_direction: SweepDirection::Increasing,
            current_distance: 0.0,
            has_live_data: false,
            freeze: None,
            frozen_angle: initial_angle,
            last_event_at: None,
            detection: None,
            trail: Trail::with_capacity(trail_capacity),
            proximity_alert: false,
            servo_moving: false,
            simulated: false,
        }
    }

    pub fn display_frozen(&self) -> bool {
        self.freeze.is_some()
    }

    pub fn hard_frozen(&self) -> bool {
        self.freeze == Some(FreezeCause::ModeTransition)
    }
}
