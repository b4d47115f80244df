use crate::math::StatsHelper;
use std::collections::VecDeque;
use std::time::Instant;

const WINDOW: usize = 60;

/// Rolling window of recent frame intervals.
#[derive(Debug, Clone, Default)]
pub struct FrameTiming {
    last_frame: Option<Instant>,
    intervals_ms: VecDeque<f32>,
}

impl FrameTiming {
    pub fn record(&mut self, now: Instant) {
        if let Some(previous) = self.last_frame {
            let interval = now.saturating_duration_since(previous).as_secs_f32() * 1000.0;
            self.intervals_ms.push_back(interval);
            if self.intervals_ms.len() > WINDOW {
                self.intervals_ms.pop_front();
            }
        }
        self.last_frame = Some(now);
    }

    pub fn fps(&self) -> f32 {
        let samples: Vec<f32> = self.intervals_ms.iter().copied().collect();
        StatsHelper::rate_hz(&samples)
    }

    pub fn reset(&mut self) {
        self.last_frame = None;
        self.intervals_ms.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn fps_reflects_interval_window() {
        let t0 = Instant::now();
        let mut timing = FrameTiming::default();
        for frame in 0..100u64 {
            timing.record(t0 + Duration::from_millis(frame * 25));
        }
        assert!((timing.fps() - 40.0).abs() < 0.5);
        assert_eq!(timing.intervals_ms.len(), WINDOW);
    }
}
