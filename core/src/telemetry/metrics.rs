use std::sync::Mutex;

pub struct MetricsRecorder {
    inner: Mutex<MetricsSnapshot>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub applied: usize,
    pub rejected: usize,
    pub clamped: usize,
    pub simulated_frames: usize,
    pub rendered_frames: usize,
    pub frozen_frames: usize,
    pub reconnect_attempts: usize,
}

impl MetricsRecorder {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(MetricsSnapshot::default()),
        }
    }

    fn bump(&self, field: impl FnOnce(&mut MetricsSnapshot)) {
        if let Ok(mut metrics) = self.inner.lock() {
            field(&mut metrics);
        }
    }

    pub fn record_applied(&self) {
        self.bump(|m| m.applied += 1);
    }

    pub fn record_rejected(&self) {
        self.bump(|m| m.rejected += 1);
    }

    pub fn record_clamped(&self) {
        self.bump(|m| m.clamped += 1);
    }

    pub fn record_simulated(&self) {
        self.bump(|m| m.simulated_frames += 1);
    }

    pub fn record_rendered(&self) {
        self.bump(|m| m.rendered_frames += 1);
    }

    pub fn record_frozen(&self) {
        self.bump(|m| m.frozen_frames += 1);
    }

    pub fn record_reconnect(&self) {
        self.bump(|m| m.reconnect_attempts += 1);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        if let Ok(metrics) = self.inner.lock() {
            *metrics
        } else {
            MetricsSnapshot::default()
        }
    }
}

impl Default for MetricsRecorder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_accumulate_independently() {
        let metrics = MetricsRecorder::new();
        metrics.record_applied();
        metrics.record_applied();
        metrics.record_rejected();
        metrics.record_frozen();
        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.applied, 2);
        assert_eq!(snapshot.rejected, 1);
        assert_eq!(snapshot.frozen_frames, 1);
        assert_eq!(snapshot.rendered_frames, 0);
    }
}
