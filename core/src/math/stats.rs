pub struct StatsHelper;

impl StatsHelper {
    pub fn mean(samples: &[f32]) -> f32 {
        if samples.is_empty() {
            return 0.0;
        }
        samples.iter().sum::<f32>() / samples.len() as f32
    }

    /// Frames per second from a window of frame intervals in milliseconds.
    pub fn rate_hz(intervals_ms: &[f32]) -> f32 {
        let mean = Self::mean(intervals_ms);
        if mean <= f32::EPSILON {
            0.0
        } else {
            1000.0 / mean
        }
    }
}
