use crate::prelude::millis;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Tunables for the state synchronizer. Defaults match the servo firmware.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    pub min_angle: f32,
    pub max_angle: f32,
    pub max_distance_cm: f32,
    pub trail_capacity: usize,
    pub trail_max_age_ms: u64,
    pub detection_window_ms: u64,
    pub staleness_ms: u64,
    pub simulation_rate_deg_per_s: f32,
    pub proximity_distance_cm: f32,
    pub pulse_max: f32,
    pub pulse_step: f32,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            min_angle: 15.0,
            max_angle: 165.0,
            max_distance_cm: 400.0,
            trail_capacity: 20,
            trail_max_age_ms: 800,
            detection_window_ms: 3000,
            staleness_ms: 2000,
            simulation_rate_deg_per_s: 30.0,
            proximity_distance_cm: 40.0,
            pulse_max: 30.0,
            pulse_step: 0.5,
        }
    }
}

impl SyncConfig {
    pub fn trail_max_age(&self) -> Duration {
        millis(self.trail_max_age_ms)
    }

    pub fn detection_window(&self) -> Duration {
        millis(self.detection_window_ms)
    }

    pub fn staleness(&self) -> Duration {
        millis(self.staleness_ms)
    }

    pub fn normalized_capacity(&self) -> usize {
        self.trail_capacity.max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_yaml_style_overrides_keep_defaults() {
        let cfg: SyncConfig = serde_json::from_str(r#"{"trail_capacity": 8}"#).unwrap();
        assert_eq!(cfg.trail_capacity, 8);
        assert_eq!(cfg.max_angle, 165.0);
        assert_eq!(cfg.detection_window(), Duration::from_millis(3000));
    }
}
