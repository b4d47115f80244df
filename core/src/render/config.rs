use crate::math::{Point, PolarProjector};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub max_range_cm: f32,
    pub range_rings: usize,
    pub reference_angles: Vec<f32>,
    pub highlight_within_deg: f32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            max_range_cm: 100.0,
            range_rings: 4,
            reference_angles: vec![30.0, 60.0, 90.0, 120.0, 150.0],
            highlight_within_deg: 5.0,
        }
    }
}

/// Half-disc placement derived from the container size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
    pub center: Point,
    pub radius: f32,
}

impl Viewport {
    pub fn from_container(width: f32, height: f32) -> Self {
        let width = width.max(1.0);
        let height = height.max(1.0);
        let center = Point::new(width / 2.0, height * 0.9);
        let radius = (width * 0.45).min(height * 0.8);
        Self {
            width,
            height,
            center,
            radius,
        }
    }

    pub fn projector(&self, max_range: f32) -> PolarProjector {
        PolarProjector {
            center: self.center,
            radius: self.radius,
            max_range,
        }
    }
}
