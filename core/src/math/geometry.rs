use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Clamps a servo angle into the mechanical range.
pub fn clamp_angle(angle: f32, min: f32, max: f32) -> f32 {
    if angle.is_nan() {
        return min;
    }
    angle.clamp(min, max)
}

/// Maps sweep angles (0 deg = right, 90 deg = straight up) and ranges onto a
/// half-disc anchored at `center`.
#[derive(Debug, Clone, Copy)]
pub struct PolarProjector {
    pub center: Point,
    pub radius: f32,
    pub max_range: f32,
}

impl PolarProjector {
    pub fn edge(&self, angle_deg: f32) -> Point {
        self.at(angle_deg, self.radius)
    }

    pub fn range_point(&self, angle_deg: f32, range: f32) -> Point {
        let scaled = if self.max_range > 0.0 {
            (range / self.max_range).clamp(0.0, 1.0) * self.radius
        } else {
            0.0
        };
        self.at(angle_deg, scaled)
    }

    pub fn at(&self, angle_deg: f32, length: f32) -> Point {
        let rad = angle_deg.to_radians();
        Point::new(
            self.center.x + length * rad.cos(),
            self.center.y - length * rad.sin(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn projector() -> PolarProjector {
        PolarProjector {
            center: Point::new(100.0, 100.0),
            radius: 50.0,
            max_range: 100.0,
        }
    }

    #[test]
    fn ninety_degrees_points_straight_up() {
        let edge = projector().edge(90.0);
        assert!((edge.x - 100.0).abs() < 1e-3);
        assert!((edge.y - 50.0).abs() < 1e-3);
    }

    #[test]
    fn range_beyond_max_stops_at_edge() {
        let p = projector().range_point(0.0, 400.0);
        assert!((p.x - 150.0).abs() < 1e-3);
    }

    #[test]
    fn clamp_handles_nan_and_bounds() {
        assert_eq!(clamp_angle(200.0, 15.0, 165.0), 165.0);
        assert_eq!(clamp_angle(-4.0, 15.0, 165.0), 15.0);
        assert_eq!(clamp_angle(f32::NAN, 15.0, 165.0), 15.0);
    }
}
