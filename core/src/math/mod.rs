pub mod geometry;
pub mod stats;

pub use geometry::{Point, PolarProjector};
pub use stats::StatsHelper;
