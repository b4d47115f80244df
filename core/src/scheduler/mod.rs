pub mod animation;
pub mod timing;

pub use animation::{AnimationScheduler, TickOutcome};
pub use timing::FrameTiming;
