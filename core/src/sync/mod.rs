pub mod config;
pub mod state;
pub mod synchronizer;

pub use config::SyncConfig;
pub use state::{
    DetectionEvent, FreezeCause, SweepDirection, SweepState, Trail, TrailSample,
};
pub use synchronizer::{
    ApplyOutcome, DetectionView, PulseState, RenderState, StateSynchronizer, TrailGlow,
};
