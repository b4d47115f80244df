pub mod inbound;
pub mod outbound;

pub use inbound::{
    CameraFrame, DetectionFrame, InboundEvent, InitFrame, ModeChangeFrame, RadarSample,
    ShootResponse, SystemMessage, TrackingPoint,
};
pub use outbound::{Command, TrackingType};

use serde::{Deserialize, Serialize};
use std::fmt;

/// Operating mode of the controller.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Mode {
    #[serde(rename = "RADAR", alias = "SCANNING")]
    Scanning,
    #[serde(rename = "TRACKING")]
    Tracking,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Scanning => write!(f, "SCANNING"),
            Mode::Tracking => write!(f, "TRACKING"),
        }
    }
}
