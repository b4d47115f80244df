pub mod reflector;

pub use reflector::{ConnectionStatus, StatusLevel, StatusLine, UiReflector, UiSummary};
