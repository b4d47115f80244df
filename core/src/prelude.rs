use std::time::Duration;

/// Common error type for the sweep client core.
#[derive(thiserror::Error, Debug)]
pub enum SweepError {
    #[error("malformed frame: {0}")]
    Malformed(String),
    #[error("unknown event kind: {0}")]
    UnknownEvent(String),
    #[error("channel not connected")]
    NotConnected,
    #[error("transport failure: {0}")]
    Transport(String),
    #[error("channel closed")]
    Closed,
}

pub type SweepResult<T> = Result<T, SweepError>;

pub(crate) fn millis(value: u64) -> Duration {
    Duration::from_millis(value)
}
