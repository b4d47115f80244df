use crate::prelude::{SweepError, SweepResult};
use crate::protocol::{Command, InboundEvent};
use serde_json::Value;

const KNOWN_KINDS: &[&str] = &[
    "init",
    "radar",
    "radar_data",
    "object_detected",
    "detection",
    "mode_change",
    "state_update",
    "camera",
    "system_message",
    "error",
    "shoot_response",
];

/// Parses one inbound text frame. Never panics on hostile input.
pub fn decode_frame(text: &str) -> SweepResult<InboundEvent> {
    let value: Value =
        serde_json::from_str(text).map_err(|e| SweepError::Malformed(e.to_string()))?;
    let kind = value
        .get("type")
        .and_then(Value::as_str)
        .ok_or_else(|| SweepError::Malformed("missing `type` field".into()))?
        .to_string();
    if !KNOWN_KINDS.contains(&kind.as_str()) {
        return Err(SweepError::UnknownEvent(kind));
    }
    let event: InboundEvent = serde_json::from_value(value)
        .map_err(|e| SweepError::Malformed(format!("{}: {}", kind, e)))?;
    event
        .validate()
        .map_err(|reason| SweepError::Malformed(format!("{}: {}", kind, reason)))?;
    Ok(event)
}

pub fn encode_command(command: &Command) -> SweepResult<String> {
    serde_json::to_string(command).map_err(|e| SweepError::Malformed(e.to_string()))
}
