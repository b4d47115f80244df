use super::Mode;
use serde::{Deserialize, Serialize};

/// Camera tracking target selected on the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrackingType {
    #[default]
    Face,
    Hand,
}

impl TrackingType {
    pub fn code(self) -> u8 {
        match self {
            TrackingType::Face => 1,
            TrackingType::Hand => 2,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            TrackingType::Face => "Face Tracking",
            TrackingType::Hand => "Hand Tracking",
        }
    }
}

impl Serialize for TrackingType {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.code())
    }
}

impl<'de> Deserialize<'de> for TrackingType {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match u8::deserialize(deserializer)? {
            1 => Ok(TrackingType::Face),
            2 => Ok(TrackingType::Hand),
            other => Err(serde::de::Error::custom(format!(
                "unknown tracking type {}",
                other
            ))),
        }
    }
}

/// Outbound command, tagged by the `command` field on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum Command {
    SwitchMode {
        mode: Mode,
    },
    TrackingType {
        #[serde(rename = "type")]
        kind: TrackingType,
    },
    Shoot,
    GetState,
    GetRadarStatus,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn commands_match_controller_wire_shape() {
        let switch = serde_json::to_value(Command::SwitchMode {
            mode: Mode::Tracking,
        })
        .unwrap();
        assert_eq!(switch, json!({"command": "switch_mode", "mode": "TRACKING"}));

        let tracking = serde_json::to_value(Command::TrackingType {
            kind: TrackingType::Hand,
        })
        .unwrap();
        assert_eq!(tracking, json!({"command": "tracking_type", "type": 2}));

        assert_eq!(
            serde_json::to_value(Command::Shoot).unwrap(),
            json!({"command": "shoot"})
        );
        assert_eq!(
            serde_json::to_value(Command::GetRadarStatus).unwrap(),
            json!({"command": "get_radar_status"})
        );
    }

    #[test]
    fn tracking_type_rejects_unknown_code() {
        let parsed: Result<Command, _> =
            serde_json::from_str(r#"{"command":"tracking_type","type":7}"#);
        assert!(parsed.is_err());
    }
}
