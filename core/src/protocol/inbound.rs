use super::Mode;
use serde::{Deserialize, Serialize};

/// Typed inbound frame, tagged by the `type` field on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InboundEvent {
    Init(InitFrame),
    #[serde(alias = "radar_data")]
    Radar(RadarSample),
    #[serde(rename = "object_detected", alias = "detection")]
    Detection(DetectionFrame),
    #[serde(alias = "state_update")]
    ModeChange(ModeChangeFrame),
    Camera(CameraFrame),
    #[serde(alias = "error")]
    SystemMessage(SystemMessage),
    ShootResponse(ShootResponse),
}

impl InboundEvent {
    /// Wire name of the event kind, used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            InboundEvent::Init(_) => "init",
            InboundEvent::Radar(_) => "radar",
            InboundEvent::Detection(_) => "object_detected",
            InboundEvent::ModeChange(_) => "mode_change",
            InboundEvent::Camera(_) => "camera",
            InboundEvent::SystemMessage(_) => "system_message",
            InboundEvent::ShootResponse(_) => "shoot_response",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InitFrame {
    pub mode: Mode,
    pub angle: f32,
    pub distance: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub direction: Option<i8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub moving: Option<bool>,
    #[serde(default)]
    pub message: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub missing_libraries: Vec<String>,
}

/// One angle/distance reading from the servo-mounted ranging sensor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RadarSample {
    pub angle: f32,
    pub distance: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub direction: Option<i8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub moving: Option<bool>,
    /// Controller-side proximity flag.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detection: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionFrame {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub angle: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance: Option<f32>,
    /// `false` marks a lost track rather than a new detection.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detected: Option<bool>,
}

impl DetectionFrame {
    pub fn at(angle: f32, distance: f32) -> Self {
        Self {
            angle: Some(angle),
            distance: Some(distance),
            detected: None,
        }
    }

    pub fn lost() -> Self {
        Self {
            angle: None,
            distance: None,
            detected: Some(false),
        }
    }

    pub fn is_lost_track(&self) -> bool {
        self.detected == Some(false)
    }

    /// Coordinates of a positive detection; `None` for lost tracks and for
    /// frames missing either coordinate.
    pub fn position(&self) -> Option<(f32, f32)> {
        if self.is_lost_track() {
            return None;
        }
        self.angle.zip(self.distance)
    }
}

impl InboundEvent {
    /// Field rules serde cannot express: a detection needs both coordinates
    /// unless it reports a lost track.
    pub fn validate(&self) -> Result<(), String> {
        match self {
            InboundEvent::Detection(frame)
                if !frame.is_lost_track() && frame.position().is_none() =>
            {
                Err("detection without angle and distance".into())
            }
            _ => Ok(()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModeChangeFrame {
    pub mode: Mode,
    #[serde(default)]
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop_animation: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hard_freeze: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub waiting_for_data: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub angle: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detection: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub moving: Option<bool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrackingPoint {
    pub x: f32,
    pub y: f32,
}

/// Still image from the tracking camera, base64 encoded by the controller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CameraFrame {
    pub image: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tracking: Option<TrackingPoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemMessage {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShootResponse {
    pub success: bool,
    #[serde(default)]
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn radar_alias_parses_as_sample() {
        let event: InboundEvent =
            serde_json::from_str(r#"{"type":"radar_data","angle":42,"distance":17.5}"#).unwrap();
        match event {
            InboundEvent::Radar(sample) => {
                assert_eq!(sample.angle, 42.0);
                assert_eq!(sample.distance, 17.5);
                assert_eq!(sample.direction, None);
            }
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[test]
    fn state_update_accepts_radar_mode_name() {
        let event: InboundEvent = serde_json::from_str(
            r#"{"type":"state_update","mode":"RADAR","message":"back","hard_freeze":true}"#,
        )
        .unwrap();
        match event {
            InboundEvent::ModeChange(frame) => {
                assert_eq!(frame.mode, Mode::Scanning);
                assert_eq!(frame.hard_freeze, Some(true));
            }
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[test]
    fn lost_track_detection_is_not_positive() {
        let event: InboundEvent =
            serde_json::from_str(r#"{"type":"detection","detected":false}"#).unwrap();
        match event {
            InboundEvent::Detection(frame) => {
                assert!(frame.is_lost_track());
                assert_eq!(frame.position(), None);
                assert!(InboundEvent::Detection(frame).validate().is_ok());
            }
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[test]
    fn init_keeps_missing_libraries() {
        let event: InboundEvent = serde_json::from_str(
            r#"{"type":"init","mode":"SCANNING","angle":90,"distance":0,"message":"hi","missing_libraries":["cv2"]}"#,
        )
        .unwrap();
        assert_eq!(event.kind(), "init");
        if let InboundEvent::Init(frame) = event {
            assert_eq!(frame.missing_libraries, vec!["cv2".to_string()]);
            assert_eq!(frame.mode, Mode::Scanning);
        }
    }

    #[test]
    fn detection_without_coordinates_fails_validation() {
        for text in [
            r#"{"type":"object_detected"}"#,
            r#"{"type":"detection","detected":true}"#,
            r#"{"type":"detection","angle":40}"#,
        ] {
            let event: InboundEvent = serde_json::from_str(text).unwrap();
            assert!(event.validate().is_err(), "{} should not validate", text);
        }
        let event: InboundEvent =
            serde_json::from_str(r#"{"type":"object_detected","angle":40,"distance":22}"#)
                .unwrap();
        assert!(event.validate().is_ok());
    }
}
