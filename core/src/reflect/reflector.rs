//! Mirrors session state into the text a front end shows around the sweep.

use crate::channel::ChannelNotice;
use crate::dispatch::DispatchOutcome;
use crate::prelude::SweepResult;
use crate::protocol::{CameraFrame, InboundEvent, Mode, SystemMessage, TrackingPoint};
use crate::sync::{ApplyOutcome, SweepState};
use crate::telemetry::LogManager;
use std::fmt;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusLevel {
    Info,
    Success,
    Warning,
    Error,
}

impl StatusLevel {
    fn from_wire(level: Option<&str>) -> Self {
        match level.map(str::to_ascii_lowercase).as_deref() {
            Some("success") => StatusLevel::Success,
            Some("warning") | Some("warn") => StatusLevel::Warning,
            Some("error") => StatusLevel::Error,
            _ => StatusLevel::Info,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusLine {
    pub message: String,
    pub level: StatusLevel,
}

impl StatusLine {
    fn new(message: impl Into<String>, level: StatusLevel) -> Self {
        Self {
            message: message.into(),
            level,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ConnectionStatus {
    Connecting,
    Connected,
    Reconnecting { attempt: u32, max: u32, delay: Duration },
    Offline,
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionStatus::Connecting => write!(f, "Connecting"),
            ConnectionStatus::Connected => write!(f, "Connected"),
            ConnectionStatus::Reconnecting { attempt, max, .. } => {
                write!(f, "Reconnecting ({}/{})", attempt, max)
            }
            ConnectionStatus::Offline => write!(f, "Disconnected"),
        }
    }
}

/// Everything around the sweep canvas, ready to print or lay out.
#[derive(Debug, Clone, PartialEq)]
pub struct UiSummary {
    pub mode_label: &'static str,
    pub connection: ConnectionStatus,
    pub status: Option<StatusLine>,
    pub servo_moving: bool,
    pub display_frozen: bool,
    pub has_live_data: bool,
    pub tracking_point: Option<TrackingPoint>,
    pub missing_libraries: Vec<String>,
    pub debug: String,
}

pub struct UiReflector {
    connection: ConnectionStatus,
    status: Option<StatusLine>,
    camera: Option<CameraFrame>,
    missing_libraries: Vec<String>,
    logger: LogManager,
}

impl Default for UiReflector {
    fn default() -> Self {
        Self::new()
    }
}

impl UiReflector {
    pub fn new() -> Self {
        Self {
            connection: ConnectionStatus::Connecting,
            status: None,
            camera: None,
            missing_libraries: Vec::new(),
            logger: LogManager::new("ui"),
        }
    }

    pub fn status(&self) -> Option<&StatusLine> {
        self.status.as_ref()
    }

    pub fn connection(&self) -> &ConnectionStatus {
        &self.connection
    }

    /// Latest camera still, kept for display beside the sweep.
    pub fn camera(&self) -> Option<&CameraFrame> {
        self.camera.as_ref()
    }

    pub fn missing_libraries(&self) -> &[String] {
        &self.missing_libraries
    }

    fn set_status(&mut self, message: impl Into<String>, level: StatusLevel) {
        let line = StatusLine::new(message, level);
        self.logger.trace_frame(&format!("status: {}", line.message));
        self.status = Some(line);
    }

    /// Connection-level notices. `Event` notices go through [`Self::on_event`]
    /// once the synchronizer has applied them.
    pub fn on_notice(&mut self, notice: &ChannelNotice) {
        match notice {
            ChannelNotice::Connected => {
                self.connection = ConnectionStatus::Connected;
                self.set_status("Connected to radar system", StatusLevel::Success);
            }
            ChannelNotice::Disconnected { reason } => {
                self.connection = ConnectionStatus::Offline;
                self.set_status(
                    format!("Disconnected from radar system ({})", reason),
                    StatusLevel::Warning,
                );
            }
            ChannelNotice::Reconnecting {
                attempt,
                max,
                delay,
            } => {
                self.connection = ConnectionStatus::Reconnecting {
                    attempt: *attempt,
                    max: *max,
                    delay: *delay,
                };
                self.set_status(
                    format!(
                        "Connection lost. Reconnecting in {:.0}s... ({}/{})",
                        delay.as_secs_f32(),
                        attempt,
                        max
                    ),
                    StatusLevel::Warning,
                );
            }
            ChannelNotice::GaveUp => {
                self.connection = ConnectionStatus::Offline;
                self.set_status(
                    "Connection lost. Please reconnect manually.",
                    StatusLevel::Error,
                );
            }
            ChannelNotice::Rejected { reason } => {
                self.set_status(format!("Ignored frame: {}", reason), StatusLevel::Warning);
            }
            ChannelNotice::Event(_) => {}
        }
    }

    pub fn on_event(&mut self, event: &InboundEvent, outcome: &ApplyOutcome) {
        match (event, outcome) {
            (InboundEvent::Init(frame), _) => {
                self.missing_libraries = frame.missing_libraries.clone();
                if !self.missing_libraries.is_empty() {
                    self.set_status(
                        format!("Missing libraries: {}", self.missing_libraries.join(", ")),
                        StatusLevel::Warning,
                    );
                } else if !frame.message.is_empty() {
                    self.set_status(frame.message.clone(), StatusLevel::Info);
                }
            }
            (InboundEvent::ModeChange(frame), ApplyOutcome::ModeSwitched { to, .. }) => {
                let message = if frame.message.is_empty() {
                    format!("Switched to {} mode", to)
                } else {
                    frame.message.clone()
                };
                self.set_status(message, StatusLevel::Info);
            }
            (InboundEvent::ModeChange(frame), _) if !frame.message.is_empty() => {
                self.set_status(frame.message.clone(), StatusLevel::Info);
            }
            (InboundEvent::Radar(_), ApplyOutcome::Released) => {
                self.set_status("Live radar data received", StatusLevel::Info);
            }
            (InboundEvent::Detection(_), ApplyOutcome::TrackLost) => {
                self.set_status("Tracking lost", StatusLevel::Warning);
            }
            (
                InboundEvent::Detection(_),
                ApplyOutcome::DetectionRecorded {
                    angle, distance, ..
                },
            ) => {
                self.set_status(
                    format!("Object detected at {:.0}° ({:.0} cm)", angle, distance),
                    StatusLevel::Info,
                );
            }
            (InboundEvent::Camera(frame), _) => {
                self.camera = Some(frame.clone());
            }
            (InboundEvent::SystemMessage(SystemMessage { message, level }), _) => {
                self.set_status(message.clone(), StatusLevel::from_wire(level.as_deref()));
            }
            (InboundEvent::ShootResponse(response), _) => {
                let level = if response.success {
                    StatusLevel::Success
                } else {
                    StatusLevel::Error
                };
                let message = if response.message.is_empty() {
                    if response.success {
                        "Shot fired".to_string()
                    } else {
                        "Shot failed".to_string()
                    }
                } else {
                    response.message.clone()
                };
                self.set_status(message, level);
            }
            _ => {}
        }
    }

    /// Reports a dispatch failure; successful and no-op intents stay silent.
    pub fn on_command(&mut self, intent: &str, result: &SweepResult<DispatchOutcome>) {
        if let Err(err) = result {
            self.logger.warn(&format!("{} failed: {}", intent, err));
            self.set_status(
                format!("Cannot {}: {}", intent, err),
                StatusLevel::Error,
            );
        }
    }

    pub fn summary(&self, state: &SweepState, fps: f32, now: Instant) -> UiSummary {
        UiSummary {
            mode_label: mode_label(state.mode),
            connection: self.connection.clone(),
            status: self.status.clone(),
            servo_moving: state.servo_moving,
            display_frozen: state.display_frozen(),
            has_live_data: state.has_live_data,
            tracking_point: self
                .camera
                .as_ref()
                .and_then(|frame| frame.tracking),
            missing_libraries: self.missing_libraries.clone(),
            debug: debug_text(state, fps, now),
        }
    }
}

fn mode_label(mode: Mode) -> &'static str {
    match mode {
        Mode::Scanning => "Radar Mode",
        Mode::Tracking => "Tracking Mode",
    }
}

fn debug_text(state: &SweepState, fps: f32, now: Instant) -> String {
    let data = match state.last_event_at {
        Some(at) => format!(
            "last data {:.1}s ago",
            now.saturating_duration_since(at).as_secs_f32()
        ),
        None => "no data yet".to_string(),
    };
    format!("FPS: {:.0} | {} | {:.0}°", fps, data, state.current_angle)
}
