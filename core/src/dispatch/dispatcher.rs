use crate::channel::ChannelHandle;
use crate::prelude::{SweepError, SweepResult};
use crate::protocol::{Command, Mode, TrackingType};
use crate::telemetry::LogManager;

/// Anything that can carry an outbound command right now.
pub trait CommandSink {
    fn is_connected(&self) -> bool;
    fn deliver(&self, command: Command) -> SweepResult<()>;
}

impl CommandSink for ChannelHandle {
    fn is_connected(&self) -> bool {
        ChannelHandle::is_connected(self)
    }

    fn deliver(&self, command: Command) -> SweepResult<()> {
        self.send(command)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DispatchOutcome {
    Sent(Command),
    /// The requested value is already current; nothing went out.
    Unchanged,
}

/// Turns operator intents into outbound commands.
///
/// Mode and tracking type requests that match the current value are dropped.
/// Nothing is queued: a disconnected sink fails the intent immediately.
pub struct CommandDispatcher<S: CommandSink> {
    sink: S,
    tracking: TrackingType,
    logger: LogManager,
}

impl<S: CommandSink> CommandDispatcher<S> {
    pub fn new(sink: S) -> Self {
        Self {
            sink,
            tracking: TrackingType::default(),
            logger: LogManager::new("dispatch"),
        }
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn tracking_type(&self) -> TrackingType {
        self.tracking
    }

    pub fn switch_mode(&mut self, current: Mode, requested: Mode) -> SweepResult<DispatchOutcome> {
        if current == requested {
            self.logger
                .trace_frame(&format!("already in {}, ignoring switch", requested));
            return Ok(DispatchOutcome::Unchanged);
        }
        self.send(Command::SwitchMode { mode: requested })
    }

    pub fn set_tracking_type(&mut self, kind: TrackingType) -> SweepResult<DispatchOutcome> {
        if kind == self.tracking {
            return Ok(DispatchOutcome::Unchanged);
        }
        let outcome = self.send(Command::TrackingType { kind })?;
        self.tracking = kind;
        Ok(outcome)
    }

    /// Fires the controller's action (shoot).
    pub fn trigger_action(&mut self) -> SweepResult<DispatchOutcome> {
        self.send(Command::Shoot)
    }

    pub fn request_state(&mut self) -> SweepResult<DispatchOutcome> {
        self.send(Command::GetState)
    }

    pub fn request_radar_status(&mut self) -> SweepResult<DispatchOutcome> {
        self.send(Command::GetRadarStatus)
    }

    fn send(&mut self, command: Command) -> SweepResult<DispatchOutcome> {
        if !self.sink.is_connected() {
            self.logger.warn("command dropped, channel not connected");
            return Err(SweepError::NotConnected);
        }
        self.sink.deliver(command.clone())?;
        self.logger.record(&format!("sent {:?}", command));
        Ok(DispatchOutcome::Sent(command))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::{Cell, RefCell};

    #[derive(Default)]
    struct RecordingSink {
        connected: Cell<bool>,
        sent: RefCell<Vec<Command>>,
    }

    impl CommandSink for &RecordingSink {
        fn is_connected(&self) -> bool {
            self.connected.get()
        }

        fn deliver(&self, command: Command) -> SweepResult<()> {
            self.sent.borrow_mut().push(command);
            Ok(())
        }
    }

    fn connected_sink() -> RecordingSink {
        let sink = RecordingSink::default();
        sink.connected.set(true);
        sink
    }

    #[test]
    fn switching_to_current_mode_sends_nothing() {
        let sink = connected_sink();
        let mut dispatcher = CommandDispatcher::new(&sink);
        assert_eq!(
            dispatcher.switch_mode(Mode::Scanning, Mode::Scanning).unwrap(),
            DispatchOutcome::Unchanged
        );
        assert!(sink.sent.borrow().is_empty());

        dispatcher.switch_mode(Mode::Scanning, Mode::Tracking).unwrap();
        assert_eq!(
            sink.sent.borrow().as_slice(),
            &[Command::SwitchMode {
                mode: Mode::Tracking
            }]
        );
    }

    #[test]
    fn tracking_type_is_remembered_after_send() {
        let sink = connected_sink();
        let mut dispatcher = CommandDispatcher::new(&sink);
        assert_eq!(
            dispatcher.set_tracking_type(TrackingType::Face).unwrap(),
            DispatchOutcome::Unchanged
        );
        dispatcher.set_tracking_type(TrackingType::Hand).unwrap();
        assert_eq!(dispatcher.tracking_type(), TrackingType::Hand);
        assert_eq!(
            dispatcher.set_tracking_type(TrackingType::Hand).unwrap(),
            DispatchOutcome::Unchanged
        );
        assert_eq!(sink.sent.borrow().len(), 1);
    }

    #[test]
    fn disconnected_sink_fails_without_queueing() {
        let sink = RecordingSink::default();
        let mut dispatcher = CommandDispatcher::new(&sink);
        assert!(matches!(
            dispatcher.trigger_action(),
            Err(SweepError::NotConnected)
        ));
        assert!(matches!(
            dispatcher.set_tracking_type(TrackingType::Hand),
            Err(SweepError::NotConnected)
        ));
        assert_eq!(dispatcher.tracking_type(), TrackingType::Face);

        sink.connected.set(true);
        dispatcher.request_state().unwrap();
        dispatcher.request_radar_status().unwrap();
        assert_eq!(
            sink.sent.borrow().as_slice(),
            &[Command::GetState, Command::GetRadarStatus]
        );
    }
}
