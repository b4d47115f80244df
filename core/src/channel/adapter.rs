//! WebSocket link to the controller.
//!
//! The adapter owns the socket, parses inbound frames and runs the retry
//! schedule. Everything it learns reaches the caller as a [`ChannelNotice`];
//! transport failures never surface as errors.

use crate::channel::codec::{decode_frame, encode_command};
use crate::channel::reconnect::{ReconnectPolicy, ReconnectState, RetryDecision};
use crate::prelude::{SweepError, SweepResult};
use crate::protocol::{Command, InboundEvent};
use crate::telemetry::{LogManager, MetricsRecorder};
use futures_util::{SinkExt, StreamExt};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;

/// Everything the channel reports back to its owner.
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelNotice {
    Connected,
    Disconnected { reason: String },
    Reconnecting { attempt: u32, max: u32, delay: Duration },
    GaveUp,
    Event(InboundEvent),
    Rejected { reason: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Control {
    Reconnect,
    Visibility(bool),
}

enum SessionEnd {
    /// Controller closed with a normal close code.
    Clean,
    Unclean(String),
    ManualReconnect,
    Shutdown,
}

/// Cloneable front for the running channel task.
#[derive(Clone)]
pub struct ChannelHandle {
    outbound: mpsc::UnboundedSender<Command>,
    control: mpsc::UnboundedSender<Control>,
    connected: Arc<AtomicBool>,
    shutdown: CancellationToken,
}

impl ChannelHandle {
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    /// Sends immediately or fails; commands are never held for later.
    pub fn send(&self, command: Command) -> SweepResult<()> {
        if !self.is_connected() {
            return Err(SweepError::NotConnected);
        }
        self.outbound.send(command).map_err(|_| SweepError::Closed)
    }

    pub fn set_visible(&self, visible: bool) {
        let _ = self.control.send(Control::Visibility(visible));
    }

    pub fn reconnect(&self) {
        let _ = self.control.send(Control::Reconnect);
    }

    /// Cancels the task, its socket and any pending backoff timer.
    pub fn close(&self) {
        self.shutdown.cancel();
    }
}

pub struct ChannelAdapter {
    url: String,
    policy: ReconnectPolicy,
    metrics: Arc<MetricsRecorder>,
}

impl ChannelAdapter {
    pub fn new(url: impl Into<String>, policy: ReconnectPolicy) -> Self {
        Self::with_metrics(url, policy, Arc::new(MetricsRecorder::new()))
    }

    pub fn with_metrics(
        url: impl Into<String>,
        policy: ReconnectPolicy,
        metrics: Arc<MetricsRecorder>,
    ) -> Self {
        Self {
            url: url.into(),
            policy,
            metrics,
        }
    }

    /// Splits into the caller-side handle, the notice stream and the task
    /// that must be driven on a tokio runtime.
    pub fn split(
        self,
    ) -> (
        ChannelHandle,
        mpsc::UnboundedReceiver<ChannelNotice>,
        ChannelTask,
    ) {
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let (control_tx, control_rx) = mpsc::unbounded_channel();
        let (notice_tx, notice_rx) = mpsc::unbounded_channel();
        let connected = Arc::new(AtomicBool::new(false));
        let shutdown = CancellationToken::new();

        let handle = ChannelHandle {
            outbound: outbound_tx,
            control: control_tx,
            connected: connected.clone(),
            shutdown: shutdown.clone(),
        };
        let task = ChannelTask {
            url: self.url,
            retry: ReconnectState::new(self.policy),
            outbound: outbound_rx,
            control: control_rx,
            notices: notice_tx,
            connected,
            shutdown,
            metrics: self.metrics,
            logger: LogManager::new("channel"),
        };
        (handle, notice_rx, task)
    }
}

pub struct ChannelTask {
    url: String,
    retry: ReconnectState,
    outbound: mpsc::UnboundedReceiver<Command>,
    control: mpsc::UnboundedReceiver<Control>,
    notices: mpsc::UnboundedSender<ChannelNotice>,
    connected: Arc<AtomicBool>,
    shutdown: CancellationToken,
    metrics: Arc<MetricsRecorder>,
    logger: LogManager,
}

impl ChannelTask {
    pub async fn run(mut self) {
        loop {
            self.drain_control();
            if self.stopped() {
                break;
            }
            if !self.retry.visible() && !self.wait_for_resume().await {
                break;
            }

            let end = self.connect_once().await;
            self.connected.store(false, Ordering::SeqCst);
            self.discard_outbound();

            match end {
                SessionEnd::Shutdown => break,
                SessionEnd::ManualReconnect => {
                    self.retry.reset();
                    continue;
                }
                SessionEnd::Clean => {
                    self.logger.record("controller closed the connection");
                    self.notify(ChannelNotice::Disconnected {
                        reason: "closed by controller".into(),
                    });
                    if !self.wait_for_resume().await {
                        break;
                    }
                }
                SessionEnd::Unclean(reason) => {
                    self.logger.warn(&format!("connection lost: {}", reason));
                    self.notify(ChannelNotice::Disconnected { reason });
                    if !self.back_off().await {
                        break;
                    }
                }
            }
        }
        self.connected.store(false, Ordering::SeqCst);
        self.logger.record("channel task finished");
    }

    fn stopped(&self) -> bool {
        self.shutdown.is_cancelled() || self.notices.is_closed()
    }

    fn notify(&self, notice: ChannelNotice) {
        let _ = self.notices.send(notice);
    }

    fn drain_control(&mut self) {
        while let Ok(control) = self.control.try_recv() {
            match control {
                Control::Visibility(visible) => {
                    self.retry.set_visible(visible);
                }
                Control::Reconnect => self.retry.reset(),
            }
        }
    }

    fn discard_outbound(&mut self) {
        let mut dropped = 0usize;
        while self.outbound.try_recv().is_ok() {
            dropped += 1;
        }
        if dropped > 0 {
            self.logger
                .warn(&format!("dropped {} command(s) after disconnect", dropped));
        }
    }

    /// Waits for a manual reconnect or visibility restore. False on shutdown.
    async fn wait_for_resume(&mut self) -> bool {
        loop {
            tokio::select! {
                _ = self.shutdown.cancelled() => return false,
                control = self.control.recv() => match control {
                    Some(Control::Reconnect) => {
                        self.retry.reset();
                        self.retry.set_visible(true);
                        return true;
                    }
                    Some(Control::Visibility(visible)) => {
                        if self.retry.set_visible(visible) {
                            return true;
                        }
                    }
                    None => return false,
                },
            }
        }
    }

    /// Applies the retry schedule after an unclean close. False on shutdown.
    async fn back_off(&mut self) -> bool {
        match self.retry.on_unclean_close() {
            RetryDecision::Retry { attempt, delay } => {
                self.metrics.record_reconnect();
                self.notify(ChannelNotice::Reconnecting {
                    attempt,
                    max: self.retry.policy().max_retries,
                    delay,
                });
                let timer = tokio::time::sleep(delay);
                tokio::pin!(timer);
                loop {
                    tokio::select! {
                        _ = self.shutdown.cancelled() => return false,
                        _ = &mut timer => return true,
                        control = self.control.recv() => match control {
                            Some(Control::Reconnect) => {
                                self.retry.reset();
                                return true;
                            }
                            Some(Control::Visibility(visible)) => {
                                if self.retry.set_visible(visible) {
                                    return true;
                                }
                            }
                            None => return false,
                        },
                    }
                }
            }
            RetryDecision::Exhausted => {
                self.logger.warn("retry budget exhausted");
                self.notify(ChannelNotice::GaveUp);
                self.wait_for_resume().await
            }
        }
    }

    async fn connect_once(&mut self) -> SessionEnd {
        let attempt = tokio::select! {
            _ = self.shutdown.cancelled() => return SessionEnd::Shutdown,
            attempt = connect_async(self.url.as_str()) => attempt,
        };
        let (socket, _) = match attempt {
            Ok(pair) => pair,
            Err(err) => return SessionEnd::Unclean(err.to_string()),
        };
        let (mut sink, mut stream) = socket.split();

        self.retry.on_connected();
        self.connected.store(true, Ordering::SeqCst);
        self.logger.record(&format!("connected to {}", self.url));
        self.notify(ChannelNotice::Connected);

        if let Ok(text) = encode_command(&Command::GetState) {
            if let Err(err) = sink.send(Message::Text(text)).await {
                return SessionEnd::Unclean(err.to_string());
            }
        }

        loop {
            tokio::select! {
                _ = self.shutdown.cancelled() => {
                    let _ = sink
                        .send(Message::Close(Some(CloseFrame {
                            code: CloseCode::Normal,
                            reason: "client teardown".into(),
                        })))
                        .await;
                    return SessionEnd::Shutdown;
                }
                command = self.outbound.recv() => {
                    let Some(command) = command else {
                        return SessionEnd::Shutdown;
                    };
                    match encode_command(&command) {
                        Ok(text) => {
                            if let Err(err) = sink.send(Message::Text(text)).await {
                                return SessionEnd::Unclean(err.to_string());
                            }
                        }
                        Err(err) => self.logger.warn(&format!("unencodable command: {}", err)),
                    }
                }
                control = self.control.recv() => match control {
                    Some(Control::Reconnect) => {
                        let _ = sink.send(Message::Close(None)).await;
                        return SessionEnd::ManualReconnect;
                    }
                    Some(Control::Visibility(visible)) => {
                        self.retry.set_visible(visible);
                    }
                    None => return SessionEnd::Shutdown,
                },
                frame = stream.next() => match frame {
                    Some(Ok(Message::Text(text))) => self.handle_text(&text),
                    Some(Ok(Message::Binary(_))) => {
                        self.reject("binary frame".into());
                    }
                    Some(Ok(Message::Close(frame))) => {
                        return match frame {
                            Some(frame) if frame.code == CloseCode::Normal => SessionEnd::Clean,
                            Some(frame) => SessionEnd::Unclean(format!(
                                "closed with code {}",
                                u16::from(frame.code)
                            )),
                            None => SessionEnd::Unclean("closed without status".into()),
                        };
                    }
                    Some(Ok(_)) => {}
                    Some(Err(err)) => return SessionEnd::Unclean(err.to_string()),
                    None => return SessionEnd::Unclean("stream ended".into()),
                },
            }
        }
    }

    fn handle_text(&self, text: &str) {
        match decode_frame(text) {
            Ok(event) => {
                self.logger
                    .trace_frame(&format!("inbound {}", event.kind()));
                self.notify(ChannelNotice::Event(event));
            }
            Err(err) => self.reject(err.to_string()),
        }
    }

    fn reject(&self, reason: String) {
        self.metrics.record_rejected();
        self.logger.warn(&format!("dropping frame: {}", reason));
        self.notify(ChannelNotice::Rejected { reason });
    }
}
