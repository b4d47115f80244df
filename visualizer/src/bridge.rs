use std::thread;
use sweepcore::channel::{ChannelAdapter, ChannelHandle, ChannelNotice, ReconnectPolicy};
use tokio::runtime::Builder;
use tokio::sync::mpsc;

/// Runs the channel task on its own thread so the UI thread only ever
/// drains notices between frames.
pub struct ChannelBridge {
    pub handle: ChannelHandle,
    pub notices: mpsc::UnboundedReceiver<ChannelNotice>,
}

impl ChannelBridge {
    pub fn spawn(url: String, policy: ReconnectPolicy) -> Self {
        let (handle, notices, task) = ChannelAdapter::new(url, policy).split();
        thread::spawn(move || {
            let runtime = match Builder::new_current_thread().enable_all().build() {
                Ok(runtime) => runtime,
                Err(err) => {
                    log::error!("failed to build channel runtime: {}", err);
                    return;
                }
            };
            runtime.block_on(task.run());
        });
        Self { handle, notices }
    }

    /// Everything that arrived since the last call, oldest first.
    pub fn drain(&mut self) -> Vec<ChannelNotice> {
        let mut pending = Vec::new();
        while let Ok(notice) = self.notices.try_recv() {
            pending.push(notice);
        }
        pending
    }
}
