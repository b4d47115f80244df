use anyhow::Context;
use std::collections::VecDeque;
use std::fs;
use std::path::Path;
use std::time::Duration;
use sweepcore::channel::{decode_frame, ChannelNotice};

/// Controller step delay between consecutive servo positions.
pub const DEFAULT_REPLAY_INTERVAL_MS: u64 = 30;

/// Recorded controller frames, one JSON object per line.
///
/// Blank lines and lines starting with `#` are skipped. Lines that fail to
/// decode are kept as `Rejected` notices so replay matches a live channel.
pub struct Capture {
    notices: VecDeque<ChannelNotice>,
    interval: Duration,
}

impl Capture {
    pub fn open<P: AsRef<Path>>(path: P, interval_ms: u64) -> anyhow::Result<Self> {
        let path_ref = path.as_ref();
        let contents = fs::read_to_string(path_ref)
            .with_context(|| format!("reading capture {}", path_ref.display()))?;
        Ok(Self::parse(&contents, interval_ms))
    }

    pub fn parse(contents: &str, interval_ms: u64) -> Self {
        let notices = contents
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .map(|line| match decode_frame(line) {
                Ok(event) => ChannelNotice::Event(event),
                Err(err) => ChannelNotice::Rejected {
                    reason: err.to_string(),
                },
            })
            .collect();
        Self {
            notices,
            interval: Duration::from_millis(interval_ms.max(1)),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn len(&self) -> usize {
        self.notices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notices.is_empty()
    }

    pub fn next_notice(&mut self) -> Option<ChannelNotice> {
        self.notices.pop_front()
    }
}
