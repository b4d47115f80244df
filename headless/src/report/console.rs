use anyhow::Context;
use std::fmt;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;
use sweepcore::protocol::Mode;
use sweepcore::reflect::{StatusLevel, StatusLine};
use sweepcore::telemetry::MetricsSnapshot;

/// Prints the status line whenever it changes.
#[derive(Default)]
pub struct StatusPrinter {
    last: Option<StatusLine>,
    quiet: bool,
}

impl StatusPrinter {
    pub fn new(quiet: bool) -> Self {
        Self { last: None, quiet }
    }

    /// Returns true when the line was new.
    pub fn observe(&mut self, status: Option<&StatusLine>) -> bool {
        let Some(status) = status else {
            return false;
        };
        if self.last.as_ref() == Some(status) {
            return false;
        }
        if !self.quiet {
            println!("[{}] {}", tag(status.level), status.message);
        }
        self.last = Some(status.clone());
        true
    }
}

fn tag(level: StatusLevel) -> &'static str {
    match level {
        StatusLevel::Info => "info",
        StatusLevel::Success => "ok",
        StatusLevel::Warning => "warn",
        StatusLevel::Error => "error",
    }
}

/// One-line end-of-session summary.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionReport {
    pub mode: Mode,
    pub has_live_data: bool,
    pub display_frozen: bool,
    pub metrics: MetricsSnapshot,
}

impl fmt::Display for SessionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "mode={} live={} frozen={} rendered={} frozen_frames={} simulated={} applied={} rejected={} clamped={} reconnects={}",
            self.mode,
            self.has_live_data,
            self.display_frozen,
            self.metrics.rendered_frames,
            self.metrics.frozen_frames,
            self.metrics.simulated_frames,
            self.metrics.applied,
            self.metrics.rejected,
            self.metrics.clamped,
            self.metrics.reconnect_attempts
        )
    }
}

impl SessionReport {
    pub fn append_to<P: AsRef<Path>>(&self, path: P) -> anyhow::Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("creating report directory {}", parent.display()))?;
            }
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("opening report {}", path.display()))?;
        writeln!(file, "{}", self)
            .with_context(|| format!("writing report {}", path.display()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report() -> SessionReport {
        SessionReport {
            mode: Mode::Tracking,
            has_live_data: true,
            display_frozen: false,
            metrics: MetricsSnapshot {
                applied: 12,
                rejected: 1,
                rendered_frames: 40,
                ..MetricsSnapshot::default()
            },
        }
    }

    #[test]
    fn report_appends_one_line_per_session() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reports").join("sessions.log");
        report().append_to(&path).unwrap();
        report().append_to(&path).unwrap();
        let contents = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("mode=TRACKING live=true"));
        assert!(lines[0].contains("applied=12 rejected=1"));
    }

    #[test]
    fn printer_skips_repeated_status() {
        let mut printer = StatusPrinter::new(true);
        let line = StatusLine {
            message: "Connected to radar system".into(),
            level: StatusLevel::Success,
        };
        assert!(printer.observe(Some(&line)));
        assert!(!printer.observe(Some(&line)));
        assert!(!printer.observe(None));
    }
}
