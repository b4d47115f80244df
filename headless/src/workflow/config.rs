use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;
use sweepcore::channel::ReconnectPolicy;
use sweepcore::render::RenderConfig;
use sweepcore::sync::SyncConfig;

pub const DEFAULT_URL: &str = "ws://127.0.0.1:8000/ws";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub url: String,
    pub frame_interval_ms: u64,
    pub sync: SyncConfig,
    pub render: RenderConfig,
    pub reconnect: ReconnectPolicy,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_URL.to_string(),
            frame_interval_ms: 16,
            sync: SyncConfig::default(),
            render: RenderConfig::default(),
            reconnect: ReconnectPolicy::default(),
        }
    }
}

impl ClientConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path_ref = path.as_ref();
        let contents = fs::read_to_string(path_ref)
            .with_context(|| format!("reading client config {}", path_ref.display()))?;
        let config: ClientConfig = serde_yaml::from_str(&contents)
            .with_context(|| format!("parsing client config {}", path_ref.display()))?;
        Ok(config)
    }

    pub fn from_args(url: Option<String>, frame_interval_ms: u64) -> Self {
        Self {
            url: url.unwrap_or_else(|| DEFAULT_URL.to_string()),
            frame_interval_ms,
            ..Self::default()
        }
    }

    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.frame_interval_ms.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn config_from_args_fills_defaults() {
        let cfg = ClientConfig::from_args(None, 33);
        assert_eq!(cfg.url, DEFAULT_URL);
        assert_eq!(cfg.frame_interval(), Duration::from_millis(33));
        assert_eq!(cfg.reconnect.max_retries, 5);
    }

    #[test]
    fn config_load_reads_partial_yaml() {
        let mut temp = NamedTempFile::new().unwrap();
        temp.write_all(
            b"url: ws://radar.local:8000/ws\nsync:\n  max_angle: 150\nreconnect:\n  max_retries: 2\n",
        )
        .unwrap();
        let path = temp.into_temp_path();
        let cfg = ClientConfig::load(&path).unwrap();
        assert_eq!(cfg.url, "ws://radar.local:8000/ws");
        assert_eq!(cfg.sync.max_angle, 150.0);
        assert_eq!(cfg.sync.min_angle, 15.0);
        assert_eq!(cfg.reconnect.max_retries, 2);
        assert_eq!(cfg.frame_interval_ms, 16);
    }

    #[test]
    fn config_load_reports_path_on_error() {
        let err = ClientConfig::load("/nonexistent/sweep.yaml").unwrap_err();
        assert!(err.to_string().contains("/nonexistent/sweep.yaml"));
    }
}
