use crate::prelude::millis;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Bounded, linearly increasing retry schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconnectPolicy {
    pub max_retries: u32,
    pub base_delay_ms: u64,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            max_retries: 5,
            base_delay_ms: 2000,
        }
    }
}

impl ReconnectPolicy {
    pub fn delay_for(&self, attempt: u32) -> Duration {
        millis(self.base_delay_ms.saturating_mul(u64::from(attempt.max(1))))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    Retry { attempt: u32, delay: Duration },
    Exhausted,
}

#[derive(Debug, Clone)]
pub struct ReconnectState {
    policy: ReconnectPolicy,
    attempts: u32,
    visible: bool,
}

impl ReconnectState {
    pub fn new(policy: ReconnectPolicy) -> Self {
        Self {
            policy,
            attempts: 0,
            visible: true,
        }
    }

    pub fn policy(&self) -> &ReconnectPolicy {
        &self.policy
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn visible(&self) -> bool {
        self.visible
    }

    /// Returns true when the view just became visible again.
    pub fn set_visible(&mut self, visible: bool) -> bool {
        let restored = visible && !self.visible;
        self.visible = visible;
        restored
    }

    pub fn on_connected(&mut self) {
        self.attempts = 0;
    }

    pub fn on_unclean_close(&mut self) -> RetryDecision {
        if self.attempts >= self.policy.max_retries {
            return RetryDecision::Exhausted;
        }
        self.attempts += 1;
        RetryDecision::Retry {
            attempt: self.attempts,
            delay: self.policy.delay_for(self.attempts),
        }
    }

    /// Manual reconnect restarts the retry budget.
    pub fn reset(&mut self) {
        self.attempts = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retries_with_increasing_delay_then_gives_up() {
        let mut state = ReconnectState::new(ReconnectPolicy::default());
        let mut delays = Vec::new();
        while let RetryDecision::Retry { attempt, delay } = state.on_unclean_close() {
            assert_eq!(attempt as usize, delays.len() + 1);
            delays.push(delay.as_millis());
        }
        assert_eq!(delays, vec![2000, 4000, 6000, 8000, 10000]);
        assert_eq!(state.on_unclean_close(), RetryDecision::Exhausted);
    }

    #[test]
    fn successful_connection_restores_budget() {
        let mut state = ReconnectState::new(ReconnectPolicy {
            max_retries: 1,
            base_delay_ms: 10,
        });
        assert!(matches!(state.on_unclean_close(), RetryDecision::Retry { .. }));
        assert_eq!(state.on_unclean_close(), RetryDecision::Exhausted);
        state.on_connected();
        assert!(matches!(
            state.on_unclean_close(),
            RetryDecision::Retry { attempt: 1, .. }
        ));
    }

    #[test]
    fn visibility_restore_is_reported_once() {
        let mut state = ReconnectState::new(ReconnectPolicy::default());
        assert!(!state.set_visible(true));
        assert!(!state.set_visible(false));
        assert!(state.set_visible(true));
        assert!(!state.set_visible(true));
    }
}
