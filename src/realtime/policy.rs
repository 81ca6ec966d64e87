//! Reconnect Policy
//!
//! Decides how long to wait before reopening a lost connection and when to
//! give up.

use std::time::Duration;

/// Delay schedule between reconnect attempts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backoff {
    /// Same delay before every attempt
    Fixed(Duration),
    /// `base * 2^(attempt - 1)`, capped at `max`
    Exponential { base: Duration, max: Duration },
}

/// Reconnect policy for a [`RealtimeChannel`](super::RealtimeChannel)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconnectPolicy {
    pub backoff: Backoff,
    /// Consecutive failed reconnects allowed before the channel closes.
    /// `None` retries forever.
    pub max_attempts: Option<u32>,
}

impl ReconnectPolicy {
    pub const DEFAULT_DELAY: Duration = Duration::from_secs(5);

    pub fn fixed(delay: Duration) -> Self {
        Self {
            backoff: Backoff::Fixed(delay),
            max_attempts: None,
        }
    }

    pub fn exponential(base: Duration, max: Duration) -> Self {
        Self {
            backoff: Backoff::Exponential { base, max },
            max_attempts: None,
        }
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = Some(max_attempts);
        self
    }

    /// Delay before reconnect attempt `attempt` (1-based), or `None` once
    /// the policy is exhausted
    pub fn next_delay(&self, attempt: u32) -> Option<Duration> {
        if let Some(max) = self.max_attempts {
            if attempt > max {
                return None;
            }
        }

        let delay = match self.backoff {
            Backoff::Fixed(delay) => delay,
            Backoff::Exponential { base, max } => {
                let factor = 2_u32.saturating_pow(attempt.saturating_sub(1));
                base.saturating_mul(factor).min(max)
            }
        };

        Some(delay)
    }
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self::fixed(Self::DEFAULT_DELAY)
    }
}
