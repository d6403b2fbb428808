//! Reconnection policy and connection state.
//!
//! This module contains pure functions and data types that implement the
//! reconnection decisions without side effects, making them easy to test.
//! The actual reconnect loop lives in [`crate::session`].

use std::time::Duration;

use crate::error::ClientError;

/// Bounded reconnection with doubling delay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconnectPolicy {
    /// Maximum number of reconnection attempts before giving up
    pub max_attempts: u32,
    /// Delay before the first reconnection attempt
    pub base_delay: Duration,
    /// Upper bound on the delay between attempts
    pub max_delay: Duration,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
        }
    }
}

impl ReconnectPolicy {
    /// Check whether the given attempt (1-indexed) should be made.
    pub fn should_attempt(&self, attempt: u32) -> bool {
        attempt <= self.max_attempts
    }

    /// Delay before the given attempt (1-indexed): doubles from
    /// `base_delay`, capped at `max_delay`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        let delay = self.base_delay.saturating_mul(1u32 << exponent);
        delay.min(self.max_delay)
    }
}

/// Connection state published by a session through a `watch` channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// A WebSocket connection is currently established
    Connected,
    /// Connection lost; the given attempt (1-indexed) is pending or running
    Reconnecting { attempt: u32 },
    /// Reconnection attempts exhausted or the error was fatal
    GivenUp,
}

/// Check if the error makes reconnecting pointless.
///
/// A rejected credential will be rejected again, so the session gives up
/// immediately instead of burning reconnection attempts.
pub fn is_fatal(error: &ClientError) -> bool {
    matches!(error, ClientError::AuthRejected(_))
}
