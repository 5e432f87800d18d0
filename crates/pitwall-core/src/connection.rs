//! Connection status and transport timing configuration.
//!
//! Status transitions are driven exclusively by the transport's own
//! lifecycle; consumer code observes them and never writes them. Transport
//! failures surface here as a `Reconnecting` status, not as errors thrown
//! into consumer code.

use std::time::Duration;

/// Delay between reconnect attempts. Fixed, not exponential: the source
/// design retries at a constant interval with no attempt cap, and that
/// contract is preserved here.
pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_secs(5);

/// Interval between heartbeat pings while connected.
pub const DEFAULT_HEARTBEAT_INTERVAL: Duration = Duration::from_secs(20);

/// Lifecycle status of the realtime connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionStatus {
    /// No connection and none being attempted.
    #[default]
    Disconnected,
    /// First connection attempt in progress.
    Connecting,
    /// Connection established and authenticated.
    Connected,
    /// Connection lost; the transport is retrying on its fixed delay.
    Reconnecting,
}

impl ConnectionStatus {
    /// Whether the connection is currently usable.
    pub fn is_connected(self) -> bool {
        matches!(self, Self::Connected)
    }

    /// Whether a subscription attempt may proceed. Subscriptions are only
    /// valid on a live connection; everything else must wait for the next
    /// `Connected` transition.
    pub fn allows_subscriptions(self) -> bool {
        self.is_connected()
    }
}

/// Observable connection state: status plus the most recent transport error.
///
/// `last_error` feeds the passive "disconnected" indicator; it is never a
/// blocking error surface.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ConnectionInfo {
    /// Current lifecycle status.
    pub status: ConnectionStatus,
    /// Description of the most recent transport error, if any.
    pub last_error: Option<String>,
}

impl ConnectionInfo {
    /// Info for a fresh, never-connected session.
    pub fn disconnected() -> Self {
        Self::default()
    }
}

/// Transport timing configuration.
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// Fixed delay between reconnect attempts.
    pub reconnect_delay: Duration,
    /// Interval between heartbeat pings while connected.
    pub heartbeat_interval: Duration,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            reconnect_delay: DEFAULT_RECONNECT_DELAY,
            heartbeat_interval: DEFAULT_HEARTBEAT_INTERVAL,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_connected_allows_subscriptions() {
        assert!(ConnectionStatus::Connected.allows_subscriptions());
        for status in [
            ConnectionStatus::Disconnected,
            ConnectionStatus::Connecting,
            ConnectionStatus::Reconnecting,
        ] {
            assert!(!status.allows_subscriptions());
        }
    }
}
