//! Hub transport state machine.
//!
//! Tracks the lifecycle of the event stream connection to the hub and
//! computes the reconnect delay. Pure state transitions only; the panel's
//! stream task performs the actual I/O and feeds in timestamps.
//!
//! ```text
//!   Disconnected ──start_connecting──▶ Connecting ──connected──▶ Connected
//!        ▲                                 │                        │
//!        │                               error                 error/closed
//!        │                                 ▼                        │
//!        └──────────disconnected────────  Error  ◀──────────────────┘
//! ```

use serde::{Deserialize, Serialize};

/// Backoff after the first failure
const BASE_BACKOFF_MS: u64 = 1000;
/// Upper bound for the reconnect delay
const MAX_BACKOFF_MS: u64 = 30_000;

// =============================================================================
// Connection State
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConnectionState {
    /// Not connected, no attempt in progress
    #[default]
    Disconnected,
    /// WebSocket handshake in progress
    Connecting,
    /// Stream open, events flowing
    Connected,
    /// Last attempt or stream failed, waiting out the backoff
    Error,
    /// No further connection attempts
    ShuttingDown,
}

impl ConnectionState {
    pub fn is_connected(&self) -> bool {
        matches!(self, ConnectionState::Connected)
    }

    pub fn should_reconnect(&self) -> bool {
        matches!(self, ConnectionState::Disconnected | ConnectionState::Error)
    }
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConnectionState::Disconnected => write!(f, "Disconnected"),
            ConnectionState::Connecting => write!(f, "Connecting"),
            ConnectionState::Connected => write!(f, "Connected"),
            ConnectionState::Error => write!(f, "Error"),
            ConnectionState::ShuttingDown => write!(f, "Shutting Down"),
        }
    }
}

// =============================================================================
// Connection Manager
// =============================================================================

/// Connection state plus retry bookkeeping.
///
/// Timestamps are milliseconds on any monotonic clock the caller chooses.
#[derive(Debug, Clone, Default)]
pub struct ConnectionManager {
    state: ConnectionState,
    /// Consecutive failed attempts, reset once a stream opens
    failure_count: u32,
    last_state_change_ms: u64,
    last_message_ms: u64,
    /// Messages received on the current stream
    messages: u64,
}

impl ConnectionManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn failure_count(&self) -> u32 {
        self.failure_count
    }

    pub fn messages_received(&self) -> u64 {
        self.messages
    }

    pub fn is_connected(&self) -> bool {
        self.state.is_connected()
    }

    pub fn should_reconnect(&self) -> bool {
        self.state.should_reconnect()
    }

    /// Recommended delay before the next attempt.
    ///
    /// Exponential in the number of consecutive failures: 1s after the
    /// first, then 2s, 4s, 8s, 16s, then 30s.
    pub fn backoff_ms(&self) -> u64 {
        let doublings = self.failure_count.saturating_sub(1).min(5);
        let delay = BASE_BACKOFF_MS * (1u64 << doublings);
        delay.min(MAX_BACKOFF_MS)
    }

    pub fn time_in_state_ms(&self, current_time_ms: u64) -> u64 {
        current_time_ms.saturating_sub(self.last_state_change_ms)
    }

    /// Time since the last message, `None` before the first one
    pub fn time_since_message_ms(&self, current_time_ms: u64) -> Option<u64> {
        if self.messages == 0 {
            None
        } else {
            Some(current_time_ms.saturating_sub(self.last_message_ms))
        }
    }

    // -------------------------------------------------------------------------
    // State Transitions
    // -------------------------------------------------------------------------

    pub fn start_connecting(&mut self, current_time_ms: u64) {
        if self.state != ConnectionState::ShuttingDown {
            self.set_state(ConnectionState::Connecting, current_time_ms);
        }
    }

    /// Stream opened; clears the failure count
    pub fn connected(&mut self, current_time_ms: u64) {
        if self.state == ConnectionState::Connecting {
            self.set_state(ConnectionState::Connected, current_time_ms);
            self.failure_count = 0;
            self.messages = 0;
        }
    }

    pub fn message_received(&mut self, current_time_ms: u64) {
        if self.state == ConnectionState::Connected {
            self.last_message_ms = current_time_ms;
            self.messages = self.messages.saturating_add(1);
        }
    }

    /// Attempt failed or an open stream dropped
    pub fn error(&mut self, current_time_ms: u64) {
        if self.state != ConnectionState::ShuttingDown {
            self.set_state(ConnectionState::Error, current_time_ms);
            self.failure_count = self.failure_count.saturating_add(1);
        }
    }

    /// Backoff elapsed, ready to retry
    pub fn disconnected(&mut self, current_time_ms: u64) {
        if self.state == ConnectionState::Error {
            self.set_state(ConnectionState::Disconnected, current_time_ms);
        }
    }

    pub fn shutdown(&mut self, current_time_ms: u64) {
        self.set_state(ConnectionState::ShuttingDown, current_time_ms);
    }

    fn set_state(&mut self, new_state: ConnectionState, current_time_ms: u64) {
        if self.state != new_state {
            self.state = new_state;
            self.last_state_change_ms = current_time_ms;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_state() {
        let conn = ConnectionManager::new();
        assert_eq!(conn.state(), ConnectionState::Disconnected);
        assert!(conn.should_reconnect());
        assert!(!conn.is_connected());
        assert_eq!(conn.time_since_message_ms(1000), None);
    }

    #[test]
    fn test_connect_and_receive() {
        let mut conn = ConnectionManager::new();
        conn.start_connecting(100);
        assert_eq!(conn.state(), ConnectionState::Connecting);
        conn.connected(200);
        assert!(conn.is_connected());
        conn.message_received(300);
        conn.message_received(400);
        assert_eq!(conn.messages_received(), 2);
        assert_eq!(conn.time_since_message_ms(1000), Some(600));
        assert_eq!(conn.time_in_state_ms(1000), 800);
    }

    #[test]
    fn test_backoff_progression() {
        let mut conn = ConnectionManager::new();
        assert_eq!(conn.backoff_ms(), 1000);

        let expected = [1000, 2000, 4000, 8000, 16000, 30000, 30000];
        for (i, want) in expected.iter().enumerate() {
            conn.start_connecting(i as u64);
            conn.error(i as u64);
            assert_eq!(conn.backoff_ms(), *want, "after {} failures", i + 1);
            conn.disconnected(i as u64);
        }

        conn.start_connecting(100);
        conn.connected(100);
        assert_eq!(conn.failure_count(), 0);
        assert_eq!(conn.backoff_ms(), 1000);
    }

    #[test]
    fn test_shutdown_blocks_reconnect() {
        let mut conn = ConnectionManager::new();
        conn.shutdown(0);
        conn.start_connecting(10);
        assert_eq!(conn.state(), ConnectionState::ShuttingDown);
        conn.error(20);
        assert_eq!(conn.failure_count(), 0);
        assert!(!conn.should_reconnect());
    }

    #[test]
    fn test_connected_requires_connecting() {
        let mut conn = ConnectionManager::new();
        conn.connected(0);
        assert_eq!(conn.state(), ConnectionState::Disconnected);
    }
}
