use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionStatus {
    #[default]
    Disconnected,
    Connecting,
    Connected,
    Failed,
}

/// Snapshot of backend connectivity as seen by the monitor.
/// `retry_count` resets to zero on every successful probe.
#[derive(Debug, Clone, Default)]
pub struct ConnectionState {
    pub status: ConnectionStatus,
    pub last_error: Option<String>,
    pub retry_count: u32,
}

impl ConnectionState {
    pub fn is_connected(&self) -> bool {
        self.status == ConnectionStatus::Connected
    }

    /// Text for the status indicator next to the connection dot.
    pub fn message(&self) -> String {
        match self.status {
            ConnectionStatus::Connected => "Connected".to_string(),
            ConnectionStatus::Connecting => {
                if self.retry_count > 0 {
                    format!("Reconnecting (attempt {})...", self.retry_count)
                } else {
                    "Connecting...".to_string()
                }
            }
            ConnectionStatus::Disconnected => "Disconnected".to_string(),
            ConnectionStatus::Failed => self
                .last_error
                .clone()
                .unwrap_or_else(|| "Connection failed".to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_disconnected_with_zero_retries() {
        let state = ConnectionState::default();
        assert_eq!(state.status, ConnectionStatus::Disconnected);
        assert_eq!(state.retry_count, 0);
        assert!(state.last_error.is_none());
    }

    #[test]
    fn failed_message_prefers_last_error() {
        let state = ConnectionState {
            status: ConnectionStatus::Failed,
            last_error: Some("connection refused".to_string()),
            retry_count: 3,
        };
        assert_eq!(state.message(), "connection refused");

        let state = ConnectionState {
            status: ConnectionStatus::Failed,
            last_error: None,
            retry_count: 3,
        };
        assert_eq!(state.message(), "Connection failed");
    }
}
