use chrono::{DateTime, Local};
use std::fmt;
use tokio::sync::watch;

#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
    Reconnecting,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let label = match self {
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Connected => "connected",
            ConnectionState::Reconnecting => "reconnecting",
        };
        write!(f, "{}", label)
    }
}

/// Snapshot of the inbound connection, published by the subscriber worker.
#[derive(Clone, Debug, Default)]
pub struct BridgeStatus {
    pub connection_state: ConnectionState,
    pub messages_received: usize,
    pub messages_rejected: usize,
    pub last_activity: Option<DateTime<Local>>,
}

pub fn status_channel() -> (watch::Sender<BridgeStatus>, watch::Receiver<BridgeStatus>) {
    watch::channel(BridgeStatus::default())
}
