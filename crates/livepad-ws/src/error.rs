//! WebSocket error types

use thiserror::Error;

/// Error type for WebSocket operations
#[derive(Error, Debug)]
pub enum WebSocketError {
    /// Invalid WebSocket upgrade request
    #[error("Invalid WebSocket upgrade request: {0}")]
    InvalidUpgrade(String),

    /// The HTTP connection could not be handed over after the 101 response
    #[error("WebSocket upgrade failed: {0}")]
    UpgradeFailed(#[from] hyper::Error),

    /// Connection closed unexpectedly
    #[error("Connection closed unexpectedly")]
    ConnectionClosed,

    /// Heartbeat expired without any traffic from the peer
    #[error("Heartbeat timed out")]
    HeartbeatTimeout,

    /// Tungstenite error
    #[error("WebSocket error: {0}")]
    Tungstenite(#[from] tungstenite::Error),
}

impl WebSocketError {
    /// Rejected handshake
    pub fn invalid_upgrade(msg: impl Into<String>) -> Self {
        Self::InvalidUpgrade(msg.into())
    }

    /// Whether the client's request is at fault
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::InvalidUpgrade(_))
    }
}
