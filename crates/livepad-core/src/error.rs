//! Session and protocol error types

use thiserror::Error;

/// Error type for session operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// Join attempted with an empty display name
    #[error("Username must not be empty")]
    EmptyUsername,
}

/// Error type for encoding and decoding wire events
#[derive(Error, Debug)]
pub enum ProtocolError {
    /// Inbound frame is not a known client event
    #[error("Malformed client event: {0}")]
    Decode(#[source] serde_json::Error),

    /// Outbound event could not be serialized
    #[error("Failed to encode server event: {0}")]
    Encode(#[source] serde_json::Error),
}
