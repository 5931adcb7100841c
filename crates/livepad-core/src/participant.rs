//! Participant identity

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Opaque identifier the transport assigns to each connection
///
/// Unique per connection for the life of the process. A client that
/// reconnects gets a fresh id and is treated as a brand-new participant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    /// Allocate a new random connection id
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Get the underlying UUID
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for ConnectionId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// One connected client and the display name it joined with
///
/// Display names are not unique; two participants may share one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    /// Connection this participant is bound to
    pub socket_id: ConnectionId,
    /// Name supplied by the client at join time
    pub username: String,
}

impl Participant {
    /// Create a new participant
    pub fn new(socket_id: ConnectionId, username: impl Into<String>) -> Self {
        Self {
            socket_id,
            username: username.into(),
        }
    }
}
