//! Presence registry

use crate::{ConnectionId, Participant};

/// Live list of connected participants, in join order
///
/// Only the session broadcaster mutates it. Every entry belongs to a
/// currently open connection; entries are removed as soon as the
/// transport reports the disconnect.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    participants: Vec<Participant>,
}

impl Registry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a participant
    ///
    /// A connection that joins again is not appended a second time: its
    /// entry keeps its position and takes the new name, so a connection
    /// never appears twice.
    pub fn join(&mut self, participant: Participant) {
        match self
            .participants
            .iter_mut()
            .find(|p| p.socket_id == participant.socket_id)
        {
            Some(existing) => existing.username = participant.username,
            None => self.participants.push(participant),
        }
    }

    /// Remove the participant bound to `connection`, returning it
    ///
    /// Returns `None` when no participant was recorded for the connection.
    pub fn remove(&mut self, connection: ConnectionId) -> Option<Participant> {
        let index = self
            .participants
            .iter()
            .position(|p| p.socket_id == connection)?;
        Some(self.participants.remove(index))
    }

    /// Find the participant bound to `connection`
    pub fn find(&self, connection: ConnectionId) -> Option<&Participant> {
        self.participants.iter().find(|p| p.socket_id == connection)
    }

    /// Iterate participants in join order
    pub fn iter(&self) -> impl Iterator<Item = &Participant> {
        self.participants.iter()
    }

    /// All participants in join order
    pub fn as_slice(&self) -> &[Participant] {
        &self.participants
    }

    /// Number of participants
    pub fn len(&self) -> usize {
        self.participants.len()
    }

    /// Check if nobody has joined
    pub fn is_empty(&self) -> bool {
        self.participants.is_empty()
    }
}
