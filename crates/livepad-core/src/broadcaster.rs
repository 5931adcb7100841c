//! Session broadcaster
//!
//! Turns inbound client events into state changes and outbound events.
//! Each operation runs to completion against the owned state and returns
//! the events to publish, in the order they must be published.

use crate::protocol::{
    ClientEvent, InitialContentPayload, OnlineUsersPayload, ServerEvent, StoppedTypingPayload,
    TextChangedPayload,
};
use crate::{ConnectionId, Participant, Registry, SessionError, SharedDocument};

/// Who should receive an outbound event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Audience {
    /// Every open connection, the sender included
    All,
    /// Every open connection except the given one
    AllExcept(ConnectionId),
}

impl Audience {
    /// Check if `connection` is part of this audience
    pub fn includes(&self, connection: ConnectionId) -> bool {
        match self {
            Self::All => true,
            Self::AllExcept(excluded) => *excluded != connection,
        }
    }
}

/// An event addressed to an audience
#[derive(Debug, Clone, PartialEq)]
pub struct Outbound {
    /// Recipients
    pub audience: Audience,
    /// Event to deliver
    pub event: ServerEvent,
}

impl Outbound {
    /// Address an event to every connection
    pub fn all(event: ServerEvent) -> Self {
        Self {
            audience: Audience::All,
            event,
        }
    }

    /// Address an event to every connection but `sender`
    pub fn all_except(sender: ConnectionId, event: ServerEvent) -> Self {
        Self {
            audience: Audience::AllExcept(sender),
            event,
        }
    }
}

/// Presence registry, shared document and event relay for one session
#[derive(Debug, Default)]
pub struct SessionBroadcaster {
    registry: Registry,
    document: SharedDocument,
}

impl SessionBroadcaster {
    /// Create an empty session
    pub fn new() -> Self {
        Self::default()
    }

    /// Dispatch a decoded client event from `connection`
    pub fn handle(
        &mut self,
        connection: ConnectionId,
        event: ClientEvent,
    ) -> Result<Vec<Outbound>, SessionError> {
        match event {
            ClientEvent::JoinRoom { username } => self.join(connection, username),
            ClientEvent::TextareaChanged(payload) => Ok(self.text_changed(connection, payload)),
            ClientEvent::StoppedTyping(payload) => Ok(self.stopped_typing(connection, payload)),
        }
    }

    /// Register `connection` under `username`
    ///
    /// Broadcasts the full presence list, then the current document along
    /// with the joining name, both to every connection.
    pub fn join(
        &mut self,
        connection: ConnectionId,
        username: impl Into<String>,
    ) -> Result<Vec<Outbound>, SessionError> {
        let username = username.into();
        if username.is_empty() {
            return Err(SessionError::EmptyUsername);
        }

        self.registry
            .join(Participant::new(connection, username.clone()));

        tracing::info!(
            connection_id = %connection,
            username = %username,
            users = self.registry.len(),
            "Participant joined"
        );

        Ok(vec![
            self.online_users(),
            Outbound::all(ServerEvent::InitialTextAreaContent(InitialContentPayload {
                user_just_joined: username,
                content: self.document.as_str().to_string(),
            })),
        ])
    }

    /// Overwrite the document and relay the change to everyone else
    ///
    /// Concurrent edits are not merged; whichever change is processed last
    /// becomes the document.
    pub fn text_changed(
        &mut self,
        connection: ConnectionId,
        payload: TextChangedPayload,
    ) -> Vec<Outbound> {
        self.document.replace(payload.content.as_str());

        tracing::debug!(
            connection_id = %connection,
            bytes = self.document.len(),
            "Document replaced"
        );

        vec![Outbound::all_except(
            connection,
            ServerEvent::TextareaChanged(payload),
        )]
    }

    /// Relay a stopped-typing notice to everyone else
    pub fn stopped_typing(
        &mut self,
        connection: ConnectionId,
        payload: StoppedTypingPayload,
    ) -> Vec<Outbound> {
        tracing::debug!(
            connection_id = %connection,
            username = %payload.username,
            "Stopped typing"
        );

        vec![Outbound::all_except(
            connection,
            ServerEvent::StoppedTyping(payload),
        )]
    }

    /// Drop `connection` from the session
    ///
    /// A connection that never joined produces nothing. Otherwise the others
    /// first get a stopped-typing notice for the departing name, so no stale
    /// indicator survives it, and then everyone gets the updated presence list.
    /// The notice goes out whether or not the user was typing.
    pub fn disconnect(&mut self, connection: ConnectionId) -> Vec<Outbound> {
        let Some(participant) = self.registry.remove(connection) else {
            tracing::debug!(connection_id = %connection, "Disconnect without join");
            return Vec::new();
        };

        tracing::info!(
            connection_id = %connection,
            username = %participant.username,
            users = self.registry.len(),
            "Participant left"
        );

        vec![
            Outbound::all_except(
                connection,
                ServerEvent::StoppedTyping(StoppedTypingPayload::new(participant.username)),
            ),
            self.online_users(),
        ]
    }

    /// Participants in join order
    pub fn participants(&self) -> &[Participant] {
        self.registry.as_slice()
    }

    /// Participant bound to `connection`, if it joined
    pub fn participant(&self, connection: ConnectionId) -> Option<&Participant> {
        self.registry.find(connection)
    }

    /// Current document
    pub fn document(&self) -> &SharedDocument {
        &self.document
    }

    fn online_users(&self) -> Outbound {
        Outbound::all(ServerEvent::ShowOnlineUsers(OnlineUsersPayload {
            users: self.registry.as_slice().to_vec(),
        }))
    }
}
