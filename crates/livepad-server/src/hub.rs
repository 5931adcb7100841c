//! Session hub
//!
//! One task owns the [`SessionBroadcaster`] and applies commands strictly
//! one at a time, in arrival order. Connections never touch the session
//! state directly; they send commands through a [`SessionHandle`] and
//! receive the resulting broadcasts through their own subscription.

use livepad_core::{
    Audience, ClientEvent, ConnectionId, Outbound, Participant, SessionBroadcaster, SessionError,
};
use livepad_ws::{Broadcast, BroadcastReceiver, Message};
use serde::Serialize;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};

/// Errors returned to a connection by the hub
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HubError {
    /// The session rejected the event
    #[error(transparent)]
    Session(#[from] SessionError),

    /// The hub task is gone
    #[error("Session hub has shut down")]
    Closed,
}

/// Point-in-time view of the session
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionSnapshot {
    /// Participants in join order
    pub users: Vec<Participant>,
    /// Current document content
    pub content: String,
    /// Open connections, joined or not
    pub connections: usize,
}

enum Command {
    Event {
        connection: ConnectionId,
        event: ClientEvent,
        reply: oneshot::Sender<Result<(), SessionError>>,
    },
    Disconnect {
        connection: ConnectionId,
    },
    Snapshot {
        reply: oneshot::Sender<SessionSnapshot>,
    },
}

/// Cloneable handle to the session hub
#[derive(Clone)]
pub struct SessionHandle {
    commands: mpsc::UnboundedSender<Command>,
    broadcast: Broadcast<ConnectionId>,
}

impl SessionHandle {
    /// Register a new connection
    ///
    /// The returned receiver is subscribed before anything else happens on
    /// the connection, so it also sees the broadcasts its own events cause.
    pub fn connect(&self) -> (ConnectionId, BroadcastReceiver<ConnectionId>) {
        let connection = ConnectionId::new();
        let events = self.broadcast.subscribe(connection);
        tracing::debug!(
            connection_id = %connection,
            connections = self.broadcast.subscriber_count(),
            "Connection opened"
        );
        (connection, events)
    }

    /// Apply a client event and wait until it has been processed
    ///
    /// The broadcasts the event causes are published, not delivered, by the
    /// time this returns.
    pub async fn dispatch(
        &self,
        connection: ConnectionId,
        event: ClientEvent,
    ) -> Result<(), HubError> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(Command::Event {
                connection,
                event,
                reply,
            })
            .map_err(|_| HubError::Closed)?;
        response.await.map_err(|_| HubError::Closed)??;
        Ok(())
    }

    /// Report that a connection has closed
    pub fn disconnect(&self, connection: ConnectionId) {
        if self
            .commands
            .send(Command::Disconnect { connection })
            .is_err()
        {
            tracing::debug!(connection_id = %connection, "Hub gone before disconnect");
        }
    }

    /// Current users and document
    pub async fn snapshot(&self) -> Result<SessionSnapshot, HubError> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(Command::Snapshot { reply })
            .map_err(|_| HubError::Closed)?;
        response.await.map_err(|_| HubError::Closed)
    }
}

/// The task that owns the session state
pub struct SessionHub {
    session: SessionBroadcaster,
    broadcast: Broadcast<ConnectionId>,
    commands: mpsc::UnboundedReceiver<Command>,
}

impl SessionHub {
    /// Spawn the hub on the current runtime
    ///
    /// The hub stops once every handle has been dropped.
    pub fn spawn(broadcast_capacity: usize) -> SessionHandle {
        let (tx, rx) = mpsc::unbounded_channel();
        let broadcast = Broadcast::with_capacity(broadcast_capacity);

        let hub = SessionHub {
            session: SessionBroadcaster::new(),
            broadcast: broadcast.clone(),
            commands: rx,
        };
        tokio::spawn(hub.run());

        SessionHandle {
            commands: tx,
            broadcast,
        }
    }

    async fn run(mut self) {
        while let Some(command) = self.commands.recv().await {
            self.apply(command);
        }
        tracing::debug!("Session hub stopped");
    }

    fn apply(&mut self, command: Command) {
        match command {
            Command::Event {
                connection,
                event,
                reply,
            } => {
                let result = self
                    .session
                    .handle(connection, event)
                    .map(|outbound| self.publish(outbound));
                let _ = reply.send(result);
            }
            Command::Disconnect { connection } => {
                let outbound = self.session.disconnect(connection);
                self.publish(outbound);
            }
            Command::Snapshot { reply } => {
                let _ = reply.send(SessionSnapshot {
                    users: self.session.participants().to_vec(),
                    content: self.session.document().as_str().to_string(),
                    connections: self.broadcast.subscriber_count(),
                });
            }
        }
    }

    fn publish(&self, outbound: Vec<Outbound>) {
        for Outbound { audience, event } in outbound {
            let text = match event.encode() {
                Ok(text) => text,
                Err(e) => {
                    tracing::error!(event = event.name(), error = %e, "Dropping unencodable event");
                    continue;
                }
            };

            let receivers = match audience {
                Audience::All => self.broadcast.send(Message::text(text)),
                Audience::AllExcept(sender) => {
                    self.broadcast.send_except(&sender, Message::text(text))
                }
            };
            tracing::trace!(event = event.name(), receivers, "Published");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use livepad_core::{ServerEvent, TextChangedPayload};
    use std::time::Duration;

    async fn next_event(rx: &mut BroadcastReceiver<ConnectionId>) -> ServerEvent {
        let msg = tokio::time::timeout(Duration::from_secs(1), rx.recv())
            .await
            .expect("timed out waiting for broadcast")
            .expect("broadcast closed")
            .expect("lagged");
        ServerEvent::decode(msg.as_text().expect("text frame")).unwrap()
    }

    fn join(username: &str) -> ClientEvent {
        ClientEvent::JoinRoom {
            username: username.to_string(),
        }
    }

    #[tokio::test]
    async fn test_joiner_sees_its_own_join() {
        let hub = SessionHub::spawn(16);
        let (alice, mut rx) = hub.connect();

        hub.dispatch(alice, join("alice")).await.unwrap();

        assert_eq!(next_event(&mut rx).await.name(), "showOnlineUsers");
        assert_eq!(next_event(&mut rx).await.name(), "initialTextAreaContent");
    }

    #[tokio::test]
    async fn test_text_change_skips_sender() {
        let hub = SessionHub::spawn(16);
        let (alice, mut alice_rx) = hub.connect();
        let (bob, mut bob_rx) = hub.connect();
        hub.dispatch(alice, join("alice")).await.unwrap();
        hub.dispatch(bob, join("bob")).await.unwrap();

        hub.dispatch(
            alice,
            ClientEvent::TextareaChanged(TextChangedPayload::new("hi")),
        )
        .await
        .unwrap();

        let snapshot = hub.snapshot().await.unwrap();
        assert_eq!(snapshot.content, "hi");
        assert_eq!(snapshot.connections, 2);

        // alice: 2 events per join, nothing else
        for _ in 0..4 {
            assert_ne!(next_event(&mut alice_rx).await.name(), "textareaChanged");
        }
        assert!(alice_rx.try_recv().is_none());

        // bob subscribed before either join
        for _ in 0..4 {
            next_event(&mut bob_rx).await;
        }
        assert_eq!(
            next_event(&mut bob_rx).await,
            ServerEvent::TextareaChanged(TextChangedPayload::new("hi"))
        );
    }

    #[tokio::test]
    async fn test_empty_username_is_rejected() {
        let hub = SessionHub::spawn(16);
        let (conn, mut rx) = hub.connect();

        let err = hub.dispatch(conn, join("")).await.unwrap_err();

        assert_eq!(err, HubError::Session(SessionError::EmptyUsername));
        assert!(rx.try_recv().is_none());
        assert!(hub.snapshot().await.unwrap().users.is_empty());
    }

    #[tokio::test]
    async fn test_disconnect_of_unjoined_connection_is_silent() {
        let hub = SessionHub::spawn(16);
        let (watcher, mut rx) = hub.connect();
        hub.dispatch(watcher, join("watcher")).await.unwrap();
        next_event(&mut rx).await;
        next_event(&mut rx).await;

        let (lurker, lurker_rx) = hub.connect();
        drop(lurker_rx);
        hub.disconnect(lurker);

        // The snapshot is processed after the disconnect
        let snapshot = hub.snapshot().await.unwrap();
        assert_eq!(snapshot.users.len(), 1);
        assert!(rx.try_recv().is_none());
    }
}
