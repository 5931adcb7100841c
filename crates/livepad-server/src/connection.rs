//! Per-connection driver
//!
//! Pumps one upgraded WebSocket: inbound frames go to the hub, broadcasts
//! addressed to this connection go back out. A frame that cannot be
//! understood closes this connection only.

use crate::hub::{HubError, SessionHandle};
use livepad_core::{ClientEvent, ConnectionId};
use livepad_ws::{
    BroadcastReceiver, BroadcastRecvError, CloseCode, CloseFrame, Message, WebSocketReceiver,
    WebSocketSender, WebSocketStream,
};
use tokio::sync::oneshot;

/// Drive a WebSocket connection until either side closes it
///
/// The hub always learns about the disconnect exactly once, however the
/// connection ends.
pub async fn serve_connection(socket: WebSocketStream, hub: SessionHandle) {
    let (connection, events) = hub.connect();
    let (sender, receiver) = socket.split();
    let (close_tx, close_rx) = oneshot::channel();

    let forward = tokio::spawn(forward_events(connection, sender, events, close_rx));

    match read_events(connection, receiver, &hub).await {
        Some(frame) => {
            tracing::warn!(
                connection_id = %connection,
                code = frame.code.as_u16(),
                reason = %frame.reason,
                "Closing connection"
            );
            let _ = close_tx.send(frame);
        }
        None => drop(close_tx),
    }

    hub.disconnect(connection);
    let _ = forward.await;
    tracing::debug!(connection_id = %connection, "Connection closed");
}

/// Read client frames until the peer leaves or breaks the protocol
///
/// Returns the close frame to send when the server ends the connection.
async fn read_events(
    connection: ConnectionId,
    mut receiver: WebSocketReceiver,
    hub: &SessionHandle,
) -> Option<CloseFrame> {
    while let Some(frame) = receiver.recv().await {
        let text = match frame {
            Ok(Message::Text(text)) => text,
            Ok(Message::Binary(_)) => {
                return Some(CloseFrame::new(
                    CloseCode::UNSUPPORTED,
                    "binary frames are not supported",
                ))
            }
            Ok(Message::Close(_)) => return None,
            Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => continue,
            Err(e) => {
                tracing::debug!(connection_id = %connection, error = %e, "Receive error");
                return None;
            }
        };

        let event = match ClientEvent::decode(&text) {
            Ok(event) => event,
            Err(e) => {
                tracing::debug!(connection_id = %connection, error = %e, "Undecodable frame");
                return Some(CloseFrame::new(CloseCode::POLICY, "malformed event"));
            }
        };

        tracing::trace!(connection_id = %connection, event = event.name(), "Received");

        match hub.dispatch(connection, event).await {
            Ok(()) => {}
            Err(HubError::Session(e)) => {
                return Some(CloseFrame::new(CloseCode::POLICY, e.to_string()))
            }
            Err(HubError::Closed) => {
                return Some(CloseFrame::new(CloseCode::AWAY, "server shutting down"))
            }
        }
    }
    None
}

/// Forward broadcasts to the client until the connection winds down
async fn forward_events(
    connection: ConnectionId,
    mut sender: WebSocketSender,
    mut events: BroadcastReceiver<ConnectionId>,
    mut close: oneshot::Receiver<CloseFrame>,
) {
    loop {
        tokio::select! {
            frame = &mut close => {
                if let Ok(frame) = frame {
                    if let Err(e) = sender.close(frame).await {
                        tracing::debug!(connection_id = %connection, error = %e, "Close failed");
                    }
                }
                break;
            }
            event = events.recv() => match event {
                Some(Ok(msg)) => {
                    if let Err(e) = sender.send(Message::clone(&msg)).await {
                        tracing::debug!(connection_id = %connection, error = %e, "Send error");
                        break;
                    }
                }
                Some(Err(BroadcastRecvError::Lagged(missed))) => {
                    tracing::warn!(connection_id = %connection, missed, "Client lagging behind");
                }
                None => break,
            },
        }
    }
}
