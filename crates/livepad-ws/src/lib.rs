//! # livepad-ws
//!
//! WebSocket transport for livepad.
//!
//! This crate upgrades hyper HTTP/1.1 requests to WebSocket connections and
//! provides the message types and fan-out channel the session hub needs.
//!
//! ## Features
//!
//! - **WebSocket Upgrade**: RFC 6455 handshake on top of hyper's `OnUpgrade`
//! - **Message Types**: Text, Binary, Ping/Pong and Close messages
//! - **Heartbeat**: Optional ping/pong liveness checks on a managed stream
//! - **Audience Broadcast**: Send to every subscriber, or to all but one
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use livepad_ws::{Message, WebSocketUpgrade};
//!
//! async fn handle(mut req: hyper::Request<hyper::body::Incoming>) -> Response {
//!     let ws = WebSocketUpgrade::from_request(&mut req)?;
//!     ws.on_upgrade(|socket| async move {
//!         let (mut sender, mut receiver) = socket.split();
//!         while let Some(Ok(msg)) = receiver.recv().await {
//!             if let Message::Text(text) = msg {
//!                 let _ = sender.send(Message::text(text)).await;
//!             }
//!         }
//!     })
//! }
//! ```

// WebSocket errors include tungstenite errors which are large
#![allow(clippy::result_large_err)]
#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

mod broadcast;
mod error;
mod heartbeat;
mod message;
mod socket;
mod upgrade;

pub use broadcast::{Broadcast, BroadcastReceiver, BroadcastRecvError, Envelope};
pub use error::WebSocketError;
pub use heartbeat::WsHeartbeatConfig;
pub use message::{CloseCode, CloseFrame, Message};
pub use socket::{WebSocketReceiver, WebSocketSender, WebSocketStream};
pub use upgrade::{generate_accept_key, validate_upgrade_request, wants_upgrade, WebSocketUpgrade};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        Broadcast, BroadcastReceiver, CloseCode, CloseFrame, Message, WebSocketError,
        WebSocketReceiver, WebSocketSender, WebSocketStream, WebSocketUpgrade, WsHeartbeatConfig,
    };
}
