//! # livepad-core
//!
//! The session broadcaster behind livepad, a minimal realtime collaborative
//! text editor.
//!
//! This crate holds no I/O. It owns three pieces of state and turns inbound
//! client events into outbound events tagged with their [`Audience`]:
//!
//! - **Presence registry**: the insertion-ordered list of connected participants
//! - **Shared document**: the single text area, overwritten on every change
//! - **Event relay**: forwarding text changes and typing notices to the other clients
//!
//! ## Quick Start
//!
//! ```rust
//! use livepad_core::{Audience, ConnectionId, SessionBroadcaster, ServerEvent};
//!
//! let mut session = SessionBroadcaster::new();
//! let alice = ConnectionId::new();
//!
//! let outbound = session.join(alice, "alice").unwrap();
//! assert_eq!(outbound.len(), 2);
//! assert_eq!(outbound[0].audience, Audience::All);
//! assert!(matches!(outbound[0].event, ServerEvent::ShowOnlineUsers { .. }));
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

mod broadcaster;
mod document;
mod error;
mod participant;
mod protocol;
mod registry;

pub use broadcaster::{Audience, Outbound, SessionBroadcaster};
pub use document::SharedDocument;
pub use error::{ProtocolError, SessionError};
pub use participant::{ConnectionId, Participant};
pub use protocol::{
    ClientEvent, InitialContentPayload, OnlineUsersPayload, ServerEvent, StoppedTypingPayload,
    TextChangedPayload,
};
pub use registry::Registry;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        Audience, ClientEvent, ConnectionId, Outbound, Participant, ServerEvent,
        SessionBroadcaster, SessionError,
    };
}
