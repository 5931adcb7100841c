//! Wire events exchanged with clients
//!
//! Every WebSocket text frame carries one JSON envelope:
//!
//! ```json
//! {"event": "textareaChanged", "data": {"content": "hi"}}
//! ```

use crate::{Participant, ProtocolError};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Event sent by a client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ClientEvent {
    /// Register the connection under a display name
    JoinRoom {
        /// Display name
        username: String,
    },
    /// The client's full text after a local edit
    TextareaChanged(TextChangedPayload),
    /// The client's user went idle
    StoppedTyping(StoppedTypingPayload),
}

impl ClientEvent {
    /// Decode a client event from a text frame
    pub fn decode(text: &str) -> Result<Self, ProtocolError> {
        serde_json::from_str(text).map_err(ProtocolError::Decode)
    }

    /// Encode this event as a text frame
    pub fn encode(&self) -> Result<String, ProtocolError> {
        serde_json::to_string(self).map_err(ProtocolError::Encode)
    }

    /// Wire name of the event
    pub fn name(&self) -> &'static str {
        match self {
            Self::JoinRoom { .. } => "joinRoom",
            Self::TextareaChanged(_) => "textareaChanged",
            Self::StoppedTyping(_) => "stoppedTyping",
        }
    }
}

/// Event sent by the server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ServerEvent {
    /// Full presence list
    ShowOnlineUsers(OnlineUsersPayload),
    /// Current document plus the name of whoever just joined
    InitialTextAreaContent(InitialContentPayload),
    /// Another client's text, relayed as received
    TextareaChanged(TextChangedPayload),
    /// Another client's user went idle or left
    StoppedTyping(StoppedTypingPayload),
}

impl ServerEvent {
    /// Encode this event as a text frame
    pub fn encode(&self) -> Result<String, ProtocolError> {
        serde_json::to_string(self).map_err(ProtocolError::Encode)
    }

    /// Decode a server event from a text frame
    pub fn decode(text: &str) -> Result<Self, ProtocolError> {
        serde_json::from_str(text).map_err(ProtocolError::Decode)
    }

    /// Wire name of the event
    pub fn name(&self) -> &'static str {
        match self {
            Self::ShowOnlineUsers(_) => "showOnlineUsers",
            Self::InitialTextAreaContent(_) => "initialTextAreaContent",
            Self::TextareaChanged(_) => "textareaChanged",
            Self::StoppedTyping(_) => "stoppedTyping",
        }
    }
}

/// Payload of `textareaChanged`
///
/// Fields other than `content` are kept so the relay forwards the
/// original payload untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextChangedPayload {
    /// Full text of the shared document
    pub content: String,
    /// Any other fields the client sent
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TextChangedPayload {
    /// Create a payload with no extra fields
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            extra: Map::new(),
        }
    }
}

/// Payload of `stoppedTyping`
///
/// Relayed as received, like [`TextChangedPayload`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoppedTypingPayload {
    /// Who stopped typing
    pub username: String,
    /// Any other fields the client sent
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl StoppedTypingPayload {
    /// Create a payload with no extra fields
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            extra: Map::new(),
        }
    }
}

/// Payload of `showOnlineUsers`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OnlineUsersPayload {
    /// Participants in join order
    pub users: Vec<Participant>,
}

/// Payload of `initialTextAreaContent`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InitialContentPayload {
    /// Display name of the participant that just joined
    #[serde(rename = "userJustJoined")]
    pub user_just_joined: String,
    /// Current document content
    pub content: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ConnectionId;
    use serde_json::json;

    #[test]
    fn test_decode_join_room() {
        let event = ClientEvent::decode(r#"{"event":"joinRoom","data":{"username":"alice"}}"#)
            .unwrap();
        assert_eq!(
            event,
            ClientEvent::JoinRoom {
                username: "alice".to_string()
            }
        );
        assert_eq!(event.name(), "joinRoom");
    }

    #[test]
    fn test_textarea_changed_keeps_extra_fields() {
        let raw = r#"{"event":"textareaChanged","data":{"content":"hi","username":"alice","cursor":2}}"#;
        let event = ClientEvent::decode(raw).unwrap();

        let ClientEvent::TextareaChanged(payload) = event else {
            panic!("expected textareaChanged");
        };
        assert_eq!(payload.content, "hi");
        assert_eq!(payload.extra.get("username"), Some(&json!("alice")));

        let relayed = ServerEvent::TextareaChanged(payload).encode().unwrap();
        let value: Value = serde_json::from_str(&relayed).unwrap();
        assert_eq!(
            value,
            json!({
                "event": "textareaChanged",
                "data": {"content": "hi", "username": "alice", "cursor": 2}
            })
        );
    }

    #[test]
    fn test_stopped_typing_keeps_extra_fields() {
        let raw = r#"{"event":"stoppedTyping","data":{"username":"bob","at":17}}"#;
        let ClientEvent::StoppedTyping(payload) = ClientEvent::decode(raw).unwrap() else {
            panic!("expected stoppedTyping");
        };
        assert_eq!(payload.username, "bob");

        let relayed = ServerEvent::StoppedTyping(payload).encode().unwrap();
        let value: Value = serde_json::from_str(&relayed).unwrap();
        assert_eq!(
            value,
            json!({"event": "stoppedTyping", "data": {"username": "bob", "at": 17}})
        );
        assert_eq!(
            ServerEvent::StoppedTyping(StoppedTypingPayload::new("bob")).encode().unwrap(),
            r#"{"event":"stoppedTyping","data":{"username":"bob"}}"#
        );
    }

    #[test]
    fn test_decode_rejects_malformed_frames() {
        for raw in [
            "not json",
            r#"{"event":"joinRoom","data":{}}"#,
            r#"{"event":"textareaChanged","data":{"username":"alice"}}"#,
            r#"{"event":"deleteEverything","data":{}}"#,
            r#"{"data":{"username":"alice"}}"#,
        ] {
            assert!(
                matches!(ClientEvent::decode(raw), Err(ProtocolError::Decode(_))),
                "{raw} should not decode"
            );
        }
    }

    #[test]
    fn test_server_event_wire_shape() {
        let id = ConnectionId::new();
        let users = ServerEvent::ShowOnlineUsers(OnlineUsersPayload {
            users: vec![Participant::new(id, "bob")],
        });
        let value: Value = serde_json::from_str(&users.encode().unwrap()).unwrap();
        assert_eq!(
            value,
            json!({
                "event": "showOnlineUsers",
                "data": {"users": [{"socket_id": id.to_string(), "username": "bob"}]}
            })
        );

        let initial = ServerEvent::InitialTextAreaContent(InitialContentPayload {
            user_just_joined: "bob".to_string(),
            content: String::new(),
        });
        let value: Value = serde_json::from_str(&initial.encode().unwrap()).unwrap();
        assert_eq!(
            value,
            json!({
                "event": "initialTextAreaContent",
                "data": {"userJustJoined": "bob", "content": ""}
            })
        );
    }
}
