//! Frames exchanged over a socket
//!
//! A thin owned mirror of tungstenite's message type, so callers never
//! depend on tungstenite directly.

use std::borrow::Cow;
use tungstenite::protocol::frame::coding::CloseCode as WireCloseCode;

/// A WebSocket frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    /// UTF-8 text
    Text(String),
    /// Opaque bytes
    Binary(Vec<u8>),
    /// Ping with optional payload
    Ping(Vec<u8>),
    /// Pong echoing a ping payload
    Pong(Vec<u8>),
    /// Close, with a code and reason when the peer gave one
    Close(Option<CloseFrame>),
}

impl Message {
    /// Text frame
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    /// Text payload, if this is a text frame
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }
}

impl From<tungstenite::Message> for Message {
    fn from(msg: tungstenite::Message) -> Self {
        use tungstenite::Message as Wire;

        match msg {
            Wire::Text(text) => Self::Text(text),
            Wire::Binary(data) => Self::Binary(data),
            Wire::Ping(data) => Self::Ping(data),
            Wire::Pong(data) => Self::Pong(data),
            Wire::Close(frame) => Self::Close(frame.map(|f| {
                CloseFrame::new(CloseCode::from(f.code), f.reason.into_owned())
            })),
            // Only produced on the write side
            Wire::Frame(frame) => Self::Binary(frame.payload().to_vec()),
        }
    }
}

impl From<Message> for tungstenite::Message {
    fn from(msg: Message) -> Self {
        use tungstenite::protocol::CloseFrame as WireCloseFrame;
        use tungstenite::Message as Wire;

        match msg {
            Message::Text(text) => Wire::Text(text),
            Message::Binary(data) => Wire::Binary(data),
            Message::Ping(data) => Wire::Ping(data),
            Message::Pong(data) => Wire::Pong(data),
            Message::Close(frame) => Wire::Close(frame.map(|f| WireCloseFrame {
                code: f.code.into(),
                reason: f.reason,
            })),
        }
    }
}

/// Code and reason sent with a close frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloseFrame {
    /// Status code
    pub code: CloseCode,
    /// Human-readable reason, at most 123 bytes on the wire
    pub reason: Cow<'static, str>,
}

impl CloseFrame {
    /// Close frame with a code and reason
    pub fn new(code: CloseCode, reason: impl Into<Cow<'static, str>>) -> Self {
        Self {
            code,
            reason: reason.into(),
        }
    }
}

/// Close status code (RFC 6455 section 7.4.1)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CloseCode(u16);

impl CloseCode {
    /// 1000
    pub const NORMAL: Self = Self(1000);
    /// 1001, the server is going away
    pub const AWAY: Self = Self(1001);
    /// 1003, a frame type the endpoint does not accept
    pub const UNSUPPORTED: Self = Self(1003);
    /// 1008, a message broke the application protocol
    pub const POLICY: Self = Self(1008);

    /// Numeric value
    pub fn as_u16(&self) -> u16 {
        self.0
    }
}

impl From<u16> for CloseCode {
    fn from(code: u16) -> Self {
        Self(code)
    }
}

impl From<CloseCode> for u16 {
    fn from(code: CloseCode) -> Self {
        code.0
    }
}

impl From<WireCloseCode> for CloseCode {
    fn from(code: WireCloseCode) -> Self {
        Self(code.into())
    }
}

impl From<CloseCode> for WireCloseCode {
    fn from(code: CloseCode) -> Self {
        code.0.into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_close_codes_match_tungstenite() {
        assert_eq!(WireCloseCode::from(CloseCode::POLICY), WireCloseCode::Policy);
        assert_eq!(WireCloseCode::from(CloseCode::UNSUPPORTED), WireCloseCode::Unsupported);
        assert_eq!(CloseCode::from(WireCloseCode::Away), CloseCode::AWAY);
        assert_eq!(CloseCode::from(4001).as_u16(), 4001);
    }

    #[test]
    fn test_close_reason_reaches_the_wire() {
        let msg = Message::Close(Some(CloseFrame::new(CloseCode::POLICY, "malformed event")));

        match tungstenite::Message::from(msg.clone()) {
            tungstenite::Message::Close(Some(frame)) => {
                assert_eq!(u16::from(frame.code), 1008);
                assert_eq!(frame.reason, "malformed event");
            }
            other => panic!("expected close, got {:?}", other),
        }
        assert_eq!(Message::from(tungstenite::Message::from(msg.clone())), msg);
    }

    #[test]
    fn test_as_text() {
        assert_eq!(Message::text("hi").as_text(), Some("hi"));
        assert_eq!(Message::Binary(b"hi".to_vec()).as_text(), None);
    }
}
