//! WebSocket upgrade handshake

use crate::{WebSocketError, WebSocketStream, WsHeartbeatConfig};
use bytes::Bytes;
use http::{header, HeaderValue, Response, StatusCode};
use http_body_util::Full;
use hyper::upgrade::OnUpgrade;
use hyper_util::rt::TokioIo;
use std::future::Future;
use tokio_tungstenite::tungstenite::protocol::Role;

/// GUID appended to the client key (RFC 6455 section 1.3)
const WEBSOCKET_GUID: &str = "258EAFA5-E914-47DA-95CA-C5AB0DC85B11";

/// A validated WebSocket upgrade request
///
/// Built from the incoming HTTP request; turns into the `101 Switching
/// Protocols` response once a connection handler is attached.
///
/// # Example
///
/// ```rust,ignore
/// let ws = WebSocketUpgrade::from_request(&mut req)?;
/// let response = ws
///     .heartbeat(WsHeartbeatConfig::default())
///     .on_upgrade(|socket| async move {
///         let (sender, receiver) = socket.split();
///         // ...
///     });
/// ```
pub struct WebSocketUpgrade {
    accept_key: HeaderValue,
    protocol: Option<HeaderValue>,
    heartbeat: Option<WsHeartbeatConfig>,
    on_upgrade: OnUpgrade,
}

impl WebSocketUpgrade {
    /// Validate `req` as a WebSocket upgrade and take over its connection
    pub fn from_request<B>(req: &mut http::Request<B>) -> Result<Self, WebSocketError> {
        let sec_key = validate_upgrade_request(req.method(), req.headers())?;
        let accept_key = HeaderValue::from_str(&generate_accept_key(&sec_key))
            .map_err(|e| WebSocketError::invalid_upgrade(e.to_string()))?;

        // Select the first requested subprotocol, if any
        let protocol = req
            .headers()
            .get(header::SEC_WEBSOCKET_PROTOCOL)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.split(',').map(str::trim).find(|p| !p.is_empty()))
            .and_then(|p| HeaderValue::from_str(p).ok());

        let on_upgrade = req
            .extensions_mut()
            .remove::<OnUpgrade>()
            .ok_or_else(|| WebSocketError::invalid_upgrade("Connection is not upgradable"))?;

        Ok(Self {
            accept_key,
            protocol,
            heartbeat: None,
            on_upgrade,
        })
    }

    /// Enable WebSocket heartbeat
    pub fn heartbeat(mut self, config: WsHeartbeatConfig) -> Self {
        self.heartbeat = Some(config);
        self
    }

    /// Attach the connection handler and build the `101` response
    ///
    /// The handler runs on its own task once hyper hands over the
    /// connection, which happens after the response has been written.
    pub fn on_upgrade<F, Fut>(self, callback: F) -> Response<Full<Bytes>>
    where
        F: FnOnce(WebSocketStream) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let mut response = Response::new(Full::new(Bytes::new()));
        *response.status_mut() = StatusCode::SWITCHING_PROTOCOLS;
        let headers = response.headers_mut();
        headers.insert(header::UPGRADE, HeaderValue::from_static("websocket"));
        headers.insert(header::CONNECTION, HeaderValue::from_static("Upgrade"));
        headers.insert(header::SEC_WEBSOCKET_ACCEPT, self.accept_key);
        if let Some(protocol) = self.protocol {
            headers.insert(header::SEC_WEBSOCKET_PROTOCOL, protocol);
        }

        let heartbeat = self.heartbeat;
        let on_upgrade = self.on_upgrade;

        tokio::spawn(async move {
            match on_upgrade.await {
                Ok(upgraded) => {
                    let ws_stream = tokio_tungstenite::WebSocketStream::from_raw_socket(
                        TokioIo::new(upgraded),
                        Role::Server,
                        None,
                    )
                    .await;

                    let socket = match heartbeat {
                        Some(config) => WebSocketStream::new_managed(ws_stream, config),
                        None => WebSocketStream::new(ws_stream),
                    };

                    callback(socket).await;
                }
                Err(e) => {
                    tracing::error!(error = %WebSocketError::from(e), "WebSocket upgrade failed");
                }
            }
        });

        response
    }
}

/// Generate the Sec-WebSocket-Accept key from the client's Sec-WebSocket-Key
pub fn generate_accept_key(key: &str) -> String {
    use base64::Engine;
    use sha1::{Digest, Sha1};

    let mut hasher = Sha1::new();
    hasher.update(key.as_bytes());
    hasher.update(WEBSOCKET_GUID.as_bytes());
    let hash = hasher.finalize();

    base64::engine::general_purpose::STANDARD.encode(hash)
}

/// Validate that a request is a valid WebSocket upgrade request
///
/// Returns the client's `Sec-WebSocket-Key` on success.
pub fn validate_upgrade_request(
    method: &http::Method,
    headers: &http::HeaderMap,
) -> Result<String, WebSocketError> {
    if method != http::Method::GET {
        return Err(WebSocketError::invalid_upgrade("Method must be GET"));
    }

    let upgrade = header_str(headers, header::UPGRADE)
        .ok_or_else(|| WebSocketError::invalid_upgrade("Missing Upgrade header"))?;
    if !upgrade.eq_ignore_ascii_case("websocket") {
        return Err(WebSocketError::invalid_upgrade(
            "Upgrade header must be 'websocket'",
        ));
    }

    let connection = header_str(headers, header::CONNECTION)
        .ok_or_else(|| WebSocketError::invalid_upgrade("Missing Connection header"))?;
    if !connection
        .split(',')
        .any(|s| s.trim().eq_ignore_ascii_case("upgrade"))
    {
        return Err(WebSocketError::invalid_upgrade(
            "Connection header must contain 'Upgrade'",
        ));
    }

    let sec_key = header_str(headers, header::SEC_WEBSOCKET_KEY)
        .ok_or_else(|| WebSocketError::invalid_upgrade("Missing Sec-WebSocket-Key header"))?;

    match header_str(headers, header::SEC_WEBSOCKET_VERSION) {
        Some("13") => Ok(sec_key.to_string()),
        Some(_) => Err(WebSocketError::invalid_upgrade(
            "Sec-WebSocket-Version must be 13",
        )),
        None => Err(WebSocketError::invalid_upgrade(
            "Missing Sec-WebSocket-Version header",
        )),
    }
}

fn header_str(headers: &http::HeaderMap, name: header::HeaderName) -> Option<&str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

/// Whether the request asks for a WebSocket upgrade at all
pub fn wants_upgrade(headers: &http::HeaderMap) -> bool {
    header_str(headers, header::UPGRADE).is_some_and(|v| v.eq_ignore_ascii_case("websocket"))
}
