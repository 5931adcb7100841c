//! HTTP server
//!
//! Routes:
//!
//! - `GET /socket`: WebSocket endpoint of the editing session
//! - `GET|HEAD /health`: liveness plus session counters
//! - `GET|HEAD /*`: static files from the public directory

use crate::config::ServerConfig;
use crate::connection::serve_connection;
use crate::error::{HttpError, ServerError};
use crate::hub::{SessionHandle, SessionHub};
use crate::static_files::StaticFiles;
use bytes::Bytes;
use http::{header, HeaderValue, Method, Response, StatusCode};
use http_body_util::Full;
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use livepad_ws::{wants_upgrade, WebSocketUpgrade, WsHeartbeatConfig};
use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;
use tracing::{error, info};

/// Path of the WebSocket endpoint
pub const SOCKET_PATH: &str = "/socket";

/// Path of the health endpoint
pub const HEALTH_PATH: &str = "/health";

struct AppState {
    hub: SessionHandle,
    static_files: StaticFiles,
    heartbeat: Option<WsHeartbeatConfig>,
}

/// A bound livepad server
pub struct Server {
    listener: TcpListener,
    state: Arc<AppState>,
}

impl Server {
    /// Bind the listener and start the session hub
    pub async fn bind(config: &ServerConfig) -> Result<Self, ServerError> {
        let addr = config.socket_addr()?;
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| ServerError::Bind { addr, source })?;

        let state = AppState {
            hub: SessionHub::spawn(config.broadcast_capacity),
            static_files: StaticFiles::new(&config.public_dir),
            heartbeat: config.heartbeat(),
        };

        Ok(Self {
            listener,
            state: Arc::new(state),
        })
    }

    /// Address the listener is bound to
    pub fn local_addr(&self) -> Result<SocketAddr, ServerError> {
        Ok(self.listener.local_addr()?)
    }

    /// Accept connections until `shutdown` resolves
    ///
    /// Connections already open keep running until their clients leave.
    pub async fn serve(self, shutdown: impl Future<Output = ()>) -> Result<(), ServerError> {
        let addr = self.local_addr()?;
        info!(
            %addr,
            public_dir = %self.state.static_files.root().display(),
            heartbeat = self.state.heartbeat.is_some(),
            "livepad listening on http://{}",
            addr
        );

        tokio::pin!(shutdown);

        loop {
            let (stream, remote_addr) = tokio::select! {
                accepted = self.listener.accept() => match accepted {
                    Ok(accepted) => accepted,
                    Err(e) => {
                        // Usually fd exhaustion; keep serving the others
                        error!(error = %e, "Accept failed");
                        continue;
                    }
                },
                _ = &mut shutdown => {
                    info!("Shutdown requested, no longer accepting connections");
                    return Ok(());
                }
            };

            let io = TokioIo::new(stream);
            let state = self.state.clone();

            tokio::spawn(async move {
                let service = service_fn(move |req: hyper::Request<Incoming>| {
                    let state = state.clone();
                    async move { Ok::<_, Infallible>(handle_request(state, req).await) }
                });

                if let Err(err) = http1::Builder::new()
                    .serve_connection(io, service)
                    .with_upgrades()
                    .await
                {
                    error!(%remote_addr, error = %err, "Connection error");
                }
            });
        }
    }
}

/// Handle a single HTTP request
async fn handle_request(
    state: Arc<AppState>,
    mut req: hyper::Request<Incoming>,
) -> Response<Full<Bytes>> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let start = Instant::now();

    let response = if path == SOCKET_PATH {
        upgrade(&state, &mut req)
    } else if method == Method::GET && path == HEALTH_PATH {
        health(&state).await
    } else if method == Method::HEAD && path == HEALTH_PATH {
        health(&state).await.map(strip_body)
    } else if method == Method::GET {
        state.static_files.serve(&path, req.headers()).await
    } else if method == Method::HEAD {
        state
            .static_files
            .serve(&path, req.headers())
            .await
            .map(strip_body)
    } else {
        Err(HttpError::method_not_allowed(format!(
            "Method {} not allowed for {}",
            method, path
        )))
    };

    let response = response.unwrap_or_else(|err| {
        let allow = err.status == StatusCode::METHOD_NOT_ALLOWED;
        let mut response = err.into_response();
        if allow {
            response
                .headers_mut()
                .insert(header::ALLOW, HeaderValue::from_static("GET, HEAD"));
        }
        response
    });

    log_request(&method, &path, response.status(), start);
    response
}

fn upgrade(
    state: &Arc<AppState>,
    req: &mut hyper::Request<Incoming>,
) -> Result<Response<Full<Bytes>>, HttpError> {
    if !wants_upgrade(req.headers()) {
        return Err(HttpError::upgrade_required(
            "This endpoint only speaks WebSocket",
        ));
    }

    let mut ws = WebSocketUpgrade::from_request(req)?;
    if let Some(config) = state.heartbeat {
        ws = ws.heartbeat(config);
    }

    let hub = state.hub.clone();
    Ok(ws.on_upgrade(move |socket| serve_connection(socket, hub)))
}

async fn health(state: &AppState) -> Result<Response<Full<Bytes>>, HttpError> {
    let snapshot = state
        .hub
        .snapshot()
        .await
        .map_err(|e| HttpError::unavailable(e.to_string()))?;

    let body = serde_json::json!({
        "status": "ok",
        "users": snapshot.users.len(),
        "connections": snapshot.connections,
        "document_bytes": snapshot.content.len(),
    });
    let json = serde_json::to_vec(&body).map_err(|e| HttpError::internal(e.to_string()))?;

    let mut response = Response::new(Full::new(Bytes::from(json)));
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );
    Ok(response)
}

fn strip_body(response: Response<Full<Bytes>>) -> Response<Full<Bytes>> {
    let (parts, _) = response.into_parts();
    Response::from_parts(parts, Full::new(Bytes::new()))
}

/// Log request completion
fn log_request(method: &Method, path: &str, status: StatusCode, start: Instant) {
    let elapsed = start.elapsed();

    if status.is_server_error() {
        error!(
            method = %method,
            path = %path,
            status = %status.as_u16(),
            duration_ms = %elapsed.as_millis(),
            "Request failed"
        );
    } else {
        info!(
            method = %method,
            path = %path,
            status = %status.as_u16(),
            duration_ms = %elapsed.as_millis(),
            "Request completed"
        );
    }
}
