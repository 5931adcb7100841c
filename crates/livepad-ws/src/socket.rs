//! WebSocket stream implementation

use crate::{CloseFrame, Message, WebSocketError, WsHeartbeatConfig};
use futures_util::{
    stream::{SplitSink, SplitStream},
    SinkExt, StreamExt,
};
use hyper::upgrade::Upgraded;
use hyper_util::rt::TokioIo;
use tokio::sync::mpsc;
use tokio::time::{self, Instant};
use tokio_tungstenite::WebSocketStream as TungsteniteStream;

/// Type alias for the upgraded connection
type UpgradedConnection = TungsteniteStream<TokioIo<Upgraded>>;

/// Capacity of the channels between a managed stream and its pump task
const MANAGED_CHANNEL_CAPACITY: usize = 32;

#[allow(clippy::large_enum_variant)]
enum StreamImpl {
    /// Direct connection, no heartbeat
    Direct(UpgradedConnection),
    /// Heartbeat pump running in a background task
    Managed {
        tx: mpsc::Sender<Message>,
        rx: mpsc::Receiver<Result<Message, WebSocketError>>,
    },
}

/// A server-side WebSocket stream
pub struct WebSocketStream {
    inner: StreamImpl,
}

impl WebSocketStream {
    /// Create a new direct WebSocket stream
    pub(crate) fn new(inner: UpgradedConnection) -> Self {
        Self {
            inner: StreamImpl::Direct(inner),
        }
    }

    /// Create a new managed WebSocket stream with heartbeat
    ///
    /// A background task owns the socket. It pings the peer every
    /// `config.interval` and ends the connection once nothing has been
    /// received for `config.deadline()`. Pongs never reach the caller.
    pub(crate) fn new_managed(inner: UpgradedConnection, config: WsHeartbeatConfig) -> Self {
        let (mut sink, mut stream) = inner.split();
        let (user_tx, mut outgoing) = mpsc::channel::<Message>(MANAGED_CHANNEL_CAPACITY);
        let (incoming, user_rx) =
            mpsc::channel::<Result<Message, WebSocketError>>(MANAGED_CHANNEL_CAPACITY);

        tokio::spawn(async move {
            let mut ping = time::interval(config.interval);
            // First tick completes immediately
            ping.tick().await;
            let mut last_seen = Instant::now();

            loop {
                tokio::select! {
                    frame = stream.next() => {
                        match frame {
                            Some(Ok(frame)) => {
                                last_seen = Instant::now();
                                let msg = Message::from(frame);
                                match msg {
                                    Message::Pong(_) => continue,
                                    // tungstenite queues the pong reply itself
                                    Message::Ping(_) => continue,
                                    _ => {}
                                }
                                if incoming.send(Ok(msg)).await.is_err() {
                                    break;
                                }
                            }
                            Some(Err(e)) => {
                                let _ = incoming.send(Err(WebSocketError::from(e))).await;
                                break;
                            }
                            None => break,
                        }
                    }

                    msg = outgoing.recv() => {
                        let Some(msg) = msg else {
                            let _ = sink.close().await;
                            break;
                        };
                        if sink.send(msg.into()).await.is_err() {
                            break;
                        }
                    }

                    _ = ping.tick() => {
                        if last_seen.elapsed() > config.deadline() {
                            tracing::debug!(
                                silent_ms = last_seen.elapsed().as_millis() as u64,
                                "WebSocket heartbeat expired"
                            );
                            let _ = incoming.send(Err(WebSocketError::HeartbeatTimeout)).await;
                            break;
                        }
                        if sink.send(Message::Ping(Vec::new()).into()).await.is_err() {
                            break;
                        }
                    }
                }
            }
            // Dropping both halves closes the socket
        });

        Self {
            inner: StreamImpl::Managed {
                tx: user_tx,
                rx: user_rx,
            },
        }
    }

    /// Split the stream into sender and receiver halves
    pub fn split(self) -> (WebSocketSender, WebSocketReceiver) {
        match self.inner {
            StreamImpl::Direct(inner) => {
                let (sink, stream) = inner.split();
                (
                    WebSocketSender {
                        inner: SenderImpl::Direct(sink),
                    },
                    WebSocketReceiver {
                        inner: ReceiverImpl::Direct(stream),
                    },
                )
            }
            StreamImpl::Managed { tx, rx } => (
                WebSocketSender {
                    inner: SenderImpl::Managed(tx),
                },
                WebSocketReceiver {
                    inner: ReceiverImpl::Managed(rx),
                },
            ),
        }
    }
}

enum SenderImpl {
    Direct(SplitSink<UpgradedConnection, tungstenite::Message>),
    Managed(mpsc::Sender<Message>),
}

/// Sender half of a WebSocket stream
pub struct WebSocketSender {
    inner: SenderImpl,
}

impl WebSocketSender {
    /// Send a message
    pub async fn send(&mut self, msg: Message) -> Result<(), WebSocketError> {
        match &mut self.inner {
            SenderImpl::Direct(s) => s.send(msg.into()).await.map_err(WebSocketError::from),
            SenderImpl::Managed(s) => s
                .send(msg)
                .await
                .map_err(|_| WebSocketError::ConnectionClosed),
        }
    }

    /// Send a close frame and release the sender
    pub async fn close(mut self, frame: CloseFrame) -> Result<(), WebSocketError> {
        self.send(Message::Close(Some(frame))).await?;
        match &mut self.inner {
            SenderImpl::Direct(s) => s.close().await.map_err(WebSocketError::from),
            // Dropping the channel lets the pump task finish the handshake
            SenderImpl::Managed(_) => Ok(()),
        }
    }
}

enum ReceiverImpl {
    Direct(SplitStream<UpgradedConnection>),
    Managed(mpsc::Receiver<Result<Message, WebSocketError>>),
}

/// Receiver half of a WebSocket stream
pub struct WebSocketReceiver {
    inner: ReceiverImpl,
}

impl WebSocketReceiver {
    /// Receive the next message
    ///
    /// Returns `None` once the connection is gone.
    pub async fn recv(&mut self) -> Option<Result<Message, WebSocketError>> {
        match &mut self.inner {
            ReceiverImpl::Direct(s) => s
                .next()
                .await
                .map(|r| r.map(Message::from).map_err(WebSocketError::from)),
            ReceiverImpl::Managed(s) => s.recv().await,
        }
    }
}
