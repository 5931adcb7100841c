//! Broadcast channel for WebSocket messages
//!
//! Every subscriber registers under a key. A message is either sent to all
//! subscribers or to all but one key, which covers the "everyone" and
//! "everyone but the sender" audiences of a chat-style relay.

use crate::Message;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast;

/// Default number of messages buffered per subscriber
const DEFAULT_CAPACITY: usize = 1024;

/// A message together with the subscriber it must skip
#[derive(Debug, Clone)]
pub struct Envelope<K> {
    /// Subscriber that must not receive the message
    pub skip: Option<K>,
    /// Message to deliver
    pub message: Arc<Message>,
}

/// A broadcast channel for sending messages to multiple WebSocket clients
///
/// Sending never waits on receivers. A subscriber that falls more than the
/// channel capacity behind loses the oldest messages and is told how many
/// it missed.
///
/// # Example
///
/// ```rust,ignore
/// use livepad_ws::{Broadcast, Message};
///
/// let broadcast = Broadcast::<u32>::new();
/// let mut alice = broadcast.subscribe(1);
/// let mut bob = broadcast.subscribe(2);
///
/// // Everyone but subscriber 1
/// broadcast.send_except(&1, Message::text("hi"));
///
/// assert!(bob.recv().await.is_some());
/// ```
pub struct Broadcast<K> {
    sender: broadcast::Sender<Envelope<K>>,
    subscriber_count: Arc<AtomicUsize>,
}

impl<K> Clone for Broadcast<K> {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
            subscriber_count: self.subscriber_count.clone(),
        }
    }
}

impl<K: Clone + PartialEq + Send + Sync + 'static> Broadcast<K> {
    /// Create a new broadcast channel with default capacity
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Create a new broadcast channel with specified capacity
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            sender,
            subscriber_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Subscribe under `key`
    ///
    /// Only messages sent after this call are received.
    pub fn subscribe(&self, key: K) -> BroadcastReceiver<K> {
        self.subscriber_count.fetch_add(1, Ordering::SeqCst);
        BroadcastReceiver {
            key,
            inner: self.sender.subscribe(),
            subscriber_count: self.subscriber_count.clone(),
        }
    }

    /// Send a message to every subscriber
    ///
    /// Returns the number of receivers the message was queued for.
    pub fn send(&self, msg: Message) -> usize {
        self.publish(None, msg)
    }

    /// Send a message to every subscriber except `key`
    pub fn send_except(&self, key: &K, msg: Message) -> usize {
        self.publish(Some(key.clone()), msg)
    }

    fn publish(&self, skip: Option<K>, msg: Message) -> usize {
        let envelope = Envelope {
            skip,
            message: Arc::new(msg),
        };
        // No subscribers is not an error for a relay
        self.sender.send(envelope).unwrap_or(0)
    }

    /// Get the current number of subscribers
    pub fn subscriber_count(&self) -> usize {
        self.subscriber_count.load(Ordering::SeqCst)
    }

    /// Check if there are any active subscribers
    pub fn has_subscribers(&self) -> bool {
        self.subscriber_count() > 0
    }
}

impl<K: Clone + PartialEq + Send + Sync + 'static> Default for Broadcast<K> {
    fn default() -> Self {
        Self::new()
    }
}

/// Receiver for broadcast messages addressed to one key
pub struct BroadcastReceiver<K> {
    key: K,
    inner: broadcast::Receiver<Envelope<K>>,
    subscriber_count: Arc<AtomicUsize>,
}

impl<K: Clone + PartialEq> BroadcastReceiver<K> {
    /// Key this receiver was registered under
    pub fn key(&self) -> &K {
        &self.key
    }

    /// Receive the next message addressed to this subscriber
    ///
    /// Returns `None` if the broadcast channel is closed.
    /// Returns `Err` if messages were missed due to slow consumption.
    pub async fn recv(&mut self) -> Option<Result<Arc<Message>, BroadcastRecvError>> {
        loop {
            match self.inner.recv().await {
                Ok(envelope) if envelope.skip.as_ref() == Some(&self.key) => continue,
                Ok(envelope) => return Some(Ok(envelope.message)),
                Err(broadcast::error::RecvError::Closed) => return None,
                Err(broadcast::error::RecvError::Lagged(count)) => {
                    return Some(Err(BroadcastRecvError::Lagged(count)))
                }
            }
        }
    }

    /// Try to receive a message without waiting
    pub fn try_recv(&mut self) -> Option<Result<Arc<Message>, BroadcastRecvError>> {
        loop {
            match self.inner.try_recv() {
                Ok(envelope) if envelope.skip.as_ref() == Some(&self.key) => continue,
                Ok(envelope) => return Some(Ok(envelope.message)),
                Err(broadcast::error::TryRecvError::Empty)
                | Err(broadcast::error::TryRecvError::Closed) => return None,
                Err(broadcast::error::TryRecvError::Lagged(count)) => {
                    return Some(Err(BroadcastRecvError::Lagged(count)))
                }
            }
        }
    }
}

impl<K> Drop for BroadcastReceiver<K> {
    fn drop(&mut self) {
        self.subscriber_count.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Error when receiving broadcast messages
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum BroadcastRecvError {
    /// Some messages were missed because the receiver is too slow
    #[error("Lagged behind by {0} messages")]
    Lagged(u64),
}
