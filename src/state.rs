// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! The shared key-value store that holds the operational state of assets,
//! and the pub/sub channel used for change notifications.
//!
//! Values are strings, as in a Redis deployment: statuses are `"0"` or `"1"`,
//! loads are decimal strings, and sensor values are `"<dataType>|<value>"`.
//! See [`keys`] for the key layout.

pub mod keys;
mod memory;

pub use memory::MemoryStore;

use async_trait::async_trait;
use tokio::sync::broadcast;
use tracing::warn;

use crate::Error;

/// A shared key-value store with a publish/subscribe channel.
///
/// Implementations must be thread-safe (`Send + Sync`) so that a single
/// store can be shared by all callers of an [`Engine`][crate::Engine].
/// Failures are reported as [`ErrorKind::Store`][crate::ErrorKind::Store]
/// errors and are never retried by the engine.
#[async_trait]
pub trait StateStore: Send + Sync + 'static {
    /// Gets a value from the store by key.
    ///
    /// Returns `Ok(None)` if the key doesn't exist.
    async fn get(&self, key: &str) -> Result<Option<String>, Error>;

    /// Sets a value in the store.
    async fn set(&self, key: &str, value: &str) -> Result<(), Error>;

    /// Gets multiple values from the store in a single operation.
    ///
    /// Returns the values in the same order as the input keys.  Missing keys
    /// have `None` at their position.
    async fn mget(&self, keys: &[String]) -> Result<Vec<Option<String>>, Error>;

    /// Publishes `payload` to every subscriber of `channel`.
    async fn publish(&self, channel: &str, payload: &str) -> Result<(), Error>;

    /// Subscribes to `channel`.  Only messages published after this call are
    /// received.
    async fn subscribe(&self, channel: &str) -> Result<Subscription, Error>;
}

/// A subscription to a notification channel.
#[derive(Debug)]
pub struct Subscription {
    receiver: broadcast::Receiver<String>,
}

impl Subscription {
    pub(crate) fn new(receiver: broadcast::Receiver<String>) -> Self {
        Self { receiver }
    }

    /// Waits for the next message.
    ///
    /// Returns `None` once the channel is closed.  Messages missed because
    /// the subscriber lagged behind are skipped.
    pub async fn recv(&mut self) -> Option<String> {
        loop {
            match self.receiver.recv().await {
                Ok(message) => return Some(message),
                Err(broadcast::error::RecvError::Closed) => return None,
                Err(broadcast::error::RecvError::Lagged(count)) => {
                    warn!(lagged = count, "Subscriber lagged behind, messages dropped");
                }
            }
        }
    }

    /// Returns the next message if one is already waiting.
    pub fn try_recv(&mut self) -> Option<String> {
        loop {
            match self.receiver.try_recv() {
                Ok(message) => return Some(message),
                Err(broadcast::error::TryRecvError::Lagged(count)) => {
                    warn!(lagged = count, "Subscriber lagged behind, messages dropped");
                }
                Err(_) => return None,
            }
        }
    }
}
