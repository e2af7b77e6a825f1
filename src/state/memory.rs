// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! In-memory implementation of the [`StateStore`] trait.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use async_trait::async_trait;
use tokio::sync::{broadcast, RwLock};
use tracing::trace;

use super::{StateStore, Subscription};
use crate::Error;

/// Default broadcast channel capacity.
const DEFAULT_CHANNEL_CAPACITY: usize = 1024;

/// A [`StateStore`] kept in memory.
///
/// Each channel is a Tokio broadcast channel, so every subscriber receives
/// every message published after it subscribed.  The store can be switched
/// offline to exercise failure paths: while offline, every operation fails
/// with a `Store` error.
pub struct MemoryStore {
    data: RwLock<HashMap<String, String>>,
    channels: RwLock<HashMap<String, broadcast::Sender<String>>>,
    published: AtomicU64,
    offline: AtomicBool,
}

impl MemoryStore {
    /// Creates a new, empty store.
    pub fn new() -> Self {
        Self {
            data: RwLock::new(HashMap::new()),
            channels: RwLock::new(HashMap::new()),
            published: AtomicU64::new(0),
            offline: AtomicBool::new(false),
        }
    }

    /// Returns the total number of messages published across all channels.
    pub fn published_count(&self) -> u64 {
        self.published.load(Ordering::SeqCst)
    }

    /// Makes every following operation fail while `offline` is true.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    fn ensure_online(&self) -> Result<(), Error> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(Error::store("State store is offline."));
        }
        Ok(())
    }

    async fn channel(&self, channel: &str) -> broadcast::Sender<String> {
        let mut channels = self.channels.write().await;
        channels
            .entry(channel.to_string())
            .or_insert_with(|| broadcast::channel(DEFAULT_CHANNEL_CAPACITY).0)
            .clone()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStore")
            .field("published", &self.published)
            .field("offline", &self.offline)
            .finish()
    }
}

#[async_trait]
impl StateStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, Error> {
        self.ensure_online()?;
        Ok(self.data.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), Error> {
        self.ensure_online()?;
        self.data
            .write()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn mget(&self, keys: &[String]) -> Result<Vec<Option<String>>, Error> {
        self.ensure_online()?;
        let data = self.data.read().await;
        Ok(keys.iter().map(|key| data.get(key).cloned()).collect())
    }

    async fn publish(&self, channel: &str, payload: &str) -> Result<(), Error> {
        self.ensure_online()?;
        let sender = self.channel(channel).await;
        self.published.fetch_add(1, Ordering::SeqCst);

        // Having no subscribers is valid.
        let receivers = sender.send(payload.to_string()).unwrap_or(0);
        trace!(channel, payload, receivers, "Published message");

        Ok(())
    }

    async fn subscribe(&self, channel: &str) -> Result<Subscription, Error> {
        self.ensure_online()?;
        Ok(Subscription::new(self.channel(channel).await.subscribe()))
    }
}
