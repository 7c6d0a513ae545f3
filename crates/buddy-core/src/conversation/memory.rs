//! In-memory conversation store with time-to-live expiry.
//!
//! Entries live in a `DashMap` and carry an expiry instant that every `put`
//! pushes forward. Expired entries are dropped lazily when read, and in bulk
//! by [`InMemoryConversationStore::purge_expired`], which a background
//! sweeper can run periodically. Everything is lost on process restart.

use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use buddy_types::chat::Conversation;
use buddy_types::config::MAX_TTL_SECS;
use buddy_types::error::RepositoryError;

use super::store::ConversationStore;

/// Default time-to-live: 24 hours.
pub const DEFAULT_TTL: Duration = Duration::from_secs(60 * 60 * 24);

/// Longer TTLs are clamped to this.
pub const MAX_TTL: Duration = Duration::from_secs(MAX_TTL_SECS);

#[derive(Debug, Clone)]
struct Entry {
    conversation: Conversation,
    /// `None` never expires.
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.is_none_or(|at| at > now)
    }
}

/// Process-wide map from thread id to conversation.
///
/// Reads return clones so no `DashMap` guard outlives the call. The `*_at`
/// methods take the current instant explicitly; the trait methods use
/// `Instant::now()`.
#[derive(Debug)]
pub struct InMemoryConversationStore {
    entries: DashMap<String, Entry>,
    ttl: Duration,
}

impl InMemoryConversationStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl: ttl.min(MAX_TTL),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Look up a thread as of `now`, evicting it if it has expired.
    pub fn get_at(&self, thread_id: &str, now: Instant) -> Option<Conversation> {
        let entry = self.entries.get(thread_id)?;
        if entry.is_live(now) {
            return Some(entry.conversation.clone());
        }
        drop(entry);

        // Re-check under the write lock: a concurrent put may have refreshed it.
        match self.entries.remove_if(thread_id, |_, e| !e.is_live(now)) {
            Some(_) => {
                debug!(thread_id, "Conversation expired");
                None
            }
            None => self.entries.get(thread_id).map(|e| e.conversation.clone()),
        }
    }

    /// Store a thread as of `now`; it expires at `now + ttl`, or never if
    /// that instant is not representable.
    pub fn put_at(&self, thread_id: &str, conversation: Conversation, now: Instant) {
        let expires_at = now.checked_add(self.ttl);
        if expires_at.is_none() {
            warn!(thread_id, "Conversation expiry overflows the clock; keeping it until removed");
        }
        self.entries.insert(
            thread_id.to_string(),
            Entry {
                conversation,
                expires_at,
            },
        );
    }

    /// Drop every entry that has expired as of `now`. Returns how many were removed.
    pub fn purge_expired_at(&self, now: Instant) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, e| e.is_live(now));
        before.saturating_sub(self.entries.len())
    }

    pub fn purge_expired(&self) -> usize {
        self.purge_expired_at(Instant::now())
    }

    /// Number of stored entries, including expired ones not yet purged.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Spawn a task that purges expired entries every `period` until `cancel`
    /// fires.
    pub fn spawn_sweeper(
        self: &Arc<Self>,
        period: Duration,
        cancel: CancellationToken,
    ) -> JoinHandle<()> {
        let store = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            // The first tick completes immediately.
            ticker.tick().await;
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => {
                        debug!("Conversation sweeper stopped");
                        break;
                    }
                    _ = ticker.tick() => {
                        let removed = store.purge_expired();
                        if removed > 0 {
                            info!(removed, remaining = store.len(), "Purged expired conversations");
                        }
                    }
                }
            }
        })
    }
}

impl Default for InMemoryConversationStore {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}

impl ConversationStore for InMemoryConversationStore {
    async fn get(&self, thread_id: &str) -> Result<Option<Conversation>, RepositoryError> {
        Ok(self.get_at(thread_id, Instant::now()))
    }

    async fn put(&self, thread_id: &str, conversation: Conversation) -> Result<(), RepositoryError> {
        self.put_at(thread_id, conversation, Instant::now());
        Ok(())
    }

    async fn remove(&self, thread_id: &str) -> Result<bool, RepositoryError> {
        Ok(self.entries.remove(thread_id).is_some())
    }
}
