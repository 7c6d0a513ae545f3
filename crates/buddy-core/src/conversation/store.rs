//! ConversationStore trait definition.

use buddy_types::chat::Conversation;
use buddy_types::error::RepositoryError;

/// Keyed storage of conversations by opaque thread id.
///
/// Every `put` refreshes the entry's time-to-live. An expired entry behaves
/// exactly like one that was never written. Concurrent writes to the same
/// thread id are last-write-wins.
pub trait ConversationStore: Send + Sync {
    /// Owned copy of the thread's conversation, or `None` if absent or expired.
    fn get(
        &self,
        thread_id: &str,
    ) -> impl std::future::Future<Output = Result<Option<Conversation>, RepositoryError>> + Send;

    /// Store (or overwrite) the thread's conversation and refresh its TTL.
    fn put(
        &self,
        thread_id: &str,
        conversation: Conversation,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Forget the thread. Returns whether an entry was removed.
    fn remove(
        &self,
        thread_id: &str,
    ) -> impl std::future::Future<Output = Result<bool, RepositoryError>> + Send;
}
