//! In-memory dialog state, one entry per conversation.

use std::sync::Arc;

use {
    dashmap::DashMap,
    reelpost_workflow::ConversationState,
    tokio::sync::{Mutex, OwnedMutexGuard},
};

use crate::key::ConversationKey;

/// Holds the dialog state of every active conversation.
///
/// Each entry sits behind its own async mutex, so two messages of the same
/// conversation are handled one after the other while different
/// conversations never wait on each other.
#[derive(Clone, Default)]
pub struct ConversationStore {
    entries: Arc<DashMap<ConversationKey, Arc<Mutex<ConversationState>>>>,
    /// Serialises read-modify-write of the settings shared by a chat.
    chats: Arc<DashMap<i64, Arc<Mutex<()>>>>,
}

impl ConversationStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Lock a conversation's state, creating an `Idle` entry on first use.
    ///
    /// The map shard is released before awaiting the entry lock. If the
    /// entry was replaced meanwhile the lock is retried on the current one.
    pub async fn lock(&self, key: ConversationKey) -> OwnedMutexGuard<ConversationState> {
        loop {
            let entry = Arc::clone(self.entries.entry(key).or_default().value());
            let guard = Arc::clone(&entry).lock_owned().await;
            let current = self
                .entries
                .get(&key)
                .is_some_and(|e| Arc::ptr_eq(e.value(), &entry));
            if current {
                return guard;
            }
        }
    }

    /// Lock the settings of a chat for a load-modify-save cycle.
    ///
    /// Always taken after the conversation lock, never before it.
    pub async fn lock_chat(&self, chat_id: i64) -> OwnedMutexGuard<()> {
        let entry = Arc::clone(self.chats.entry(chat_id).or_default().value());
        entry.lock_owned().await
    }

    /// Snapshot of a conversation's state, `Idle` if unknown.
    pub async fn get(&self, key: ConversationKey) -> ConversationState {
        let entry = self.entries.get(&key).map(|e| Arc::clone(e.value()));
        match entry {
            Some(entry) => entry.lock().await.clone(),
            None => ConversationState::Idle,
        }
    }

    /// Drop entries that are idle and not held or awaited by anyone.
    pub fn prune_idle(&self) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| {
            if Arc::strong_count(entry) > 1 {
                return true;
            }
            match entry.try_lock() {
                Ok(state) => *state != ConversationState::Idle,
                Err(_) => true,
            }
        });
        self.chats.retain(|_, entry| Arc::strong_count(entry) > 1);
        before.saturating_sub(self.entries.len())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[allow(clippy::unwrap_used)]
#[cfg(test)]
mod tests {
    use {
        super::*,
        reelpost_workflow::{ModeSession, PendingCount},
        std::{
            sync::atomic::{AtomicBool, Ordering},
            time::Duration,
        },
    };

    #[tokio::test]
    async fn unknown_conversation_is_idle() {
        let store = ConversationStore::new();
        assert_eq!(store.get(ConversationKey::new(1, 1)).await, ConversationState::Idle);
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn conversations_are_isolated() {
        let store = ConversationStore::new();
        let alice = ConversationKey::new(-100, 1);
        let bob = ConversationKey::new(-100, 2);

        *store.lock(alice).await = ConversationState::AwaitingCount(PendingCount::Season);
        *store.lock(bob).await = ConversationState::AwaitingVideos(ModeSession::episode());

        assert_eq!(
            store.get(alice).await,
            ConversationState::AwaitingCount(PendingCount::Season)
        );
        assert_eq!(
            store.get(bob).await,
            ConversationState::AwaitingVideos(ModeSession::episode())
        );
        assert_eq!(store.len(), 2);
    }

    #[tokio::test]
    async fn same_conversation_is_serialized() {
        let store = ConversationStore::new();
        let key = ConversationKey::new(1, 1);
        let guard = store.lock(key).await;

        let other = store.clone();
        let waiter = tokio::spawn(async move {
            let mut state = other.lock(key).await;
            *state = ConversationState::AwaitingMode;
        });

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());

        // another conversation is not blocked meanwhile
        drop(store.lock(ConversationKey::new(2, 2)).await);

        drop(guard);
        waiter.await.unwrap();
        assert_eq!(store.get(key).await, ConversationState::AwaitingMode);
    }

    #[tokio::test]
    async fn prune_keeps_active_and_locked_entries() {
        let store = ConversationStore::new();
        drop(store.lock(ConversationKey::new(1, 1)).await);
        *store.lock(ConversationKey::new(2, 2)).await = ConversationState::AwaitingMode;
        let held = store.lock(ConversationKey::new(3, 3)).await;

        assert_eq!(store.prune_idle(), 1);
        assert_eq!(store.len(), 2);
        drop(held);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn pruning_never_loses_a_locked_write() {
        let store = ConversationStore::new();
        let key = ConversationKey::new(7, 7);
        let stop = Arc::new(AtomicBool::new(false));

        let pruner = {
            let store = store.clone();
            let stop = Arc::clone(&stop);
            tokio::spawn(async move {
                while !stop.load(Ordering::Relaxed) {
                    store.prune_idle();
                    tokio::task::yield_now().await;
                }
            })
        };

        for _ in 0..20_000 {
            *store.lock(key).await = ConversationState::AwaitingCount(PendingCount::Season);
            assert_eq!(
                store.get(key).await,
                ConversationState::AwaitingCount(PendingCount::Season)
            );
            *store.lock(key).await = ConversationState::Idle;
        }

        stop.store(true, Ordering::Relaxed);
        pruner.await.unwrap();
    }

    #[tokio::test]
    async fn chat_lock_is_shared_by_users_of_one_chat() {
        let store = ConversationStore::new();
        let guard = store.lock_chat(-100).await;

        let other = store.clone();
        let waiter = tokio::spawn(async move { drop(other.lock_chat(-100).await) });
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());

        drop(store.lock_chat(-200).await);
        drop(guard);
        waiter.await.unwrap();
    }
}
