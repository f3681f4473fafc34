//! Conversation and chat-settings storage.
//!
//! Dialog state lives in memory, one entry per (chat, user) pair, and is
//! lost on restart. Chat settings (sticker, caption template) go through a
//! [`ChatSettingsStore`], which is either in-memory or SQLite-backed.

pub mod error;
pub mod key;
pub mod settings;
pub mod store;

pub use {
    error::{Error, Result},
    key::ConversationKey,
    settings::{ChatSettingsStore, MemoryChatSettingsStore, SqliteChatSettingsStore},
    store::ConversationStore,
};
