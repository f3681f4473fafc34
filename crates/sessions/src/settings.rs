//! Per-chat settings persistence.
//!
//! Settings are stored as key-value rows scoped to `(chat_id, key)` so new
//! settings can be added without a schema change.

use std::{
    collections::HashMap,
    sync::RwLock,
    time::{SystemTime, UNIX_EPOCH},
};

use {
    async_trait::async_trait,
    reelpost_workflow::{ChatSettings, MediaRef},
    sqlx::{
        SqlitePool,
        sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    },
    tracing::debug,
};

use crate::error::{Error, Result};

const STICKER_KEY: &str = "sticker";
const TEMPLATE_KEY: &str = "caption_template";

/// Load and save the settings of a chat.
#[async_trait]
pub trait ChatSettingsStore: Send + Sync {
    /// Settings of a chat, defaults if none were saved.
    async fn load(&self, chat_id: i64) -> Result<ChatSettings>;

    async fn save(&self, chat_id: i64, settings: &ChatSettings) -> Result<()>;

    /// Forget everything saved for a chat.
    async fn clear(&self, chat_id: i64) -> Result<()>;
}

/// Settings kept for the lifetime of the process.
#[derive(Debug, Default)]
pub struct MemoryChatSettingsStore {
    chats: RwLock<HashMap<i64, ChatSettings>>,
}

impl MemoryChatSettingsStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ChatSettingsStore for MemoryChatSettingsStore {
    async fn load(&self, chat_id: i64) -> Result<ChatSettings> {
        let chats = self
            .chats
            .read()
            .map_err(|e| Error::message(format!("settings lock poisoned: {e}")))?;
        Ok(chats.get(&chat_id).cloned().unwrap_or_default())
    }

    async fn save(&self, chat_id: i64, settings: &ChatSettings) -> Result<()> {
        let mut chats = self
            .chats
            .write()
            .map_err(|e| Error::message(format!("settings lock poisoned: {e}")))?;
        chats.insert(chat_id, settings.clone());
        Ok(())
    }

    async fn clear(&self, chat_id: i64) -> Result<()> {
        let mut chats = self
            .chats
            .write()
            .map_err(|e| Error::message(format!("settings lock poisoned: {e}")))?;
        chats.remove(&chat_id);
        Ok(())
    }
}

/// SQLite-backed settings that survive restarts.
pub struct SqliteChatSettingsStore {
    pool: SqlitePool,
}

fn now_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis()
        .try_into()
        .unwrap_or(i64::MAX)
}

impl SqliteChatSettingsStore {
    /// Wrap an existing pool and create the settings table if needed.
    pub async fn new(pool: SqlitePool) -> Result<Self> {
        sqlx::query(
            r#"CREATE TABLE IF NOT EXISTS chat_settings (
                chat_id    INTEGER NOT NULL,
                key        TEXT    NOT NULL,
                value      TEXT    NOT NULL,
                updated_at INTEGER NOT NULL,
                PRIMARY KEY (chat_id, key)
            )"#,
        )
        .execute(&pool)
        .await?;
        Ok(Self { pool })
    }

    /// Open (creating if missing) the database file at `path`.
    pub async fn open(path: &str) -> Result<Self> {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(options)
            .await?;
        debug!(path, "opened chat settings database");
        Self::new(pool).await
    }

    async fn set(&self, chat_id: i64, key: &str, value: Option<&str>) -> Result<()> {
        match value {
            Some(value) => {
                sqlx::query(
                    r#"INSERT INTO chat_settings (chat_id, key, value, updated_at)
                       VALUES (?, ?, ?, ?)
                       ON CONFLICT(chat_id, key) DO UPDATE SET
                         value = excluded.value,
                         updated_at = excluded.updated_at"#,
                )
                .bind(chat_id)
                .bind(key)
                .bind(value)
                .bind(now_ms())
                .execute(&self.pool)
                .await?;
            },
            None => {
                sqlx::query("DELETE FROM chat_settings WHERE chat_id = ? AND key = ?")
                    .bind(chat_id)
                    .bind(key)
                    .execute(&self.pool)
                    .await?;
            },
        }
        Ok(())
    }
}

#[async_trait]
impl ChatSettingsStore for SqliteChatSettingsStore {
    async fn load(&self, chat_id: i64) -> Result<ChatSettings> {
        let rows = sqlx::query_as::<_, (String, String)>(
            "SELECT key, value FROM chat_settings WHERE chat_id = ?",
        )
        .bind(chat_id)
        .fetch_all(&self.pool)
        .await?;

        let mut settings = ChatSettings::default();
        for (key, value) in rows {
            match key.as_str() {
                STICKER_KEY => settings.sticker = Some(MediaRef::new(value)),
                TEMPLATE_KEY => settings.caption_template = Some(value),
                other => debug!(chat_id, key = other, "ignoring unknown chat setting"),
            }
        }
        Ok(settings)
    }

    async fn save(&self, chat_id: i64, settings: &ChatSettings) -> Result<()> {
        self.set(chat_id, STICKER_KEY, settings.sticker.as_ref().map(MediaRef::as_str))
            .await?;
        self.set(chat_id, TEMPLATE_KEY, settings.caption_template.as_deref())
            .await
    }

    async fn clear(&self, chat_id: i64) -> Result<()> {
        sqlx::query("DELETE FROM chat_settings WHERE chat_id = ?")
            .bind(chat_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[allow(clippy::unwrap_used)]
#[cfg(test)]
mod tests {
    use super::*;

    async fn sqlite_store() -> SqliteChatSettingsStore {
        let pool = SqlitePool::connect("sqlite::memory:").await.unwrap();
        SqliteChatSettingsStore::new(pool).await.unwrap()
    }

    fn sample() -> ChatSettings {
        ChatSettings {
            sticker: Some(MediaRef::new("CAACAgIAAxkBAAE")),
            caption_template: Some("<b>{title}</b> S{season}E{episode} {quality}".into()),
        }
    }

    async fn exercise(store: &dyn ChatSettingsStore) {
        assert_eq!(store.load(7).await.unwrap(), ChatSettings::default());

        store.save(7, &sample()).await.unwrap();
        assert_eq!(store.load(7).await.unwrap(), sample());
        // other chats untouched
        assert_eq!(store.load(8).await.unwrap(), ChatSettings::default());

        let sticker_only = ChatSettings {
            caption_template: None,
            ..sample()
        };
        store.save(7, &sticker_only).await.unwrap();
        assert_eq!(store.load(7).await.unwrap(), sticker_only);

        store.clear(7).await.unwrap();
        assert_eq!(store.load(7).await.unwrap(), ChatSettings::default());
    }

    #[tokio::test]
    async fn memory_store_round_trip() {
        exercise(&MemoryChatSettingsStore::new()).await;
    }

    #[tokio::test]
    async fn sqlite_store_round_trip() {
        exercise(&sqlite_store().await).await;
    }

    #[tokio::test]
    async fn sqlite_overwrites_in_place() {
        let store = sqlite_store().await;
        store.save(1, &sample()).await.unwrap();
        let replaced = ChatSettings {
            sticker: Some(MediaRef::new("other")),
            ..sample()
        };
        store.save(1, &replaced).await.unwrap();

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM chat_settings WHERE chat_id = 1")
            .fetch_one(&store.pool)
            .await
            .unwrap();
        assert_eq!(count, 2);
        assert_eq!(store.load(1).await.unwrap(), replaced);
    }

    #[tokio::test]
    async fn rows_carry_a_save_timestamp() {
        let store = sqlite_store().await;
        let before = now_ms();
        store.save(3, &sample()).await.unwrap();

        let stamps: Vec<i64> =
            sqlx::query_scalar("SELECT updated_at FROM chat_settings WHERE chat_id = 3")
                .fetch_all(&store.pool)
                .await
                .unwrap();
        assert_eq!(stamps.len(), 2);
        assert!(stamps.iter().all(|&t| t >= before && t < i64::MAX), "{stamps:?}");
    }

    #[tokio::test]
    async fn sqlite_file_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reelpost.db");
        let path = path.to_str().unwrap();

        {
            let store = SqliteChatSettingsStore::open(path).await.unwrap();
            store.save(-1001, &sample()).await.unwrap();
            store.pool.close().await;
        }

        let store = SqliteChatSettingsStore::open(path).await.unwrap();
        assert_eq!(store.load(-1001).await.unwrap(), sample());
    }
}
