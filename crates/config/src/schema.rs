//! Config schema types (telegram transport, publishing defaults, storage).

use std::path::PathBuf;

use {
    secrecy::{ExposeSecret, Secret},
    serde::{Deserialize, Serialize},
};

/// Quality labels applied positionally to each episode batch.
pub const DEFAULT_QUALITIES: [&str; 3] = ["480p", "720p", "1080p"];

/// HTML caption template used when a chat has not registered its own.
pub const DEFAULT_CAPTION_TEMPLATE: &str = "<b>[@Rear_Animes]</b> <i>{title} S{season}E{episode} - {quality}</i>\n<blockquote><b>Join us @Hanime_System</b></blockquote>";

/// Promotional line sent after every completed publication.
pub const DEFAULT_PROMO_MESSAGE: &str = "<b>Main channel : [ @INFI1984 ]</b>";

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ReelpostConfig {
    pub telegram: TelegramConfig,
    pub publish: PublishConfig,
    pub storage: StorageConfig,
}

/// Bot account and HTTP client settings.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TelegramConfig {
    /// Bot token from @BotFather.
    #[serde(serialize_with = "serialize_secret")]
    pub token: Secret<String>,

    /// TCP connect timeout for Bot API requests (seconds).
    pub connect_timeout_secs: u64,

    /// Whole-request timeout for Bot API requests (seconds). Large video
    /// batches need this well above the long-polling timeout.
    pub read_timeout_secs: u64,

    /// Alternative Bot API endpoint (self-hosted server or tests).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,
}

impl std::fmt::Debug for TelegramConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramConfig")
            .field("token", &"[REDACTED]")
            .field("connect_timeout_secs", &self.connect_timeout_secs)
            .field("read_timeout_secs", &self.read_timeout_secs)
            .field("api_url", &self.api_url)
            .finish()
    }
}

fn serialize_secret<S: serde::Serializer>(
    secret: &Secret<String>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(secret.expose_secret())
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            token: Secret::new(String::new()),
            connect_timeout_secs: 60,
            read_timeout_secs: 300,
            api_url: None,
        }
    }
}

/// Process-wide publishing defaults. Chats may override the caption
/// template at runtime with `/setformat`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PublishConfig {
    /// Quality label per video position within an episode batch.
    pub qualities: Vec<String>,

    /// HTML caption with `{title}`, `{season}`, `{episode}` and `{quality}`.
    pub caption_template: String,

    /// HTML promotional message sent after every publication.
    pub promo_message: String,

    /// How many times the promotional message is repeated.
    pub promo_repeat: usize,

    /// Announce each episode with an "Episode NN Added" banner.
    pub episode_banner: bool,
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self {
            qualities: DEFAULT_QUALITIES.iter().map(ToString::to_string).collect(),
            caption_template: DEFAULT_CAPTION_TEMPLATE.to_string(),
            promo_message: DEFAULT_PROMO_MESSAGE.to_string(),
            promo_repeat: 3,
            episode_banner: true,
        }
    }
}

/// Where per-chat settings (sticker, caption template) are kept.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct StorageConfig {
    /// SQLite file. When unset, settings live in memory only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database: Option<PathBuf>,
}

#[allow(clippy::unwrap_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let cfg = ReelpostConfig::default();
        assert_eq!(cfg.telegram.connect_timeout_secs, 60);
        assert_eq!(cfg.telegram.read_timeout_secs, 300);
        assert_eq!(cfg.publish.qualities, vec!["480p", "720p", "1080p"]);
        assert_eq!(cfg.publish.promo_repeat, 3);
        assert!(cfg.publish.episode_banner);
        assert!(cfg.storage.database.is_none());
    }

    #[test]
    fn deserialize_partial_toml() {
        let raw = r#"
            [telegram]
            token = "123:ABC"

            [publish]
            qualities = ["720p"]
        "#;
        let cfg: ReelpostConfig = toml::from_str(raw).unwrap();
        assert_eq!(cfg.telegram.token.expose_secret(), "123:ABC");
        assert_eq!(cfg.publish.qualities, vec!["720p"]);
        // untouched sections keep their defaults
        assert_eq!(cfg.publish.caption_template, DEFAULT_CAPTION_TEMPLATE);
        assert_eq!(cfg.telegram.read_timeout_secs, 300);
    }

    #[test]
    fn debug_redacts_token() {
        let cfg = TelegramConfig {
            token: Secret::new("super-secret".into()),
            ..Default::default()
        };
        let rendered = format!("{cfg:?}");
        assert!(!rendered.contains("super-secret"));
        assert!(rendered.contains("[REDACTED]"));
    }

    #[test]
    fn serialize_keeps_token() {
        let cfg = ReelpostConfig {
            telegram: TelegramConfig {
                token: Secret::new("tok".into()),
                ..Default::default()
            },
            ..Default::default()
        };
        let json = serde_json::to_string(&cfg).unwrap();
        let back: ReelpostConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.telegram.token.expose_secret(), "tok");
        assert_eq!(back.publish, cfg.publish);
    }
}
