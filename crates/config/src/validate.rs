//! Semantic checks on a loaded configuration.

use secrecy::ExposeSecret;

use crate::schema::ReelpostConfig;

/// Telegram long-polling timeout used by the bot (seconds).
const LONG_POLL_SECS: u64 = 30;

/// Severity level for a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Error,
    Warning,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Error => write!(f, "error"),
            Self::Warning => write!(f, "warning"),
        }
    }
}

/// A single validation diagnostic.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub severity: Severity,
    /// Dotted path, e.g. "publish.qualities"
    pub path: String,
    pub message: String,
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}: {}", self.severity, self.path, self.message)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub diagnostics: Vec<Diagnostic>,
}

impl ValidationResult {
    /// Returns `true` if any diagnostic is an error.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity == Severity::Error)
    }

    pub fn push(&mut self, severity: Severity, path: &str, message: impl Into<String>) {
        self.diagnostics.push(Diagnostic {
            severity,
            path: path.to_string(),
            message: message.into(),
        });
    }
}

/// Check a configuration for values the bot cannot run with.
///
/// The caption template is only checked for emptiness here; placeholder
/// handling belongs to the caption formatter.
#[must_use]
pub fn validate(config: &ReelpostConfig) -> ValidationResult {
    let mut result = ValidationResult::default();

    let token = config.telegram.token.expose_secret();
    if token.trim().is_empty() {
        result.push(
            Severity::Error,
            "telegram.token",
            "bot token is empty (set it in the config or REELPOST_BOT_TOKEN)",
        );
    } else if token.contains("${") {
        result.push(
            Severity::Error,
            "telegram.token",
            format!("unresolved environment reference: {token}"),
        );
    }

    if config.telegram.read_timeout_secs <= LONG_POLL_SECS {
        result.push(
            Severity::Warning,
            "telegram.read_timeout_secs",
            format!(
                "{}s does not exceed the {LONG_POLL_SECS}s long-polling timeout",
                config.telegram.read_timeout_secs
            ),
        );
    }

    if config.publish.qualities.is_empty() {
        result.push(
            Severity::Error,
            "publish.qualities",
            "at least one quality label is required",
        );
    } else if config.publish.qualities.iter().any(|q| q.trim().is_empty()) {
        result.push(
            Severity::Error,
            "publish.qualities",
            "quality labels must not be blank",
        );
    }

    if config.publish.caption_template.trim().is_empty() {
        result.push(
            Severity::Error,
            "publish.caption_template",
            "caption template is empty",
        );
    }

    if config.publish.promo_repeat > 0 && config.publish.promo_message.trim().is_empty() {
        result.push(
            Severity::Warning,
            "publish.promo_message",
            "promo_repeat is set but the promotional message is empty",
        );
    }

    result
}
