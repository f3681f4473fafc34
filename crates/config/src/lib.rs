//! Configuration loading, validation and env substitution.
//!
//! Config files: `reelpost.toml`, `reelpost.yaml`, or `reelpost.json`
//! Searched in `./` then `~/.config/reelpost/`.
//!
//! Supports `${ENV_VAR}` and `${ENV_VAR:-fallback}` substitution in all
//! string values.

pub mod env_subst;
pub mod error;
pub mod loader;
pub mod schema;
pub mod validate;

pub use {
    error::{Error, Result},
    loader::{apply_env_overrides, config_dir, discover_and_load, find_config_file, load_config},
    schema::{
        DEFAULT_CAPTION_TEMPLATE, DEFAULT_PROMO_MESSAGE, DEFAULT_QUALITIES, PublishConfig,
        ReelpostConfig, StorageConfig, TelegramConfig,
    },
    validate::{Diagnostic, Severity, ValidationResult, validate},
};
