use std::path::{Path, PathBuf};

use {
    secrecy::{ExposeSecret, Secret},
    tracing::debug,
};

use crate::{
    Error, Result,
    env_subst::substitute_env,
    schema::ReelpostConfig,
};

/// Standard config file names, checked in order.
const CONFIG_FILENAMES: &[&str] = &[
    "reelpost.toml",
    "reelpost.yaml",
    "reelpost.yml",
    "reelpost.json",
];

/// Environment variable that supplies the bot token when the file has none.
pub const TOKEN_ENV: &str = "REELPOST_BOT_TOKEN";

/// Load config from the given path (any supported format).
pub fn load_config(path: &Path) -> Result<ReelpostConfig> {
    let raw = std::fs::read_to_string(path).map_err(|source| Error::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_config(&substitute_env(&raw), path)
}

/// Discover and load config from standard locations.
///
/// Search order:
/// 1. `./reelpost.{toml,yaml,yml,json}` (project-local)
/// 2. `~/.config/reelpost/reelpost.{toml,yaml,yml,json}` (user-global)
///
/// Returns the loaded config and the file it came from. Defaults are used
/// only when no file exists; a file that fails to load is an error.
pub fn discover_and_load() -> Result<(ReelpostConfig, Option<PathBuf>)> {
    load_discovered(find_config_file())
}

fn load_discovered(found: Option<PathBuf>) -> Result<(ReelpostConfig, Option<PathBuf>)> {
    let Some(path) = found else {
        debug!("no config file found, using defaults");
        return Ok((ReelpostConfig::default(), None));
    };

    debug!(path = %path.display(), "loading config");
    let config = load_config(&path)?;
    Ok((config, Some(path)))
}

/// Find the first config file in standard locations.
pub fn find_config_file() -> Option<PathBuf> {
    let local = CONFIG_FILENAMES.iter().map(PathBuf::from);
    let global = config_dir()
        .into_iter()
        .flat_map(|dir| CONFIG_FILENAMES.iter().map(move |name| dir.join(name)));
    local.chain(global).find(|p| p.exists())
}

/// Returns the user-global config directory (`~/.config/reelpost/`).
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "reelpost").map(|d| d.config_dir().to_path_buf())
}

/// Fill an empty bot token from [`TOKEN_ENV`].
pub fn apply_env_overrides(config: &mut ReelpostConfig) {
    apply_token_override(config, std::env::var(TOKEN_ENV).ok());
}

fn apply_token_override(config: &mut ReelpostConfig, token: Option<String>) {
    if !config.telegram.token.expose_secret().trim().is_empty() {
        return;
    }
    if let Some(token) = token.filter(|t| !t.trim().is_empty()) {
        debug!(env = TOKEN_ENV, "using bot token from environment");
        config.telegram.token = Secret::new(token);
    }
}

fn parse_config(raw: &str, path: &Path) -> Result<ReelpostConfig> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");

    match ext {
        "toml" => Ok(toml::from_str(raw)?),
        "yaml" | "yml" => Ok(serde_yaml::from_str(raw)?),
        "json" => Ok(serde_json::from_str(raw)?),
        other => Err(Error::UnsupportedFormat {
            extension: other.to_string(),
        }),
    }
}
