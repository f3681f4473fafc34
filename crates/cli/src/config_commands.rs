use std::path::{Path, PathBuf};

use {
    anyhow::Result,
    reelpost_config::{ReelpostConfig, Severity, ValidationResult},
    reelpost_workflow::Machine,
};

/// ANSI color codes.
const RED: &str = "\x1b[31m";
const YELLOW: &str = "\x1b[33m";
const BOLD: &str = "\x1b[1m";
const RESET: &str = "\x1b[0m";

/// Load the configuration the bot would use.
///
/// An explicit path must load; otherwise the standard locations are
/// searched and defaults are used when nothing is found. A file that is
/// found but cannot be parsed is an error either way.
pub fn load(path: Option<&Path>) -> Result<(ReelpostConfig, Option<PathBuf>)> {
    let (mut config, source) = match path {
        Some(path) => (reelpost_config::load_config(path)?, Some(path.to_path_buf())),
        None => reelpost_config::discover_and_load()?,
    };
    reelpost_config::apply_env_overrides(&mut config);
    Ok((config, source))
}

/// File-level checks plus whether the publishing defaults can build a
/// state machine.
pub fn diagnose(config: &ReelpostConfig) -> ValidationResult {
    let mut result = reelpost_config::validate(config);
    if let Err(e) = Machine::new(config.publish.clone()) {
        result.push(Severity::Error, "publish", e.to_string());
    }
    result
}

/// `check-config`: print diagnostics, fail when any is an error.
pub fn check(path: Option<&Path>) -> Result<()> {
    let (config, source) = load(path)?;
    match &source {
        Some(path) => eprintln!("Checking {}\n", path.display()),
        None => eprintln!("No config file found; checking defaults.\n"),
    }

    let result = diagnose(&config);
    for d in &result.diagnostics {
        let color = match d.severity {
            Severity::Error => RED,
            Severity::Warning => YELLOW,
        };
        eprintln!("  {BOLD}{color}{}{RESET} {}: {}", d.severity, d.path, d.message);
    }

    let errors = count(&result, Severity::Error);
    let warnings = count(&result, Severity::Warning);
    if errors == 0 && warnings == 0 {
        eprintln!("No issues found.");
    } else {
        eprintln!("\n{errors} error(s), {warnings} warning(s)");
    }

    if result.has_errors() {
        anyhow::bail!("configuration has {errors} error(s)");
    }
    Ok(())
}

fn count(result: &ValidationResult, severity: Severity) -> usize {
    result
        .diagnostics
        .iter()
        .filter(|d| d.severity == severity)
        .count()
}

#[allow(clippy::unwrap_used)]
#[cfg(test)]
mod tests {
    use super::*;

    fn write_config(contents: &str) -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reelpost.toml");
        std::fs::write(&path, contents).unwrap();
        (dir, path)
    }

    #[test]
    fn valid_file_passes() {
        let (_dir, path) = write_config(
            r#"
[telegram]
token = "123:abc"

[publish]
qualities = ["480p", "720p", "1080p"]
"#,
        );
        assert!(check(Some(&path)).is_ok());
    }

    #[test]
    fn template_without_quality_is_an_error() {
        let (_dir, path) = write_config(
            r#"
[telegram]
token = "123:abc"

[publish]
caption_template = "{title} S{season}E{episode}"
"#,
        );
        let (config, source) = load(Some(&path)).unwrap();
        assert_eq!(source.as_deref(), Some(path.as_path()));

        let result = diagnose(&config);
        assert!(result.has_errors());
        assert!(
            result
                .diagnostics
                .iter()
                .any(|d| d.path == "publish" && d.message.contains("{quality}"))
        );
        assert!(check(Some(&path)).is_err());
    }

    #[test]
    fn syntax_error_fails_the_check() {
        let (_dir, path) = write_config("[telegram\ntoken = \"123:abc\"\n");
        assert!(load(Some(&path)).is_err());
        assert!(check(Some(&path)).is_err());
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load(Some(&dir.path().join("absent.toml"))).is_err());
    }
}
