//! Engine configuration loading.
//!
//! The file location is taken from `STEPCORE_CONFIG_PATH` when set (a leading
//! `~` is expanded), otherwise `<config_dir>/stepcore/config.yaml`. A missing
//! file yields defaults. A file that cannot be read or parsed is logged and
//! also yields defaults.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use dirs_next::{config_dir, home_dir};
use stepcore_types::EngineConfig;
use thiserror::Error;
use tracing::{debug, warn};

/// Environment variable overriding the config file location.
pub const CONFIG_PATH_ENV: &str = "STEPCORE_CONFIG_PATH";

/// Default file name of the engine configuration.
pub const CONFIG_FILE_NAME: &str = "config.yaml";

/// Directory name used under the platform config directory.
pub const CONFIG_DIR_NAME: &str = "stepcore";

/// Errors surfaced while reading an explicit config file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("config parse error: {0}")]
    Parse(#[from] serde_yaml::Error),
}

/// Loads the engine configuration from its default location.
pub fn load_config() -> EngineConfig {
    let path = default_config_path();
    match load_config_from(&path) {
        Ok(config) => config,
        Err(ConfigError::Io(error)) if error.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "no config file, using defaults");
            EngineConfig::default()
        }
        Err(error) => {
            warn!(path = %path.display(), error = %error, "ignoring unreadable config file");
            EngineConfig::default()
        }
    }
}

/// Reads and parses the config file at `path`.
pub fn load_config_from(path: &Path) -> Result<EngineConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    if content.trim().is_empty() {
        return Ok(EngineConfig::default());
    }
    Ok(serde_yaml::from_str(&content)?)
}

/// Resolves the config file location.
pub fn default_config_path() -> PathBuf {
    if let Ok(path) = env::var(CONFIG_PATH_ENV)
        && !path.trim().is_empty()
    {
        return expand_tilde_path(PathBuf::from(path));
    }

    config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(CONFIG_DIR_NAME)
        .join(CONFIG_FILE_NAME)
}

pub(crate) fn expand_tilde_path(path: PathBuf) -> PathBuf {
    if let Some(first) = path.components().next()
        && first.as_os_str() != "~"
    {
        return path;
    }

    let input = path.to_string_lossy();
    let trimmed = input.trim();
    if trimmed == "~" {
        return home_dir().unwrap_or_else(|| PathBuf::from("~"));
    }
    if let Some(rest) = trimmed.strip_prefix("~/") {
        return home_dir().unwrap_or_else(|| PathBuf::from("~")).join(rest);
    }
    PathBuf::from(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn reads_patch_keys_from_yaml() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join(CONFIG_FILE_NAME);
        fs::write(
            &path,
            "export:\n  patch_keys:\n    \"spec.containers[*].ports\": containerPort\n",
        )
        .expect("write config");

        let config = load_config_from(&path).expect("load config");
        assert_eq!(
            config.export.patch_keys.get("spec.containers[*].ports").map(String::as_str),
            Some("containerPort")
        );
    }

    #[test]
    fn empty_file_yields_defaults() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join(CONFIG_FILE_NAME);
        fs::write(&path, "\n").expect("write config");
        assert_eq!(load_config_from(&path).expect("load config"), EngineConfig::default());
    }

    #[test]
    fn malformed_file_is_a_parse_error() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join(CONFIG_FILE_NAME);
        fs::write(&path, "export: [not, a, map]\n").expect("write config");
        assert!(matches!(load_config_from(&path), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let dir = tempdir().expect("tempdir");
        assert!(matches!(
            load_config_from(&dir.path().join("absent.yaml")),
            Err(ConfigError::Io(_))
        ));
    }

    #[test]
    fn tilde_paths_expand_to_home() {
        let expanded = expand_tilde_path(PathBuf::from("~/stepcore/config.yaml"));
        if let Some(home) = home_dir() {
            assert_eq!(expanded, home.join("stepcore/config.yaml"));
        }
        assert_eq!(expand_tilde_path(PathBuf::from("/etc/stepcore.yaml")), PathBuf::from("/etc/stepcore.yaml"));
    }
}
