//! Runtime configuration for the `cplan` binary.
//!
//! Only process-level knobs live here. The display unit and daily target are
//! user settings kept in the store.

use std::path::{Path, PathBuf};

use crate::error::ConfigError;

/// Environment variable naming the data directory.
pub const DATA_DIR_ENV: &str = "CPLAN_DIR";
/// Environment variable holding the log filter directive.
pub const LOG_ENV: &str = "CPLAN_LOG";

const DEFAULT_DIR_NAME: &str = ".cplan";
const DEFAULT_LOG_FILTER: &str = "info";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub data_dir: PathBuf,
    pub log_filter: String,
}

impl Config {
    /// Resolve the data directory (`--data-dir`, then `CPLAN_DIR`, then
    /// `$HOME/.cplan`) and create it.
    ///
    /// clap already folds `CPLAN_DIR` into the flag; the environment is read
    /// again here so library callers get the same precedence.
    pub fn resolve(cli_dir: Option<&Path>) -> Result<Self, ConfigError> {
        let data_dir = match cli_dir {
            Some(dir) => dir.to_path_buf(),
            None => default_data_dir(
                std::env::var_os(DATA_DIR_ENV).map(PathBuf::from),
                std::env::var_os("HOME").map(PathBuf::from),
            )?,
        };

        std::fs::create_dir_all(&data_dir).map_err(|source| ConfigError::CreateDir {
            path: data_dir.clone(),
            source,
        })?;

        let log_filter = std::env::var(LOG_ENV)
            .ok()
            .filter(|f| !f.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string());

        Ok(Config { data_dir, log_filter })
    }

    pub fn log_dir(&self) -> PathBuf {
        self.data_dir.join("logs")
    }
}

fn default_data_dir(env_dir: Option<PathBuf>, home: Option<PathBuf>) -> Result<PathBuf, ConfigError> {
    if let Some(dir) = env_dir.filter(|d| !d.as_os_str().is_empty()) {
        return Ok(dir);
    }
    home.filter(|h| !h.as_os_str().is_empty())
        .map(|h| h.join(DEFAULT_DIR_NAME))
        .ok_or(ConfigError::NoDataDir)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_dir_wins_over_home() {
        let dir = default_data_dir(Some("/tmp/plans".into()), Some("/home/u".into())).unwrap();
        assert_eq!(dir, PathBuf::from("/tmp/plans"));
    }

    #[test]
    fn test_home_fallback() {
        let dir = default_data_dir(None, Some("/home/u".into())).unwrap();
        assert_eq!(dir, PathBuf::from("/home/u/.cplan"));
        assert!(matches!(default_data_dir(None, None), Err(ConfigError::NoDataDir)));
    }

    #[test]
    fn test_resolve_creates_explicit_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let target = tmp.path().join("nested").join("data");
        let config = Config::resolve(Some(&target)).unwrap();
        assert!(target.is_dir());
        assert_eq!(config.log_dir(), target.join("logs"));
    }
}
