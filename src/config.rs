//! Forge configuration.
//!
//! Loaded from `~/.forge/config.toml`. Every key is optional; a missing file
//! means all defaults.

use std::fmt;
use std::fs;
use std::io;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::model::AgentRole;

/// How the platform is being run. Reported, not acted on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    #[default]
    Development,
    Testing,
    Production,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Development => "development",
            Self::Testing => "testing",
            Self::Production => "production",
        })
    }
}

/// Which backend holds the shard document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreKind {
    #[default]
    Json,
    Sqlite,
}

/// Forge configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct Config {
    pub mode: Mode,

    /// The acting agent when neither `--as` nor `FORGE_AGENT` is set.
    pub default_agent: Option<AgentRole>,

    pub shard_store: StoreKind,

    /// Whether assigning a pending shard requires its dependencies to be
    /// completed.
    pub enforce_dependencies: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            mode: Mode::default(),
            default_agent: None,
            shard_store: StoreKind::default(),
            enforce_dependencies: true,
        }
    }
}

impl Config {
    /// Load config from `~/.forge/config.toml`.
    /// A missing file (or home directory) yields the defaults.
    pub fn load() -> Result<Self, String> {
        let Some(path) = Self::path() else {
            return Ok(Self::default());
        };

        let contents = match fs::read_to_string(&path) {
            Ok(s) => s,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(format!("failed to read {}: {e}", path.display())),
        };

        Self::from_toml(&contents).map_err(|e| format!("invalid config at {}: {e}", path.display()))
    }

    pub fn from_toml(contents: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(contents)
    }

    /// The config file path: `~/.forge/config.toml`.
    pub fn path() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(".forge").join("config.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_is_all_defaults() {
        let config = Config::from_toml("").unwrap();

        assert_eq!(config, Config::default());
        assert!(config.enforce_dependencies);
        assert_eq!(config.shard_store, StoreKind::Json);
    }

    #[test]
    fn reads_kebab_case_keys() {
        let config = Config::from_toml(
            r#"
            mode = "production"
            default-agent = "security_sentinel"
            shard-store = "sqlite"
            enforce-dependencies = false
            "#,
        )
        .unwrap();

        assert_eq!(config.mode, Mode::Production);
        assert_eq!(config.default_agent, Some(AgentRole::SecuritySentinel));
        assert_eq!(config.shard_store, StoreKind::Sqlite);
        assert!(!config.enforce_dependencies);
    }

    #[test]
    fn unknown_agent_is_rejected() {
        assert!(Config::from_toml(r#"default-agent = "intern""#).is_err());
    }
}
