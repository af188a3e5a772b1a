//! Operator configuration file (`tokenforge.toml`)

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokenforge_ledger::TokenConfig;

/// Top-level CLI configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct CliConfig {
    /// Deployment parameters
    #[serde(default)]
    pub token: TokenConfig,

    /// Where the ledger snapshot lives
    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl CliConfig {
    /// Read `path`, falling back to defaults when it does not exist
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config: Self = toml::from_str(&content)
            .with_context(|| format!("parsing config {}", path.display()))?;
        config.token.validate()?;
        Ok(config)
    }
}

/// Snapshot storage settings
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Ledger state file
    #[serde(default = "default_state_path")]
    pub state_path: PathBuf,
}

fn default_state_path() -> PathBuf {
    PathBuf::from("tokenforge.state")
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            state_path: default_state_path(),
        }
    }
}

/// Logging configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level, used when `RUST_LOG` is unset
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: "text" or "json"
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "warn".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = CliConfig::load(&dir.path().join("absent.toml")).unwrap();

        assert_eq!(config.token.symbol, "TFG");
        assert_eq!(config.storage.state_path, PathBuf::from("tokenforge.state"));
        assert_eq!(config.logging.format, "text");
    }

    #[test]
    fn test_load_sections() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tokenforge.toml");
        std::fs::write(
            &path,
            r#"
            [token]
            name = "Forge Test"
            max_supply = "2000000000"

            [storage]
            state_path = "/var/lib/tokenforge/ledger.state"

            [logging]
            level = "debug"
            format = "json"
            "#,
        )
        .unwrap();

        let config = CliConfig::load(&path).unwrap();
        assert_eq!(config.token.name, "Forge Test");
        assert_eq!(config.token.symbol, "TFG");
        assert_eq!(config.storage.state_path, PathBuf::from("/var/lib/tokenforge/ledger.state"));
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.format, "json");
    }

    #[test]
    fn test_invalid_token_section_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tokenforge.toml");
        std::fs::write(&path, "[token]\ninitial_supply = \"20\"\nmax_supply = \"10\"\n").unwrap();

        assert!(CliConfig::load(&path).is_err());
    }
}
