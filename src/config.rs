//! Engine configuration loaded from TOML.

use crate::error::{EngineError, Result};
use crate::types::SearchKey;
use crate::worker::{DEFAULT_DEBOUNCE_DELAY, DEFAULT_DEBOUNCE_THRESHOLD};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Tunables shared by every session of an [`Engine`](crate::Engine).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Scoring fields in priority order.
    pub keys: Vec<SearchKey>,
    /// Working-set size above which ranking is debounced.
    pub debounce_threshold: usize,
    /// Quiet period before a debounced ranking pass, in milliseconds.
    pub debounce_ms: u64,
    /// Command characters installed on every new scope.
    pub command_chars: Vec<char>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            keys: vec![SearchKey::Name],
            debounce_threshold: DEFAULT_DEBOUNCE_THRESHOLD,
            debounce_ms: u64::try_from(DEFAULT_DEBOUNCE_DELAY.as_millis()).unwrap_or(100),
            command_chars: Vec::new(),
        }
    }
}

impl EngineConfig {
    pub fn debounce_delay(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn from_toml_str(content: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Reads and parses a TOML config file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config at {}", path.display()))?;
        let config = Self::from_toml_str(&content).map_err(|source| EngineError::Config {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!("Loaded engine config from {}: {:?}", path.display(), config);
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert2::check;
    use std::io::Write;

    #[test]
    fn defaults_match_documented_values() {
        let config = EngineConfig::default();
        check!(config.keys == vec![SearchKey::Name]);
        check!(config.debounce_threshold == 5000);
        check!(config.debounce_delay() == Duration::from_millis(100));
        check!(config.command_chars.is_empty());
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config = EngineConfig::from_toml_str(
            r#"
            keys = ["name", "description", "kenv"]
            command_chars = ["/"]
            "#,
        )
        .unwrap();
        check!(config.keys == vec![SearchKey::Name, SearchKey::Description, SearchKey::Kenv]);
        check!(config.command_chars == vec!['/']);
        check!(config.debounce_threshold == 5000);
    }

    #[test]
    fn unknown_fields_are_rejected() {
        check!(EngineConfig::from_toml_str("threshold = 3").is_err());
    }

    #[test]
    fn load_reports_path_on_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "debounce_ms = \"soon\"").unwrap();
        let err = EngineConfig::load(file.path()).unwrap_err();
        check!(err.to_string().contains(&file.path().display().to_string()));
    }

    #[test]
    fn load_reads_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "debounce_threshold = 10\ndebounce_ms = 5").unwrap();
        let config = EngineConfig::load(file.path()).unwrap();
        check!(config.debounce_threshold == 10);
        check!(config.debounce_delay() == Duration::from_millis(5));
    }
}
