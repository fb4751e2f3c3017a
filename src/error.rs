//! Error handling types and utilities.

use crate::types::SessionId;
use std::path::PathBuf;

/// A specialized Result type for fallible I/O-facing operations.
///
/// This is an alias for `anyhow::Result` with context added via `.context()` and
/// `.with_context()` methods throughout the codebase.
pub type Result<T> = anyhow::Result<T>;

/// Errors surfaced to callers of the [`Engine`](crate::Engine).
///
/// Classification and ranking never fail; these only cover malformed inputs
/// from collaborators and calls against sessions that do not exist.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// No choices were ever set for this session.
    #[error("Unknown session '{0}'")]
    UnknownSession(SessionId),
    /// A choice list could not be decoded.
    #[error("Invalid choice list: {0}")]
    InvalidChoices(#[source] serde_json::Error),
    /// An action-flags description could not be decoded.
    #[error("Invalid flags description: {0}")]
    InvalidFlags(#[source] serde_json::Error),
    /// The engine config file could not be parsed.
    #[error("Failed to parse config at {}: {source}", path.display())]
    Config {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}
