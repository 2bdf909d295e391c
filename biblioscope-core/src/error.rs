//! Error types for the Biblioscope explorer core.
//!
//! Uses `thiserror` for the public error type. Failures fall into three
//! groups: transport failures (the request did not complete), domain errors
//! (the server answered but refused the query), and local errors raised by
//! the explorer itself (bad chart input, stale candidate index, config).

use std::path::PathBuf;

/// Top-level error type for the explorer core.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ExplorerError {
    #[error("Request failed: {message}")]
    Transport { message: String },

    #[error("Request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    /// The server responded with `{"error": "..."}`.
    #[error("{message}")]
    Domain { message: String },

    #[error("Response decode error: {message}")]
    Decode { message: String },

    #[error("Chart data mismatch: {labels} labels for {values} values")]
    InvalidChartData { labels: usize, values: usize },

    #[error("No suggestion at index {index}")]
    NoSuchCandidate { index: usize },

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl ExplorerError {
    /// Whether the server signalled a semantic problem with the request.
    pub fn is_domain(&self) -> bool {
        matches!(self, ExplorerError::Domain { .. })
    }

    /// Whether the request never produced a usable response.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            ExplorerError::Transport { .. }
                | ExplorerError::Timeout { .. }
                | ExplorerError::Decode { .. }
        )
    }

    /// Text shown in the blocking notification.
    ///
    /// Domain errors carry the server's message verbatim; everything else
    /// collapses to a generic "Failed to fetch" line naming what was loading.
    pub fn user_message(&self, what: &str) -> String {
        match self {
            ExplorerError::Domain { message } => message.clone(),
            _ => format!("Failed to fetch {}", what),
        }
    }
}

impl From<serde_json::Error> for ExplorerError {
    fn from(err: serde_json::Error) -> Self {
        ExplorerError::Decode {
            message: err.to_string(),
        }
    }
}

/// Errors from the configuration system.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("Invalid configuration: {message}")]
    Invalid { message: String },

    #[error("Configuration parse error: {message}")]
    ParseError { message: String },
}

/// A type alias for results using `ExplorerError`.
pub type Result<T> = std::result::Result<T, ExplorerError>;
