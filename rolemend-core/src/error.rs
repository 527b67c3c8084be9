//! Error types for rolemend-core.

use std::path::PathBuf;

use thiserror::Error;

/// All errors that can arise while loading run configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Underlying I/O failure (file not found, permission denied, etc.).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parse error on load — includes file path and line context from serde_yaml.
    #[error("failed to parse config at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// The config file did not exist and no environment overrides were set.
    #[error("config not found at {path}; set ROLEMEND_DOC_STORE and ROLEMEND_DB or provide --config")]
    ConfigNotFound { path: PathBuf },
}
