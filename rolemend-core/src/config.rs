//! Run configuration: where the two stores live.
//!
//! Loaded from a YAML file, with environment overrides so scheduled jobs can
//! point at other stores without editing the file:
//!
//! ```yaml
//! document_store: /var/lib/rolemend/documents.json
//! relational_store: /var/lib/rolemend/role_sync.db
//! ```
//!
//! `ROLEMEND_DOC_STORE` and `ROLEMEND_DB` override the respective fields.
//! If both variables are set the config file may be absent entirely.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Environment variable overriding the document store location.
pub const ENV_DOC_STORE: &str = "ROLEMEND_DOC_STORE";
/// Environment variable overriding the relational store location.
pub const ENV_RELATIONAL_STORE: &str = "ROLEMEND_DB";

/// Locations of the two backing stores.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Path of the document store (authoritative).
    pub document_store: PathBuf,
    /// Path of the relational projection database.
    pub relational_store: PathBuf,
}

#[derive(Debug, Default, Deserialize)]
struct PartialConfig {
    document_store: Option<PathBuf>,
    relational_store: Option<PathBuf>,
}

/// `<home>/.rolemend/config.yaml` — pure, no I/O.
pub fn default_path_at(home: &Path) -> PathBuf {
    home.join(".rolemend").join("config.yaml")
}

/// Load configuration from `path`, then apply environment overrides.
///
/// A missing file is only an error when the environment does not supply
/// both store locations.
pub fn load(path: &Path) -> Result<Config, ConfigError> {
    let from_env = env_overrides();

    let from_file = if path.exists() {
        let contents = std::fs::read_to_string(path)?;
        serde_yaml::from_str::<PartialConfig>(&contents).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            source: e,
        })?
    } else {
        PartialConfig::default()
    };

    let document_store = from_env
        .document_store
        .or(from_file.document_store)
        .ok_or_else(|| ConfigError::ConfigNotFound {
            path: path.to_path_buf(),
        })?;
    let relational_store = from_env
        .relational_store
        .or(from_file.relational_store)
        .ok_or_else(|| ConfigError::ConfigNotFound {
            path: path.to_path_buf(),
        })?;

    Ok(Config {
        document_store,
        relational_store,
    })
}

fn env_overrides() -> PartialConfig {
    PartialConfig {
        document_store: std::env::var_os(ENV_DOC_STORE).map(PathBuf::from),
        relational_store: std::env::var_os(ENV_RELATIONAL_STORE).map(PathBuf::from),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
