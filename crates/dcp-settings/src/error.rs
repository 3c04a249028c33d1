//! Settings errors

use dcp_status::StatusError;
use std::path::PathBuf;

/// Errors reading, writing or applying settings
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    /// IO error during file read or write
    #[error("io error on {path}: {source}")]
    Io {
        /// File being read or written
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Malformed YAML
    #[error("invalid YAML settings: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Malformed JSON
    #[error("invalid JSON settings: {0}")]
    Json(#[from] serde_json::Error),

    /// Document written by an unknown format version
    #[error("unsupported settings version {found}, expected {expected}")]
    UnsupportedVersion {
        /// Version in the document
        found: u32,
        /// Version this crate writes
        expected: u32,
    },

    /// Resolved decision could not be applied
    #[error(transparent)]
    Status(#[from] StatusError),
}

impl SettingsError {
    /// Create IO error for path
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
