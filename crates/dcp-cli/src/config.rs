//! Configuration file
//!
//! ```toml
//! policy = "smart"
//!
//! [preview]
//! target_package = "new.pkg"
//! search_pattern = "V1"
//! replace_text = "V2"
//!
//! [naming]
//! strategy = "date-based"
//! separator = " "
//! date_format = "%Y-%m"
//! ```

use anyhow::Context;
use dcp_model::NamingConfig;
use dcp_preview::PreviewOptions;
use dcp_status::DefaultPolicy;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Settings read from a TOML file, overridden by command line flags
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// Default copy-or-link policy
    pub policy: DefaultPolicy,
    /// Target package and renaming
    pub preview: PreviewOptions,
    /// Naming strategy
    pub naming: NamingConfig,
}

impl CliConfig {
    /// Parse from TOML text
    ///
    /// # Errors
    /// Returns error if the text is not a valid configuration
    pub fn from_toml_str(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// Load from file
    ///
    /// # Errors
    /// Returns error if the file cannot be read or parsed
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        Self::from_toml_str(&text).with_context(|| format!("parsing config {}", path.display()))
    }

    /// Load from `path` if given, defaults otherwise
    ///
    /// # Errors
    /// Returns error if the file cannot be read or parsed
    pub fn load_or_default(path: Option<&Path>) -> anyhow::Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        assert_eq!(CliConfig::from_toml_str("").unwrap(), CliConfig::default());
    }

    #[test]
    fn unknown_policy_is_rejected() {
        assert!(CliConfig::from_toml_str("policy = \"sometimes\"").is_err());
    }
}
