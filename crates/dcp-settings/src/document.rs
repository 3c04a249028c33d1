//! Settings files

use crate::codec::SettingsCodec;
use crate::entry::SettingsEntry;
use crate::error::SettingsError;
use dcp_status::TreeStatus;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Format version written by this crate
pub const FORMAT_VERSION: u32 = 1;

/// Settings file contents
///
/// Stored as JSON for `.json` files and YAML otherwise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettingsDocument {
    /// Format version
    pub version: u32,
    /// Records, root record first
    #[serde(default)]
    pub entries: Vec<SettingsEntry>,
}

impl Default for SettingsDocument {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl SettingsDocument {
    /// Create document of the current format version
    #[inline]
    #[must_use]
    pub fn new(entries: Vec<SettingsEntry>) -> Self {
        Self {
            version: FORMAT_VERSION,
            entries,
        }
    }

    /// Capture the decisions of `status`
    #[must_use]
    pub fn capture(codec: &SettingsCodec<'_>, status: &TreeStatus) -> Self {
        Self::new(codec.serialize(status))
    }

    /// Parse from YAML text
    ///
    /// # Errors
    /// Returns error if the text is malformed or of an unknown version
    pub fn from_yaml_str(text: &str) -> Result<Self, SettingsError> {
        serde_yaml::from_str::<Self>(text)?.checked()
    }

    /// Parse from JSON text
    ///
    /// # Errors
    /// Returns error if the text is malformed or of an unknown version
    pub fn from_json_str(text: &str) -> Result<Self, SettingsError> {
        serde_json::from_str::<Self>(text)?.checked()
    }

    /// Render as YAML
    ///
    /// # Errors
    /// Returns error if serialization fails
    pub fn to_yaml_string(&self) -> Result<String, SettingsError> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Render as pretty-printed JSON
    ///
    /// # Errors
    /// Returns error if serialization fails
    pub fn to_json_string(&self) -> Result<String, SettingsError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Load from file
    ///
    /// # Errors
    /// Returns error if the file cannot be read or parsed
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| SettingsError::io_error(path, e))?;
        let document = if is_json(path) {
            Self::from_json_str(&text)?
        } else {
            Self::from_yaml_str(&text)?
        };
        tracing::debug!(path = %path.display(), entries = document.entries.len(), "loaded settings");
        Ok(document)
    }

    /// Save to file, replacing existing contents
    ///
    /// # Errors
    /// Returns error if the document cannot be rendered or written
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), SettingsError> {
        let path = path.as_ref();
        let text = if is_json(path) {
            self.to_json_string()?
        } else {
            self.to_yaml_string()?
        };
        std::fs::write(path, text).map_err(|e| SettingsError::io_error(path, e))?;
        tracing::debug!(path = %path.display(), entries = self.entries.len(), "saved settings");
        Ok(())
    }

    fn checked(self) -> Result<Self, SettingsError> {
        if self.version == FORMAT_VERSION {
            Ok(self)
        } else {
            Err(SettingsError::UnsupportedVersion {
                found: self.version,
                expected: FORMAT_VERSION,
            })
        }
    }
}

fn is_json(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use dcp_status::CopyOrLink;

    fn sample() -> SettingsDocument {
        let mut tariff = SettingsEntry::root("Tariff 2024-01");
        tariff.owner_kind_id = Some("Home".to_string());
        tariff.role = Some("tariffs".to_string());
        tariff.copy_or_link = CopyOrLink::Link;
        SettingsDocument::new(vec![SettingsEntry::root("Home 2024-01"), tariff])
    }

    #[test]
    fn yaml_field_names() {
        let yaml = sample().to_yaml_string().unwrap();
        assert!(yaml.contains("version: 1"));
        assert!(yaml.contains("owner_kind_id: Home"));
        assert!(yaml.contains("link_type: link"));
        assert!(yaml.contains("copy_or_link: link"));
    }

    #[test]
    fn unknown_version_is_rejected() {
        let err = SettingsDocument::from_json_str(r#"{"version": 7, "entries": []}"#).unwrap_err();
        assert!(matches!(
            err,
            SettingsError::UnsupportedVersion { found: 7, expected: 1 }
        ));
    }

    #[test]
    fn save_and_load_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        for file in ["settings.json", "settings.yaml"] {
            let path = dir.path().join(file);
            sample().save(&path).unwrap();
            assert_eq!(SettingsDocument::load(&path).unwrap(), sample());
        }

        let json = std::fs::read_to_string(dir.path().join("settings.json")).unwrap();
        assert!(json.trim_start().starts_with('{'));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = SettingsDocument::load("/nonexistent/settings.yaml").unwrap_err();
        assert!(matches!(err, SettingsError::Io { .. }));
    }
}
