//! User input for a preview run

use dcp_model::PackagePath;
use serde::{Deserialize, Serialize};

/// Target location and renaming rules
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreviewOptions {
    /// Package prepended to the stripped source packages
    pub target_package: PackagePath,
    /// Regular expression applied to kind-ids (or whole names)
    pub search_pattern: String,
    /// Replacement for matches of `search_pattern`
    pub replace_text: String,
    /// Version id of the copies, `None` keeps each object's version id
    pub version_id: Option<String>,
}

impl PreviewOptions {
    /// Create options copying into `target_package`
    #[inline]
    #[must_use]
    pub fn new(target_package: PackagePath) -> Self {
        Self {
            target_package,
            ..Self::default()
        }
    }

    /// Set target package
    #[inline]
    #[must_use]
    pub fn with_target_package(mut self, target_package: PackagePath) -> Self {
        self.target_package = target_package;
        self
    }

    /// Set search pattern and replacement
    #[inline]
    #[must_use]
    pub fn with_replacement(
        mut self,
        search_pattern: impl Into<String>,
        replace_text: impl Into<String>,
    ) -> Self {
        self.search_pattern = search_pattern.into();
        self.replace_text = replace_text.into();
        self
    }

    /// Set version id
    #[inline]
    #[must_use]
    pub fn with_version_id(mut self, version_id: impl Into<String>) -> Self {
        self.version_id = Some(version_id.into());
        self
    }

    /// Whether a replacement was requested
    #[inline]
    #[must_use]
    pub fn has_replacement(&self) -> bool {
        !self.search_pattern.is_empty() && !self.replace_text.is_empty()
    }
}
