//! Target file locators

use dcp_model::{ObjectKind, PackagePath};
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};

/// Where a copied object will be written
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TargetFile {
    /// Target package
    pub package: PackagePath,
    /// New unqualified name
    pub name: String,
    /// Kind of the copied object
    pub kind: ObjectKind,
}

impl TargetFile {
    /// Create new target
    #[inline]
    #[must_use]
    pub fn new(package: PackagePath, name: impl Into<String>, kind: ObjectKind) -> Self {
        Self {
            package,
            name: name.into(),
            kind,
        }
    }

    /// Package-qualified new name
    #[inline]
    #[must_use]
    pub fn qualified_name(&self) -> String {
        self.package.qualify(&self.name)
    }

    /// File name including extension
    #[inline]
    #[must_use]
    pub fn file_name(&self) -> String {
        format!("{}.{}", self.name, self.kind.file_extension())
    }
}

impl Display for TargetFile {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.qualified_name())
    }
}
