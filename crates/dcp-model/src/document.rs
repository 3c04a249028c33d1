//! Serializable model description
//!
//! A [`ModelDocument`] lists objects, links and table usages; links and table
//! usages refer to objects by qualified name. It can be read from YAML or JSON
//! and converted into a [`DomainModel`].
//!
//! ```yaml
//! objects:
//!   - { kind: product_cmpt, package: old.pkg, name: "Root 2024-01" }
//!   - { kind: product_cmpt, package: old.pkg, name: "Child 2024-01" }
//! links:
//!   - { owner: "old.pkg.Root 2024-01", role: covers, kind: composition, target: "old.pkg.Child 2024-01" }
//! ```

use crate::object::{DomainModel, LinkKind, ModelError, ObjectId, ObjectKind};
use crate::path::PackagePath;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Storage root used when an object does not name one
pub const DEFAULT_STORAGE_ROOT: &str = "src";

/// Serializable description of a [`DomainModel`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelDocument {
    /// Objects in declaration order
    #[serde(default)]
    pub objects: Vec<ObjectEntry>,
    /// Links between product components
    #[serde(default)]
    pub links: Vec<LinkEntry>,
    /// Table usages of product components
    #[serde(default)]
    pub table_usages: Vec<TableUsageEntry>,
}

/// One object of a [`ModelDocument`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectEntry {
    /// Object kind
    pub kind: ObjectKind,
    /// Package
    #[serde(default)]
    pub package: PackagePath,
    /// Unqualified name
    pub name: String,
    /// Storage root name
    #[serde(default = "default_storage_root")]
    pub storage_root: String,
}

/// One link of a [`ModelDocument`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkEntry {
    /// Qualified name of the owning component
    pub owner: String,
    /// Association role
    pub role: String,
    /// Link kind
    pub kind: LinkKind,
    /// Qualified name of the target, absent for a dangling link
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
}

/// One table usage of a [`ModelDocument`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableUsageEntry {
    /// Qualified name of the owning component
    pub owner: String,
    /// Table usage role
    pub role: String,
    /// Qualified name of the table contents, absent if unresolved
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table: Option<String>,
}

fn default_storage_root() -> String {
    DEFAULT_STORAGE_ROOT.to_string()
}

impl ModelDocument {
    /// Parse from YAML text
    ///
    /// # Errors
    /// Returns error if the text is not a valid model document
    pub fn from_yaml_str(text: &str) -> Result<Self, DocumentError> {
        Ok(serde_yaml::from_str(text)?)
    }

    /// Parse from JSON text
    ///
    /// # Errors
    /// Returns error if the text is not a valid model document
    pub fn from_json_str(text: &str) -> Result<Self, DocumentError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Load from file, choosing JSON for `.json` and YAML otherwise
    ///
    /// # Errors
    /// Returns error if the file cannot be read or parsed
    pub fn load(path: impl AsRef<Path>) -> Result<Self, DocumentError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| DocumentError::io_error(path, e))?;
        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        if is_json {
            Self::from_json_str(&text)
        } else {
            Self::from_yaml_str(&text)
        }
    }

    /// Build the model
    ///
    /// # Errors
    /// Returns error on duplicate objects, unknown names or kind mismatches
    pub fn to_model(&self) -> Result<DomainModel, ModelError> {
        let mut model = DomainModel::new();
        for object in &self.objects {
            model.add_object(
                object.kind,
                object.package.clone(),
                object.name.clone(),
                object.storage_root.clone(),
            )?;
        }

        for link in &self.links {
            let owner = lookup_product_cmpt(&model, &link.owner)?;
            let target = link
                .target
                .as_deref()
                .map(|name| lookup_product_cmpt(&model, name))
                .transpose()?;
            model.add_link(owner, link.role.clone(), link.kind, target)?;
        }

        for usage in &self.table_usages {
            let owner = lookup_product_cmpt(&model, &usage.owner)?;
            let table = usage
                .table
                .as_deref()
                .map(|name| {
                    model
                        .find(ObjectKind::TableContents, name)
                        .ok_or_else(|| ModelError::UnknownName(name.to_string()))
                })
                .transpose()?;
            model.add_table_usage(owner, usage.role.clone(), table)?;
        }

        tracing::debug!(
            objects = model.object_count(),
            parts = model.part_count(),
            "built domain model from document"
        );
        Ok(model)
    }
}

fn lookup_product_cmpt(model: &DomainModel, qualified: &str) -> Result<ObjectId, ModelError> {
    model
        .find_product_cmpt(qualified)
        .ok_or_else(|| ModelError::UnknownName(qualified.to_string()))
}

impl TryFrom<&ModelDocument> for DomainModel {
    type Error = ModelError;

    fn try_from(document: &ModelDocument) -> Result<Self, Self::Error> {
        document.to_model()
    }
}

/// Errors reading a model document
#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    /// IO error during file read
    #[error("io error reading {path}: {source}")]
    Io {
        /// File being read
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Malformed YAML
    #[error("invalid YAML model: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Malformed JSON
    #[error("invalid JSON model: {0}")]
    Json(#[from] serde_json::Error),

    /// Document describes an inconsistent model
    #[error(transparent)]
    Model(#[from] ModelError),
}

impl DocumentError {
    /// Create IO error for path
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::PartKind;

    const YAML: &str = r#"
objects:
  - { kind: product_cmpt, package: old.pkg, name: "Root 2024-01" }
  - { kind: product_cmpt, package: old.pkg, name: "Child 2024-01", storage_root: lib }
  - { kind: table_contents, package: old.pkg, name: Rates }
links:
  - { owner: "old.pkg.Root 2024-01", role: covers, kind: composition, target: "old.pkg.Child 2024-01" }
  - { owner: "old.pkg.Root 2024-01", role: gone, kind: association }
table_usages:
  - { owner: "old.pkg.Child 2024-01", role: rates, table: old.pkg.Rates }
"#;

    #[test]
    fn yaml_document_builds_model() {
        let document = ModelDocument::from_yaml_str(YAML).unwrap();
        let model = document.to_model().unwrap();

        assert_eq!(model.object_count(), 3);
        assert_eq!(model.part_count(), 3);

        let root = model.find_product_cmpt("old.pkg.Root 2024-01").unwrap();
        assert_eq!(model.object(root).unwrap().storage_root, DEFAULT_STORAGE_ROOT);
        let child = model.find_product_cmpt("old.pkg.Child 2024-01").unwrap();
        assert_eq!(model.object(child).unwrap().storage_root, "lib");

        let dangling = model.parts_of(root).find(|p| p.role == "gone").unwrap();
        assert_eq!(dangling.target, None);

        let usage = model.parts_of(child).next().unwrap();
        assert_eq!(usage.kind, PartKind::TableUsage);
        assert!(usage.target.is_some());
    }

    #[test]
    fn unknown_target_is_an_error() {
        let json = r#"{
            "objects": [{ "kind": "product_cmpt", "package": "p", "name": "A" }],
            "links": [{ "owner": "p.A", "role": "r", "kind": "composition", "target": "p.B" }]
        }"#;
        let document = ModelDocument::from_json_str(json).unwrap();
        assert_eq!(
            document.to_model().unwrap_err(),
            ModelError::UnknownName("p.B".to_string())
        );
    }

    #[test]
    fn invalid_package_is_rejected_on_parse() {
        let yaml = "objects:\n  - { kind: product_cmpt, package: 'a..b', name: A }\n";
        assert!(matches!(
            ModelDocument::from_yaml_str(yaml),
            Err(DocumentError::Yaml(_))
        ));
    }

    #[test]
    fn load_picks_format_from_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");
        let document = ModelDocument::from_yaml_str(YAML).unwrap();
        std::fs::write(&path, serde_json::to_string(&document).unwrap()).unwrap();

        let loaded = ModelDocument::load(&path).unwrap();
        assert_eq!(loaded, document);
    }
}
