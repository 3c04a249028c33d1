//! Domain objects, parts and the model that owns them
//!
//! A [`DomainModel`] is the source side of a deep copy: product components,
//! templates and table contents ([`DomainObject`]) plus the [`Part`]s that
//! connect them (links between components and table usages).

use crate::path::PackagePath;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt::{self, Display, Formatter};

/// Identity of a domain object within one [`DomainModel`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObjectId(u32);

impl ObjectId {
    /// Raw index of the object
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl Display for ObjectId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "object#{}", self.0)
    }
}

/// Identity of a part (link or table usage) within one [`DomainModel`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PartId(u32);

impl PartId {
    /// Raw index of the part
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl Display for PartId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "part#{}", self.0)
    }
}

/// Kind of a copyable object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectKind {
    /// Product component
    ProductCmpt,

    /// Product template
    ProductTemplate,

    /// Table contents
    TableContents,
}

impl ObjectKind {
    /// File extension of source files of this kind (without dot)
    #[inline]
    #[must_use]
    pub const fn file_extension(self) -> &'static str {
        match self {
            Self::ProductCmpt => "ipsproduct",
            Self::ProductTemplate => "ipstemplate",
            Self::TableContents => "ipstablecontents",
        }
    }

    /// Whether names of this kind go through the naming strategy
    #[inline]
    #[must_use]
    pub const fn uses_naming_strategy(self) -> bool {
        matches!(self, Self::ProductCmpt | Self::ProductTemplate)
    }

    /// Whether objects of this kind can own links and table usages
    #[inline]
    #[must_use]
    pub const fn is_product_cmpt(self) -> bool {
        matches!(self, Self::ProductCmpt | Self::ProductTemplate)
    }
}

impl Display for ObjectKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::ProductCmpt => "product component",
            Self::ProductTemplate => "product template",
            Self::TableContents => "table contents",
        };
        f.write_str(name)
    }
}

/// A copyable object of the source model
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainObject {
    /// Identity within the model
    pub id: ObjectId,
    /// Object kind
    pub kind: ObjectKind,
    /// Package the object lives in
    pub package: PackagePath,
    /// Unqualified name (for product components including the version id)
    pub name: String,
    /// Name of the storage root (source folder / archive) holding the object
    pub storage_root: String,
}

impl DomainObject {
    /// Package-qualified name
    #[inline]
    #[must_use]
    pub fn qualified_name(&self) -> String {
        self.package.qualify(&self.name)
    }

    /// File name of the object's source file
    #[inline]
    #[must_use]
    pub fn file_name(&self) -> String {
        format!("{}.{}", self.name, self.kind.file_extension())
    }
}

/// Kind of a link between product components
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkKind {
    /// Master-to-detail composition
    Composition,

    /// Shared aggregation
    Aggregation,

    /// Plain association (no ownership)
    Association,
}

impl LinkKind {
    /// Pure associations default to linking rather than copying
    #[inline]
    #[must_use]
    pub const fn is_association(self) -> bool {
        matches!(self, Self::Association)
    }
}

/// What a part is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PartKind {
    /// Link to another product component
    Link(LinkKind),

    /// Usage of a table contents
    TableUsage,
}

impl PartKind {
    /// Whether this part is a pure association link
    #[inline]
    #[must_use]
    pub const fn is_association(self) -> bool {
        matches!(self, Self::Link(kind) if kind.is_association())
    }
}

/// Part of an owning object: a link or a table usage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Part {
    /// Identity within the model
    pub id: PartId,
    /// Object owning this part
    pub owner: ObjectId,
    /// Association or table-usage role name
    pub role: String,
    /// Link or table usage
    pub kind: PartKind,
    /// Referenced object, `None` if it cannot be resolved
    pub target: Option<ObjectId>,
}

/// Answers whether a source file already exists
///
/// Implemented by [`DomainModel`]; callers may substitute their own view of
/// the target workspace.
pub trait SourceFiles: Send + Sync {
    /// Check whether a file for `name` of `kind` exists in `package`
    fn exists(&self, package: &PackagePath, name: &str, kind: ObjectKind) -> bool;
}

/// Source model: objects and their parts
#[derive(Debug, Clone, Default)]
pub struct DomainModel {
    objects: Vec<DomainObject>,
    parts: Vec<Part>,
    parts_by_owner: HashMap<ObjectId, Vec<PartId>>,
    by_file: HashMap<(ObjectKind, String), ObjectId>,
}

impl DomainModel {
    /// Create empty model
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an object
    ///
    /// # Errors
    /// Returns error if an object of the same kind and qualified name exists
    pub fn add_object(
        &mut self,
        kind: ObjectKind,
        package: PackagePath,
        name: impl Into<String>,
        storage_root: impl Into<String>,
    ) -> Result<ObjectId, ModelError> {
        let name = name.into();
        if name.is_empty() {
            return Err(ModelError::EmptyName);
        }
        let qualified = package.qualify(&name);
        let file_key = (kind, qualified.clone());
        if self.by_file.contains_key(&file_key) {
            return Err(ModelError::DuplicateObject { kind, qualified });
        }

        let id = ObjectId(next_index(self.objects.len()));
        self.objects.push(DomainObject {
            id,
            kind,
            package,
            name,
            storage_root: storage_root.into(),
        });
        self.by_file.insert(file_key, id);
        Ok(id)
    }

    /// Add a link from `owner` to `target`
    ///
    /// # Errors
    /// Returns error if either end is unknown or not a product component
    pub fn add_link(
        &mut self,
        owner: ObjectId,
        role: impl Into<String>,
        kind: LinkKind,
        target: Option<ObjectId>,
    ) -> Result<PartId, ModelError> {
        self.require_product_cmpt(owner)?;
        if let Some(target) = target {
            self.require_product_cmpt(target)?;
        }
        Ok(self.push_part(owner, role.into(), PartKind::Link(kind), target))
    }

    /// Add a table usage of `owner` referring to `table`
    ///
    /// # Errors
    /// Returns error if the owner is not a product component or the table is
    /// not a table contents
    pub fn add_table_usage(
        &mut self,
        owner: ObjectId,
        role: impl Into<String>,
        table: Option<ObjectId>,
    ) -> Result<PartId, ModelError> {
        self.require_product_cmpt(owner)?;
        if let Some(table) = table {
            let object = self.object(table).ok_or(ModelError::UnknownObject(table))?;
            if object.kind != ObjectKind::TableContents {
                return Err(ModelError::UnexpectedKind {
                    qualified: object.qualified_name(),
                    expected: ObjectKind::TableContents,
                    actual: object.kind,
                });
            }
        }
        Ok(self.push_part(owner, role.into(), PartKind::TableUsage, table))
    }

    fn push_part(
        &mut self,
        owner: ObjectId,
        role: String,
        kind: PartKind,
        target: Option<ObjectId>,
    ) -> PartId {
        let id = PartId(next_index(self.parts.len()));
        self.parts.push(Part {
            id,
            owner,
            role,
            kind,
            target,
        });
        self.parts_by_owner.entry(owner).or_default().push(id);
        id
    }

    fn require_product_cmpt(&self, id: ObjectId) -> Result<(), ModelError> {
        let object = self.object(id).ok_or(ModelError::UnknownObject(id))?;
        if object.kind.is_product_cmpt() {
            Ok(())
        } else {
            Err(ModelError::UnexpectedKind {
                qualified: object.qualified_name(),
                expected: ObjectKind::ProductCmpt,
                actual: object.kind,
            })
        }
    }

    /// Lookup object by id
    #[inline]
    #[must_use]
    pub fn object(&self, id: ObjectId) -> Option<&DomainObject> {
        self.objects.get(id.index())
    }

    /// Lookup part by id
    #[inline]
    #[must_use]
    pub fn part(&self, id: PartId) -> Option<&Part> {
        self.parts.get(id.index())
    }

    /// Parts owned by `owner`, in insertion order
    pub fn parts_of(&self, owner: ObjectId) -> impl Iterator<Item = &Part> {
        self.parts_by_owner
            .get(&owner)
            .into_iter()
            .flatten()
            .filter_map(|id| self.part(*id))
    }

    /// Find object by kind and qualified name
    #[must_use]
    pub fn find(&self, kind: ObjectKind, qualified: &str) -> Option<ObjectId> {
        self.by_file.get(&(kind, qualified.to_string())).copied()
    }

    /// Find a product component or template by qualified name
    #[must_use]
    pub fn find_product_cmpt(&self, qualified: &str) -> Option<ObjectId> {
        self.find(ObjectKind::ProductCmpt, qualified)
            .or_else(|| self.find(ObjectKind::ProductTemplate, qualified))
    }

    /// All objects
    pub fn objects(&self) -> impl Iterator<Item = &DomainObject> {
        self.objects.iter()
    }

    /// Number of objects
    #[inline]
    #[must_use]
    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    /// Number of parts
    #[inline]
    #[must_use]
    pub fn part_count(&self) -> usize {
        self.parts.len()
    }
}

impl SourceFiles for DomainModel {
    fn exists(&self, package: &PackagePath, name: &str, kind: ObjectKind) -> bool {
        self.by_file.contains_key(&(kind, package.qualify(name)))
    }
}

fn next_index(len: usize) -> u32 {
    u32::try_from(len).unwrap_or(u32::MAX)
}

/// Errors building a domain model
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModelError {
    /// Object with the same kind and qualified name already exists
    #[error("duplicate {kind}: {qualified}")]
    DuplicateObject {
        /// Kind shared by both objects
        kind: ObjectKind,
        /// Qualified name shared by both objects
        qualified: String,
    },

    /// Object names must not be empty
    #[error("object name must not be empty")]
    EmptyName,

    /// Object id not part of the model
    #[error("unknown object: {0}")]
    UnknownObject(ObjectId),

    /// Qualified name not found
    #[error("no object named '{0}'")]
    UnknownName(String),

    /// Object has the wrong kind for its role
    #[error("{qualified} is a {actual}, expected a {expected}")]
    UnexpectedKind {
        /// Object found
        qualified: String,
        /// Kind required here
        expected: ObjectKind,
        /// Kind of the object found
        actual: ObjectKind,
    },

    /// Invalid package path
    #[error("invalid package: {0}")]
    InvalidPackage(#[from] crate::path::PathError),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pkg(s: &str) -> PackagePath {
        s.parse().unwrap()
    }

    #[test]
    fn add_object_and_lookup() {
        let mut model = DomainModel::new();
        let id = model
            .add_object(ObjectKind::ProductCmpt, pkg("old.pkg"), "Product 2024-01", "src")
            .unwrap();

        let object = model.object(id).unwrap();
        assert_eq!(object.qualified_name(), "old.pkg.Product 2024-01");
        assert_eq!(object.file_name(), "Product 2024-01.ipsproduct");
        assert_eq!(model.find_product_cmpt("old.pkg.Product 2024-01"), Some(id));
    }

    #[test]
    fn duplicate_object_rejected() {
        let mut model = DomainModel::new();
        model
            .add_object(ObjectKind::ProductCmpt, pkg("a"), "X", "src")
            .unwrap();
        let result = model.add_object(ObjectKind::ProductCmpt, pkg("a"), "X", "src");
        assert!(matches!(result, Err(ModelError::DuplicateObject { .. })));

        // Same name, other kind is a different file
        assert!(model
            .add_object(ObjectKind::TableContents, pkg("a"), "X", "src")
            .is_ok());
    }

    #[test]
    fn link_to_table_contents_rejected() {
        let mut model = DomainModel::new();
        let p = model
            .add_object(ObjectKind::ProductCmpt, pkg("a"), "P", "src")
            .unwrap();
        let t = model
            .add_object(ObjectKind::TableContents, pkg("a"), "T", "src")
            .unwrap();

        let result = model.add_link(p, "tables", LinkKind::Composition, Some(t));
        assert!(matches!(result, Err(ModelError::UnexpectedKind { .. })));
        assert!(model.add_table_usage(p, "rates", Some(t)).is_ok());
    }

    #[test]
    fn parts_of_keeps_insertion_order() {
        let mut model = DomainModel::new();
        let p = model
            .add_object(ObjectKind::ProductCmpt, pkg("a"), "P", "src")
            .unwrap();
        let c1 = model
            .add_object(ObjectKind::ProductCmpt, pkg("a"), "C1", "src")
            .unwrap();
        let c2 = model
            .add_object(ObjectKind::ProductCmpt, pkg("a"), "C2", "src")
            .unwrap();
        model.add_link(p, "covers", LinkKind::Composition, Some(c2)).unwrap();
        model.add_link(p, "covers", LinkKind::Composition, Some(c1)).unwrap();

        let targets: Vec<_> = model.parts_of(p).map(|part| part.target).collect();
        assert_eq!(targets, vec![Some(c2), Some(c1)]);
        assert_eq!(model.parts_of(c1).count(), 0);
    }

    #[test]
    fn source_files_checks_kind_and_package() {
        let mut model = DomainModel::new();
        model
            .add_object(ObjectKind::TableContents, pkg("a.b"), "Rates", "src")
            .unwrap();

        assert!(model.exists(&pkg("a.b"), "Rates", ObjectKind::TableContents));
        assert!(!model.exists(&pkg("a.b"), "Rates", ObjectKind::ProductCmpt));
        assert!(!model.exists(&pkg("a"), "Rates", ObjectKind::TableContents));
    }

    #[test]
    fn association_kind_detection() {
        assert!(PartKind::Link(LinkKind::Association).is_association());
        assert!(!PartKind::Link(LinkKind::Composition).is_association());
        assert!(!PartKind::TableUsage.is_association());
    }
}
