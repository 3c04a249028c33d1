//! DCP Model
//!
//! Source side of a deep copy: the domain model, package paths, the product
//! structure to copy and the naming strategies that split product component
//! names into kind-id and version id.
//!
//! # Core Concepts
//!
//! - [`DomainModel`]: Arena of [`DomainObject`]s and the [`Part`]s linking them
//! - [`PackagePath`]: Dotted package of an object
//! - [`ProductStructure`]: Tree of positions rooted at one product component
//! - [`StructureReference`]: One position (component, association group, table usage)
//! - [`NamingStrategy`]: Kind-id / version id handling
//!
//! # Example
//!
//! ```rust,ignore
//! use dcp_model::{ModelDocument, ProductStructure};
//! use std::sync::Arc;
//!
//! let model = Arc::new(ModelDocument::load("model.yaml")?.to_model()?);
//! let root = model.find_product_cmpt("old.pkg.Root 2024-01").unwrap();
//! let structure = ProductStructure::expand(model, root)?;
//! for reference in structure.references() {
//!     println!("{reference}");
//! }
//! ```

#![warn(unreachable_pub)]

mod document;
mod naming;
mod object;
mod path;
mod structure;

pub use document::{
    DocumentError, LinkEntry, ModelDocument, ObjectEntry, TableUsageEntry, DEFAULT_STORAGE_ROOT,
};
pub use naming::{
    contains_errors, DateBasedNamingStrategy, NamingConfig, NamingError, NamingMessage,
    NamingStrategy, NoVersionIdNamingStrategy, Severity,
};
pub use object::{
    DomainModel, DomainObject, LinkKind, ModelError, ObjectId, ObjectKind, Part, PartId, PartKind,
    SourceFiles,
};
pub use path::{PackagePath, PathError};
pub use structure::{
    ProductStructure, RefId, ReferenceKind, StructureBuilder, StructureError, StructureReference,
};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
