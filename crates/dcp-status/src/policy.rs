//! Default copy-or-link policy and smart mode

use crate::error::ParseError;
use crate::link_status::CopyOrLink;
use dcp_model::{ReferenceKind, StructureReference};
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::str::FromStr;

/// Default decision for parts that have no explicit decision yet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DefaultPolicy {
    /// Copy everything
    AlwaysCopy,

    /// Link everything
    AlwaysLink,

    /// Ask the [`SmartModeBehavior`] (default)
    #[default]
    Smart,
}

impl FromStr for DefaultPolicy {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "copy" | "always-copy" => Ok(Self::AlwaysCopy),
            "link" | "always-link" => Ok(Self::AlwaysLink),
            "smart" => Ok(Self::Smart),
            other => Err(ParseError::UnknownPolicy(other.to_string())),
        }
    }
}

/// Default decision for non-root components and table usages
///
/// Consulted once per part when a [`crate::TreeStatus`] is created with
/// [`DefaultPolicy::Smart`].
pub trait SmartModeBehavior: Send + Sync + Debug {
    /// Decide for `reference` within a copy rooted at `copy_root`
    ///
    /// Returns [`CopyOrLink::Undefined`] if the reference has no target object.
    fn copy_or_link(
        &self,
        copy_root: &StructureReference<'_>,
        reference: &StructureReference<'_>,
    ) -> CopyOrLink;

    /// Behavior name (for logging)
    fn name(&self) -> &'static str;
}

/// Copy objects stored in the same storage root as the copy root, link the rest
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SameRootSmartMode;

impl SmartModeBehavior for SameRootSmartMode {
    fn copy_or_link(
        &self,
        copy_root: &StructureReference<'_>,
        reference: &StructureReference<'_>,
    ) -> CopyOrLink {
        if reference.kind() == ReferenceKind::AssociationGroup {
            return CopyOrLink::Undefined;
        }
        let (Some(root), Some(target)) = (copy_root.target_object(), reference.target_object())
        else {
            return CopyOrLink::Undefined;
        };
        if root.storage_root == target.storage_root {
            CopyOrLink::Copy
        } else {
            CopyOrLink::Link
        }
    }

    fn name(&self) -> &'static str {
        "same-root"
    }
}
