//! Persisted decision records

use dcp_model::PartKind;
use dcp_status::CopyOrLink;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};

/// Kind of part a record belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LinkType {
    /// Composition, aggregation or association link
    Link,

    /// Table usage
    TableUsage,
}

impl LinkType {
    /// Check whether `kind` is a part of this type
    #[inline]
    #[must_use]
    pub const fn matches(self, kind: PartKind) -> bool {
        matches!(
            (self, kind),
            (Self::Link, PartKind::Link(_)) | (Self::TableUsage, PartKind::TableUsage)
        )
    }
}

impl From<PartKind> for LinkType {
    fn from(kind: PartKind) -> Self {
        match kind {
            PartKind::Link(_) => Self::Link,
            PartKind::TableUsage => Self::TableUsage,
        }
    }
}

impl Display for LinkType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Link => "link",
            Self::TableUsage => "table-usage",
        })
    }
}

/// One persisted decision
///
/// Objects are identified by name only: the owner by its kind-id, the target
/// by its full name. Identity does not survive a structure rebuild, so these
/// records are matched again on restore.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettingsEntry {
    /// Kind-id of the owning object, `None` for the root record
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_kind_id: Option<String>,
    /// Kind of part
    pub link_type: LinkType,
    /// Role of the part, `None` for the root record
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    /// Name of the target object when the record was written
    pub target_name: String,
    /// Whether the part takes part in the copy
    pub checked: bool,
    /// Stored copy-or-link value
    pub copy_or_link: CopyOrLink,
}

impl SettingsEntry {
    /// Record for the root of a structure
    #[must_use]
    pub fn root(target_name: impl Into<String>) -> Self {
        Self {
            owner_kind_id: None,
            link_type: LinkType::Link,
            role: None,
            target_name: target_name.into(),
            checked: true,
            copy_or_link: CopyOrLink::Copy,
        }
    }

    /// Whether this is the root record
    #[inline]
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.owner_kind_id.is_none()
    }
}

impl Display for SettingsEntry {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match (&self.owner_kind_id, &self.role) {
            (Some(owner), Some(role)) => {
                write!(f, "{owner} -[{role}]-> {} ({})", self.target_name, self.link_type)
            }
            (Some(owner), None) => write!(f, "{owner} -> {} ({})", self.target_name, self.link_type),
            (None, _) => write!(f, "root {}", self.target_name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dcp_model::LinkKind;

    #[test]
    fn link_type_matches_part_kinds() {
        assert!(LinkType::Link.matches(PartKind::Link(LinkKind::Association)));
        assert!(!LinkType::Link.matches(PartKind::TableUsage));
        assert_eq!(LinkType::from(PartKind::TableUsage), LinkType::TableUsage);
    }

    #[test]
    fn root_record_is_checked_copy() {
        let root = SettingsEntry::root("Home 2024-01");
        assert!(root.is_root());
        assert!(root.checked);
        assert_eq!(root.copy_or_link, CopyOrLink::Copy);
        assert_eq!(root.to_string(), "root Home 2024-01");
    }
}
