//! Per-part decisions

use crate::error::ParseError;
use dcp_model::{ObjectId, PartId};
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// Whether a referenced object is copied or linked
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CopyOrLink {
    /// Create a copy of the object
    Copy,

    /// Keep referring to the existing object
    Link,

    /// No decision (association groups)
    Undefined,
}

impl CopyOrLink {
    /// Check if this is [`CopyOrLink::Copy`]
    #[inline]
    #[must_use]
    pub const fn is_copy(self) -> bool {
        matches!(self, Self::Copy)
    }

    /// Name used in settings files
    #[inline]
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Copy => "copy",
            Self::Link => "link",
            Self::Undefined => "undefined",
        }
    }
}

impl Display for CopyOrLink {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CopyOrLink {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "copy" => Ok(Self::Copy),
            "link" => Ok(Self::Link),
            "undefined" => Ok(Self::Undefined),
            other => Err(ParseError::UnknownCopyOrLink(other.to_string())),
        }
    }
}

/// Key of a decision: the owning object and the part
///
/// Positions reaching the same part from the same owner share one decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StatusKey {
    /// Object owning the part
    pub owner: ObjectId,
    /// The part (link or table usage)
    pub part: PartId,
}

impl StatusKey {
    /// Create new key
    #[inline]
    #[must_use]
    pub const fn new(owner: ObjectId, part: PartId) -> Self {
        Self { owner, part }
    }
}

impl Display for StatusKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.part)
    }
}

/// Decision for one part
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkStatus {
    /// The decided part
    pub part: PartId,
    /// Object referenced by the part, if resolvable
    pub target: Option<ObjectId>,
    /// Whether the part takes part in the copy at all
    pub checked: bool,
    /// Stored copy-or-link value (before association re-derivation)
    pub copy_or_link: CopyOrLink,
}

impl LinkStatus {
    /// Create new checked status
    #[inline]
    #[must_use]
    pub fn new(part: PartId, target: Option<ObjectId>, copy_or_link: CopyOrLink) -> Self {
        Self {
            part,
            target,
            checked: true,
            copy_or_link,
        }
    }
}
