//! Validation issues attached to references

use dcp_model::{NamingMessage, Severity};
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};

/// Cause of a validation issue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IssueKind {
    /// Another object is copied to the same target
    NamingCollision,

    /// A file already exists at the target
    TargetExists,

    /// Search pattern is not a valid regular expression
    InvalidSearchPattern,

    /// Search pattern matched no name
    PatternNotApplied,

    /// Version id rejected by the naming strategy
    InvalidVersionId,
}

/// One problem found while resolving targets
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreviewIssue {
    /// Cause
    pub kind: IssueKind,
    /// Severity
    pub severity: Severity,
    /// Human-readable text
    pub message: String,
}

impl PreviewIssue {
    /// Naming collision with `other`
    #[must_use]
    pub fn naming_collision(target: impl Display, other: impl Display) -> Self {
        Self::error(
            IssueKind::NamingCollision,
            format!("naming collision: {target} is also the target of {other}"),
        )
    }

    /// Target file exists already
    #[must_use]
    pub fn target_exists(target: impl Display) -> Self {
        Self::error(IssueKind::TargetExists, format!("{target} already exists"))
    }

    /// Search pattern failed to compile
    #[must_use]
    pub fn invalid_search_pattern(pattern: &str, reason: impl Display) -> Self {
        Self::error(
            IssueKind::InvalidSearchPattern,
            format!("invalid search pattern '{pattern}': {reason}"),
        )
    }

    /// Search pattern never matched
    #[must_use]
    pub fn pattern_not_applied(pattern: &str) -> Self {
        Self {
            kind: IssueKind::PatternNotApplied,
            severity: Severity::Warning,
            message: format!("search pattern '{pattern}' was not found in any name"),
        }
    }

    /// Version id message from the naming strategy
    #[must_use]
    pub fn invalid_version_id(message: &NamingMessage) -> Self {
        Self {
            kind: IssueKind::InvalidVersionId,
            severity: message.severity,
            message: message.text.clone(),
        }
    }

    fn error(kind: IssueKind, message: String) -> Self {
        Self {
            kind,
            severity: Severity::Error,
            message,
        }
    }

    /// Check if this issue blocks the copy
    #[inline]
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl Display for PreviewIssue {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}
