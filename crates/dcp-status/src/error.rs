//! Error types for decision lookups and value parsing

use dcp_model::{ObjectId, PartId, RefId};

/// Errors querying or updating a [`crate::TreeStatus`]
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StatusError {
    /// Part is not owned by any product component of the structure
    #[error("{part} of {owner} is not part of the product structure")]
    UnknownPart {
        /// Recorded owner
        owner: ObjectId,
        /// Part not found below `owner`
        part: PartId,
    },

    /// Position not issued by the structure
    #[error("unknown reference: {0}")]
    UnknownReference(RefId),
}

/// Errors parsing decision values from text
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    /// Not `copy`, `link` or `undefined`
    #[error("unknown copy-or-link value: '{0}'")]
    UnknownCopyOrLink(String),

    /// Not one of the default policies
    #[error("unknown policy '{0}' (expected copy, link or smart)")]
    UnknownPolicy(String),
}

impl StatusError {
    /// Create unknown part error
    #[inline]
    #[must_use]
    pub fn unknown_part(owner: ObjectId, part: PartId) -> Self {
        Self::UnknownPart { owner, part }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_errors_name_the_input() {
        let err = ParseError::UnknownPolicy("maybe".to_string());
        assert_eq!(err.to_string(), "unknown policy 'maybe' (expected copy, link or smart)");
        let err = ParseError::UnknownCopyOrLink("both".to_string());
        assert_eq!(err.to_string(), "unknown copy-or-link value: 'both'");
    }
}
