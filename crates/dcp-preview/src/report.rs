//! Serializable summary of a preview run

use crate::issue::PreviewIssue;
use crate::resolver::{PreviewResolver, ValidationOutcome};
use crate::target::TargetFile;
use dcp_status::TreeStatus;
use serde::Serialize;

/// Result of one preview run, ready for display or JSON output
#[derive(Debug, Clone, Serialize)]
pub struct PreviewReport {
    /// How the run ended
    pub outcome: Option<ValidationOutcome>,
    /// Leading source package segments dropped
    pub segments_to_ignore: usize,
    /// Whether the search pattern changed a name
    pub pattern_matched: bool,
    /// One entry per resolved or flagged position, in structure order
    pub entries: Vec<ReportEntry>,
}

/// Preview of one position
#[derive(Debug, Clone, Serialize)]
pub struct ReportEntry {
    /// Source position, rendered
    pub source: String,
    /// Target, if resolved
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<TargetFile>,
    /// Issues found for this position
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub issues: Vec<PreviewIssue>,
}

impl PreviewReport {
    /// Collect the current state of `resolver`
    #[must_use]
    pub fn from_resolver(status: &TreeStatus, resolver: &PreviewResolver<'_>) -> Self {
        let entries = status
            .structure()
            .references()
            .filter_map(|reference| {
                let target = resolver.target(reference.id()).cloned();
                let issues = resolver.issues(reference.id()).to_vec();
                (target.is_some() || !issues.is_empty()).then(|| ReportEntry {
                    source: reference.to_string(),
                    target,
                    issues,
                })
            })
            .collect();

        Self {
            outcome: resolver.outcome(),
            segments_to_ignore: resolver.segments_to_ignore(),
            pattern_matched: resolver.pattern_matched(),
            entries,
        }
    }

    /// Whether any entry carries an error
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.entries
            .iter()
            .flat_map(|entry| &entry.issues)
            .any(PreviewIssue::is_error)
    }
}
