//! Target package and name resolution
//!
//! [`PreviewResolver`] takes the enabled copy set of a [`TreeStatus`] and
//! computes, per position, the [`TargetFile`] the copy will be written to.
//! Problems are collected per position instead of failing fast, so every
//! issue can be shown at once. Only [`PreviewResolver::handles`] turns
//! collected errors into a failure.

use crate::issue::PreviewIssue;
use crate::options::PreviewOptions;
use crate::progress::ProgressMonitor;
use crate::target::TargetFile;
use dcp_model::{
    contains_errors, DomainObject, NamingStrategy, ObjectId, ObjectKind, PackagePath, RefId,
    SourceFiles,
};
use dcp_status::{CopyOrLink, TreeStatus};
use indexmap::IndexMap;
use regex::Regex;
use std::collections::HashMap;

/// How a validation run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationOutcome {
    /// Every position was processed
    Complete,

    /// The progress monitor cancelled the run; results are partial
    Cancelled,

    /// The run stopped on an invalid search pattern
    Aborted,
}

/// Resolves targets and collects issues for one [`TreeStatus`]
///
/// State is reset at the start of every run.
pub struct PreviewResolver<'a> {
    status: &'a TreeStatus,
    naming: &'a dyn NamingStrategy,
    files: &'a dyn SourceFiles,
    options: PreviewOptions,
    pattern: Option<Regex>,
    issues: IndexMap<RefId, Vec<PreviewIssue>>,
    claims: HashMap<TargetFile, RefId>,
    new_names: HashMap<ObjectId, String>,
    targets: IndexMap<RefId, TargetFile>,
    pattern_matched: bool,
    segments_to_ignore: usize,
    outcome: Option<ValidationOutcome>,
}

impl<'a> PreviewResolver<'a> {
    /// Create resolver checking existing files against the source model
    #[must_use]
    pub fn new(status: &'a TreeStatus, naming: &'a dyn NamingStrategy, options: PreviewOptions) -> Self {
        Self {
            status,
            naming,
            files: status.structure().model(),
            options,
            pattern: None,
            issues: IndexMap::new(),
            claims: HashMap::new(),
            new_names: HashMap::new(),
            targets: IndexMap::new(),
            pattern_matched: false,
            segments_to_ignore: 0,
            outcome: None,
        }
    }

    /// Check existing files against `files` instead of the source model
    #[inline]
    #[must_use]
    pub fn with_source_files(mut self, files: &'a dyn SourceFiles) -> Self {
        self.files = files;
        self
    }

    /// Options of this resolver
    #[inline]
    #[must_use]
    pub fn options(&self) -> &PreviewOptions {
        &self.options
    }

    /// Validate the enabled copy set (associations excluded)
    pub fn validate(&mut self, progress: &dyn ProgressMonitor) -> ValidationOutcome {
        let copy_set = self.status.all_enabled_elements(CopyOrLink::Copy, false);
        self.validate_set(&copy_set, progress)
    }

    /// Validate an explicit copy set
    ///
    /// Positions are processed in the given order. The progress monitor is
    /// polled once per position.
    pub fn validate_set(
        &mut self,
        copy_set: &[RefId],
        progress: &dyn ProgressMonitor,
    ) -> ValidationOutcome {
        self.reset();
        let structure = self.status.structure();
        let root = structure.root();

        if let Some(version_id) = self.options.version_id.clone() {
            if self.naming.supports_version_id() {
                for message in self.naming.validate_version_id(&version_id) {
                    self.attach(root, PreviewIssue::invalid_version_id(&message));
                }
            }
        }

        if !self.options.search_pattern.is_empty() {
            match Regex::new(&self.options.search_pattern) {
                Ok(regex) => self.pattern = Some(regex),
                Err(err) => {
                    let offending = copy_set.first().copied().unwrap_or(root);
                    let issue = PreviewIssue::invalid_search_pattern(&self.options.search_pattern, &err);
                    tracing::warn!(pattern = %self.options.search_pattern, "aborting preview: {err}");
                    self.attach(offending, issue);
                    return self.finish(ValidationOutcome::Aborted);
                }
            }
        }

        let objects: Vec<(RefId, &DomainObject)> = copy_set
            .iter()
            .filter_map(|id| structure.get(*id))
            .filter_map(|r| r.target_object().map(|object| (r.id(), object)))
            .collect();
        self.segments_to_ignore = segments_to_ignore(objects.iter().map(|(_, o)| &o.package));

        for (reference, object) in objects {
            if progress.is_cancelled() {
                tracing::warn!(
                    processed = self.targets.len(),
                    total = copy_set.len(),
                    "preview cancelled"
                );
                return self.finish(ValidationOutcome::Cancelled);
            }
            progress.step(1);
            self.resolve(reference, object);
        }

        if self.options.has_replacement() && !self.pattern_matched {
            let issue = PreviewIssue::pattern_not_applied(&self.options.search_pattern);
            self.attach(root, issue);
        }

        self.finish(ValidationOutcome::Complete)
    }

    /// Validate again and return the target of every copied position
    ///
    /// # Errors
    /// Returns [`PreviewError::Cancelled`] if the run was cancelled and
    /// [`PreviewError::ValidationFailed`] with all messages if any
    /// error-severity issue exists
    pub fn handles(
        &mut self,
        progress: &dyn ProgressMonitor,
    ) -> Result<IndexMap<RefId, TargetFile>, PreviewError> {
        let copy_set = self.status.all_enabled_elements(CopyOrLink::Copy, false);
        self.handles_for(&copy_set, progress)
    }

    /// Like [`PreviewResolver::handles`] for an explicit copy set
    ///
    /// # Errors
    /// Same as [`PreviewResolver::handles`]
    pub fn handles_for(
        &mut self,
        copy_set: &[RefId],
        progress: &dyn ProgressMonitor,
    ) -> Result<IndexMap<RefId, TargetFile>, PreviewError> {
        match self.validate_set(copy_set, progress) {
            ValidationOutcome::Cancelled => Err(PreviewError::Cancelled),
            _ if self.has_errors() => Err(PreviewError::ValidationFailed {
                messages: self.error_messages(),
            }),
            _ => Ok(self.targets.clone()),
        }
    }

    /// Issues attached to `reference`
    #[must_use]
    pub fn issues(&self, reference: RefId) -> &[PreviewIssue] {
        self.issues.get(&reference).map(Vec::as_slice).unwrap_or(&[])
    }

    /// All positions with issues, in the order issues were found
    pub fn all_issues(&self) -> impl Iterator<Item = (RefId, &[PreviewIssue])> {
        self.issues.iter().map(|(id, issues)| (*id, issues.as_slice()))
    }

    /// Issues of `reference` rendered as one message
    #[must_use]
    pub fn message(&self, reference: RefId) -> Option<String> {
        let issues = self.issues.get(&reference)?;
        Some(
            issues
                .iter()
                .map(|issue| issue.message.as_str())
                .collect::<Vec<_>>()
                .join("\n"),
        )
    }

    /// Whether any error-severity issue was found
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.issues.values().flatten().any(PreviewIssue::is_error)
    }

    /// Every error message, prefixed with the position it belongs to
    #[must_use]
    pub fn error_messages(&self) -> Vec<String> {
        let structure = self.status.structure();
        self.issues
            .iter()
            .flat_map(|(id, issues)| {
                issues
                    .iter()
                    .filter(|issue| issue.is_error())
                    .map(move |issue| match structure.get(*id) {
                        Some(reference) => format!("{reference}: {issue}"),
                        None => issue.message.clone(),
                    })
            })
            .collect()
    }

    /// Resolved target of `reference`
    #[must_use]
    pub fn target(&self, reference: RefId) -> Option<&TargetFile> {
        self.targets.get(&reference)
    }

    /// All resolved targets in processing order
    #[must_use]
    pub fn targets(&self) -> &IndexMap<RefId, TargetFile> {
        &self.targets
    }

    /// New name computed for `object`
    #[must_use]
    pub fn new_name(&self, object: ObjectId) -> Option<&str> {
        self.new_names.get(&object).map(String::as_str)
    }

    /// Whether the search pattern changed at least one name
    #[inline]
    #[must_use]
    pub fn pattern_matched(&self) -> bool {
        self.pattern_matched
    }

    /// Leading source package segments dropped from every target package
    #[inline]
    #[must_use]
    pub fn segments_to_ignore(&self) -> usize {
        self.segments_to_ignore
    }

    /// Outcome of the last run, `None` before the first run
    #[inline]
    #[must_use]
    pub fn outcome(&self) -> Option<ValidationOutcome> {
        self.outcome
    }

    /// Whether the last run processed every position
    #[inline]
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.outcome == Some(ValidationOutcome::Complete)
    }

    fn reset(&mut self) {
        self.pattern = None;
        self.issues.clear();
        self.claims.clear();
        self.new_names.clear();
        self.targets.clear();
        self.pattern_matched = false;
        self.segments_to_ignore = 0;
        self.outcome = None;
    }

    fn finish(&mut self, outcome: ValidationOutcome) -> ValidationOutcome {
        self.outcome = Some(outcome);
        tracing::info!(
            ?outcome,
            targets = self.targets.len(),
            issues = self.issues.values().map(Vec::len).sum::<usize>(),
            segments_to_ignore = self.segments_to_ignore,
            pattern_matched = self.pattern_matched,
            "preview validated"
        );
        outcome
    }

    fn attach(&mut self, reference: RefId, issue: PreviewIssue) {
        tracing::debug!(%reference, kind = ?issue.kind, "{}", issue.message);
        self.issues.entry(reference).or_default().push(issue);
    }

    fn has_issue(&self, reference: RefId, kind: crate::issue::IssueKind) -> bool {
        self.issues(reference).iter().any(|issue| issue.kind == kind)
    }

    fn resolve(&mut self, reference: RefId, object: &DomainObject) {
        let package = self
            .options
            .target_package
            .join(&object.package.remove_first_segments(self.segments_to_ignore));
        let name = self.resolve_name(object, &package);
        let target = TargetFile::new(package, name, object.kind);

        if self.files.exists(&target.package, &target.name, target.kind) {
            self.attach(reference, PreviewIssue::target_exists(&target));
        }

        match self.claims.get(&target).copied() {
            Some(other) if self.target_id(other) != Some(object.id) => {
                let label = |id: RefId| {
                    self.status
                        .structure()
                        .get(id)
                        .map_or_else(|| id.to_string(), |r| r.to_string())
                };
                let (this_label, other_label) = (label(reference), label(other));
                self.attach(reference, PreviewIssue::naming_collision(&target, other_label));
                if !self.has_issue(other, crate::issue::IssueKind::NamingCollision) {
                    self.attach(other, PreviewIssue::naming_collision(&target, this_label));
                }
            }
            Some(_) => {}
            None => {
                self.claims.insert(target.clone(), reference);
            }
        }

        tracing::debug!(%reference, source = %object.qualified_name(), %target, "resolved target");
        self.targets.insert(reference, target);
    }

    fn target_id(&self, reference: RefId) -> Option<ObjectId> {
        self.status.structure().get(reference)?.target_id()
    }

    /// New name of `object`, memoized per object
    fn resolve_name(&mut self, object: &DomainObject, package: &PackagePath) -> String {
        if let Some(name) = self.new_names.get(&object.id) {
            return name.clone();
        }

        let mut name = self.renamed(object);
        if object.kind == ObjectKind::TableContents {
            name = self.unique_table_name(package, name);
        }
        self.new_names.insert(object.id, name.clone());
        name
    }

    fn renamed(&mut self, object: &DomainObject) -> String {
        let versioned = object.kind.uses_naming_strategy()
            && self.naming.supports_version_id()
            && !contains_errors(&self.naming.validate(&object.name));

        if versioned {
            if let Ok(kind_id) = self.naming.kind_id(&object.name) {
                let new_kind_id = self.substitute(&kind_id);
                return match self.options.version_id.as_deref() {
                    Some(version_id) if !version_id.is_empty() => {
                        self.naming.product_cmpt_name(&new_kind_id, version_id)
                    }
                    _ => match object.name.strip_prefix(kind_id.as_str()) {
                        Some(version_suffix) => format!("{new_kind_id}{version_suffix}"),
                        None => new_kind_id,
                    },
                };
            }
        }
        self.substitute(&object.name)
    }

    fn substitute(&mut self, text: &str) -> String {
        let Some(pattern) = &self.pattern else {
            return text.to_string();
        };
        let replaced = pattern.replace_all(text, self.options.replace_text.as_str());
        if replaced != text {
            self.pattern_matched = true;
        }
        replaced.into_owned()
    }

    /// Append `_CopyOf{n}` until no table contents of that name exists
    fn unique_table_name(&self, package: &PackagePath, name: String) -> String {
        let mut candidate = name.clone();
        let mut counter = 0usize;
        while self.files.exists(package, &candidate, ObjectKind::TableContents) {
            counter += 1;
            candidate = format!("{name}_CopyOf{counter}");
        }
        candidate
    }
}

impl std::fmt::Debug for PreviewResolver<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreviewResolver")
            .field("naming", &self.naming.name())
            .field("options", &self.options)
            .field("targets", &self.targets.len())
            .field("issues", &self.issues.len())
            .field("outcome", &self.outcome)
            .finish_non_exhaustive()
    }
}

/// Leading segments shared by every package, compared against the first one
///
/// An empty set shares nothing; a single package shares all its segments.
#[must_use]
pub fn segments_to_ignore<'p>(mut packages: impl Iterator<Item = &'p PackagePath>) -> usize {
    let Some(first) = packages.next() else {
        return 0;
    };
    packages.fold(first.len(), |min, package| {
        min.min(first.matching_first_segments(package))
    })
}

/// Errors producing copy handles
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PreviewError {
    /// Validation was cancelled before all positions were processed
    #[error("preview was cancelled")]
    Cancelled,

    /// Validation found errors
    #[error("preview has {} error(s): {}", .messages.len(), .messages.join("; "))]
    ValidationFailed {
        /// Every error message, prefixed with its position
        messages: Vec<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pkg(s: &str) -> PackagePath {
        s.parse().unwrap()
    }

    #[test]
    fn segments_to_ignore_uses_minimum_prefix() {
        let packages = [pkg("old.pkg.a"), pkg("old.pkg.b"), pkg("old.x")];
        assert_eq!(segments_to_ignore(packages.iter()), 1);
    }

    #[test]
    fn segments_to_ignore_edge_cases() {
        assert_eq!(segments_to_ignore(std::iter::empty()), 0);
        assert_eq!(segments_to_ignore([pkg("old.pkg")].iter()), 2);
        assert_eq!(segments_to_ignore([pkg("old.pkg"), pkg("old.pkg")].iter()), 2);
        assert_eq!(segments_to_ignore([pkg("a"), pkg("b")].iter()), 0);
    }

    #[test]
    fn validation_failed_lists_messages() {
        let err = PreviewError::ValidationFailed {
            messages: vec!["a".to_string(), "b".to_string()],
        };
        assert_eq!(err.to_string(), "preview has 2 error(s): a; b");
    }
}
