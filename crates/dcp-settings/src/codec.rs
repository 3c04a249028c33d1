//! Writing decisions out and matching them against a live structure
//!
//! Records carry names, not identities. On restore, every record is matched
//! against the positions of the live structure:
//!
//! 1. the part kind and role must be equal,
//! 2. the owner's kind-id must equal the recorded owner kind-id,
//! 3. the target's name must start with the kind-id of the recorded target
//!    name.
//!
//! A candidate whose target name equals the recorded name wins. Otherwise the
//! candidates whose target kind-id equals the recorded one are preferred, and
//! among them the greatest target name is taken, which for date based version
//! ids is the most recent version.

use crate::entry::{LinkType, SettingsEntry};
use crate::error::SettingsError;
use dcp_model::{NamingStrategy, ProductStructure, RefId, StructureReference};
use dcp_status::{StatusKey, TreeStatus};

/// Where a record was matched
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// The root record, matched to the live root
    Root(RefId),

    /// A part of the live structure
    Part {
        /// First position matched
        reference: RefId,
        /// Decision shared by every position of the part
        key: StatusKey,
    },

    /// Nothing in the live structure matches
    Unresolved,
}

/// A record together with where it was matched
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedEntry {
    /// The record as read
    pub entry: SettingsEntry,
    /// Match in the live structure
    pub resolution: Resolution,
}

/// Outcome of [`SettingsCodec::restore`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RestoreReport {
    /// Decisions written to the status
    pub applied: usize,
    /// Records without a match
    pub unresolved: Vec<SettingsEntry>,
}

impl RestoreReport {
    /// Whether every record found a match
    #[inline]
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.unresolved.is_empty()
    }
}

/// Converts between [`TreeStatus`] decisions and [`SettingsEntry`] records
#[derive(Debug, Clone, Copy)]
pub struct SettingsCodec<'a> {
    naming: &'a dyn NamingStrategy,
}

impl<'a> SettingsCodec<'a> {
    /// Create codec deriving kind-ids with `naming`
    #[inline]
    #[must_use]
    pub fn new(naming: &'a dyn NamingStrategy) -> Self {
        Self { naming }
    }

    /// Kind-id of `name`, or the whole name if it has none
    #[must_use]
    pub fn kind_id(&self, name: &str) -> String {
        self.naming
            .kind_id(name)
            .unwrap_or_else(|_| name.to_string())
    }

    /// Records for every stored decision of `status`
    ///
    /// The root record comes first. The remaining records are ordered by
    /// owner kind-id, then by target name. Parts without a target are
    /// skipped.
    #[must_use]
    pub fn serialize(&self, status: &TreeStatus) -> Vec<SettingsEntry> {
        let structure = status.structure();
        let model = structure.model();

        let mut entries: Vec<SettingsEntry> = status
            .decisions()
            .filter_map(|(key, decision)| {
                let owner = model.object(key.owner)?;
                let part = model.part(key.part)?;
                let Some(target) = decision.target.and_then(|id| model.object(id)) else {
                    tracing::debug!(%key, role = %part.role, "skipping part without target");
                    return None;
                };
                Some(SettingsEntry {
                    owner_kind_id: Some(self.kind_id(&owner.name)),
                    link_type: LinkType::from(part.kind),
                    role: Some(part.role.clone()),
                    target_name: target.name.clone(),
                    checked: decision.checked,
                    copy_or_link: decision.copy_or_link,
                })
            })
            .collect();

        entries.sort_by(|a, b| {
            (&a.owner_kind_id, &a.target_name, a.link_type, &a.role).cmp(&(
                &b.owner_kind_id,
                &b.target_name,
                b.link_type,
                &b.role,
            ))
        });
        entries.insert(0, SettingsEntry::root(structure.root_object().name.clone()));

        tracing::debug!(entries = entries.len(), "serialized decisions");
        entries
    }

    /// Match every record against `structure`
    #[must_use]
    pub fn resolve(&self, entries: &[SettingsEntry], structure: &ProductStructure) -> Vec<ResolvedEntry> {
        entries
            .iter()
            .map(|entry| ResolvedEntry {
                entry: entry.clone(),
                resolution: self.resolve_entry(entry, structure),
            })
            .collect()
    }

    /// Match `entries` against the structure of `status` and apply them
    ///
    /// The root record never changes anything: the root is always checked and
    /// copied. When several records match the same part, the last one wins.
    ///
    /// # Errors
    /// Returns error if a matched decision cannot be written
    pub fn restore(
        &self,
        entries: &[SettingsEntry],
        status: &mut TreeStatus,
    ) -> Result<RestoreReport, SettingsError> {
        let resolved = self.resolve(entries, status.structure());
        let mut report = RestoreReport::default();

        for ResolvedEntry { entry, resolution } in resolved {
            match resolution {
                Resolution::Root(_) => {
                    if !entry.checked || !entry.copy_or_link.is_copy() {
                        tracing::debug!(%entry, "ignoring root record, the root is always copied");
                    }
                }
                Resolution::Part { key, .. } => {
                    status.apply_decision(key, entry.checked, entry.copy_or_link)?;
                    report.applied += 1;
                }
                Resolution::Unresolved => {
                    tracing::warn!(%entry, "no matching part in the structure");
                    report.unresolved.push(entry);
                }
            }
        }

        tracing::info!(
            applied = report.applied,
            unresolved = report.unresolved.len(),
            "restored decisions"
        );
        Ok(report)
    }

    fn resolve_entry(&self, entry: &SettingsEntry, structure: &ProductStructure) -> Resolution {
        let Some(owner_kind_id) = entry.owner_kind_id.as_deref() else {
            return Resolution::Root(structure.root());
        };
        let target_kind_id = self.kind_id(&entry.target_name);

        let candidates: Vec<StructureReference<'_>> = structure
            .references()
            .filter(|r| !r.is_root() && !r.is_association_group())
            .filter(|r| {
                r.part().is_some_and(|part| {
                    entry.link_type.matches(part.kind)
                        && entry.role.as_deref().map_or(true, |role| role == part.role)
                })
            })
            .filter(|r| {
                r.owner_id()
                    .and_then(|owner| structure.model().object(owner))
                    .is_some_and(|owner| self.kind_id(&owner.name) == owner_kind_id)
            })
            .filter(|r| {
                r.target_object()
                    .is_some_and(|target| target.name.starts_with(&target_kind_id))
            })
            .collect();

        let chosen = candidates
            .iter()
            .find(|r| target_name(r) == Some(entry.target_name.as_str()))
            .or_else(|| {
                let same_kind = candidates
                    .iter()
                    .filter(|r| {
                        target_name(r).is_some_and(|name| self.kind_id(name) == target_kind_id)
                    })
                    .max_by_key(|r| target_name(r));
                let best =
                    same_kind.or_else(|| candidates.iter().max_by_key(|r| target_name(r)));
                if let Some(best) = best {
                    tracing::debug!(
                        %entry,
                        candidates = candidates.len(),
                        chosen = %best,
                        "no exact match, taking greatest target name"
                    );
                }
                best
            });

        match chosen.and_then(|r| Some((r.id(), r.owner_id()?, r.part_id()?))) {
            Some((reference, owner, part)) => Resolution::Part {
                reference,
                key: StatusKey::new(owner, part),
            },
            None => Resolution::Unresolved,
        }
    }
}

fn target_name<'s>(reference: &StructureReference<'s>) -> Option<&'s str> {
    reference.target_object().map(|target| target.name.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use dcp_model::{DateBasedNamingStrategy, NoVersionIdNamingStrategy};

    #[test]
    fn kind_id_falls_back_to_name() {
        let naming = DateBasedNamingStrategy::default();
        let codec = SettingsCodec::new(&naming);
        assert_eq!(codec.kind_id("Home 2024-01"), "Home");
        assert_eq!(codec.kind_id("Rates"), "Rates");

        let plain = NoVersionIdNamingStrategy;
        assert_eq!(SettingsCodec::new(&plain).kind_id("Home 2024-01"), "Home 2024-01");
    }

    #[test]
    fn report_without_unresolved_is_complete() {
        let mut report = RestoreReport::default();
        assert!(report.is_complete());
        report.unresolved.push(SettingsEntry::root("x"));
        assert!(!report.is_complete());
    }
}
