//! Copy-or-link decisions for a product structure
//!
//! [`TreeStatus`] stores one [`LinkStatus`] per `(owner, part)` and derives the
//! per-position state from it:
//!
//! - **checked**: the root is always checked; an association group is checked
//!   if any of its children is.
//! - **copy-or-link**: the root is always [`CopyOrLink::Copy`], groups are
//!   [`CopyOrLink::Undefined`]. A pure association stored as
//!   [`CopyOrLink::Link`] reads as [`CopyOrLink::Copy`] while its target is
//!   copied through an enabled non-association position elsewhere.
//! - **enabled**: checked, and every non-group ancestor checked and copied.
//!
//! Derived values are recomputed on every read.

use crate::error::StatusError;
use crate::events::{EventBus, Listener, StatusChange, StatusEvent, SubscriptionId};
use crate::link_status::{CopyOrLink, LinkStatus, StatusKey};
use crate::policy::{DefaultPolicy, SameRootSmartMode, SmartModeBehavior};
use dcp_model::{ObjectId, PartId, ProductStructure, RefId, ReferenceKind, StructureReference};
use indexmap::IndexMap;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Decisions and their propagation for one product structure
#[derive(Debug)]
pub struct TreeStatus {
    structure: Arc<ProductStructure>,
    policy: DefaultPolicy,
    statuses: IndexMap<ObjectId, IndexMap<PartId, LinkStatus>>,
    association_links: HashSet<StatusKey>,
    positions: HashMap<StatusKey, Vec<RefId>>,
    events: EventBus,
}

/// Effective state of every position, in preorder
type Snapshot = Vec<(RefId, bool, CopyOrLink)>;

impl TreeStatus {
    /// Create status with default decisions, using [`SameRootSmartMode`]
    #[must_use]
    pub fn new(structure: Arc<ProductStructure>, policy: DefaultPolicy) -> Self {
        Self::with_smart_mode(structure, policy, &SameRootSmartMode)
    }

    /// Create status with default decisions from `policy` and `smart_mode`
    ///
    /// Every part reachable in the structure gets its default decision here:
    /// pure associations are checked and linked, parts without a target are
    /// linked, all others follow the policy.
    #[must_use]
    pub fn with_smart_mode(
        structure: Arc<ProductStructure>,
        policy: DefaultPolicy,
        smart_mode: &dyn SmartModeBehavior,
    ) -> Self {
        let mut statuses: IndexMap<ObjectId, IndexMap<PartId, LinkStatus>> = IndexMap::new();
        let mut association_links = HashSet::new();
        let mut positions: HashMap<StatusKey, Vec<RefId>> = HashMap::new();

        let root = structure.reference(structure.root());
        for reference in structure.references() {
            let Some(key) = key_of(&reference) else {
                continue;
            };
            positions.entry(key).or_default().push(reference.id());

            let parts = statuses.entry(key.owner).or_default();
            if parts.contains_key(&key.part) {
                continue;
            }

            let target = reference.target_id();
            let copy_or_link = if reference.is_pure_association() {
                association_links.insert(key);
                CopyOrLink::Link
            } else if target.is_none() {
                CopyOrLink::Link
            } else {
                match policy {
                    DefaultPolicy::AlwaysCopy => CopyOrLink::Copy,
                    DefaultPolicy::AlwaysLink => CopyOrLink::Link,
                    DefaultPolicy::Smart => match smart_mode.copy_or_link(&root, &reference) {
                        CopyOrLink::Undefined => CopyOrLink::Link,
                        decided => decided,
                    },
                }
            };
            tracing::debug!(reference = %reference, %key, %copy_or_link, "default decision");
            parts.insert(key.part, LinkStatus::new(key.part, target, copy_or_link));
        }

        let status = Self {
            structure,
            policy,
            statuses,
            association_links,
            positions,
            events: EventBus::default(),
        };
        tracing::info!(
            root = %status.structure.root_object().qualified_name(),
            positions = status.structure.len(),
            decisions = status.decision_count(),
            associations = status.association_links.len(),
            ?policy,
            smart_mode = smart_mode.name(),
            "initialized tree status"
        );
        status
    }

    /// The structure the decisions belong to
    #[inline]
    #[must_use]
    pub fn structure(&self) -> &ProductStructure {
        &self.structure
    }

    /// Shared handle to the structure
    #[inline]
    #[must_use]
    pub fn structure_arc(&self) -> &Arc<ProductStructure> {
        &self.structure
    }

    /// Policy the defaults were derived from
    #[inline]
    #[must_use]
    pub fn policy(&self) -> DefaultPolicy {
        self.policy
    }

    /// Stored decision for `part` owned by `owner`
    ///
    /// # Errors
    /// Returns [`StatusError::UnknownPart`] if the part is not reachable in the
    /// structure
    pub fn status(&self, owner: ObjectId, part: PartId) -> Result<&LinkStatus, StatusError> {
        self.statuses
            .get(&owner)
            .and_then(|parts| parts.get(&part))
            .ok_or_else(|| StatusError::unknown_part(owner, part))
    }

    /// Stored decision shared by the part at `reference`
    ///
    /// `None` for the root and association groups.
    #[must_use]
    pub fn status_of(&self, reference: RefId) -> Option<&LinkStatus> {
        let key = self.key(reference)?;
        self.status(key.owner, key.part).ok()
    }

    /// All stored decisions, grouped by owner in structure order
    pub fn decisions(&self) -> impl Iterator<Item = (StatusKey, &LinkStatus)> {
        self.statuses.iter().flat_map(|(owner, parts)| {
            parts
                .iter()
                .map(move |(part, status)| (StatusKey::new(*owner, *part), status))
        })
    }

    /// Number of stored decisions
    #[must_use]
    pub fn decision_count(&self) -> usize {
        self.statuses.values().map(IndexMap::len).sum()
    }

    /// Positions sharing the decision `key`
    #[must_use]
    pub fn positions(&self, key: StatusKey) -> &[RefId] {
        self.positions.get(&key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Whether `key` is a pure association link
    #[inline]
    #[must_use]
    pub fn is_association_link(&self, key: StatusKey) -> bool {
        self.association_links.contains(&key)
    }

    /// Decision key of the part at `reference`
    #[must_use]
    pub fn key(&self, reference: RefId) -> Option<StatusKey> {
        key_of(&self.structure.get(reference)?)
    }

    /// Whether `reference` takes part in the copy
    #[must_use]
    pub fn is_checked(&self, reference: RefId) -> bool {
        self.structure
            .get(reference)
            .is_some_and(|r| self.checked(&r))
    }

    /// Effective copy-or-link value of `reference`
    #[must_use]
    pub fn copy_or_link(&self, reference: RefId) -> CopyOrLink {
        self.structure
            .get(reference)
            .map_or(CopyOrLink::Undefined, |r| {
                self.derived_copy_or_link(&r, &mut Vec::new())
            })
    }

    /// Whether `reference` will actually be processed
    ///
    /// A position is enabled if it is checked and every ancestor that is not an
    /// association group is checked and copied.
    #[must_use]
    pub fn is_enabled(&self, reference: RefId) -> bool {
        self.structure
            .get(reference)
            .is_some_and(|r| self.enabled(&r, &mut Vec::new()))
    }

    /// Set the checked state
    ///
    /// For an association group the value is applied to every child and one
    /// event is published for the group if its aggregate state changed. The
    /// root cannot be unchecked.
    pub fn set_checked(&mut self, reference: RefId, value: bool) {
        let Some(r) = self.structure.get(reference) else {
            tracing::warn!(%reference, "set_checked on unknown reference");
            return;
        };
        match r.kind() {
            ReferenceKind::AssociationGroup => {
                let old = self.checked(&r);
                let keys: Vec<_> = r.children().filter_map(|child| key_of(&child)).collect();
                for key in keys {
                    if let Some(status) = self.status_mut(key) {
                        status.checked = value;
                    }
                }
                let new = self.is_checked(reference);
                if old != new {
                    self.events.publish(&StatusEvent {
                        reference,
                        change: StatusChange::Checked { old, new },
                    });
                }
            }
            _ if r.is_root() => {}
            _ => {
                let Some(key) = key_of(&r) else { return };
                let before = self.snapshot();
                if let Some(status) = self.status_mut(key) {
                    status.checked = value;
                }
                self.publish_changes(before);
            }
        }
    }

    /// Set the stored copy-or-link value
    ///
    /// No-op for the root, association groups and [`CopyOrLink::Undefined`].
    pub fn set_copy_or_link(&mut self, reference: RefId, value: CopyOrLink) {
        if value == CopyOrLink::Undefined {
            tracing::debug!(%reference, "ignoring undefined copy-or-link value");
            return;
        }
        let Some(key) = self.key(reference) else {
            return;
        };
        let before = self.snapshot();
        if let Some(status) = self.status_mut(key) {
            status.copy_or_link = value;
        }
        self.publish_changes(before);
    }

    /// Overwrite a stored decision
    ///
    /// [`CopyOrLink::Undefined`] keeps the stored copy-or-link value.
    ///
    /// # Errors
    /// Returns [`StatusError::UnknownPart`] if `key` is not part of the structure
    pub fn apply_decision(
        &mut self,
        key: StatusKey,
        checked: bool,
        copy_or_link: CopyOrLink,
    ) -> Result<(), StatusError> {
        let before = self.snapshot();
        let status = self
            .status_mut(key)
            .ok_or_else(|| StatusError::unknown_part(key.owner, key.part))?;
        status.checked = checked;
        if copy_or_link != CopyOrLink::Undefined {
            status.copy_or_link = copy_or_link;
        }
        self.publish_changes(before);
        Ok(())
    }

    /// Enabled, non-group positions with the effective value `copy_or_link`
    ///
    /// Positions are returned in preorder; a part reached from two enabled
    /// positions appears twice. Pure association positions are skipped unless
    /// `include_associations` is set.
    #[must_use]
    pub fn all_enabled_elements(
        &self,
        copy_or_link: CopyOrLink,
        include_associations: bool,
    ) -> Vec<RefId> {
        self.elements(copy_or_link, include_associations, true)
    }

    /// Like [`TreeStatus::all_enabled_elements`] without the enablement filter
    #[must_use]
    pub fn all_elements(&self, copy_or_link: CopyOrLink, include_associations: bool) -> Vec<RefId> {
        self.elements(copy_or_link, include_associations, false)
    }

    /// Register a listener for decision changes
    pub fn subscribe(&mut self, listener: impl FnMut(&StatusEvent) + Send + 'static) -> SubscriptionId {
        let listener: Listener = Box::new(listener);
        self.events.subscribe(listener)
    }

    /// Remove a listener, returns false if it was not registered
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.events.unsubscribe(id)
    }

    fn elements(
        &self,
        copy_or_link: CopyOrLink,
        include_associations: bool,
        enabled_only: bool,
    ) -> Vec<RefId> {
        self.structure
            .references()
            .filter(|r| !r.is_association_group())
            .filter(|r| include_associations || !r.is_pure_association())
            .filter(|r| !enabled_only || self.enabled(r, &mut Vec::new()))
            .filter(|r| self.derived_copy_or_link(r, &mut Vec::new()) == copy_or_link)
            .map(|r| r.id())
            .collect()
    }

    fn status_mut(&mut self, key: StatusKey) -> Option<&mut LinkStatus> {
        self.statuses
            .get_mut(&key.owner)
            .and_then(|parts| parts.get_mut(&key.part))
    }

    fn stored(&self, reference: &StructureReference<'_>) -> Option<&LinkStatus> {
        let key = key_of(reference)?;
        self.status(key.owner, key.part).ok()
    }

    fn checked(&self, reference: &StructureReference<'_>) -> bool {
        match reference.kind() {
            ReferenceKind::AssociationGroup => reference.children().any(|c| self.checked(&c)),
            _ if reference.is_root() => true,
            _ => self.stored(reference).is_some_and(|s| s.checked),
        }
    }

    fn enabled(&self, reference: &StructureReference<'_>, visiting: &mut Vec<StatusKey>) -> bool {
        self.checked(reference)
            && reference
                .ancestors()
                .filter(|a| !a.is_association_group())
                .all(|a| self.checked(&a) && self.derived_copy_or_link(&a, visiting).is_copy())
    }

    fn derived_copy_or_link(
        &self,
        reference: &StructureReference<'_>,
        visiting: &mut Vec<StatusKey>,
    ) -> CopyOrLink {
        if reference.is_association_group() {
            return CopyOrLink::Undefined;
        }
        if reference.is_root() {
            return CopyOrLink::Copy;
        }
        let Some(key) = key_of(reference) else {
            return CopyOrLink::Undefined;
        };
        let Ok(status) = self.status(key.owner, key.part) else {
            return CopyOrLink::Undefined;
        };

        if status.copy_or_link != CopyOrLink::Link
            || !self.association_links.contains(&key)
            || visiting.contains(&key)
        {
            return status.copy_or_link;
        }

        visiting.push(key);
        let copied = status
            .target
            .is_some_and(|target| self.copied_elsewhere(target, visiting));
        visiting.pop();

        if copied {
            CopyOrLink::Copy
        } else {
            CopyOrLink::Link
        }
    }

    /// Whether `target` is copied through an enabled non-association component
    fn copied_elsewhere(&self, target: ObjectId, visiting: &mut Vec<StatusKey>) -> bool {
        self.structure
            .references()
            .filter(|r| r.kind() == ReferenceKind::Component && !r.is_pure_association())
            .filter(|r| r.target_id() == Some(target))
            .any(|r| {
                self.enabled(&r, visiting) && self.derived_copy_or_link(&r, visiting).is_copy()
            })
    }

    fn snapshot(&self) -> Option<Snapshot> {
        if self.events.is_empty() {
            return None;
        }
        Some(
            self.structure
                .references()
                .map(|r| (r.id(), self.checked(&r), self.derived_copy_or_link(&r, &mut Vec::new())))
                .collect(),
        )
    }

    fn publish_changes(&mut self, before: Option<Snapshot>) {
        let Some(before) = before else {
            return;
        };
        let Some(after) = self.snapshot() else {
            return;
        };
        for ((reference, old_checked, old_col), (_, new_checked, new_col)) in
            before.into_iter().zip(after)
        {
            if old_checked != new_checked {
                self.events.publish(&StatusEvent {
                    reference,
                    change: StatusChange::Checked {
                        old: old_checked,
                        new: new_checked,
                    },
                });
            }
            if old_col != new_col {
                self.events.publish(&StatusEvent {
                    reference,
                    change: StatusChange::CopyOrLink {
                        old: old_col,
                        new: new_col,
                    },
                });
            }
        }
    }
}

fn key_of(reference: &StructureReference<'_>) -> Option<StatusKey> {
    if reference.is_association_group() {
        return None;
    }
    reference
        .part()
        .map(|part| StatusKey::new(part.owner, part.id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use dcp_model::{DomainModel, LinkKind, ObjectKind, PackagePath};
    use std::sync::Mutex;

    struct Fixture {
        status: TreeStatus,
        root: RefId,
        group: RefId,
        child: RefId,
        grandchild: RefId,
        association: RefId,
        table: RefId,
    }

    /// root -covers-> child -details-> grandchild, root -refers(assoc)-> grandchild
    fn fixture(policy: DefaultPolicy) -> Fixture {
        let pkg = PackagePath::default_package;
        let mut model = DomainModel::new();
        let root = model
            .add_object(ObjectKind::ProductCmpt, pkg(), "Root", "src")
            .unwrap();
        let child = model
            .add_object(ObjectKind::ProductCmpt, pkg(), "Child", "src")
            .unwrap();
        let grandchild = model
            .add_object(ObjectKind::ProductCmpt, pkg(), "Grandchild", "src")
            .unwrap();
        let rates = model
            .add_object(ObjectKind::TableContents, pkg(), "Rates", "src")
            .unwrap();
        model.add_link(root, "covers", LinkKind::Composition, Some(child)).unwrap();
        model.add_link(root, "refers", LinkKind::Association, Some(grandchild)).unwrap();
        model.add_table_usage(root, "rates", Some(rates)).unwrap();
        model.add_link(child, "details", LinkKind::Composition, Some(grandchild)).unwrap();

        let structure = Arc::new(ProductStructure::expand(Arc::new(model), root).unwrap());
        let find = |pred: &dyn Fn(&StructureReference<'_>) -> bool| {
            structure.references().find(|r| pred(r)).unwrap().id()
        };
        let group = find(&|r| r.is_association_group() && r.role() == Some("covers"));
        let child_ref = find(&|r| r.target_id() == Some(child));
        let grandchild_ref = find(&|r| r.target_id() == Some(grandchild) && !r.is_pure_association());
        let association = find(&|r| r.is_pure_association());
        let table = find(&|r| r.kind() == ReferenceKind::TableUsage);
        let root_ref = structure.root();

        Fixture {
            status: TreeStatus::new(structure, policy),
            root: root_ref,
            group,
            child: child_ref,
            grandchild: grandchild_ref,
            association,
            table,
        }
    }

    #[test]
    fn root_is_always_checked_copy() {
        let mut f = fixture(DefaultPolicy::AlwaysLink);
        f.status.set_checked(f.root, false);
        f.status.set_copy_or_link(f.root, CopyOrLink::Link);

        assert!(f.status.is_checked(f.root));
        assert_eq!(f.status.copy_or_link(f.root), CopyOrLink::Copy);
        assert!(f.status.is_enabled(f.root));
    }

    #[test]
    fn defaults_follow_policy() {
        let f = fixture(DefaultPolicy::AlwaysCopy);
        assert_eq!(f.status.copy_or_link(f.child), CopyOrLink::Copy);
        assert_eq!(f.status.copy_or_link(f.table), CopyOrLink::Copy);
        assert!(f.status.is_checked(f.child));

        let f = fixture(DefaultPolicy::AlwaysLink);
        assert_eq!(f.status.copy_or_link(f.child), CopyOrLink::Link);
    }

    #[test]
    fn association_defaults_to_link_and_is_cached() {
        let f = fixture(DefaultPolicy::AlwaysCopy);
        let key = f.status.key(f.association).unwrap();
        assert!(f.status.is_association_link(key));
        assert_eq!(f.status.status_of(f.association).unwrap().copy_or_link, CopyOrLink::Link);
        assert!(f.status.is_checked(f.association));
    }

    #[test]
    fn association_reads_copy_while_target_is_copied() {
        let mut f = fixture(DefaultPolicy::AlwaysCopy);
        assert_eq!(f.status.copy_or_link(f.association), CopyOrLink::Copy);

        // Disabling the ownership path makes the association a plain link again
        f.status.set_copy_or_link(f.child, CopyOrLink::Link);
        assert!(!f.status.is_enabled(f.grandchild));
        assert_eq!(f.status.copy_or_link(f.association), CopyOrLink::Link);
    }

    #[test]
    fn group_is_checked_if_any_child_is() {
        let mut f = fixture(DefaultPolicy::AlwaysCopy);
        assert!(f.status.is_checked(f.group));
        assert_eq!(f.status.copy_or_link(f.group), CopyOrLink::Undefined);

        f.status.set_checked(f.child, false);
        assert!(!f.status.is_checked(f.group));

        f.status.set_checked(f.group, true);
        assert!(f.status.is_checked(f.child));
    }

    #[test]
    fn group_copy_or_link_is_not_settable() {
        let mut f = fixture(DefaultPolicy::AlwaysCopy);
        f.status.set_copy_or_link(f.group, CopyOrLink::Link);
        assert_eq!(f.status.copy_or_link(f.group), CopyOrLink::Undefined);
        assert_eq!(f.status.copy_or_link(f.child), CopyOrLink::Copy);
    }

    #[test]
    fn unchecked_ancestor_disables_descendants() {
        let mut f = fixture(DefaultPolicy::AlwaysCopy);
        assert!(f.status.is_enabled(f.grandchild));

        f.status.set_checked(f.child, false);
        assert!(!f.status.is_enabled(f.child));
        assert!(!f.status.is_enabled(f.grandchild));
        assert!(f.status.is_checked(f.grandchild));
    }

    #[test]
    fn enabled_elements_exclude_groups_and_associations() {
        let f = fixture(DefaultPolicy::AlwaysCopy);
        let copied = f.status.all_enabled_elements(CopyOrLink::Copy, false);
        assert_eq!(copied, vec![f.root, f.child, f.grandchild, f.table]);

        let with_assoc = f.status.all_enabled_elements(CopyOrLink::Copy, true);
        assert!(with_assoc.contains(&f.association));
        assert!(!with_assoc.contains(&f.group));
    }

    #[test]
    fn all_elements_ignores_enablement() {
        let mut f = fixture(DefaultPolicy::AlwaysCopy);
        f.status.set_checked(f.child, false);
        let enabled = f.status.all_enabled_elements(CopyOrLink::Copy, false);
        let all = f.status.all_elements(CopyOrLink::Copy, false);
        assert!(!enabled.contains(&f.grandchild));
        assert!(all.contains(&f.grandchild));
    }

    #[test]
    fn status_for_unknown_part_is_an_error() {
        let f = fixture(DefaultPolicy::AlwaysCopy);
        let key = f.status.key(f.child).unwrap();
        assert!(f.status.status(key.owner, key.part).is_ok());

        let other_owner = f.status.key(f.grandchild).unwrap().owner;
        assert_eq!(
            f.status.status(other_owner, key.part),
            Err(StatusError::unknown_part(other_owner, key.part))
        );
    }

    #[test]
    fn events_report_effective_changes() {
        let mut f = fixture(DefaultPolicy::AlwaysCopy);
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&events);
        f.status.subscribe(move |event| sink.lock().unwrap().push(*event));

        f.status.set_copy_or_link(f.child, CopyOrLink::Link);
        let seen = events.lock().unwrap().clone();
        assert!(seen.contains(&StatusEvent {
            reference: f.child,
            change: StatusChange::CopyOrLink {
                old: CopyOrLink::Copy,
                new: CopyOrLink::Link,
            },
        }));
        // The association loses its derived copy
        assert!(seen.contains(&StatusEvent {
            reference: f.association,
            change: StatusChange::CopyOrLink {
                old: CopyOrLink::Copy,
                new: CopyOrLink::Link,
            },
        }));

        events.lock().unwrap().clear();
        f.status.set_copy_or_link(f.child, CopyOrLink::Link);
        assert!(events.lock().unwrap().is_empty());
    }

    #[test]
    fn group_toggle_publishes_one_event() {
        let mut f = fixture(DefaultPolicy::AlwaysCopy);
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&events);
        f.status.subscribe(move |event| sink.lock().unwrap().push(*event));

        f.status.set_checked(f.group, false);
        f.status.set_checked(f.group, false);

        let seen = events.lock().unwrap().clone();
        assert_eq!(
            seen,
            vec![StatusEvent {
                reference: f.group,
                change: StatusChange::Checked { old: true, new: false },
            }]
        );
    }

    #[test]
    fn apply_decision_updates_shared_status() {
        let mut f = fixture(DefaultPolicy::AlwaysCopy);
        let key = f.status.key(f.table).unwrap();
        f.status.apply_decision(key, false, CopyOrLink::Link).unwrap();

        assert!(!f.status.is_checked(f.table));
        assert_eq!(f.status.copy_or_link(f.table), CopyOrLink::Link);

        f.status.apply_decision(key, true, CopyOrLink::Undefined).unwrap();
        assert!(f.status.is_checked(f.table));
        assert_eq!(f.status.copy_or_link(f.table), CopyOrLink::Link);
    }
}
