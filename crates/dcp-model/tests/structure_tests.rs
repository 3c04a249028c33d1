use dcp_model::{
    DomainModel, LinkKind, ObjectId, ObjectKind, PackagePath, ProductStructure, ReferenceKind,
    StructureError,
};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use std::collections::HashSet;
use std::sync::Arc;

fn pkg(s: &str) -> PackagePath {
    s.parse().unwrap()
}

/// Build a model where object `i` (i > 0) is linked from object `parents[i - 1] % i`
fn random_tree(parents: &[usize], associations: &[bool]) -> (DomainModel, ObjectId) {
    let mut model = DomainModel::new();
    let mut ids = Vec::new();
    for i in 0..=parents.len() {
        let id = model
            .add_object(ObjectKind::ProductCmpt, pkg("p"), format!("Obj{i} 2024-01"), "src")
            .unwrap();
        ids.push(id);
    }
    for (i, parent) in parents.iter().enumerate() {
        let child = i + 1;
        let owner = ids[parent % child];
        let kind = if associations.get(i).copied().unwrap_or(false) {
            LinkKind::Association
        } else {
            LinkKind::Composition
        };
        model
            .add_link(owner, format!("role{}", i % 3), kind, Some(ids[child]))
            .unwrap();
    }
    (model, ids[0])
}

proptest! {
    #[test]
    fn prop_preorder_visits_parents_first(
        parents in proptest::collection::vec(0..50usize, 0..25),
        associations in proptest::collection::vec(any::<bool>(), 0..25),
    ) {
        let (model, root) = random_tree(&parents, &associations);
        let structure = ProductStructure::expand(Arc::new(model), root).unwrap();

        let mut seen = HashSet::new();
        for reference in structure.references() {
            if let Some(parent) = reference.parent() {
                prop_assert!(seen.contains(&parent.id()));
            } else {
                prop_assert!(reference.is_root());
            }
            seen.insert(reference.id());
        }
        prop_assert_eq!(seen.len(), structure.len());
    }

    #[test]
    fn prop_every_component_below_root_sits_in_a_group(
        parents in proptest::collection::vec(0..50usize, 0..25),
    ) {
        let (model, root) = random_tree(&parents, &[]);
        let structure = ProductStructure::expand(Arc::new(model), root).unwrap();

        let components = structure
            .references()
            .filter(|r| r.kind() == ReferenceKind::Component)
            .count();
        prop_assert_eq!(components, parents.len() + 1);

        for reference in structure.references().filter(|r| !r.is_root()) {
            if reference.kind() == ReferenceKind::Component {
                let parent = reference.parent().unwrap();
                prop_assert_eq!(parent.kind(), ReferenceKind::AssociationGroup);
                prop_assert_eq!(parent.role(), reference.role());
            }
            prop_assert!(reference.ancestors().last().unwrap().is_root());
        }
    }

    #[test]
    fn prop_removing_common_prefix_keeps_suffix(
        a in proptest::collection::vec("[a-c]", 0..5),
        b in proptest::collection::vec("[a-c]", 0..5),
    ) {
        let a = PackagePath::new(a);
        let b = PackagePath::new(b);
        let common = a.matching_first_segments(&b);
        prop_assert!(common <= a.len().min(b.len()));
        prop_assert_eq!(
            a.remove_first_segments(common).len() + common,
            a.len()
        );
        prop_assert_eq!(common, b.matching_first_segments(&a));
    }
}

#[test]
fn shared_part_at_two_positions() {
    // root -a-> mid1 -x-> leaf and root -b-> mid2 -x-> leaf share the leaf object
    let mut model = DomainModel::new();
    let root = model
        .add_object(ObjectKind::ProductCmpt, pkg("p"), "Root", "src")
        .unwrap();
    let mid1 = model
        .add_object(ObjectKind::ProductCmpt, pkg("p"), "Mid1", "src")
        .unwrap();
    let mid2 = model
        .add_object(ObjectKind::ProductCmpt, pkg("p"), "Mid2", "src")
        .unwrap();
    let leaf = model
        .add_object(ObjectKind::ProductCmpt, pkg("p"), "Leaf", "src")
        .unwrap();
    model.add_link(root, "a", LinkKind::Composition, Some(mid1)).unwrap();
    model.add_link(root, "b", LinkKind::Composition, Some(mid2)).unwrap();
    model.add_link(mid1, "x", LinkKind::Association, Some(leaf)).unwrap();
    model.add_link(mid2, "x", LinkKind::Association, Some(leaf)).unwrap();

    let structure = ProductStructure::expand(Arc::new(model), root).unwrap();
    let leaves: Vec<_> = structure
        .references()
        .filter(|r| r.target_id() == Some(leaf))
        .collect();

    assert_eq!(leaves.len(), 2);
    assert_ne!(leaves[0].id(), leaves[1].id());
    assert_ne!(leaves[0].part_id(), leaves[1].part_id());
    assert!(leaves.iter().all(|r| r.is_pure_association()));
}

#[test]
fn self_link_is_a_cycle() {
    let mut model = DomainModel::new();
    let root = model
        .add_object(ObjectKind::ProductCmpt, pkg("p"), "Root", "src")
        .unwrap();
    model.add_link(root, "me", LinkKind::Aggregation, Some(root)).unwrap();

    match ProductStructure::expand(Arc::new(model), root) {
        Err(StructureError::Cycle { path }) => assert_eq!(path, "p.Root -> p.Root"),
        other => panic!("expected cycle, got {other:?}"),
    }
}

#[test]
fn table_contents_cannot_be_root() {
    let mut model = DomainModel::new();
    let table = model
        .add_object(ObjectKind::TableContents, pkg("p"), "Rates", "src")
        .unwrap();

    let result = ProductStructure::expand(Arc::new(model), table);
    assert!(matches!(result, Err(StructureError::RootNotProductCmpt(_))));
}
