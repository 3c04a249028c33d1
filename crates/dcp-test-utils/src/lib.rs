//! Testing utilities for the DCP workspace
//!
//! Shared model builders and structure fixtures.

#![allow(missing_docs)]

use dcp_model::{
    DomainModel, LinkKind, ObjectId, ObjectKind, PackagePath, PartId, ProductStructure, RefId,
    ReferenceKind,
};
use std::sync::Arc;

/// Split `old.pkg.Name` into package and name at the last dot
pub fn split_qualified(qualified: &str) -> (PackagePath, &str) {
    match qualified.rfind('.') {
        Some(idx) => (qualified[..idx].parse().unwrap(), &qualified[idx + 1..]),
        None => (PackagePath::default_package(), qualified),
    }
}

/// Fluent [`DomainModel`] builder for tests
#[derive(Debug, Default)]
pub struct TestModel {
    model: DomainModel,
}

impl TestModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Product component in storage root `src`
    pub fn product(&mut self, qualified: &str) -> ObjectId {
        self.product_in(qualified, "src")
    }

    pub fn product_in(&mut self, qualified: &str, storage_root: &str) -> ObjectId {
        self.object(ObjectKind::ProductCmpt, qualified, storage_root)
    }

    pub fn template(&mut self, qualified: &str) -> ObjectId {
        self.object(ObjectKind::ProductTemplate, qualified, "src")
    }

    pub fn table(&mut self, qualified: &str) -> ObjectId {
        self.object(ObjectKind::TableContents, qualified, "src")
    }

    pub fn object(&mut self, kind: ObjectKind, qualified: &str, storage_root: &str) -> ObjectId {
        let (package, name) = split_qualified(qualified);
        self.model
            .add_object(kind, package, name, storage_root)
            .unwrap()
    }

    pub fn compose(&mut self, owner: ObjectId, role: &str, target: ObjectId) -> PartId {
        self.link(owner, role, LinkKind::Composition, Some(target))
    }

    pub fn aggregate(&mut self, owner: ObjectId, role: &str, target: ObjectId) -> PartId {
        self.link(owner, role, LinkKind::Aggregation, Some(target))
    }

    pub fn associate(&mut self, owner: ObjectId, role: &str, target: ObjectId) -> PartId {
        self.link(owner, role, LinkKind::Association, Some(target))
    }

    pub fn link(
        &mut self,
        owner: ObjectId,
        role: &str,
        kind: LinkKind,
        target: Option<ObjectId>,
    ) -> PartId {
        self.model.add_link(owner, role, kind, target).unwrap()
    }

    pub fn use_table(&mut self, owner: ObjectId, role: &str, table: Option<ObjectId>) -> PartId {
        self.model.add_table_usage(owner, role, table).unwrap()
    }

    pub fn build(self) -> Arc<DomainModel> {
        Arc::new(self.model)
    }
}

/// Expand the structure of `root`
pub fn expand(model: &Arc<DomainModel>, root: ObjectId) -> Arc<ProductStructure> {
    Arc::new(ProductStructure::expand(Arc::clone(model), root).unwrap())
}

/// First non-association position referring to `object`
pub fn find_ref(structure: &ProductStructure, object: ObjectId) -> RefId {
    structure
        .references()
        .find(|r| !r.is_association_group() && !r.is_pure_association() && r.target_id() == Some(object))
        .map(|r| r.id())
        .unwrap()
}

/// All positions referring to `object`, associations included
pub fn find_all(structure: &ProductStructure, object: ObjectId) -> Vec<RefId> {
    structure
        .references()
        .filter(|r| r.target_id() == Some(object))
        .map(|r| r.id())
        .collect()
}

/// First pure association position referring to `object`
pub fn find_association(structure: &ProductStructure, object: ObjectId) -> RefId {
    structure
        .references()
        .find(|r| r.is_pure_association() && r.target_id() == Some(object))
        .map(|r| r.id())
        .unwrap()
}

/// First association group with `role`
pub fn find_group(structure: &ProductStructure, role: &str) -> RefId {
    structure
        .references()
        .find(|r| r.kind() == ReferenceKind::AssociationGroup && r.role() == Some(role))
        .map(|r| r.id())
        .unwrap()
}

/// Sample product structure
///
/// ```text
/// old.pkg.Home 2024-01                (src)
/// ├── [coverages] composition
/// │   ├── old.pkg.Fire 2024-01         (src)
/// │   │   └── [tariff] association -> old.pkg.sub.Tariff 2024-01
/// │   └── old.pkg.sub.Theft 2024-01    (src)
/// ├── [tariffs] aggregation
/// │   └── old.pkg.sub.Tariff 2024-01   (src)
/// ├── [base] association
/// │   └── shared.Base 2024-01          (lib)
/// └── rates -> old.pkg.Rates           (table usage)
/// ```
#[derive(Debug)]
pub struct Sample {
    pub model: Arc<DomainModel>,
    pub structure: Arc<ProductStructure>,
    pub home: ObjectId,
    pub fire: ObjectId,
    pub theft: ObjectId,
    pub tariff: ObjectId,
    pub base: ObjectId,
    pub rates: ObjectId,
}

impl Sample {
    pub fn new() -> Self {
        let mut m = TestModel::new();
        let home = m.product("old.pkg.Home 2024-01");
        let fire = m.product("old.pkg.Fire 2024-01");
        let theft = m.product("old.pkg.sub.Theft 2024-01");
        let tariff = m.product("old.pkg.sub.Tariff 2024-01");
        let base = m.product_in("shared.Base 2024-01", "lib");
        let rates = m.table("old.pkg.Rates");

        m.compose(home, "coverages", fire);
        m.compose(home, "coverages", theft);
        m.aggregate(home, "tariffs", tariff);
        m.associate(home, "base", base);
        m.use_table(home, "rates", Some(rates));
        m.associate(fire, "tariff", tariff);

        let model = m.build();
        let structure = expand(&model, home);
        Self {
            model,
            structure,
            home,
            fire,
            theft,
            tariff,
            base,
            rates,
        }
    }

    pub fn root(&self) -> RefId {
        self.structure.root()
    }

    pub fn find(&self, object: ObjectId) -> RefId {
        find_ref(&self.structure, object)
    }

    pub fn association(&self, object: ObjectId) -> RefId {
        find_association(&self.structure, object)
    }

    pub fn group(&self, role: &str) -> RefId {
        find_group(&self.structure, role)
    }
}

impl Default for Sample {
    fn default() -> Self {
        Self::new()
    }
}
