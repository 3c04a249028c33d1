//! Product structure: the tree of references to copy
//!
//! A [`ProductStructure`] is a tree of *positions*. Every position is a
//! [`StructureReference`]: a component (root or link target), an association
//! group collecting the targets of one association role, or a table usage.
//! The same object may be reachable from several positions; those positions
//! are distinct references that may share the same underlying [`Part`].
//!
//! Structures are immutable once built. Rebuild a new structure whenever the
//! source changes.

use crate::object::{DomainModel, DomainObject, LinkKind, ModelError, ObjectId, Part, PartId, PartKind};
use std::fmt::{self, Display, Formatter};
use std::sync::Arc;

/// Position of a reference within one [`ProductStructure`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RefId(u32);

impl RefId {
    /// Raw index of the position
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl Display for RefId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "ref#{}", self.0)
    }
}

/// Kind of a structure reference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReferenceKind {
    /// Product component (the root or the target of a link)
    Component,

    /// Grouping of all targets of one association role
    AssociationGroup,

    /// Usage of a table contents
    TableUsage,
}

#[derive(Debug, Clone)]
enum NodeKind {
    Component {
        object: ObjectId,
        link: Option<PartId>,
    },
    AssociationGroup {
        role: String,
        link_kind: LinkKind,
    },
    TableUsage {
        usage: PartId,
    },
}

#[derive(Debug, Clone)]
struct Node {
    kind: NodeKind,
    parent: Option<RefId>,
    children: Vec<RefId>,
}

/// Tree of references rooted at one product component
#[derive(Debug, Clone)]
pub struct ProductStructure {
    model: Arc<DomainModel>,
    root_object: DomainObject,
    nodes: Vec<Node>,
    preorder: Vec<RefId>,
}

impl ProductStructure {
    /// Expand the structure of `root` by following every part in `model`
    ///
    /// Links are grouped by role and kind into association groups, table
    /// usages are attached to their owning component, dangling links are
    /// skipped.
    ///
    /// # Errors
    /// Returns [`StructureError::Cycle`] if an object is reachable from itself
    pub fn expand(model: Arc<DomainModel>, root: ObjectId) -> Result<Self, StructureError> {
        let mut builder = StructureBuilder::new(model, root)?;
        let mut chain = vec![root];
        let root_ref = builder.root();
        builder.expand_component(root_ref, root, &mut chain)?;
        let structure = builder.build();
        tracing::debug!(
            root = %structure.root_object.qualified_name(),
            positions = structure.len(),
            "expanded product structure"
        );
        Ok(structure)
    }

    /// The root position
    #[inline]
    #[must_use]
    pub fn root(&self) -> RefId {
        RefId(0)
    }

    /// The root object
    #[inline]
    #[must_use]
    pub fn root_object(&self) -> &DomainObject {
        &self.root_object
    }

    /// Reference handle for a position of this structure
    ///
    /// # Panics
    /// Accessors on the returned handle panic if `id` was not issued by this
    /// structure. Use [`ProductStructure::get`] for unchecked ids.
    #[inline]
    #[must_use]
    pub fn reference(&self, id: RefId) -> StructureReference<'_> {
        StructureReference {
            structure: self,
            id,
        }
    }

    /// Reference handle if `id` belongs to this structure
    #[inline]
    #[must_use]
    pub fn get(&self, id: RefId) -> Option<StructureReference<'_>> {
        self.contains(id).then(|| self.reference(id))
    }

    /// Check whether `id` is a position of this structure
    #[inline]
    #[must_use]
    pub fn contains(&self, id: RefId) -> bool {
        id.index() < self.nodes.len()
    }

    /// All positions in depth-first preorder, starting at the root
    pub fn references(&self) -> impl Iterator<Item = StructureReference<'_>> {
        self.preorder.iter().map(move |id| self.reference(*id))
    }

    /// Number of positions
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Always false: a structure has at least its root
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// The source model
    #[inline]
    #[must_use]
    pub fn model(&self) -> &DomainModel {
        &self.model
    }

    /// Shared handle to the source model
    #[inline]
    #[must_use]
    pub fn model_arc(&self) -> &Arc<DomainModel> {
        &self.model
    }

    fn node(&self, id: RefId) -> &Node {
        &self.nodes[id.index()]
    }
}

/// One position in a [`ProductStructure`]
#[derive(Debug, Clone, Copy)]
pub struct StructureReference<'a> {
    structure: &'a ProductStructure,
    id: RefId,
}

impl<'a> StructureReference<'a> {
    /// Position id
    #[inline]
    #[must_use]
    pub fn id(&self) -> RefId {
        self.id
    }

    /// The structure this reference belongs to
    #[inline]
    #[must_use]
    pub fn structure(&self) -> &'a ProductStructure {
        self.structure
    }

    /// Reference kind
    #[must_use]
    pub fn kind(&self) -> ReferenceKind {
        match self.structure.node(self.id).kind {
            NodeKind::Component { .. } => ReferenceKind::Component,
            NodeKind::AssociationGroup { .. } => ReferenceKind::AssociationGroup,
            NodeKind::TableUsage { .. } => ReferenceKind::TableUsage,
        }
    }

    /// Check if this is an association group
    #[inline]
    #[must_use]
    pub fn is_association_group(&self) -> bool {
        self.kind() == ReferenceKind::AssociationGroup
    }

    /// Check if this is the root position
    #[inline]
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.structure.node(self.id).parent.is_none()
    }

    /// Parent position, `None` for the root
    #[inline]
    #[must_use]
    pub fn parent(&self) -> Option<StructureReference<'a>> {
        self.structure
            .node(self.id)
            .parent
            .map(|id| self.structure.reference(id))
    }

    /// Child positions in order
    pub fn children(&self) -> impl Iterator<Item = StructureReference<'a>> + 'a {
        let structure = self.structure;
        structure
            .node(self.id)
            .children
            .iter()
            .map(move |id| structure.reference(*id))
    }

    /// Strict ancestors, nearest first
    pub fn ancestors(&self) -> impl Iterator<Item = StructureReference<'a>> + 'a {
        std::iter::successors(self.parent(), StructureReference::parent)
    }

    /// Id of the wrapped part (link or table usage)
    ///
    /// `None` for the root and for association groups.
    #[must_use]
    pub fn part_id(&self) -> Option<PartId> {
        match self.structure.node(self.id).kind {
            NodeKind::Component { link, .. } => link,
            NodeKind::TableUsage { usage } => Some(usage),
            NodeKind::AssociationGroup { .. } => None,
        }
    }

    /// The wrapped part
    #[must_use]
    pub fn part(&self) -> Option<&'a Part> {
        self.part_id().and_then(|id| self.structure.model.part(id))
    }

    /// Object owning the wrapped part
    #[must_use]
    pub fn owner_id(&self) -> Option<ObjectId> {
        self.part().map(|part| part.owner)
    }

    /// Id of the referenced object
    ///
    /// The component itself, or the table contents of a table usage.
    #[must_use]
    pub fn target_id(&self) -> Option<ObjectId> {
        match self.structure.node(self.id).kind {
            NodeKind::Component { object, .. } => Some(object),
            NodeKind::TableUsage { .. } => self.part().and_then(|part| part.target),
            NodeKind::AssociationGroup { .. } => None,
        }
    }

    /// The referenced object
    #[must_use]
    pub fn target_object(&self) -> Option<&'a DomainObject> {
        self.target_id()
            .and_then(|id| self.structure.model.object(id))
    }

    /// Role name of the group or of the wrapped part
    #[must_use]
    pub fn role(&self) -> Option<&'a str> {
        match &self.structure.node(self.id).kind {
            NodeKind::AssociationGroup { role, .. } => Some(role.as_str()),
            _ => self.part().map(|part| part.role.as_str()),
        }
    }

    /// Link kind of an association group or of a linked component
    #[must_use]
    pub fn link_kind(&self) -> Option<LinkKind> {
        match &self.structure.node(self.id).kind {
            NodeKind::AssociationGroup { link_kind, .. } => Some(*link_kind),
            _ => match self.part()?.kind {
                PartKind::Link(kind) => Some(kind),
                PartKind::TableUsage => None,
            },
        }
    }

    /// Whether this component is reached through a pure association
    #[must_use]
    pub fn is_pure_association(&self) -> bool {
        self.kind() == ReferenceKind::Component
            && self.part().is_some_and(|part| part.kind.is_association())
    }
}

impl Display for StructureReference<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match (self.kind(), self.target_object()) {
            (ReferenceKind::AssociationGroup, _) => {
                write!(f, "[{}]", self.role().unwrap_or_default())
            }
            (_, Some(object)) => f.write_str(&object.qualified_name()),
            (_, None) => write!(f, "<{}>", self.role().unwrap_or("unresolved")),
        }
    }
}

/// Incremental builder for a [`ProductStructure`]
///
/// Positions are validated against the model as they are added.
#[derive(Debug)]
pub struct StructureBuilder {
    model: Arc<DomainModel>,
    root_object: DomainObject,
    nodes: Vec<Node>,
}

impl StructureBuilder {
    /// Start a structure rooted at `root`
    ///
    /// # Errors
    /// Returns error if `root` is unknown or not a product component
    pub fn new(model: Arc<DomainModel>, root: ObjectId) -> Result<Self, StructureError> {
        let root_object = model
            .object(root)
            .cloned()
            .ok_or(ModelError::UnknownObject(root))?;
        if !root_object.kind.is_product_cmpt() {
            return Err(StructureError::RootNotProductCmpt(root_object.qualified_name()));
        }
        Ok(Self {
            model,
            root_object,
            nodes: vec![Node {
                kind: NodeKind::Component {
                    object: root,
                    link: None,
                },
                parent: None,
                children: Vec::new(),
            }],
        })
    }

    /// The root position
    #[inline]
    #[must_use]
    pub fn root(&self) -> RefId {
        RefId(0)
    }

    /// Add an association group below a component
    ///
    /// # Errors
    /// Returns error if `parent` is not a component
    pub fn add_association_group(
        &mut self,
        parent: RefId,
        role: impl Into<String>,
        link_kind: LinkKind,
    ) -> Result<RefId, StructureError> {
        self.component_object(parent)?;
        Ok(self.push(
            parent,
            NodeKind::AssociationGroup {
                role: role.into(),
                link_kind,
            },
        ))
    }

    /// Add the target of `link` below an association group
    ///
    /// # Errors
    /// Returns error if `group` is not an association group or `link` does not
    /// belong to the group's component, role and kind
    pub fn add_component(&mut self, group: RefId, link: PartId) -> Result<RefId, StructureError> {
        let (role, link_kind, owner) = match &self.node(group)?.kind {
            NodeKind::AssociationGroup { role, link_kind } => {
                let parent = self.node(group)?.parent.ok_or(StructureError::NotAComponent(group))?;
                (role.clone(), *link_kind, self.component_object(parent)?)
            }
            _ => return Err(StructureError::NotAnAssociationGroup(group)),
        };

        let part = self.model.part(link).ok_or(StructureError::UnknownPart(link))?;
        if part.kind != PartKind::Link(link_kind) || part.role != role {
            return Err(StructureError::part_mismatch(
                link,
                format!("expected a {link_kind:?} link for role '{role}'"),
            ));
        }
        if part.owner != owner {
            return Err(StructureError::part_mismatch(
                link,
                "link is not owned by the group's component",
            ));
        }
        let object = part.target.ok_or(StructureError::DanglingLink(link))?;

        Ok(self.push(
            group,
            NodeKind::Component {
                object,
                link: Some(link),
            },
        ))
    }

    /// Add a table usage below a component
    ///
    /// # Errors
    /// Returns error if `parent` is not a component or `usage` is not one of
    /// its table usages
    pub fn add_table_usage(&mut self, parent: RefId, usage: PartId) -> Result<RefId, StructureError> {
        let owner = self.component_object(parent)?;
        let part = self.model.part(usage).ok_or(StructureError::UnknownPart(usage))?;
        if part.kind != PartKind::TableUsage {
            return Err(StructureError::part_mismatch(usage, "expected a table usage"));
        }
        if part.owner != owner {
            return Err(StructureError::part_mismatch(
                usage,
                "table usage is not owned by the parent component",
            ));
        }
        Ok(self.push(parent, NodeKind::TableUsage { usage }))
    }

    /// Finish the structure
    #[must_use]
    pub fn build(self) -> ProductStructure {
        let mut preorder = Vec::with_capacity(self.nodes.len());
        let mut stack = vec![RefId(0)];
        while let Some(id) = stack.pop() {
            preorder.push(id);
            stack.extend(self.nodes[id.index()].children.iter().rev().copied());
        }

        ProductStructure {
            model: self.model,
            root_object: self.root_object,
            nodes: self.nodes,
            preorder,
        }
    }

    fn expand_component(
        &mut self,
        node: RefId,
        object: ObjectId,
        chain: &mut Vec<ObjectId>,
    ) -> Result<(), StructureError> {
        let model = Arc::clone(&self.model);
        let mut groups: Vec<(&str, LinkKind, RefId)> = Vec::new();

        for part in model.parts_of(object) {
            let kind = match part.kind {
                PartKind::TableUsage => {
                    self.add_table_usage(node, part.id)?;
                    continue;
                }
                PartKind::Link(kind) => kind,
            };
            let Some(target) = part.target else {
                tracing::debug!(part = %part.id, role = %part.role, "skipping dangling link");
                continue;
            };

            let group = match groups
                .iter()
                .find(|(role, link_kind, _)| *role == part.role && *link_kind == kind)
            {
                Some((_, _, group)) => *group,
                None => {
                    let group = self.add_association_group(node, part.role.clone(), kind)?;
                    groups.push((part.role.as_str(), kind, group));
                    group
                }
            };

            if chain.contains(&target) {
                let path = chain
                    .iter()
                    .chain(std::iter::once(&target))
                    .filter_map(|id| model.object(*id))
                    .map(DomainObject::qualified_name)
                    .collect::<Vec<_>>()
                    .join(" -> ");
                return Err(StructureError::Cycle { path });
            }

            let child = self.add_component(group, part.id)?;
            chain.push(target);
            self.expand_component(child, target, chain)?;
            chain.pop();
        }

        Ok(())
    }

    fn push(&mut self, parent: RefId, kind: NodeKind) -> RefId {
        let id = RefId(u32::try_from(self.nodes.len()).unwrap_or(u32::MAX));
        self.nodes.push(Node {
            kind,
            parent: Some(parent),
            children: Vec::new(),
        });
        self.nodes[parent.index()].children.push(id);
        id
    }

    fn node(&self, id: RefId) -> Result<&Node, StructureError> {
        self.nodes
            .get(id.index())
            .ok_or(StructureError::UnknownReference(id))
    }

    fn component_object(&self, id: RefId) -> Result<ObjectId, StructureError> {
        match self.node(id)?.kind {
            NodeKind::Component { object, .. } => Ok(object),
            _ => Err(StructureError::NotAComponent(id)),
        }
    }
}

/// Errors building a product structure
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StructureError {
    /// Underlying model lookup failed
    #[error("model error: {0}")]
    Model(#[from] ModelError),

    /// Root must be a product component or template
    #[error("structure root must be a product component: {0}")]
    RootNotProductCmpt(String),

    /// Position id not issued by this builder
    #[error("unknown reference: {0}")]
    UnknownReference(RefId),

    /// Part id not part of the model
    #[error("unknown part: {0}")]
    UnknownPart(PartId),

    /// Expected a component position
    #[error("{0} is not a component reference")]
    NotAComponent(RefId),

    /// Expected an association group position
    #[error("{0} is not an association group")]
    NotAnAssociationGroup(RefId),

    /// Part does not fit where it was added
    #[error("part {part} does not fit here: {reason}")]
    PartMismatch {
        /// Offending part
        part: PartId,
        /// What did not fit
        reason: String,
    },

    /// Link without a resolvable target
    #[error("link {0} has no target")]
    DanglingLink(PartId),

    /// Object reachable from itself
    #[error("cycle in product structure: {path}")]
    Cycle {
        /// Qualified names along the cycle
        path: String,
    },
}

impl StructureError {
    /// Create part mismatch error
    pub fn part_mismatch(part: PartId, reason: impl Into<String>) -> Self {
        Self::PartMismatch {
            part,
            reason: reason.into(),
        }
    }
}
