use crate::catalog::CatalogItem;
use crate::category::{Category, Role};
use crate::ids;
use serde::{Deserialize, Serialize};

/// What a graph node is. Mapping nodes belong to exactly one
/// (category, role) pair for their whole lifetime; filter nodes have no
/// role; region nodes are structural headers and never connectable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeKind {
    Mapping { category: Category, role: Role },
    ClassFilter,
    Region { category: Category },
}

/// Category-specific payload carried by a node.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeAttrs {
    /// Originating property set, for property source nodes.
    pub pset: Option<String>,
    /// Unit string, for quantity nodes.
    pub unit: Option<String>,
    /// Sub-type tag, for classification source nodes.
    pub subtype: Option<String>,
    /// Currently selected entity classes, for filter nodes.
    pub selected_classes: Vec<String>,
    /// True for user-authored nodes; their business identifier is the
    /// label, never the id suffix.
    pub custom: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MappingNode {
    pub id: String,
    pub kind: NodeKind,
    pub label: String,
    pub attrs: NodeAttrs,
}

impl MappingNode {
    /// A pre-supplied node built from a catalog item. The item detail lands
    /// in the attribute slot its category prescribes.
    pub fn supplied(category: Category, role: Role, item: &CatalogItem) -> Self {
        let mut attrs = NodeAttrs::default();
        match (category, role) {
            (Category::Property, Role::Source) => attrs.pset = item.detail.clone(),
            (Category::Quantity, _) => attrs.unit = item.detail.clone(),
            (Category::Classification, Role::Source) => attrs.subtype = item.detail.clone(),
            _ => {}
        }
        Self {
            id: ids::supplied_node_id(role, category, &item.id),
            kind: NodeKind::Mapping { category, role },
            label: item.label.clone(),
            attrs,
        }
    }

    /// A user-authored mapping node. `stamp` is a creation timestamp in
    /// milliseconds, keeping the id disjoint from pre-supplied ids.
    pub fn custom(role: Role, category: Category, label: String, pset: Option<String>, stamp: u64) -> Self {
        Self {
            id: ids::custom_node_id(role, category, stamp),
            kind: NodeKind::Mapping { category, role },
            label,
            attrs: NodeAttrs {
                pset,
                custom: true,
                ..NodeAttrs::default()
            },
        }
    }

    /// A class-filter node with an initially empty selection.
    pub fn class_filter(label: String, stamp: u64) -> Self {
        Self {
            id: ids::filter_node_id(stamp),
            kind: NodeKind::ClassFilter,
            label,
            attrs: NodeAttrs {
                custom: true,
                ..NodeAttrs::default()
            },
        }
    }

    /// The structural header node for a category region.
    pub fn region(category: Category) -> Self {
        Self {
            id: ids::region_node_id(category),
            kind: NodeKind::Region { category },
            label: category.title().to_string(),
            attrs: NodeAttrs::default(),
        }
    }

    pub fn is_region(&self) -> bool {
        matches!(self.kind, NodeKind::Region { .. })
    }

    pub fn is_filter(&self) -> bool {
        self.kind == NodeKind::ClassFilter
    }

    /// Role of a mapping node, `None` for filters and regions.
    pub fn role(&self) -> Option<Role> {
        match self.kind {
            NodeKind::Mapping { role, .. } => Some(role),
            _ => None,
        }
    }

    pub fn category(&self) -> Option<Category> {
        match self.kind {
            NodeKind::Mapping { category, .. } | NodeKind::Region { category } => Some(category),
            NodeKind::ClassFilter => None,
        }
    }
}

/// What an edge means.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EdgeKind {
    Mapping { category: Category },
    ClassFilter,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MappingEdge {
    pub id: String,
    pub kind: EdgeKind,
    /// For filter edges: the filter node's selection, copied at creation
    /// time. For mapping edges: the deduplicated union of all filter edges
    /// into the source node, empty when no filter applies. Never a live
    /// reference; re-selecting classes later does not rewrite this.
    pub class_filter: Vec<String>,
}

impl MappingEdge {
    pub fn mapping(id: String, category: Category, class_filter: Vec<String>) -> Self {
        Self {
            id,
            kind: EdgeKind::Mapping { category },
            class_filter,
        }
    }

    pub fn filter(id: String, selected_classes: Vec<String>) -> Self {
        Self {
            id,
            kind: EdgeKind::ClassFilter,
            class_filter: selected_classes,
        }
    }

    pub fn is_class_filter(&self) -> bool {
        self.kind == EdgeKind::ClassFilter
    }

    /// Property-set mapping edges are the ones mirrored in the
    /// configuration.
    pub fn is_pset_mapping(&self) -> bool {
        self.kind
            == (EdgeKind::Mapping {
                category: Category::PropertySet,
            })
    }

    pub fn category(&self) -> Option<Category> {
        match self.kind {
            EdgeKind::Mapping { category } => Some(category),
            EdgeKind::ClassFilter => None,
        }
    }
}
