//! Connection validation and normalization.
//!
//! [`plan`] is pure: it inspects the graph through [`ConnectView`] and
//! returns a [`ConnectionPlan`] describing the edge to insert, or a
//! [`ConnectError`] explaining the rejection. Applying the plan is the
//! caller's job, which keeps the rules testable without a display graph.

use crate::category::Category;
use crate::ids;
use crate::node::{MappingEdge, MappingNode, NodeKind};
use petgraph::stable_graph::NodeIndex;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConnectError {
    #[error("unknown endpoint `{0}`")]
    UnknownEndpoint(String),
    // Field names avoid `source`, which thiserror reserves for error
    // chaining.
    #[error("an edge between `{from}` and `{to}` already exists")]
    DuplicateEdge { from: String, to: String },
    #[error("class filters attach only to source nodes, `{0}` is not one")]
    FilterTargetNotSource(String),
    #[error("cannot map across categories ({origin} to {destination})")]
    CrossCategory { origin: Category, destination: Category },
    #[error("a mapping needs one source and one target endpoint")]
    RoleMismatch,
    #[error("region headers are not connectable")]
    RegionEndpoint,
}

/// Read-only view of the graph the planner validates against. Implemented
/// by [`crate::MappingGraph`] and by the editor's display graph.
pub trait ConnectView {
    fn node(&self, idx: NodeIndex) -> Option<&MappingNode>;
    fn has_edge(&self, source: NodeIndex, target: NodeIndex) -> bool;
    /// Deduplicated union of the class selections carried by every filter
    /// edge ending at `idx`.
    fn filter_classes_into(&self, idx: NodeIndex) -> Vec<String>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanKind {
    Mapping,
    ClassFilter,
}

/// The change a property-set mapping edge implies for the canonical
/// configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappingUpdate {
    pub source: String,
    pub target: String,
    pub category: Category,
    pub class_filter: Vec<String>,
}

/// A validated, normalized edge insertion. `source` and `target` are
/// already in canonical direction.
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectionPlan {
    pub kind: PlanKind,
    pub source: NodeIndex,
    pub target: NodeIndex,
    pub edge: MappingEdge,
    pub update: Option<MappingUpdate>,
}

/// Validate a proposed connection between `origin` and `dest`, the endpoints
/// in the order the user drew them.
pub fn plan<V: ConnectView>(view: &V, origin: NodeIndex, dest: NodeIndex) -> Result<ConnectionPlan, ConnectError> {
    let origin_node = view
        .node(origin)
        .ok_or_else(|| ConnectError::UnknownEndpoint(format!("{origin:?}")))?;
    let dest_node = view
        .node(dest)
        .ok_or_else(|| ConnectError::UnknownEndpoint(format!("{dest:?}")))?;

    // The proposed pair is rejected before any normalization, so drawing the
    // same gesture twice fails no matter which direction it was drawn in.
    if view.has_edge(origin, dest) {
        return Err(ConnectError::DuplicateEdge {
            from: origin_node.id.clone(),
            to: dest_node.id.clone(),
        });
    }

    if origin_node.is_region() || dest_node.is_region() {
        return Err(ConnectError::RegionEndpoint);
    }

    if origin_node.is_filter() {
        return plan_filter(view, origin, origin_node, dest, dest_node);
    }
    if dest_node.is_filter() {
        // Filter edges always run filter -> source; a gesture ending on the
        // filter is the same attachment drawn backwards.
        return plan_filter(view, dest, dest_node, origin, origin_node);
    }

    plan_mapping(view, origin, origin_node, dest, dest_node)
}

fn plan_filter<V: ConnectView>(
    view: &V,
    filter: NodeIndex,
    filter_node: &MappingNode,
    attach: NodeIndex,
    attach_node: &MappingNode,
) -> Result<ConnectionPlan, ConnectError> {
    match attach_node.kind {
        NodeKind::Mapping { role: crate::category::Role::Source, .. } => {}
        _ => return Err(ConnectError::FilterTargetNotSource(attach_node.id.clone())),
    }

    // The raw-pair check upstream misses a reversed gesture onto an
    // existing attachment; re-check in canonical filter -> source direction.
    if view.has_edge(filter, attach) {
        return Err(ConnectError::DuplicateEdge {
            from: filter_node.id.clone(),
            to: attach_node.id.clone(),
        });
    }

    // The selection travels on the edge as a snapshot; later changes to the
    // filter node do not rewrite edges already drawn.
    let edge = MappingEdge::filter(
        ids::filter_edge_id(&filter_node.id, &attach_node.id),
        filter_node.attrs.selected_classes.clone(),
    );
    Ok(ConnectionPlan {
        kind: PlanKind::ClassFilter,
        source: filter,
        target: attach,
        edge,
        update: None,
    })
}

fn plan_mapping<V: ConnectView>(
    view: &V,
    origin: NodeIndex,
    origin_node: &MappingNode,
    dest: NodeIndex,
    dest_node: &MappingNode,
) -> Result<ConnectionPlan, ConnectError> {
    use crate::category::Role;

    let (origin_cat, origin_role) = match origin_node.kind {
        NodeKind::Mapping { category, role } => (category, role),
        _ => return Err(ConnectError::RoleMismatch),
    };
    let (dest_cat, dest_role) = match dest_node.kind {
        NodeKind::Mapping { category, role } => (category, role),
        _ => return Err(ConnectError::RoleMismatch),
    };

    if origin_cat != dest_cat {
        return Err(ConnectError::CrossCategory {
            origin: origin_cat,
            destination: dest_cat,
        });
    }

    // Normalize to source -> target regardless of gesture direction.
    let (source, source_node, target, target_node) = match (origin_role, dest_role) {
        (Role::Source, Role::Target) => (origin, origin_node, dest, dest_node),
        (Role::Target, Role::Source) => (dest, dest_node, origin, origin_node),
        _ => return Err(ConnectError::RoleMismatch),
    };

    if view.has_edge(source, target) {
        return Err(ConnectError::DuplicateEdge {
            from: source_node.id.clone(),
            to: target_node.id.clone(),
        });
    }

    let source_bid = ids::business_id(source_node).ok_or(ConnectError::RoleMismatch)?;
    let target_bid = ids::business_id(target_node).ok_or(ConnectError::RoleMismatch)?;

    let class_filter = view.filter_classes_into(source);
    let edge = MappingEdge::mapping(
        ids::mapping_edge_id(origin_cat, &source_bid, &target_bid),
        origin_cat,
        class_filter.clone(),
    );

    Ok(ConnectionPlan {
        kind: PlanKind::Mapping,
        source,
        target,
        edge,
        update: Some(MappingUpdate {
            source: source_bid,
            target: target_bid,
            category: origin_cat,
            class_filter,
        }),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CatalogItem;
    use crate::category::{Category, Role, CLASSIFICATION_TARGET_ID};
    use crate::graph::MappingGraph;
    use crate::node::EdgeKind;

    fn graph_with(nodes: Vec<MappingNode>) -> (MappingGraph, Vec<NodeIndex>) {
        let mut g = MappingGraph::new();
        let idxs = nodes.into_iter().map(|n| g.add_node(n)).collect();
        (g, idxs)
    }

    fn pset_source(name: &str) -> MappingNode {
        MappingNode::supplied(Category::PropertySet, Role::Source, &CatalogItem::simple(name))
    }

    fn pset_target(name: &str) -> MappingNode {
        MappingNode::supplied(Category::PropertySet, Role::Target, &CatalogItem::simple(name))
    }

    #[test]
    fn source_to_target_is_accepted_as_drawn() {
        let (g, i) = graph_with(vec![pset_source("A"), pset_target("B")]);
        let plan = plan(&g, i[0], i[1]).unwrap();
        assert_eq!(plan.kind, PlanKind::Mapping);
        assert_eq!((plan.source, plan.target), (i[0], i[1]));
        assert_eq!(plan.edge.id, "pset-A-to-B");
    }

    #[test]
    fn target_to_source_is_flipped_to_canonical_direction() {
        let (g, i) = graph_with(vec![pset_source("A"), pset_target("B")]);
        let plan = plan(&g, i[1], i[0]).unwrap();
        assert_eq!((plan.source, plan.target), (i[0], i[1]));
        assert_eq!(plan.edge.id, "pset-A-to-B");
        let update = plan.update.unwrap();
        assert_eq!(update.source, "A");
        assert_eq!(update.target, "B");
    }

    #[test]
    fn duplicate_pair_is_rejected_in_either_direction() {
        let (mut g, i) = graph_with(vec![pset_source("A"), pset_target("B")]);
        let p = plan(&g, i[0], i[1]).unwrap();
        g.apply_plan(&p);

        assert!(matches!(plan(&g, i[0], i[1]), Err(ConnectError::DuplicateEdge { .. })));
        assert!(matches!(plan(&g, i[1], i[0]), Err(ConnectError::DuplicateEdge { .. })));
    }

    #[test]
    fn duplicate_diagnostic_names_both_endpoints() {
        let (mut g, i) = graph_with(vec![pset_source("A"), pset_target("B")]);
        let p = plan(&g, i[0], i[1]).unwrap();
        g.apply_plan(&p);

        let err = plan(&g, i[0], i[1]).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("source-pset-A"), "{msg}");
        assert!(msg.contains("target-pset-B"), "{msg}");
    }

    #[test]
    fn reversed_duplicate_filter_gesture_is_rejected() {
        let mut filter = MappingNode::class_filter("Filter".into(), 42);
        filter.attrs.selected_classes = vec!["IfcWall".into()];
        let (mut g, i) = graph_with(vec![filter, pset_source("A")]);

        let p = plan(&g, i[0], i[1]).unwrap();
        g.apply_plan(&p);

        // Drawing the same attachment from the source back onto the filter
        // must not insert a second (filter, source) edge.
        assert!(matches!(plan(&g, i[1], i[0]), Err(ConnectError::DuplicateEdge { .. })));
        assert!(matches!(plan(&g, i[0], i[1]), Err(ConnectError::DuplicateEdge { .. })));
        assert_eq!(g.edge_count(), 1);
    }

    #[test]
    fn same_role_endpoints_are_rejected() {
        let (g, i) = graph_with(vec![pset_source("A"), pset_source("B")]);
        assert_eq!(plan(&g, i[0], i[1]), Err(ConnectError::RoleMismatch));
    }

    #[test]
    fn cross_category_endpoints_are_rejected() {
        let prop = MappingNode::supplied(
            Category::Property,
            Role::Target,
            &CatalogItem::new("netLength", "Net Length"),
        );
        let (g, i) = graph_with(vec![pset_source("A"), prop]);
        assert_eq!(
            plan(&g, i[0], i[1]),
            Err(ConnectError::CrossCategory {
                origin: Category::PropertySet,
                destination: Category::Property,
            })
        );
    }

    #[test]
    fn region_endpoints_are_rejected() {
        let (g, i) = graph_with(vec![pset_source("A"), MappingNode::region(Category::PropertySet)]);
        assert_eq!(plan(&g, i[0], i[1]), Err(ConnectError::RegionEndpoint));
        assert_eq!(plan(&g, i[1], i[0]), Err(ConnectError::RegionEndpoint));
    }

    #[test]
    fn filter_attaches_to_source_from_either_direction() {
        let mut filter = MappingNode::class_filter("Filter".into(), 42);
        filter.attrs.selected_classes = vec!["IfcWall".into()];
        let (g, i) = graph_with(vec![filter, pset_source("A")]);

        for (a, b) in [(i[0], i[1]), (i[1], i[0])] {
            let plan = plan(&g, a, b).unwrap();
            assert_eq!(plan.kind, PlanKind::ClassFilter);
            assert_eq!((plan.source, plan.target), (i[0], i[1]));
            assert_eq!(plan.edge.class_filter, vec!["IfcWall".to_string()]);
            assert!(plan.update.is_none());
        }
    }

    #[test]
    fn filter_onto_target_is_rejected() {
        let (g, i) = graph_with(vec![MappingNode::class_filter("Filter".into(), 42), pset_target("B")]);
        assert!(matches!(plan(&g, i[0], i[1]), Err(ConnectError::FilterTargetNotSource(_))));
    }

    #[test]
    fn filter_edge_snapshots_the_selection() {
        let mut filter = MappingNode::class_filter("Filter".into(), 42);
        filter.attrs.selected_classes = vec!["IfcWall".into()];
        let (mut g, i) = graph_with(vec![filter, pset_source("A")]);

        let p = plan(&g, i[0], i[1]).unwrap();
        g.apply_plan(&p);

        // Re-selecting classes afterwards leaves the drawn edge untouched.
        let fid = g.node(i[0]).unwrap().id.clone();
        g.set_selected_classes(&fid, vec!["IfcDoor".into()]);
        let (_, _, _, edge) = g.edges().find(|(_, _, _, e)| e.is_class_filter()).unwrap();
        assert_eq!(edge.class_filter, vec!["IfcWall".to_string()]);
    }

    #[test]
    fn mapping_edge_unions_all_incoming_filters() {
        let mut f1 = MappingNode::class_filter("Filter".into(), 1);
        f1.attrs.selected_classes = vec!["IfcWall".into(), "IfcSlab".into()];
        let mut f2 = MappingNode::class_filter("Filter".into(), 2);
        f2.attrs.selected_classes = vec!["IfcSlab".into(), "IfcDoor".into()];

        let (mut g, i) = graph_with(vec![f1, f2, pset_source("A"), pset_target("B")]);
        for f in [i[0], i[1]] {
            let p = plan(&g, f, i[2]).unwrap();
            g.apply_plan(&p);
        }

        let p = plan(&g, i[2], i[3]).unwrap();
        assert_eq!(
            p.edge.class_filter,
            vec!["IfcDoor".to_string(), "IfcSlab".into(), "IfcWall".into()]
        );
        assert_eq!(p.update.unwrap().class_filter.len(), 3);
        assert_eq!(p.edge.kind, EdgeKind::Mapping { category: Category::PropertySet });
    }

    #[test]
    fn custom_source_maps_under_its_label() {
        let custom = MappingNode::custom(
            Role::Source,
            Category::PropertySet,
            "My_Pset".to_string(),
            None,
            1712000000000,
        );
        let (g, i) = graph_with(vec![custom, pset_target("Pset_WallCommon")]);
        let plan = plan(&g, i[0], i[1]).unwrap();
        assert_eq!(plan.edge.id, "pset-My_Pset-to-Pset_WallCommon");
        assert_eq!(plan.update.unwrap().source, "My_Pset");
    }

    #[test]
    fn classification_target_uses_the_fixed_slot_id() {
        let src = MappingNode::supplied(
            Category::Classification,
            Role::Source,
            &CatalogItem::new("name", "Name"),
        );
        let tgt = MappingNode::supplied(
            Category::Classification,
            Role::Target,
            &CatalogItem::new(CLASSIFICATION_TARGET_ID, "IFC Classification"),
        );
        let (g, i) = graph_with(vec![src, tgt]);
        let plan = plan(&g, i[0], i[1]).unwrap();
        assert_eq!(plan.edge.id, "classification-name-to-classification");
    }
}
