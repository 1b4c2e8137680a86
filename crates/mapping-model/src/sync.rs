//! Synchronization between the canonical property-set configuration and the
//! graph's mapping edges.
//!
//! The configuration is the authority: rebuilding derives the full edge set
//! from it, so rebuilding twice from the same configuration yields the same
//! edges. Edges pointing at identifiers absent from the current node set are
//! skipped rather than invented.

use crate::category::Category;
use crate::connect::MappingUpdate;
use crate::graph::MappingGraph;
use crate::ids;
use crate::node::{EdgeKind, MappingEdge};
use std::collections::BTreeMap;

/// Canonical property-set mapping: custom set name to standard set name.
/// Ordered so exports are stable.
pub type MappingConfig = BTreeMap<String, String>;

/// A mapping edge derived from one configuration entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EdgeSpec {
    pub id: String,
    pub source_node: String,
    pub target_node: String,
}

/// Derive the property-set edge set a configuration implies. Entries with an
/// empty target are unmapped and produce no edge.
pub fn pset_edges_from_config(config: &MappingConfig) -> Vec<EdgeSpec> {
    config
        .iter()
        .filter(|(_, target)| !target.is_empty())
        .map(|(source, target)| EdgeSpec {
            id: ids::mapping_edge_id(Category::PropertySet, source, target),
            source_node: format!("source-pset-{source}"),
            target_node: format!("target-pset-{target}"),
        })
        .collect()
}

/// Drop every property-set mapping edge and re-create the set the
/// configuration implies. Specs whose endpoints are missing from the graph
/// are skipped. Filter edges and other categories are untouched.
pub fn rebuild_pset_edges(graph: &mut MappingGraph, config: &MappingConfig) {
    let stale: Vec<_> = graph
        .edges()
        .filter(|(_, _, _, e)| e.kind == EdgeKind::Mapping { category: Category::PropertySet })
        .map(|(idx, _, _, _)| idx)
        .collect();
    for idx in stale {
        graph.remove_edge(idx);
    }

    for spec in pset_edges_from_config(config) {
        let (Some(s), Some(t)) = (graph.index_of(&spec.source_node), graph.index_of(&spec.target_node)) else {
            continue;
        };
        let class_filter = {
            use crate::connect::ConnectView;
            graph.filter_classes_into(s)
        };
        graph.add_edge(s, t, MappingEdge::mapping(spec.id, Category::PropertySet, class_filter));
    }
}

/// Fold a validated connection into the configuration. Only property-set
/// mappings have a configuration counterpart; other categories leave it
/// untouched. Returns whether the configuration changed.
pub fn apply_update(config: &mut MappingConfig, update: &MappingUpdate) -> bool {
    if update.category != Category::PropertySet {
        return false;
    }
    if update.target.is_empty() {
        return config.remove(&update.source).is_some();
    }
    config.insert(update.source.clone(), update.target.clone()) != Some(update.target.clone())
}

/// Remove the configuration entry a deleted source node or edge leaves
/// behind. Returns whether the configuration changed.
pub fn remove_mapping(config: &mut MappingConfig, source: &str) -> bool {
    config.remove(source).is_some()
}
