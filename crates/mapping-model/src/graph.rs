//! Typed wrapper around a petgraph [`StableGraph`] keyed by stable node ids.
//!
//! Indices stay valid across removals thanks to the stable graph, but all
//! cross-references in the model (configuration, plans, serialized state)
//! use string ids; the id map resolves them.

use crate::connect::{ConnectView, ConnectionPlan};
use crate::node::{EdgeKind, MappingEdge, MappingNode};
use petgraph::stable_graph::{EdgeIndex, NodeIndex, StableGraph};
use petgraph::Directed;
use petgraph::Direction;
use std::collections::{BTreeSet, HashMap};

#[derive(Debug, Clone, Default)]
pub struct MappingGraph {
    graph: StableGraph<MappingNode, MappingEdge, Directed>,
    ids: HashMap<String, NodeIndex>,
}

impl MappingGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node(&mut self, node: MappingNode) -> NodeIndex {
        let id = node.id.clone();
        let idx = self.graph.add_node(node);
        self.ids.insert(id, idx);
        idx
    }

    /// Remove a node together with every incident edge.
    pub fn remove_node(&mut self, idx: NodeIndex) -> Option<MappingNode> {
        let node = self.graph.remove_node(idx)?;
        self.ids.remove(&node.id);
        Some(node)
    }

    pub fn node(&self, idx: NodeIndex) -> Option<&MappingNode> {
        self.graph.node_weight(idx)
    }

    pub fn index_of(&self, id: &str) -> Option<NodeIndex> {
        self.ids.get(id).copied()
    }

    pub fn add_edge(&mut self, source: NodeIndex, target: NodeIndex, edge: MappingEdge) -> EdgeIndex {
        self.graph.add_edge(source, target, edge)
    }

    pub fn remove_edge(&mut self, idx: EdgeIndex) -> Option<MappingEdge> {
        self.graph.remove_edge(idx)
    }

    pub fn edges(&self) -> impl Iterator<Item = (EdgeIndex, NodeIndex, NodeIndex, &MappingEdge)> {
        self.graph
            .edge_indices()
            .filter_map(|e| self.graph.edge_endpoints(e).map(|(s, t)| (e, s, t, &self.graph[e])))
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Replace the selection of a filter node. Existing edges keep the
    /// snapshot they were created with.
    pub fn set_selected_classes(&mut self, id: &str, classes: Vec<String>) -> bool {
        match self.index_of(id).and_then(|i| self.graph.node_weight_mut(i)) {
            Some(node) if node.is_filter() => {
                node.attrs.selected_classes = classes;
                true
            }
            _ => false,
        }
    }

    /// Validate and apply a connection between two existing nodes, by id.
    pub fn connect_ids(&mut self, origin: &str, dest: &str) -> Result<ConnectionPlan, crate::connect::ConnectError> {
        let o = self
            .index_of(origin)
            .ok_or_else(|| crate::connect::ConnectError::UnknownEndpoint(origin.to_string()))?;
        let d = self
            .index_of(dest)
            .ok_or_else(|| crate::connect::ConnectError::UnknownEndpoint(dest.to_string()))?;
        let plan = crate::connect::plan(self, o, d)?;
        self.apply_plan(&plan);
        Ok(plan)
    }

    pub fn apply_plan(&mut self, plan: &ConnectionPlan) {
        self.add_edge(plan.source, plan.target, plan.edge.clone());
    }
}

impl ConnectView for MappingGraph {
    fn node(&self, idx: NodeIndex) -> Option<&MappingNode> {
        self.graph.node_weight(idx)
    }

    fn has_edge(&self, source: NodeIndex, target: NodeIndex) -> bool {
        self.graph.find_edge(source, target).is_some()
    }

    fn filter_classes_into(&self, idx: NodeIndex) -> Vec<String> {
        let mut classes = BTreeSet::new();
        for edge in self.graph.edges_directed(idx, Direction::Incoming) {
            if edge.weight().kind == EdgeKind::ClassFilter {
                classes.extend(edge.weight().class_filter.iter().cloned());
            }
        }
        classes.into_iter().collect()
    }
}
