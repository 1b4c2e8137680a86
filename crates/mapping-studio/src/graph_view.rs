use crate::layout_grid::{LayoutGrid, LayoutStateGrid};
use crate::node_shapes::MappingNodeShape;
use eframe::egui::{self, Color32, Stroke};
use egui_graphs::{
    DefaultEdgeShape, DisplayEdge, DisplayNode, DrawContext, EdgeProps, Graph, GraphView, Node,
};
use mapping_model::{ConnectView, MappingEdge, MappingNode};
use petgraph::Directed;
use petgraph::Direction;
use petgraph::graph::DefaultIx;
use petgraph::stable_graph::{NodeIndex, StableGraph};
use petgraph::visit::EdgeRef;
use std::collections::BTreeSet;

const FILTER_EDGE_COLOR: Color32 = Color32::from_rgb(217, 119, 6);
const FILTER_DASH_LENGTH: f32 = 8.0;
const FILTER_GAP_LENGTH: f32 = 5.0;

// ------------------------------------------------------------------
// Type aliases for the display graph and its view
// ------------------------------------------------------------------

pub type EditorGraphDisplay =
    Graph<MappingNode, MappingEdge, Directed, DefaultIx, MappingNodeShape, MappingEdgeShape>;

pub type EditorGraphView<'a> = GraphView<
    'a,
    MappingNode,
    MappingEdge,
    Directed,
    DefaultIx,
    MappingNodeShape,
    MappingEdgeShape,
    LayoutStateGrid,
    LayoutGrid,
>;

pub fn setup_graph_display(g: &StableGraph<MappingNode, MappingEdge>) -> EditorGraphDisplay {
    let mut graph = EditorGraphDisplay::from(g);
    for (idx, node) in g.node_indices().zip(g.node_weights()) {
        if let Some(graph_node) = graph.node_mut(idx) {
            graph_node.set_label(node.label.clone());
        }
    }
    let edge_indices: Vec<_> = graph.edges_iter().map(|(idx, _)| idx).collect();
    for edge_idx in edge_indices {
        if let Some(edge) = graph.edge_mut(edge_idx) {
            edge.set_label(String::new());
        }
    }
    graph
}

// ------------------------------------------------------------------
// Read-only view adapter for connection validation
// ------------------------------------------------------------------

/// Adapter exposing the display graph to the connection planner.
pub struct DisplayView<'a>(pub &'a EditorGraphDisplay);

impl ConnectView for DisplayView<'_> {
    fn node(&self, idx: NodeIndex) -> Option<&MappingNode> {
        self.0.node(idx).map(|n| n.payload())
    }

    fn has_edge(&self, source: NodeIndex, target: NodeIndex) -> bool {
        self.0.g().find_edge(source, target).is_some()
    }

    fn filter_classes_into(&self, idx: NodeIndex) -> Vec<String> {
        let mut classes = BTreeSet::new();
        for edge_ref in self.0.g().edges_directed(idx, Direction::Incoming) {
            let edge = edge_ref.weight().payload();
            if edge.is_class_filter() {
                classes.extend(edge.class_filter.iter().cloned());
            }
        }
        classes.into_iter().collect()
    }
}

// ------------------------------------------------------------------
// Custom edge shape: mapping edges are solid, filter edges dashed
// ------------------------------------------------------------------

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct MappingEdgeShape {
    default_impl: DefaultEdgeShape,
    is_filter: bool,
}

impl From<EdgeProps<MappingEdge>> for MappingEdgeShape {
    fn from(props: EdgeProps<MappingEdge>) -> Self {
        let is_filter = props.payload.is_class_filter();
        Self {
            default_impl: DefaultEdgeShape::from(props),
            is_filter,
        }
    }
}

impl<D: DisplayNode<MappingNode, MappingEdge, Directed, DefaultIx>>
    DisplayEdge<MappingNode, MappingEdge, Directed, DefaultIx, D> for MappingEdgeShape
{
    fn is_inside(
        &self,
        start: &Node<MappingNode, MappingEdge, Directed, DefaultIx, D>,
        end: &Node<MappingNode, MappingEdge, Directed, DefaultIx, D>,
        pos: egui::Pos2,
    ) -> bool {
        self.default_impl.is_inside(start, end, pos)
    }

    fn shapes(
        &mut self,
        start: &Node<MappingNode, MappingEdge, Directed, DefaultIx, D>,
        end: &Node<MappingNode, MappingEdge, Directed, DefaultIx, D>,
        ctx: &DrawContext,
    ) -> Vec<egui::Shape> {
        if !self.is_filter {
            return self.default_impl.shapes(start, end, ctx);
        }

        // Straight dashed segment between node boundaries.
        let dir = end.location() - start.location();
        let from = start.display().closest_boundary_point(dir);
        let to = end.display().closest_boundary_point(-dir);
        let from_screen = ctx.meta.canvas_to_screen_pos(from);
        let to_screen = ctx.meta.canvas_to_screen_pos(to);

        egui::Shape::dashed_line(
            &[from_screen, to_screen],
            Stroke::new(self.default_impl.width, FILTER_EDGE_COLOR),
            ctx.meta.canvas_to_screen_size(FILTER_DASH_LENGTH),
            ctx.meta.canvas_to_screen_size(FILTER_GAP_LENGTH),
        )
    }

    fn update(&mut self, state: &EdgeProps<MappingEdge>) {
        self.is_filter = state.payload.is_class_filter();
        DisplayEdge::<MappingNode, MappingEdge, Directed, DefaultIx, D>::update(
            &mut self.default_impl,
            state,
        );
    }

    fn extra_bounds(
        &self,
        start: &Node<MappingNode, MappingEdge, Directed, DefaultIx, D>,
        end: &Node<MappingNode, MappingEdge, Directed, DefaultIx, D>,
    ) -> Option<(egui::Pos2, egui::Pos2)> {
        self.default_impl.extra_bounds(start, end)
    }
}
