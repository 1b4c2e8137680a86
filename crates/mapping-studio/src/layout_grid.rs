//! Fixed-position layout: every node is pinned to the canvas position the
//! store computed for it. Unknown nodes keep their current location, so
//! user drags survive layout passes that only reposition catalog nodes.

use eframe::egui;
use egui_graphs::{DisplayEdge, DisplayNode, Graph, Layout, LayoutState};
use mapping_model::MappingNode;
use once_cell::sync::Lazy;
use petgraph::EdgeType;
use petgraph::graph::IndexType;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::RwLock;

// Positions are computed by the store before reset_layout runs; this hands
// them to LayoutStateGrid::default(), which egui_graphs calls internally.
static PENDING_POSITIONS: Lazy<RwLock<Option<HashMap<String, (f32, f32)>>>> =
    Lazy::new(|| RwLock::new(None));

pub fn set_pending_positions(positions: HashMap<String, (f32, f32)>) {
    *PENDING_POSITIONS.write().unwrap() = Some(positions);
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutStateGrid {
    positions: HashMap<String, (f32, f32)>,
}

impl Default for LayoutStateGrid {
    fn default() -> Self {
        let positions = PENDING_POSITIONS
            .write()
            .unwrap()
            .take()
            .unwrap_or_default();
        Self { positions }
    }
}

impl LayoutState for LayoutStateGrid {}

#[derive(Debug, Clone, Default)]
pub struct LayoutGrid {
    state: LayoutStateGrid,
    applied: bool,
}

impl Layout<LayoutStateGrid> for LayoutGrid {
    fn from_state(state: LayoutStateGrid) -> impl Layout<LayoutStateGrid> {
        Self {
            state,
            applied: false,
        }
    }

    fn next<N, E, Ty, Ix, Dn, De>(&mut self, g: &mut Graph<N, E, Ty, Ix, Dn, De>, _ui: &egui::Ui)
    where
        N: Clone,
        E: Clone,
        Ty: EdgeType,
        Ix: IndexType,
        Dn: DisplayNode<N, E, Ty, Ix>,
        De: DisplayEdge<N, E, Ty, Ix, Dn>,
    {
        // Only apply layout once per reset.
        if self.applied {
            return;
        }

        let indices: Vec<_> = g.nodes_iter().map(|(idx, _)| idx).collect();
        for idx in indices {
            let Some(node) = g.node_mut(idx) else { continue };
            let payload = node.payload();

            // SAFETY: this layout is only instantiated with N = MappingNode
            // via the EditorGraphView type alias; the Layout trait does not
            // let us constrain N directly.
            let mapping_node = unsafe { &*(payload as *const N as *const MappingNode) };

            if let Some(&(x, y)) = self.state.positions.get(&mapping_node.id) {
                node.set_location(egui::Pos2::new(x, y));
            }
        }

        self.applied = true;
    }

    fn state(&self) -> LayoutStateGrid {
        self.state.clone()
    }
}
