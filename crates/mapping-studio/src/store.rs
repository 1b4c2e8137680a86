use crate::engine::ModelInfo;
use crate::graph_view::{DisplayView, EditorGraphDisplay, setup_graph_display};
use crate::versioned::Versioned;
use eframe::egui;
use mapping_model::layout::{self, CANVAS_HEIGHT, NODE_HEIGHT, NODE_WIDTH, REGION_WIDTH};
use mapping_model::sync;
use mapping_model::{
    Catalog, CatalogItem, Category, CategoryItems, ConnectError, ConnectView, MappingConfig,
    MappingEdge, MappingNode, NodeKind, Role, plan,
};
use petgraph::stable_graph::{NodeIndex, StableGraph};
use petgraph::visit::{EdgeRef, IntoEdgeReferences};
use std::collections::{HashMap, HashSet};

/// Total canvas width: the left region plus the stacked right regions.
pub const CANVAS_WIDTH: f32 = 850.0 + REGION_WIDTH + 20.0;

/// Central state of the editor: the display graph, the catalog it was
/// built from, and the canonical mapping configuration. All mutation goes
/// through the action reducer.
pub struct Store {
    pub graph: EditorGraphDisplay,
    pub catalog: Catalog,
    pub config: Versioned<MappingConfig>,
    pub layout_reset_needed: bool,
    /// One-shot fit-to-content, consumed on the first frame after a build
    /// or load. Later graph changes never re-trigger it.
    pub fit_requested: bool,
    /// Canvas point currently at the middle of the view, refreshed by the
    /// canvas each frame. Free node placement targets it.
    pub viewport_center: Option<(f32, f32)>,
    pub dragging_from: Option<(NodeIndex, egui::Pos2)>,
    pub drag_started: bool,
    pub error_message: Option<String>,
    /// Transient feedback for rejected connections; shown in the status
    /// line, never modal.
    pub status_message: Option<String>,
    pub processing: bool,
    pub progress: Option<(u8, String)>,
    pub last_output: Option<String>,
    #[cfg(not(target_arch = "wasm32"))]
    pub engine: Option<crate::engine::EngineHandle>,
    /// Canvas positions (node centers) keyed by node id, consumed by the
    /// grid layout on reset.
    positions: HashMap<String, (f32, f32)>,
    last_stamp: u64,
    free_placed: usize,
}

impl Store {
    pub fn new(catalog: Catalog, config: MappingConfig) -> Self {
        let mut positions = HashMap::new();
        let mut raw: StableGraph<MappingNode, MappingEdge> = StableGraph::default();

        // Regions first so they draw underneath the nodes.
        for region in layout::regions() {
            let node = MappingNode::region(region.category);
            positions.insert(
                node.id.clone(),
                (
                    region.origin.x + region.width / 2.0,
                    region.origin.y + region.height / 2.0,
                ),
            );
            raw.add_node(node);
        }

        for (region, placed) in layout::layout_catalog(&catalog) {
            for p in placed {
                positions.insert(p.node.id.clone(), node_center(region, p.position));
                raw.add_node(p.node);
            }
        }

        let mut store = Self {
            graph: setup_graph_display(&raw),
            catalog,
            config: Versioned::new(config),
            layout_reset_needed: true,
            fit_requested: true,
            viewport_center: None,
            dragging_from: None,
            drag_started: false,
            error_message: None,
            status_message: None,
            processing: false,
            progress: None,
            last_output: None,
            #[cfg(not(target_arch = "wasm32"))]
            engine: None,
            positions,
            last_stamp: 0,
            free_placed: 0,
        };
        store.sync_config_edges();
        store
    }

    // --------------------------------------------------------------
    // Lookup helpers
    // --------------------------------------------------------------

    pub fn index_of(&self, id: &str) -> Option<NodeIndex> {
        self.graph
            .nodes_iter()
            .find(|(_, n)| n.payload().id == id)
            .map(|(idx, _)| idx)
    }

    pub fn positions(&self) -> &HashMap<String, (f32, f32)> {
        &self.positions
    }

    /// Number of mapping nodes already occupying a column, used to append
    /// new nodes below the last row.
    fn column_len(&self, category: Category, role: Role) -> usize {
        self.graph
            .nodes_iter()
            .filter(|(_, n)| {
                n.payload().kind
                    == NodeKind::Mapping { category, role }
            })
            .count()
    }

    /// Monotonic millisecond stamp for user-authored node ids. Two nodes
    /// created within the same millisecond still get distinct ids.
    pub fn next_custom_stamp(&mut self) -> u64 {
        #[cfg(not(target_arch = "wasm32"))]
        let now = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);
        #[cfg(target_arch = "wasm32")]
        let now = 0u64;

        let stamp = now.max(self.last_stamp + 1);
        self.last_stamp = stamp;
        stamp
    }

    // --------------------------------------------------------------
    // Node authoring
    // --------------------------------------------------------------

    /// Insert a node at an absolute canvas center. The location is applied
    /// directly, so no layout reset runs and manual drags elsewhere on the
    /// canvas survive.
    pub fn insert_node(&mut self, node: MappingNode, center: (f32, f32)) -> NodeIndex {
        let id = node.id.clone();
        let label = node.label.clone();
        let idx = self.graph.add_node(node);
        if let Some(n) = self.graph.node_mut(idx) {
            n.set_label(label);
            n.set_location(egui::Pos2::new(center.0, center.1));
        }
        self.positions.insert(id, center);
        idx
    }

    /// Add a user-authored mapping node. Source-side nodes land free on
    /// the canvas near the viewport center; target-side nodes are appended
    /// below the last row of their column.
    pub fn add_custom_node(
        &mut self,
        role: Role,
        category: Category,
        label: String,
        pset: Option<String>,
    ) -> NodeIndex {
        let stamp = self.next_custom_stamp();
        let node = MappingNode::custom(role, category, label, pset, stamp);
        let center = match role {
            Role::Source => self.free_position(),
            Role::Target => self.append_position(category, role),
        };
        self.insert_node(node, center)
    }

    pub fn add_filter_node(&mut self, label: String) -> NodeIndex {
        let stamp = self.next_custom_stamp();
        let node = MappingNode::class_filter(label, stamp);
        let center = self.free_position();
        self.insert_node(node, center)
    }

    /// Free placement: the current viewport center, stepped diagonally so
    /// consecutive nodes do not stack exactly on top of each other. Falls
    /// back to the canvas center before the first frame.
    fn free_position(&mut self) -> (f32, f32) {
        let (cx, cy) = self
            .viewport_center
            .unwrap_or((CANVAS_WIDTH / 2.0, CANVAS_HEIGHT / 2.0));
        let step = (self.free_placed % 6) as f32 * 30.0;
        self.free_placed += 1;
        (cx + step, cy + step)
    }

    fn append_position(&self, category: Category, role: Role) -> (f32, f32) {
        let region = layout::region(category);
        let row = self.column_len(category, role);
        let rel = layout::Point::new(layout::column_x(role), layout::row_y(row));
        node_center(region, region_clamped(region, rel))
    }

    // --------------------------------------------------------------
    // Connections
    // --------------------------------------------------------------

    /// Validate, normalize and insert a user-drawn connection. On success
    /// the configuration is updated for property-set mappings.
    pub fn connect(&mut self, origin: NodeIndex, dest: NodeIndex) -> Result<(), ConnectError> {
        let plan = plan(&DisplayView(&self.graph), origin, dest)?;
        self.graph
            .add_edge_with_label(plan.source, plan.target, plan.edge, String::new());
        if let Some(update) = plan.update {
            let mut cfg = self.config.get().clone();
            if sync::apply_update(&mut cfg, &update) {
                self.config.set(cfg);
            }
        }
        Ok(())
    }

    // --------------------------------------------------------------
    // Deletion
    // --------------------------------------------------------------

    /// Delete every selected node and edge. Removing a node removes its
    /// incident edges; configuration entries backed by deleted property-set
    /// mappings are removed as well. Region headers are never deletable.
    pub fn delete_selection(&mut self) {
        let selected_edges: Vec<_> = self.graph.selected_edges().to_vec();
        let mut cfg = self.config.get().clone();
        let mut cfg_changed = false;

        for edge_idx in selected_edges {
            if let Some(source) = self.pset_edge_source(edge_idx) {
                cfg_changed |= sync::remove_mapping(&mut cfg, &source);
            }
            self.graph.remove_edge(edge_idx);
        }

        let selected_nodes: Vec<_> = self
            .graph
            .nodes_iter()
            .filter(|(_, n)| n.selected() && !n.payload().is_region())
            .map(|(idx, _)| idx)
            .collect();

        for node_idx in selected_nodes {
            // Mapping edges dying with this node take their config entries
            // with them.
            let incident: Vec<_> = self
                .graph
                .g()
                .edge_references()
                .filter(|e| e.source() == node_idx || e.target() == node_idx)
                .map(|e| e.id())
                .collect();
            for edge_idx in incident {
                if let Some(source) = self.pset_edge_source(edge_idx) {
                    cfg_changed |= sync::remove_mapping(&mut cfg, &source);
                }
            }
            if let Some(node) = self.graph.node(node_idx) {
                self.positions.remove(&node.payload().id);
            }
            self.graph.remove_node(node_idx);
        }

        if cfg_changed {
            self.config.set(cfg);
        }
    }

    /// Business identifier of the source endpoint, for property-set
    /// mapping edges only.
    fn pset_edge_source(&self, edge_idx: petgraph::stable_graph::EdgeIndex) -> Option<String> {
        let edge = self.graph.edge(edge_idx)?;
        if !edge.payload().is_pset_mapping() {
            return None;
        }
        let (source, _) = self.graph.g().edge_endpoints(edge_idx)?;
        let node = self.graph.node(source)?;
        mapping_model::ids::business_id(node.payload())
    }

    // --------------------------------------------------------------
    // Filter selection
    // --------------------------------------------------------------

    pub fn set_selected_classes(&mut self, idx: NodeIndex, classes: Vec<String>) {
        if let Some(node) = self.graph.node_mut(idx) {
            if node.payload().is_filter() {
                node.payload_mut().attrs.selected_classes = classes;
            }
        }
    }

    // --------------------------------------------------------------
    // Configuration synchronization
    // --------------------------------------------------------------

    /// Drop every property-set mapping edge and re-create the set the
    /// configuration implies. Entries without matching nodes are skipped,
    /// so the rebuild is idempotent.
    pub fn sync_config_edges(&mut self) {
        let stale: Vec<_> = self
            .graph
            .edges_iter()
            .filter(|(_, e)| e.payload().is_pset_mapping())
            .map(|(idx, _)| idx)
            .collect();
        for idx in stale {
            self.graph.remove_edge(idx);
        }

        for spec in sync::pset_edges_from_config(self.config.get()) {
            let (Some(s), Some(t)) = (
                self.index_of(&spec.source_node),
                self.index_of(&spec.target_node),
            ) else {
                continue;
            };
            let classes = DisplayView(&self.graph).filter_classes_into(s);
            self.graph.add_edge_with_label(
                s,
                t,
                MappingEdge::mapping(spec.id, Category::PropertySet, classes),
                String::new(),
            );
        }
    }

    /// Fold the engine's model report into the catalog. The reported lists
    /// are authoritative: the pre-supplied node sets of the property-set
    /// and quantity categories are replaced wholesale, dropping nodes (and
    /// their edges) for identifiers no longer present. Custom nodes are
    /// untouched.
    pub fn apply_model_info(&mut self, info: ModelInfo) {
        self.replace_supplied_nodes(Category::PropertySet, info.pset_sources, info.pset_targets);
        self.replace_supplied_nodes(Category::Quantity, info.quantity_sources, info.quantity_targets);
        if !info.ifc_classes.is_empty() {
            self.catalog.ifc_classes = info.ifc_classes;
        }
        self.sync_config_edges();
    }

    fn replace_supplied_nodes(&mut self, category: Category, sources: Vec<String>, targets: Vec<String>) {
        let items = CategoryItems {
            sources: sources.into_iter().map(CatalogItem::simple).collect(),
            targets: targets.into_iter().map(CatalogItem::simple).collect(),
        };
        let placed = layout::layout_category(category, &items);

        let keep: HashSet<&str> = placed.iter().map(|p| p.node.id.as_str()).collect();
        let stale: Vec<NodeIndex> = self
            .graph
            .nodes_iter()
            .filter(|(_, n)| {
                let p = n.payload();
                !p.attrs.custom
                    && matches!(p.kind, NodeKind::Mapping { category: c, .. } if c == category)
                    && !keep.contains(p.id.as_str())
            })
            .map(|(idx, _)| idx)
            .collect();
        for idx in stale {
            if let Some(node) = self.graph.node(idx) {
                let id = node.payload().id.clone();
                self.positions.remove(&id);
            }
            self.graph.remove_node(idx);
        }

        // Survivors and newcomers alike take the recomputed column position.
        let region = layout::region(category);
        for p in placed {
            let center = node_center(region, p.position);
            if let Some(idx) = self.index_of(&p.node.id) {
                self.positions.insert(p.node.id.clone(), center);
                if let Some(n) = self.graph.node_mut(idx) {
                    n.set_location(egui::Pos2::new(center.0, center.1));
                }
            } else {
                self.insert_node(p.node, center);
            }
        }
        *self.catalog.items_mut(category) = items;
    }

    // --------------------------------------------------------------
    // Region confinement
    // --------------------------------------------------------------

    /// Pull region-bound nodes back inside their region after a drag.
    /// Custom source nodes and filters float free; everything else is
    /// confined to its category region, below the header.
    pub fn confine_nodes_to_regions(&mut self) {
        let indices: Vec<NodeIndex> = self.graph.nodes_iter().map(|(idx, _)| idx).collect();
        for idx in indices {
            let Some(node) = self.graph.node(idx) else { continue };
            let payload = node.payload();
            let confined = match payload.kind {
                NodeKind::Mapping { category, role } => {
                    (!payload.attrs.custom || role == Role::Target).then_some(category)
                }
                _ => None,
            };
            let Some(category) = confined else { continue };

            let id = payload.id.clone();
            let loc = node.location();
            let region = layout::region(category);
            // Clamp works on top-left corners, locations are centers.
            let corner = layout::Point::new(loc.x - NODE_WIDTH / 2.0, loc.y - NODE_HEIGHT / 2.0);
            let clamped = region.clamp(corner);
            let center = (clamped.x + NODE_WIDTH / 2.0, clamped.y + NODE_HEIGHT / 2.0);
            if center != (loc.x, loc.y) {
                if let Some(n) = self.graph.node_mut(idx) {
                    n.set_location(egui::Pos2::new(center.0, center.1));
                }
                self.positions.insert(id, center);
            }
        }
    }
}

/// Absolute center of a node placed at a region-relative top-left corner.
fn node_center(region: layout::Region, rel: layout::Point) -> (f32, f32) {
    (
        region.origin.x + rel.x + NODE_WIDTH / 2.0,
        region.origin.y + rel.y + NODE_HEIGHT / 2.0,
    )
}

/// Keep appended rows inside their region even when the column overflows.
fn region_clamped(region: layout::Region, rel: layout::Point) -> layout::Point {
    let abs = layout::Point::new(region.origin.x + rel.x, region.origin.y + rel.y);
    let clamped = region.clamp(abs);
    layout::Point::new(clamped.x - region.origin.x, clamped.y - region.origin.y)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mapping_model::CatalogItem;

    fn catalog() -> Catalog {
        let mut c = Catalog::default();
        c.set_property_sets(["Custom_Pset_1", "Custom_Pset_2"], ["Pset_WallCommon"]);
        c.properties.sources = vec![CatalogItem::new("prop1", "prop1").with_detail("Custom_Pset_1")];
        c.properties.targets = vec![CatalogItem::new("tgt1", "tgt1")];
        c.ifc_classes = vec!["IfcWall".into(), "IfcSlab".into()];
        c
    }

    #[test]
    fn building_from_config_creates_the_implied_edges() {
        let mut config = MappingConfig::new();
        config.insert("Custom_Pset_1".into(), "Pset_WallCommon".into());
        let store = Store::new(catalog(), config);

        let ids: Vec<_> = store
            .graph
            .edges_iter()
            .map(|(_, e)| e.payload().id.clone())
            .collect();
        assert_eq!(ids, vec!["pset-Custom_Pset_1-to-Pset_WallCommon".to_string()]);
    }

    #[test]
    fn connect_updates_the_configuration() {
        let mut store = Store::new(catalog(), MappingConfig::new());
        let s = store.index_of("source-pset-Custom_Pset_1").unwrap();
        let t = store.index_of("target-pset-Pset_WallCommon").unwrap();

        store.connect(s, t).unwrap();
        assert_eq!(
            store.config.get().get("Custom_Pset_1").map(String::as_str),
            Some("Pset_WallCommon")
        );

        // Drawing the same pair again is rejected and leaves the config alone.
        let version = store.config.version();
        assert!(matches!(
            store.connect(t, s),
            Err(ConnectError::DuplicateEdge { .. })
        ));
        assert_eq!(store.config.version(), version);
    }

    #[test]
    fn deleting_a_source_node_drops_its_config_entry() {
        let mut config = MappingConfig::new();
        config.insert("Custom_Pset_1".into(), "Pset_WallCommon".into());
        let mut store = Store::new(catalog(), config);

        let s = store.index_of("source-pset-Custom_Pset_1").unwrap();
        if let Some(node) = store.graph.node_mut(s) {
            node.set_selected(true);
        }
        store.delete_selection();

        assert!(store.config.get().is_empty());
        assert!(store.index_of("source-pset-Custom_Pset_1").is_none());
        assert_eq!(store.graph.edges_iter().count(), 0);
    }

    #[test]
    fn sync_is_idempotent_on_the_display_graph() {
        let mut config = MappingConfig::new();
        config.insert("Custom_Pset_1".into(), "Pset_WallCommon".into());
        config.insert("Ghost".into(), "Pset_WallCommon".into());
        let mut store = Store::new(catalog(), config);

        store.sync_config_edges();
        let first: Vec<_> = store
            .graph
            .edges_iter()
            .map(|(_, e)| e.payload().id.clone())
            .collect();
        store.sync_config_edges();
        let second: Vec<_> = store
            .graph
            .edges_iter()
            .map(|(_, e)| e.payload().id.clone())
            .collect();

        assert_eq!(first, second);
        assert_eq!(first.len(), 1);
    }

    #[test]
    fn custom_target_nodes_are_appended_below_the_column() {
        let mut store = Store::new(catalog(), MappingConfig::new());
        let before = store.column_len(Category::PropertySet, Role::Target);
        let idx = store.add_custom_node(
            Role::Target,
            Category::PropertySet,
            "My_Target".into(),
            None,
        );
        let id = store.graph.node(idx).unwrap().payload().id.clone();
        let (_, y) = store.positions()[&id];

        let region = layout::region(Category::PropertySet);
        let expected =
            region.origin.y + layout::row_y(before) + NODE_HEIGHT / 2.0;
        assert_eq!(y, expected);
    }

    #[test]
    fn custom_stamps_are_strictly_increasing() {
        let mut store = Store::new(Catalog::default(), MappingConfig::new());
        let a = store.next_custom_stamp();
        let b = store.next_custom_stamp();
        assert!(b > a);
    }

    #[test]
    fn model_info_replaces_the_supplied_node_set() {
        let mut store = Store::new(catalog(), MappingConfig::new());
        store.apply_model_info(ModelInfo {
            pset_sources: vec!["Custom_Pset_2".into(), "Custom_Pset_3".into()],
            pset_targets: vec!["Pset_WallCommon".into()],
            ifc_classes: vec!["IfcDoor".into()],
            ..ModelInfo::default()
        });

        assert!(store.index_of("source-pset-Custom_Pset_1").is_none());
        assert!(store.index_of("source-pset-Custom_Pset_2").is_some());
        assert!(store.index_of("source-pset-Custom_Pset_3").is_some());
        assert!(store.index_of("target-pset-Pset_WallCommon").is_some());
        assert_eq!(store.catalog.ifc_classes, vec!["IfcDoor".to_string()]);
    }

    #[test]
    fn replaced_nodes_take_their_edges_and_custom_nodes_stay() {
        let mut config = MappingConfig::new();
        config.insert("Custom_Pset_1".into(), "Pset_WallCommon".into());
        let mut store = Store::new(catalog(), config);
        let custom = store.add_custom_node(
            Role::Source,
            Category::PropertySet,
            "My_Pset".into(),
            None,
        );
        assert_eq!(store.graph.edges_iter().count(), 1);

        store.apply_model_info(ModelInfo {
            pset_sources: vec!["Custom_Pset_2".into()],
            pset_targets: vec!["Pset_WallCommon".into()],
            ..ModelInfo::default()
        });

        // The mapped source is gone, so the edge its config entry implied
        // cannot be rebuilt.
        assert!(store.index_of("source-pset-Custom_Pset_1").is_none());
        assert_eq!(store.graph.edges_iter().count(), 0);
        assert!(store.graph.node(custom).is_some());
    }

    #[test]
    fn free_nodes_land_at_the_viewport_center() {
        let mut store = Store::new(catalog(), MappingConfig::new());
        store.viewport_center = Some((300.0, 200.0));
        let idx = store.add_custom_node(
            Role::Source,
            Category::PropertySet,
            "My_Pset".into(),
            None,
        );
        let id = store.graph.node(idx).unwrap().payload().id.clone();
        assert_eq!(store.positions()[&id], (300.0, 200.0));
    }

    #[test]
    fn inserting_a_node_does_not_reset_the_layout() {
        let mut store = Store::new(catalog(), MappingConfig::new());
        store.layout_reset_needed = false;

        // A manual drag, then a palette insert: the drag must survive.
        let s = store.index_of("source-pset-Custom_Pset_1").unwrap();
        let dragged = egui::Pos2::new(400.0, 300.0);
        if let Some(n) = store.graph.node_mut(s) {
            n.set_location(dragged);
        }
        store.add_filter_node("Filter".into());

        assert!(!store.layout_reset_needed);
        assert_eq!(store.graph.node(s).unwrap().location(), dragged);
    }

    #[test]
    fn dragged_nodes_are_confined_to_their_region() {
        let mut store = Store::new(catalog(), MappingConfig::new());
        let s = store.index_of("source-pset-Custom_Pset_1").unwrap();
        if let Some(n) = store.graph.node_mut(s) {
            n.set_location(egui::Pos2::new(-500.0, -500.0));
        }
        let f = store.add_filter_node("Filter".into());
        if let Some(n) = store.graph.node_mut(f) {
            n.set_location(egui::Pos2::new(-500.0, -500.0));
        }

        store.confine_nodes_to_regions();

        let region = layout::region(Category::PropertySet);
        let loc = store.graph.node(s).unwrap().location();
        assert!(loc.x - NODE_WIDTH / 2.0 >= region.origin.x);
        assert!(loc.y - NODE_HEIGHT / 2.0 >= region.origin.y + layout::HEADER_HEIGHT);
        // Filters float free.
        assert_eq!(
            store.graph.node(f).unwrap().location(),
            egui::Pos2::new(-500.0, -500.0)
        );
    }
}
