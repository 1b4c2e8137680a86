use mapping_model::{Catalog, MappingConfig, MappingEdge, MappingNode};
use petgraph::visit::{EdgeRef, IntoEdgeReferences};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::store::Store;

// ------------------------------------------------------------------
// Serialization structures
// ------------------------------------------------------------------

#[derive(Serialize, Deserialize)]
pub struct SerializableNode {
    node: MappingNode,
    position: (f32, f32),
}

#[derive(Serialize, Deserialize)]
pub struct SerializableEdge {
    source_id: String,
    target_id: String,
    edge: MappingEdge,
}

/// On-disk project format. Catalog nodes and property-set mapping edges
/// are rebuilt from the catalog and the configuration, so only
/// user-authored nodes and the remaining edges are stored explicitly.
#[derive(Serialize, Deserialize)]
pub struct SerializableProject {
    pub catalog: Catalog,
    pub config: MappingConfig,
    pub custom_nodes: Vec<SerializableNode>,
    pub edges: Vec<SerializableEdge>,
}

// ------------------------------------------------------------------
// Conversion functions
// ------------------------------------------------------------------

pub fn store_to_project(store: &Store) -> SerializableProject {
    let mut custom_nodes = Vec::new();
    for (_, node) in store.graph.nodes_iter() {
        let payload = node.payload();
        if payload.attrs.custom || payload.is_filter() {
            // The live location, so manual drags survive a save.
            let loc = node.location();
            let position = (loc.x, loc.y);
            custom_nodes.push(SerializableNode {
                node: payload.clone(),
                position,
            });
        }
    }

    // Property-set mapping edges are implied by the configuration and
    // skipped here; everything else is stored by endpoint ids.
    let mut edges = Vec::new();
    for edge_ref in store.graph.g().edge_references() {
        let edge = edge_ref.weight().payload();
        if edge.is_pset_mapping() {
            continue;
        }
        let (Some(source), Some(target)) = (
            store.graph.node(edge_ref.source()),
            store.graph.node(edge_ref.target()),
        ) else {
            continue;
        };
        edges.push(SerializableEdge {
            source_id: source.payload().id.clone(),
            target_id: target.payload().id.clone(),
            edge: edge.clone(),
        });
    }

    SerializableProject {
        catalog: store.catalog.clone(),
        config: store.config.get().clone(),
        custom_nodes,
        edges,
    }
}

pub fn project_to_store(project: SerializableProject) -> Store {
    let mut store = Store::new(project.catalog, project.config);

    for entry in project.custom_nodes {
        store.insert_node(entry.node, entry.position);
    }

    for entry in project.edges {
        let (Some(s), Some(t)) = (
            store.index_of(&entry.source_id),
            store.index_of(&entry.target_id),
        ) else {
            continue;
        };
        store
            .graph
            .add_edge_with_label(s, t, entry.edge, String::new());
    }

    // Re-derive property-set edges now that filter nodes are back, so
    // their class unions are picked up.
    store.sync_config_edges();
    store.layout_reset_needed = true;
    store
}

// ------------------------------------------------------------------
// File I/O operations
// ------------------------------------------------------------------

pub fn save_project(store: &Store, path: &Path) -> Result<(), String> {
    let project = store_to_project(store);
    let json = serde_json::to_string_pretty(&project)
        .map_err(|e| format!("Failed to serialize project: {}", e))?;

    std::fs::write(path, json).map_err(|e| format!("Failed to write file: {}", e))?;

    Ok(())
}

pub fn load_project(path: &Path) -> Result<Store, String> {
    let json_str =
        std::fs::read_to_string(path).map_err(|e| format!("Failed to read file: {}", e))?;

    let project: SerializableProject =
        serde_json::from_str(&json_str).map_err(|e| format!("Failed to parse JSON: {}", e))?;

    Ok(project_to_store(project))
}

pub fn save_config(config: &MappingConfig, path: &Path) -> Result<(), String> {
    let json = serde_json::to_string_pretty(config)
        .map_err(|e| format!("Failed to serialize configuration: {}", e))?;

    std::fs::write(path, json).map_err(|e| format!("Failed to write file: {}", e))?;

    Ok(())
}

pub fn load_config(path: &Path) -> Result<MappingConfig, String> {
    let json_str =
        std::fs::read_to_string(path).map_err(|e| format!("Failed to read file: {}", e))?;

    serde_json::from_str(&json_str).map_err(|e| format!("Failed to parse JSON: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use mapping_model::{Category, CatalogItem, Role};

    fn store() -> Store {
        let mut catalog = Catalog::default();
        catalog.set_property_sets(["Custom_Pset_1"], ["Pset_WallCommon"]);
        catalog.properties.sources =
            vec![CatalogItem::new("prop1", "prop1").with_detail("Custom_Pset_1")];
        catalog.properties.targets = vec![CatalogItem::new("tgt1", "tgt1")];
        catalog.ifc_classes = vec!["IfcWall".into(), "IfcSlab".into()];
        Store::new(catalog, MappingConfig::new())
    }

    #[test]
    fn project_round_trip_preserves_graph_and_config() {
        let mut original = store();

        let s = original.index_of("source-pset-Custom_Pset_1").unwrap();
        let t = original.index_of("target-pset-Pset_WallCommon").unwrap();
        original.connect(s, t).unwrap();

        let f = original.add_filter_node("Walls only".into());
        original.set_selected_classes(f, vec!["IfcWall".into()]);
        let filter_id = original.graph.node(f).unwrap().payload().id.clone();
        original.connect(f, s).unwrap();

        original.add_custom_node(
            Role::Source,
            Category::Property,
            "myProp".into(),
            Some("Custom_Pset_1".into()),
        );

        let path = std::env::temp_dir().join("mapping-studio-roundtrip.json");
        save_project(&original, &path).unwrap();
        let loaded = load_project(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(loaded.config.get(), original.config.get());
        assert_eq!(loaded.graph.node_count(), original.graph.node_count());
        assert_eq!(loaded.graph.edges_iter().count(), original.graph.edges_iter().count());

        // The filter node keeps its class selection and its edge, and the
        // rebuilt property-set edge carries the filter union.
        let f = loaded.index_of(&filter_id).unwrap();
        assert_eq!(
            loaded.graph.node(f).unwrap().payload().attrs.selected_classes,
            vec!["IfcWall".to_string()]
        );
        let pset_edge = loaded
            .graph
            .edges_iter()
            .map(|(_, e)| e.payload())
            .find(|e| e.is_pset_mapping())
            .unwrap();
        assert_eq!(pset_edge.class_filter, vec!["IfcWall".to_string()]);
    }

    #[test]
    fn config_files_round_trip() {
        let mut config = MappingConfig::new();
        config.insert("Custom_Pset_1".into(), "Pset_WallCommon".into());

        let path = std::env::temp_dir().join("mapping-studio-config.json");
        save_config(&config, &path).unwrap();
        let loaded = load_config(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(loaded, config);
    }
}
