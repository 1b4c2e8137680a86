use crate::effects::Effect;
use crate::engine::{EngineError, EngineEvent};
use crate::store::Store;
use eframe::egui;
use mapping_model::{Category, Role};
use petgraph::stable_graph::NodeIndex;
use std::path::PathBuf;

/// Actions that can be dispatched to modify the editor state
#[derive(Debug, Clone)]
pub enum Action {
    // Graph Actions
    /// Validate and insert a user-drawn connection between two nodes
    Connect {
        origin: NodeIndex,
        dest: NodeIndex,
    },
    /// Delete every selected node and edge
    DeleteSelection,
    /// Add a user-authored mapping node
    AddCustomNode {
        role: Role,
        category: Category,
        label: String,
        pset: Option<String>,
    },
    /// Add a class-filter node with an empty selection
    AddFilterNode { label: String },
    /// Replace the entity-class selection of a filter node
    SetSelectedClasses {
        node_idx: NodeIndex,
        classes: Vec<String>,
    },
    /// Clear all selected edges
    ClearEdgeSelections,
    /// Clear the layout reset flag after the layout has been applied
    ClearLayoutResetFlag,
    /// Clear the one-shot fit-to-content request after the first frame
    ClearFitToScreenFlag,
    /// Record the canvas point currently at the middle of the view
    SetViewportCenter { center: egui::Pos2 },
    /// Pull region-bound nodes back inside their regions after drags
    ConfineNodesToRegions,
    /// Set the drag start state for edge creation
    SetDraggingFrom {
        node_idx: Option<NodeIndex>,
        position: Option<egui::Pos2>,
    },
    /// Indicate whether a drag operation has started
    SetDragStarted { started: bool },

    // File Operations
    /// Save the whole project (catalog, graph, configuration) to file
    SaveProject { path: PathBuf },
    /// Load a project from file
    LoadProject { path: PathBuf },
    /// Export only the mapping configuration
    ExportConfig { path: PathBuf },
    /// Import a mapping configuration and rebuild the derived edges
    ImportConfig { path: PathBuf },

    // Transformation Engine
    /// Start a transformation of the given input model
    StartTransform { input: PathBuf },
    /// An event reported by the running engine
    Engine { event: EngineEvent },

    /// Clear any error message
    ClearErrorMessage,
    /// Clear the transient status line
    ClearStatusMessage,
}

/// Apply a single action to modify the store state
pub fn update(store: &mut Store, action: Action) -> Vec<Effect> {
    match action {
        Action::Connect { origin, dest } => {
            match store.connect(origin, dest) {
                Ok(()) => store.status_message = None,
                // Rejected connections never become edges; the reason is
                // surfaced in the status line.
                Err(e) => store.status_message = Some(e.to_string()),
            }
            vec![]
        }
        Action::DeleteSelection => {
            store.delete_selection();
            vec![]
        }
        Action::AddCustomNode {
            role,
            category,
            label,
            pset,
        } => {
            if !label.trim().is_empty() {
                store.add_custom_node(role, category, label.trim().to_string(), pset);
            }
            vec![]
        }
        Action::AddFilterNode { label } => {
            let label = if label.trim().is_empty() {
                "Class Filter".to_string()
            } else {
                label.trim().to_string()
            };
            store.add_filter_node(label);
            vec![]
        }
        Action::SetSelectedClasses { node_idx, classes } => {
            store.set_selected_classes(node_idx, classes);
            vec![]
        }
        Action::ClearEdgeSelections => {
            store.graph.set_selected_edges(Vec::new());
            vec![]
        }
        Action::ClearLayoutResetFlag => {
            store.layout_reset_needed = false;
            vec![]
        }
        Action::ClearFitToScreenFlag => {
            store.fit_requested = false;
            vec![]
        }
        Action::SetViewportCenter { center } => {
            store.viewport_center = Some((center.x, center.y));
            vec![]
        }
        Action::ConfineNodesToRegions => {
            store.confine_nodes_to_regions();
            vec![]
        }
        Action::SetDraggingFrom { node_idx, position } => {
            store.dragging_from = match (node_idx, position) {
                (Some(idx), Some(pos)) => Some((idx, pos)),
                _ => None,
            };
            vec![]
        }
        Action::SetDragStarted { started } => {
            store.drag_started = started;
            vec![]
        }

        // File Operations
        Action::SaveProject { path } => {
            vec![Effect::SaveProject { path }]
        }
        Action::LoadProject { path } => {
            vec![Effect::LoadProject { path }]
        }
        Action::ExportConfig { path } => {
            vec![Effect::ExportConfig { path }]
        }
        Action::ImportConfig { path } => {
            vec![Effect::ImportConfig { path }]
        }

        // Transformation Engine
        Action::StartTransform { input } => {
            vec![Effect::StartTransform { input }]
        }
        Action::Engine { event } => {
            apply_engine_event(store, event);
            vec![]
        }

        Action::ClearErrorMessage => {
            store.error_message = None;
            vec![]
        }
        Action::ClearStatusMessage => {
            store.status_message = None;
            vec![]
        }
    }
}

fn apply_engine_event(store: &mut Store, event: EngineEvent) {
    match event {
        EngineEvent::Progress { percent, message } => {
            store.progress = Some((percent.min(100), message));
        }
        EngineEvent::ModelInfo(info) => {
            store.apply_model_info(info);
        }
        EngineEvent::Complete { output } => {
            store.processing = false;
            store.progress = None;
            store.last_output = Some(output);
        }
        EngineEvent::Error { error } => {
            store.processing = false;
            store.progress = None;
            // Resource exhaustion gets its own wording via Display.
            store.error_message = Some(match error {
                EngineError::ResourceExhausted => error.to_string(),
                EngineError::Failed(_) => error.to_string(),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mapping_model::{Catalog, MappingConfig};

    fn store() -> Store {
        let mut catalog = Catalog::default();
        catalog.set_property_sets(["A"], ["X"]);
        catalog.ifc_classes = vec!["IfcWall".into(), "IfcSlab".into()];
        Store::new(catalog, MappingConfig::new())
    }

    #[test]
    fn rejected_connections_surface_in_the_status_line() {
        let mut s = store();
        let a = s.index_of("source-pset-A").unwrap();
        let x = s.index_of("target-pset-X").unwrap();
        update(&mut s, Action::Connect { origin: a, dest: x });
        assert!(s.status_message.is_none());

        update(&mut s, Action::Connect { origin: x, dest: a });
        assert!(s.status_message.is_some());
        assert_eq!(s.graph.edges_iter().count(), 1);
    }

    #[test]
    fn blank_custom_labels_are_ignored() {
        let mut s = store();
        let before = s.graph.node_count();
        update(
            &mut s,
            Action::AddCustomNode {
                role: Role::Source,
                category: Category::PropertySet,
                label: "   ".into(),
                pset: None,
            },
        );
        assert_eq!(s.graph.node_count(), before);
    }

    #[test]
    fn completion_clears_the_processing_flag() {
        let mut s = store();
        s.processing = true;
        s.progress = Some((80, "converting".into()));
        update(
            &mut s,
            Action::Engine {
                event: EngineEvent::Complete {
                    output: "model_mapped.ifc".into(),
                },
            },
        );
        assert!(!s.processing);
        assert!(s.progress.is_none());
        assert_eq!(s.last_output.as_deref(), Some("model_mapped.ifc"));
    }

    #[test]
    fn engine_errors_clear_processing_and_report() {
        let mut s = store();
        s.processing = true;
        update(
            &mut s,
            Action::Engine {
                event: EngineEvent::Error {
                    error: EngineError::ResourceExhausted,
                },
            },
        );
        assert!(!s.processing);
        let msg = s.error_message.unwrap();
        assert!(msg.contains("memory"));
    }

    #[test]
    fn start_transform_becomes_an_effect() {
        let mut s = store();
        let effects = update(
            &mut s,
            Action::StartTransform {
                input: PathBuf::from("model.ifc"),
            },
        );
        assert!(matches!(
            effects.as_slice(),
            [Effect::StartTransform { input }] if input == &PathBuf::from("model.ifc")
        ));
    }

    #[test]
    fn fit_to_content_runs_once() {
        let mut s = store();
        assert!(s.fit_requested);
        update(&mut s, Action::ClearFitToScreenFlag);
        assert!(!s.fit_requested);

        // Later graph changes never re-request the fit.
        update(
            &mut s,
            Action::AddFilterNode {
                label: "Filter".into(),
            },
        );
        assert!(!s.fit_requested);
    }

    #[test]
    fn filter_selection_changes_only_the_node() {
        let mut s = store();
        let f = s.add_filter_node("Filter".into());
        update(
            &mut s,
            Action::SetSelectedClasses {
                node_idx: f,
                classes: vec!["IfcWall".into()],
            },
        );
        assert_eq!(
            s.graph.node(f).unwrap().payload().attrs.selected_classes,
            vec!["IfcWall".to_string()]
        );
    }
}
