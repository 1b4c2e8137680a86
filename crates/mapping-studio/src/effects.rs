use crate::serialization;
use crate::store::Store;
use std::path::PathBuf;

/// Deferred effects that must run outside the main reducer (file IO and
/// engine startup)
#[derive(Debug, Clone)]
pub enum Effect {
    /// Save the whole project to disk
    SaveProject { path: PathBuf },
    /// Load a project from disk
    LoadProject { path: PathBuf },
    /// Export the mapping configuration as plain JSON
    ExportConfig { path: PathBuf },
    /// Import a mapping configuration and rebuild the derived edges
    ImportConfig { path: PathBuf },
    /// Launch a transformation of the given input model
    StartTransform { input: PathBuf },
}

/// Execute a single effect against the store
pub fn run(store: &mut Store, effect: Effect) {
    match effect {
        Effect::SaveProject { path } => {
            if let Err(e) = serialization::save_project(store, &path) {
                store.error_message = Some(e);
            }
        }
        Effect::LoadProject { path } => match serialization::load_project(&path) {
            Ok(loaded) => *store = loaded,
            Err(e) => store.error_message = Some(e),
        },
        Effect::ExportConfig { path } => {
            if let Err(e) = serialization::save_config(store.config.get(), &path) {
                store.error_message = Some(e);
            }
        }
        Effect::ImportConfig { path } => match serialization::load_config(&path) {
            Ok(config) => {
                store.config.set(config);
                store.sync_config_edges();
            }
            Err(e) => store.error_message = Some(e),
        },
        Effect::StartTransform { input } => start_transform(store, input),
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn start_transform(store: &mut Store, input: PathBuf) {
    use crate::engine::{TransformRequest, command_backend, spawn};

    if store.processing {
        store.status_message = Some("a transformation is already running".to_string());
        return;
    }
    let request = TransformRequest {
        input,
        config: store.config.get().clone(),
    };
    store.processing = true;
    store.progress = Some((0, "starting".to_string()));
    store.last_output = None;
    store.engine = Some(spawn(request, command_backend));
}

#[cfg(target_arch = "wasm32")]
fn start_transform(store: &mut Store, _input: PathBuf) {
    store.error_message = Some("transformations are not available in the browser build".to_string());
}
