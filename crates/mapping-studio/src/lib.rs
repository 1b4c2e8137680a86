//! Visual editor for mapping custom IFC property groupings onto standard
//! schema groupings. The canvas shows source and target nodes grouped by
//! category; drawing a connection records the mapping, and the resulting
//! configuration drives an external transformation of the model file.

pub mod actions;
pub mod app;
pub mod effects;
pub mod engine;
pub mod graph_view;
pub mod layout_grid;
pub mod node_shapes;
pub mod sample;
pub mod serialization;
pub mod state;
pub mod store;
pub mod versioned;

pub mod native;
pub mod web;

use eframe::CreationContext;

/// Build the application with the built-in demo data.
pub fn create_app(_cc: &CreationContext<'_>) -> app::App {
    app::App::new(state::State::new(sample::sample_store()))
}
