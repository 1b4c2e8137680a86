//! Domain model for the IFC mapping editor: typed nodes and edges over a
//! stable graph, deterministic category layout, connection validation with
//! direction normalization, and synchronization between the graph and the
//! canonical mapping configuration.

pub mod catalog;
pub mod category;
pub mod connect;
pub mod graph;
pub mod ids;
pub mod layout;
pub mod node;
pub mod sync;

pub use catalog::{Catalog, CatalogItem, CategoryItems};
pub use category::{Category, Role, CLASSIFICATION_TARGET_ID};
pub use connect::{plan, ConnectError, ConnectView, ConnectionPlan, MappingUpdate, PlanKind};
pub use graph::MappingGraph;
pub use layout::{PlacedNode, Point, Region};
pub use node::{EdgeKind, MappingEdge, MappingNode, NodeAttrs, NodeKind};
pub use sync::MappingConfig;
