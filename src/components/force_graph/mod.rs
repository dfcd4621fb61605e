mod component;
mod interaction;
mod reconcile;
mod render;
mod simulation;
mod state;
mod store;
mod style;
mod types;

pub use component::ForceGraphCanvas;
pub use interaction::Highlight;
pub use style::StyleTable;
pub use types::{GraphCommand, GraphData, GraphLink, GraphNode, NodeId, Properties};
