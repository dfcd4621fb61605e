pub mod charts;
pub mod force_graph;
pub mod node_details;
pub mod pagination;
pub mod property_editor;
pub mod toast;
