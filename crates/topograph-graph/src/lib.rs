pub mod graph;
pub mod io;
pub mod layout;

pub use graph::{FilterGraph, GraphLink, GraphNode, NodeLinkData};
pub use io::{
    read_node_link_graph, write_node_link_graph, DecoderRegistry, EdgeListDecoder, GraphDecoder,
    NodeLinkJsonDecoder, TsvDecoder,
};
pub use layout::initialize_radial_layout;

// Re-export common types for convenience
pub use topograph_core::{Result, TopographError};
