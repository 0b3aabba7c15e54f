//! Trust line graph: data types, the record-to-graph transform, and layout.

pub mod builder;
pub mod layout;
pub mod quadtree;
pub mod types;

pub use builder::build_graph;
pub use layout::ForceLayout;
pub use types::{GraphData, GraphState, TrustLine};
