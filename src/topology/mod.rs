//! Network topology module.
//!
//! This module contains the weighted adjacency matrix, the shortest-path
//! oracle used to check converged runs, the connected-component splitter
//! and the built-in formations.

pub mod components;
pub mod formations;
pub mod graph;
pub mod oracle;

// Re-export key types and functions for easier access
pub use crate::config::TopologyEdit;
pub use components::{connected_components, sub_graphs, SubGraph};
pub use formations::{formation, formation_names, random_graph, Formation};
pub use graph::{AdjacencyMatrix, MatrixError, Weight};
pub use oracle::{floyd_warshall, graph_center, GraphCenter, UNREACHABLE};
