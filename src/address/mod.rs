//! Node addressing module.
//!
//! Assigns every agent a stable identifier and translates between
//! identifiers and adjacency matrix positions.

pub mod table;

pub use table::{AddressError, AddressTable, NodeId};
