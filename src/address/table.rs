//! Node address table.
//!
//! This file manages the registry of node identifiers and keeps the
//! mapping between a node's stable id and its current row/column in the
//! adjacency matrix. Ids are never reused, so a node keeps its identity
//! when rows are inserted or removed elsewhere in the matrix.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Stable identifier of a simulated agent
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(u64);

impl NodeId {
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    pub const fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for NodeId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

/// Errors raised when translating between ids and matrix indices
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AddressError {
    #[error("Unknown node id {0}")]
    UnknownNode(NodeId),
    #[error("Matrix index {index} out of range for {len} nodes")]
    UnknownIndex { index: usize, len: usize },
    #[error("Node id {0} is already present in the address table")]
    DuplicateNode(NodeId),
}

/// Bijection between node ids and adjacency matrix indices
#[derive(Debug, Clone)]
pub struct AddressTable {
    /// Node ids in matrix order
    ordered_ids: Vec<NodeId>,
    /// Fast reverse lookup, rebuilt on every resize
    indices: HashMap<NodeId, usize>,
    /// Next id handed out by `allocate`
    next_id: u64,
}

impl AddressTable {
    /// Create a table for `size` nodes with ids `0..size` matching their index
    pub fn new(size: usize) -> Self {
        let ordered_ids: Vec<NodeId> = (0..size as u64).map(NodeId::new).collect();
        let mut table = AddressTable {
            ordered_ids,
            indices: HashMap::new(),
            next_id: size as u64,
        };
        table.rebuild();
        table
    }

    /// Matrix index currently held by `id`
    pub fn index_of(&self, id: NodeId) -> Result<usize, AddressError> {
        self.indices
            .get(&id)
            .copied()
            .ok_or(AddressError::UnknownNode(id))
    }

    /// Id of the node at matrix `index`
    pub fn id_of(&self, index: usize) -> Result<NodeId, AddressError> {
        self.ordered_ids
            .get(index)
            .copied()
            .ok_or(AddressError::UnknownIndex {
                index,
                len: self.ordered_ids.len(),
            })
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.indices.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.ordered_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ordered_ids.is_empty()
    }

    /// Ids in matrix order
    pub fn ids(&self) -> &[NodeId] {
        &self.ordered_ids
    }

    /// Hand out a fresh id that has never been used in this table
    pub fn allocate(&mut self) -> NodeId {
        let id = NodeId::new(self.next_id);
        self.next_id += 1;
        id
    }

    /// Place `id` at matrix index `at_index`, shifting later nodes down
    pub fn insert(&mut self, id: NodeId, at_index: usize) -> Result<(), AddressError> {
        if self.contains(id) {
            return Err(AddressError::DuplicateNode(id));
        }
        if at_index > self.ordered_ids.len() {
            return Err(AddressError::UnknownIndex {
                index: at_index,
                len: self.ordered_ids.len(),
            });
        }
        self.ordered_ids.insert(at_index, id);
        self.next_id = self.next_id.max(id.value() + 1);
        self.rebuild();
        Ok(())
    }

    /// Drop `id` from the table and return the index it occupied
    pub fn remove(&mut self, id: NodeId) -> Result<usize, AddressError> {
        let index = self.index_of(id)?;
        self.ordered_ids.remove(index);
        self.rebuild();
        Ok(index)
    }

    fn rebuild(&mut self) {
        self.indices = self
            .ordered_ids
            .iter()
            .enumerate()
            .map(|(index, id)| (*id, index))
            .collect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_ids_match_indices() {
        let table = AddressTable::new(4);
        for index in 0..4 {
            let id = table.id_of(index).unwrap();
            assert_eq!(id, NodeId::new(index as u64));
            assert_eq!(table.index_of(id).unwrap(), index);
        }
    }

    #[test]
    fn test_unknown_lookups_fail() {
        let table = AddressTable::new(2);
        assert_eq!(
            table.index_of(NodeId::new(7)),
            Err(AddressError::UnknownNode(NodeId::new(7)))
        );
        assert!(matches!(
            table.id_of(2),
            Err(AddressError::UnknownIndex { index: 2, len: 2 })
        ));
    }

    #[test]
    fn test_ids_survive_resize() {
        let mut table = AddressTable::new(3);
        let fresh = table.allocate();
        assert_eq!(fresh, NodeId::new(3));

        table.insert(fresh, 0).unwrap();
        assert_eq!(table.index_of(fresh).unwrap(), 0);
        assert_eq!(table.index_of(NodeId::new(2)).unwrap(), 3);

        let removed_at = table.remove(NodeId::new(1)).unwrap();
        assert_eq!(removed_at, 2);
        assert_eq!(table.index_of(NodeId::new(2)).unwrap(), 2);
        assert!(table.index_of(NodeId::new(1)).is_err());

        // Removed ids are never handed out again
        assert_eq!(table.allocate(), NodeId::new(4));
    }

    #[test]
    fn test_duplicate_insert_rejected() {
        let mut table = AddressTable::new(2);
        assert_eq!(
            table.insert(NodeId::new(1), 0),
            Err(AddressError::DuplicateNode(NodeId::new(1)))
        );
    }
}
