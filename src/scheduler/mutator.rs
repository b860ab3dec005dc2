//! Topology edits applied to a running environment.
//!
//! Edits only touch the matrix and the address table. Agents find out on
//! the next detection tick, the same way they would notice a real link
//! going up or down.

use log::debug;

use crate::address::{AddressError, NodeId};
use crate::agent::RoutingAgent;
use crate::config::TopologyEdit;
use crate::scheduler::environment::TimedEnvironment;
use crate::scheduler::error::ProtocolError;
use crate::topology::graph::Weight;

impl TimedEnvironment {
    /// Set the symmetric weight of an edge, replacing any existing weight
    pub fn add_edge(&mut self, u: NodeId, v: NodeId, weight: Weight) -> Result<&mut Self, ProtocolError> {
        if u == v || weight == 0 {
            return Err(ProtocolError::InvalidEdge { u, v, weight });
        }
        let iu = self.addresses.index_of(u)?;
        let iv = self.addresses.index_of(v)?;
        self.matrix.set(iu, iv, weight);
        debug!("Edge ({}, {}) set to weight {}", u, v, weight);
        Ok(self)
    }

    /// Remove an edge; removing a missing edge is a no-op
    pub fn remove_edge(&mut self, u: NodeId, v: NodeId) -> Result<&mut Self, ProtocolError> {
        if u == v {
            return Err(ProtocolError::InvalidEdge { u, v, weight: 0 });
        }
        let iu = self.addresses.index_of(u)?;
        let iv = self.addresses.index_of(v)?;
        if self.matrix.has_edge(iu, iv) {
            self.matrix.set(iu, iv, 0);
            debug!("Edge ({}, {}) removed", u, v);
        }
        Ok(self)
    }

    pub fn add_edges(&mut self, edges: &[(NodeId, NodeId)], weight: Weight) -> Result<&mut Self, ProtocolError> {
        for (u, v) in edges {
            self.add_edge(*u, *v, weight)?;
        }
        Ok(self)
    }

    pub fn remove_edges(&mut self, edges: &[(NodeId, NodeId)]) -> Result<&mut Self, ProtocolError> {
        for (u, v) in edges {
            self.remove_edge(*u, *v)?;
        }
        Ok(self)
    }

    /// Connect `node` to every other attached node
    pub fn add_all_edges(&mut self, node: NodeId, weight: Weight) -> Result<&mut Self, ProtocolError> {
        self.addresses.index_of(node)?;
        let others: Vec<NodeId> = self
            .addresses
            .ids()
            .iter()
            .copied()
            .filter(|other| *other != node)
            .collect();
        for other in others {
            self.add_edge(node, other, weight)?;
        }
        Ok(self)
    }

    /// Isolate `node` without removing it
    pub fn remove_all_edges(&mut self, node: NodeId) -> Result<&mut Self, ProtocolError> {
        let index = self.addresses.index_of(node)?;
        let neighbors: Vec<usize> = self.matrix.neighbors(index).map(|(other, _)| other).collect();
        for other in neighbors {
            self.matrix.set(index, other, 0);
        }
        debug!("Node {} isolated", node);
        Ok(self)
    }

    /// Grow the matrix by one isolated node and start its agent.
    ///
    /// The new node gets a fresh id; existing ids never move, only the
    /// matrix indices after `at_index` shift by one.
    pub fn insert_node(&mut self, at_index: usize) -> Result<NodeId, ProtocolError> {
        let len = self.addresses.len();
        if at_index > len {
            return Err(AddressError::UnknownIndex { index: at_index, len }.into());
        }
        let id = self.addresses.allocate();
        self.addresses.insert(id, at_index)?;
        self.matrix.insert_index(at_index);
        self.agents.insert(id, RoutingAgent::new(id));
        self.run_agent(id, |agent, ctx| agent.setup(ctx))?;
        debug!("Inserted node {} at index {}", id, at_index);
        Ok(id)
    }

    /// Shrink the matrix; the agent stays around detached
    pub fn remove_node(&mut self, node: NodeId) -> Result<&mut Self, ProtocolError> {
        let index = self.addresses.remove(node)?;
        self.matrix.remove_index(index);
        debug!("Removed node {} from index {}", node, index);
        Ok(self)
    }

    pub fn apply(&mut self, edit: &TopologyEdit) -> Result<(), ProtocolError> {
        match edit {
            TopologyEdit::AddEdge { u, v, weight } => {
                self.add_edge(*u, *v, *weight)?;
            }
            TopologyEdit::RemoveEdge { u, v } => {
                self.remove_edge(*u, *v)?;
            }
            TopologyEdit::AddEdges { edges, weight } => {
                self.add_edges(edges, *weight)?;
            }
            TopologyEdit::RemoveEdges { edges } => {
                self.remove_edges(edges)?;
            }
            TopologyEdit::AddAllEdges { node, weight } => {
                self.add_all_edges(*node, *weight)?;
            }
            TopologyEdit::RemoveAllEdges { node } => {
                self.remove_all_edges(*node)?;
            }
            TopologyEdit::InsertNode { at_index } => {
                self.insert_node(*at_index)?;
            }
            TopologyEdit::RemoveNode { node } => {
                self.remove_node(*node)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::address::NodeId;
    use crate::config::TopologyEdit;
    use crate::scheduler::environment::{EnvironmentConfig, TimedEnvironment};
    use crate::scheduler::error::ProtocolError;
    use crate::topology::graph::AdjacencyMatrix;

    fn id(value: u64) -> NodeId {
        NodeId::new(value)
    }

    fn line(size: usize) -> TimedEnvironment {
        let mut matrix = AdjacencyMatrix::empty(size);
        for i in 1..size {
            matrix.set(i - 1, i, 1);
        }
        TimedEnvironment::new(matrix, EnvironmentConfig::default())
    }

    #[test]
    fn test_edge_edits_are_idempotent() {
        let mut env = line(3);
        env.add_edge(id(0), id(2), 4).unwrap();
        env.add_edge(id(0), id(2), 4).unwrap();
        assert_eq!(env.matrix().weight(0, 2), 4);
        assert_eq!(env.matrix().weight(2, 0), 4);

        env.remove_edge(id(0), id(2)).unwrap();
        env.remove_edge(id(0), id(2)).unwrap();
        assert!(!env.matrix().has_edge(0, 2));
    }

    #[test]
    fn test_invalid_edges_rejected() {
        let mut env = line(3);
        assert_eq!(
            env.add_edge(id(1), id(1), 1).err(),
            Some(ProtocolError::InvalidEdge { u: id(1), v: id(1), weight: 1 })
        );
        assert_eq!(
            env.add_edge(id(0), id(1), 0).err(),
            Some(ProtocolError::InvalidEdge { u: id(0), v: id(1), weight: 0 })
        );
        assert!(matches!(
            env.remove_edge(id(0), id(7)),
            Err(ProtocolError::Address(_))
        ));
    }

    #[test]
    fn test_all_edges() {
        let mut env = line(4);
        env.add_all_edges(id(0), 2).unwrap();
        assert_eq!(env.neighbors_of(id(0)).unwrap().len(), 3);

        env.remove_all_edges(id(1)).unwrap();
        assert!(env.neighbors_of(id(1)).unwrap().is_empty());
        assert_eq!(env.matrix().weight(0, 2), 2);
    }

    #[test]
    fn test_insert_node_shifts_indices_not_ids() {
        let mut env = line(3);
        let new = env.insert_node(1).unwrap();
        assert_eq!(new, id(3));
        assert_eq!(env.matrix().len(), 4);
        assert_eq!(env.addresses().index_of(new).unwrap(), 1);
        assert_eq!(env.addresses().index_of(id(1)).unwrap(), 2);
        assert!(env.neighbors_of(new).unwrap().is_empty());
        // The old edge (0, 1) survives under its shifted indices
        assert_eq!(env.neighbors_of(id(0)).unwrap().get(&id(1)), Some(&1));
        assert!(env.agent(new).is_some());

        assert!(env.insert_node(9).is_err());
    }

    #[test]
    fn test_remove_node_detaches_agent() {
        let mut env = line(3);
        env.remove_node(id(1)).unwrap();
        assert_eq!(env.matrix().len(), 2);
        assert!(!env.is_attached(id(1)));
        assert!(env.agent(id(1)).is_some());
        assert!(env.neighbors_of(id(0)).unwrap().is_empty());
        assert!(env.remove_node(id(1)).is_err());
    }

    #[test]
    fn test_apply_edit() {
        let mut env = line(3);
        env.apply(&TopologyEdit::AddEdges {
            edges: vec![(id(0), id(2))],
            weight: 3,
        })
        .unwrap();
        assert_eq!(env.matrix().weight(0, 2), 3);

        env.apply(&TopologyEdit::RemoveNode { node: id(2) }).unwrap();
        assert_eq!(env.matrix().len(), 2);
    }
}
