//! Eccentricity gossip and leader selection.
//!
//! Every agent keeps the latest eccentricity estimate it has heard from
//! each node. The leaders are the nodes with the smallest estimate; ties
//! are legitimate graph centers, so the set can hold several ids.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::address::NodeId;
use crate::message::Observation;
use crate::topology::graph::Weight;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EccentricityEntry {
    pub eccentricity: Weight,
    pub observed: Observation,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EccentricityTable {
    entries: BTreeMap<NodeId, EccentricityEntry>,
    /// Newest observation ever accepted per node, kept after `forget`
    #[serde(skip)]
    horizon: BTreeMap<NodeId, Observation>,
}

impl EccentricityTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store an estimate unless an equal or newer one was already seen
    pub fn record(&mut self, node: NodeId, eccentricity: Weight, observed: Observation) -> bool {
        if let Some(seen) = self.horizon.get(&node) {
            if observed <= *seen {
                return false;
            }
        }
        self.horizon.insert(node, observed);
        self.entries.insert(
            node,
            EccentricityEntry {
                eccentricity,
                observed,
            },
        );
        true
    }

    /// Drop the estimate of a node that is no longer reachable
    pub fn forget(&mut self, node: NodeId) -> bool {
        self.entries.remove(&node).is_some()
    }

    pub fn get(&self, node: NodeId) -> Option<&EccentricityEntry> {
        self.entries.get(&node)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&NodeId, &EccentricityEntry)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Ids sharing the minimum eccentricity among the nodes `eligible` keeps
    pub fn leaders<F>(&self, eligible: F) -> BTreeSet<NodeId>
    where
        F: Fn(NodeId) -> bool,
    {
        let candidates: Vec<(NodeId, Weight)> = self
            .entries
            .iter()
            .filter(|(node, _)| eligible(**node))
            .map(|(node, entry)| (*node, entry.eccentricity))
            .collect();

        let Some(minimum) = candidates.iter().map(|(_, ecc)| *ecc).min() else {
            return BTreeSet::new();
        };

        candidates
            .into_iter()
            .filter(|(_, ecc)| *ecc == minimum)
            .map(|(node, _)| node)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(time: u64, revision: u64) -> Observation {
        Observation { time, revision }
    }

    #[test]
    fn test_only_newer_observations_accepted() {
        let mut table = EccentricityTable::new();
        let node = NodeId::new(4);

        assert!(table.record(node, 3, at(10, 1)));
        assert!(!table.record(node, 1, at(10, 1)));
        assert!(!table.record(node, 1, at(8, 5)));
        assert!(table.record(node, 2, at(10, 2)));
        assert_eq!(table.get(node).unwrap().eccentricity, 2);
    }

    #[test]
    fn test_forget_keeps_horizon() {
        let mut table = EccentricityTable::new();
        let node = NodeId::new(1);
        table.record(node, 5, at(3, 1));

        assert!(table.forget(node));
        assert!(table.get(node).is_none());

        // A copy that was already seen does not come back
        assert!(!table.record(node, 5, at(3, 1)));
        assert!(table.record(node, 4, at(6, 2)));
    }

    #[test]
    fn test_leaders_with_ties_and_filter() {
        let mut table = EccentricityTable::new();
        table.record(NodeId::new(0), 3, at(1, 1));
        table.record(NodeId::new(1), 2, at(1, 1));
        table.record(NodeId::new(2), 2, at(1, 1));
        table.record(NodeId::new(3), 1, at(1, 1));

        let all = table.leaders(|_| true);
        assert_eq!(all, BTreeSet::from([NodeId::new(3)]));

        let without_three = table.leaders(|node| node != NodeId::new(3));
        assert_eq!(without_three, BTreeSet::from([NodeId::new(1), NodeId::new(2)]));

        assert!(EccentricityTable::new().leaders(|_| true).is_empty());
    }
}
