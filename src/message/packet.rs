//! Application packets exchanged between agents.
//!
//! A packet is immutable once built. Every hop gets its own copy through
//! [`Packet::relayed`], which assigns a fresh sequence id and bills the
//! edge weight, so the transit a receiver sees is the cost of exactly the
//! path that copy travelled.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::address::NodeId;
use crate::topology::graph::Weight;

/// Logical simulation time
pub type Time = u64;

/// Per-source epoch used to order competing route claims
pub type UpdateCounter = u64;

/// Unique id of one packet copy within a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SequenceId(u64);

impl SequenceId {
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for SequenceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Issues sequence ids for a single simulation instance
#[derive(Debug, Clone)]
pub struct PacketIdGenerator {
    next: u64,
}

impl PacketIdGenerator {
    pub fn new() -> Self {
        PacketIdGenerator { next: 1 }
    }

    pub fn next_id(&mut self) -> SequenceId {
        let id = SequenceId(self.next);
        self.next += 1;
        id
    }

    /// Number of ids handed out so far
    pub fn issued(&self) -> u64 {
        self.next - 1
    }
}

impl Default for PacketIdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

/// When an eccentricity estimate was produced.
///
/// Ordered by time, then by the producer's revision number so that two
/// estimates taken at the same clock value still compare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Observation {
    pub time: Time,
    pub revision: u64,
}

/// A destination revoked at a given epoch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CutRoute {
    pub destination: NodeId,
    pub counter: UpdateCounter,
}

/// One row of an advertised distance vector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdvertisedRoute {
    pub destination: NodeId,
    pub cost: Weight,
    pub counter: UpdateCounter,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Payload {
    /// Route claim about the packet source. `revoked` lists the source's
    /// tombstones and asks those destinations to flood again.
    Discovery { revoked: Vec<CutRoute> },
    /// Eccentricity estimate of the packet source
    Eccentricity { value: Weight, observed: Observation },
    /// Routes the sender lost through a topology change
    RoutesCut { routes: Vec<CutRoute>, cut_at: Time },
    /// Distance vector pushed point-to-point
    TableMerge { routes: Vec<AdvertisedRoute> },
}

impl Payload {
    pub fn kind(&self) -> &'static str {
        match self {
            Payload::Discovery { .. } => "discovery",
            Payload::Eccentricity { .. } => "eccentricity",
            Payload::RoutesCut { .. } => "routes-cut",
            Payload::TableMerge { .. } => "table-merge",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Packet {
    sequence: SequenceId,
    payload: Payload,
    source: NodeId,
    /// `None` for broadcasts
    target: Option<NodeId>,
    transit: Weight,
    counter: UpdateCounter,
    hops: u32,
}

impl Packet {
    /// Packet flooded to every neighbor
    pub fn broadcast(
        sequence: SequenceId,
        payload: Payload,
        source: NodeId,
        counter: UpdateCounter,
    ) -> Self {
        Packet {
            sequence,
            payload,
            source,
            target: None,
            transit: 0,
            counter,
            hops: 0,
        }
    }

    /// Packet addressed to a single node
    pub fn unicast(
        sequence: SequenceId,
        payload: Payload,
        source: NodeId,
        target: NodeId,
        counter: UpdateCounter,
    ) -> Self {
        Packet {
            sequence,
            payload,
            source,
            target: Some(target),
            transit: 0,
            counter,
            hops: 0,
        }
    }

    /// Copy for the next hop, billed with that edge's weight
    pub fn relayed(&self, sequence: SequenceId, weight: Weight) -> Self {
        Packet {
            sequence,
            payload: self.payload.clone(),
            source: self.source,
            target: self.target,
            transit: self.transit.saturating_add(weight),
            counter: self.counter,
            hops: self.hops.saturating_add(1),
        }
    }

    pub fn sequence(&self) -> SequenceId {
        self.sequence
    }

    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    pub fn source(&self) -> NodeId {
        self.source
    }

    pub fn target(&self) -> Option<NodeId> {
        self.target
    }

    pub fn is_broadcast(&self) -> bool {
        self.target.is_none()
    }

    /// Sum of edge weights this copy travelled
    pub fn transit(&self) -> Weight {
        self.transit
    }

    pub fn counter(&self) -> UpdateCounter {
        self.counter
    }

    /// Edges this copy travelled
    pub fn hops(&self) -> u32 {
        self.hops
    }
}
