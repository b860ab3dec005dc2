//! What an agent sees of the environment while handling one event.

use std::collections::BTreeMap;

use crate::address::NodeId;
use crate::message::{Packet, PacketIdGenerator, Payload, SequenceId, Time, UpdateCounter};
use crate::topology::graph::Weight;

/// A packet handed to the environment for delivery to a neighbor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outgoing {
    pub to: NodeId,
    pub packet: Packet,
}

/// Per-event view of the environment.
///
/// Sends are buffered and dispatched by the environment after the agent
/// returns, so an agent runs to completion before anything it emitted
/// can be delivered.
pub struct Context<'a> {
    now: Time,
    neighbors: &'a BTreeMap<NodeId, Weight>,
    hop_limit: u32,
    packet_ids: &'a mut PacketIdGenerator,
    outbox: Vec<Outgoing>,
}

impl<'a> Context<'a> {
    pub fn new(
        now: Time,
        neighbors: &'a BTreeMap<NodeId, Weight>,
        hop_limit: u32,
        packet_ids: &'a mut PacketIdGenerator,
    ) -> Self {
        Context {
            now,
            neighbors,
            hop_limit,
            packet_ids,
            outbox: Vec::new(),
        }
    }

    pub fn now(&self) -> Time {
        self.now
    }

    /// Current neighbors and edge weights, in id order
    pub fn neighbors(&self) -> &'a BTreeMap<NodeId, Weight> {
        self.neighbors
    }

    pub fn is_neighbor(&self, id: NodeId) -> bool {
        self.neighbors.contains_key(&id)
    }

    pub fn weight_to(&self, id: NodeId) -> Option<Weight> {
        self.neighbors.get(&id).copied()
    }

    pub fn hop_limit(&self) -> u32 {
        self.hop_limit
    }

    pub fn next_sequence(&mut self) -> SequenceId {
        self.packet_ids.next_id()
    }

    /// Build a broadcast packet originating here
    pub fn broadcast(&mut self, payload: Payload, source: NodeId, counter: UpdateCounter) -> Packet {
        let sequence = self.next_sequence();
        Packet::broadcast(sequence, payload, source, counter)
    }

    /// Build a unicast packet originating here
    pub fn unicast(
        &mut self,
        payload: Payload,
        source: NodeId,
        target: NodeId,
        counter: UpdateCounter,
    ) -> Packet {
        let sequence = self.next_sequence();
        Packet::unicast(sequence, payload, source, target, counter)
    }

    pub fn send(&mut self, to: NodeId, packet: Packet) {
        self.outbox.push(Outgoing { to, packet });
    }

    pub fn outbox(&self) -> &[Outgoing] {
        &self.outbox
    }

    pub fn into_outbox(self) -> Vec<Outgoing> {
        self.outbox
    }
}
