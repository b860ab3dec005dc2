//! Priority queue of in-flight envelopes.
//!
//! Earliest arrival first; equal arrivals leave in insertion order so a
//! replay of the same inputs delivers in the same order.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::message::{Envelope, Time};

#[derive(Debug, Clone)]
struct Scheduled {
    arrival: Time,
    seq: u64,
    envelope: Envelope,
}

impl PartialEq for Scheduled {
    fn eq(&self, other: &Self) -> bool {
        self.arrival == other.arrival && self.seq == other.seq
    }
}

impl Eq for Scheduled {}

impl PartialOrd for Scheduled {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Scheduled {
    fn cmp(&self, other: &Self) -> Ordering {
        // BinaryHeap is a max-heap, so reverse both keys.
        other
            .arrival
            .cmp(&self.arrival)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

#[derive(Debug, Clone, Default)]
pub struct EventQueue {
    heap: BinaryHeap<Scheduled>,
    next_seq: u64,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, envelope: Envelope) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.heap.push(Scheduled {
            arrival: envelope.arrival,
            seq,
            envelope,
        });
    }

    pub fn pop(&mut self) -> Option<Envelope> {
        self.heap.pop().map(|scheduled| scheduled.envelope)
    }

    /// Arrival time of the next envelope
    pub fn peek_arrival(&self) -> Option<Time> {
        self.heap.peek().map(|scheduled| scheduled.arrival)
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::NodeId;
    use crate::message::{Packet, PacketIdGenerator, Payload};

    fn envelope(ids: &mut PacketIdGenerator, to: u64, arrival: Time) -> Envelope {
        let packet = Packet::broadcast(
            ids.next_id(),
            Payload::Discovery { revoked: vec![] },
            NodeId::new(0),
            0,
        );
        Envelope::new(packet, NodeId::new(0), NodeId::new(to), arrival)
    }

    #[test]
    fn test_earliest_arrival_first() {
        let mut ids = PacketIdGenerator::new();
        let mut queue = EventQueue::new();
        queue.push(envelope(&mut ids, 1, 10));
        queue.push(envelope(&mut ids, 2, 3));
        queue.push(envelope(&mut ids, 3, 7));

        assert_eq!(queue.peek_arrival(), Some(3));
        let order: Vec<u64> = std::iter::from_fn(|| queue.pop())
            .map(|e| e.to.value())
            .collect();
        assert_eq!(order, vec![2, 3, 1]);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_ties_keep_insertion_order() {
        let mut ids = PacketIdGenerator::new();
        let mut queue = EventQueue::new();
        for to in [5, 1, 4, 2] {
            queue.push(envelope(&mut ids, to, 2));
        }
        let order: Vec<u64> = std::iter::from_fn(|| queue.pop())
            .map(|e| e.to.value())
            .collect();
        assert_eq!(order, vec![5, 1, 4, 2]);
    }
}
