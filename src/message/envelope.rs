//! Transport metadata around a packet.

use crate::address::NodeId;
use crate::message::packet::{Packet, Time};

/// A packet in flight on one edge
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    pub packet: Packet,
    pub from: NodeId,
    pub to: NodeId,
    /// Clock value at send plus the edge weight
    pub arrival: Time,
}

impl Envelope {
    pub fn new(packet: Packet, from: NodeId, to: NodeId, arrival: Time) -> Self {
        Envelope {
            packet,
            from,
            to,
            arrival,
        }
    }
}
