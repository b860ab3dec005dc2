//! Message primitives.
//!
//! Packets carry the protocol payload; envelopes add the delivery
//! metadata the scheduler orders by.

pub mod envelope;
pub mod packet;

pub use envelope::Envelope;
pub use packet::{
    AdvertisedRoute, CutRoute, Observation, Packet, PacketIdGenerator, Payload, SequenceId, Time,
    UpdateCounter,
};
