use crate::address::{AddressError, NodeId};
use crate::topology::graph::Weight;

/// Fatal protocol-invariant violations.
///
/// These indicate a misuse of the environment by whatever drives the
/// topology edits, so a run stops on the first one.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProtocolError {
    #[error(transparent)]
    Address(#[from] AddressError),
    #[error("No edge between {from} and {to}")]
    MissingEdge { from: NodeId, to: NodeId },
    #[error("Invalid edge ({u}, {v}) with weight {weight}")]
    InvalidEdge { u: NodeId, v: NodeId, weight: Weight },
    #[error("Node {0} tried to send to itself")]
    SelfSend(NodeId),
    #[error("No agent registered for node {0}")]
    MissingAgent(NodeId),
    #[error("Event budget of {0} deliveries exhausted before the queue drained")]
    EventBudgetExhausted(u64),
}
