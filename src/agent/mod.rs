//! Routing agents.
//!
//! Each simulated node runs one [`RoutingAgent`]: a distance-vector
//! routing table, an eccentricity table for leader election, and the
//! detection logic that repairs both when the neighborhood changes.

pub mod context;
pub mod election;
pub mod node;
pub mod routing;

pub use context::{Context, Outgoing};
pub use election::{EccentricityEntry, EccentricityTable};
pub use node::{AgentStats, RoutingAgent};
pub use routing::{RouteChange, RoutingEntry, RoutingTable};
