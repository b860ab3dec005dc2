//! Core data types for scenario reports.

use serde::Serialize;

use crate::address::NodeId;
use crate::agent::AgentStats;
use crate::config::TopologyEdit;
use crate::message::{Time, UpdateCounter};
use crate::scheduler::SimulationStats;
use crate::topology::graph::Weight;

/// Complete result of one scenario run
#[derive(Debug, Clone, Serialize)]
pub struct ScenarioReport {
    pub metadata: ReportMetadata,
    pub steps: Vec<StepReport>,
    /// Final state of every agent ever created, attached or not
    pub agents: Vec<AgentSummary>,
}

impl ScenarioReport {
    /// True when every step converged
    pub fn converged(&self) -> bool {
        self.steps.iter().all(|step| step.converged)
    }

    pub fn last_step(&self) -> Option<&StepReport> {
        self.steps.last()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportMetadata {
    pub scenario: String,
    pub initial_nodes: usize,
    pub timeline_steps: usize,
    pub final_clock: Time,
    pub stats: SimulationStats,
}

/// Network state after one recalibration step.
///
/// Step 0 is the initial discovery; step `k` follows the `k`-th timeline
/// entry.
#[derive(Debug, Clone, Serialize)]
pub struct StepReport {
    pub step: usize,
    pub edits: Vec<TopologyEdit>,
    /// Deliveries needed to drain the queue
    pub events: u64,
    pub clock: Time,
    pub nodes: usize,
    pub edges: usize,
    pub components: Vec<ComponentReport>,
    pub converged: bool,
}

/// One connected component compared against the shortest-path oracle
#[derive(Debug, Clone, Serialize)]
pub struct ComponentReport {
    pub members: Vec<NodeId>,
    pub center: Vec<NodeId>,
    pub radius: Weight,
    pub diameter: Weight,
    /// Routes whose cost differs from the oracle, or that leave the component
    pub route_mismatches: usize,
    pub agents: Vec<AgentLeadership>,
    pub converged: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct AgentLeadership {
    pub node: NodeId,
    pub eccentricity: Weight,
    pub leaders: Vec<NodeId>,
    /// Highest id in the leader set
    pub elected: Option<NodeId>,
    pub agrees: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct AgentSummary {
    pub node: NodeId,
    pub attached: bool,
    pub counter: UpdateCounter,
    /// Neighbors seen at the last detection tick
    pub neighbors: usize,
    pub routes: usize,
    pub stats: AgentStats,
}
