//! Scenario orchestrator.
//!
//! This module drives a full run: it builds the environment, lets the
//! agents discover each other, then replays the timeline one step at a
//! time. After every step the network is split into connected components
//! and each agent's routes and leader set are checked against the
//! shortest-path oracle of its component.

use std::collections::BTreeSet;

use color_eyre::eyre::{Result, WrapErr};
use log::{debug, info, warn};

use crate::address::NodeId;
use crate::analysis::{
    AgentLeadership, AgentSummary, ComponentReport, ReportMetadata, ScenarioReport, StepReport,
};
use crate::config::{Config, TopologyEdit};
use crate::scheduler::{EnvironmentConfig, ProtocolError, TimedEnvironment, DEFAULT_MAX_EVENTS};
use crate::topology::components::{sub_graphs, SubGraph};
use crate::topology::formations::Formation;
use crate::topology::graph::AdjacencyMatrix;
use crate::topology::oracle::{floyd_warshall, graph_center};

/// Everything needed to replay one run
#[derive(Debug, Clone)]
pub struct Scenario {
    pub name: String,
    pub matrix: AdjacencyMatrix,
    pub timeline: Vec<Vec<TopologyEdit>>,
    pub environment: EnvironmentConfig,
}

impl Scenario {
    pub fn from_config(config: &Config) -> Result<Self> {
        config.validate().wrap_err("Invalid scenario configuration")?;
        let matrix = config.matrix()?;
        Ok(Scenario {
            name: config.general.name.clone(),
            matrix,
            timeline: config.timeline.clone(),
            environment: EnvironmentConfig {
                max_events: config.general.max_events.unwrap_or(DEFAULT_MAX_EVENTS),
                hop_limit: config.general.max_hops,
            },
        })
    }

    pub fn from_formation(formation: Formation) -> Self {
        Scenario {
            name: formation.name,
            matrix: formation.matrix,
            timeline: formation.timeline,
            environment: EnvironmentConfig::default(),
        }
    }
}

/// Run the initial discovery and every timeline step
pub fn run_scenario(scenario: &Scenario) -> Result<ScenarioReport> {
    info!(
        "Running scenario '{}' with {} nodes and {} timeline steps",
        scenario.name,
        scenario.matrix.len(),
        scenario.timeline.len()
    );

    let mut env = TimedEnvironment::new(scenario.matrix.clone(), scenario.environment.clone());
    env.setup().wrap_err("Failed to set up agents")?;
    let events = env.drain().wrap_err("Initial discovery did not settle")?;

    let mut steps = Vec::with_capacity(scenario.timeline.len() + 1);
    steps.push(evaluate(&env, 0, &[], events)?);
    log_step(&steps[0]);

    for (index, edits) in scenario.timeline.iter().enumerate() {
        let step = index + 1;
        for edit in edits {
            env.apply(edit)
                .wrap_err_with(|| format!("Step {}: failed to apply {:?}", step, edit))?;
        }
        let events = env
            .recalibrate()
            .wrap_err_with(|| format!("Step {}: recalibration failed", step))?;
        let report = evaluate(&env, step, edits, events)?;
        log_step(&report);
        steps.push(report);
    }

    let agents = env
        .agents()
        .map(|agent| AgentSummary {
            node: agent.id(),
            attached: env.is_attached(agent.id()),
            counter: agent.counter(),
            neighbors: agent.known_neighbors().len(),
            routes: agent.routes().reachable().count(),
            stats: agent.stats(),
        })
        .collect();

    Ok(ScenarioReport {
        metadata: ReportMetadata {
            scenario: scenario.name.clone(),
            initial_nodes: scenario.matrix.len(),
            timeline_steps: scenario.timeline.len(),
            final_clock: env.clock(),
            stats: env.stats(),
        },
        steps,
        agents,
    })
}

/// Run the scenario described by a parsed configuration
pub fn run_config(config: &Config) -> Result<ScenarioReport> {
    let scenario = Scenario::from_config(config)?;
    run_scenario(&scenario)
}

/// Compare the current state of every attached agent with the oracle
pub fn evaluate(
    env: &TimedEnvironment,
    step: usize,
    edits: &[TopologyEdit],
    events: u64,
) -> Result<StepReport, ProtocolError> {
    let components = sub_graphs(env.matrix())
        .iter()
        .map(|sub| evaluate_component(env, sub))
        .collect::<Result<Vec<_>, _>>()?;
    let converged = components.iter().all(|component| component.converged);

    Ok(StepReport {
        step,
        edits: edits.to_vec(),
        events,
        clock: env.clock(),
        nodes: env.matrix().len(),
        edges: env.matrix().edge_count(),
        components,
        converged,
    })
}

fn evaluate_component(env: &TimedEnvironment, sub: &SubGraph) -> Result<ComponentReport, ProtocolError> {
    let members = sub
        .index_map
        .iter()
        .map(|index| env.addresses().id_of(*index))
        .collect::<Result<Vec<NodeId>, _>>()?;
    let member_set: BTreeSet<NodeId> = members.iter().copied().collect();

    let oracle = graph_center(&sub.matrix);
    let dist = floyd_warshall(&sub.matrix);
    let center: Vec<NodeId> = oracle.center.iter().map(|local| members[*local]).collect();
    let center_set: BTreeSet<NodeId> = center.iter().copied().collect();

    let mut route_mismatches = 0;
    let mut agents = Vec::with_capacity(members.len());
    for (local, node) in members.iter().enumerate() {
        let agent = env.agent(*node).ok_or(ProtocolError::MissingAgent(*node))?;

        for (other_local, other) in members.iter().enumerate() {
            if other_local != local && agent.routes().cost(*other) != Some(dist[local][other_local]) {
                debug!(
                    "Node {} route to {}: {:?}, expected {}",
                    node,
                    other,
                    agent.routes().cost(*other),
                    dist[local][other_local]
                );
                route_mismatches += 1;
            }
        }
        route_mismatches += agent
            .routes()
            .reachable()
            .filter(|destination| !member_set.contains(destination))
            .count();

        agents.push(AgentLeadership {
            node: *node,
            eccentricity: agent.eccentricity(),
            leaders: agent.leaders().iter().copied().collect(),
            elected: agent.elected(),
            agrees: *agent.leaders() == center_set,
        });
    }

    let converged = route_mismatches == 0 && agents.iter().all(|agent| agent.agrees);
    Ok(ComponentReport {
        members,
        center,
        radius: oracle.radius,
        diameter: oracle.diameter,
        route_mismatches,
        agents,
        converged,
    })
}

fn log_step(report: &StepReport) {
    info!(
        "Step {}: {} events, {} component(s), converged: {}",
        report.step,
        report.events,
        report.components.len(),
        report.converged
    );
    for component in report.components.iter().filter(|component| !component.converged) {
        let dissenting: Vec<NodeId> = component
            .agents
            .iter()
            .filter(|agent| !agent.agrees)
            .map(|agent| agent.node)
            .collect();
        warn!(
            "Step {}: component {:?} not converged ({} route mismatches, leader disagreement at {:?})",
            report.step, component.members, component.route_mismatches, dissenting
        );
    }
}
