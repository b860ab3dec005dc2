//! # Flocksim - Decentralized routing and leader election simulator
//!
//! This library simulates a flock of agents that learn shortest-path routes
//! over a weighted graph purely through local message exchange, and elect
//! the graph center as their leader by gossiping eccentricity estimates.
//!
//! ## Overview
//!
//! Agents never see the adjacency matrix. Each one floods a discovery
//! packet, keeps the cheapest route it hears about every other node, and
//! tells every reachable node its own eccentricity (the longest of its
//! shortest routes). The nodes with the smallest eccentricity are the
//! leaders. When edges appear or disappear, agents notice on the next
//! detection tick, revoke routes that went through lost links and rebuild
//! the rest.
//!
//! ## Key Features
//!
//! - **Discrete-event scheduling**: a logical clock where an edge weight is
//!   its transmission delay
//! - **Epoch counters and tombstones**: stale route claims never resurrect
//!   revoked paths
//! - **Topology edits at runtime**: edge and node insertion or removal
//! - **Built-in oracle**: Floyd-Warshall distances and graph center per
//!   connected component, used to check every step
//! - **Reproducible**: identical inputs give identical event orderings
//!
//! ## Architecture
//!
//! - `address`: stable node ids and the id to matrix index table
//! - `message`: packets, payloads and in-flight envelopes
//! - `scheduler`: event queue, timed environment and topology mutator
//! - `agent`: routing table, eccentricity table and the agent state machine
//! - `topology`: adjacency matrix, oracle, component splitter and formations
//! - `config` / `config_loader`: YAML scenario files
//! - `orchestrator`: replays a scenario timeline and checks each step
//! - `analysis`: JSON and text reports
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use flocksim::orchestrator::{run_scenario, Scenario};
//! use flocksim::topology::formation;
//!
//! let preset = formation("split-merge").expect("known formation");
//! let report = run_scenario(&Scenario::from_formation(preset))?;
//! for step in &report.steps {
//!     println!("step {} converged: {}", step.step, step.converged);
//! }
//! # Ok::<(), color_eyre::Report>(())
//! ```
//!
//! ## Error Handling
//!
//! Protocol invariant violations are typed `ProtocolError`s. The driver
//! layers (loader, orchestrator, reports) return `color_eyre::Result` with
//! context attached.

pub mod address;
pub mod agent;
pub mod analysis;
pub mod config;
pub mod config_loader;
pub mod message;
pub mod orchestrator;
pub mod scheduler;
pub mod topology;
