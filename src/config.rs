use serde::{Deserialize, Serialize};

use crate::address::NodeId;
use crate::topology::graph::{AdjacencyMatrix, Weight};

const LOG_LEVELS: &[&str] = &["off", "error", "warn", "info", "debug", "trace"];

/// Scenario file: an initial topology plus a timeline of edits
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,
    pub topology: TopologyConfig,
    /// One entry per recalibration step; an empty step only re-runs detection
    #[serde(default)]
    pub timeline: Vec<Vec<TopologyEdit>>,
}

impl Config {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.general.name.trim().is_empty() {
            return Err(ValidationError::InvalidGeneral(
                "name cannot be empty".to_string(),
            ));
        }

        if let Some(level) = &self.general.log_level {
            if !LOG_LEVELS.contains(&level.to_lowercase().as_str()) {
                return Err(ValidationError::InvalidGeneral(format!(
                    "unknown log_level '{}', expected one of {:?}",
                    level, LOG_LEVELS
                )));
            }
        }

        if self.general.max_events == Some(0) {
            return Err(ValidationError::InvalidGeneral(
                "max_events must be positive".to_string(),
            ));
        }

        if self.general.max_hops == Some(0) {
            return Err(ValidationError::InvalidGeneral(
                "max_hops must be positive".to_string(),
            ));
        }

        self.matrix()?;

        for (step, edits) in self.timeline.iter().enumerate() {
            for edit in edits {
                edit.validate().map_err(|reason| {
                    ValidationError::InvalidTimeline(format!("step {}: {}", step, reason))
                })?;
            }
        }

        Ok(())
    }

    /// Build the initial adjacency matrix
    pub fn matrix(&self) -> Result<AdjacencyMatrix, ValidationError> {
        AdjacencyMatrix::from_rows(self.topology.matrix.clone())
            .map_err(|e| ValidationError::InvalidTopology(e.to_string()))
    }
}

/// Run-wide settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,
    /// Upper bound on events delivered by one drain of the queue
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_events: Option<u64>,
    /// Hop limit for forwarded unicast packets, defaults to the node count
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_hops: Option<u32>,
}

fn default_name() -> String {
    "scenario".to_string()
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            log_level: None,
            max_events: None,
            max_hops: None,
        }
    }
}

/// Initial physical network
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopologyConfig {
    /// Square symmetric weight matrix, 0 meaning "no edge"
    pub matrix: Vec<Vec<Weight>>,
}

fn default_weight() -> Weight {
    1
}

/// A single external change to the physical network.
///
/// Nodes are referenced by id. The nodes of the initial matrix get the
/// ids `0..n` in row order; inserted nodes continue from `n`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum TopologyEdit {
    AddEdge {
        u: NodeId,
        v: NodeId,
        #[serde(default = "default_weight")]
        weight: Weight,
    },
    RemoveEdge {
        u: NodeId,
        v: NodeId,
    },
    AddEdges {
        edges: Vec<(NodeId, NodeId)>,
        #[serde(default = "default_weight")]
        weight: Weight,
    },
    RemoveEdges {
        edges: Vec<(NodeId, NodeId)>,
    },
    /// Connect `node` to every other attached node
    AddAllEdges {
        node: NodeId,
        #[serde(default = "default_weight")]
        weight: Weight,
    },
    RemoveAllEdges {
        node: NodeId,
    },
    /// Grow the matrix by an isolated node at `at_index`
    InsertNode {
        at_index: usize,
    },
    /// Shrink the matrix; the agent is kept but detached
    RemoveNode {
        node: NodeId,
    },
}

impl TopologyEdit {
    /// Shape checks that do not need the live topology
    pub fn validate(&self) -> Result<(), String> {
        match self {
            TopologyEdit::AddEdge { u, v, weight } => check_edge(*u, *v, *weight),
            TopologyEdit::RemoveEdge { u, v } => check_edge(*u, *v, 1),
            TopologyEdit::AddEdges { edges, weight } => edges
                .iter()
                .try_for_each(|(u, v)| check_edge(*u, *v, *weight)),
            TopologyEdit::RemoveEdges { edges } => {
                edges.iter().try_for_each(|(u, v)| check_edge(*u, *v, 1))
            }
            TopologyEdit::AddAllEdges { weight, .. } if *weight == 0 => {
                Err("add_all_edges weight must be positive".to_string())
            }
            _ => Ok(()),
        }
    }
}

fn check_edge(u: NodeId, v: NodeId, weight: Weight) -> Result<(), String> {
    if u == v {
        return Err(format!("self-loop on node {}", u));
    }
    if weight == 0 {
        return Err(format!("edge ({}, {}) needs a positive weight", u, v));
    }
    Ok(())
}

/// Configuration validation errors
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("Invalid general configuration: {0}")]
    InvalidGeneral(String),
    #[error("Invalid topology configuration: {0}")]
    InvalidTopology(String),
    #[error("Invalid timeline: {0}")]
    InvalidTimeline(String),
}
