//! Built-in formations.
//!
//! Each formation is an initial matrix plus a timeline of topology edits,
//! one entry per recalibration step. Nodes are named by their initial
//! matrix index, which is also their id.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::address::NodeId;
use crate::config::{Config, GeneralConfig, TopologyConfig, TopologyEdit};
use crate::topology::graph::{AdjacencyMatrix, Weight};

/// Names accepted by [`formation`], in presentation order
pub const FORMATION_NAMES: &[&str] = &[
    "circular",
    "wedge",
    "line",
    "split-merge",
    "rebalance-flocks",
    "recalibrate-flocks",
];

#[derive(Debug, Clone)]
pub struct Formation {
    pub name: String,
    pub matrix: AdjacencyMatrix,
    pub timeline: Vec<Vec<TopologyEdit>>,
}

impl Formation {
    /// Scenario equivalent of this formation
    pub fn into_config(self) -> Config {
        Config {
            general: GeneralConfig {
                name: self.name,
                ..GeneralConfig::default()
            },
            topology: TopologyConfig {
                matrix: self.matrix.rows().to_vec(),
            },
            timeline: self.timeline,
        }
    }
}

/// Look up a preset by name, ignoring case and `_`/`-` differences
pub fn formation(name: &str) -> Option<Formation> {
    let key = name.trim().to_lowercase().replace('_', "-");
    let (display, matrix, timeline) = match key.as_str() {
        "circular" => ("Circular", complete(6), circular_timeline()),
        "wedge" => ("Wedge", wedge(), wedge_timeline()),
        "line" => ("Line", complete(5), line_timeline()),
        "split-merge" => ("Split-Merge", wedge(), split_merge_timeline()),
        "rebalance-flocks" => ("Rebalance-Flocks", two_flocks(), rebalance_timeline()),
        "recalibrate-flocks" => ("Recalibrate-Flocks", two_flocks(), recalibrate_timeline()),
        _ => return None,
    };
    Some(Formation {
        name: display.to_string(),
        matrix,
        timeline,
    })
}

pub fn formation_names() -> &'static [&'static str] {
    FORMATION_NAMES
}

/// Seeded random connected graph.
///
/// A random spanning tree guarantees connectivity; every other pair then
/// gets an edge with probability `extra_probability`. Weights are drawn
/// uniformly from `1..=max_weight`.
pub fn random_graph(size: usize, extra_probability: f64, max_weight: Weight, seed: u64) -> AdjacencyMatrix {
    let mut rng = StdRng::seed_from_u64(seed);
    let size = size.max(1);
    let max_weight = max_weight.max(1);
    let probability = extra_probability.clamp(0.0, 1.0);
    let mut matrix = AdjacencyMatrix::empty(size);

    for node in 1..size {
        let parent = rng.gen_range(0..node);
        matrix.set(parent, node, rng.gen_range(1..=max_weight));
    }

    for u in 0..size {
        for v in (u + 1)..size {
            if !matrix.has_edge(u, v) && rng.gen_bool(probability) {
                matrix.set(u, v, rng.gen_range(1..=max_weight));
            }
        }
    }

    matrix
}

fn complete(size: usize) -> AdjacencyMatrix {
    let mut matrix = AdjacencyMatrix::empty(size);
    for u in 0..size {
        for v in (u + 1)..size {
            matrix.set(u, v, 1);
        }
    }
    matrix
}

/// Seven nodes around a hub at index 3
fn wedge() -> AdjacencyMatrix {
    let mut matrix = AdjacencyMatrix::empty(7);
    for (u, v) in [(0, 1), (0, 3), (1, 2), (1, 3), (2, 3), (3, 4), (3, 5), (3, 6), (4, 5), (5, 6)] {
        matrix.set(u, v, 1);
    }
    matrix
}

/// Two complete flocks of six plus a straggler at index 12
fn two_flocks() -> AdjacencyMatrix {
    let mut matrix = AdjacencyMatrix::empty(13);
    for base in [0, 6] {
        for u in base..(base + 6) {
            for v in (u + 1)..(base + 6) {
                matrix.set(u, v, 1);
            }
        }
    }
    matrix
}

fn id(value: u64) -> NodeId {
    NodeId::new(value)
}

fn pairs(edges: &[(u64, u64)]) -> Vec<(NodeId, NodeId)> {
    edges.iter().map(|(u, v)| (id(*u), id(*v))).collect()
}

fn add(u: u64, v: u64, weight: Weight) -> TopologyEdit {
    TopologyEdit::AddEdge {
        u: id(u),
        v: id(v),
        weight,
    }
}

fn remove(u: u64, v: u64) -> TopologyEdit {
    TopologyEdit::RemoveEdge { u: id(u), v: id(v) }
}

fn circular_timeline() -> Vec<Vec<TopologyEdit>> {
    vec![
        vec![],
        vec![TopologyEdit::RemoveEdges {
            edges: pairs(&[(1, 3), (1, 4), (1, 5)]),
        }],
        vec![TopologyEdit::RemoveAllEdges { node: id(2) }],
        vec![TopologyEdit::AddEdges {
            edges: pairs(&[(1, 3), (1, 4), (1, 5)]),
            weight: 1,
        }],
        vec![TopologyEdit::AddAllEdges {
            node: id(2),
            weight: 1,
        }],
    ]
}

fn wedge_timeline() -> Vec<Vec<TopologyEdit>> {
    vec![
        vec![],
        vec![TopologyEdit::RemoveEdges {
            edges: pairs(&[(1, 0), (1, 2)]),
        }],
        vec![TopologyEdit::RemoveAllEdges { node: id(5) }],
        vec![TopologyEdit::AddEdges {
            edges: pairs(&[(1, 0), (1, 2)]),
            weight: 1,
        }],
        vec![TopologyEdit::AddEdges {
            edges: pairs(&[(5, 3), (5, 4), (5, 6)]),
            weight: 1,
        }],
    ]
}

fn line_timeline() -> Vec<Vec<TopologyEdit>> {
    vec![
        vec![],
        vec![TopologyEdit::RemoveEdges {
            edges: pairs(&[(0, 2), (0, 3), (0, 4)]),
        }],
        vec![TopologyEdit::RemoveAllEdges { node: id(3) }],
        vec![TopologyEdit::AddEdges {
            edges: pairs(&[(0, 2), (0, 4)]),
            weight: 1,
        }],
        vec![TopologyEdit::AddAllEdges {
            node: id(3),
            weight: 1,
        }],
    ]
}

fn split_merge_timeline() -> Vec<Vec<TopologyEdit>> {
    vec![
        vec![],
        vec![TopologyEdit::RemoveEdges {
            edges: pairs(&[(0, 3), (1, 3), (2, 3), (5, 3), (6, 3)]),
        }],
        vec![],
        vec![TopologyEdit::AddEdges {
            edges: pairs(&[(2, 3)]),
            weight: 1,
        }],
        vec![],
    ]
}

fn rebalance_timeline() -> Vec<Vec<TopologyEdit>> {
    vec![
        vec![add(2, 6, 1), add(3, 11, 20)],
        vec![],
        vec![remove(2, 6)],
        vec![],
        vec![add(12, 2, 1), add(12, 6, 1)],
        vec![],
    ]
}

fn recalibrate_timeline() -> Vec<Vec<TopologyEdit>> {
    vec![
        vec![add(12, 2, 5), add(12, 6, 5), add(3, 11, 20)],
        vec![],
        vec![remove(3, 11), add(3, 11, 5)],
        vec![],
    ]
}
