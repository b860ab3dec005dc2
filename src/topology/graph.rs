//! Weighted adjacency matrix.
//!
//! This file holds the physical network shared by every agent in a run.
//! Weights are propagation delays; a weight of 0 means "no edge". The
//! matrix is kept square, symmetric and free of self-loops at all times.

use serde::{Deserialize, Serialize};

/// Edge weight, also used as a transit delay
pub type Weight = u64;

/// Structural problems found while building a matrix from raw rows
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MatrixError {
    #[error("Adjacency matrix must contain at least one node")]
    Empty,
    #[error("Adjacency matrix row {row} has {len} entries, expected {expected}")]
    NotSquare { row: usize, len: usize, expected: usize },
    #[error("Adjacency matrix is not symmetric at ({row}, {col}): {forward} != {backward}")]
    Asymmetric {
        row: usize,
        col: usize,
        forward: Weight,
        backward: Weight,
    },
    #[error("Adjacency matrix has a self-loop at node {0}")]
    SelfLoop(usize),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Vec<Weight>>", into = "Vec<Vec<Weight>>")]
pub struct AdjacencyMatrix {
    rows: Vec<Vec<Weight>>,
}

impl AdjacencyMatrix {
    /// Matrix of `size` isolated nodes
    pub fn empty(size: usize) -> Self {
        AdjacencyMatrix {
            rows: vec![vec![0; size]; size],
        }
    }

    /// Build a matrix from raw rows, checking shape and symmetry
    pub fn from_rows(rows: Vec<Vec<Weight>>) -> Result<Self, MatrixError> {
        if rows.is_empty() {
            return Err(MatrixError::Empty);
        }

        let expected = rows.len();
        for (row, values) in rows.iter().enumerate() {
            if values.len() != expected {
                return Err(MatrixError::NotSquare {
                    row,
                    len: values.len(),
                    expected,
                });
            }
        }

        for row in 0..expected {
            if rows[row][row] != 0 {
                return Err(MatrixError::SelfLoop(row));
            }
            for col in (row + 1)..expected {
                let forward = rows[row][col];
                let backward = rows[col][row];
                if forward != backward {
                    return Err(MatrixError::Asymmetric {
                        row,
                        col,
                        forward,
                        backward,
                    });
                }
            }
        }

        Ok(AdjacencyMatrix { rows })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Weight of the edge between two indices, 0 when absent or out of range
    pub fn weight(&self, u: usize, v: usize) -> Weight {
        self.rows
            .get(u)
            .and_then(|row| row.get(v))
            .copied()
            .unwrap_or(0)
    }

    pub fn has_edge(&self, u: usize, v: usize) -> bool {
        self.weight(u, v) > 0
    }

    /// Set both directions of an edge. Callers check the indices.
    pub fn set(&mut self, u: usize, v: usize, weight: Weight) {
        self.rows[u][v] = weight;
        self.rows[v][u] = weight;
    }

    /// Indices adjacent to `u` with their weights, in index order
    pub fn neighbors(&self, u: usize) -> impl Iterator<Item = (usize, Weight)> + '_ {
        self.rows
            .get(u)
            .into_iter()
            .flat_map(|row| row.iter().copied().enumerate())
            .filter(|(_, weight)| *weight > 0)
    }

    /// Grow the matrix by one isolated node placed at `at_index`
    pub fn insert_index(&mut self, at_index: usize) {
        for row in self.rows.iter_mut() {
            row.insert(at_index, 0);
        }
        let size = self.rows.len() + 1;
        self.rows.insert(at_index, vec![0; size]);
    }

    /// Drop the row and column at `index`
    pub fn remove_index(&mut self, index: usize) {
        self.rows.remove(index);
        for row in self.rows.iter_mut() {
            row.remove(index);
        }
    }

    pub fn rows(&self) -> &[Vec<Weight>] {
        &self.rows
    }

    /// Number of undirected edges
    pub fn edge_count(&self) -> usize {
        let mut count = 0;
        for u in 0..self.len() {
            count += self.rows[u][(u + 1)..].iter().filter(|w| **w > 0).count();
        }
        count
    }
}

impl TryFrom<Vec<Vec<Weight>>> for AdjacencyMatrix {
    type Error = MatrixError;

    fn try_from(rows: Vec<Vec<Weight>>) -> Result<Self, Self::Error> {
        AdjacencyMatrix::from_rows(rows)
    }
}

impl From<AdjacencyMatrix> for Vec<Vec<Weight>> {
    fn from(matrix: AdjacencyMatrix) -> Self {
        matrix.rows
    }
}
