//! Ground-truth shortest paths.
//!
//! Floyd-Warshall over a static adjacency matrix, used to check what the
//! agents converge to. Unreachable pairs hold [`UNREACHABLE`]; all sums
//! saturate so the sentinel never overflows.

use serde::Serialize;

use crate::topology::graph::{AdjacencyMatrix, Weight};

/// Distance reported for pairs with no connecting path
pub const UNREACHABLE: Weight = u64::MAX / 4;

/// All-pairs shortest path distances
pub fn floyd_warshall(matrix: &AdjacencyMatrix) -> Vec<Vec<Weight>> {
    let size = matrix.len();
    let mut dist = vec![vec![UNREACHABLE; size]; size];

    for u in 0..size {
        dist[u][u] = 0;
        for (v, weight) in matrix.neighbors(u) {
            dist[u][v] = weight;
        }
    }

    for k in 0..size {
        for i in 0..size {
            let via = dist[i][k];
            if via >= UNREACHABLE {
                continue;
            }
            for j in 0..size {
                let candidate = via.saturating_add(dist[k][j]).min(UNREACHABLE);
                if candidate < dist[i][j] {
                    dist[i][j] = candidate;
                }
            }
        }
    }

    dist
}

/// Center, radius and diameter of a graph
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GraphCenter {
    /// Indices whose eccentricity equals the radius
    pub center: Vec<usize>,
    pub radius: Weight,
    pub diameter: Weight,
    /// Longest shortest path from each index
    pub eccentricities: Vec<Weight>,
}

/// Compute the graph center from all-pairs distances.
///
/// On a disconnected matrix every eccentricity is [`UNREACHABLE`]; split
/// the matrix with [`crate::topology::components::sub_graphs`] first.
pub fn graph_center(matrix: &AdjacencyMatrix) -> GraphCenter {
    let dist = floyd_warshall(matrix);
    let eccentricities: Vec<Weight> = dist
        .iter()
        .map(|row| row.iter().copied().max().unwrap_or(0))
        .collect();

    let radius = eccentricities.iter().copied().min().unwrap_or(0);
    let diameter = eccentricities.iter().copied().max().unwrap_or(0);
    let center = eccentricities
        .iter()
        .enumerate()
        .filter(|(_, ecc)| **ecc == radius)
        .map(|(index, _)| index)
        .collect();

    GraphCenter {
        center,
        radius,
        diameter,
        eccentricities,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weighted_shortest_paths() {
        // 0 -5- 1 -3- 2 -1- 3, plus a long 0-3 edge
        let matrix = AdjacencyMatrix::from_rows(vec![
            vec![0, 5, 0, 10],
            vec![5, 0, 3, 0],
            vec![0, 3, 0, 1],
            vec![10, 0, 1, 0],
        ])
        .unwrap();
        let dist = floyd_warshall(&matrix);
        assert_eq!(dist[0], vec![0, 5, 8, 9]);
        assert_eq!(dist[3], vec![9, 4, 1, 0]);
    }

    #[test]
    fn test_star_center() {
        let matrix = AdjacencyMatrix::from_rows(vec![
            vec![0, 1, 1, 1, 1],
            vec![1, 0, 0, 0, 0],
            vec![1, 0, 0, 0, 0],
            vec![1, 0, 0, 0, 0],
            vec![1, 0, 0, 0, 0],
        ])
        .unwrap();
        let center = graph_center(&matrix);
        assert_eq!(center.center, vec![0]);
        assert_eq!(center.radius, 1);
        assert_eq!(center.diameter, 2);
    }

    #[test]
    fn test_radius_two_diameter_three() {
        let matrix = AdjacencyMatrix::from_rows(vec![
            vec![0, 0, 1, 0, 0, 0, 0],
            vec![0, 0, 1, 0, 0, 0, 0],
            vec![1, 1, 0, 1, 1, 1, 0],
            vec![0, 0, 1, 0, 0, 0, 0],
            vec![0, 0, 1, 0, 0, 0, 0],
            vec![0, 0, 1, 0, 0, 0, 1],
            vec![0, 0, 0, 0, 0, 1, 0],
        ])
        .unwrap();
        let center = graph_center(&matrix);
        assert_eq!(center.center, vec![2, 5]);
        assert_eq!(center.radius, 2);
        assert_eq!(center.diameter, 3);
    }

    #[test]
    fn test_disconnected_pairs_saturate() {
        let matrix = AdjacencyMatrix::empty(3);
        let dist = floyd_warshall(&matrix);
        assert_eq!(dist[0][2], UNREACHABLE);
        assert_eq!(dist[1][1], 0);
        assert_eq!(graph_center(&matrix).radius, UNREACHABLE);
    }

    #[test]
    fn test_single_node() {
        let center = graph_center(&AdjacencyMatrix::empty(1));
        assert_eq!(center.center, vec![0]);
        assert_eq!(center.radius, 0);
        assert_eq!(center.diameter, 0);
    }
}
