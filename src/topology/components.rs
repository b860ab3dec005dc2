//! Connected components and induced sub-graphs.
//!
//! Used to check leader election per component after the network splits.

use crate::topology::graph::AdjacencyMatrix;

/// Connected components as sorted index lists, ordered by smallest member
pub fn connected_components(matrix: &AdjacencyMatrix) -> Vec<Vec<usize>> {
    let size = matrix.len();
    let mut visited = vec![false; size];
    let mut components = Vec::new();

    for start in 0..size {
        if visited[start] {
            continue;
        }
        visited[start] = true;
        let mut members = vec![start];
        let mut stack = vec![start];
        while let Some(u) = stack.pop() {
            for (v, _) in matrix.neighbors(u) {
                if !visited[v] {
                    visited[v] = true;
                    members.push(v);
                    stack.push(v);
                }
            }
        }
        members.sort_unstable();
        components.push(members);
    }

    components
}

/// One connected component cut out of a larger matrix
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubGraph {
    /// `index_map[local]` is the index in the original matrix
    pub index_map: Vec<usize>,
    pub matrix: AdjacencyMatrix,
}

/// Split a matrix into the induced sub-matrix of every component
pub fn sub_graphs(matrix: &AdjacencyMatrix) -> Vec<SubGraph> {
    connected_components(matrix)
        .into_iter()
        .map(|index_map| {
            let mut sub = AdjacencyMatrix::empty(index_map.len());
            for (local_u, &u) in index_map.iter().enumerate() {
                for (local_v, &v) in index_map.iter().enumerate().skip(local_u + 1) {
                    let weight = matrix.weight(u, v);
                    if weight > 0 {
                        sub.set(local_u, local_v, weight);
                    }
                }
            }
            SubGraph {
                index_map,
                matrix: sub,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_islands() -> AdjacencyMatrix {
        // {0, 2} joined by weight 3, {1, 3, 4} as a path
        AdjacencyMatrix::from_rows(vec![
            vec![0, 0, 3, 0, 0],
            vec![0, 0, 0, 1, 0],
            vec![3, 0, 0, 0, 0],
            vec![0, 1, 0, 0, 2],
            vec![0, 0, 0, 2, 0],
        ])
        .unwrap()
    }

    #[test]
    fn test_connected_components() {
        let components = connected_components(&two_islands());
        assert_eq!(components, vec![vec![0, 2], vec![1, 3, 4]]);
    }

    #[test]
    fn test_sub_graphs_remap_indices() {
        let subs = sub_graphs(&two_islands());
        assert_eq!(subs.len(), 2);

        assert_eq!(subs[0].index_map, vec![0, 2]);
        assert_eq!(subs[0].matrix.weight(0, 1), 3);

        assert_eq!(subs[1].index_map, vec![1, 3, 4]);
        assert_eq!(subs[1].matrix.weight(0, 1), 1);
        assert_eq!(subs[1].matrix.weight(1, 2), 2);
        assert_eq!(subs[1].matrix.weight(0, 2), 0);
    }

    #[test]
    fn test_isolated_nodes_are_components() {
        let components = connected_components(&AdjacencyMatrix::empty(3));
        assert_eq!(components, vec![vec![0], vec![1], vec![2]]);
    }
}
