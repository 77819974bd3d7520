//! Constrained enumeration of connectivity matrices.

use crate::error::MatrixError;
use crate::grid::{BinaryMatrix, Cell, ConnectivityMatrix};
use itertools::Itertools;

/// Constraints for one enumeration run.
#[derive(Debug, Clone, Default)]
pub struct EnumerationParams {
    /// Number of nodes. Ignored when `seed` is set.
    pub nodes: usize,

    /// Number of free cells left at 0 in each output matrix
    pub free_connects: usize,

    /// 1-based nodes whose columns are forced to 1
    pub dominant_nodes: Vec<usize>,

    /// Force the diagonal to 1
    pub self_connect: bool,

    /// Pre-seeded matrix; `Cell::Free` marks undetermined cells
    pub seed: Option<ConnectivityMatrix>,
}

impl EnumerationParams {
    pub fn new(nodes: usize, free_connects: usize) -> Self {
        Self {
            nodes,
            free_connects,
            ..Default::default()
        }
    }

    /// Node count after taking the seed into account.
    pub fn node_count(&self) -> usize {
        self.seed.as_ref().map(|s| s.rows()).unwrap_or(self.nodes)
    }

    /// Build the base matrix with self-connections and dominant columns fixed.
    pub fn base_matrix(&self) -> Result<ConnectivityMatrix, MatrixError> {
        let mut base = match &self.seed {
            Some(seed) => {
                if seed.is_empty() || !seed.is_square() {
                    return Err(MatrixError::SeedNotSquare {
                        rows: seed.rows(),
                        cols: seed.cols(),
                    });
                }
                seed.clone()
            }
            None if self.nodes == 0 => return Err(MatrixError::MissingNodeCount),
            None => ConnectivityMatrix::all_free(self.nodes),
        };
        let n = base.rows();

        if let Some(&node) = self
            .dominant_nodes
            .iter()
            .find(|&&node| node == 0 || node > n)
        {
            return Err(MatrixError::DominantNodeOutOfRange { node, nodes: n });
        }

        if self.self_connect {
            for i in 0..n {
                base[(i, i)] = Cell::Fixed(1);
            }
        }

        for &node in &self.dominant_nodes {
            for row in 0..n {
                base[(row, node - 1)] = Cell::Fixed(1);
            }
        }

        Ok(base)
    }
}

/// Produce every binary matrix satisfying `params`.
///
/// Of the free cells left after fixing constraints, exactly
/// `total_free - free_connects` are set to 1. Matrices are returned in the
/// lexicographic order of the chosen free-cell index tuples. Asking for more
/// free connections than there are free cells yields an empty result.
pub fn enumerate(params: &EnumerationParams) -> Result<Vec<BinaryMatrix>, MatrixError> {
    let base = params.base_matrix()?;
    let free = base.free_positions();
    let total_free = free.len();

    if params.free_connects > total_free {
        tracing::info!(
            "No matrices satisfy the constraints: {} free connections requested, {} free cells",
            params.free_connects,
            total_free
        );
        return Ok(vec![]);
    }

    let ones = total_free - params.free_connects;
    let resolved = base.resolve_free_to_zero();

    // combinations(0) yields one empty choice: the fully resolved matrix
    let matrices: Vec<BinaryMatrix> = (0..total_free)
        .combinations(ones)
        .map(|chosen| {
            let mut matrix = resolved.clone();
            for i in chosen {
                matrix[free[i]] = 1;
            }
            matrix
        })
        .collect();

    tracing::info!(
        "Enumerated {} matrices ({} free cells, {} set to 1)",
        matrices.len(),
        total_free,
        ones
    );

    Ok(matrices)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::literal::ArrayLiteral;

    fn binomial(n: usize, k: usize) -> usize {
        (0..k).fold(1, |acc, i| acc * (n - i) / (i + 1))
    }

    #[test]
    fn test_two_nodes_one_free_connect() {
        let matrices = enumerate(&EnumerationParams::new(2, 1)).unwrap();
        assert_eq!(matrices.len(), 4);
        assert!(matrices.iter().all(|m| m.count_ones() == 3));
    }

    #[test]
    fn test_lexicographic_order() {
        let literals: Vec<String> = enumerate(&EnumerationParams::new(2, 1))
            .unwrap()
            .iter()
            .map(|m| m.to_literal())
            .collect();
        assert_eq!(
            literals,
            vec!["[1 1; 1 0]", "[1 1; 0 1]", "[1 0; 1 1]", "[0 1; 1 1]"]
        );
    }

    #[test]
    fn test_counts_match_binomial() {
        for n in 1..=3 {
            let cells = n * n;
            for k in 0..=cells {
                let matrices = enumerate(&EnumerationParams::new(n, k)).unwrap();
                assert_eq!(matrices.len(), binomial(cells, cells - k), "n={n} k={k}");
                assert!(matrices.iter().all(|m| m.count_ones() == cells - k));
            }
        }
    }

    #[test]
    fn test_self_connect_fixes_diagonal() {
        let params = EnumerationParams {
            self_connect: true,
            ..EnumerationParams::new(3, 2)
        };
        let matrices = enumerate(&params).unwrap();
        assert_eq!(matrices.len(), binomial(6, 4));
        for m in &matrices {
            for i in 0..3 {
                assert_eq!(m[(i, i)], 1);
            }
        }
    }

    #[test]
    fn test_dominant_node_fixes_column() {
        let params = EnumerationParams {
            dominant_nodes: vec![2],
            ..EnumerationParams::new(3, 1)
        };
        let matrices = enumerate(&params).unwrap();
        assert_eq!(matrices.len(), 6);
        for m in &matrices {
            for row in 0..3 {
                assert_eq!(m[(row, 1)], 1);
            }
        }
    }

    #[test]
    fn test_fully_determined_yields_single_matrix() {
        let params = EnumerationParams {
            dominant_nodes: vec![1, 2],
            ..EnumerationParams::new(2, 0)
        };
        let matrices = enumerate(&params).unwrap();
        assert_eq!(matrices.len(), 1);
        assert_eq!(matrices[0].to_literal(), "[1 1; 1 1]");
    }

    #[test]
    fn test_too_many_free_connects_is_empty() {
        let params = EnumerationParams {
            self_connect: true,
            ..EnumerationParams::new(2, 3)
        };
        assert!(enumerate(&params).unwrap().is_empty());
    }

    #[test]
    fn test_dominant_node_out_of_range() {
        for node in [0, 4] {
            let params = EnumerationParams {
                dominant_nodes: vec![node],
                ..EnumerationParams::new(3, 1)
            };
            assert!(matches!(
                enumerate(&params),
                Err(MatrixError::DominantNodeOutOfRange { nodes: 3, .. })
            ));
        }
    }

    #[test]
    fn test_zero_nodes_without_seed() {
        assert!(matches!(
            enumerate(&EnumerationParams::new(0, 0)),
            Err(MatrixError::MissingNodeCount)
        ));
    }

    #[test]
    fn test_seed_matrix() {
        let params = EnumerationParams {
            seed: Some("[* 0; * 1]".parse().unwrap()),
            nodes: 99,
            ..EnumerationParams::new(0, 1)
        };
        assert_eq!(params.node_count(), 2);
        let literals: Vec<String> = enumerate(&params)
            .unwrap()
            .iter()
            .map(|m| m.to_literal())
            .collect();
        assert_eq!(literals, vec!["[1 0; 0 1]", "[0 0; 1 1]"]);
    }

    #[test]
    fn test_dominant_overrides_seed() {
        let params = EnumerationParams {
            seed: Some("[0 0; 0 0]".parse().unwrap()),
            dominant_nodes: vec![1],
            ..EnumerationParams::default()
        };
        let matrices = enumerate(&params).unwrap();
        assert_eq!(matrices.len(), 1);
        assert_eq!(matrices[0].to_literal(), "[1 0; 1 0]");
    }

    #[test]
    fn test_non_square_seed() {
        let params = EnumerationParams {
            seed: Some("[* 0 1; * 1 0]".parse().unwrap()),
            ..EnumerationParams::default()
        };
        assert!(matches!(
            enumerate(&params),
            Err(MatrixError::SeedNotSquare { rows: 2, cols: 3 })
        ));
    }
}
