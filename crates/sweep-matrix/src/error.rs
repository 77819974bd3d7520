use camino::Utf8PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MatrixError {
    #[error("Node count must be at least 1 when no seed matrix is given")]
    MissingNodeCount,
    #[error("Dominant node {node} is outside 1..={nodes}")]
    DominantNodeOutOfRange { node: usize, nodes: usize },
    #[error("Seed matrix must be square and non-empty, got {rows}x{cols}")]
    SeedNotSquare { rows: usize, cols: usize },
    #[error("Row {row} has {found} values, expected {expected}")]
    Ragged {
        row: usize,
        found: usize,
        expected: usize,
    },
    #[error("Invalid matrix literal: {0}")]
    Parse(String),
    #[error("Failed to write {path}: {source}")]
    Write {
        path: Utf8PathBuf,
        source: std::io::Error,
    },
}
