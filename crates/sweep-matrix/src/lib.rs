//! Connectivity matrix enumeration for sweep.
//!
//! Builds every binary matrix satisfying a set of connectivity constraints
//! and writes them out as batched parameter files.

pub mod enumerate;
pub mod error;
pub mod grid;
pub mod literal;
pub mod params;

pub use enumerate::{EnumerationParams, enumerate};
pub use error::MatrixError;
pub use grid::{BinaryMatrix, Cell, ConnectivityMatrix, Grid};
pub use literal::{ArrayLiteral, parse_literal};
pub use params::{
    ParamWriter, RECORDS_PER_FILE, default_c_matrix, format_record, write_param_files,
};
