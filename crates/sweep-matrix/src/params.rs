//! Batched parameter files.
//!
//! Each line of a parameter file is one `A&C&hidden` record, with all three
//! parts in array-literal form. Records are spread across numbered files of
//! at most [`RECORDS_PER_FILE`] lines.

use crate::enumerate::{EnumerationParams, enumerate};
use crate::error::MatrixError;
use crate::grid::BinaryMatrix;
use crate::literal::ArrayLiteral;
use camino::{Utf8Path, Utf8PathBuf};
use std::fs::{self, File};
use std::io::{BufWriter, Write};

/// Maximum number of records in a single parameter file.
pub const RECORDS_PER_FILE: usize = 60;

/// Default input matrix: a single row driving node 1 only.
pub fn default_c_matrix(nodes: usize) -> BinaryMatrix {
    let mut c = BinaryMatrix::filled(1, nodes, 0);
    if nodes > 0 {
        c[(0, 0)] = 1;
    }
    c
}

/// Format one parameter record, including the trailing newline.
pub fn format_record(a: &BinaryMatrix, c: &BinaryMatrix, hidden: &[usize]) -> String {
    format!("{}&{}&{}\n", a.to_literal(), c.to_literal(), hidden.to_literal())
}

/// Writes records into `<output_dir>/<name>-<i>.txt` batches.
#[derive(Debug, Clone)]
pub struct ParamWriter {
    output_dir: Utf8PathBuf,
    name: String,
    overwrite: bool,
}

impl ParamWriter {
    pub fn new(output_dir: impl Into<Utf8PathBuf>, name: impl Into<String>) -> Self {
        Self {
            output_dir: output_dir.into(),
            name: name.into(),
            overwrite: true,
        }
    }

    /// Leave existing batch files untouched when `false`.
    pub fn overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    /// Path of the 1-based batch `index`.
    pub fn batch_path(&self, index: usize) -> Utf8PathBuf {
        self.output_dir.join(format!("{}-{}.txt", self.name, index))
    }

    /// Write every matrix as a record and return the batch paths in order.
    ///
    /// No files are written for an empty slice.
    pub fn write(
        &self,
        matrices: &[BinaryMatrix],
        c_matrix: &BinaryMatrix,
        hidden_nodes: &[usize],
    ) -> Result<Vec<Utf8PathBuf>, MatrixError> {
        if matrices.is_empty() {
            return Ok(vec![]);
        }

        fs::create_dir_all(&self.output_dir).map_err(|source| MatrixError::Write {
            path: self.output_dir.clone(),
            source,
        })?;

        let mut paths = Vec::new();
        for (i, batch) in matrices.chunks(RECORDS_PER_FILE).enumerate() {
            let path = self.batch_path(i + 1);

            if !self.overwrite && path.exists() {
                tracing::warn!("Not overwriting existing parameter file {}", path);
            } else {
                write_batch(&path, batch, c_matrix, hidden_nodes)
                    .map_err(|source| MatrixError::Write {
                        path: path.clone(),
                        source,
                    })?;
                tracing::debug!("Wrote {} records to {}", batch.len(), path);
            }

            paths.push(path);
        }

        tracing::info!(
            "Wrote {} records across {} parameter files",
            matrices.len(),
            paths.len()
        );
        Ok(paths)
    }
}

fn write_batch(
    path: &Utf8Path,
    batch: &[BinaryMatrix],
    c_matrix: &BinaryMatrix,
    hidden_nodes: &[usize],
) -> std::io::Result<()> {
    let mut out = BufWriter::new(File::create(path)?);
    for matrix in batch {
        out.write_all(format_record(matrix, c_matrix, hidden_nodes).as_bytes())?;
    }
    out.flush()
}

/// Enumerate matrices for `params` and write them through `writer`.
///
/// The C matrix defaults to [`default_c_matrix`] for the enumerated node count.
pub fn write_param_files(
    params: &EnumerationParams,
    c_matrix: Option<&BinaryMatrix>,
    hidden_nodes: &[usize],
    writer: &ParamWriter,
) -> Result<Vec<Utf8PathBuf>, MatrixError> {
    let matrices = enumerate(params)?;
    let default_c;
    let c_matrix = match c_matrix {
        Some(c) => c,
        None => {
            default_c = default_c_matrix(params.node_count());
            &default_c
        }
    };
    writer.write(&matrices, c_matrix, hidden_nodes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn utf8(temp: &TempDir) -> &Utf8Path {
        Utf8Path::from_path(temp.path()).unwrap()
    }

    #[test]
    fn test_format_record() {
        let a: BinaryMatrix = "[1 0; 1 1]".parse().unwrap();
        let record = format_record(&a, &default_c_matrix(2), &[]);
        assert_eq!(record, "[1 0; 1 1]&[1 0]&[]\n");
    }

    #[test]
    fn test_batches_of_sixty() {
        let temp = TempDir::new().unwrap();
        let writer = ParamWriter::new(utf8(&temp), "sweep_params");

        // 3 nodes, 9 free cells, 3 left at 0: C(9, 6) = 84 matrices
        let params = EnumerationParams::new(3, 3);
        let paths = write_param_files(&params, None, &[], &writer).unwrap();

        assert_eq!(paths.len(), 2);
        assert_eq!(paths[0].file_name(), Some("sweep_params-1.txt"));
        assert_eq!(paths[1].file_name(), Some("sweep_params-2.txt"));

        let first = fs::read_to_string(&paths[0]).unwrap();
        let second = fs::read_to_string(&paths[1]).unwrap();
        assert_eq!(first.lines().count(), 60);
        assert_eq!(second.lines().count(), 24);
        assert!(first.lines().all(|l| l.split('&').count() == 3));
        assert!(first.starts_with("[1 1 1; 1 1 1; 0 0 0]&[1 0 0]&[]\n"));
    }

    #[test]
    fn test_empty_enumeration_writes_nothing() {
        let temp = TempDir::new().unwrap();
        let writer = ParamWriter::new(utf8(&temp), "none");
        let params = EnumerationParams::new(1, 5);
        let paths = write_param_files(&params, None, &[], &writer).unwrap();
        assert!(paths.is_empty());
        assert!(!writer.batch_path(1).exists());
    }

    #[test]
    fn test_rerun_is_byte_identical() {
        let temp = TempDir::new().unwrap();
        let writer = ParamWriter::new(utf8(&temp).join("out"), "p");
        let params = EnumerationParams {
            self_connect: true,
            dominant_nodes: vec![1],
            ..EnumerationParams::new(4, 2)
        };
        let hidden = [3usize];

        let first_paths = write_param_files(&params, None, &hidden, &writer).unwrap();
        let first: Vec<Vec<u8>> = first_paths.iter().map(|p| fs::read(p).unwrap()).collect();

        let second_paths = write_param_files(&params, None, &hidden, &writer).unwrap();
        let second: Vec<Vec<u8>> = second_paths.iter().map(|p| fs::read(p).unwrap()).collect();

        assert_eq!(first_paths, second_paths);
        assert_eq!(first, second);
    }

    #[test]
    fn test_no_overwrite_keeps_existing() {
        let temp = TempDir::new().unwrap();
        let writer = ParamWriter::new(utf8(&temp), "keep").overwrite(false);
        fs::write(writer.batch_path(1), "existing\n").unwrap();

        let paths = write_param_files(&EnumerationParams::new(2, 1), None, &[], &writer).unwrap();
        assert_eq!(paths, vec![writer.batch_path(1)]);
        assert_eq!(fs::read_to_string(&paths[0]).unwrap(), "existing\n");
    }
}
