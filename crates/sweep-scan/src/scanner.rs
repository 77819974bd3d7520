//! Recursive scan for failed jobs.

use crate::record::{JobRecord, SUBMISSION_EXTENSION};
use camino::{Utf8Path, Utf8PathBuf};
use std::collections::BTreeMap;
use std::fs;
use std::io;
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Directory not found: {0}")]
    NotFound(Utf8PathBuf),
    #[error("Not a directory: {0}")]
    NotADirectory(Utf8PathBuf),
    #[error("Failed to walk {root}: {source}")]
    Walk {
        root: Utf8PathBuf,
        source: walkdir::Error,
    },
    #[error("Path is not valid UTF-8: {0}")]
    NonUtf8(String),
    #[error("Failed to read {path}: {source}")]
    Io {
        path: Utf8PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to write {path}: {source}")]
    Write {
        path: Utf8PathBuf,
        source: std::io::Error,
    },
}

/// Result of scanning an output tree.
#[derive(Debug, Clone, Default)]
pub struct ScanReport {
    /// Every submission file found, ordered by path
    pub jobs: Vec<JobRecord>,

    /// Submission files to resubmit, sorted and unique
    pub rerun: Vec<Utf8PathBuf>,
}

impl ScanReport {
    pub fn failed(&self) -> impl Iterator<Item = &JobRecord> {
        self.jobs.iter().filter(|job| job.is_failed())
    }
}

/// Sorted, duplicate-free list of submission files that need to be rerun.
pub fn scan_directory(root: &Utf8Path) -> Result<Vec<Utf8PathBuf>, ScanError> {
    Ok(scan_jobs(root)?.rerun)
}

/// Examine every directory under `root` and classify its submission files.
///
/// A submission is failed when its `.err` file is missing or non-empty.
/// When any submission in a directory fails, that directory's aggregate and
/// test submissions are rerun too, whatever their own status.
pub fn scan_jobs(root: &Utf8Path) -> Result<ScanReport, ScanError> {
    let metadata = match fs::metadata(root) {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(ScanError::NotFound(root.to_owned()));
        }
        Err(source) => {
            return Err(ScanError::Io {
                path: root.to_owned(),
                source,
            });
        }
    };
    if !metadata.is_dir() {
        return Err(ScanError::NotADirectory(root.to_owned()));
    }

    let mut by_directory: BTreeMap<Utf8PathBuf, Vec<JobRecord>> = BTreeMap::new();

    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry.map_err(|source| ScanError::Walk {
            root: root.to_owned(),
            source,
        })?;
        // Links are not followed by the walk, so resolve them here
        let is_file = entry.file_type().is_file()
            || (entry.path_is_symlink() && entry.path().is_file());
        if !is_file {
            continue;
        }

        let path = Utf8PathBuf::try_from(entry.into_path())
            .map_err(|e| ScanError::NonUtf8(e.into_path_buf().display().to_string()))?;
        if path.extension() != Some(SUBMISSION_EXTENSION) {
            continue;
        }

        let record = JobRecord::probe(path.clone())
            .map_err(|source| ScanError::Io { path, source })?;
        tracing::debug!("{}: {:?}", record.submission, record.status);

        let directory = record
            .submission
            .parent()
            .map(Utf8Path::to_path_buf)
            .unwrap_or_default();
        by_directory.entry(directory).or_default().push(record);
    }

    let mut rerun = Vec::new();
    for (directory, records) in &by_directory {
        let failed: Vec<&JobRecord> = records.iter().filter(|r| r.is_failed()).collect();
        if failed.is_empty() {
            continue;
        }

        tracing::info!("{} failed jobs in {}", failed.len(), directory);
        rerun.extend(failed.iter().map(|r| r.submission.clone()));
        rerun.extend(
            records
                .iter()
                .filter(|r| r.stage().is_post_processing())
                .map(|r| r.submission.clone()),
        );
    }

    rerun.sort_by(|a, b| a.as_str().cmp(b.as_str()));
    rerun.dedup();

    let mut jobs: Vec<JobRecord> = by_directory.into_values().flatten().collect();
    jobs.sort_by(|a, b| a.submission.as_str().cmp(b.submission.as_str()));

    Ok(ScanReport { jobs, rerun })
}
