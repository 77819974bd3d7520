//! Job records and their derived status.

use camino::{Utf8Path, Utf8PathBuf};
use std::io;

/// Extension of submission files.
pub const SUBMISSION_EXTENSION: &str = "sbatch";
/// Extension of the stderr file written next to each submission.
pub const ERROR_EXTENSION: &str = "err";
/// Extension of the stdout file written next to each submission.
pub const LOG_EXTENSION: &str = "log";

/// File name suffix of the aggregate (average F) stage.
pub const AGGREGATE_SUFFIX: &str = "-favg.sbatch";
/// File name suffix of the statistical-test stage.
pub const TEST_SUFFIX: &str = "-ttest.sbatch";

/// Pipeline stage of a submission file, derived from its name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Estimate,
    Aggregate,
    Test,
}

impl Stage {
    pub fn of(path: &Utf8Path) -> Self {
        match path.file_name() {
            Some(name) if name.ends_with(AGGREGATE_SUFFIX) => Stage::Aggregate,
            Some(name) if name.ends_with(TEST_SUFFIX) => Stage::Test,
            _ => Stage::Estimate,
        }
    }

    /// Aggregate and test stages consume every estimate in their directory.
    pub fn is_post_processing(self) -> bool {
        matches!(self, Stage::Aggregate | Stage::Test)
    }
}

/// Outcome of a job as seen from its companion files.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStatus {
    /// No error file: the job never completed
    NeverRan,
    /// Error file has content
    Errored { bytes: u64 },
    /// Error file exists and is empty
    Succeeded,
}

impl JobStatus {
    pub fn is_failed(self) -> bool {
        !matches!(self, JobStatus::Succeeded)
    }
}

/// A submission file and its companions.
#[derive(Debug, Clone)]
pub struct JobRecord {
    /// The `.sbatch` file
    pub submission: Utf8PathBuf,

    /// Companion `.err` file, if present
    pub error_file: Option<Utf8PathBuf>,

    /// Companion `.log` file, if present
    pub log_file: Option<Utf8PathBuf>,

    /// Status derived from the error file
    pub status: JobStatus,
}

impl JobRecord {
    /// Inspect the companions of `submission` on disk.
    pub fn probe(submission: Utf8PathBuf) -> io::Result<Self> {
        let error_path = submission.with_extension(ERROR_EXTENSION);
        let log_path = submission.with_extension(LOG_EXTENSION);

        let (error_file, status) = match error_path.metadata() {
            Ok(meta) if meta.len() == 0 => (Some(error_path), JobStatus::Succeeded),
            Ok(meta) => (
                Some(error_path),
                JobStatus::Errored { bytes: meta.len() },
            ),
            Err(e) if e.kind() == io::ErrorKind::NotFound => (None, JobStatus::NeverRan),
            Err(e) => return Err(e),
        };

        let log_file = log_path.is_file().then_some(log_path);

        Ok(Self {
            submission,
            error_file,
            log_file,
            status,
        })
    }

    pub fn stage(&self) -> Stage {
        Stage::of(&self.submission)
    }

    pub fn is_failed(&self) -> bool {
        self.status.is_failed()
    }
}
