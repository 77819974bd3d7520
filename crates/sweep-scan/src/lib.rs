//! Failed-job detection for sweep.
//!
//! Scan an output tree for submission files whose jobs never ran or wrote to
//! stderr, and emit a script that resubmits them in dependency order.

pub mod record;
pub mod resubmit;
pub mod scanner;

pub use record::{JobRecord, JobStatus, Stage};
pub use resubmit::{
    DependencyChain, render_resubmit_script, shell_quote, submit_line, write_resubmit_script,
    write_script,
};
pub use scanner::{ScanError, ScanReport, scan_directory, scan_jobs};
