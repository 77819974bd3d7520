//! Resubmission scripts with after-any dependency chains.

use crate::record::Stage;
use crate::scanner::{ScanError, scan_directory};
use camino::{Utf8Path, Utf8PathBuf};
use std::fs::File;
use std::io::{BufWriter, Write};

/// Interpreter line and blank line that open every generated script.
pub const SHEBANG: &str = "#!/bin/bash\n\n";

const AFTER_ANY: &str = "--dependency=afterany";

/// Jobs that must reach a terminal state before a dependent job starts.
///
/// Each entry is the shell variable holding a captured `sbatch` output line.
/// `${var:20}` strips the `Submitted batch job ` prefix to leave the job id.
#[derive(Debug, Clone, Default)]
pub struct DependencyChain {
    jobs: Vec<String>,
}

impl DependencyChain {
    pub fn push(&mut self, var: impl Into<String>) {
        self.jobs.push(var.into());
    }

    pub fn reset(&mut self) {
        self.jobs.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    /// `--dependency=afterany:${j1:20}:${j2:20}`, or `None` for an empty chain.
    pub fn expression(&self) -> Option<String> {
        if self.jobs.is_empty() {
            return None;
        }
        let mut expr = String::from(AFTER_ANY);
        for var in &self.jobs {
            expr.push_str(&format!(":${{{}:20}}", var));
        }
        Some(expr)
    }
}

/// Quote `s` for the shell when it contains anything beyond plain path characters.
pub fn shell_quote(s: &str) -> String {
    let plain = !s.is_empty()
        && s.chars()
            .all(|c| c.is_ascii_alphanumeric() || "/._-+:=,@%".contains(c));
    if plain {
        s.to_string()
    } else {
        format!("'{}'", s.replace('\'', r"'\''"))
    }
}

/// `var=$(sbatch [dependency] path)` with a trailing newline.
pub fn submit_line(var: &str, dependency: Option<&str>, path: &Utf8Path) -> String {
    match dependency {
        Some(dep) => format!("{}=$(sbatch {} {})\n", var, dep, shell_quote(path.as_str())),
        None => format!("{}=$(sbatch {})\n", var, shell_quote(path.as_str())),
    }
}

/// Render a script resubmitting `paths` in order.
///
/// Estimate jobs accumulate in the chain. The first aggregate job switches
/// to post-processing, where each job waits on the chain. A test job in
/// post-processing closes the group, so later jobs start a fresh chain.
/// Aggregate jobs never close a group.
pub fn render_resubmit_script<P: AsRef<Utf8Path>>(paths: &[P]) -> String {
    let mut script = String::from(SHEBANG);
    let mut chain = DependencyChain::default();
    let mut post_processing = false;

    for (i, path) in paths.iter().enumerate() {
        let path = path.as_ref();
        let var = format!("j{}", i + 1);
        let stage = Stage::of(path);

        if stage == Stage::Aggregate {
            post_processing = true;
        }

        if !post_processing {
            script.push_str(&submit_line(&var, None, path));
            chain.push(var);
            continue;
        }

        script.push_str(&submit_line(&var, chain.expression().as_deref(), path));
        if stage == Stage::Test {
            post_processing = false;
            chain.reset();
        }
    }

    script
}

/// Write a resubmission script for `paths` to `output`.
pub fn write_script<P: AsRef<Utf8Path>>(paths: &[P], output: &Utf8Path) -> Result<(), ScanError> {
    let script = render_resubmit_script(paths);

    let write = || -> std::io::Result<()> {
        let mut out = BufWriter::new(File::create(output)?);
        out.write_all(script.as_bytes())?;
        out.flush()
    };
    write().map_err(|source| ScanError::Write {
        path: output.to_owned(),
        source,
    })?;

    tracing::info!("Wrote {} resubmissions to {}", paths.len(), output);
    Ok(())
}

/// Scan `root` and write a resubmission script for its failed jobs to `output`.
///
/// Returns the paths written into the script.
pub fn write_resubmit_script(
    root: &Utf8Path,
    output: &Utf8Path,
) -> Result<Vec<Utf8PathBuf>, ScanError> {
    let rerun = scan_directory(root)?;
    write_script(&rerun, output)?;
    Ok(rerun)
}
