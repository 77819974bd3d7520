//! Per-parameter job script generation.
//!
//! For each record of a parameter file, a job directory is filled with one
//! estimation script per label and subject, the post-processing scripts, and
//! a run script that submits them with an after-any dependency. A run-all
//! script then launches every job whose directory holds no results yet.

use crate::config::SweepConfig;
use crate::template::{Outline, OutputWriter, Substitutions, TemplateError, TemplateSource};
use camino::{Utf8Path, Utf8PathBuf};
use sweep_scan::{DependencyChain, shell_quote, submit_line};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GenerateError {
    #[error("Failed to read parameter file {path}: {source}")]
    Read {
        path: Utf8PathBuf,
        source: std::io::Error,
    },
    #[error("Cannot derive a job name from {0:?}: expected up to 128 binary digits")]
    JobName(String),
    #[error("{0} has no parent directory")]
    NoParent(Utf8PathBuf),
    #[error("{0} has no file name")]
    NoFileName(Utf8PathBuf),
    #[error(transparent)]
    Template(#[from] TemplateError),
}

/// One `A&C&hidden` line of a parameter file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamRecord {
    pub matrix_a: String,
    pub matrix_c: String,
    pub matrix_hidden: String,
}

impl ParamRecord {
    /// Parse a line; anything other than exactly three fields is `None`.
    pub fn parse_line(line: &str) -> Option<Self> {
        let fields: Vec<&str> = line.trim_end_matches(['\r', '\n']).split('&').collect();
        match fields.as_slice() {
            [a, c, hidden] => Some(Self {
                matrix_a: a.to_string(),
                matrix_c: c.to_string(),
                matrix_hidden: hidden.to_string(),
            }),
            _ => None,
        }
    }
}

/// Read every well-formed record of a parameter file.
pub fn read_param_file(path: &Utf8Path) -> Result<Vec<ParamRecord>, GenerateError> {
    let content = std::fs::read_to_string(path).map_err(|source| GenerateError::Read {
        path: path.to_owned(),
        source,
    })?;

    let mut records = Vec::new();
    for (i, line) in content.lines().enumerate() {
        match ParamRecord::parse_line(line) {
            Some(record) => records.push(record),
            None => tracing::debug!("Skipping line {} of {}", i + 1, path),
        }
    }
    Ok(records)
}

/// Name a job after its A matrix and hidden nodes read as one binary number.
///
/// The number is zero-padded to the width of the largest value with the
/// same digit count, so names sort in numeric order.
pub fn job_name(prefix: &str, record: &ParamRecord) -> Result<String, GenerateError> {
    let digits: String = record
        .matrix_a
        .chars()
        .chain(record.matrix_hidden.chars())
        .filter(char::is_ascii_digit)
        .collect();

    let invalid = || GenerateError::JobName(format!("{}{}", record.matrix_a, record.matrix_hidden));
    if digits.is_empty() || digits.len() > 128 {
        return Err(invalid());
    }
    let value = u128::from_str_radix(&digits, 2).map_err(|_| invalid())?;
    let max = match digits.len() {
        128 => u128::MAX,
        len => (1u128 << len) - 1,
    };
    let width = max.to_string().len();

    Ok(format!("{}_{:0width$}", prefix, value, width = width))
}

/// Scripts written for one parameter record.
#[derive(Debug, Clone)]
pub struct GeneratedJob {
    pub job_name: String,
    pub directory: Utf8PathBuf,
    pub estimate_scripts: Vec<Utf8PathBuf>,
    pub post_scripts: Vec<Utf8PathBuf>,
    pub run_script: Utf8PathBuf,
}

/// Builds job scripts from a [`SweepConfig`].
pub struct ScriptGenerator<'a> {
    config: &'a SweepConfig,
    source: TemplateSource,
    writer: OutputWriter,
}

impl<'a> ScriptGenerator<'a> {
    pub fn new(config: &'a SweepConfig) -> Self {
        Self {
            config,
            source: config.template_source(),
            writer: OutputWriter::new(config.overwrite),
        }
    }

    /// Use outlines from `source` instead of the configured ones.
    pub fn with_source(mut self, source: TemplateSource) -> Self {
        self.source = source;
        self
    }

    /// Directory holding the parse and run-all scripts.
    fn scripts_dir(&self) -> Result<&Utf8Path, GenerateError> {
        self.config
            .path_parsed
            .parent()
            .ok_or_else(|| GenerateError::NoParent(self.config.path_parsed.clone()))
    }

    /// Write every script for one parameter record.
    pub fn generate_job(
        &self,
        record: &ParamRecord,
        prefix: &str,
    ) -> Result<GeneratedJob, GenerateError> {
        let job_name = job_name(prefix, record)?;
        let directory = self.config.directory_output.join(&job_name);

        let mut subs = self.config.substitutions();
        subs.insert("PREFIX_OUTPUT", prefix)
            .insert("JOB_NAME", &job_name)
            .insert("PATH_OUTPUT", &directory)
            .insert("MATRIX_A", &record.matrix_a)
            .insert("MATRIX_C", &record.matrix_c)
            .insert("MATRIX_HIDDEN", &record.matrix_hidden);

        if self.config.include_parse {
            self.write_parse_script(&subs)?;
        }

        let mut estimate_scripts = Vec::new();
        for label in &self.config.labels {
            for subject in 1..=self.config.subjects {
                let path = directory.join(format!("{}-{}-{}.sbatch", job_name, label, subject));
                let variable = format!("'{}', {}, {}", label, subject, subject);
                let commands = self.source.render(
                    Outline::CommandsEstimate,
                    &subs.with("VARIABLE", variable),
                )?;
                self.write_sbatch(&path, &subs, &commands)?;
                estimate_scripts.push(path);
            }
        }

        let mut post_scripts = Vec::new();
        let post_stages = [
            (self.config.include_favg, "favg", Outline::CommandsFavg),
            (self.config.include_ttest, "ttest", Outline::CommandsTtest),
        ];
        for (_, stage, outline) in post_stages.into_iter().filter(|(on, _, _)| *on) {
            let path = directory.join(format!("{}-{}.sbatch", job_name, stage));
            let commands = self.source.render(outline, &subs)?;
            self.write_sbatch(&path, &subs, &commands)?;
            post_scripts.push(path);
        }

        let run_name = format!("{}-run.sh", job_name);
        let run_script = directory.join(&run_name);
        let commands = run_commands(&run_name, &estimate_scripts, &post_scripts);
        let contents = self
            .source
            .render(Outline::Sh, &subs.with("COMMANDS", commands))?;
        self.writer.write(&run_script, &contents)?;

        tracing::info!(
            "Generated job {} ({} estimates, {} post-processing)",
            job_name,
            estimate_scripts.len(),
            post_scripts.len()
        );

        Ok(GeneratedJob {
            job_name,
            directory,
            estimate_scripts,
            post_scripts,
            run_script,
        })
    }

    /// Generate every record of `param_file`, then the run-all script.
    pub fn generate_all(
        &self,
        param_file: &Utf8Path,
        prefix: &str,
    ) -> Result<Vec<GeneratedJob>, GenerateError> {
        let records = read_param_file(param_file)?;
        let jobs = records
            .iter()
            .map(|record| self.generate_job(record, prefix))
            .collect::<Result<Vec<_>, _>>()?;

        let run_all = self.scripts_dir()?.join(format!("{}-run_all.sh", prefix));
        let subs = self
            .config
            .substitutions()
            .with("PREFIX_OUTPUT", prefix)
            .with("COMMANDS", run_all_commands(&jobs));
        let contents = self.source.render(Outline::Sh, &subs)?;
        self.writer.write(&run_all, &contents)?;

        tracing::info!("Generated {} jobs from {}", jobs.len(), param_file);
        Ok(jobs)
    }

    fn write_parse_script(&self, subs: &Substitutions) -> Result<(), GenerateError> {
        let raw_name = self
            .config
            .path_raw
            .file_name()
            .ok_or_else(|| GenerateError::NoFileName(self.config.path_raw.clone()))?;
        let path = self.scripts_dir()?.join(format!("{}-parse.sh", raw_name));

        let commands = self.source.render(Outline::CommandsParse, subs)?;
        let contents = self
            .source
            .render(Outline::Sh, &subs.with("COMMANDS", commands))?;
        self.writer.write(&path, &contents)?;
        Ok(())
    }

    fn write_sbatch(
        &self,
        path: &Utf8Path,
        subs: &Substitutions,
        commands: &str,
    ) -> Result<(), GenerateError> {
        let stem = path.file_stem().unwrap_or_default();
        let base = path.with_extension("");
        let subs = subs
            .with("SCRIPT_NAME", stem)
            .with("PATH_LOG", format!("{}.log", base))
            .with("PATH_ERR", format!("{}.err", base))
            .with("COMMANDS", commands);
        let contents = self.source.render(Outline::Sbatch, &subs)?;
        self.writer.write(path, &contents)?;
        Ok(())
    }
}

/// Submit every estimate, then every post-processing job after all estimates.
fn run_commands(run_name: &str, estimates: &[Utf8PathBuf], post: &[Utf8PathBuf]) -> String {
    let mut commands = String::new();
    let mut chain = DependencyChain::default();

    for (i, path) in estimates.iter().enumerate() {
        let var = format!("j{}", i + 1);
        commands.push_str(&submit_line(&var, None, path));
        chain.push(var);
    }

    commands.push_str(&format!("\necho {} jobs submitted\n", run_name));

    if !post.is_empty() {
        commands.push('\n');
        let dependency = chain.expression();
        for (i, path) in post.iter().enumerate() {
            let var = format!("j{}", estimates.len() + i + 1);
            commands.push_str(&submit_line(&var, dependency.as_deref(), path));
        }
    }

    commands
}

/// Run each job's script unless its directory already holds `.mat` results.
fn run_all_commands(jobs: &[GeneratedJob]) -> String {
    jobs.iter()
        .map(|job| {
            format!(
                "hasmatfile=$(find {} -type f \\( -name \"*.mat\" \\))\n\
                 if [ ${{#hasmatfile}} -eq 0 ]; then sh {}; fi\n\n",
                shell_quote(job.directory.as_str()),
                shell_quote(job.run_script.as_str())
            )
        })
        .collect()
}
