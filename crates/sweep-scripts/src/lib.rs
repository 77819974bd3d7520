//! Script generation for sweep.
//!
//! Fills `$KEY$` outlines with values from a [`SweepConfig`] and a parameter
//! record, producing the sbatch and shell scripts for each job.

pub mod config;
pub mod generate;
pub mod template;

pub use config::{ConfigError, SweepConfig};
pub use generate::{
    GenerateError, GeneratedJob, ParamRecord, ScriptGenerator, job_name, read_param_file,
};
pub use template::{Outline, OutputWriter, Substitutions, TemplateError, TemplateSource, render};
