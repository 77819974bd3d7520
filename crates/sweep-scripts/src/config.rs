//! Sweep configuration.
//!
//! Every recognized key is a field here; unknown keys fail to load.

use crate::template::{Substitutions, TemplateSource};
use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: Utf8PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid config {path}: {source}")]
    Json {
        path: Utf8PathBuf,
        source: serde_json::Error,
    },
    #[error("Invalid config: {0}")]
    Invalid(String),
}

fn default_true() -> bool {
    true
}

fn default_em_steps_max() -> u32 {
    128
}

fn default_nodes() -> u32 {
    1
}

/// Settings shared by every job of a sweep.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SweepConfig {
    /// Root of the per-job output directories
    pub directory_output: Utf8PathBuf,

    /// Prefix for job names and the run-all script
    pub prefix_output: String,

    /// Directory holding the MATLAB entry points
    pub path_dcmslurm: Utf8PathBuf,

    /// SPM installation
    pub path_spm: Utf8PathBuf,

    /// Raw data directory; its basename names the parse script
    pub path_raw: Utf8PathBuf,

    /// Raw data file
    pub path_raw_file: Utf8PathBuf,

    /// Parsed data; its parent directory holds the parse and run-all scripts
    pub path_parsed: Utf8PathBuf,

    #[serde(default)]
    pub save_in_path_parsed: bool,

    /// Experimental condition labels
    pub labels: Vec<String>,

    /// Subjects per label
    pub subjects: u32,

    #[serde(default = "default_em_steps_max")]
    pub em_steps_max: u32,

    /// SLURM time limit, e.g. `00:10:00`
    pub time: String,

    pub email: String,

    pub partition: String,

    #[serde(default = "default_nodes")]
    pub nodes: u32,

    /// Memory per job in MB
    pub memory: u32,

    #[serde(default = "default_true")]
    pub overwrite: bool,

    #[serde(default = "default_true")]
    pub include_parse: bool,

    #[serde(default = "default_true")]
    pub include_favg: bool,

    #[serde(default = "default_true")]
    pub include_ttest: bool,

    /// Outline directory; the builtin outlines are used when absent
    #[serde(default)]
    pub templates: Option<Utf8PathBuf>,
}

impl SweepConfig {
    /// Load and validate a JSON config file.
    pub fn from_path(path: &Utf8Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_owned(),
            source,
        })?;
        let config: Self = serde_json::from_str(&content).map_err(|source| ConfigError::Json {
            path: path.to_owned(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.prefix_output.is_empty() {
            return Err(ConfigError::Invalid("prefix_output must not be empty".into()));
        }
        if self.labels.is_empty() {
            return Err(ConfigError::Invalid("labels must not be empty".into()));
        }
        if let Some(label) = self
            .labels
            .iter()
            .find(|l| l.is_empty() || l.contains('\''))
        {
            return Err(ConfigError::Invalid(format!(
                "label {:?} must be non-empty and must not contain quotes",
                label
            )));
        }
        if self.subjects == 0 {
            return Err(ConfigError::Invalid("subjects must be at least 1".into()));
        }
        Ok(())
    }

    pub fn template_source(&self) -> TemplateSource {
        match &self.templates {
            Some(dir) => TemplateSource::Directory(dir.clone()),
            None => TemplateSource::Builtin,
        }
    }

    /// Labels as a cell-array literal: `{'cond 1', 'cond 2'}`.
    pub fn labels_literal(&self) -> String {
        let quoted: Vec<String> = self.labels.iter().map(|l| format!("'{}'", l)).collect();
        format!("{{{}}}", quoted.join(", "))
    }

    /// Placeholder values shared by every outline of the sweep.
    pub fn substitutions(&self) -> Substitutions {
        let mut subs = Substitutions::new();
        subs.insert("DIRECTORY_OUTPUT", &self.directory_output)
            .insert("PREFIX_OUTPUT", &self.prefix_output)
            .insert("PATH_DCMSLURM", &self.path_dcmslurm)
            .insert("PATH_SPM", &self.path_spm)
            .insert("PATH_RAW", &self.path_raw)
            .insert("PATH_RAW_FILE", &self.path_raw_file)
            .insert("PATH_PARSED", &self.path_parsed)
            .insert("SAVE_IN_PATH_PARSED", self.save_in_path_parsed)
            .insert("LABELS", self.labels_literal())
            .insert("SUBJECTS", self.subjects)
            .insert("EM_STEPS_MAX", self.em_steps_max)
            .insert("TIME", &self.time)
            .insert("EMAIL", &self.email)
            .insert("PARTITION", &self.partition)
            .insert("NODES", self.nodes)
            .insert("MEMORY", self.memory);
        subs
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use tempfile::TempDir;

    pub(crate) const SAMPLE: &str = r#"{
        "directory_output": "/scratch/dcm/out",
        "prefix_output": "brain",
        "path_dcmslurm": "/home/usr/dcmslurm",
        "path_spm": "/home/usr/spm12",
        "path_raw": "/scratch/dcm/raw",
        "path_raw_file": "/scratch/dcm/raw/brain.mat",
        "path_parsed": "/scratch/dcm/brain_parsed",
        "labels": ["cond1", "cond2"],
        "subjects": 2,
        "time": "00:10:00",
        "email": "user@example.org",
        "partition": "normal",
        "memory": 700
    }"#;

    pub(crate) fn sample() -> SweepConfig {
        serde_json::from_str(SAMPLE).unwrap()
    }

    #[test]
    fn test_defaults() {
        let config = sample();
        assert!(config.overwrite);
        assert!(config.include_parse && config.include_favg && config.include_ttest);
        assert_eq!(config.nodes, 1);
        assert_eq!(config.em_steps_max, 128);
        assert_eq!(config.template_source(), TemplateSource::Builtin);
    }

    #[test]
    fn test_rejects_unknown_keys() {
        let json = SAMPLE.replacen('{', r#"{ "walltime": "01:00:00","#, 1);
        let err = serde_json::from_str::<SweepConfig>(&json).unwrap_err();
        assert!(err.to_string().contains("walltime"));
    }

    #[test]
    fn test_validate() {
        let mut config = sample();
        assert!(config.validate().is_ok());

        config.subjects = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let mut config = sample();
        config.labels = vec!["it's".into()];
        assert!(config.validate().is_err());

        let mut config = sample();
        config.labels.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_substitutions() {
        let mut config = sample();
        config.labels = vec!["cond 1".into(), "cond 2".into()];
        let subs = config.substitutions();
        assert_eq!(subs.get("labels"), Some("{'cond 1', 'cond 2'}"));
        assert_eq!(subs.get("MEMORY"), Some("700"));
        assert_eq!(subs.get("SAVE_IN_PATH_PARSED"), Some("false"));
        assert_eq!(subs.get("PATH_SPM"), Some("/home/usr/spm12"));
    }

    #[test]
    fn test_from_path() {
        let temp = TempDir::new().unwrap();
        let path = Utf8Path::from_path(temp.path()).unwrap().join("sweep.json");
        std::fs::write(&path, SAMPLE).unwrap();
        assert_eq!(SweepConfig::from_path(&path).unwrap().prefix_output, "brain");

        std::fs::write(&path, SAMPLE.replace("\"subjects\": 2", "\"subjects\": 0")).unwrap();
        assert!(matches!(
            SweepConfig::from_path(&path),
            Err(ConfigError::Invalid(_))
        ));
    }
}
