//! `$KEY$` outline templating.

use camino::{Utf8Path, Utf8PathBuf};
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TemplateError {
    #[error("Failed to read outline {path}: {source}")]
    Read {
        path: Utf8PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to write {path}: {source}")]
    Write {
        path: Utf8PathBuf,
        source: std::io::Error,
    },
}

/// Placeholder values keyed by upper-case name.
#[derive(Debug, Clone, Default)]
pub struct Substitutions(BTreeMap<String, String>);

impl Substitutions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `key` (case-insensitive) to `value`, replacing any previous value.
    pub fn insert(&mut self, key: &str, value: impl ToString) -> &mut Self {
        self.0.insert(key.to_uppercase(), value.to_string());
        self
    }

    /// Copy with `key` set, leaving `self` untouched.
    pub fn with(&self, key: &str, value: impl ToString) -> Self {
        let mut copy = self.clone();
        copy.insert(key, value);
        copy
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(&key.to_uppercase()).map(String::as_str)
    }
}

fn is_key(s: &str) -> bool {
    !s.is_empty()
        && s.chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_')
}

/// Replace every `$KEY$` in `outline` that has a value in `subs`.
///
/// Substituted values are not rescanned. Placeholders without a value are
/// left as-is.
pub fn render(outline: &str, subs: &Substitutions) -> String {
    let mut out = String::with_capacity(outline.len());
    let mut rest = outline;

    while let Some(start) = rest.find('$') {
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];

        let key = after
            .find('$')
            .map(|end| &after[..end])
            .filter(|key| is_key(key));

        match key.map(|key| (key, subs.get(key))) {
            Some((key, Some(value))) => {
                out.push_str(value);
                rest = &after[key.len() + 1..];
            }
            Some((key, None)) => {
                tracing::debug!("No value for placeholder ${}$", key);
                out.push('$');
                rest = after;
            }
            None => {
                out.push('$');
                rest = after;
            }
        }
    }

    out.push_str(rest);
    out
}

/// The outline files used to build job scripts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outline {
    Sh,
    Sbatch,
    CommandsParse,
    CommandsEstimate,
    CommandsFavg,
    CommandsTtest,
}

impl Outline {
    pub fn file_name(self) -> &'static str {
        match self {
            Outline::Sh => "outline_sh.txt",
            Outline::Sbatch => "outline_sbatch.txt",
            Outline::CommandsParse => "commands_parse.txt",
            Outline::CommandsEstimate => "commands_estimate.txt",
            Outline::CommandsFavg => "commands_favg.txt",
            Outline::CommandsTtest => "commands_ttest.txt",
        }
    }

    fn builtin(self) -> &'static str {
        match self {
            Outline::Sh => include_str!("../templates/outline_sh.txt"),
            Outline::Sbatch => include_str!("../templates/outline_sbatch.txt"),
            Outline::CommandsParse => include_str!("../templates/commands_parse.txt"),
            Outline::CommandsEstimate => include_str!("../templates/commands_estimate.txt"),
            Outline::CommandsFavg => include_str!("../templates/commands_favg.txt"),
            Outline::CommandsTtest => include_str!("../templates/commands_ttest.txt"),
        }
    }
}

/// Where outlines are loaded from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TemplateSource {
    /// Outlines compiled into the binary
    #[default]
    Builtin,
    /// A directory holding the outline files by name
    Directory(Utf8PathBuf),
}

impl TemplateSource {
    pub fn load(&self, outline: Outline) -> Result<Cow<'static, str>, TemplateError> {
        match self {
            TemplateSource::Builtin => Ok(Cow::Borrowed(outline.builtin())),
            TemplateSource::Directory(dir) => {
                let path = dir.join(outline.file_name());
                fs::read_to_string(&path)
                    .map(Cow::Owned)
                    .map_err(|source| TemplateError::Read { path, source })
            }
        }
    }

    /// Load `outline` and render it with `subs`.
    pub fn render(&self, outline: Outline, subs: &Substitutions) -> Result<String, TemplateError> {
        Ok(render(&self.load(outline)?, subs))
    }
}

/// Writes rendered scripts, creating parent directories as needed.
#[derive(Debug, Clone, Copy)]
pub struct OutputWriter {
    pub overwrite: bool,
}

impl OutputWriter {
    pub fn new(overwrite: bool) -> Self {
        Self { overwrite }
    }

    /// Write `contents` to `path`. Returns `false` if the file was kept.
    pub fn write(&self, path: &Utf8Path, contents: &str) -> Result<bool, TemplateError> {
        if !self.overwrite && path.exists() {
            tracing::debug!("Keeping existing {}", path);
            return Ok(false);
        }

        let write = || -> std::io::Result<()> {
            if let Some(parent) = path.parent().filter(|p| !p.as_str().is_empty()) {
                fs::create_dir_all(parent)?;
            }
            let mut out = BufWriter::new(File::create(path)?);
            out.write_all(contents.as_bytes())?;
            out.flush()
        };
        write().map_err(|source| TemplateError::Write {
            path: path.to_owned(),
            source,
        })?;

        tracing::debug!("Wrote {}", path);
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_render_replaces_known_keys() {
        let mut subs = Substitutions::new();
        subs.insert("time", "00:10:00").insert("partition", "normal");
        let out = render("#SBATCH --time=$TIME$\n#SBATCH -p $PARTITION$\n", &subs);
        assert_eq!(out, "#SBATCH --time=00:10:00\n#SBATCH -p normal\n");
    }

    #[test]
    fn test_render_leaves_shell_and_unknown_keys() {
        let subs = Substitutions::new().with("name", "x");
        let outline = "echo $HOME and ${#files} cost $5 $NAME$ $MISSING$";
        assert_eq!(
            render(outline, &subs),
            "echo $HOME and ${#files} cost $5 x $MISSING$"
        );
    }

    #[test]
    fn test_render_does_not_rescan_values() {
        let mut subs = Substitutions::new();
        subs.insert("COMMANDS", "run $JOB_NAME$").insert("JOB_NAME", "j");
        assert_eq!(render("$COMMANDS$ $JOB_NAME$", &subs), "run $JOB_NAME$ j");
    }

    #[test]
    fn test_builtin_outlines_have_commands() {
        let source = TemplateSource::Builtin;
        let sbatch = source.load(Outline::Sbatch).unwrap();
        assert!(sbatch.starts_with("#!/bin/bash"));
        assert!(sbatch.contains("$COMMANDS$"));
        assert!(sbatch.contains("$PATH_ERR$"));
    }

    #[test]
    fn test_directory_source() {
        let temp = TempDir::new().unwrap();
        let dir = Utf8Path::from_path(temp.path()).unwrap();
        fs::write(dir.join("outline_sh.txt"), "custom $COMMANDS$").unwrap();

        let source = TemplateSource::Directory(dir.to_owned());
        let subs = Substitutions::new().with("commands", "ls");
        assert_eq!(source.render(Outline::Sh, &subs).unwrap(), "custom ls");
        assert!(matches!(
            source.load(Outline::Sbatch),
            Err(TemplateError::Read { .. })
        ));
    }

    #[test]
    fn test_output_writer_respects_overwrite() {
        let temp = TempDir::new().unwrap();
        let path = Utf8Path::from_path(temp.path()).unwrap().join("a/b/run.sh");

        assert!(OutputWriter::new(false).write(&path, "first").unwrap());
        assert!(!OutputWriter::new(false).write(&path, "second").unwrap());
        assert_eq!(fs::read_to_string(&path).unwrap(), "first");

        assert!(OutputWriter::new(true).write(&path, "third").unwrap());
        assert_eq!(fs::read_to_string(&path).unwrap(), "third");
    }
}
