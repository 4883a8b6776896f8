//! Thin adapters over the host VCS: component C7.
//!
//! This module is deliberately minimal — `spec.md` §1 lists "shell-out
//! invocations of the host VCS" as an external collaborator specified
//! only by its interface. Each method here is a single blocking
//! `git` invocation with captured output; there is no process pool, no
//! retry, and no interactive terminal handling.

use std::path::{Path, PathBuf};
use std::process::Command;

use thiserror::Error;
use tracing::{instrument, warn};

#[derive(Error, Debug)]
pub enum VcsError {
    #[error("git is not available on PATH: {0}")]
    GitAbsent(#[source] std::io::Error),

    #[error("git {args:?} failed: {stderr}")]
    CommandFailed { args: Vec<String>, stderr: String },
}

/// A thin wrapper over `git` subprocess calls scoped to one repository.
pub struct Vcs {
    repo_root: PathBuf,
}

impl Vcs {
    pub fn new(repo_root: impl Into<PathBuf>) -> Self {
        Self { repo_root: repo_root.into() }
    }

    fn run(&self, args: &[&str]) -> Result<(), VcsError> {
        let output = Command::new("git")
            .current_dir(&self.repo_root)
            .args(args)
            .output()
            .map_err(VcsError::GitAbsent)?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            warn!(?args, %stderr, "git command failed");
            return Err(VcsError::CommandFailed {
                args: args.iter().map(|s| (*s).to_string()).collect(),
                stderr,
            });
        }
        Ok(())
    }

    /// Register the clean/smudge/textconv filter driver for `filter_name`,
    /// pointing at the absolute path of this binary, with
    /// `filter.<name>.required = true` so the host VCS fails loudly
    /// rather than silently committing plaintext (`spec.md` §4.6, §6).
    #[instrument(level = "info", skip(self))]
    pub fn register_filter(&self, filter_name: &str, binary_path: &Path) -> Result<(), VcsError> {
        let binary = binary_path.display().to_string();
        self.run(&["config", &format!("filter.{filter_name}.clean"), &format!("{binary} filter encrypt %f")])?;
        self.run(&["config", &format!("filter.{filter_name}.smudge"), &format!("{binary} filter decrypt %f")])?;
        self.run(&["config", &format!("filter.{filter_name}.required"), "true"])?;
        self.run(&["config", &format!("diff.{filter_name}.textconv"), &format!("{binary} filter decrypt %f")])?;
        self.run(&["config", &format!("diff.{filter_name}.binary"), "true"])?;
        Ok(())
    }

    /// Stage `path` and `.gitattributes` after `start-tracking`, using
    /// git's "renormalize" semantics so the freshly installed filter is
    /// applied and any cached pre-filter index entry is invalidated.
    #[instrument(level = "debug", skip(self))]
    pub fn stage_and_renormalize(&self, path: &str) -> Result<(), VcsError> {
        self.run(&["add", ".gitattributes"])?;
        self.run(&["add", "--renormalize", path])
    }

    /// Invalidate the host VCS's cached index entry for `path` after
    /// `stop-tracking`.
    #[instrument(level = "debug", skip(self))]
    pub fn invalidate_cache(&self, path: &str) -> Result<(), VcsError> {
        self.run(&["rm", "--cached", "--quiet", path])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::process::Command as StdCommand;
    use tempfile::TempDir;

    fn git_available() -> bool {
        StdCommand::new("git").arg("--version").output().map(|o| o.status.success()).unwrap_or(false)
    }

    #[test]
    fn register_filter_writes_expected_config() {
        if !git_available() {
            eprintln!("skipping: no git binary on PATH");
            return;
        }
        let dir = TempDir::new().unwrap();
        StdCommand::new("git").arg("init").arg("--quiet").current_dir(dir.path()).status().unwrap();

        let vcs = Vcs::new(dir.path());
        vcs.register_filter("seekgits", Path::new("/usr/local/bin/seekgits")).unwrap();

        let config = std::fs::read_to_string(dir.path().join(".git/config")).unwrap();
        assert!(config.contains("[filter \"seekgits\"]"));
        assert!(config.contains("required = true"));
        assert!(config.contains("[diff \"seekgits\"]"));
    }
}
