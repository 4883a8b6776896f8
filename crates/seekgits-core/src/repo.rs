//! Repository root discovery.
//!
//! Per `spec.md` §9's "ambient path state" design note, the repository
//! root is resolved exactly once at process start by walking up from the
//! current directory, rather than threaded implicitly through every
//! component. [`ConfigStore`](crate::config::ConfigStore) and
//! [`AttributeManager`](crate::attributes::AttributeManager) both take
//! it as an explicit constructor argument.

use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RepoError {
    #[error("not inside a git repository (no .git found above {0:?})")]
    NotARepository(PathBuf),
}

/// Walk up from `start` looking for a `.git` entry (directory or, for a
/// worktree, file) and return the directory that contains it.
pub fn find_repo_root(start: &Path) -> Result<PathBuf, RepoError> {
    let mut dir = start.to_path_buf();
    loop {
        if dir.join(".git").exists() {
            return Ok(dir);
        }
        if !dir.pop() {
            return Err(RepoError::NotARepository(start.to_path_buf()));
        }
    }
}
