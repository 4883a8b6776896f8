//! High-level lifecycle operations: component C6.
//!
//! Each function here composes the manifest (`config`), the recipient
//! wrapper (`gpg`), the `.gitattributes` directive manager
//! (`attributes`), and the host VCS adapter (`vcs`) into one of the
//! user-facing verbs from `spec.md` §6: `init`, start/stop tracking, and
//! adding a recipient. None of this module touches ciphertext directly —
//! that only happens inside the clean/smudge filter (`filter.rs`).

use std::path::Path;

use thiserror::Error;
use tracing::{info, instrument};

use crate::attributes::{AttributeError, AttributeManager};
use crate::cipher::FileKey;
use crate::config::{ConfigError, ConfigStore};
use crate::gpg::{GpgError, GpgProvider, Recipient};
use crate::vcs::{Vcs, VcsError};

#[derive(Error, Debug)]
pub enum LifecycleError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Attribute(#[from] AttributeError),

    #[error(transparent)]
    Gpg(#[from] GpgError),

    #[error(transparent)]
    Vcs(#[from] VcsError),

    #[error("{0:?} does not exist in the working directory")]
    FileMissing(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// The recipient-and-access summary returned by [`status`].
#[derive(Debug, Clone)]
pub struct FileStatus {
    pub path: String,
    pub recipients: Vec<Recipient>,
    pub working_copy_present: bool,
    pub current_identity_has_access: bool,
}

/// Bundles the collaborators every lifecycle operation needs, scoped to
/// one repository.
pub struct Lifecycle {
    repo_root: std::path::PathBuf,
    config: ConfigStore,
    attributes: AttributeManager,
    gpg: GpgProvider,
    vcs: Vcs,
}

impl Lifecycle {
    pub fn new(repo_root: impl Into<std::path::PathBuf>, gpg: GpgProvider) -> Self {
        let repo_root = repo_root.into();
        Self {
            config: ConfigStore::new(&repo_root, gpg.clone()),
            attributes: AttributeManager::new(&repo_root),
            vcs: Vcs::new(&repo_root),
            gpg,
            repo_root,
        }
    }

    /// Require the external asymmetric provider to be present, create the
    /// manifest if absent, and register the filter driver with the host
    /// VCS, pointing it back at `binary_path`.
    ///
    /// The gpg presence check (`spec.md` §4.6) runs before anything is
    /// registered: if it were skipped, a missing `gpg` would surface much
    /// later, deep inside a filter subprocess at commit time, instead of
    /// up front where the operator can act on it.
    #[instrument(level = "info", skip(self))]
    pub fn init(&self, binary_path: &Path) -> Result<(), LifecycleError> {
        self.gpg.require_available()?;
        self.config.init()?;
        self.vcs.register_filter("seekgits", binary_path)?;
        info!(repo = %self.repo_root.display(), "initialized seekgits");
        Ok(())
    }

    /// Start tracking `rel_path`: generate a fresh file key, wrap it to
    /// `recipient` (or the default identity if none is given), record it
    /// in the manifest, mark the path in `.gitattributes`, and stage both
    /// with the host VCS so the filter takes effect immediately.
    #[instrument(level = "info", skip(self))]
    pub fn start_tracking(
        &self,
        rel_path: &str,
        recipient: Option<&str>,
    ) -> Result<(), LifecycleError> {
        let recipient = self.resolve_recipient(recipient)?;

        if !self.repo_root.join(rel_path).is_file() {
            return Err(LifecycleError::FileMissing(rel_path.to_string()));
        }

        let key = FileKey::generate();
        let wrapped = self.gpg.wrap(&key, &recipient)?;

        self.config.add_tracked_file(rel_path, &recipient, &wrapped)?;
        self.attributes.add_filter(rel_path)?;
        self.vcs.stage_and_renormalize(rel_path)?;

        info!(path = rel_path, recipient = %recipient, "started tracking");
        Ok(())
    }

    /// Grant an additional recipient access to an already-tracked path by
    /// wrapping the existing file key a second time.
    #[instrument(level = "info", skip(self))]
    pub fn share(&self, rel_path: &str, recipient: &str) -> Result<(), LifecycleError> {
        let key = self.config.get_file_key(rel_path)?;
        let wrapped = self.gpg.wrap(&key, recipient)?;
        self.config.add_recipient(rel_path, recipient, &wrapped)?;
        info!(path = rel_path, recipient, "shared access");
        Ok(())
    }

    /// Stop tracking `rel_path`: remove it from the manifest and from
    /// `.gitattributes`, invalidate the host VCS's cached index entry, and
    /// delete the working-directory file so a stale plaintext copy cannot
    /// be accidentally re-committed unencrypted (`spec.md` §4.6).
    #[instrument(level = "info", skip(self))]
    pub fn stop_tracking(&self, rel_path: &str) -> Result<(), LifecycleError> {
        self.config.remove_tracked_file(rel_path)?;
        self.attributes.remove_filter(rel_path)?;
        self.vcs.invalidate_cache(rel_path)?;

        let working_copy = self.repo_root.join(rel_path);
        if let Err(e) = std::fs::remove_file(&working_copy) {
            if e.kind() != std::io::ErrorKind::NotFound {
                return Err(LifecycleError::Io(e));
            }
        }

        info!(path = rel_path, "stopped tracking");
        Ok(())
    }

    /// Report the recipient set and working-copy state for `rel_path`,
    /// without mutating anything.
    #[instrument(level = "debug", skip(self))]
    pub fn status(&self, rel_path: &str) -> Result<FileStatus, LifecycleError> {
        let recipients = self.config.list_recipients(rel_path)?;
        let working_copy_present = self.repo_root.join(rel_path).is_file();
        let current_identity_has_access = self.config.get_file_key(rel_path).is_ok();

        Ok(FileStatus {
            path: rel_path.to_string(),
            recipients,
            working_copy_present,
            current_identity_has_access,
        })
    }

    /// Every path currently tracked, in manifest order (lexicographic).
    pub fn list_tracked(&self) -> Result<Vec<String>, LifecycleError> {
        Ok(self.config.tracked_paths()?)
    }

    fn resolve_recipient(&self, recipient: Option<&str>) -> Result<Recipient, LifecycleError> {
        match recipient {
            Some(r) => Ok(r.to_string()),
            None => self
                .gpg
                .default_recipient()?
                .ok_or(GpgError::NoIdentity)
                .map_err(LifecycleError::from),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn repo() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join(".git")).unwrap();
        dir
    }

    #[test]
    fn start_tracking_requires_existing_working_copy() {
        let dir = repo();
        let lifecycle = Lifecycle::new(dir.path(), GpgProvider::default());
        lifecycle.config.init().unwrap();

        let err = lifecycle
            .start_tracking("missing.env", Some("alice@example.com"))
            .unwrap_err();
        assert!(matches!(err, LifecycleError::FileMissing(_)));
    }

    #[test]
    fn resolve_recipient_prefers_explicit_argument() {
        let dir = repo();
        let lifecycle = Lifecycle::new(dir.path(), GpgProvider::default());
        let recipient = lifecycle.resolve_recipient(Some("bob@example.com")).unwrap();
        assert_eq!(recipient, "bob@example.com");
    }

    #[test]
    fn status_on_untracked_path_is_an_error() {
        let dir = repo();
        let lifecycle = Lifecycle::new(dir.path(), GpgProvider::default());
        lifecycle.config.init().unwrap();
        assert!(matches!(lifecycle.status("nope.env"), Err(LifecycleError::Config(ConfigError::NotTracked(_)))));
    }

    fn git_available() -> bool {
        std::process::Command::new("git")
            .arg("--version")
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false)
    }

    #[test]
    fn stop_tracking_deletes_working_copy() {
        if !git_available() {
            eprintln!("skipping: no git binary on PATH");
            return;
        }
        let dir = TempDir::new().unwrap();
        std::process::Command::new("git")
            .args(["init", "--quiet"])
            .current_dir(dir.path())
            .status()
            .unwrap();

        let lifecycle = Lifecycle::new(dir.path(), GpgProvider::default());
        lifecycle.config.init().unwrap();
        let wrapped = crate::gpg::WrappedKey(b"ciphertext".to_vec());
        lifecycle
            .config
            .add_tracked_file("secret.env", "alice@example.com", &wrapped)
            .unwrap();
        lifecycle.attributes.add_filter("secret.env").unwrap();
        fs::write(dir.path().join("secret.env"), b"plaintext").unwrap();

        lifecycle.stop_tracking("secret.env").unwrap();

        assert!(!dir.path().join("secret.env").exists());
        assert!(!lifecycle.attributes.has_filter("secret.env").unwrap());
    }
}
