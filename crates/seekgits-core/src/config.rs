//! The tracked-files manifest: component C3.
//!
//! The manifest is a committed artifact (`.seekgits/seekgits.json`)
//! mapping repository-relative paths to the set of recipients who can
//! unwrap that path's [`FileKey`]. Serialization is stable — sorted keys,
//! two-space indentation, trailing newline — so that unrelated changes
//! elsewhere in the manifest never churn an unchanged entry's bytes.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use base64::Engine as _;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, instrument, warn};

use crate::cipher::FileKey;
use crate::gpg::{GpgError, GpgProvider, Recipient, WrappedKey};
use crate::path::{self, PathError};

/// Schema version written by this build. `load` rejects any other value.
pub const SCHEMA_VERSION: u32 = 1;

/// Directory, relative to the repository root, holding the manifest.
pub const MANIFEST_DIR: &str = ".seekgits";

/// Manifest file name within [`MANIFEST_DIR`].
pub const MANIFEST_FILE: &str = "seekgits.json";

/// One tracked path's recipient-wrapped keys.
///
/// Invariant: `keys` is never empty — a file with no recipients is
/// removed from the manifest entirely (`spec.md` §3).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TrackedFile {
    /// Recipient identifier -> base64-encoded [`WrappedKey`] bytes.
    pub keys: BTreeMap<Recipient, String>,
}

/// The manifest document, as persisted at `.seekgits/seekgits.json`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Manifest {
    pub version: u32,
    pub files: BTreeMap<String, TrackedFile>,
}

impl Manifest {
    fn empty() -> Self {
        Self { version: SCHEMA_VERSION, files: BTreeMap::new() }
    }

    /// Stable serialization: sorted keys (via `BTreeMap`), two-space
    /// indentation, trailing newline.
    fn to_stable_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        let mut bytes = serde_json::to_vec_pretty(self)?;
        bytes.push(b'\n');
        Ok(bytes)
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("no seekgits manifest found — run `seekgits init` first")]
    NotInitialized,

    #[error("manifest is corrupt: {0}")]
    CorruptManifest(String),

    #[error("{0:?} is already tracked")]
    AlreadyTracked(String),

    #[error("{0:?} is not tracked")]
    NotTracked(String),

    #[error("{recipient:?} is already a recipient of {path:?}")]
    RecipientDuplicate { path: String, recipient: String },

    #[error("cannot access {path:?}: unable to unwrap any of {recipients:?}")]
    NoAccess { path: String, recipients: Vec<String> },

    #[error("invalid path: {0}")]
    InvalidPath(#[from] PathError),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Loads, saves, and mutates the tracked-files manifest for one repository.
pub struct ConfigStore {
    repo_root: PathBuf,
    gpg: GpgProvider,
}

impl ConfigStore {
    pub fn new(repo_root: impl Into<PathBuf>, gpg: GpgProvider) -> Self {
        Self { repo_root: repo_root.into(), gpg }
    }

    fn manifest_path(&self) -> PathBuf {
        self.repo_root.join(MANIFEST_DIR).join(MANIFEST_FILE)
    }

    /// Load the manifest from disk.
    #[instrument(level = "debug", skip(self))]
    pub fn load(&self) -> Result<Manifest, ConfigError> {
        let path = self.manifest_path();
        let bytes = match fs::read(&path) {
            Ok(b) => b,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Err(ConfigError::NotInitialized),
            Err(e) => return Err(ConfigError::Io(e)),
        };

        let manifest: Manifest = serde_json::from_slice(&bytes)
            .map_err(|e| ConfigError::CorruptManifest(e.to_string()))?;

        if manifest.version != SCHEMA_VERSION {
            return Err(ConfigError::CorruptManifest(format!(
                "unsupported schema version {}",
                manifest.version
            )));
        }

        Ok(manifest)
    }

    /// Returns `true` if a manifest file exists at all, without validating it.
    pub fn exists(&self) -> bool {
        self.manifest_path().is_file()
    }

    /// Write `manifest` atomically (write-temp, rename).
    #[instrument(level = "debug", skip(self, manifest))]
    pub fn save(&self, manifest: &Manifest) -> Result<(), ConfigError> {
        let path = self.manifest_path();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let bytes = manifest.to_stable_bytes()?;
        let tmp_path = path.with_extension("json.tmp");
        fs::write(&tmp_path, &bytes)?;
        fs::rename(&tmp_path, &path)?;
        debug!(bytes = bytes.len(), "wrote manifest");
        Ok(())
    }

    /// Create an empty manifest with the current schema version. A no-op
    /// if one already exists.
    pub fn init(&self) -> Result<(), ConfigError> {
        if self.exists() {
            return Ok(());
        }
        self.save(&Manifest::empty())
    }

    pub fn add_tracked_file(
        &self,
        rel_path: &str,
        recipient: &str,
        wrapped: &WrappedKey,
    ) -> Result<(), ConfigError> {
        let rel_path = path::normalize(rel_path)?;
        let mut manifest = self.load()?;

        if manifest.files.contains_key(&rel_path) {
            return Err(ConfigError::AlreadyTracked(rel_path));
        }

        let mut keys = BTreeMap::new();
        keys.insert(recipient.to_string(), encode_wrapped(wrapped));
        manifest.files.insert(rel_path, TrackedFile { keys });
        self.save(&manifest)
    }

    pub fn add_recipient(
        &self,
        rel_path: &str,
        recipient: &str,
        wrapped: &WrappedKey,
    ) -> Result<(), ConfigError> {
        let rel_path = path::normalize(rel_path)?;
        let mut manifest = self.load()?;

        let entry = manifest
            .files
            .get_mut(&rel_path)
            .ok_or_else(|| ConfigError::NotTracked(rel_path.clone()))?;

        if entry.keys.contains_key(recipient) {
            return Err(ConfigError::RecipientDuplicate {
                path: rel_path,
                recipient: recipient.to_string(),
            });
        }

        entry.keys.insert(recipient.to_string(), encode_wrapped(wrapped));
        self.save(&manifest)
    }

    pub fn remove_tracked_file(&self, rel_path: &str) -> Result<(), ConfigError> {
        let rel_path = path::normalize(rel_path)?;
        let mut manifest = self.load()?;

        if manifest.files.remove(&rel_path).is_none() {
            return Err(ConfigError::NotTracked(rel_path));
        }
        self.save(&manifest)
    }

    pub fn is_tracked(&self, rel_path: &str) -> Result<bool, ConfigError> {
        let rel_path = path::normalize(rel_path)?;
        match self.load() {
            Ok(manifest) => Ok(manifest.files.contains_key(&rel_path)),
            Err(ConfigError::NotInitialized) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Attempt to unwrap the [`FileKey`] for `rel_path`, trying every
    /// recipient's wrapped entry. Order of attempts is unspecified but
    /// deterministic (ascending recipient name, via `BTreeMap` iteration).
    #[instrument(level = "debug", skip(self))]
    pub fn get_file_key(&self, rel_path: &str) -> Result<FileKey, ConfigError> {
        let rel_path = path::normalize(rel_path)?;
        let manifest = self.load()?;
        let entry = manifest
            .files
            .get(&rel_path)
            .ok_or_else(|| ConfigError::NotTracked(rel_path.clone()))?;

        for (recipient, wrapped_b64) in &entry.keys {
            let wrapped = match decode_wrapped(wrapped_b64) {
                Ok(w) => w,
                Err(_) => continue,
            };
            match self.gpg.unwrap(&wrapped) {
                Ok(key) => return Ok(key),
                Err(e) => {
                    warn!(%recipient, error = %e, "could not unwrap file key for this recipient");
                }
            }
        }

        Err(ConfigError::NoAccess {
            path: rel_path,
            recipients: entry.keys.keys().cloned().collect(),
        })
    }

    /// The recipients of `rel_path`, sorted lexicographically.
    pub fn list_recipients(&self, rel_path: &str) -> Result<Vec<Recipient>, ConfigError> {
        let rel_path = path::normalize(rel_path)?;
        let manifest = self.load()?;
        let entry = manifest
            .files
            .get(&rel_path)
            .ok_or_else(|| ConfigError::NotTracked(rel_path))?;
        Ok(entry.keys.keys().cloned().collect())
    }

    pub fn tracked_paths(&self) -> Result<Vec<String>, ConfigError> {
        Ok(self.load()?.files.keys().cloned().collect())
    }
}

fn encode_wrapped(wrapped: &WrappedKey) -> String {
    base64::engine::general_purpose::STANDARD.encode(&wrapped.0)
}

fn decode_wrapped(encoded: &str) -> Result<WrappedKey, GpgError> {
    base64::engine::general_purpose::STANDARD
        .decode(encoded)
        .map(WrappedKey)
        .map_err(|e| GpgError::UnwrapFailed(format!("invalid base64 in manifest: {e}")))
}

/// Recommended location for a manifest relative to some repository root,
/// exposed for callers (e.g. the attribute manager) that need to decide
/// whether a path *is* the manifest itself.
pub fn manifest_relative_path() -> String {
    format!("{MANIFEST_DIR}/{MANIFEST_FILE}")
}
