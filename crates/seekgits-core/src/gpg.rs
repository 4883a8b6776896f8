//! Recipient wrapper backed by an external GPG subprocess (component C2).
//!
//! This module never parses or stores key material beyond the opaque
//! `FileKey`/`WrappedKey` byte strings it streams through `gpg`. Trust is
//! configured as `always` so wrapping to a recipient does not block on an
//! interactive trust prompt — this tool is meant to run non-interactively
//! from a git filter.

use std::io::Write;
use std::process::{Command, Stdio};

use thiserror::Error;
use tracing::{debug, instrument, warn};

use crate::cipher::FileKey;

/// A string identifier the GPG keyring can resolve: an email address, a
/// short key id, or a fingerprint.
pub type Recipient = String;

/// An opaque byte string produced by GPG when encrypting a [`FileKey`] to
/// a recipient. Only unwrappable by whoever holds the matching private key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrappedKey(pub Vec<u8>);

#[derive(Error, Debug)]
pub enum GpgError {
    /// No `gpg` binary could be found or executed.
    #[error("gpg is not available on PATH: {0}")]
    ProviderAbsent(#[source] std::io::Error),

    /// `gpg --encrypt` failed because the recipient has no usable public key.
    #[error("gpg does not know a usable public key for recipient {0:?}")]
    RecipientUnknown(Recipient),

    /// `gpg --decrypt` failed because no matching private key is present.
    #[error("no private key available to unwrap this file key")]
    NoPrivateKey,

    /// `gpg --decrypt` failed for a reason other than a missing private key.
    #[error("gpg failed to unwrap the file key: {0}")]
    UnwrapFailed(String),

    /// No private identity is available in the host keyring at all.
    #[error("no default gpg identity is available")]
    NoIdentity,

    /// The wrapped key, once unwrapped, was not exactly 64 bytes.
    #[error("unwrapped key has invalid length: expected 64 bytes, got {0}")]
    InvalidKeyLength(usize),
}

/// Path to (or bare name of) the `gpg` binary to invoke.
#[derive(Debug, Clone)]
pub struct GpgProvider {
    binary: String,
    trust_model: String,
}

impl Default for GpgProvider {
    fn default() -> Self {
        Self { binary: "gpg".to_string(), trust_model: "always".to_string() }
    }
}

impl GpgProvider {
    /// Use a specific `gpg` binary instead of resolving `gpg` from `PATH`.
    pub fn with_binary(binary: impl Into<String>) -> Self {
        Self { binary: binary.into(), ..Self::default() }
    }

    /// Override the `--trust-model` passed to `gpg --encrypt`. Defaults to
    /// `always`, since this tool runs non-interactively and cannot answer
    /// a trust prompt.
    pub fn with_trust_model(self, trust_model: impl Into<String>) -> Self {
        Self { trust_model: trust_model.into(), ..self }
    }

    fn run(&self, args: &[&str], stdin_data: &[u8]) -> Result<std::process::Output, GpgError> {
        let mut child = Command::new(&self.binary)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(GpgError::ProviderAbsent)?;

        child
            .stdin
            .take()
            .expect("stdin was piped")
            .write_all(stdin_data)
            .map_err(GpgError::ProviderAbsent)?;

        child.wait_with_output().map_err(GpgError::ProviderAbsent)
    }

    /// Wrap `key` to `recipient`, producing an opaque [`WrappedKey`].
    #[instrument(level = "debug", skip(self, key), fields(recipient = %recipient))]
    pub fn wrap(&self, key: &FileKey, recipient: &str) -> Result<WrappedKey, GpgError> {
        let output = self.run(
            &[
                "--batch",
                "--yes",
                "--trust-model",
                &self.trust_model,
                "--encrypt",
                "-r",
                recipient,
                "--output",
                "-",
            ],
            key.as_bytes(),
        )?;

        if !output.status.success() {
            warn!(stderr = %String::from_utf8_lossy(&output.stderr), "gpg encrypt failed");
            return Err(GpgError::RecipientUnknown(recipient.to_string()));
        }

        debug!(wrapped_len = output.stdout.len(), "wrapped file key");
        Ok(WrappedKey(output.stdout))
    }

    /// Unwrap `wrapped`, producing the raw 64-byte [`FileKey`].
    #[instrument(level = "debug", skip(self, wrapped))]
    pub fn unwrap(&self, wrapped: &WrappedKey) -> Result<FileKey, GpgError> {
        let output = self.run(
            &["--batch", "--yes", "--decrypt", "--output", "-"],
            &wrapped.0,
        )?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            warn!(%stderr, "gpg decrypt failed");
            if stderr.contains("No secret key") || stderr.contains("decryption failed: No secret key") {
                return Err(GpgError::NoPrivateKey);
            }
            return Err(GpgError::UnwrapFailed(stderr.trim().to_string()));
        }

        let bytes: [u8; 64] = output
            .stdout
            .try_into()
            .map_err(|v: Vec<u8>| GpgError::InvalidKeyLength(v.len()))?;

        Ok(FileKey::from_bytes(bytes))
    }

    /// Report the first private identity available in the host keyring, if any.
    #[instrument(level = "debug", skip(self))]
    pub fn default_recipient(&self) -> Result<Option<Recipient>, GpgError> {
        let output = Command::new(&self.binary)
            .args(["--batch", "--with-colons", "--list-secret-keys"])
            .output()
            .map_err(GpgError::ProviderAbsent)?;

        if !output.status.success() {
            return Ok(None);
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        Ok(parse_first_fingerprint(&stdout))
    }

    /// Best-effort existence check against the public portion of the keyring.
    #[instrument(level = "debug", skip(self))]
    pub fn recipient_exists(&self, recipient: &str) -> bool {
        Command::new(&self.binary)
            .args(["--batch", "--with-colons", "--list-keys", recipient])
            .output()
            .map(|out| out.status.success())
            .unwrap_or(false)
    }

    /// Probe for a runnable `gpg` binary. Used by `init` (`spec.md` §4.6:
    /// "require the external asymmetric provider to be present") so the
    /// operator sees [`GpgError::ProviderAbsent`] up front rather than
    /// deep inside a filter subprocess at commit time.
    #[instrument(level = "debug", skip(self))]
    pub fn require_available(&self) -> Result<(), GpgError> {
        Command::new(&self.binary)
            .arg("--version")
            .output()
            .map_err(GpgError::ProviderAbsent)?;
        Ok(())
    }
}

/// Parse the first `fpr:` record following a `sec:` record in
/// `gpg --with-colons --list-secret-keys` output.
fn parse_first_fingerprint(colons_output: &str) -> Option<Recipient> {
    let mut lines = colons_output.lines().peekable();
    while let Some(line) = lines.next() {
        if line.starts_with("sec:") {
            for next in lines.by_ref() {
                if let Some(fpr) = next.strip_prefix("fpr:") {
                    let fields: Vec<&str> = fpr.split(':').collect();
                    if let Some(fingerprint) = fields.get(8) {
                        if !fingerprint.is_empty() {
                            return Some((*fingerprint).to_string());
                        }
                    }
                }
                if next.starts_with("sec:") || next.starts_with("pub:") {
                    break;
                }
            }
        }
    }
    None
}
