//! The clean/smudge/textconv streaming filter: component C5.
//!
//! These functions are pure transforms over in-memory buffers — all
//! stdio and filesystem plumbing lives at the CLI boundary (`textconv`
//! and `smudge` only differ in *where* the caller read the input bytes
//! from, not in how they are transformed). Buffering the whole input is
//! required, not incidental: nonce derivation needs the complete
//! plaintext before the first ciphertext byte can be produced
//! (`spec.md` §9, "Buffered vs streaming").

use tracing::{instrument, warn};

use crate::cipher::{self, CipherError};
use crate::config::ConfigStore;

/// What a clean invocation actually did, for logging and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CleanOutcome {
    /// Manifest missing, path untracked, or input already encrypted.
    Passthrough,
    /// The file key could not be unwrapped; original bytes were kept.
    PassthroughNoAccess,
    /// Plaintext was encrypted into a fresh frame.
    Encrypted,
}

/// What a smudge/textconv invocation actually did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevealOutcome {
    /// Input was not a recognized frame; passed through unchanged.
    Passthrough,
    /// Frame was decrypted successfully.
    Decrypted,
    /// Frame was recognized but could not be decrypted; a placeholder
    /// line was emitted instead.
    Placeholder,
}

/// Encrypt on ingest. Implements the state machine in `spec.md` §4.5:
/// pass through unchanged unless the manifest exists, the path is
/// tracked, the input is not already a frame, and the file key unwraps.
#[instrument(level = "debug", skip(config, input), fields(path, input_len = input.len()))]
pub fn clean(config: &ConfigStore, path: &str, input: &[u8]) -> (Vec<u8>, CleanOutcome) {
    if !config.exists() {
        return (input.to_vec(), CleanOutcome::Passthrough);
    }

    match config.is_tracked(path) {
        Ok(false) => return (input.to_vec(), CleanOutcome::Passthrough),
        Err(_) => return (input.to_vec(), CleanOutcome::Passthrough),
        Ok(true) => {}
    }

    if cipher::is_encrypted(input) {
        return (input.to_vec(), CleanOutcome::Passthrough);
    }

    match config.get_file_key(path) {
        Ok(key) => {
            let frame = cipher::encrypt(input, &key);
            (frame, CleanOutcome::Encrypted)
        }
        Err(e) => {
            warn!(path, error = %e, "could not obtain file key on clean; writing plaintext unchanged");
            (input.to_vec(), CleanOutcome::PassthroughNoAccess)
        }
    }
}

/// Decrypt on egress (smudge) or for diff display (textconv) — identical
/// transform either way.
#[instrument(level = "debug", skip(config, input), fields(path, input_len = input.len()))]
pub fn reveal(config: &ConfigStore, path: &str, input: &[u8]) -> (Vec<u8>, RevealOutcome) {
    if !cipher::is_encrypted(input) {
        return (input.to_vec(), RevealOutcome::Passthrough);
    }

    let key = match config.get_file_key(path) {
        Ok(key) => key,
        Err(e) => {
            warn!(path, error = %e, "could not obtain file key on reveal; emitting placeholder");
            return (placeholder(path), RevealOutcome::Placeholder);
        }
    };

    match cipher::decrypt(input, &key) {
        Ok(plaintext) => (plaintext, RevealOutcome::Decrypted),
        Err(CipherError::NotEncrypted) => unreachable!("checked by is_encrypted above"),
        Err(e) => {
            warn!(path, error = %e, "frame could not be decrypted; emitting placeholder");
            (placeholder(path), RevealOutcome::Placeholder)
        }
    }
}

fn placeholder(path: &str) -> Vec<u8> {
    format!("[ENCRYPTED: cannot decrypt {path}]\n").into_bytes()
}
