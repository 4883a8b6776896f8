//! Deterministic symmetric cipher for tracked file content (component C1).
//!
//! Plaintext is encrypted with AES-256 in counter mode. The counter's
//! initial block is not chosen at random — it is derived from an
//! HMAC-SHA256 of the whole plaintext, so that encrypting the same bytes
//! with the same key always produces the same ciphertext. This is the
//! property the rest of the system relies on: an unchanged file produces
//! a byte-identical object in the repository.

use aes::Aes256;
use ctr::Ctr128BE;
use ctr::cipher::{KeyIvInit, StreamCipher};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use thiserror::Error;
use tracing::{instrument, trace, warn};
use zeroize::Zeroizing;

/// Ten-byte marker prefixed to every [`EncryptedFrame`]: `\0SEEKGITS\0`.
pub const MAGIC: [u8; 10] = [0x00, 0x53, 0x45, 0x45, 0x4B, 0x47, 0x49, 0x54, 0x53, 0x00];

/// Length of the HMAC-SHA256 nonce stored in the frame.
pub const NONCE_LEN: usize = 32;

/// Length of the portion of the nonce used as the AES-CTR initial counter block.
const IV_LEN: usize = 16;

/// Total frame overhead before the ciphertext: magic + nonce.
pub const FRAME_OVERHEAD: usize = MAGIC.len() + NONCE_LEN;

/// 64 bytes of uniformly random key material bound to one tracked path.
///
/// Bytes `0..32` are the AES-256 key; bytes `32..64` are the HMAC-SHA256
/// key used for nonce derivation. The two halves are never derived from
/// one another — they are independent random values generated together.
pub struct FileKey(Zeroizing<[u8; 64]>);

impl FileKey {
    /// Generate a fresh, uniformly random 64-byte key.
    pub fn generate() -> Self {
        let mut bytes = [0u8; 64];
        rand::RngCore::fill_bytes(&mut rand::thread_rng(), &mut bytes);
        Self(Zeroizing::new(bytes))
    }

    /// Reconstruct a `FileKey` from exactly 64 bytes, e.g. after unwrapping.
    pub fn from_bytes(bytes: [u8; 64]) -> Self {
        Self(Zeroizing::new(bytes))
    }

    /// The raw 64 bytes, for handing to the recipient wrapper.
    pub fn as_bytes(&self) -> &[u8; 64] {
        &self.0
    }

    fn aes_key(&self) -> &[u8] {
        &self.0[0..32]
    }

    fn hmac_key(&self) -> &[u8] {
        &self.0[32..64]
    }
}

impl std::fmt::Debug for FileKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("FileKey").field(&"[REDACTED]").finish()
    }
}

/// Errors raised while decrypting a byte string that does not carry a
/// valid [`EncryptedFrame`].
///
/// There is no MAC over the ciphertext by design (see `spec.md` §4.1 and
/// the design notes in `DESIGN.md`): a wrong key silently produces
/// garbage plaintext rather than an error. The only thing this module
/// refuses to do is decrypt something that never claimed to be an
/// encrypted frame in the first place.
#[derive(Error, Debug)]
pub enum CipherError {
    /// The input's first ten bytes are not [`MAGIC`].
    #[error("input is not a seekgits-encrypted frame (missing magic marker)")]
    NotEncrypted,

    /// The input starts with [`MAGIC`] but is too short to contain a nonce.
    #[error("truncated frame: expected at least {FRAME_OVERHEAD} bytes, got {actual}")]
    TruncatedFrame { actual: usize },
}

/// Returns `true` if `data` carries the seekgits magic marker.
///
/// Per `spec.md` §4.1, this is prefix detection only — it does not
/// imply the frame is well-formed or even decryptable.
#[must_use]
pub fn is_encrypted(data: &[u8]) -> bool {
    data.len() >= MAGIC.len() && data[..MAGIC.len()] == MAGIC
}

/// Derive the 32-byte nonce for `plaintext` under `hmac_key`.
fn derive_nonce(hmac_key: &[u8], plaintext: &[u8]) -> [u8; NONCE_LEN] {
    let mut mac = Hmac::<Sha256>::new_from_slice(hmac_key).expect("HMAC accepts keys of any length");
    mac.update(plaintext);
    mac.finalize().into_bytes().into()
}

fn aes_ctr(aes_key: &[u8], iv: &[u8], data: &mut [u8]) {
    let mut cipher = Ctr128BE::<Aes256>::new(aes_key.into(), iv.into());
    cipher.apply_keystream(data);
}

/// Encrypt `plaintext` under `key`, producing `MAGIC || nonce || ciphertext`.
///
/// Deterministic: calling this twice with the same `key` and `plaintext`
/// yields byte-identical output (`spec.md` §8 invariant 2).
#[instrument(level = "debug", skip(key, plaintext), fields(plaintext_len = plaintext.len()))]
pub fn encrypt(plaintext: &[u8], key: &FileKey) -> Vec<u8> {
    let nonce = derive_nonce(key.hmac_key(), plaintext);
    trace!("derived nonce from plaintext");

    let mut ciphertext = plaintext.to_vec();
    aes_ctr(key.aes_key(), &nonce[..IV_LEN], &mut ciphertext);

    let mut frame = Vec::with_capacity(FRAME_OVERHEAD + plaintext.len());
    frame.extend_from_slice(&MAGIC);
    frame.extend_from_slice(&nonce);
    frame.extend_from_slice(&ciphertext);

    debug_assert_eq!(frame.len(), FRAME_OVERHEAD + plaintext.len());
    frame
}

/// Decrypt a frame produced by [`encrypt`].
///
/// Fails with [`CipherError::NotEncrypted`] if `frame` does not begin
/// with [`MAGIC`]. Does not verify integrity: a wrong `key` produces
/// incorrect plaintext rather than an error (`spec.md` §4.1, §7).
#[instrument(level = "debug", skip(key, frame), fields(frame_len = frame.len()))]
pub fn decrypt(frame: &[u8], key: &FileKey) -> Result<Vec<u8>, CipherError> {
    if !is_encrypted(frame) {
        warn!("attempted to decrypt a frame without the seekgits magic marker");
        return Err(CipherError::NotEncrypted);
    }
    if frame.len() < FRAME_OVERHEAD {
        return Err(CipherError::TruncatedFrame { actual: frame.len() });
    }

    let nonce = &frame[MAGIC.len()..FRAME_OVERHEAD];
    let mut plaintext = frame[FRAME_OVERHEAD..].to_vec();
    aes_ctr(key.aes_key(), &nonce[..IV_LEN], &mut plaintext);

    trace!(plaintext_len = plaintext.len(), "decrypted frame");
    Ok(plaintext)
}
