//! Deterministic secretbox encryption/decryption
//!
//! Ciphertext format (binary):
//! ```text
//! [20 bytes: SIV][16 bytes: Poly1305 tag][N bytes: XChaCha20 body]
//! nonce = SIV[..16] || message_id (8 bytes, little-endian)
//! AAD   = context (8 bytes) || message_id (8 bytes, LE) || SIV (20 bytes)
//! ```
//!
//! The SIV is a keyed BLAKE3 hash of the message id, context and plaintext, so
//! encryption needs no randomness and the same inputs always give the same
//! ciphertext. Reusing a message id with a different plaintext still yields a
//! fresh nonce; only an exact repeat is detectable as such.

use zeroize::Zeroizing;

use crate::error::{CryptoError, CryptoResult};
use crate::keys::{Context, Key};
use crate::primitives::{self, NONCE_BYTES};
use crate::{CONTEXT_BYTES, HEADER_BYTES, SIV_BYTES, TAG_BYTES};

const ENC_LABEL: &[u8] = b"hydrobox-secretbox-enc";
const SIV_LABEL: &[u8] = b"hydrobox-secretbox-siv";

const MSG_ID_BYTES: usize = 8;

/// Encrypt `message` under `key`, bound to `message_id` and `context`.
///
/// Returns `[SIV][tag][body]`, exactly `HEADER_BYTES + message.len()` bytes.
/// A given (key, context, message_id) must not be used for two different
/// messages.
pub fn encrypt(
    message: &[u8],
    key: &Key,
    message_id: u64,
    context: &Context,
) -> CryptoResult<Vec<u8>> {
    let siv = compute_siv(message, key, message_id, context);
    let enc_key = primitives::derive_subkey(key.as_bytes(), context.as_bytes(), ENC_LABEL);
    let nonce = build_nonce(&siv, message_id);
    let aad = build_aad(context, message_id, &siv);

    let mut ciphertext = Vec::with_capacity(HEADER_BYTES + message.len());
    ciphertext.extend_from_slice(&siv);
    ciphertext.extend_from_slice(&[0u8; TAG_BYTES]);
    ciphertext.extend_from_slice(message);

    let body = &mut ciphertext[HEADER_BYTES..];
    let tag = primitives::seal_detached(&enc_key, &nonce, &aad, body)?;
    ciphertext[SIV_BYTES..HEADER_BYTES].copy_from_slice(&tag);

    tracing::debug!(message_id, len = message.len(), "secretbox encrypt");
    Ok(ciphertext)
}

/// Decrypt a ciphertext produced by [`encrypt`].
///
/// The tag is checked before any plaintext is produced. On failure the
/// working buffer is wiped and only [`CryptoError::AuthenticationFailed`] is
/// returned.
///
/// # Errors
///
/// - `CiphertextTooShort`: fewer than `HEADER_BYTES + 1` bytes (caller error)
/// - `AuthenticationFailed`: forged data, or wrong key, message id or context
pub fn decrypt(
    ciphertext: &[u8],
    key: &Key,
    message_id: u64,
    context: &Context,
) -> CryptoResult<Vec<u8>> {
    let (siv, tag, body) = split_ciphertext(ciphertext)?;

    let enc_key = primitives::derive_subkey(key.as_bytes(), context.as_bytes(), ENC_LABEL);
    let nonce = build_nonce(siv, message_id);
    let aad = build_aad(context, message_id, siv);

    let mut plaintext = Zeroizing::new(body.to_vec());
    if let Err(e) = primitives::open_detached(&enc_key, &nonce, &aad, &mut plaintext, tag) {
        tracing::warn!(message_id, len = ciphertext.len(), "secretbox message forged");
        return Err(e);
    }

    tracing::debug!(message_id, len = body.len(), "secretbox decrypt");
    Ok(std::mem::take(&mut *plaintext))
}

/// Split `[SIV][tag][body]`, requiring a non-empty body.
fn split_ciphertext(
    ciphertext: &[u8],
) -> CryptoResult<(&[u8; SIV_BYTES], &[u8; TAG_BYTES], &[u8])> {
    let too_short = || CryptoError::CiphertextTooShort {
        actual: ciphertext.len(),
        minimum: HEADER_BYTES + 1,
    };
    if ciphertext.len() <= HEADER_BYTES {
        return Err(too_short());
    }

    let (siv, rest) = ciphertext.split_first_chunk::<SIV_BYTES>().ok_or_else(too_short)?;
    let (tag, body) = rest.split_first_chunk::<TAG_BYTES>().ok_or_else(too_short)?;
    Ok((siv, tag, body))
}

/// SIV = BLAKE3_keyed(siv_key, message_id || context || len || message)[..20]
fn compute_siv(
    message: &[u8],
    key: &Key,
    message_id: u64,
    context: &Context,
) -> [u8; SIV_BYTES] {
    let siv_key = primitives::derive_subkey(key.as_bytes(), context.as_bytes(), SIV_LABEL);
    let id = message_id.to_le_bytes();
    let len = (message.len() as u64).to_le_bytes();

    let mut siv = [0u8; SIV_BYTES];
    primitives::keyed_hash(
        &siv_key,
        &[id.as_slice(), context.as_bytes().as_slice(), len.as_slice(), message],
        &mut siv,
    );
    siv
}

/// Build a 24-byte XChaCha20 nonce.
///
/// Structure:
/// - bytes 0-15: SIV prefix
/// - bytes 16-23: `message_id` (little-endian)
fn build_nonce(siv: &[u8; SIV_BYTES], message_id: u64) -> [u8; NONCE_BYTES] {
    let mut nonce = [0u8; NONCE_BYTES];
    nonce[..NONCE_BYTES - MSG_ID_BYTES].copy_from_slice(&siv[..NONCE_BYTES - MSG_ID_BYTES]);
    nonce[NONCE_BYTES - MSG_ID_BYTES..].copy_from_slice(&message_id.to_le_bytes());
    nonce
}

/// Build AAD: context (8 bytes) || message_id (8 bytes LE) || SIV (20 bytes)
fn build_aad(
    context: &Context,
    message_id: u64,
    siv: &[u8; SIV_BYTES],
) -> [u8; CONTEXT_BYTES + MSG_ID_BYTES + SIV_BYTES] {
    let mut aad = [0u8; CONTEXT_BYTES + MSG_ID_BYTES + SIV_BYTES];
    aad[..CONTEXT_BYTES].copy_from_slice(context.as_bytes());
    aad[CONTEXT_BYTES..CONTEXT_BYTES + MSG_ID_BYTES].copy_from_slice(&message_id.to_le_bytes());
    aad[CONTEXT_BYTES + MSG_ID_BYTES..].copy_from_slice(siv);
    aad
}
