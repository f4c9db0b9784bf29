//! Primitive building blocks shared by the secretbox and probe engines
//!
//! Subkeys come from HKDF-SHA256 and the SIV and probe MACs from BLAKE3 keyed
//! mode. The body is sealed with XChaCha20-Poly1305.

use chacha20poly1305::{
    aead::{AeadInPlace, KeyInit},
    Tag, XChaCha20Poly1305, XNonce,
};
use hkdf::Hkdf;
use sha2::Sha256;
use subtle::ConstantTimeEq;
use zeroize::Zeroizing;

use crate::error::{CryptoError, CryptoResult};
use crate::{CONTEXT_BYTES, KEY_BYTES, TAG_BYTES};

/// Size of an XChaCha20 nonce (192-bit)
pub const NONCE_BYTES: usize = 24;

/// Derive a 256-bit subkey bound to `context` and a domain `label`.
///
/// HKDF-SHA256 with the context as salt and the label as info, so the same key
/// under two contexts never yields related subkeys.
pub fn derive_subkey(
    key: &[u8; KEY_BYTES],
    context: &[u8; CONTEXT_BYTES],
    label: &[u8],
) -> Zeroizing<[u8; KEY_BYTES]> {
    let hkdf = Hkdf::<Sha256>::new(Some(context.as_slice()), key);
    let mut okm = Zeroizing::new([0u8; KEY_BYTES]);
    let okm_bytes: &mut [u8; KEY_BYTES] = &mut okm;
    let Ok(()) = hkdf.expand(label, okm_bytes) else {
        unreachable!("HKDF-SHA256 can always expand 32 bytes");
    };
    okm
}

/// BLAKE3 keyed hash over the concatenation of `parts`, filling `out` from the XOF.
pub fn keyed_hash(key: &[u8; KEY_BYTES], parts: &[&[u8]], out: &mut [u8]) {
    let mut hasher = blake3::Hasher::new_keyed(key);
    for part in parts {
        hasher.update(part);
    }
    hasher.finalize_xof().fill(out);
}

/// Encrypt `buffer` in place and return the detached Poly1305 tag.
pub fn seal_detached(
    key: &[u8; KEY_BYTES],
    nonce: &[u8; NONCE_BYTES],
    aad: &[u8],
    buffer: &mut [u8],
) -> CryptoResult<[u8; TAG_BYTES]> {
    let cipher = XChaCha20Poly1305::new(key.into());
    let tag = cipher
        .encrypt_in_place_detached(XNonce::from_slice(nonce), aad, buffer)
        .map_err(|_| CryptoError::MessageTooLong { len: buffer.len() })?;

    let mut out = [0u8; TAG_BYTES];
    out.copy_from_slice(tag.as_slice());
    Ok(out)
}

/// Verify the detached tag and, only if it matches, decrypt `buffer` in place.
///
/// On failure `buffer` still holds ciphertext; no keystream has been applied.
pub fn open_detached(
    key: &[u8; KEY_BYTES],
    nonce: &[u8; NONCE_BYTES],
    aad: &[u8],
    buffer: &mut [u8],
    tag: &[u8; TAG_BYTES],
) -> CryptoResult<()> {
    let cipher = XChaCha20Poly1305::new(key.into());
    cipher
        .decrypt_in_place_detached(XNonce::from_slice(nonce), aad, buffer, Tag::from_slice(tag))
        .map_err(|_| CryptoError::AuthenticationFailed)
}

/// Constant-time equality. Slices of different length compare unequal.
pub fn ct_eq(a: &[u8], b: &[u8]) -> bool {
    a.ct_eq(b).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: [u8; KEY_BYTES] = [7u8; KEY_BYTES];

    #[test]
    fn test_subkeys_separate_by_label_and_context() {
        let a = derive_subkey(&KEY, b"context1", b"label-a");
        let b = derive_subkey(&KEY, b"context1", b"label-b");
        let c = derive_subkey(&KEY, b"context2", b"label-a");

        assert_ne!(*a, *b, "different labels must produce different subkeys");
        assert_ne!(*a, *c, "different contexts must produce different subkeys");
        assert_eq!(*a, *derive_subkey(&KEY, b"context1", b"label-a"));
    }

    #[test]
    fn test_keyed_hash_depends_on_key() {
        let mut h1 = [0u8; 20];
        let mut h2 = [0u8; 20];
        keyed_hash(&KEY, &[b"abc".as_slice()], &mut h1);
        keyed_hash(&[8u8; KEY_BYTES], &[b"abc".as_slice()], &mut h2);
        assert_ne!(h1, h2);
    }

    #[test]
    fn test_keyed_hash_parts_are_concatenated() {
        let mut split = [0u8; 16];
        let mut joined = [0u8; 16];
        keyed_hash(&KEY, &[b"ab".as_slice(), b"c".as_slice()], &mut split);
        keyed_hash(&KEY, &[b"abc".as_slice()], &mut joined);
        assert_eq!(split, joined);
    }

    #[test]
    fn test_seal_open_roundtrip() {
        let nonce = [1u8; NONCE_BYTES];
        let mut buffer = b"attack at dawn".to_vec();

        let tag = seal_detached(&KEY, &nonce, b"aad", &mut buffer).unwrap();
        assert_ne!(&buffer, b"attack at dawn");

        open_detached(&KEY, &nonce, b"aad", &mut buffer, &tag).unwrap();
        assert_eq!(&buffer, b"attack at dawn");
    }

    #[test]
    fn test_open_rejects_wrong_aad_without_decrypting() {
        let nonce = [1u8; NONCE_BYTES];
        let mut buffer = b"attack at dawn".to_vec();
        let tag = seal_detached(&KEY, &nonce, b"aad", &mut buffer).unwrap();
        let sealed = buffer.clone();

        let result = open_detached(&KEY, &nonce, b"other", &mut buffer, &tag);
        assert_eq!(result, Err(CryptoError::AuthenticationFailed));
        assert_eq!(buffer, sealed, "failed open must leave the ciphertext untouched");
    }

    #[test]
    fn test_ct_eq() {
        assert!(ct_eq(b"same", b"same"));
        assert!(!ct_eq(b"same", b"sane"));
        assert!(!ct_eq(b"same", b"same-but-longer"));
    }
}
