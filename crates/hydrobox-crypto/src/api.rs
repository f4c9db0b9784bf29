//! Flat, byte-slice boundary for host bindings
//!
//! Mirrors the surface a scripting host sees: plain byte buffers in, freshly
//! owned buffers out. Lengths are checked here, in the order a binding reports
//! them, before any cryptographic work starts. Nothing returned aliases an
//! input.

use crate::error::CryptoResult;
use crate::keys::{Context, Key};
use crate::probe::{self, Probe};
use crate::secretbox;

pub use crate::random::{init, random_u32, random_uniform};
pub use crate::{CONTEXT_BYTES, HEADER_BYTES, KEY_BYTES, PROBE_BYTES};

/// Generate a fresh `KEY_BYTES` key as an owned buffer.
pub fn secretbox_keygen() -> Vec<u8> {
    Key::generate().as_bytes().to_vec()
}

/// Encrypt `message`; checks the key, then the context.
pub fn secretbox_encrypt(
    message: &[u8],
    key: &[u8],
    message_id: u64,
    context: &[u8],
) -> CryptoResult<Vec<u8>> {
    let key = Key::from_slice(key)?;
    let context = Context::from_slice(context)?;
    secretbox::encrypt(message, &key, message_id, &context)
}

/// Decrypt `ciphertext`; checks the key, then the context, then the ciphertext length.
pub fn secretbox_decrypt(
    ciphertext: &[u8],
    key: &[u8],
    message_id: u64,
    context: &[u8],
) -> CryptoResult<Vec<u8>> {
    let key = Key::from_slice(key)?;
    let context = Context::from_slice(context)?;
    secretbox::decrypt(ciphertext, &key, message_id, &context)
}

/// Create a probe; checks the context, then the key.
pub fn secretbox_probe_create(
    ciphertext: &[u8],
    context: &[u8],
    key: &[u8],
) -> CryptoResult<[u8; PROBE_BYTES]> {
    let context = Context::from_slice(context)?;
    let key = Key::from_slice(key)?;
    probe::create(ciphertext, &context, &key).map(|p| *p.as_bytes())
}

/// Verify a probe; checks the probe, then the context, then the key.
pub fn secretbox_probe_verify(
    probe: &[u8],
    ciphertext: &[u8],
    context: &[u8],
    key: &[u8],
) -> CryptoResult<()> {
    let probe = Probe::from_slice(probe)?;
    let context = Context::from_slice(context)?;
    let key = Key::from_slice(key)?;
    probe::verify(&probe, ciphertext, &context, &key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CryptoError;

    const CONTEXT: &[u8] = b"testtest";
    const INVALID_CONTEXT: &[u8] = b"invalid context";

    #[test]
    fn test_keygen_length() {
        assert_eq!(secretbox_keygen().len(), KEY_BYTES);
    }

    #[test]
    fn test_exposed_sizes() {
        assert_eq!(CONTEXT_BYTES, 8);
        assert_eq!(KEY_BYTES, 32);
        assert_eq!(HEADER_BYTES, 36);
        assert_eq!(PROBE_BYTES, 16);
    }

    #[test]
    fn test_encrypt_decrypt() {
        let key = secretbox_keygen();
        let ciphertext = secretbox_encrypt(b"message", &key, 0, CONTEXT).unwrap();
        assert_eq!(ciphertext.len(), 43);

        let plaintext = secretbox_decrypt(&ciphertext, &key, 0, CONTEXT).unwrap();
        assert_eq!(plaintext, b"message");
    }

    #[test]
    fn test_invalid_context_length() {
        let key = secretbox_keygen();
        let err = secretbox_encrypt(b"message", &key, 0, INVALID_CONTEXT).unwrap_err();
        assert!(matches!(err, CryptoError::InvalidContextLength { actual: 15, .. }));
    }

    #[test]
    fn test_invalid_key_is_reported_before_context() {
        // both arguments are wrong; the key is checked first
        let err = secretbox_encrypt(b"message", &[0u8; 5], 0, b"test").unwrap_err();
        assert!(matches!(err, CryptoError::InvalidKeyLength { actual: 5, .. }));
    }

    #[test]
    fn test_decrypt_short_ciphertext() {
        let key = secretbox_keygen();
        let err = secretbox_decrypt(&[0u8; HEADER_BYTES], &key, 0, CONTEXT).unwrap_err();
        assert!(matches!(err, CryptoError::CiphertextTooShort { .. }));
    }

    #[test]
    fn test_probe_roundtrip_and_argument_checks() {
        let key = secretbox_keygen();
        let ciphertext = secretbox_encrypt(b"message", &key, 0, CONTEXT).unwrap();
        let probe = secretbox_probe_create(&ciphertext, CONTEXT, &key).unwrap();

        secretbox_probe_verify(&probe, &ciphertext, CONTEXT, &key).unwrap();

        assert_eq!(
            secretbox_probe_verify(&[0u8; PROBE_BYTES], &ciphertext, CONTEXT, &key),
            Err(CryptoError::AuthenticationFailed)
        );
        assert!(matches!(
            secretbox_probe_create(&ciphertext, INVALID_CONTEXT, &key),
            Err(CryptoError::InvalidContextLength { .. })
        ));
        assert!(matches!(
            secretbox_probe_create(&ciphertext, CONTEXT, &[0u8; 5]),
            Err(CryptoError::InvalidKeyLength { .. })
        ));
        assert!(matches!(
            secretbox_probe_verify(&[0u8; 5], &ciphertext, CONTEXT, &key),
            Err(CryptoError::InvalidProbeLength { .. })
        ));
        assert!(matches!(
            secretbox_probe_verify(&probe, &ciphertext, INVALID_CONTEXT, &key),
            Err(CryptoError::InvalidContextLength { .. })
        ));
        assert!(matches!(
            secretbox_probe_verify(&probe, &ciphertext, CONTEXT, &[0u8; 5]),
            Err(CryptoError::InvalidKeyLength { .. })
        ));
    }

    #[test]
    fn test_random_uniform_zero() {
        assert_eq!(random_uniform(0), Err(CryptoError::ZeroUpperBound));
    }
}
