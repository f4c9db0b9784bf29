//! Detached probes over secretbox ciphertexts
//!
//! A probe lets a relay holding the key and context check that a ciphertext
//! blob is authentic without knowing the message id and without decrypting:
//!
//! ```text
//! probe = BLAKE3_keyed(probe_key, context || ciphertext)[..16]
//! probe_key = HKDF-SHA256(key, salt=context, info="hydrobox-secretbox-probe")
//! ```

use crate::error::{CryptoError, CryptoResult};
use crate::keys::{Context, Key};
use crate::primitives;
use crate::{HEADER_BYTES, PROBE_BYTES};

const PROBE_LABEL: &[u8] = b"hydrobox-secretbox-probe";

/// A 16-byte detached authentication tag. Compares in constant time.
#[derive(Clone, Copy)]
pub struct Probe {
    bytes: [u8; PROBE_BYTES],
}

impl Probe {
    pub fn from_bytes(bytes: [u8; PROBE_BYTES]) -> Self {
        Self { bytes }
    }

    pub fn from_slice(bytes: &[u8]) -> CryptoResult<Self> {
        let bytes: [u8; PROBE_BYTES] =
            bytes.try_into().map_err(|_| CryptoError::InvalidProbeLength {
                expected: PROBE_BYTES,
                actual: bytes.len(),
            })?;
        Ok(Self { bytes })
    }

    pub fn as_bytes(&self) -> &[u8; PROBE_BYTES] {
        &self.bytes
    }
}

impl PartialEq for Probe {
    fn eq(&self, other: &Self) -> bool {
        primitives::ct_eq(&self.bytes, &other.bytes)
    }
}

impl Eq for Probe {}

impl std::fmt::Debug for Probe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Probe(")?;
        for byte in &self.bytes {
            write!(f, "{byte:02x}")?;
        }
        write!(f, ")")
    }
}

/// Compute the probe for `ciphertext` under `context` and `key`.
///
/// Any output of `secretbox::encrypt` is accepted, including the header-only
/// ciphertext of an empty message.
pub fn create(ciphertext: &[u8], context: &Context, key: &Key) -> CryptoResult<Probe> {
    if ciphertext.len() < HEADER_BYTES {
        return Err(CryptoError::CiphertextTooShort {
            actual: ciphertext.len(),
            minimum: HEADER_BYTES,
        });
    }

    let probe_key = primitives::derive_subkey(key.as_bytes(), context.as_bytes(), PROBE_LABEL);
    let mut bytes = [0u8; PROBE_BYTES];
    primitives::keyed_hash(
        &probe_key,
        &[context.as_bytes().as_slice(), ciphertext],
        &mut bytes,
    );

    tracing::debug!(len = ciphertext.len(), "secretbox probe create");
    Ok(Probe { bytes })
}

/// Recompute the probe and compare it in constant time.
///
/// # Errors
///
/// - `CiphertextTooShort`: not a secretbox ciphertext (caller error)
/// - `AuthenticationFailed`: probe does not match
pub fn verify(
    probe: &Probe,
    ciphertext: &[u8],
    context: &Context,
    key: &Key,
) -> CryptoResult<()> {
    let expected = create(ciphertext, context, key)?;
    if expected == *probe {
        Ok(())
    } else {
        tracing::warn!(len = ciphertext.len(), "secretbox probe verify failed");
        Err(CryptoError::AuthenticationFailed)
    }
}
