//! Secretbox keys and domain-separation contexts

use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::{CryptoError, CryptoResult};
use crate::random;
use crate::{CONTEXT_BYTES, KEY_BYTES};

/// A 256-bit secretbox key. Zeroized on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct Key {
    bytes: [u8; KEY_BYTES],
}

impl Key {
    /// Generate a fresh key from the process CSPRNG.
    pub fn generate() -> Self {
        let mut bytes = [0u8; KEY_BYTES];
        random::random_buf(&mut bytes);
        Self { bytes }
    }

    pub fn from_bytes(bytes: [u8; KEY_BYTES]) -> Self {
        Self { bytes }
    }

    /// Copy a key out of a caller buffer, rejecting anything but exactly `KEY_BYTES`.
    pub fn from_slice(bytes: &[u8]) -> CryptoResult<Self> {
        let bytes: [u8; KEY_BYTES] = bytes.try_into().map_err(|_| CryptoError::InvalidKeyLength {
            expected: KEY_BYTES,
            actual: bytes.len(),
        })?;
        Ok(Self { bytes })
    }

    pub fn as_bytes(&self) -> &[u8; KEY_BYTES] {
        &self.bytes
    }
}

impl std::fmt::Debug for Key {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Key").field("bytes", &"[REDACTED]").finish()
    }
}

/// Generate a random secretbox key.
pub fn secretbox_keygen() -> Key {
    Key::generate()
}

/// An 8-byte domain-separation context.
///
/// Not secret. Only its byte length is checked; no text encoding is assumed.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Context {
    bytes: [u8; CONTEXT_BYTES],
}

impl Context {
    pub const fn new(bytes: &[u8; CONTEXT_BYTES]) -> Self {
        Self { bytes: *bytes }
    }

    pub fn from_slice(bytes: &[u8]) -> CryptoResult<Self> {
        let bytes: [u8; CONTEXT_BYTES] =
            bytes.try_into().map_err(|_| CryptoError::InvalidContextLength {
                expected: CONTEXT_BYTES,
                actual: bytes.len(),
            })?;
        Ok(Self { bytes })
    }

    pub fn as_bytes(&self) -> &[u8; CONTEXT_BYTES] {
        &self.bytes
    }
}

impl TryFrom<&[u8]> for Context {
    type Error = CryptoError;

    fn try_from(bytes: &[u8]) -> CryptoResult<Self> {
        Self::from_slice(bytes)
    }
}

impl TryFrom<&str> for Context {
    type Error = CryptoError;

    fn try_from(s: &str) -> CryptoResult<Self> {
        Self::from_slice(s.as_bytes())
    }
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Context({:?})", String::from_utf8_lossy(&self.bytes))
    }
}
