use thiserror::Error;

pub type CryptoResult<T> = Result<T, CryptoError>;

/// Errors returned by the secretbox core.
///
/// Everything except [`CryptoError::AuthenticationFailed`] is a caller-contract
/// violation, detected before any cryptographic work starts. Authentication
/// failures carry no detail on purpose: a forged ciphertext, a wrong key, a wrong
/// message id and a wrong context are indistinguishable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CryptoError {
    #[error("illegal key, size mismatch: expected {expected} bytes, got {actual}")]
    InvalidKeyLength { expected: usize, actual: usize },

    #[error("invalid context length: expected {expected} bytes, got {actual}")]
    InvalidContextLength { expected: usize, actual: usize },

    #[error("illegal probe, size mismatch: expected {expected} bytes, got {actual}")]
    InvalidProbeLength { expected: usize, actual: usize },

    #[error("invalid ciphertext length: {actual} bytes (minimum {minimum})")]
    CiphertextTooShort { actual: usize, minimum: usize },

    #[error("message too long for a single secretbox: {len} bytes")]
    MessageTooLong { len: usize },

    #[error("upper bound must be greater than zero")]
    ZeroUpperBound,

    #[error("authentication failed")]
    AuthenticationFailed,
}

impl CryptoError {
    /// True for errors caused by malformed arguments rather than by verification.
    pub fn is_caller_error(&self) -> bool {
        !self.is_authentication_failure()
    }

    /// True only for [`CryptoError::AuthenticationFailed`].
    pub fn is_authentication_failure(&self) -> bool {
        matches!(self, CryptoError::AuthenticationFailed)
    }
}
