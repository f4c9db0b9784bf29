//! hydrobox-crypto: secretbox and probe core for hydrobox
//!
//! Architecture: deterministic SIV-style secretbox over XChaCha20-Poly1305
//!
//! Ciphertext layout:
//! ```text
//! [20 bytes: SIV][16 bytes: Poly1305 tag][N bytes: encrypted body]
//! └──────────── header (36 bytes) ─────────┘
//! ```
//!
//! Key schedule (per key + context):
//! ```text
//! Secretbox Key (256-bit, random)
//!   ├── Encryption Key (HKDF-SHA256, salt=context, info="hydrobox-secretbox-enc")
//!   │   └── XChaCha20-Poly1305 (nonce=SIV[..16]||msg_id, AAD=context||msg_id||SIV)
//!   ├── SIV Key (HKDF-SHA256, salt=context, info="hydrobox-secretbox-siv")
//!   │   └── BLAKE3 keyed: msg_id||context||len||message → 20-byte SIV
//!   └── Probe Key (HKDF-SHA256, salt=context, info="hydrobox-secretbox-probe")
//!       └── BLAKE3 keyed: context||ciphertext → 16-byte probe
//! ```
//!
//! Every operation is synchronous and pure apart from the process-wide
//! CSPRNG in [`random`], which initializes itself on first use.

pub mod api;
pub mod error;
pub mod keys;
pub mod primitives;
pub mod probe;
pub mod random;
pub mod secretbox;

pub use error::{CryptoError, CryptoResult};
pub use keys::{secretbox_keygen, Context, Key};
pub use probe::Probe;
pub use random::{
    init, random_buf, random_buf_deterministic, random_reseed, random_u32, random_uniform,
};

/// Size of a secretbox key (256-bit)
pub const KEY_BYTES: usize = 32;

/// Size of a domain-separation context
pub const CONTEXT_BYTES: usize = 8;

/// Size of the synthetic IV carried in the ciphertext header
pub const SIV_BYTES: usize = 20;

/// Size of a Poly1305 authentication tag
pub const TAG_BYTES: usize = 16;

/// Size of the ciphertext header (SIV + tag)
pub const HEADER_BYTES: usize = SIV_BYTES + TAG_BYTES;

/// Size of a detached probe
pub const PROBE_BYTES: usize = 16;

/// Size of a seed for [`random_buf_deterministic`]
pub const SEED_BYTES: usize = 32;
