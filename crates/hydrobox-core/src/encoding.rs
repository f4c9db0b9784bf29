//! Text encodings for binary values crossing the CLI boundary

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::error::{HydroboxError, HydroboxResult};

/// How keys, ciphertexts and probes are written as text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Encoding {
    /// Lowercase hex (default)
    #[default]
    Hex,
    /// Standard base64 with padding
    Base64,
}

impl Encoding {
    pub fn encode(&self, data: &[u8]) -> String {
        match self {
            Encoding::Hex => hex::encode(data),
            Encoding::Base64 => STANDARD.encode(data),
        }
    }

    /// Decode `text`, ignoring surrounding whitespace (e.g. a trailing newline in a key file).
    pub fn decode(&self, text: &str) -> HydroboxResult<Vec<u8>> {
        let text = text.trim();
        match self {
            Encoding::Hex => {
                hex::decode(text).map_err(|e| HydroboxError::Encoding(format!("invalid hex: {e}")))
            }
            Encoding::Base64 => STANDARD
                .decode(text)
                .map_err(|e| HydroboxError::Encoding(format!("invalid base64: {e}"))),
        }
    }
}

impl std::str::FromStr for Encoding {
    type Err = HydroboxError;

    fn from_str(s: &str) -> HydroboxResult<Self> {
        match s.to_ascii_lowercase().as_str() {
            "hex" => Ok(Encoding::Hex),
            "base64" => Ok(Encoding::Base64),
            other => Err(HydroboxError::Encoding(format!(
                "unknown encoding '{other}' (expected hex or base64)"
            ))),
        }
    }
}

impl std::fmt::Display for Encoding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Encoding::Hex => f.write_str("hex"),
            Encoding::Base64 => f.write_str("base64"),
        }
    }
}
