use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::encoding::Encoding;
use crate::error::{HydroboxError, HydroboxResult};

/// Required byte length of `secretbox.context`.
pub const CONTEXT_BYTES: usize = 8;

/// Top-level configuration (loaded from hydrobox.toml)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HydroboxConfig {
    pub log: LogConfig,
    pub secretbox: SecretboxConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Log level (default: warn)
    pub level: String,
    /// Log format: "json" or "text"
    pub format: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SecretboxConfig {
    /// Default domain-separation context; must be exactly 8 bytes
    pub context: String,
    /// Hex-encoded key file used when no key is passed explicitly
    pub key_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Encoding for ciphertexts and probes: "hex" or "base64"
    pub encoding: Encoding,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "warn".into(),
            format: "text".into(),
        }
    }
}

impl Default for SecretboxConfig {
    fn default() -> Self {
        Self {
            context: "hydrobox".into(),
            key_file: None,
        }
    }
}

impl HydroboxConfig {
    /// Load from `path`, falling back to defaults when the file does not exist.
    pub fn load(path: &Path) -> HydroboxResult<Self> {
        let config = if path.exists() {
            let content = std::fs::read_to_string(path)?;
            toml::from_str(&content)
                .map_err(|e| HydroboxError::Config(format!("parsing {}: {e}", path.display())))?
        } else {
            tracing::debug!("config file not found: {} (using defaults)", path.display());
            Self::default()
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> HydroboxResult<()> {
        let len = self.secretbox.context.len();
        if len != CONTEXT_BYTES {
            return Err(HydroboxError::Config(format!(
                "secretbox.context {:?}: expected {CONTEXT_BYTES} bytes, got {len}",
                self.secretbox.context
            )));
        }
        Ok(())
    }

    /// `secretbox.key_file` with a leading `~/` expanded.
    pub fn key_file(&self) -> Option<PathBuf> {
        self.secretbox.key_file.as_deref().map(expand_tilde)
    }
}

/// Expand `~` in path to the user's home directory
pub fn expand_tilde(path: &Path) -> PathBuf {
    let s = path.to_string_lossy();
    if let Some(rest) = s.strip_prefix("~/") {
        let home = std::env::var("HOME").unwrap_or_default();
        PathBuf::from(home).join(rest)
    } else {
        path.to_path_buf()
    }
}
