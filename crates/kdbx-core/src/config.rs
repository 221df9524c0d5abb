use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{KdbxError, KdbxResult};

/// Rounds handed to a single CBC call by the AES-KDF engine.
pub const DEFAULT_BATCH_ROUNDS: u64 = 10_000;

/// Upper bound on `kdf.batch_rounds`. Each lane buffers 16 bytes per round.
pub const MAX_BATCH_ROUNDS: u64 = 1 << 20;

/// Top-level unlock configuration (loaded from kdbx-unlock.toml)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UnlockConfig {
    pub kdf: KdfConfig,
    pub header: HeaderConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KdfConfig {
    /// AES-KDF rounds per batch (default: 10000). Changes timing, never the key.
    pub batch_rounds: u64,
    /// Compute the two AES-KDF lanes as joined parallel tasks (default: true)
    pub parallel_lanes: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeaderConfig {
    /// Check the SHA-256 stored after the header when opening a file (default: true)
    pub verify_hash: bool,
}

impl Default for KdfConfig {
    fn default() -> Self {
        Self {
            batch_rounds: DEFAULT_BATCH_ROUNDS,
            parallel_lanes: true,
        }
    }
}

impl Default for HeaderConfig {
    fn default() -> Self {
        Self { verify_hash: true }
    }
}

impl KdfConfig {
    pub fn validate(&self) -> KdbxResult<()> {
        if self.batch_rounds == 0 {
            return Err(KdbxError::Config("kdf.batch_rounds must be at least 1".into()));
        }
        if self.batch_rounds > MAX_BATCH_ROUNDS {
            return Err(KdbxError::Config(format!(
                "kdf.batch_rounds must be at most {MAX_BATCH_ROUNDS}, got {}",
                self.batch_rounds
            )));
        }
        Ok(())
    }
}

impl UnlockConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(s: &str) -> KdbxResult<Self> {
        let config: UnlockConfig =
            toml::from_str(s).map_err(|e| KdbxError::Config(e.to_string()))?;
        config.kdf.validate()?;
        Ok(config)
    }

    /// Load configuration from `path`, falling back to defaults if the file is absent.
    pub fn load(path: &Path) -> KdbxResult<Self> {
        if !path.exists() {
            tracing::warn!(
                "config file not found: {}  (using defaults)",
                path.display()
            );
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config = Self::from_toml_str(&content)?;
        tracing::debug!(config = %path.display(), "loaded unlock configuration");
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_config() {
        let toml_str = r#"
[kdf]
batch_rounds = 2500
parallel_lanes = false

[header]
verify_hash = false
"#;
        let config = UnlockConfig::from_toml_str(toml_str).unwrap();

        assert_eq!(config.kdf.batch_rounds, 2500);
        assert!(!config.kdf.parallel_lanes);
        assert!(!config.header.verify_hash);
    }

    #[test]
    fn test_parse_defaults() {
        let config = UnlockConfig::from_toml_str("").unwrap();

        assert_eq!(config.kdf.batch_rounds, DEFAULT_BATCH_ROUNDS);
        assert!(config.kdf.parallel_lanes);
        assert!(config.header.verify_hash);
    }

    #[test]
    fn test_parse_partial_config() {
        let config = UnlockConfig::from_toml_str("[kdf]\nparallel_lanes = false\n").unwrap();

        // Overridden
        assert!(!config.kdf.parallel_lanes);
        // Defaults
        assert_eq!(config.kdf.batch_rounds, 10_000);
        assert!(config.header.verify_hash);
    }

    #[test]
    fn test_zero_batch_rejected() {
        let err = UnlockConfig::from_toml_str("[kdf]\nbatch_rounds = 0\n").unwrap_err();
        assert!(matches!(err, KdbxError::Config(_)));
    }

    #[test]
    fn test_oversized_batch_rejected() {
        let at_max = format!("[kdf]\nbatch_rounds = {MAX_BATCH_ROUNDS}\n");
        assert!(UnlockConfig::from_toml_str(&at_max).is_ok());

        let over = format!("[kdf]\nbatch_rounds = {}\n", MAX_BATCH_ROUNDS + 1);
        let err = UnlockConfig::from_toml_str(&over).unwrap_err();
        assert!(matches!(err, KdbxError::Config(_)));
    }

    #[test]
    fn test_invalid_toml_rejected() {
        let err = UnlockConfig::from_toml_str("[kdf\n").unwrap_err();
        assert!(matches!(err, KdbxError::Config(_)));
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let tmp = tempfile::TempDir::new().unwrap();
        let config = UnlockConfig::load(&tmp.path().join("absent.toml")).unwrap();
        assert_eq!(config, UnlockConfig::default());
    }

    #[test]
    fn test_load_from_file() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("kdbx-unlock.toml");
        std::fs::write(&path, "[kdf]\nbatch_rounds = 64\n").unwrap();

        let config = UnlockConfig::load(&path).unwrap();
        assert_eq!(config.kdf.batch_rounds, 64);
    }

    #[test]
    fn test_serialize_roundtrip() {
        let config = UnlockConfig::default();
        let toml_str = toml::to_string(&config).unwrap();
        let parsed = UnlockConfig::from_toml_str(&toml_str).unwrap();

        assert_eq!(config, parsed);
    }
}
