//! `Kdbx4`: a parsed file plus the operations that turn a password into keys.

use std::path::Path;

use base64::Engine as _;
use kdbx_core::{KdbxError, KdbxResult, UnlockConfig};
use kdbx_header::{parse_header, verify_header_hash, Kdbx4Header};
use secrecy::SecretString;
use tracing::debug;

use crate::kdf::KeyDeriver;
use crate::keys::verify_header_hmac_with;
use crate::provider::{CryptoProvider, RustCryptoProvider};
use crate::secret::{EncryptionKey, HmacKey};

/// The two keys a payload reader needs.
#[derive(Debug, Clone)]
pub struct UnlockedKeys {
    pub encryption_key: EncryptionKey,
    pub hmac_key: HmacKey,
}

/// A KDBX4 file whose header has been parsed.
#[derive(Debug, Clone)]
pub struct Kdbx4 {
    bytes: Vec<u8>,
    header: Kdbx4Header,
    config: UnlockConfig,
}

impl Kdbx4 {
    pub fn from_bytes(bytes: Vec<u8>) -> KdbxResult<Self> {
        Self::from_bytes_with_config(bytes, &UnlockConfig::default())
    }

    /// Parse the header and, if `config.header.verify_hash` is set, check the
    /// SHA-256 that follows it.
    pub fn from_bytes_with_config(bytes: Vec<u8>, config: &UnlockConfig) -> KdbxResult<Self> {
        config.kdf.validate()?;
        let header = parse_header(&bytes)?;
        if config.header.verify_hash {
            verify_header_hash(&bytes, &header)?;
        }
        Ok(Self {
            bytes,
            header,
            config: config.clone(),
        })
    }

    /// Standard-alphabet base64 of the whole file. Surrounding whitespace is
    /// ignored.
    pub fn from_base64(encoded: &str) -> KdbxResult<Self> {
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(encoded.trim())
            .map_err(|e| KdbxError::Encoding(format!("invalid base64: {e}")))?;
        Self::from_bytes(bytes)
    }

    pub fn open(path: impl AsRef<Path>) -> KdbxResult<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;
        debug!(path = %path.display(), len = bytes.len(), "read KDBX file");
        Self::from_bytes(bytes)
    }

    pub fn header(&self) -> &Kdbx4Header {
        &self.header
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn config(&self) -> &UnlockConfig {
        &self.config
    }

    /// Everything after the header and its 64-byte trailer.
    pub fn payload(&self) -> &[u8] {
        self.bytes.get(self.header.payload_offset()..).unwrap_or(&[])
    }

    /// A deriver using the default provider and this file's KDF config.
    pub fn deriver(&self) -> KeyDeriver<RustCryptoProvider> {
        KeyDeriver::new().with_config(self.config.kdf.clone())
    }

    pub fn unlock(&self, password: &SecretString) -> KdbxResult<UnlockedKeys> {
        self.unlock_with(&self.deriver(), password)
    }

    pub fn unlock_with<P: CryptoProvider>(
        &self,
        deriver: &KeyDeriver<P>,
        password: &SecretString,
    ) -> KdbxResult<UnlockedKeys> {
        unlock_header(deriver, &self.header, password)
    }

    /// Run [`Kdbx4::unlock`] on tokio's blocking pool.
    pub async fn unlock_async(&self, password: SecretString) -> KdbxResult<UnlockedKeys> {
        self.unlock_async_with(self.deriver(), password).await
    }

    pub async fn unlock_async_with<P>(
        &self,
        deriver: KeyDeriver<P>,
        password: SecretString,
    ) -> KdbxResult<UnlockedKeys>
    where
        P: CryptoProvider + 'static,
    {
        let header = self.header.clone();
        tokio::task::spawn_blocking(move || unlock_header(&deriver, &header, &password))
            .await
            .map_err(|e| KdbxError::Other(anyhow::anyhow!("key derivation task failed: {e}")))?
    }

    /// Authenticate the header with `hmac_key`. Fails with `HeaderIntegrity`
    /// when the password was wrong.
    pub fn verify_header_hmac(&self, hmac_key: &HmacKey) -> KdbxResult<()> {
        verify_header_hmac_with(&RustCryptoProvider, &self.bytes, &self.header, hmac_key)
    }
}

fn unlock_header<P: CryptoProvider>(
    deriver: &KeyDeriver<P>,
    header: &Kdbx4Header,
    password: &SecretString,
) -> KdbxResult<UnlockedKeys> {
    let (encryption_key, hmac_key) = deriver.compute_keys(password, header)?;
    Ok(UnlockedKeys {
        encryption_key,
        hmac_key,
    })
}
