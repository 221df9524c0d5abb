//! Cryptographic primitive provider
//!
//! The key pipeline never calls a hash or cipher directly; it goes through a
//! [`CryptoProvider`] so tests can substitute or instrument the primitives.

use aes::Aes256;
use cbc::cipher::{block_padding::NoPadding, BlockEncryptMut, KeyIvInit};
use hmac::{Hmac, Mac};
use kdbx_core::{KdbxError, KdbxResult};
use sha2::{Digest, Sha256, Sha512};

pub type HmacSha256 = Hmac<Sha256>;

/// The primitives the KDBX4 key pipeline needs.
///
/// Multi-part inputs are hashed as their concatenation.
pub trait CryptoProvider: Send + Sync {
    fn sha256(&self, parts: &[&[u8]]) -> [u8; 32];

    fn sha512(&self, parts: &[&[u8]]) -> [u8; 64];

    fn hmac_sha256(&self, key: &[u8], parts: &[&[u8]]) -> KdbxResult<[u8; 32]>;

    /// Compare `HMAC-SHA256(key, parts)` against `expected` in constant time.
    /// Returns `Ok(false)` on mismatch.
    fn hmac_sha256_verify(&self, key: &[u8], parts: &[&[u8]], expected: &[u8]) -> KdbxResult<bool>;

    /// Encrypt `buf` in place with AES-256-CBC and no padding.
    /// `buf.len()` must be a multiple of 16.
    fn aes256_cbc_encrypt(&self, key: &[u8; 32], iv: &[u8; 16], buf: &mut [u8]) -> KdbxResult<()>;
}

/// RustCrypto-backed provider (`sha2`, `hmac`, `aes` + `cbc`).
#[derive(Debug, Clone, Copy, Default)]
pub struct RustCryptoProvider;

impl RustCryptoProvider {
    fn mac(key: &[u8], parts: &[&[u8]]) -> KdbxResult<HmacSha256> {
        let mut mac = HmacSha256::new_from_slice(key)
            .map_err(|e| KdbxError::Crypto(format!("HMAC-SHA256 key: {e}")))?;
        for part in parts {
            mac.update(part);
        }
        Ok(mac)
    }
}

impl CryptoProvider for RustCryptoProvider {
    fn sha256(&self, parts: &[&[u8]]) -> [u8; 32] {
        let mut hasher = Sha256::new();
        for part in parts {
            hasher.update(part);
        }
        hasher.finalize().into()
    }

    fn sha512(&self, parts: &[&[u8]]) -> [u8; 64] {
        let mut hasher = Sha512::new();
        for part in parts {
            hasher.update(part);
        }
        hasher.finalize().into()
    }

    fn hmac_sha256(&self, key: &[u8], parts: &[&[u8]]) -> KdbxResult<[u8; 32]> {
        Ok(Self::mac(key, parts)?.finalize().into_bytes().into())
    }

    fn hmac_sha256_verify(&self, key: &[u8], parts: &[&[u8]], expected: &[u8]) -> KdbxResult<bool> {
        Ok(Self::mac(key, parts)?.verify_slice(expected).is_ok())
    }

    fn aes256_cbc_encrypt(&self, key: &[u8; 32], iv: &[u8; 16], buf: &mut [u8]) -> KdbxResult<()> {
        let len = buf.len();
        if len % 16 != 0 {
            return Err(KdbxError::Crypto(format!(
                "AES-CBC input must be a multiple of 16 bytes, got {len}"
            )));
        }
        cbc::Encryptor::<Aes256>::new_from_slices(key, iv)
            .map_err(|e| KdbxError::Crypto(format!("AES-256-CBC init: {e}")))?
            .encrypt_padded_mut::<NoPadding>(buf, len)
            .map_err(|e| KdbxError::Crypto(format!("AES-256-CBC encrypt: {e}")))?;
        Ok(())
    }
}
