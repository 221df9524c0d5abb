//! Key hierarchy and HMAC authentication
//!
//! ```text
//! derivedKey ─┐
//! masterSeed ─┴─ seedAndKey = masterSeed(32) ++ derivedKey(32) ++ 0x01
//!                  ├── encryptionKey = SHA-256(seedAndKey[0..64])
//!                  └── hmacKey       = SHA-512(seedAndKey)
//!                        └── blockKey(i) = SHA-512(u64le(i) ++ hmacKey)
//!                              ├── header HMAC: i = u64::MAX, message = header bytes
//!                              └── block HMAC:  message = u64le(i) ++ u32le(len) ++ data
//! ```
//!
//! The encryption key hashes only the first 64 bytes while the HMAC key
//! hashes all 65. Both are fixed by the file format.

use kdbx_core::{KdbxError, KdbxResult};
use kdbx_header::{HeaderTrailer, Kdbx4Header};
use zeroize::Zeroizing;

use crate::provider::{CryptoProvider, RustCryptoProvider};
use crate::secret::{BlockHmacKey, DerivedKey, EncryptionKey, HmacKey};

/// Block index whose key authenticates the header.
pub const HEADER_BLOCK_INDEX: u64 = u64::MAX;

const SEED_AND_KEY_LEN: usize = 65;

/// Split a derived key into the payload encryption key and the HMAC root key.
pub fn split_keys_with<P: CryptoProvider>(
    provider: &P,
    master_seed: &[u8; 32],
    derived: &DerivedKey,
) -> (EncryptionKey, HmacKey) {
    let mut seed_and_key = Zeroizing::new([0u8; SEED_AND_KEY_LEN]);
    seed_and_key[..32].copy_from_slice(master_seed);
    seed_and_key[32..64].copy_from_slice(derived.as_bytes());
    seed_and_key[64] = 0x01;

    let encryption = provider.sha256(&[&seed_and_key[..64]]);
    let hmac = provider.sha512(&[&seed_and_key[..]]);
    (EncryptionKey::from_bytes(encryption), HmacKey::from_bytes(hmac))
}

pub fn compute_block_hmac_key_with<P: CryptoProvider>(
    provider: &P,
    block_index: u64,
    hmac_key: &HmacKey,
) -> BlockHmacKey {
    BlockHmacKey::from_bytes(provider.sha512(&[&block_index.to_le_bytes()[..], &hmac_key.as_bytes()[..]]))
}

/// HMAC-SHA256 of `file[..header.size]` under the `u64::MAX` block key.
/// A file shorter than the header fails with `TruncatedInput`.
pub fn compute_header_hmac_with<P: CryptoProvider>(
    provider: &P,
    file: &[u8],
    header: &Kdbx4Header,
    hmac_key: &HmacKey,
) -> KdbxResult<[u8; 32]> {
    let region = header.header_bytes(file)?;
    let key = compute_block_hmac_key_with(provider, HEADER_BLOCK_INDEX, hmac_key);
    provider.hmac_sha256(key.as_bytes(), &[region])
}

/// HMAC-SHA256 of one payload block, bound to its index and length.
pub fn compute_block_hmac_with<P: CryptoProvider>(
    provider: &P,
    block_index: u64,
    block_data: &[u8],
    hmac_key: &HmacKey,
) -> KdbxResult<[u8; 32]> {
    let len = u32::try_from(block_data.len()).map_err(|_| {
        KdbxError::Crypto(format!("block of {} bytes exceeds u32 length", block_data.len()))
    })?;
    let key = compute_block_hmac_key_with(provider, block_index, hmac_key);
    provider.hmac_sha256(
        key.as_bytes(),
        &[&block_index.to_le_bytes()[..], &len.to_le_bytes()[..], block_data],
    )
}

/// Check the HMAC stored after the header. A mismatch with an intact header
/// hash means the password (and so `hmac_key`) is wrong.
pub fn verify_header_hmac_with<P: CryptoProvider>(
    provider: &P,
    file: &[u8],
    header: &Kdbx4Header,
    hmac_key: &HmacKey,
) -> KdbxResult<()> {
    let region = header.header_bytes(file)?;
    let trailer = HeaderTrailer::read(file, header.size)?;
    let key = compute_block_hmac_key_with(provider, HEADER_BLOCK_INDEX, hmac_key);
    if provider.hmac_sha256_verify(key.as_bytes(), &[region], &trailer.hmac)? {
        Ok(())
    } else {
        Err(KdbxError::HeaderIntegrity(
            "header HMAC mismatch (wrong password or tampered header)".into(),
        ))
    }
}

pub fn split_keys(master_seed: &[u8; 32], derived: &DerivedKey) -> (EncryptionKey, HmacKey) {
    split_keys_with(&RustCryptoProvider, master_seed, derived)
}

pub fn compute_block_hmac_key(block_index: u64, hmac_key: &HmacKey) -> BlockHmacKey {
    compute_block_hmac_key_with(&RustCryptoProvider, block_index, hmac_key)
}

pub fn compute_header_hmac(file: &[u8], header: &Kdbx4Header, hmac_key: &HmacKey) -> KdbxResult<[u8; 32]> {
    compute_header_hmac_with(&RustCryptoProvider, file, header, hmac_key)
}

pub fn compute_block_hmac(block_index: u64, block_data: &[u8], hmac_key: &HmacKey) -> KdbxResult<[u8; 32]> {
    compute_block_hmac_with(&RustCryptoProvider, block_index, block_data, hmac_key)
}

pub fn verify_header_hmac(file: &[u8], header: &Kdbx4Header, hmac_key: &HmacKey) -> KdbxResult<()> {
    verify_header_hmac_with(&RustCryptoProvider, file, header, hmac_key)
}
