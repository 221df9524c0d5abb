//! kdbx-keys: KDBX4 key derivation and header/block authentication
//!
//! Pipeline:
//! ```text
//! password ─SHA-256∘SHA-256─▶ composite key ─AES-KDF(seed, rounds)─▶ derived key
//!   derived key + master seed ─▶ encryption key (payload cipher)
//!                             └▶ HMAC key ─▶ per-block HMAC keys
//! ```
//!
//! All primitives go through a [`CryptoProvider`]; [`RustCryptoProvider`] is
//! the default. [`Kdbx4`] ties the header parser and the key pipeline
//! together for callers holding a whole file.

pub mod database;
pub mod kdf;
pub mod keys;
pub mod provider;
pub mod secret;

pub use database::{Kdbx4, UnlockedKeys};
pub use kdf::{compute_keys, KeyDeriver, ProgressFn};
pub use keys::{
    compute_block_hmac, compute_block_hmac_key, compute_header_hmac, split_keys,
    verify_header_hmac, HEADER_BLOCK_INDEX,
};
pub use provider::{CryptoProvider, RustCryptoProvider};
pub use secret::{AesKdfLanes, BlockHmacKey, CompositeKey, DerivedKey, EncryptionKey, HmacKey};
