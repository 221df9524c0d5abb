//! Fixed identifier tables: cipher UUIDs, compression flags, KDF UUIDs

use std::fmt;

use kdbx_core::{KdbxError, KdbxResult};
use uuid::Uuid;

pub const CIPHER_AES256_CBC: Uuid = Uuid::from_u128(0x31c1f2e6_bf71_4350_be58_05216afc5aff);
pub const CIPHER_CHACHA20: Uuid = Uuid::from_u128(0xd6038a2b_8b6f_4cb5_a524_339a31dbb59a);

pub const KDF_AES: Uuid = Uuid::from_u128(0xc9d9f39a_628a_4460_bf74_0d08c18a4fea);
pub const KDF_ARGON2D: Uuid = Uuid::from_u128(0xef636ddf_8c29_444b_91f7_a9a403e30a0c);
pub const KDF_ARGON2ID: Uuid = Uuid::from_u128(0x9e298b19_56db_4773_b23d_fc3ec6f0a1e6);

/// Render an identifier for error messages: hyphenated UUID if it is 16
/// bytes, hex otherwise.
pub fn describe_id(bytes: &[u8]) -> String {
    match Uuid::from_slice(bytes) {
        Ok(uuid) => uuid.to_string(),
        Err(_) if bytes.is_empty() => "<empty>".into(),
        Err(_) => format!("0x{} ({} bytes)", hex::encode(bytes), bytes.len()),
    }
}

/// Payload cipher named by the `cipherId` outer field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CipherId {
    Aes256Cbc,
    ChaCha20,
}

impl CipherId {
    /// Resolve raw field bytes. An absent field arrives as an empty slice and
    /// always fails.
    pub fn from_bytes(bytes: &[u8]) -> KdbxResult<Self> {
        match Uuid::from_slice(bytes) {
            Ok(id) if id == CIPHER_AES256_CBC => Ok(CipherId::Aes256Cbc),
            Ok(id) if id == CIPHER_CHACHA20 => Ok(CipherId::ChaCha20),
            _ => Err(KdbxError::UnknownCipher(describe_id(bytes))),
        }
    }

    pub fn uuid(self) -> Uuid {
        match self {
            CipherId::Aes256Cbc => CIPHER_AES256_CBC,
            CipherId::ChaCha20 => CIPHER_CHACHA20,
        }
    }

    /// Length of the `encryptionIv` field this cipher expects.
    pub fn iv_len(self) -> usize {
        match self {
            CipherId::Aes256Cbc => 16,
            CipherId::ChaCha20 => 12,
        }
    }
}

impl fmt::Display for CipherId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CipherId::Aes256Cbc => "AES256-CBC",
            CipherId::ChaCha20 => "CHACHA20",
        })
    }
}

/// Payload compression named by the `compressionFlag` outer field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Compression {
    None,
    Gzip,
}

impl Compression {
    /// Resolve the flag from its little-endian u16 prefix. KeePass writes the
    /// field as a u32, so trailing bytes are ignored.
    pub fn from_bytes(bytes: &[u8]) -> KdbxResult<Self> {
        let flag = match bytes {
            [lo, hi, ..] => u16::from_le_bytes([*lo, *hi]),
            _ => return Err(KdbxError::UnknownCompression(describe_id(bytes))),
        };
        match flag {
            0 => Ok(Compression::None),
            1 => Ok(Compression::Gzip),
            other => Err(KdbxError::UnknownCompression(other.to_string())),
        }
    }
}

impl fmt::Display for Compression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Compression::None => "none",
            Compression::Gzip => "gzip",
        })
    }
}

/// Key derivation function named by the `$UUID` KDF parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KdfKind {
    AesKdf,
    Argon2d,
    Argon2id,
}

impl KdfKind {
    pub fn from_bytes(bytes: &[u8]) -> KdbxResult<Self> {
        match Uuid::from_slice(bytes) {
            Ok(id) if id == KDF_AES => Ok(KdfKind::AesKdf),
            Ok(id) if id == KDF_ARGON2D => Ok(KdfKind::Argon2d),
            Ok(id) if id == KDF_ARGON2ID => Ok(KdfKind::Argon2id),
            _ => Err(KdbxError::UnknownKdf(describe_id(bytes))),
        }
    }

    pub fn uuid(self) -> Uuid {
        match self {
            KdfKind::AesKdf => KDF_AES,
            KdfKind::Argon2d => KDF_ARGON2D,
            KdfKind::Argon2id => KDF_ARGON2ID,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            KdfKind::AesKdf => "AES-KDF",
            KdfKind::Argon2d => "Argon2d",
            KdfKind::Argon2id => "Argon2id",
        }
    }
}

impl fmt::Display for KdfKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uuid_constants_match_file_byte_order() {
        assert_eq!(
            CIPHER_AES256_CBC.as_bytes(),
            &[
                0x31, 0xc1, 0xf2, 0xe6, 0xbf, 0x71, 0x43, 0x50, 0xbe, 0x58, 0x05, 0x21, 0x6a,
                0xfc, 0x5a, 0xff
            ]
        );
        assert_eq!(KDF_AES.to_string(), "c9d9f39a-628a-4460-bf74-0d08c18a4fea");
        assert_eq!(KDF_ARGON2D.to_string(), "ef636ddf-8c29-444b-91f7-a9a403e30a0c");
        assert_eq!(KDF_ARGON2ID.to_string(), "9e298b19-56db-4773-b23d-fc3ec6f0a1e6");
        assert_eq!(CIPHER_CHACHA20.to_string(), "d6038a2b-8b6f-4cb5-a524-339a31dbb59a");
    }

    #[test]
    fn resolves_ciphers() {
        assert_eq!(
            CipherId::from_bytes(CIPHER_AES256_CBC.as_bytes()).unwrap(),
            CipherId::Aes256Cbc
        );
        assert_eq!(
            CipherId::from_bytes(CIPHER_CHACHA20.as_bytes()).unwrap(),
            CipherId::ChaCha20
        );
        assert_eq!(CipherId::ChaCha20.uuid(), CIPHER_CHACHA20);
        assert_eq!(CipherId::Aes256Cbc.to_string(), "AES256-CBC");
    }

    #[test]
    fn absent_cipher_never_defaults() {
        let err = CipherId::from_bytes(&[]).unwrap_err();
        assert!(matches!(err, KdbxError::UnknownCipher(ref s) if s == "<empty>"));
    }

    #[test]
    fn kdf_uuid_is_not_a_cipher() {
        let err = CipherId::from_bytes(KDF_AES.as_bytes()).unwrap_err();
        assert!(
            matches!(err, KdbxError::UnknownCipher(ref s) if s == "c9d9f39a-628a-4460-bf74-0d08c18a4fea")
        );
    }

    #[test]
    fn short_id_is_described_as_hex() {
        assert_eq!(describe_id(&[0xab, 0xcd]), "0xabcd (2 bytes)");
    }

    #[test]
    fn resolves_compression() {
        assert_eq!(Compression::from_bytes(&[0, 0]).unwrap(), Compression::None);
        assert_eq!(Compression::from_bytes(&[1, 0, 0, 0]).unwrap(), Compression::Gzip);
        assert!(matches!(
            Compression::from_bytes(&[2, 0]),
            Err(KdbxError::UnknownCompression(_))
        ));
        assert!(matches!(
            Compression::from_bytes(&[]),
            Err(KdbxError::UnknownCompression(_))
        ));
        assert!(matches!(
            Compression::from_bytes(&[1]),
            Err(KdbxError::UnknownCompression(_))
        ));
    }

    #[test]
    fn resolves_kdfs() {
        assert_eq!(KdfKind::from_bytes(KDF_AES.as_bytes()).unwrap(), KdfKind::AesKdf);
        assert_eq!(KdfKind::from_bytes(KDF_ARGON2D.as_bytes()).unwrap(), KdfKind::Argon2d);
        assert_eq!(KdfKind::from_bytes(KDF_ARGON2ID.as_bytes()).unwrap(), KdfKind::Argon2id);
        assert!(matches!(
            KdfKind::from_bytes(&[0u8; 16]),
            Err(KdbxError::UnknownKdf(_))
        ));
        assert_eq!(KdfKind::Argon2id.uuid(), KDF_ARGON2ID);
    }

    #[test]
    fn cipher_iv_lengths() {
        assert_eq!(CipherId::Aes256Cbc.iv_len(), 16);
        assert_eq!(CipherId::ChaCha20.iv_len(), 12);
    }
}
