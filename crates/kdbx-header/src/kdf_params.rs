//! Typed KDF parameters resolved from the `kdfParams` variant dictionary

use std::fmt;

use kdbx_core::{KdbxError, KdbxResult};

use crate::ids::KdfKind;
use crate::tlv::{VariantDictionary, VariantValue};

pub const KDF_PARAM_UUID: &str = "$UUID";
pub const AES_KDF_ROUNDS: &str = "R";
pub const AES_KDF_SEED: &str = "S";
pub const ARGON2_SALT: &str = "S";
pub const ARGON2_PARALLELISM: &str = "P";
pub const ARGON2_MEMORY: &str = "M";
pub const ARGON2_ITERATIONS: &str = "I";
pub const ARGON2_VERSION: &str = "V";
pub const ARGON2_SECRET_KEY: &str = "K";
pub const ARGON2_ASSOCIATED_DATA: &str = "A";

/// AES-KDF: `rounds` sequential AES-256 block encryptions keyed by `seed`.
#[derive(Clone, PartialEq, Eq)]
pub struct AesKdfParams {
    pub rounds: u64,
    pub seed: [u8; 32],
}

impl fmt::Debug for AesKdfParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AesKdfParams")
            .field("rounds", &self.rounds)
            .field("seed", &hex::encode(self.seed))
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Argon2Variant {
    Argon2d,
    Argon2id,
}

/// Argon2 parameters. Parsed and carried so callers can inspect them; no
/// derivation is implemented for this family.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Argon2Params {
    pub variant: Argon2Variant,
    pub salt: Vec<u8>,
    pub parallelism: u32,
    /// Memory in bytes
    pub memory: u64,
    pub iterations: u64,
    pub version: u32,
    pub secret_key: Option<Vec<u8>>,
    pub associated_data: Option<Vec<u8>>,
}

/// The active KDF and its parameters. Built once at parse time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KdfParams {
    AesKdf(AesKdfParams),
    Argon2(Argon2Params),
}

impl KdfParams {
    pub fn kind(&self) -> KdfKind {
        match self {
            KdfParams::AesKdf(_) => KdfKind::AesKdf,
            KdfParams::Argon2(p) => match p.variant {
                Argon2Variant::Argon2d => KdfKind::Argon2d,
                Argon2Variant::Argon2id => KdfKind::Argon2id,
            },
        }
    }

    /// Resolve a decoded dictionary into the variant named by its `$UUID`.
    pub fn from_dictionary(dict: &VariantDictionary<'_>) -> KdbxResult<Self> {
        let uuid = dict
            .get(KDF_PARAM_UUID)
            .ok_or(KdbxError::MissingField("kdfParams.$UUID"))?;

        match KdfKind::from_bytes(uuid.data)? {
            KdfKind::AesKdf => Ok(KdfParams::AesKdf(AesKdfParams {
                rounds: u64_param(dict, AES_KDF_ROUNDS, "kdfParams.R")?,
                seed: seed_param(dict)?,
            })),
            KdfKind::Argon2d => argon2_params(dict, Argon2Variant::Argon2d).map(KdfParams::Argon2),
            KdfKind::Argon2id => {
                argon2_params(dict, Argon2Variant::Argon2id).map(KdfParams::Argon2)
            }
        }
    }
}

fn required<'d, 'a>(
    dict: &'d VariantDictionary<'a>,
    key: &str,
    field: &'static str,
) -> KdbxResult<&'d VariantValue<'a>> {
    dict.get(key).ok_or(KdbxError::MissingField(field))
}

fn u64_param(dict: &VariantDictionary<'_>, key: &str, field: &'static str) -> KdbxResult<u64> {
    let value = required(dict, key, field)?;
    value.as_u64().ok_or_else(|| {
        KdbxError::MalformedHeader(format!(
            "{field} must be 8 bytes, got {}",
            value.data.len()
        ))
    })
}

fn u32_param(dict: &VariantDictionary<'_>, key: &str, field: &'static str) -> KdbxResult<u32> {
    let value = required(dict, key, field)?;
    value.as_u32().ok_or_else(|| {
        KdbxError::MalformedHeader(format!(
            "{field} must be 4 bytes, got {}",
            value.data.len()
        ))
    })
}

fn seed_param(dict: &VariantDictionary<'_>) -> KdbxResult<[u8; 32]> {
    let value = required(dict, AES_KDF_SEED, "kdfParams.S")?;
    value.data.try_into().map_err(|_| {
        KdbxError::MalformedHeader(format!(
            "kdfParams.S must be 32 bytes, got {}",
            value.data.len()
        ))
    })
}

fn argon2_params(dict: &VariantDictionary<'_>, variant: Argon2Variant) -> KdbxResult<Argon2Params> {
    Ok(Argon2Params {
        variant,
        salt: required(dict, ARGON2_SALT, "kdfParams.S")?.data.to_vec(),
        parallelism: u32_param(dict, ARGON2_PARALLELISM, "kdfParams.P")?,
        memory: u64_param(dict, ARGON2_MEMORY, "kdfParams.M")?,
        iterations: u64_param(dict, ARGON2_ITERATIONS, "kdfParams.I")?,
        version: u32_param(dict, ARGON2_VERSION, "kdfParams.V")?,
        secret_key: dict.get(ARGON2_SECRET_KEY).map(|v| v.data.to_vec()),
        associated_data: dict.get(ARGON2_ASSOCIATED_DATA).map(|v| v.data.to_vec()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::{KDF_AES, KDF_ARGON2D, KDF_ARGON2ID};
    use crate::tlv::{decode_variant_dictionary, value_type, VARIANT_DICTIONARY_VERSION};

    fn dict_bytes(entries: &[(u8, &str, Vec<u8>)]) -> Vec<u8> {
        let mut buf = VARIANT_DICTIONARY_VERSION.to_le_bytes().to_vec();
        for (kind, key, value) in entries {
            buf.push(*kind);
            buf.extend_from_slice(&(key.len() as u32).to_le_bytes());
            buf.extend_from_slice(key.as_bytes());
            buf.extend_from_slice(&(value.len() as u32).to_le_bytes());
            buf.extend_from_slice(value);
        }
        buf.push(value_type::END);
        buf
    }

    fn resolve(entries: &[(u8, &str, Vec<u8>)]) -> KdbxResult<KdfParams> {
        let bytes = dict_bytes(entries);
        let dict = decode_variant_dictionary(&bytes)?;
        KdfParams::from_dictionary(&dict)
    }

    fn argon_entries(uuid: uuid::Uuid) -> Vec<(u8, &'static str, Vec<u8>)> {
        vec![
            (value_type::BYTE_ARRAY, "$UUID", uuid.as_bytes().to_vec()),
            (value_type::BYTE_ARRAY, "S", vec![5u8; 32]),
            (value_type::UINT32, "P", 2u32.to_le_bytes().to_vec()),
            (value_type::UINT64, "M", (64u64 << 20).to_le_bytes().to_vec()),
            (value_type::UINT64, "I", 3u64.to_le_bytes().to_vec()),
            (value_type::UINT32, "V", 0x13u32.to_le_bytes().to_vec()),
        ]
    }

    #[test]
    fn resolves_aes_kdf() {
        let params = resolve(&[
            (value_type::BYTE_ARRAY, "$UUID", KDF_AES.as_bytes().to_vec()),
            (value_type::UINT64, "R", 60_000u64.to_le_bytes().to_vec()),
            (value_type::BYTE_ARRAY, "S", vec![0xAB; 32]),
        ])
        .unwrap();

        assert_eq!(
            params,
            KdfParams::AesKdf(AesKdfParams {
                rounds: 60_000,
                seed: [0xAB; 32],
            })
        );
        assert_eq!(params.kind(), KdfKind::AesKdf);
    }

    #[test]
    fn aes_kdf_requires_rounds_and_seed() {
        let err = resolve(&[
            (value_type::BYTE_ARRAY, "$UUID", KDF_AES.as_bytes().to_vec()),
            (value_type::BYTE_ARRAY, "S", vec![0xAB; 32]),
        ])
        .unwrap_err();
        assert!(matches!(err, KdbxError::MissingField("kdfParams.R")));

        let err = resolve(&[
            (value_type::BYTE_ARRAY, "$UUID", KDF_AES.as_bytes().to_vec()),
            (value_type::UINT64, "R", 1u64.to_le_bytes().to_vec()),
        ])
        .unwrap_err();
        assert!(matches!(err, KdbxError::MissingField("kdfParams.S")));
    }

    #[test]
    fn aes_kdf_seed_must_be_32_bytes() {
        let err = resolve(&[
            (value_type::BYTE_ARRAY, "$UUID", KDF_AES.as_bytes().to_vec()),
            (value_type::UINT64, "R", 1u64.to_le_bytes().to_vec()),
            (value_type::BYTE_ARRAY, "S", vec![0xAB; 16]),
        ])
        .unwrap_err();
        assert!(matches!(err, KdbxError::MalformedHeader(_)));
    }

    #[test]
    fn aes_kdf_rounds_must_be_u64() {
        let err = resolve(&[
            (value_type::BYTE_ARRAY, "$UUID", KDF_AES.as_bytes().to_vec()),
            (value_type::UINT32, "R", 1u32.to_le_bytes().to_vec()),
            (value_type::BYTE_ARRAY, "S", vec![0xAB; 32]),
        ])
        .unwrap_err();
        assert!(matches!(err, KdbxError::MalformedHeader(_)));
    }

    #[test]
    fn resolves_argon2_variants() {
        let params = resolve(&argon_entries(KDF_ARGON2D)).unwrap();
        let KdfParams::Argon2(argon) = &params else {
            panic!("expected Argon2, got {params:?}");
        };
        assert_eq!(argon.variant, Argon2Variant::Argon2d);
        assert_eq!(argon.salt, vec![5u8; 32]);
        assert_eq!(argon.parallelism, 2);
        assert_eq!(argon.memory, 64 << 20);
        assert_eq!(argon.iterations, 3);
        assert_eq!(argon.version, 0x13);
        assert_eq!(argon.secret_key, None);
        assert_eq!(argon.associated_data, None);
        assert_eq!(params.kind(), KdfKind::Argon2d);

        let params = resolve(&argon_entries(KDF_ARGON2ID)).unwrap();
        assert_eq!(params.kind(), KdfKind::Argon2id);
    }

    #[test]
    fn argon2_optional_fields() {
        let mut entries = argon_entries(KDF_ARGON2ID);
        entries.push((value_type::BYTE_ARRAY, "K", vec![1, 2, 3]));
        entries.push((value_type::BYTE_ARRAY, "A", vec![4, 5]));

        let KdfParams::Argon2(argon) = resolve(&entries).unwrap() else {
            panic!("expected Argon2");
        };
        assert_eq!(argon.secret_key, Some(vec![1, 2, 3]));
        assert_eq!(argon.associated_data, Some(vec![4, 5]));
    }

    #[test]
    fn argon2_missing_parallelism() {
        let entries: Vec<_> = argon_entries(KDF_ARGON2D)
            .into_iter()
            .filter(|(_, key, _)| *key != "P")
            .collect();
        let err = resolve(&entries).unwrap_err();
        assert!(matches!(err, KdbxError::MissingField("kdfParams.P")));
    }

    #[test]
    fn missing_uuid() {
        let err = resolve(&[(value_type::UINT64, "R", 1u64.to_le_bytes().to_vec())]).unwrap_err();
        assert!(matches!(err, KdbxError::MissingField("kdfParams.$UUID")));
    }

    #[test]
    fn unknown_kdf_uuid() {
        let err = resolve(&[(value_type::BYTE_ARRAY, "$UUID", vec![0x11; 16])]).unwrap_err();
        assert!(matches!(err, KdbxError::UnknownKdf(_)));
    }

    #[test]
    fn debug_shows_seed_as_hex() {
        let params = AesKdfParams {
            rounds: 1,
            seed: [0xff; 32],
        };
        let dbg = format!("{params:?}");
        assert!(dbg.contains(&"ff".repeat(32)), "{dbg}");
    }
}
