//! KDBX4 outer header parsing
//!
//! Layout: a fixed 12-byte prologue (two u32 signatures, minor then major
//! u16 version) followed by `id:u8 | size:u32 | value` records ending with
//! id 0. Everything up to and including the terminator record is covered by
//! the header hash and HMAC that trail it.

use kdbx_core::{KdbxError, KdbxResult};
use tracing::{debug, trace};

use crate::codec::ByteReader;
use crate::ids::{CipherId, Compression};
use crate::kdf_params::KdfParams;
use crate::tlv::{decode_records, decode_variant_dictionary};

pub const SIGNATURE1: u32 = 0x9AA2_D903;
pub const SIGNATURE2: u32 = 0xB54B_FB67;
pub const KDBX4_MAJOR: u16 = 4;
pub const PROLOGUE_LEN: usize = 12;
pub const MASTER_SEED_LEN: usize = 32;

/// Outer header field ids. Gaps (5, 6, 8, 9, 10) were used by KDBX3 and are
/// ignored here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OuterField {
    EndOfHeader,
    Comment,
    CipherId,
    CompressionFlag,
    MasterSeed,
    EncryptionIv,
    KdfParams,
    PublicCustomData,
}

impl OuterField {
    pub fn from_id(id: u8) -> Option<Self> {
        match id {
            0 => Some(OuterField::EndOfHeader),
            1 => Some(OuterField::Comment),
            2 => Some(OuterField::CipherId),
            3 => Some(OuterField::CompressionFlag),
            4 => Some(OuterField::MasterSeed),
            7 => Some(OuterField::EncryptionIv),
            11 => Some(OuterField::KdfParams),
            12 => Some(OuterField::PublicCustomData),
            _ => None,
        }
    }

    pub fn id(self) -> u8 {
        match self {
            OuterField::EndOfHeader => 0,
            OuterField::Comment => 1,
            OuterField::CipherId => 2,
            OuterField::CompressionFlag => 3,
            OuterField::MasterSeed => 4,
            OuterField::EncryptionIv => 7,
            OuterField::KdfParams => 11,
            OuterField::PublicCustomData => 12,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            OuterField::EndOfHeader => "endOfHeader",
            OuterField::Comment => "comment",
            OuterField::CipherId => "cipherId",
            OuterField::CompressionFlag => "compressionFlag",
            OuterField::MasterSeed => "masterSeed",
            OuterField::EncryptionIv => "encryptionIv",
            OuterField::KdfParams => "kdfParams",
            OuterField::PublicCustomData => "publicCustomData",
        }
    }
}

/// Parsed KDBX4 outer header. Read-only once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Kdbx4Header {
    /// Offset just past the terminator record; the header region is
    /// `file[..size]`.
    pub size: usize,
    pub signature1: u32,
    pub signature2: u32,
    pub version_major: u16,
    pub version_minor: u16,
    pub cipher_id: CipherId,
    pub compression: Compression,
    pub master_seed: [u8; MASTER_SEED_LEN],
    pub encryption_iv: Vec<u8>,
    pub kdf_params: KdfParams,
    pub public_custom_data: Option<Vec<u8>>,
}

impl Kdbx4Header {
    /// The bytes covered by the header hash and HMAC.
    pub fn header_bytes<'a>(&self, file: &'a [u8]) -> KdbxResult<&'a [u8]> {
        crate::codec::read_slice(file, 0, self.size)
    }

    /// Offset of the first byte after the header trailer (hash + HMAC).
    pub fn payload_offset(&self) -> usize {
        self.size + crate::trailer::TRAILER_LEN
    }
}

#[derive(Default)]
struct RawFields<'a> {
    cipher_id: Option<&'a [u8]>,
    compression: Option<&'a [u8]>,
    master_seed: Option<&'a [u8]>,
    encryption_iv: Option<&'a [u8]>,
    kdf_params: Option<&'a [u8]>,
    public_custom_data: Option<&'a [u8]>,
}

/// Parse the outer header at the start of `bytes`.
///
/// `bytes` may be the whole file; parsing stops at the terminator record.
pub fn parse_header(bytes: &[u8]) -> KdbxResult<Kdbx4Header> {
    let mut prologue = ByteReader::new(bytes);
    let signature1 = prologue.read_u32()?;
    let signature2 = prologue.read_u32()?;
    let version_minor = prologue.read_u16()?;
    let version_major = prologue.read_u16()?;

    if signature1 != SIGNATURE1 || signature2 != SIGNATURE2 {
        return Err(KdbxError::BadMagic {
            signature1,
            signature2,
        });
    }
    if version_major != KDBX4_MAJOR {
        return Err(KdbxError::UnsupportedVersion {
            major: version_major,
            minor: version_minor,
        });
    }

    let (size, records) = decode_records(bytes, PROLOGUE_LEN)?;

    let mut raw = RawFields::default();
    for record in &records {
        let Some(field) = OuterField::from_id(record.id) else {
            trace!(id = record.id, len = record.data.len(), "skipping unrecognized header field");
            continue;
        };
        let slot = match field {
            OuterField::CipherId => &mut raw.cipher_id,
            OuterField::CompressionFlag => &mut raw.compression,
            OuterField::MasterSeed => &mut raw.master_seed,
            OuterField::EncryptionIv => &mut raw.encryption_iv,
            OuterField::KdfParams => &mut raw.kdf_params,
            OuterField::PublicCustomData => &mut raw.public_custom_data,
            OuterField::Comment | OuterField::EndOfHeader => continue,
        };
        *slot = Some(record.data);
    }

    let master_seed = raw
        .master_seed
        .ok_or(KdbxError::MissingField("masterSeed"))?;
    let master_seed: [u8; MASTER_SEED_LEN] = master_seed.try_into().map_err(|_| {
        KdbxError::MalformedHeader(format!(
            "masterSeed must be {MASTER_SEED_LEN} bytes, got {}",
            master_seed.len()
        ))
    })?;
    let encryption_iv = raw
        .encryption_iv
        .ok_or(KdbxError::MissingField("encryptionIv"))?;
    let kdf_blob = raw.kdf_params.ok_or(KdbxError::MissingField("kdfParams"))?;

    let dictionary = decode_variant_dictionary(kdf_blob)?;
    let kdf_params = KdfParams::from_dictionary(&dictionary)?;

    let cipher_id = CipherId::from_bytes(raw.cipher_id.unwrap_or_default())?;
    let compression = Compression::from_bytes(raw.compression.unwrap_or_default())?;

    if encryption_iv.len() != cipher_id.iv_len() {
        return Err(KdbxError::MalformedHeader(format!(
            "encryptionIv for {cipher_id} must be {} bytes, got {}",
            cipher_id.iv_len(),
            encryption_iv.len()
        )));
    }

    debug!(
        size,
        version_major,
        version_minor,
        cipher = %cipher_id,
        compression = %compression,
        kdf = %kdf_params.kind(),
        "parsed KDBX4 header"
    );

    Ok(Kdbx4Header {
        size,
        signature1,
        signature2,
        version_major,
        version_minor,
        cipher_id,
        compression,
        master_seed,
        encryption_iv: encryption_iv.to_vec(),
        kdf_params,
        public_custom_data: raw.public_custom_data.map(<[u8]>::to_vec),
    })
}
