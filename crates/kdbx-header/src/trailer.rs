//! The 64 bytes stored right after the header: SHA-256 of the header
//! followed by its HMAC-SHA256.

use kdbx_core::{KdbxError, KdbxResult};
use sha2::{Digest, Sha256};

use crate::codec::read_array;
use crate::header::Kdbx4Header;

pub const HEADER_HASH_LEN: usize = 32;
pub const HEADER_HMAC_LEN: usize = 32;
pub const TRAILER_LEN: usize = HEADER_HASH_LEN + HEADER_HMAC_LEN;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeaderTrailer {
    pub sha256: [u8; HEADER_HASH_LEN],
    pub hmac: [u8; HEADER_HMAC_LEN],
}

impl HeaderTrailer {
    /// Read the trailer that starts at `size`, the end of the header region.
    pub fn read(file: &[u8], size: usize) -> KdbxResult<Self> {
        Ok(Self {
            sha256: read_array(file, size)?,
            hmac: read_array(file, size + HEADER_HASH_LEN)?,
        })
    }
}

/// Check the stored SHA-256 against `file[..header.size]`.
///
/// This only detects corruption. The HMAC is what authenticates the header
/// and it needs the derived keys.
pub fn verify_header_hash(file: &[u8], header: &Kdbx4Header) -> KdbxResult<()> {
    let trailer = HeaderTrailer::read(file, header.size)?;
    let actual: [u8; HEADER_HASH_LEN] = Sha256::digest(header.header_bytes(file)?).into();

    if actual != trailer.sha256 {
        return Err(KdbxError::HeaderIntegrity(format!(
            "header SHA-256 mismatch: stored {}, computed {}",
            hex::encode(trailer.sha256),
            hex::encode(actual)
        )));
    }
    Ok(())
}
