use thiserror::Error;

pub type KdbxResult<T> = Result<T, KdbxError>;

/// Every failure the header parser and key pipeline can report.
///
/// All variants are recoverable decode-time errors; a wrong password is not
/// one of them (it yields a well-formed but useless key, caught later by the
/// header HMAC check).
#[derive(Debug, Error)]
pub enum KdbxError {
    #[error("truncated input: need {needed} bytes at offset {offset}, buffer has {len}")]
    TruncatedInput {
        offset: usize,
        needed: usize,
        len: usize,
    },

    #[error("malformed header: {0}")]
    MalformedHeader(String),

    #[error("bad magic: signatures {signature1:#010x} {signature2:#010x}")]
    BadMagic { signature1: u32, signature2: u32 },

    #[error("unsupported KDBX version {major}.{minor}")]
    UnsupportedVersion { major: u16, minor: u16 },

    #[error("missing header field: {0}")]
    MissingField(&'static str),

    #[error("unknown cipher: {0}")]
    UnknownCipher(String),

    #[error("unknown compression flag: {0}")]
    UnknownCompression(String),

    #[error("unknown KDF: {0}")]
    UnknownKdf(String),

    #[error("KDF {0} is recognized but not supported")]
    UnsupportedKdf(&'static str),

    #[error("key derivation cancelled after {rounds_done} rounds")]
    Cancelled { rounds_done: u64 },

    #[error("header integrity check failed: {0}")]
    HeaderIntegrity(String),

    #[error("crypto error: {0}")]
    Crypto(String),

    #[error("encoding error: {0}")]
    Encoding(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl KdbxError {
    /// True for errors caused by the input bytes themselves (as opposed to
    /// configuration, I/O or cancellation).
    pub fn is_format_error(&self) -> bool {
        matches!(
            self,
            KdbxError::TruncatedInput { .. }
                | KdbxError::MalformedHeader(_)
                | KdbxError::BadMagic { .. }
                | KdbxError::UnsupportedVersion { .. }
                | KdbxError::MissingField(_)
                | KdbxError::UnknownCipher(_)
                | KdbxError::UnknownCompression(_)
                | KdbxError::UnknownKdf(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bad_magic_display_is_hex() {
        let err = KdbxError::BadMagic {
            signature1: 0x9AA2D903,
            signature2: 0x0000_0001,
        };
        assert_eq!(
            err.to_string(),
            "bad magic: signatures 0x9aa2d903 0x00000001"
        );
    }

    #[test]
    fn test_format_error_classification() {
        assert!(KdbxError::MissingField("masterSeed").is_format_error());
        assert!(KdbxError::TruncatedInput { offset: 0, needed: 4, len: 2 }.is_format_error());
        assert!(!KdbxError::Cancelled { rounds_done: 10 }.is_format_error());
        assert!(!KdbxError::UnsupportedKdf("Argon2d").is_format_error());
    }

    #[test]
    fn test_io_error_converts() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: KdbxError = io.into();
        assert!(matches!(err, KdbxError::Io(_)));
    }
}
