//! kdbx-header: KDBX4 outer header parsing
//!
//! ```text
//! offset 0   u32 signature1 (0x9AA2D903)
//! offset 4   u32 signature2 (0xB54BFB67)
//! offset 8   u16 minor version
//! offset 10  u16 major version (4)
//! offset 12  [id:u8][size:u32][value] ... [0][size][value]   <- header.size ends here
//!            [sha256:32][hmac-sha256:32]                      <- HeaderTrailer
//!            encrypted payload blocks
//! ```
//!
//! The `kdfParams` field holds a nested variant dictionary, resolved into a
//! typed [`KdfParams`] at parse time.

pub mod codec;
pub mod header;
pub mod ids;
pub mod kdf_params;
pub mod tlv;
pub mod trailer;

pub use header::{parse_header, Kdbx4Header, OuterField, KDBX4_MAJOR, SIGNATURE1, SIGNATURE2};
pub use ids::{CipherId, Compression, KdfKind};
pub use kdf_params::{AesKdfParams, Argon2Params, Argon2Variant, KdfParams};
pub use tlv::{decode_records, decode_variant_dictionary, RawRecord, VariantDictionary};
pub use trailer::{verify_header_hash, HeaderTrailer, TRAILER_LEN};
