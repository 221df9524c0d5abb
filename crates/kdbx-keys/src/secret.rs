//! Fixed-size key newtypes, zeroized on drop and redacted in `Debug`.

use zeroize::Zeroize;

macro_rules! secret_key {
    ($(#[$doc:meta])* $name:ident, $len:expr) => {
        $(#[$doc])*
        #[derive(Clone)]
        pub struct $name {
            bytes: [u8; $len],
        }

        impl $name {
            pub const LEN: usize = $len;

            pub fn from_bytes(bytes: [u8; $len]) -> Self {
                Self { bytes }
            }

            pub fn as_bytes(&self) -> &[u8; $len] {
                &self.bytes
            }
        }

        impl Drop for $name {
            fn drop(&mut self) {
                self.bytes.zeroize();
            }
        }

        impl std::fmt::Debug for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.debug_struct(stringify!($name))
                    .field("bytes", &"[REDACTED]")
                    .finish()
            }
        }
    };
}

secret_key!(
    /// `SHA-256(SHA-256(password))`, the KDF input.
    CompositeKey,
    32
);

secret_key!(
    /// KDF output. For AES-KDF this is `SHA-256` of the two final lanes.
    DerivedKey,
    32
);

secret_key!(
    /// AES-KDF state: the two 16-byte lanes, unhashed.
    AesKdfLanes,
    32
);

secret_key!(
    /// Payload cipher key: `SHA-256(masterSeed ++ derivedKey)`.
    EncryptionKey,
    32
);

secret_key!(
    /// Root of the HMAC tree: `SHA-512(masterSeed ++ derivedKey ++ 0x01)`.
    HmacKey,
    64
);

secret_key!(
    /// Per-block HMAC key: `SHA-512(u64le(index) ++ hmacKey)`.
    BlockHmacKey,
    64
);

impl From<AesKdfLanes> for CompositeKey {
    /// Feed intermediate lanes back in as a KDF input, so that derivation can
    /// be resumed in stages.
    fn from(key: AesKdfLanes) -> Self {
        CompositeKey::from_bytes(*key.as_bytes())
    }
}
