//! Key derivation: password → composite key → derived key
//!
//! AES-KDF applies `rounds` AES-256 encryptions to each 16-byte half of the
//! composite key. Encrypting `n` zero blocks in CBC mode with the lane as IV
//! yields, in its last block, the lane after `n` rounds, so each batch is a
//! single CBC call. The derived key is `SHA-256(lane1 ++ lane2)`.

use std::sync::Arc;
use std::time::Instant;

use kdbx_core::{KdbxError, KdbxResult, KdfConfig};
use kdbx_header::{AesKdfParams, Kdbx4Header, KdfParams};
use secrecy::{ExposeSecret, SecretString};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};
use zeroize::{Zeroize, Zeroizing};

use crate::keys::split_keys_with;
use crate::provider::{CryptoProvider, RustCryptoProvider};
use crate::secret::{AesKdfLanes, CompositeKey, DerivedKey, EncryptionKey, HmacKey};

const BLOCK_LEN: usize = 16;

/// Progress callback: `(rounds_done, rounds_total)`, called after each batch.
pub type ProgressFn = Arc<dyn Fn(u64, u64) + Send + Sync>;

/// Runs the composite-key and KDF steps over an injected [`CryptoProvider`].
#[derive(Clone)]
pub struct KeyDeriver<P = RustCryptoProvider> {
    provider: P,
    config: KdfConfig,
    cancel: Option<CancellationToken>,
    progress: Option<ProgressFn>,
}

impl KeyDeriver<RustCryptoProvider> {
    pub fn new() -> Self {
        Self::with_provider(RustCryptoProvider)
    }
}

impl Default for KeyDeriver<RustCryptoProvider> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: CryptoProvider> KeyDeriver<P> {
    pub fn with_provider(provider: P) -> Self {
        Self {
            provider,
            config: KdfConfig::default(),
            cancel: None,
            progress: None,
        }
    }

    pub fn with_config(mut self, config: KdfConfig) -> Self {
        self.config = config;
        self
    }

    /// Checked before every batch. A batch in flight always completes.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn with_progress(mut self, progress: impl Fn(u64, u64) + Send + Sync + 'static) -> Self {
        self.progress = Some(Arc::new(progress));
        self
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn config(&self) -> &KdfConfig {
        &self.config
    }

    /// `SHA-256(SHA-256(password))`
    pub fn composite_key(&self, password: &SecretString) -> CompositeKey {
        self.composite_key_from_bytes(password.expose_secret().as_bytes())
    }

    pub fn composite_key_from_bytes(&self, password: &[u8]) -> CompositeKey {
        let inner = Zeroizing::new(self.provider.sha256(&[password]));
        CompositeKey::from_bytes(self.provider.sha256(&[inner.as_slice()]))
    }

    /// Run the KDF named by `params` over `composite`.
    pub fn derive_key(&self, composite: &CompositeKey, params: &KdfParams) -> KdbxResult<DerivedKey> {
        match params {
            KdfParams::AesKdf(aes) => self.aes_kdf(composite, aes),
            KdfParams::Argon2(_) => {
                let kind = params.kind();
                warn!(kdf = %kind, "Argon2 key derivation is not supported");
                Err(KdbxError::UnsupportedKdf(kind.name()))
            }
        }
    }

    /// Password and parsed header to `(encryptionKey, hmacKey)`.
    pub fn compute_keys(
        &self,
        password: &SecretString,
        header: &Kdbx4Header,
    ) -> KdbxResult<(EncryptionKey, HmacKey)> {
        let composite = self.composite_key(password);
        let derived = self.derive_key(&composite, &header.kdf_params)?;
        Ok(split_keys_with(&self.provider, &header.master_seed, &derived))
    }

    /// AES-KDF derived key: SHA-256 over the two final lanes.
    pub fn aes_kdf(&self, composite: &CompositeKey, params: &AesKdfParams) -> KdbxResult<DerivedKey> {
        let lanes = self.aes_kdf_lanes(composite, params)?;
        Ok(DerivedKey::from_bytes(self.provider.sha256(&[&lanes.as_bytes()[..]])))
    }

    /// The two 16-byte lanes after `params.rounds` rounds, before hashing.
    ///
    /// Lanes can be fed back in as a composite key to resume derivation.
    pub fn aes_kdf_lanes(
        &self,
        composite: &CompositeKey,
        params: &AesKdfParams,
    ) -> KdbxResult<AesKdfLanes> {
        self.config.validate()?;

        let total = params.rounds;
        let batch_rounds = self.config.batch_rounds;
        let started = Instant::now();
        debug!(
            rounds = total,
            batch_rounds,
            parallel = self.config.parallel_lanes,
            "AES-KDF starting"
        );

        let key = composite.as_bytes();
        let mut left = Lane::new(&key[..BLOCK_LEN], total, batch_rounds)?;
        let mut right = Lane::new(&key[BLOCK_LEN..], total, batch_rounds)?;

        let mut done = 0u64;
        while done < total {
            if let Some(token) = &self.cancel {
                if token.is_cancelled() {
                    warn!(rounds_done = done, rounds = total, "AES-KDF cancelled");
                    return Err(KdbxError::Cancelled { rounds_done: done });
                }
            }

            let batch = (total - done).min(batch_rounds);
            let seed = &params.seed;
            if self.config.parallel_lanes {
                let (l, r) = rayon::join(
                    || left.advance(&self.provider, seed, batch),
                    || right.advance(&self.provider, seed, batch),
                );
                l?;
                r?;
            } else {
                left.advance(&self.provider, seed, batch)?;
                right.advance(&self.provider, seed, batch)?;
            }
            done += batch;

            trace!(batch, rounds_done = done, rounds = total, "AES-KDF batch");
            if let Some(progress) = &self.progress {
                progress(done, total);
            }
        }

        let mut lanes = [0u8; 32];
        lanes[..BLOCK_LEN].copy_from_slice(&left.state);
        lanes[BLOCK_LEN..].copy_from_slice(&right.state);

        debug!(
            rounds = total,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "AES-KDF finished"
        );
        Ok(AesKdfLanes::from_bytes(lanes))
    }
}

/// [`KeyDeriver::compute_keys`] with the default provider and KDF config.
pub fn compute_keys(
    password: &SecretString,
    header: &Kdbx4Header,
) -> KdbxResult<(EncryptionKey, HmacKey)> {
    KeyDeriver::new().compute_keys(password, header)
}

/// One 16-byte half of the AES-KDF state plus its reusable CBC buffer.
struct Lane {
    state: [u8; BLOCK_LEN],
    scratch: Vec<u8>,
}

impl Lane {
    fn new(initial: &[u8], total: u64, batch_rounds: u64) -> KdbxResult<Self> {
        let mut state = [0u8; BLOCK_LEN];
        state.copy_from_slice(initial);
        let scratch_len = batch_len(total.min(batch_rounds))?;
        Ok(Self {
            state,
            scratch: vec![0u8; scratch_len],
        })
    }

    fn advance<P: CryptoProvider>(&mut self, provider: &P, seed: &[u8; 32], rounds: u64) -> KdbxResult<()> {
        let len = batch_len(rounds)?;
        let buf = &mut self.scratch[..len];
        buf.fill(0);
        provider.aes256_cbc_encrypt(seed, &self.state, buf)?;
        self.state.copy_from_slice(&buf[len - BLOCK_LEN..]);
        Ok(())
    }
}

impl Drop for Lane {
    fn drop(&mut self) {
        self.state.zeroize();
        self.scratch.zeroize();
    }
}

fn batch_len(rounds: u64) -> KdbxResult<usize> {
    usize::try_from(rounds)
        .ok()
        .and_then(|r| r.checked_mul(BLOCK_LEN))
        .ok_or_else(|| KdbxError::Config(format!("kdf.batch_rounds {rounds} is too large")))
}
