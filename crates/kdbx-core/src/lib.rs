//! kdbx-core: shared error taxonomy and configuration for the KDBX4 unlock pipeline

pub mod config;
pub mod error;

pub use config::{HeaderConfig, KdfConfig, UnlockConfig, DEFAULT_BATCH_ROUNDS, MAX_BATCH_ROUNDS};
pub use error::{KdbxError, KdbxResult};
