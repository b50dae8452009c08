//! Explicit configuration, threaded through every top level call.
//!
//! There is no mutable global state: callers that need different behavior
//! for a single call construct a second `Config` value for that call.

use crate::crypto::aead::AeadAlgorithm;
use crate::crypto::sym::SymmetricKeyAlgorithm;
use crate::types::CompressionAlgorithm;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Fail dearmoring when the CRC-24 checksum line is absent.
    pub checksum_required: bool,
    /// Drop unparseable packets from a stream instead of aborting the
    /// whole decode. Structural framing errors still abort.
    pub tolerant: bool,
    /// Treat expired keys and signatures as still usable for verification.
    pub verify_expired_keys: bool,
    /// Prefer platform accelerated primitives where available.
    /// Currently informational.
    pub use_native: bool,
    /// Produce AEAD protected data packets when encrypting.
    pub aead_protect: bool,
    /// AEAD mode used when `aead_protect` is set.
    pub aead_mode: AeadAlgorithm,
    /// Chunk size octet `c` for AEAD encryption; chunks are `1 << (c + 6)` bytes.
    pub aead_chunk_size: u8,
    /// Produce integrity protected (MDC) data packets when encrypting.
    /// Ignored when `aead_protect` is set.
    pub integrity_protect: bool,
    /// Symmetric cipher for message encryption.
    pub encryption_cipher: SymmetricKeyAlgorithm,
    /// Compression applied to messages before encryption.
    pub compression: CompressionAlgorithm,
    /// Emit a `Version:` armor header.
    pub show_version: bool,
    /// Optional `Comment:` armor header.
    pub comment: Option<String>,
    /// Default keyserver address for the keyserver collaborator.
    pub keyserver: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            checksum_required: false,
            tolerant: true,
            verify_expired_keys: false,
            use_native: false,
            aead_protect: false,
            aead_mode: AeadAlgorithm::Eax,
            aead_chunk_size: 12,
            integrity_protect: true,
            encryption_cipher: SymmetricKeyAlgorithm::AES256,
            compression: CompressionAlgorithm::Uncompressed,
            show_version: false,
            comment: None,
            keyserver: "hkps://keyserver.ubuntu.com".to_string(),
        }
    }
}

impl Config {
    /// Version string for the armor header, when `show_version` is set.
    pub fn version_string(&self) -> String {
        format!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"))
    }
}
