//! # pgpkit
//!
//! An OpenPGP implementation: parsing and writing the binary packet
//! format and ASCII armor, assembling packets into keys and messages,
//! and the signature, encryption and decryption operations over them.
//!
//! The high level entry points live in [`api`]; the layers underneath
//! ([`packet`], [`composed`], [`crypto`], [`armor`]) are public for
//! callers that need more control.
//!
//! ```rust
//! use rand::thread_rng;
//! use pgpkit::api::{encrypt, decrypt, generate_key, read_armored_message,
//!     EncryptOptions, EncryptedMessage, GenerateKeyOptions, UserIdInput};
//! use pgpkit::config::Config;
//!
//! # fn main() -> pgpkit::errors::Result<()> {
//! let mut rng = thread_rng();
//! let config = Config::default();
//!
//! let generated = generate_key(&mut rng, &config, GenerateKeyOptions {
//!     user_ids: vec![UserIdInput::Raw("Me <me@example.org>".to_string())],
//!     passphrase: None,
//!     num_bits: None, // Curve25519
//!     key_expiration_time: None,
//!     unlocked: true,
//! })?;
//!
//! let encrypted = encrypt(&mut rng, &config, EncryptOptions {
//!     data: b"hello world",
//!     public_keys: &[&generated.key],
//!     ..Default::default()
//! })?;
//!
//! let armored = match &encrypted.message {
//!     EncryptedMessage::Armored(text) => text.clone(),
//!     _ => unreachable!(),
//! };
//!
//! let message = read_armored_message(&armored, &config)?;
//! let decrypted = decrypt(&config, &message, &[&generated.key], &[], None, &[])?;
//! assert_eq!(decrypted.data, b"hello world");
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod armor;
pub mod composed;
pub mod config;
pub mod crypto;
pub mod errors;
pub mod keystore;
pub mod normalize_lines;
pub mod packet;
pub mod parsing;
pub mod ser;
pub mod types;

mod util;

pub use crate::composed::{
    CleartextSignedMessage, DetachedSignature, Key, KeyParams, KeyParamsBuilder, KeyType, Message,
    SessionKey, SignatureVerification, UserVerification, Validity,
};
pub use crate::config::Config;
