//! Stateless high level entry points, wiring keys, messages and
//! configuration together. This is the surface external callers (and an
//! optional worker delegation layer) program against.

use log::debug;
use rand::{CryptoRng, Rng};

use crate::composed::{
    CleartextSignedMessage, Deserializable, DetachedSignature, Esk, Key, KeyParamsBuilder,
    KeyType, Message, SessionKey, SignatureVerification, UserVerification,
};
use crate::config::Config;
use crate::crypto::hash::HashAlgorithm;
use crate::errors::{Error, Result};
use crate::ser::Serialize;

/// A structured user id. At least one of name and email must be
/// present, and each present part must be well formed on its own.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserIdInfo {
    pub name: Option<String>,
    pub email: Option<String>,
}

impl UserIdInfo {
    /// The `Name <email>` form used inside user id packets.
    pub fn to_user_id_string(&self) -> String {
        match (&self.name, &self.email) {
            (Some(name), Some(email)) => format!("{} <{}>", name, email),
            (Some(name), None) => name.clone(),
            (None, Some(email)) => format!("<{}>", email),
            (None, None) => String::new(),
        }
    }
}

/// User id input accepted by key generation: either the raw
/// `Name <email>` form or the structured parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserIdInput {
    Raw(String),
    Parts {
        name: Option<String>,
        email: Option<String>,
    },
}

fn valid_name(name: &str) -> bool {
    !name.trim().is_empty() && !name.contains('<') && !name.contains('>') && !name.contains('\n')
}

fn valid_email(email: &str) -> bool {
    if email.is_empty() || email.chars().any(char::is_whitespace) {
        return false;
    }

    let mut parts = email.split('@');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(local), Some(domain), None) => {
            !local.is_empty()
                && !domain.is_empty()
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        }
        _ => false,
    }
}

/// Parse and validate a raw `Name <email>` user id.
pub fn parse_user_id(input: &str) -> Result<UserIdInfo> {
    let invalid = || Error::InvalidUserId {
        value: input.to_string(),
    };

    let rest = input.strip_suffix('>').ok_or_else(invalid)?;
    let (name, email) = rest.split_once(" <").ok_or_else(invalid)?;

    if !valid_name(name) || !valid_email(email) {
        return Err(invalid());
    }

    Ok(UserIdInfo {
        name: Some(name.to_string()),
        email: Some(email.to_string()),
    })
}

/// Validate any accepted user id input into its checked form.
pub fn validate_user_id(input: &UserIdInput) -> Result<UserIdInfo> {
    match input {
        UserIdInput::Raw(raw) => parse_user_id(raw),
        UserIdInput::Parts { name, email } => {
            let invalid = || Error::InvalidUserId {
                value: format!("{:?} {:?}", name, email),
            };

            if name.is_none() && email.is_none() {
                return Err(invalid());
            }
            if let Some(name) = name {
                if !valid_name(name) {
                    return Err(invalid());
                }
            }
            if let Some(email) = email {
                if !valid_email(email) {
                    return Err(invalid());
                }
            }

            Ok(UserIdInfo {
                name: name.clone(),
                email: email.clone(),
            })
        }
    }
}

/// Options for [generate_key].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerateKeyOptions {
    pub user_ids: Vec<UserIdInput>,
    pub passphrase: Option<String>,
    /// RSA modulus size; `None` selects Curve25519 material instead.
    pub num_bits: Option<usize>,
    /// Seconds after creation at which the key expires.
    pub key_expiration_time: Option<u64>,
    /// Keep the secret material unencrypted even with a passphrase set.
    pub unlocked: bool,
}

/// The result of [generate_key]: the key itself plus both armored
/// serializations.
#[derive(Debug, Clone)]
pub struct GeneratedKey {
    pub key: Key,
    pub public_armored: String,
    pub private_armored: String,
}

/// Generate a fresh key: a signing primary key and an encryption
/// subkey, self certified for every user id.
pub fn generate_key<R: Rng + CryptoRng>(
    rng: &mut R,
    config: &Config,
    options: GenerateKeyOptions,
) -> Result<GeneratedKey> {
    if options.user_ids.is_empty() {
        return Err(Error::InvalidUserId {
            value: "at least one user id is required".to_string(),
        });
    }

    let user_ids = options
        .user_ids
        .iter()
        .map(|input| validate_user_id(input).map(|info| info.to_user_id_string()))
        .collect::<Result<Vec<_>>>()?;

    let key_type = match options.num_bits {
        Some(bits) => KeyType::Rsa(bits),
        None => KeyType::Curve25519,
    };

    let key = KeyParamsBuilder::default()
        .key_type(key_type)
        .user_ids(user_ids)
        .passphrase(options.passphrase)
        .key_expiration_time(options.key_expiration_time)
        .unlocked(options.unlocked)
        .build()?
        .generate(rng, config)?;

    let public_armored = key.public_key().to_armored_string(None, config)?;
    let private_armored = key.to_armored_string(None, config)?;

    Ok(GeneratedKey {
        key,
        public_armored,
        private_armored,
    })
}

/// Rebuild a private key with a new set of user ids, keeping the
/// cryptographic material. The input key must already be decrypted.
pub fn reformat_key<R: Rng + CryptoRng>(
    rng: &mut R,
    config: &Config,
    private_key: &Key,
    user_ids: &[UserIdInput],
    passphrase: Option<&str>,
) -> Result<Key> {
    let user_ids = user_ids
        .iter()
        .map(|input| validate_user_id(input).map(|info| info.to_user_id_string()))
        .collect::<Result<Vec<_>>>()?;

    private_key.reformat(rng, config, &user_ids, passphrase)
}

/// Parse all keys out of one armored block, collecting per key failures
/// instead of aborting.
#[derive(Debug)]
pub struct ReadKeysResult {
    pub keys: Vec<Key>,
    pub errors: Vec<Error>,
}

pub fn read_armored_keys(input: &str, config: &Config) -> Result<ReadKeysResult> {
    let (keys, errors, _headers) = Key::from_armor_many(input, config)?;
    Ok(ReadKeysResult { keys, errors })
}

/// Parse a message from its armored form.
pub fn read_armored_message(input: &str, config: &Config) -> Result<Message> {
    let (message, _headers) = Message::from_armor_single(input, config)?;
    Ok(message)
}

/// Options for [encrypt].
#[derive(Debug, Clone, Copy)]
pub struct EncryptOptions<'a> {
    pub data: &'a [u8],
    pub filename: &'a str,
    pub public_keys: &'a [&'a Key],
    pub passwords: &'a [&'a str],
    /// Private keys to sign with, before encryption.
    pub signing_keys: &'a [&'a Key],
    pub session_key: Option<&'a SessionKey>,
    /// Keep the signature outside the encrypted message.
    pub detached: bool,
    pub armor: bool,
}

impl Default for EncryptOptions<'_> {
    fn default() -> Self {
        EncryptOptions {
            data: &[],
            filename: "",
            public_keys: &[],
            passwords: &[],
            signing_keys: &[],
            session_key: None,
            detached: false,
            armor: true,
        }
    }
}

/// The encrypted (optionally armored) output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EncryptedMessage {
    Armored(String),
    Binary(Vec<u8>),
}

impl EncryptedMessage {
    /// The armored text, when armoring was requested.
    pub fn as_armored(&self) -> Option<&str> {
        match self {
            EncryptedMessage::Armored(text) => Some(text),
            EncryptedMessage::Binary(_) => None,
        }
    }
}

/// The result of [encrypt]: the encrypted message and, when requested,
/// the detached signature over the plaintext.
#[derive(Debug, Clone)]
pub struct EncryptResult {
    pub message: EncryptedMessage,
    pub signature: Option<DetachedSignature>,
}

/// Encrypt (and optionally sign) data to a set of recipients.
pub fn encrypt<R: Rng + CryptoRng>(
    rng: &mut R,
    config: &Config,
    options: EncryptOptions<'_>,
) -> Result<EncryptResult> {
    if options.public_keys.is_empty()
        && options.passwords.is_empty()
        && options.session_key.is_none()
    {
        return Err(Error::NoRecipients);
    }

    let mut message = Message::new_literal_bytes(options.filename, options.data);
    let mut signature = None;

    if options.detached {
        if !options.signing_keys.is_empty() {
            signature = Some(DetachedSignature::sign(
                config,
                options.data,
                options.signing_keys,
                HashAlgorithm::default(),
                false,
            )?);
        }
    } else {
        for key in options.signing_keys {
            let signing_key = key.signing_key(config).ok_or(Error::MissingKey)?;
            message = message.sign(&signing_key, HashAlgorithm::default())?;
        }
    }

    if config.compression != crate::types::CompressionAlgorithm::Uncompressed {
        message = message.compress(config.compression)?;
    }

    let encrypted = message.encrypt(
        rng,
        config,
        options.public_keys,
        options.passwords,
        options.session_key,
    )?;

    let message = if options.armor {
        EncryptedMessage::Armored(encrypted.to_armored_string(None, config)?)
    } else {
        EncryptedMessage::Binary(encrypted.to_bytes()?)
    };

    Ok(EncryptResult { message, signature })
}

/// The decrypted content with the signature verification results.
#[derive(Debug, Clone)]
pub struct DecryptResult {
    pub data: Vec<u8>,
    pub filename: String,
    pub signatures: Vec<SignatureVerification>,
}

/// Decrypt a message, verifying any contained signatures against the
/// supplied public keys.
pub fn decrypt(
    config: &Config,
    message: &Message,
    private_keys: &[&Key],
    passwords: &[&str],
    session_key: Option<&SessionKey>,
    public_keys: &[&Key],
) -> Result<DecryptResult> {
    let decrypted = match session_key {
        Some(session_key) => message.decrypt_with_session_key(config, session_key)?,
        None => message.decrypt(config, private_keys, passwords)?,
    };

    let signatures = decrypted.verify_signatures(config, public_keys)?;

    let literal = decrypted
        .get_literal()
        .ok_or_else(|| crate::errors::format_err!("decrypted message carries no literal data"))?;

    Ok(DecryptResult {
        data: literal.data().to_vec(),
        filename: literal.file_name.clone(),
        signatures,
    })
}

/// Create an inline signed message.
pub fn sign(config: &Config, data: &[u8], filename: &str, keys: &[&Key]) -> Result<Message> {
    if keys.is_empty() {
        return Err(Error::MissingKey);
    }

    let mut message = Message::new_literal_bytes(filename, data);
    for key in keys {
        let signing_key = key.signing_key(config).ok_or(Error::MissingKey)?;
        message = message.sign(&signing_key, HashAlgorithm::default())?;
    }

    Ok(message)
}

/// Verify an inline signed message.
pub fn verify(
    config: &Config,
    message: &Message,
    keys: &[&Key],
) -> Result<Vec<SignatureVerification>> {
    message.verify_signatures(config, keys)
}

/// Create a cleartext signed message.
pub fn sign_cleartext(config: &Config, text: &str, keys: &[&Key]) -> Result<CleartextSignedMessage> {
    CleartextSignedMessage::sign(config, text, keys, HashAlgorithm::default())
}

/// Create a detached signature over the given data.
pub fn sign_detached(config: &Config, data: &[u8], keys: &[&Key]) -> Result<DetachedSignature> {
    DetachedSignature::sign(config, data, keys, HashAlgorithm::default(), false)
}

/// Verify a detached signature over the given data.
pub fn verify_detached(
    _config: &Config,
    signature: &DetachedSignature,
    data: &[u8],
    keys: &[&Key],
) -> Result<Vec<SignatureVerification>> {
    Ok(signature.verify(data, keys))
}

/// Encrypt an existing session key to recipients and passwords,
/// producing the bare session key packets.
pub fn encrypt_session_key<R: Rng + CryptoRng>(
    rng: &mut R,
    config: &Config,
    session_key: &SessionKey,
    public_keys: &[&Key],
    passwords: &[&str],
) -> Result<Vec<Esk>> {
    use crate::packet::{PublicKeyEncryptedSessionKey, SymKeyEncryptedSessionKey};

    if public_keys.is_empty() && passwords.is_empty() {
        return Err(Error::NoRecipients);
    }

    let mut esk = Vec::new();
    for key in public_keys {
        let encryption_key = key.encryption_key(config).ok_or(Error::MissingKey)?;
        esk.push(Esk::PublicKeyEncryptedSessionKey(
            PublicKeyEncryptedSessionKey::from_session_key(
                rng,
                &session_key.key,
                session_key.algorithm,
                &encryption_key,
            )?,
        ));
    }
    for password in passwords {
        esk.push(Esk::SymKeyEncryptedSessionKey(
            SymKeyEncryptedSessionKey::encrypt_session_key(
                rng,
                password,
                &session_key.key,
                session_key.algorithm,
                config.encryption_cipher,
            )?,
        ));
    }

    Ok(esk)
}

/// Recover the session key of an encrypted message.
pub fn decrypt_session_key(
    config: &Config,
    message: &Message,
    private_keys: &[&Key],
    passwords: &[&str],
) -> Result<SessionKey> {
    message.decrypt_session_key(config, private_keys, passwords)
}

/// Check the certifications on the primary user of `key`.
pub fn verify_primary_user(
    config: &Config,
    key: &Key,
    signers: &[&Key],
) -> Result<Vec<UserVerification>> {
    debug!("verifying primary user of {}", crate::types::KeyTrait::key_id(key));
    key.verify_primary_user(config, signers)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_id_parsing() {
        let parsed = parse_user_id("Alice Example <alice@example.org>").unwrap();
        assert_eq!(parsed.name.as_deref(), Some("Alice Example"));
        assert_eq!(parsed.email.as_deref(), Some("alice@example.org"));
        assert_eq!(
            parsed.to_user_id_string(),
            "Alice Example <alice@example.org>"
        );

        for bad in [
            "alice@example.org",
            "Alice Example",
            "Alice <alice@example.org",
            "Alice <alice example.org>",
            "Alice <alice@@example.org>",
            "Alice <alice@example>",
            "<alice@example.org>",
        ] {
            assert!(parse_user_id(bad).is_err(), "{}", bad);
        }
    }

    #[test]
    fn structured_user_ids() {
        // one of the two parts suffices
        assert!(validate_user_id(&UserIdInput::Parts {
            name: Some("Alice".to_string()),
            email: None,
        })
        .is_ok());
        assert!(validate_user_id(&UserIdInput::Parts {
            name: None,
            email: Some("alice@example.org".to_string()),
        })
        .is_ok());

        // but both absent or any invalid part fails
        assert!(validate_user_id(&UserIdInput::Parts {
            name: None,
            email: None,
        })
        .is_err());
        assert!(validate_user_id(&UserIdInput::Parts {
            name: Some("Alice".to_string()),
            email: Some("nope".to_string()),
        })
        .is_err());
    }
}
