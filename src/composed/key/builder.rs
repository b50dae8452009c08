use chrono::{DateTime, SubsecRound, Utc};
use derive_builder::Builder;
use log::debug;
use rand::{CryptoRng, Rng};
use smallvec::smallvec;

use crate::composed::key::{Key, PrimaryKey, SubKey, SubkeyPacket, User, UserContent};
use crate::config::Config;
use crate::crypto::ecc_curve::EccCurve;
use crate::crypto::hash::HashAlgorithm;
use crate::crypto::public_key::PublicKeyAlgorithm;
use crate::crypto::sym::SymmetricKeyAlgorithm;
use crate::crypto::{ecdh, eddsa, rsa};
use crate::errors::{Error, Result};
use crate::packet::{
    self, KeyFlags, SignatureConfig, SignatureType, Subpacket, SubpacketData, UserId,
};
use crate::types::{CompressionAlgorithm, KeyTrait, KeyVersion, SecretKeyTrait, Tag};

/// The kind of key material to generate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyType {
    /// RSA for both the primary key and the encryption subkey, with the
    /// given modulus size in bits.
    Rsa(usize),
    /// Ed25519 primary signing key with an X25519 encryption subkey.
    Curve25519,
}

impl KeyType {
    fn primary_alg(&self) -> PublicKeyAlgorithm {
        match self {
            KeyType::Rsa(_) => PublicKeyAlgorithm::RSA,
            KeyType::Curve25519 => PublicKeyAlgorithm::EdDsa,
        }
    }

    fn subkey_alg(&self) -> PublicKeyAlgorithm {
        match self {
            KeyType::Rsa(_) => PublicKeyAlgorithm::RSA,
            KeyType::Curve25519 => PublicKeyAlgorithm::ECDH,
        }
    }
}

/// Parameters for generating a fresh key: a signing primary key plus an
/// encryption subkey, self certified for each user id.
#[derive(Debug, Clone, PartialEq, Eq, Builder)]
#[builder(build_fn(validate = "Self::validate", error = "Error"))]
pub struct KeyParams {
    #[builder(default = "KeyType::Rsa(2048)")]
    pub key_type: KeyType,
    pub user_ids: Vec<String>,
    #[builder(default)]
    pub passphrase: Option<String>,
    /// Seconds after creation at which the key expires; `None` for no
    /// expiration.
    #[builder(default)]
    pub key_expiration_time: Option<u64>,
    /// Leave the secret material unencrypted even when a passphrase is
    /// set.
    #[builder(default)]
    pub unlocked: bool,
    #[builder(default = "Utc::now().trunc_subsecs(0)")]
    pub created_at: DateTime<Utc>,
}

impl KeyParamsBuilder {
    fn validate(&self) -> std::result::Result<(), String> {
        if let Some(user_ids) = &self.user_ids {
            if user_ids.is_empty() {
                return Err("at least one user id is required".into());
            }
        }
        if let Some(KeyType::Rsa(size)) = &self.key_type {
            if *size < 2048 {
                return Err("keys with less than 2048 bits are considered insecure".into());
            }
        }

        Ok(())
    }
}

impl KeyParams {
    /// Generate the key.
    pub fn generate<R: Rng + CryptoRng>(self, rng: &mut R, config: &Config) -> Result<Key> {
        debug!("generating key: {:?}", self.key_type);

        let (primary_public, primary_secret) = match &self.key_type {
            KeyType::Rsa(bits) => rsa::generate_key(rng, *bits)?,
            KeyType::Curve25519 => eddsa::generate_key(rng),
        };
        let (subkey_public, subkey_secret) = match &self.key_type {
            KeyType::Rsa(bits) => rsa::generate_key(rng, *bits)?,
            KeyType::Curve25519 => ecdh::generate_key(rng, &EccCurve::Curve25519)?,
        };

        let primary = packet::SecretKey::new(
            packet::PublicKey::new(
                KeyVersion::V4,
                self.key_type.primary_alg(),
                self.created_at,
                None,
                primary_public,
            )?,
            primary_secret,
        );

        let subkey = packet::SecretSubkey::new(
            packet::PublicSubkey::new(
                KeyVersion::V4,
                self.key_type.subkey_alg(),
                self.created_at,
                None,
                subkey_public,
            )?,
            subkey_secret,
        );

        let mut key = assemble_key(
            primary,
            subkey,
            &self.user_ids,
            self.key_expiration_time,
            config,
        )?;

        if let Some(passphrase) = &self.passphrase {
            if !self.unlocked {
                if let PrimaryKey::Secret(primary) = &mut key.primary_key {
                    primary.set_password(rng, passphrase)?;
                }
                for sk in &mut key.subkeys {
                    if let SubkeyPacket::Secret(secret) = &mut sk.key {
                        secret.set_password(rng, passphrase)?;
                    }
                }
            }
        }

        Ok(key)
    }
}

/// The fixed algorithm preference payload attached to fresh self
/// certifications.
fn preference_subpackets(config: &Config) -> Vec<Subpacket> {
    let mut prefs = vec![
        Subpacket::regular(SubpacketData::PreferredSymmetricAlgorithms(smallvec![
            SymmetricKeyAlgorithm::AES256,
            SymmetricKeyAlgorithm::AES128,
            SymmetricKeyAlgorithm::AES192,
            SymmetricKeyAlgorithm::CAST5,
            SymmetricKeyAlgorithm::TripleDES,
        ])),
        Subpacket::regular(SubpacketData::PreferredHashAlgorithms(smallvec![
            HashAlgorithm::Sha256,
            HashAlgorithm::Sha512,
            HashAlgorithm::Sha1,
        ])),
        Subpacket::regular(SubpacketData::PreferredCompressionAlgorithms(smallvec![
            CompressionAlgorithm::ZLIB,
            CompressionAlgorithm::ZIP,
        ])),
    ];

    if config.integrity_protect {
        // modification detection feature flag
        prefs.push(Subpacket::regular(SubpacketData::Features(vec![0x01])));
    }

    prefs
}

/// Build the signed aggregate from generated packets.
fn assemble_key(
    primary: packet::SecretKey,
    subkey: packet::SecretSubkey,
    user_ids: &[String],
    key_expiration_time: Option<u64>,
    config: &Config,
) -> Result<Key> {
    let issuer = primary.key_id();

    let mut users = Vec::with_capacity(user_ids.len());
    for (index, id) in user_ids.iter().enumerate() {
        let id = UserId::from_str(id.as_str());

        let mut sig_config = SignatureConfig::v4(
            SignatureType::CertPositive,
            primary.algorithm(),
            HashAlgorithm::Sha256,
            issuer,
        );

        let mut flags = KeyFlags::default();
        flags.set_certify(true);
        flags.set_sign(true);
        sig_config
            .hashed_subpackets
            .push(Subpacket::regular(SubpacketData::KeyFlags(flags)));
        sig_config
            .hashed_subpackets
            .extend(preference_subpackets(config));
        if let Some(expiration) = key_expiration_time {
            sig_config
                .hashed_subpackets
                .push(Subpacket::regular(SubpacketData::KeyExpirationTime(
                    expiration as u32,
                )));
        }
        if index == 0 {
            sig_config
                .hashed_subpackets
                .push(Subpacket::regular(SubpacketData::IsPrimaryUserId(true)));
        }

        let sig = sig_config.sign_certificate(&primary, Tag::UserId, &id)?;

        let mut user = User::new_id(id);
        user.self_certifications.push(sig);
        users.push(user);
    }

    // encryption subkey binding
    let mut binding_config = SignatureConfig::v4(
        SignatureType::SubkeyBinding,
        primary.algorithm(),
        HashAlgorithm::Sha256,
        issuer,
    );
    let mut flags = KeyFlags::default();
    flags.set_encrypt_comms(true);
    flags.set_encrypt_storage(true);
    binding_config
        .hashed_subpackets
        .push(Subpacket::regular(SubpacketData::KeyFlags(flags)));
    if let Some(expiration) = key_expiration_time {
        binding_config
            .hashed_subpackets
            .push(Subpacket::regular(SubpacketData::KeyExpirationTime(
                expiration as u32,
            )));
    }

    let binding = binding_config.sign_key_binding(&primary, &subkey.public_key())?;

    Ok(Key {
        primary_key: PrimaryKey::Secret(primary),
        revocation_signatures: Vec::new(),
        direct_signatures: Vec::new(),
        users,
        subkeys: vec![SubKey {
            key: SubkeyPacket::Secret(subkey),
            binding_signatures: vec![binding],
            revocation_signatures: Vec::new(),
        }],
    })
}

impl Key {
    /// Rebuild this private key with a new set of user ids, reusing the
    /// cryptographic material. The secret material must already be
    /// decrypted.
    pub fn reformat<R: Rng + CryptoRng>(
        &self,
        rng: &mut R,
        config: &Config,
        user_ids: &[String],
        passphrase: Option<&str>,
    ) -> Result<Key> {
        let Some(primary) = self.primary_key.as_secret() else {
            return Err(Error::Message {
                message: "reformatting requires a private key".to_string(),
            });
        };
        if !primary.is_decrypted() {
            return Err(Error::LockedKey);
        }
        for sk in &self.subkeys {
            if let Some(secret) = sk.key.as_secret() {
                if !secret.is_decrypted() {
                    return Err(Error::LockedKey);
                }
            }
        }
        if user_ids.is_empty() {
            return Err(Error::Message {
                message: "at least one user id is required".to_string(),
            });
        }

        let subkey = self
            .subkeys
            .iter()
            .find_map(|sk| sk.key.as_secret())
            .ok_or_else(|| Error::Message {
                message: "reformatting requires a secret subkey".to_string(),
            })?;

        let expiration = self
            .expires_at(config)
            .map(|t| (t - *self.created_at()).num_seconds().max(0) as u64);

        let mut key = assemble_key(
            primary.clone(),
            subkey.clone(),
            user_ids,
            expiration,
            config,
        )?;

        if let Some(passphrase) = passphrase {
            if let PrimaryKey::Secret(primary) = &mut key.primary_key {
                primary.set_password(rng, passphrase)?;
            }
            for sk in &mut key.subkeys {
                if let SubkeyPacket::Secret(secret) = &mut sk.key {
                    secret.set_password(rng, passphrase)?;
                }
            }
        }

        Ok(key)
    }
}
