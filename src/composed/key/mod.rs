mod builder;
mod parser;

pub use self::builder::*;

use std::io;

use chrono::{DateTime, Duration, Utc};
use log::{debug, warn};
use rand::{CryptoRng, Rng};

use crate::armor::{self, BlockType, Headers};
use crate::config::Config;
use crate::crypto::hash::HashAlgorithm;
use crate::crypto::public_key::PublicKeyAlgorithm;
use crate::errors::{bail, Error, Result};
use crate::packet::{self, write_packet, Signature, SignatureConfig, SignatureType};
use crate::ser::Serialize;
use crate::types::{
    EskBytes, Fingerprint, KeyId, KeyTrait, Mpi, PublicKeyTrait, SecretKeyTrait, Tag,
};

/// Verification status of a signature or subkey binding.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Validity {
    Invalid,
    Valid,
    Revoked,
}

/// One entry of a user certification check.
/// `valid` is `None` when the issuing key was not available.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserVerification {
    pub key_id: KeyId,
    pub user_id: Option<String>,
    pub valid: Option<bool>,
}

/// The primary key packet of a [Key], public or secret material.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrimaryKey {
    Public(packet::PublicKey),
    Secret(packet::SecretKey),
}

impl PrimaryKey {
    pub fn is_secret(&self) -> bool {
        matches!(self, PrimaryKey::Secret(_))
    }

    pub fn version(&self) -> crate::types::KeyVersion {
        match self {
            PrimaryKey::Public(k) => k.version(),
            PrimaryKey::Secret(k) => k.version(),
        }
    }

    pub fn created_at(&self) -> &DateTime<Utc> {
        match self {
            PrimaryKey::Public(k) => k.created_at(),
            PrimaryKey::Secret(k) => k.created_at(),
        }
    }

    /// Days until expiration, legacy keys only.
    pub fn expiration(&self) -> Option<u16> {
        match self {
            PrimaryKey::Public(k) => k.expiration(),
            PrimaryKey::Secret(k) => k.expiration(),
        }
    }

    pub fn as_secret(&self) -> Option<&packet::SecretKey> {
        match self {
            PrimaryKey::Public(_) => None,
            PrimaryKey::Secret(k) => Some(k),
        }
    }

    pub fn public_packet(&self) -> packet::PublicKey {
        match self {
            PrimaryKey::Public(k) => k.clone(),
            PrimaryKey::Secret(k) => k.public_key(),
        }
    }
}

impl KeyTrait for PrimaryKey {
    fn fingerprint(&self) -> Fingerprint {
        match self {
            PrimaryKey::Public(k) => k.fingerprint(),
            PrimaryKey::Secret(k) => k.fingerprint(),
        }
    }

    fn key_id(&self) -> KeyId {
        match self {
            PrimaryKey::Public(k) => k.key_id(),
            PrimaryKey::Secret(k) => k.key_id(),
        }
    }

    fn algorithm(&self) -> PublicKeyAlgorithm {
        match self {
            PrimaryKey::Public(k) => k.algorithm(),
            PrimaryKey::Secret(k) => k.algorithm(),
        }
    }
}

impl PublicKeyTrait for PrimaryKey {
    fn verify_signature(&self, hash: HashAlgorithm, data: &[u8], sig: &[Mpi]) -> Result<()> {
        match self {
            PrimaryKey::Public(k) => k.verify_signature(hash, data, sig),
            PrimaryKey::Secret(k) => k.verify_signature(hash, data, sig),
        }
    }

    fn encrypt<R: Rng + CryptoRng>(&self, rng: &mut R, plain: &[u8]) -> Result<EskBytes> {
        match self {
            PrimaryKey::Public(k) => k.encrypt(rng, plain),
            PrimaryKey::Secret(k) => k.encrypt(rng, plain),
        }
    }

    fn to_writer_old(&self, writer: &mut impl io::Write) -> Result<()> {
        match self {
            PrimaryKey::Public(k) => k.to_writer_old(writer),
            PrimaryKey::Secret(k) => k.to_writer_old(writer),
        }
    }
}

impl Serialize for PrimaryKey {
    fn to_writer<W: io::Write>(&self, writer: &mut W) -> Result<()> {
        match self {
            PrimaryKey::Public(k) => write_packet(writer, k),
            PrimaryKey::Secret(k) => write_packet(writer, k),
        }
    }
}

/// A subkey packet, public or secret material.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubkeyPacket {
    Public(packet::PublicSubkey),
    Secret(packet::SecretSubkey),
}

impl SubkeyPacket {
    pub fn is_secret(&self) -> bool {
        matches!(self, SubkeyPacket::Secret(_))
    }

    pub fn created_at(&self) -> &DateTime<Utc> {
        match self {
            SubkeyPacket::Public(k) => k.created_at(),
            SubkeyPacket::Secret(k) => k.created_at(),
        }
    }

    pub fn as_secret(&self) -> Option<&packet::SecretSubkey> {
        match self {
            SubkeyPacket::Public(_) => None,
            SubkeyPacket::Secret(k) => Some(k),
        }
    }
}

impl KeyTrait for SubkeyPacket {
    fn fingerprint(&self) -> Fingerprint {
        match self {
            SubkeyPacket::Public(k) => k.fingerprint(),
            SubkeyPacket::Secret(k) => k.fingerprint(),
        }
    }

    fn key_id(&self) -> KeyId {
        match self {
            SubkeyPacket::Public(k) => k.key_id(),
            SubkeyPacket::Secret(k) => k.key_id(),
        }
    }

    fn algorithm(&self) -> PublicKeyAlgorithm {
        match self {
            SubkeyPacket::Public(k) => k.algorithm(),
            SubkeyPacket::Secret(k) => k.algorithm(),
        }
    }
}

impl PublicKeyTrait for SubkeyPacket {
    fn verify_signature(&self, hash: HashAlgorithm, data: &[u8], sig: &[Mpi]) -> Result<()> {
        match self {
            SubkeyPacket::Public(k) => k.verify_signature(hash, data, sig),
            SubkeyPacket::Secret(k) => k.verify_signature(hash, data, sig),
        }
    }

    fn encrypt<R: Rng + CryptoRng>(&self, rng: &mut R, plain: &[u8]) -> Result<EskBytes> {
        match self {
            SubkeyPacket::Public(k) => k.encrypt(rng, plain),
            SubkeyPacket::Secret(k) => k.encrypt(rng, plain),
        }
    }

    fn to_writer_old(&self, writer: &mut impl io::Write) -> Result<()> {
        match self {
            SubkeyPacket::Public(k) => k.to_writer_old(writer),
            SubkeyPacket::Secret(k) => k.to_writer_old(writer),
        }
    }
}

impl Serialize for SubkeyPacket {
    fn to_writer<W: io::Write>(&self, writer: &mut W) -> Result<()> {
        match self {
            SubkeyPacket::Public(k) => write_packet(writer, k),
            SubkeyPacket::Secret(k) => write_packet(writer, k),
        }
    }
}

/// A subkey with its binding and revocation signatures. Multiple
/// bindings can accumulate over the life of a subkey; at most one is
/// considered valid at a time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubKey {
    pub key: SubkeyPacket,
    pub binding_signatures: Vec<Signature>,
    pub revocation_signatures: Vec<Signature>,
}

impl SubKey {
    /// The most recent binding signature that verifies and has not
    /// expired.
    pub fn latest_valid_binding(
        &self,
        primary: &impl PublicKeyTrait,
        config: &Config,
        now: &DateTime<Utc>,
    ) -> Option<&Signature> {
        self.binding_signatures
            .iter()
            .filter(|sig| sig.typ() == SignatureType::SubkeyBinding)
            .filter(|sig| config.verify_expired_keys || !sig.is_expired(now))
            .filter(|sig| sig.verify_key_binding(primary, &self.key).is_ok())
            .max_by_key(|sig| sig.created().copied())
    }

    /// When this subkey expires, from its valid binding signature.
    /// `None` means it never expires.
    pub fn expires_at(
        &self,
        primary: &impl PublicKeyTrait,
        config: &Config,
        now: &DateTime<Utc>,
    ) -> Option<DateTime<Utc>> {
        let binding = self.latest_valid_binding(primary, config, now)?;
        let expiration = binding.key_expiration_time()?;
        if expiration.is_zero() {
            return None;
        }

        Some(*self.key.created_at() + expiration)
    }

    /// Three valued verification status of this subkey.
    pub fn status(
        &self,
        primary: &impl PublicKeyTrait,
        config: &Config,
        now: &DateTime<Utc>,
    ) -> Validity {
        let revoked = self
            .revocation_signatures
            .iter()
            .filter(|sig| sig.typ() == SignatureType::SubkeyRevocation)
            .any(|sig| sig.verify_key_binding(primary, &self.key).is_ok());
        if revoked {
            return Validity::Revoked;
        }

        match self.latest_valid_binding(primary, config, now) {
            Some(_) => {
                if !config.verify_expired_keys {
                    if let Some(expires) = self.expires_at(primary, config, now) {
                        if expires < *now {
                            return Validity::Invalid;
                        }
                    }
                }
                Validity::Valid
            }
            None => Validity::Invalid,
        }
    }
}

impl Serialize for SubKey {
    fn to_writer<W: io::Write>(&self, writer: &mut W) -> Result<()> {
        self.key.to_writer(writer)?;
        for sig in &self.revocation_signatures {
            write_packet(writer, sig)?;
        }
        for sig in &self.binding_signatures {
            write_packet(writer, sig)?;
        }

        Ok(())
    }
}

/// The identity part of a user: a user id or a user attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserContent {
    Id(packet::UserId),
    Attribute(packet::UserAttribute),
}

impl UserContent {
    fn tag(&self) -> Tag {
        match self {
            UserContent::Id(_) => Tag::UserId,
            UserContent::Attribute(_) => Tag::UserAttribute,
        }
    }

    fn hashable_bytes(&self) -> Result<Vec<u8>> {
        match self {
            UserContent::Id(id) => id.to_bytes(),
            UserContent::Attribute(attr) => attr.to_bytes(),
        }
    }
}

/// A user id or attribute with all signatures over it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub content: UserContent,
    pub self_certifications: Vec<Signature>,
    pub other_certifications: Vec<Signature>,
    pub revocation_signatures: Vec<Signature>,
}

impl User {
    pub fn new_id(id: packet::UserId) -> Self {
        User {
            content: UserContent::Id(id),
            self_certifications: Vec::new(),
            other_certifications: Vec::new(),
            revocation_signatures: Vec::new(),
        }
    }

    /// The user id string, when this user is an id (not an attribute).
    pub fn id(&self) -> Option<&str> {
        match &self.content {
            UserContent::Id(id) => Some(id.id()),
            UserContent::Attribute(_) => None,
        }
    }

    fn verify_certification(
        &self,
        sig: &Signature,
        key: &impl PublicKeyTrait,
    ) -> Result<()> {
        match &self.content {
            UserContent::Id(id) => sig.verify_certificate(key, Tag::UserId, id),
            UserContent::Attribute(attr) => {
                sig.verify_certificate(key, Tag::UserAttribute, attr)
            }
        }
    }

    /// Verify a third party certification: hashed over the primary key
    /// and this user, checked against the issuing key.
    fn verify_third_party_certification(
        &self,
        sig: &Signature,
        primary: &impl PublicKeyTrait,
        issuer: &impl PublicKeyTrait,
    ) -> Result<()> {
        let mut hasher = sig.config.hash_alg.new_hasher()?;
        let mut key_buf = Vec::new();
        primary.to_writer_old(&mut key_buf)?;
        hasher.update(&key_buf);
        sig.config
            .hash_certificate(&mut *hasher, self.content.tag(), &self.content.hashable_bytes()?)?;

        let len = sig.config.hash_signature_data(&mut hasher)?;
        hasher.update(&sig.config.trailer(len));
        let hash = hasher.finalize();

        crate::errors::ensure_eq!(
            &sig.signed_hash_value[..],
            &hash[0..2],
            "signature: invalid signed hash value"
        );
        issuer.verify_signature(sig.config.hash_alg, &hash, &sig.signature)
    }

    /// The most recent valid self certification, the one whose
    /// subpackets (primary flag, preferences, expiration) count.
    pub fn latest_valid_self_cert(
        &self,
        primary: &impl PublicKeyTrait,
        config: &Config,
        now: &DateTime<Utc>,
    ) -> Option<&Signature> {
        self.self_certifications
            .iter()
            .filter(|sig| sig.typ().is_certification())
            .filter(|sig| config.verify_expired_keys || !sig.is_expired(now))
            .filter(|sig| self.verify_certification(sig, primary).is_ok())
            .max_by_key(|sig| sig.created().copied())
    }

    /// Is this user revoked by a verifying certification revocation?
    pub fn is_revoked(&self, primary: &impl PublicKeyTrait) -> bool {
        self.revocation_signatures
            .iter()
            .filter(|sig| sig.typ() == SignatureType::CertRevocation)
            .any(|sig| self.verify_certification(sig, primary).is_ok())
    }
}

impl Serialize for User {
    fn to_writer<W: io::Write>(&self, writer: &mut W) -> Result<()> {
        match &self.content {
            UserContent::Id(id) => write_packet(writer, id)?,
            UserContent::Attribute(attr) => write_packet(writer, attr)?,
        }
        for sig in &self.revocation_signatures {
            write_packet(writer, sig)?;
        }
        for sig in &self.self_certifications {
            write_packet(writer, sig)?;
        }
        for sig in &self.other_certifications {
            write_packet(writer, sig)?;
        }

        Ok(())
    }
}

/// A reference to the secret packet used for a secret key operation.
#[derive(Debug, Clone, Copy)]
pub enum SecretKeyRef<'a> {
    Primary(&'a packet::SecretKey),
    Subkey(&'a packet::SecretSubkey),
}

impl KeyTrait for SecretKeyRef<'_> {
    fn fingerprint(&self) -> Fingerprint {
        match self {
            SecretKeyRef::Primary(k) => k.fingerprint(),
            SecretKeyRef::Subkey(k) => k.fingerprint(),
        }
    }

    fn key_id(&self) -> KeyId {
        match self {
            SecretKeyRef::Primary(k) => k.key_id(),
            SecretKeyRef::Subkey(k) => k.key_id(),
        }
    }

    fn algorithm(&self) -> PublicKeyAlgorithm {
        match self {
            SecretKeyRef::Primary(k) => k.algorithm(),
            SecretKeyRef::Subkey(k) => k.algorithm(),
        }
    }
}

impl PublicKeyTrait for SecretKeyRef<'_> {
    fn verify_signature(&self, hash: HashAlgorithm, data: &[u8], sig: &[Mpi]) -> Result<()> {
        match self {
            SecretKeyRef::Primary(k) => k.verify_signature(hash, data, sig),
            SecretKeyRef::Subkey(k) => k.verify_signature(hash, data, sig),
        }
    }

    fn encrypt<R: Rng + CryptoRng>(&self, rng: &mut R, plain: &[u8]) -> Result<EskBytes> {
        match self {
            SecretKeyRef::Primary(k) => k.encrypt(rng, plain),
            SecretKeyRef::Subkey(k) => k.encrypt(rng, plain),
        }
    }

    fn to_writer_old(&self, writer: &mut impl io::Write) -> Result<()> {
        match self {
            SecretKeyRef::Primary(k) => k.to_writer_old(writer),
            SecretKeyRef::Subkey(k) => k.to_writer_old(writer),
        }
    }
}

impl SecretKeyTrait for SecretKeyRef<'_> {
    fn is_decrypted(&self) -> bool {
        match self {
            SecretKeyRef::Primary(k) => k.is_decrypted(),
            SecretKeyRef::Subkey(k) => k.is_decrypted(),
        }
    }

    fn create_signature(&self, hash: HashAlgorithm, digest: &[u8]) -> Result<Vec<Mpi>> {
        match self {
            SecretKeyRef::Primary(k) => k.create_signature(hash, digest),
            SecretKeyRef::Subkey(k) => k.create_signature(hash, digest),
        }
    }
}

/// A reference to the (sub)key packet selected for encryption.
#[derive(Debug, Clone, Copy)]
pub enum EncryptionKeyRef<'a> {
    Primary(&'a PrimaryKey),
    Subkey(&'a SubkeyPacket),
}

impl KeyTrait for EncryptionKeyRef<'_> {
    fn fingerprint(&self) -> Fingerprint {
        match self {
            EncryptionKeyRef::Primary(k) => k.fingerprint(),
            EncryptionKeyRef::Subkey(k) => k.fingerprint(),
        }
    }

    fn key_id(&self) -> KeyId {
        match self {
            EncryptionKeyRef::Primary(k) => k.key_id(),
            EncryptionKeyRef::Subkey(k) => k.key_id(),
        }
    }

    fn algorithm(&self) -> PublicKeyAlgorithm {
        match self {
            EncryptionKeyRef::Primary(k) => k.algorithm(),
            EncryptionKeyRef::Subkey(k) => k.algorithm(),
        }
    }
}

impl PublicKeyTrait for EncryptionKeyRef<'_> {
    fn verify_signature(&self, hash: HashAlgorithm, data: &[u8], sig: &[Mpi]) -> Result<()> {
        match self {
            EncryptionKeyRef::Primary(k) => k.verify_signature(hash, data, sig),
            EncryptionKeyRef::Subkey(k) => k.verify_signature(hash, data, sig),
        }
    }

    fn encrypt<R: Rng + CryptoRng>(&self, rng: &mut R, plain: &[u8]) -> Result<EskBytes> {
        match self {
            EncryptionKeyRef::Primary(k) => k.encrypt(rng, plain),
            EncryptionKeyRef::Subkey(k) => k.encrypt(rng, plain),
        }
    }

    fn to_writer_old(&self, writer: &mut impl io::Write) -> Result<()> {
        match self {
            EncryptionKeyRef::Primary(k) => k.to_writer_old(writer),
            EncryptionKeyRef::Subkey(k) => k.to_writer_old(writer),
        }
    }
}

/// A complete OpenPGP key: the primary key with its users, subkeys and
/// signatures. The aggregate that armored key blocks decode into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Key {
    pub primary_key: PrimaryKey,
    pub revocation_signatures: Vec<Signature>,
    pub direct_signatures: Vec<Signature>,
    pub users: Vec<User>,
    pub subkeys: Vec<SubKey>,
}

impl KeyTrait for Key {
    fn fingerprint(&self) -> Fingerprint {
        self.primary_key.fingerprint()
    }

    fn key_id(&self) -> KeyId {
        self.primary_key.key_id()
    }

    fn algorithm(&self) -> PublicKeyAlgorithm {
        self.primary_key.algorithm()
    }
}

impl Key {
    /// Does this key carry secret material?
    pub fn is_private(&self) -> bool {
        self.primary_key.is_secret() || self.subkeys.iter().any(|sk| sk.key.is_secret())
    }

    pub fn created_at(&self) -> &DateTime<Utc> {
        self.primary_key.created_at()
    }

    /// The projection of this key without any secret material.
    pub fn public_key(&self) -> Key {
        Key {
            primary_key: PrimaryKey::Public(self.primary_key.public_packet()),
            revocation_signatures: self.revocation_signatures.clone(),
            direct_signatures: self.direct_signatures.clone(),
            users: self.users.clone(),
            subkeys: self
                .subkeys
                .iter()
                .map(|sk| SubKey {
                    key: match &sk.key {
                        SubkeyPacket::Public(k) => SubkeyPacket::Public(k.clone()),
                        SubkeyPacket::Secret(k) => SubkeyPacket::Public(k.public_key()),
                    },
                    binding_signatures: sk.binding_signatures.clone(),
                    revocation_signatures: sk.revocation_signatures.clone(),
                })
                .collect(),
        }
    }

    /// Is the primary key revoked by a verifying key revocation?
    pub fn is_revoked(&self) -> bool {
        self.revocation_signatures
            .iter()
            .filter(|sig| sig.typ() == SignatureType::KeyRevocation)
            .any(|sig| sig.verify_key(&self.primary_key).is_ok())
    }

    /// When this key expires; `None` means never.
    ///
    /// Legacy keys carry the expiration in the key packet itself, v4
    /// keys in the `KeyExpirationTime` subpacket of the most recent
    /// valid self certification.
    pub fn expires_at(&self, config: &Config) -> Option<DateTime<Utc>> {
        let now = Utc::now();

        if self.primary_key.version().is_legacy() {
            let days = self.primary_key.expiration().unwrap_or(0);
            if days == 0 {
                return None;
            }
            return Some(*self.created_at() + Duration::days(i64::from(days)));
        }

        let user = self.primary_user(config)?;
        let cert = user.latest_valid_self_cert(&self.primary_key, config, &now)?;
        let expiration = cert.key_expiration_time()?;
        if expiration.is_zero() {
            return None;
        }

        Some(*self.created_at() + expiration)
    }

    /// The primary user: the user whose most recent valid self
    /// certification carries the primary flag, with the most recent
    /// certification as the tie break.
    pub fn primary_user(&self, config: &Config) -> Option<&User> {
        let now = Utc::now();

        let mut candidates: Vec<(&User, &Signature)> = self
            .users
            .iter()
            .filter_map(|user| {
                user.latest_valid_self_cert(&self.primary_key, config, &now)
                    .map(|sig| (user, sig))
            })
            .collect();

        // primary flagged users win; most recent certification breaks
        // ties in either group
        candidates.sort_by_key(|(_, sig)| {
            (
                sig.is_primary_user_id(),
                sig.created().copied(),
            )
        });

        candidates.last().map(|(user, _)| *user)
    }

    /// Select the packet to encrypt to: the most recently bound valid
    /// subkey with an encryption flag, falling back to the primary key.
    pub fn encryption_key(&self, config: &Config) -> Option<EncryptionKeyRef<'_>> {
        let now = Utc::now();

        let subkey = self
            .subkeys
            .iter()
            .filter_map(|sk| {
                if sk.status(&self.primary_key, config, &now) != Validity::Valid {
                    return None;
                }
                let binding = sk.latest_valid_binding(&self.primary_key, config, &now)?;
                let flags = binding.key_flags();
                if !(flags.encrypt_comms() || flags.encrypt_storage()) {
                    return None;
                }
                if !sk.key.algorithm().can_encrypt() {
                    return None;
                }
                Some((sk, binding.created().copied()))
            })
            .max_by_key(|(_, created)| *created)
            .map(|(sk, _)| sk);

        if let Some(sk) = subkey {
            return Some(EncryptionKeyRef::Subkey(&sk.key));
        }

        // fall back to the primary key when its self certification
        // grants encryption
        if self.primary_key.algorithm().can_encrypt() {
            let user = self.primary_user(config)?;
            let cert = user.latest_valid_self_cert(&self.primary_key, config, &Utc::now())?;
            let flags = cert.key_flags();
            if flags.encrypt_comms() || flags.encrypt_storage() {
                return Some(EncryptionKeyRef::Primary(&self.primary_key));
            }
        }

        None
    }

    /// Select the secret packet to sign with.
    pub fn signing_key(&self, config: &Config) -> Option<SecretKeyRef<'_>> {
        let now = Utc::now();

        let subkey = self
            .subkeys
            .iter()
            .filter_map(|sk| {
                let secret = sk.key.as_secret()?;
                if sk.status(&self.primary_key, config, &now) != Validity::Valid {
                    return None;
                }
                let binding = sk.latest_valid_binding(&self.primary_key, config, &now)?;
                if !binding.key_flags().sign() {
                    return None;
                }
                Some((secret, binding.created().copied()))
            })
            .max_by_key(|(_, created)| *created)
            .map(|(secret, _)| secret);

        if let Some(secret) = subkey {
            return Some(SecretKeyRef::Subkey(secret));
        }

        let primary = self.primary_key.as_secret()?;
        if primary.algorithm().can_sign() {
            return Some(SecretKeyRef::Primary(primary));
        }

        None
    }

    /// Verify the internal consistency: all users carry at least one
    /// valid self certification and all subkeys a valid binding.
    pub fn verify(&self, config: &Config) -> Result<()> {
        let now = Utc::now();

        for user in &self.users {
            if user
                .latest_valid_self_cert(&self.primary_key, config, &now)
                .is_none()
            {
                bail!("user without valid self certification: {:?}", user.id());
            }
        }

        for sk in &self.subkeys {
            if sk.latest_valid_binding(&self.primary_key, config, &now).is_none() {
                bail!("subkey without valid binding: {:?}", sk.key.key_id());
            }
        }

        Ok(())
    }

    /// Certify the primary user of this key with each of the given
    /// (private) signing keys.
    pub fn sign_primary_user(&mut self, config: &Config, signers: &[&Key]) -> Result<()> {
        let index = self
            .primary_user_index(config)
            .ok_or(Error::NoMatchingPacket)?;
        self.sign_user(index, signers)
    }

    /// Certify every user of this key with each of the given (private)
    /// signing keys.
    pub fn sign_all_users(&mut self, _config: &Config, signers: &[&Key]) -> Result<()> {
        for index in 0..self.users.len() {
            self.sign_user(index, signers)?;
        }
        Ok(())
    }

    fn primary_user_index(&self, config: &Config) -> Option<usize> {
        let primary = self.primary_user(config)?;
        self.users.iter().position(|user| user == primary)
    }

    fn sign_user(&mut self, index: usize, signers: &[&Key]) -> Result<()> {
        let primary = self.primary_key.clone();
        let user = &mut self.users[index];

        for signer in signers {
            let Some(secret) = signer.primary_key.as_secret() else {
                bail!("signing key {} is not a private key", signer.key_id());
            };

            let sig_config = SignatureConfig::v4(
                SignatureType::CertGeneric,
                secret.algorithm(),
                HashAlgorithm::default(),
                secret.key_id(),
            );

            let sig = match &user.content {
                UserContent::Id(id) => {
                    sig_config.sign_certificate_by(secret, &primary, Tag::UserId, id)?
                }
                UserContent::Attribute(attr) => {
                    sig_config.sign_certificate_by(secret, &primary, Tag::UserAttribute, attr)?
                }
            };

            user.other_certifications.push(sig);
        }

        Ok(())
    }

    /// Check the certifications of the primary user: the self
    /// certification first, then one entry per supplied key, in call
    /// order.
    pub fn verify_primary_user(
        &self,
        config: &Config,
        keys: &[&Key],
    ) -> Result<Vec<UserVerification>> {
        let user = self.primary_user(config).ok_or(Error::NoMatchingPacket)?;
        Ok(self.verify_user(user, keys))
    }

    /// Check the certifications of every user, in user declaration
    /// order.
    pub fn verify_all_users(
        &self,
        _config: &Config,
        keys: &[&Key],
    ) -> Result<Vec<UserVerification>> {
        let mut out = Vec::new();
        for user in &self.users {
            out.extend(self.verify_user(user, keys));
        }
        Ok(out)
    }

    fn verify_user(&self, user: &User, keys: &[&Key]) -> Vec<UserVerification> {
        let mut out = Vec::new();

        // self certification first
        let self_valid = user
            .self_certifications
            .iter()
            .any(|sig| user.verify_certification(sig, &self.primary_key).is_ok());
        out.push(UserVerification {
            key_id: self.key_id(),
            user_id: user.id().map(ToString::to_string),
            valid: Some(self_valid),
        });

        for key in keys {
            let key_id = key.key_id();
            let matching: Vec<&Signature> = user
                .other_certifications
                .iter()
                .filter(|sig| sig.issuer() == Some(&key_id))
                .collect();

            let valid = if matching.is_empty() {
                None
            } else {
                Some(matching.iter().any(|sig| {
                    user.verify_third_party_certification(sig, &self.primary_key, &key.primary_key)
                        .is_ok()
                }))
            };

            out.push(UserVerification {
                key_id,
                user_id: user.id().map(ToString::to_string),
                valid,
            });
        }

        out
    }

    /// Merge another view of the *same* key (by fingerprint) into this
    /// one: new users, subkeys and signatures are taken over, and a
    /// public only key is promoted to a private key when the other view
    /// carries secret material.
    pub fn update(&mut self, other: Key) -> Result<()> {
        if self.fingerprint() != other.fingerprint() {
            return Err(Error::FingerprintMismatch);
        }

        // public -> private promotion
        if !self.primary_key.is_secret() {
            if let PrimaryKey::Secret(secret) = &other.primary_key {
                if !self.subkeys.is_empty() && other.subkeys.is_empty() {
                    return Err(Error::IncompatibleKeyMerge {
                        message: "destination carries subkeys, but the private view has none"
                            .to_string(),
                    });
                }
                if secret.public_key() != self.primary_key.public_packet() {
                    return Err(Error::IncompatibleKeyMerge {
                        message: "public key material does not match".to_string(),
                    });
                }

                debug!("promoting public key to private key");
                self.primary_key = PrimaryKey::Secret(secret.clone());
            }
        }

        merge_signatures(&mut self.revocation_signatures, other.revocation_signatures);
        merge_signatures(&mut self.direct_signatures, other.direct_signatures);

        for other_user in other.users {
            match self
                .users
                .iter_mut()
                .find(|user| user.content == other_user.content)
            {
                Some(user) => {
                    merge_signatures(&mut user.self_certifications, other_user.self_certifications);
                    merge_signatures(
                        &mut user.other_certifications,
                        other_user.other_certifications,
                    );
                    merge_signatures(
                        &mut user.revocation_signatures,
                        other_user.revocation_signatures,
                    );
                }
                None => self.users.push(other_user),
            }
        }

        for other_sk in other.subkeys {
            match self
                .subkeys
                .iter_mut()
                .find(|sk| sk.key.fingerprint() == other_sk.key.fingerprint())
            {
                Some(sk) => {
                    // promote the subkey packet too
                    if !sk.key.is_secret() && other_sk.key.is_secret() {
                        sk.key = other_sk.key.clone();
                    }
                    merge_signatures(&mut sk.binding_signatures, other_sk.binding_signatures);
                    merge_signatures(&mut sk.revocation_signatures, other_sk.revocation_signatures);
                }
                None => self.subkeys.push(other_sk),
            }
        }

        Ok(())
    }

    pub fn to_armored_writer(
        &self,
        writer: &mut impl io::Write,
        headers: Option<&Headers>,
        config: &Config,
    ) -> Result<()> {
        let typ = if self.is_private() {
            BlockType::PrivateKey
        } else {
            BlockType::PublicKey
        };
        armor::write(self, typ, writer, headers, config)
    }

    pub fn to_armored_string(&self, headers: Option<&Headers>, config: &Config) -> Result<String> {
        let mut buf = Vec::new();
        self.to_armored_writer(&mut buf, headers, config)?;
        Ok(String::from_utf8(buf)?)
    }
}

fn merge_signatures(existing: &mut Vec<Signature>, incoming: Vec<Signature>) {
    for sig in incoming {
        if !existing.contains(&sig) {
            existing.push(sig);
        } else {
            warn!("dropping duplicate signature during merge");
        }
    }
}

impl Serialize for Key {
    fn to_writer<W: io::Write>(&self, writer: &mut W) -> Result<()> {
        self.primary_key.to_writer(writer)?;

        for sig in &self.revocation_signatures {
            write_packet(writer, sig)?;
        }
        for sig in &self.direct_signatures {
            write_packet(writer, sig)?;
        }
        for user in &self.users {
            user.to_writer(writer)?;
        }
        for sk in &self.subkeys {
            sk.to_writer(writer)?;
        }

        Ok(())
    }
}
