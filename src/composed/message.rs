use std::io;

use log::warn;
use rand::{CryptoRng, Rng};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::armor::{self, BlockType, Headers};
use crate::composed::key::{Key, SecretKeyRef};
use crate::composed::shared::{Deserializable, PacketIter};
use crate::config::Config;
use crate::crypto::hash::HashAlgorithm;
use crate::crypto::sym::SymmetricKeyAlgorithm;
use crate::errors::{bail, ensure, Error, Result};
use crate::packet::{
    self, write_packet, AeadEncryptedData, CompressedData, LiteralData, OnePassSignature, Packet,
    PublicKeyEncryptedSessionKey, Signature, SignatureConfig, SignatureType, SymEncryptedData,
    SymEncryptedProtectedData, SymKeyEncryptedSessionKey,
};
use crate::ser::Serialize;
use crate::types::{KeyId, KeyTrait, PublicKeyTrait, SecretKeyTrait};

/// A session key together with the cipher it is meant for.
#[derive(Debug, Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct SessionKey {
    #[zeroize(skip)]
    pub algorithm: SymmetricKeyAlgorithm,
    pub key: Vec<u8>,
}

/// The tri-state outcome of checking one signature of a message.
/// `valid` is `None` when no matching verification key was supplied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureVerification {
    pub key_id: Option<KeyId>,
    pub valid: Option<bool>,
}

/// Encrypted Session Key: either to a public key or from a passphrase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Esk {
    PublicKeyEncryptedSessionKey(PublicKeyEncryptedSessionKey),
    SymKeyEncryptedSessionKey(SymKeyEncryptedSessionKey),
}

impl Serialize for Esk {
    fn to_writer<W: io::Write>(&self, writer: &mut W) -> Result<()> {
        match self {
            Esk::PublicKeyEncryptedSessionKey(k) => write_packet(writer, k),
            Esk::SymKeyEncryptedSessionKey(k) => write_packet(writer, k),
        }
    }
}

/// Encrypted Data packet variants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Edata {
    SymEncryptedData(SymEncryptedData),
    SymEncryptedProtectedData(SymEncryptedProtectedData),
    AeadEncryptedData(AeadEncryptedData),
}

impl Edata {
    /// Decrypt this data packet into the nested packet stream.
    pub fn decrypt(&self, session_key: &SessionKey) -> Result<Vec<u8>> {
        match self {
            Edata::SymEncryptedData(d) => d.decrypt(session_key.algorithm, &session_key.key),
            Edata::SymEncryptedProtectedData(d) => {
                d.decrypt(session_key.algorithm, &session_key.key)
            }
            Edata::AeadEncryptedData(d) => {
                ensure!(
                    d.sym_algorithm == session_key.algorithm,
                    "session key cipher does not match the aead packet"
                );
                d.decrypt(&session_key.key)
            }
        }
    }
}

impl Serialize for Edata {
    fn to_writer<W: io::Write>(&self, writer: &mut W) -> Result<()> {
        match self {
            Edata::SymEncryptedData(d) => write_packet(writer, d),
            Edata::SymEncryptedProtectedData(d) => write_packet(writer, d),
            Edata::AeadEncryptedData(d) => write_packet(writer, d),
        }
    }
}

/// A PGP message: a tree of literal, compressed, signed and encrypted
/// packets.
/// Ref: <https://tools.ietf.org/html/rfc4880.html#section-11.3>
#[derive(Debug, Clone, PartialEq, Eq)]
#[allow(clippy::large_enum_variant)]
pub enum Message {
    Literal(LiteralData),
    Compressed(CompressedData),
    Signed {
        /// nested message
        message: Option<Box<Message>>,
        /// for signatures that come with a one pass header
        one_pass_signature: Option<OnePassSignature>,
        signature: Signature,
    },
    Encrypted {
        esk: Vec<Esk>,
        edata: Edata,
    },
}

impl Message {
    pub fn new_literal(file_name: &str, text: &str) -> Self {
        Message::Literal(LiteralData::from_str(file_name, text))
    }

    pub fn new_literal_bytes(file_name: &str, data: &[u8]) -> Self {
        Message::Literal(LiteralData::from_bytes(file_name, data))
    }

    /// Compress the message.
    pub fn compress(&self, alg: crate::types::CompressionAlgorithm) -> Result<Message> {
        let data = self.to_bytes()?;
        Ok(Message::Compressed(CompressedData::compress(alg, &data)?))
    }

    /// Decompress a compressed message into its nested message.
    pub fn decompress(&self, config: &Config) -> Result<Message> {
        match self {
            Message::Compressed(data) => Message::from_bytes(&data.decompress()?, config),
            _ => bail!("not a compressed message"),
        }
    }

    /// Sign the message with the given secret key, wrapping it in a one
    /// pass signature.
    pub fn sign(
        self,
        key: &impl SecretKeyTrait,
        hash_algorithm: HashAlgorithm,
    ) -> Result<Message> {
        let key_id = key.key_id();
        let algorithm = key.algorithm();

        let data = match &self {
            Message::Literal(l) => l.data().to_vec(),
            _ => self.to_bytes()?,
        };

        let sig_config = SignatureConfig::v4(
            SignatureType::Binary,
            algorithm,
            hash_algorithm,
            key_id,
        );
        let signature = sig_config.sign(key, &data)?;

        let one_pass_signature = OnePassSignature::new(
            SignatureType::Binary,
            hash_algorithm,
            algorithm,
            key_id,
        );

        Ok(Message::Signed {
            message: Some(Box::new(self)),
            one_pass_signature: Some(one_pass_signature),
            signature,
        })
    }

    /// Verify the outermost signature against the given key.
    /// Errors are verification failures; use [Message::verify_signatures]
    /// for the tri-state reading.
    pub fn verify(&self, key: &impl PublicKeyTrait, config: &Config) -> Result<()> {
        match self {
            Message::Signed {
                signature, message, ..
            } => match message {
                Some(message) => match &**message {
                    Message::Literal(l) => signature.verify(key, l.data()),
                    other => {
                        let data = other.to_bytes()?;
                        signature.verify(key, &data)
                    }
                },
                None => bail!("signed message without content"),
            },
            Message::Compressed(_) => self.decompress(config)?.verify(key, config),
            _ => bail!("message is not signed"),
        }
    }

    /// All signatures of this message, outermost first.
    fn signatures(&self) -> Vec<&Signature> {
        let mut out = Vec::new();
        let mut current = self;
        while let Message::Signed {
            signature, message, ..
        } = current
        {
            out.push(signature);
            match message {
                Some(message) => current = message,
                None => break,
            }
        }
        out
    }

    /// Check every signature of this message against the supplied keys.
    /// The result preserves the order the signatures appear in;
    /// `valid: None` marks signatures without a matching key.
    pub fn verify_signatures(&self, config: &Config, keys: &[&Key]) -> Result<Vec<SignatureVerification>> {
        let message = match self {
            Message::Compressed(_) => self.decompress(config)?,
            other => other.clone(),
        };

        let mut out = Vec::new();
        for sig in message.signatures() {
            let issuer = sig.issuer().copied();

            let mut verification = SignatureVerification {
                key_id: issuer,
                valid: None,
            };

            if let Some(issuer) = &issuer {
                for key in keys {
                    let candidates = candidate_verification_keys(key, issuer);
                    if candidates.is_empty() {
                        continue;
                    }

                    let valid = candidates
                        .iter()
                        .any(|candidate| message.verify_with(sig, *candidate, config).is_ok());
                    verification.valid = Some(valid);
                    break;
                }
            }

            out.push(verification);
        }

        Ok(out)
    }

    fn verify_with(
        &self,
        sig: &Signature,
        key: &dyn VerificationKey,
        _config: &Config,
    ) -> Result<()> {
        let data = match self.get_literal() {
            Some(l) => l.data().to_vec(),
            None => self.to_bytes()?,
        };

        key.verify_document(sig, &data)
    }

    /// Encrypt the message to the given public keys and passwords.
    pub fn encrypt<R: Rng + CryptoRng>(
        &self,
        rng: &mut R,
        config: &Config,
        public_keys: &[&Key],
        passwords: &[&str],
        session_key: Option<&SessionKey>,
    ) -> Result<Message> {
        if public_keys.is_empty() && passwords.is_empty() && session_key.is_none() {
            return Err(Error::NoRecipients);
        }

        let alg = config.encryption_cipher;
        let session_key = match session_key {
            Some(sk) => sk.clone(),
            None => SessionKey {
                algorithm: alg,
                key: alg.new_session_key(rng).to_vec(),
            },
        };

        let mut esk = Vec::new();
        for key in public_keys {
            let encryption_key = key
                .encryption_key(config)
                .ok_or_else(|| Error::Message {
                    message: format!("could not find valid encryption key for {}", key.key_id()),
                })?;
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

        let plaintext = self.to_bytes()?;

        let edata = if config.aead_protect {
            Edata::AeadEncryptedData(AeadEncryptedData::encrypt(
                rng,
                session_key.algorithm,
                config.aead_mode,
                config.aead_chunk_size,
                &session_key.key,
                &plaintext,
            )?)
        } else if config.integrity_protect {
            Edata::SymEncryptedProtectedData(SymEncryptedProtectedData::encrypt(
                rng,
                session_key.algorithm,
                &session_key.key,
                &plaintext,
            )?)
        } else {
            Edata::SymEncryptedData(SymEncryptedData::encrypt(
                rng,
                session_key.algorithm,
                &session_key.key,
                &plaintext,
            )?)
        };

        Ok(Message::Encrypted { esk, edata })
    }

    /// Recover the session key of an encrypted message with any of the
    /// given secret keys, passwords, or directly.
    pub fn decrypt_session_key(
        &self,
        _config: &Config,
        private_keys: &[&Key],
        passwords: &[&str],
    ) -> Result<SessionKey> {
        let esk = match self {
            Message::Encrypted { esk, .. } => esk,
            _ => bail!("message is not encrypted"),
        };

        for key in private_keys {
            for esk_packet in esk {
                let pkesk = match esk_packet {
                    Esk::PublicKeyEncryptedSessionKey(p) => p,
                    _ => continue,
                };

                for secret in candidate_secret_keys(key, &pkesk.id) {
                    let (packet_key, fingerprint) = match secret {
                        SecretKeyRef::Primary(k) => (k.secret_repr(), k.fingerprint()),
                        SecretKeyRef::Subkey(k) => (k.secret_repr(), k.fingerprint()),
                    };
                    let repr = packet_key?;

                    match packet::decrypt_session_key(&repr, &pkesk.values, &fingerprint)
                        .and_then(|d| PublicKeyEncryptedSessionKey::unpack_session_key(&d))
                    {
                        Ok((algorithm, key)) => {
                            return Ok(SessionKey { algorithm, key });
                        }
                        Err(err) => {
                            warn!("failed to decrypt session key: {:?}", err);
                        }
                    }
                }
            }
        }

        for password in passwords {
            for esk_packet in esk {
                let skesk = match esk_packet {
                    Esk::SymKeyEncryptedSessionKey(p) => p,
                    _ => continue,
                };

                match skesk.decrypt_session_key(password) {
                    Ok((algorithm, key)) => return Ok(SessionKey { algorithm, key }),
                    Err(err) => {
                        warn!("failed to decrypt session key with password: {:?}", err);
                    }
                }
            }
        }

        Err(Error::MissingKey)
    }

    /// Decrypt an encrypted message with an already recovered session
    /// key, yielding the nested message.
    pub fn decrypt_with_session_key(
        &self,
        config: &Config,
        session_key: &SessionKey,
    ) -> Result<Message> {
        let edata = match self {
            Message::Encrypted { edata, .. } => edata,
            _ => bail!("message is not encrypted"),
        };

        let decrypted = edata.decrypt(session_key)?;
        let message = Message::from_bytes(&decrypted, config)?;

        match message {
            Message::Compressed(_) => message.decompress(config),
            other => Ok(other),
        }
    }

    /// Decrypt an encrypted message end to end.
    pub fn decrypt(
        &self,
        config: &Config,
        private_keys: &[&Key],
        passwords: &[&str],
    ) -> Result<Message> {
        let session_key = self.decrypt_session_key(config, private_keys, passwords)?;
        self.decrypt_with_session_key(config, &session_key)
    }

    /// Returns a list of key ids this message is encrypted to.
    pub fn recipients(&self) -> Vec<KeyId> {
        match self {
            Message::Encrypted { esk, .. } => esk
                .iter()
                .filter_map(|esk| match esk {
                    Esk::PublicKeyEncryptedSessionKey(p) => Some(p.id),
                    Esk::SymKeyEncryptedSessionKey(_) => None,
                })
                .collect(),
            _ => Vec::new(),
        }
    }

    pub fn is_literal(&self) -> bool {
        match self {
            Message::Literal(_) => true,
            Message::Signed { message, .. } => match message {
                Some(message) => message.is_literal(),
                None => false,
            },
            _ => false,
        }
    }

    pub fn get_literal(&self) -> Option<&LiteralData> {
        match self {
            Message::Literal(l) => Some(l),
            Message::Signed { message, .. } => message.as_ref().and_then(|m| m.get_literal()),
            _ => None,
        }
    }

    /// The literal content of the message, `None` while it is still
    /// encrypted.
    pub fn get_content(&self, config: &Config) -> Result<Option<Vec<u8>>> {
        match self {
            Message::Literal(l) => Ok(Some(l.data().to_vec())),
            Message::Signed { message, .. } => Ok(message
                .as_ref()
                .and_then(|m| m.get_literal())
                .map(|l| l.data().to_vec())),
            Message::Compressed(_) => self.decompress(config)?.get_content(config),
            Message::Encrypted { .. } => Ok(None),
        }
    }

    pub fn to_armored_writer(
        &self,
        writer: &mut impl io::Write,
        headers: Option<&Headers>,
        config: &Config,
    ) -> Result<()> {
        armor::write(self, BlockType::Message, writer, headers, config)
    }

    pub fn to_armored_string(&self, headers: Option<&Headers>, config: &Config) -> Result<String> {
        let mut buf = Vec::new();
        self.to_armored_writer(&mut buf, headers, config)?;
        Ok(String::from_utf8(buf)?)
    }
}

/// All secret packets of `key` matching the given esk key id (wildcard
/// ids match everything).
fn candidate_secret_keys<'a>(key: &'a Key, id: &KeyId) -> Vec<SecretKeyRef<'a>> {
    let mut out = Vec::new();

    if let Some(primary) = key.primary_key.as_secret() {
        if id.is_wildcard() || primary.key_id() == *id {
            out.push(SecretKeyRef::Primary(primary));
        }
    }

    for sk in &key.subkeys {
        if let Some(secret) = sk.key.as_secret() {
            if id.is_wildcard() || secret.key_id() == *id {
                out.push(SecretKeyRef::Subkey(secret));
            }
        }
    }

    out
}

/// Dynamic view over the packets of a key that can verify a document
/// signature.
trait VerificationKey {
    fn verify_document(&self, sig: &Signature, data: &[u8]) -> Result<()>;
}

impl VerificationKey for crate::composed::key::PrimaryKey {
    fn verify_document(&self, sig: &Signature, data: &[u8]) -> Result<()> {
        sig.verify(self, data)
    }
}

impl VerificationKey for crate::composed::key::SubkeyPacket {
    fn verify_document(&self, sig: &Signature, data: &[u8]) -> Result<()> {
        sig.verify(self, data)
    }
}

/// The packets of `key` whose key id matches `issuer`.
fn candidate_verification_keys<'a>(key: &'a Key, issuer: &KeyId) -> Vec<&'a dyn VerificationKey> {
    let mut out: Vec<&dyn VerificationKey> = Vec::new();

    if key.primary_key.key_id() == *issuer {
        out.push(&key.primary_key);
    }
    for sk in &key.subkeys {
        if sk.key.key_id() == *issuer {
            out.push(&sk.key);
        }
    }

    out
}

impl Serialize for Message {
    fn to_writer<W: io::Write>(&self, writer: &mut W) -> Result<()> {
        match self {
            Message::Literal(l) => write_packet(writer, l),
            Message::Compressed(c) => write_packet(writer, c),
            Message::Signed {
                message,
                one_pass_signature,
                signature,
            } => {
                if let Some(ops) = one_pass_signature {
                    write_packet(writer, ops)?;
                }
                if let Some(message) = message {
                    (**message).to_writer(writer)?;
                }

                write_packet(writer, signature)?;

                Ok(())
            }
            Message::Encrypted { esk, edata } => {
                for e in esk {
                    e.to_writer(writer)?;
                }
                edata.to_writer(writer)?;

                Ok(())
            }
        }
    }
}

impl Deserializable for Message {
    fn matches_block_type(typ: BlockType) -> bool {
        matches!(
            typ,
            BlockType::Message | BlockType::MultiPartMessage(_, _) | BlockType::Signature
        )
    }

    fn starts_item(packet: &Packet) -> bool {
        matches!(
            packet,
            Packet::LiteralData(_)
                | Packet::CompressedData(_)
                | Packet::OnePassSignature(_)
                | Packet::Signature(_)
                | Packet::PublicKeyEncryptedSessionKey(_)
                | Packet::SymKeyEncryptedSessionKey(_)
        )
    }

    fn from_packets(packets: &mut PacketIter) -> Result<Self> {
        let packet = packets.next().ok_or(Error::NoMatchingPacket)?;

        match packet {
            Packet::LiteralData(l) => Ok(Message::Literal(l)),
            Packet::CompressedData(c) => Ok(Message::Compressed(c)),
            Packet::OnePassSignature(ops) => {
                let message = Message::from_packets(packets)?;
                let signature = match packets.next() {
                    Some(Packet::Signature(sig)) => sig,
                    Some(p) => {
                        bail!("expected signature packet, found {:?}", p.tag())
                    }
                    None => bail!("missing signature packet after one pass signature"),
                };

                Ok(Message::Signed {
                    message: Some(Box::new(message)),
                    one_pass_signature: Some(ops),
                    signature,
                })
            }
            Packet::Signature(signature) => {
                // old style: the signature comes first
                let message = match packets.peek() {
                    Some(_) => Some(Box::new(Message::from_packets(packets)?)),
                    None => None,
                };

                Ok(Message::Signed {
                    message,
                    one_pass_signature: None,
                    signature,
                })
            }
            Packet::PublicKeyEncryptedSessionKey(p) => {
                let mut esk = vec![Esk::PublicKeyEncryptedSessionKey(p)];
                parse_encrypted(packets, &mut esk)
            }
            Packet::SymKeyEncryptedSessionKey(p) => {
                let mut esk = vec![Esk::SymKeyEncryptedSessionKey(p)];
                parse_encrypted(packets, &mut esk)
            }
            p => Err(Error::MalformedPacket {
                message: format!("unexpected packet {:?} in a message", p.tag()),
            }),
        }
    }
}

fn parse_encrypted(packets: &mut PacketIter, esk: &mut Vec<Esk>) -> Result<Message> {
    loop {
        let packet = packets
            .next()
            .ok_or_else(|| crate::errors::format_err!("missing encrypted data packet"))?;

        match packet {
            Packet::PublicKeyEncryptedSessionKey(p) => {
                esk.push(Esk::PublicKeyEncryptedSessionKey(p))
            }
            Packet::SymKeyEncryptedSessionKey(p) => esk.push(Esk::SymKeyEncryptedSessionKey(p)),
            Packet::SymEncryptedData(d) => {
                return Ok(Message::Encrypted {
                    esk: std::mem::take(esk),
                    edata: Edata::SymEncryptedData(d),
                })
            }
            Packet::SymEncryptedProtectedData(d) => {
                return Ok(Message::Encrypted {
                    esk: std::mem::take(esk),
                    edata: Edata::SymEncryptedProtectedData(d),
                })
            }
            Packet::AeadEncryptedData(d) => {
                return Ok(Message::Encrypted {
                    esk: std::mem::take(esk),
                    edata: Edata::AeadEncryptedData(d),
                })
            }
            p => {
                bail!("unexpected packet {:?} in encrypted message", p.tag())
            }
        }
    }
}

