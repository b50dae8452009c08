use std::io;

use byteorder::{BigEndian, WriteBytesExt};
use bytes::Buf;
use chrono::{DateTime, Duration, TimeZone, Utc};
use log::debug;
use num_enum::{FromPrimitive, IntoPrimitive};
use smallvec::SmallVec;

use crate::crypto::hash::HashAlgorithm;
use crate::crypto::sym::SymmetricKeyAlgorithm;
use crate::errors::{ensure, ensure_eq, Error, Result};
use crate::packet::signature::SignatureConfig;
use crate::packet::{parse_subpackets, KeyFlags, PacketTrait, Subpacket, SubpacketData};
use crate::parsing::BufParsing;
use crate::ser::Serialize;
use crate::types::{CompressionAlgorithm, KeyId, Mpi, PublicKeyTrait, Tag};

/// Signature versions. Version 4 is generated; versions 2 and 3 are
/// still accepted for verification.
#[derive(Debug, Default, PartialEq, Eq, Copy, Clone)]
#[repr(u8)]
pub enum SignatureVersion {
    V2 = 2,
    V3 = 3,
    #[default]
    V4 = 4,
}

/// Available signature types.
/// Ref: <https://tools.ietf.org/html/rfc4880.html#section-5.2.1>
#[derive(Debug, PartialEq, Eq, Copy, Clone, Hash, FromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum SignatureType {
    /// Signature of a binary document
    Binary = 0x00,
    /// Signature of a canonical text document
    Text = 0x01,
    Standalone = 0x02,
    /// Generic certification of a User ID and Public-Key packet
    CertGeneric = 0x10,
    /// Persona certification
    CertPersona = 0x11,
    /// Casual certification
    CertCasual = 0x12,
    /// Positive certification
    CertPositive = 0x13,
    /// Subkey Binding Signature
    SubkeyBinding = 0x18,
    /// Primary Key Binding Signature
    KeyBinding = 0x19,
    /// Signature directly on a key
    Key = 0x1F,
    /// Key revocation
    KeyRevocation = 0x20,
    /// Subkey revocation
    SubkeyRevocation = 0x28,
    /// Certification revocation
    CertRevocation = 0x30,
    Timestamp = 0x40,
    /// Third-Party Confirmation
    ThirdParty = 0x50,

    #[num_enum(catch_all)]
    Other(u8),
}

impl SignatureType {
    pub fn try_from_u8(typ: u8) -> Result<Self> {
        match SignatureType::from(typ) {
            SignatureType::Other(v) => Err(Error::MalformedPacket {
                message: format!("invalid signature type 0x{:x}", v),
            }),
            known => Ok(known),
        }
    }

    /// Certifications bind a user id to a key.
    pub fn is_certification(self) -> bool {
        matches!(
            self,
            SignatureType::CertGeneric
                | SignatureType::CertPersona
                | SignatureType::CertCasual
                | SignatureType::CertPositive
        )
    }
}

/// Signature Packet
/// Ref: <https://tools.ietf.org/html/rfc4880.html#section-5.2>
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    pub config: SignatureConfig,
    /// The high 16 bits of the signed hash, a quick sanity check.
    pub signed_hash_value: [u8; 2],
    pub signature: Vec<Mpi>,
}

impl Signature {
    pub fn from_config(
        config: SignatureConfig,
        signed_hash_value: [u8; 2],
        signature: Vec<Mpi>,
    ) -> Self {
        Signature {
            config,
            signed_hash_value,
            signature,
        }
    }

    /// Parses a `Signature` packet body.
    pub fn from_slice(input: &[u8]) -> Result<Self> {
        let mut i = input;
        let version = i.read_u8()?;

        let config = match version {
            2 | 3 => {
                let version = if version == 2 {
                    SignatureVersion::V2
                } else {
                    SignatureVersion::V3
                };

                let hashed_len = i.read_u8()?;
                ensure_eq!(hashed_len, 5, "invalid v3 hashed material length");

                let typ = SignatureType::try_from_u8(i.read_u8()?)?;
                let created = i.read_be_u32()?;
                let issuer = KeyId::from_slice(&i.take_bytes(8)?)?;
                let pub_alg = crate::crypto::public_key::PublicKeyAlgorithm::from(i.read_u8()?);
                let hash_alg = HashAlgorithm::from(i.read_u8()?);

                SignatureConfig {
                    version,
                    typ,
                    pub_alg,
                    hash_alg,
                    hashed_subpackets: Vec::new(),
                    unhashed_subpackets: Vec::new(),
                    created: Some(
                        Utc.timestamp_opt(i64::from(created), 0)
                            .single()
                            .unwrap_or_default(),
                    ),
                    issuer: Some(issuer),
                }
            }
            4 => {
                let typ = SignatureType::try_from_u8(i.read_u8()?)?;
                let pub_alg = crate::crypto::public_key::PublicKeyAlgorithm::from(i.read_u8()?);
                let hash_alg = HashAlgorithm::from(i.read_u8()?);

                let hashed_len = i.read_be_u16()?;
                let hashed_area = i.take_bytes(hashed_len as usize)?;
                let hashed_subpackets = parse_subpackets(&hashed_area)?;

                let unhashed_len = i.read_be_u16()?;
                let unhashed_area = i.take_bytes(unhashed_len as usize)?;
                let unhashed_subpackets = parse_subpackets(&unhashed_area)?;

                SignatureConfig {
                    version: SignatureVersion::V4,
                    typ,
                    pub_alg,
                    hash_alg,
                    hashed_subpackets,
                    unhashed_subpackets,
                    created: None,
                    issuer: None,
                }
            }
            _ => {
                return Err(Error::Unsupported {
                    message: format!("signature version {}", version),
                })
            }
        };

        let signed_hash_value = i.read_array::<2>()?;

        let mut signature = Vec::new();
        while i.has_remaining() {
            signature.push(Mpi::from_buf(&mut i)?);
        }

        Ok(Signature {
            config,
            signed_hash_value,
            signature,
        })
    }

    /// Returns what kind of signature this is.
    pub fn typ(&self) -> SignatureType {
        self.config.typ
    }

    /// The time of creation, from the v3 field or the hashed subpacket.
    pub fn created(&self) -> Option<&DateTime<Utc>> {
        self.config.created()
    }

    /// The id of the issuing key, from the v3 field or any subpacket.
    pub fn issuer(&self) -> Option<&KeyId> {
        self.config.issuer()
    }

    fn hashed_subpacket<'a, T>(
        &'a self,
        f: impl Fn(&'a SubpacketData) -> Option<T>,
    ) -> Option<T> {
        self.config
            .hashed_subpackets
            .iter()
            .find_map(|p| f(&p.data))
    }

    /// Seconds after the key creation time after which the signed key
    /// expires.
    pub fn key_expiration_time(&self) -> Option<Duration> {
        self.hashed_subpacket(|p| match p {
            SubpacketData::KeyExpirationTime(d) => Some(Duration::seconds(i64::from(*d))),
            _ => None,
        })
    }

    /// Seconds after the signature creation time after which this
    /// signature expires.
    pub fn signature_expiration_time(&self) -> Option<Duration> {
        self.hashed_subpacket(|p| match p {
            SubpacketData::SignatureExpirationTime(d) => {
                Some(Duration::seconds(i64::from(*d)))
            }
            _ => None,
        })
    }

    /// True once the signature itself has expired.
    pub fn is_expired(&self, now: &DateTime<Utc>) -> bool {
        match (self.created(), self.signature_expiration_time()) {
            (Some(created), Some(expiration)) => *created + expiration < *now,
            _ => false,
        }
    }

    pub fn key_flags(&self) -> KeyFlags {
        self.hashed_subpacket(|p| match p {
            SubpacketData::KeyFlags(flags) => Some(flags.clone()),
            _ => None,
        })
        .unwrap_or_default()
    }

    pub fn is_primary_user_id(&self) -> bool {
        self.hashed_subpacket(|p| match p {
            SubpacketData::IsPrimaryUserId(v) => Some(*v),
            _ => None,
        })
        .unwrap_or(false)
    }

    pub fn preferred_symmetric_algs(&self) -> SmallVec<[SymmetricKeyAlgorithm; 8]> {
        self.hashed_subpacket(|p| match p {
            SubpacketData::PreferredSymmetricAlgorithms(algs) => Some(algs.clone()),
            _ => None,
        })
        .unwrap_or_default()
    }

    pub fn preferred_hash_algs(&self) -> SmallVec<[HashAlgorithm; 8]> {
        self.hashed_subpacket(|p| match p {
            SubpacketData::PreferredHashAlgorithms(algs) => Some(algs.clone()),
            _ => None,
        })
        .unwrap_or_default()
    }

    pub fn preferred_compression_algs(&self) -> SmallVec<[CompressionAlgorithm; 8]> {
        self.hashed_subpacket(|p| match p {
            SubpacketData::PreferredCompressionAlgorithms(algs) => Some(algs.clone()),
            _ => None,
        })
        .unwrap_or_default()
    }

    pub fn features(&self) -> Vec<u8> {
        self.hashed_subpacket(|p| match p {
            SubpacketData::Features(f) => Some(f.clone()),
            _ => None,
        })
        .unwrap_or_default()
    }

    fn finish_verification(
        &self,
        key: &impl PublicKeyTrait,
        mut hasher: Box<dyn digest::DynDigest>,
    ) -> Result<()> {
        ensure_eq!(
            self.config.pub_alg,
            key.algorithm(),
            "signature algorithm does not match the verification key"
        );

        let len = self.config.hash_signature_data(&mut hasher)?;
        hasher.update(&self.config.trailer(len));

        let hash = hasher.finalize();

        ensure_eq!(
            &self.signed_hash_value[..],
            &hash[0..2],
            "signature: invalid signed hash value"
        );

        key.verify_signature(self.config.hash_alg, &hash, &self.signature)
    }

    /// Verify a signature over document data.
    pub fn verify(&self, key: &impl PublicKeyTrait, data: &[u8]) -> Result<()> {
        debug!("verifying data signature");

        let mut hasher = self.config.hash_alg.new_hasher()?;
        self.config.hash_data_to_sign(&mut *hasher, data)?;

        self.finish_verification(key, hasher)
    }

    /// Verify a certification over `key` and the given user id or
    /// attribute packet.
    pub fn verify_certificate(
        &self,
        key: &impl PublicKeyTrait,
        tag: Tag,
        id: &impl Serialize,
    ) -> Result<()> {
        debug!("verifying certificate");

        let mut hasher = self.config.hash_alg.new_hasher()?;
        key.to_writer_old(&mut WriteHasher(&mut hasher))?;
        self.config.hash_certificate(&mut *hasher, tag, id)?;

        self.finish_verification(key, hasher)
    }

    /// Verify a subkey binding: issued by `signing_key` over `key`.
    pub fn verify_key_binding(
        &self,
        signing_key: &impl PublicKeyTrait,
        key: &impl PublicKeyTrait,
    ) -> Result<()> {
        debug!("verifying key binding");

        let mut hasher = self.config.hash_alg.new_hasher()?;
        signing_key.to_writer_old(&mut WriteHasher(&mut hasher))?;
        key.to_writer_old(&mut WriteHasher(&mut hasher))?;

        self.finish_verification(signing_key, hasher)
    }

    /// Verify a direct key signature or revocation over `key`.
    pub fn verify_key(&self, key: &impl PublicKeyTrait) -> Result<()> {
        debug!("verifying key (revocation)");

        let mut hasher = self.config.hash_alg.new_hasher()?;
        key.to_writer_old(&mut WriteHasher(&mut hasher))?;

        self.finish_verification(key, hasher)
    }
}

/// Adapter to write into a dynamic hasher.
pub(crate) struct WriteHasher<'a>(pub(crate) &'a mut Box<dyn digest::DynDigest>);

impl io::Write for WriteHasher<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let digest = &mut **self.0;
        digest.update(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Serialize for Signature {
    fn to_writer<W: io::Write>(&self, writer: &mut W) -> Result<()> {
        match self.config.version {
            SignatureVersion::V2 | SignatureVersion::V3 => {
                writer.write_all(&[self.config.version as u8, 5, self.config.typ.into()])?;
                let created = self
                    .config
                    .created
                    .as_ref()
                    .ok_or_else(|| crate::errors::format_err!("missing v3 creation time"))?;
                writer.write_u32::<BigEndian>(created.timestamp() as u32)?;
                let issuer = self
                    .config
                    .issuer
                    .as_ref()
                    .ok_or_else(|| crate::errors::format_err!("missing v3 issuer"))?;
                writer.write_all(issuer.as_ref())?;
                writer.write_all(&[self.config.pub_alg.into(), self.config.hash_alg.into()])?;
            }
            SignatureVersion::V4 => {
                writer.write_all(&[
                    self.config.version as u8,
                    self.config.typ.into(),
                    self.config.pub_alg.into(),
                    self.config.hash_alg.into(),
                ])?;

                let mut hashed = Vec::new();
                for p in &self.config.hashed_subpackets {
                    p.to_writer(&mut hashed)?;
                }
                ensure!(hashed.len() < 0x10000, "hashed subpackets too long");
                writer.write_u16::<BigEndian>(hashed.len() as u16)?;
                writer.write_all(&hashed)?;

                let mut unhashed = Vec::new();
                for p in &self.config.unhashed_subpackets {
                    p.to_writer(&mut unhashed)?;
                }
                ensure!(unhashed.len() < 0x10000, "unhashed subpackets too long");
                writer.write_u16::<BigEndian>(unhashed.len() as u16)?;
                writer.write_all(&unhashed)?;
            }
        }

        writer.write_all(&self.signed_hash_value)?;
        for mpi in &self.signature {
            mpi.to_writer(writer)?;
        }

        Ok(())
    }
}

impl PacketTrait for Signature {
    fn tag(&self) -> Tag {
        Tag::Signature
    }
}
