use std::io;

use byteorder::{BigEndian, WriteBytesExt};
use bytes::Buf;
use chrono::{DateTime, TimeZone, Utc};
use md5::Md5;
use rand::{CryptoRng, Rng};
use sha1::{Digest, Sha1};

use crate::crypto::ecdh;
use crate::crypto::elgamal;
use crate::crypto::hash::HashAlgorithm;
use crate::crypto::public_key::PublicKeyAlgorithm;
use crate::crypto::{dsa, ecdsa, eddsa, rsa};
use crate::errors::{bail, unsupported_err, Error, Result};
use crate::packet::PacketTrait;
use crate::parsing::BufParsing;
use crate::ser::Serialize;
use crate::types::{
    EskBytes, Fingerprint, KeyId, KeyTrait, KeyVersion, Mpi, PublicKeyTrait, PublicParams, Tag,
};

/// The shared material of public key and subkey packets.
/// Ref: <https://tools.ietf.org/html/rfc4880.html#section-5.5.2>
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct PubKeyInner {
    pub(crate) version: KeyVersion,
    pub(crate) algorithm: PublicKeyAlgorithm,
    pub(crate) created_at: DateTime<Utc>,
    /// Days until expiration, v2/v3 keys only.
    pub(crate) expiration: Option<u16>,
    pub(crate) public_params: PublicParams,
}

impl PubKeyInner {
    pub(crate) fn new(
        version: KeyVersion,
        algorithm: PublicKeyAlgorithm,
        created_at: DateTime<Utc>,
        expiration: Option<u16>,
        public_params: PublicParams,
    ) -> Result<Self> {
        if expiration.is_some() && !version.is_legacy() {
            bail!("only v2 and v3 keys have an expiration in the key packet");
        }

        Ok(PubKeyInner {
            version,
            algorithm,
            created_at,
            expiration,
            public_params,
        })
    }

    pub(crate) fn from_buf<B: Buf>(i: &mut B) -> Result<Self> {
        let version = i.read_u8()?;
        let version = KeyVersion::try_from_u8(version).ok_or(Error::Unsupported {
            message: format!("key version {}", version),
        })?;

        let created_at = i.read_be_u32()?;
        let created_at = Utc
            .timestamp_opt(i64::from(created_at), 0)
            .single()
            .unwrap_or_default();

        let expiration = if version.is_legacy() {
            Some(i.read_be_u16()?)
        } else {
            None
        };

        let algorithm = PublicKeyAlgorithm::from(i.read_u8()?);
        let public_params = PublicParams::from_buf(algorithm, i)?;

        Ok(PubKeyInner {
            version,
            algorithm,
            created_at,
            expiration,
            public_params,
        })
    }

    pub(crate) fn to_writer<W: io::Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_all(&[self.version as u8])?;
        writer.write_u32::<BigEndian>(self.created_at.timestamp() as u32)?;

        if self.version.is_legacy() {
            writer.write_u16::<BigEndian>(self.expiration.unwrap_or(0))?;
        }

        writer.write_all(&[self.algorithm.into()])?;
        self.public_params.to_writer(writer)?;

        Ok(())
    }

    /// The `0x99` framed old style serialization, hashed for
    /// fingerprints and signatures.
    pub(crate) fn to_writer_old(&self, writer: &mut impl io::Write) -> Result<()> {
        let body = {
            let mut buf = Vec::new();
            self.to_writer(&mut buf)?;
            buf
        };

        writer.write_all(&[0x99])?;
        writer.write_u16::<BigEndian>(body.len() as u16)?;
        writer.write_all(&body)?;

        Ok(())
    }

    pub(crate) fn fingerprint(&self) -> Fingerprint {
        match self.version {
            KeyVersion::V2 | KeyVersion::V3 => {
                // MD5 over the MPI bodies of the key material
                let mut hasher = Md5::new();
                match &self.public_params {
                    PublicParams::Rsa { n, e } => {
                        hasher.update(n.as_bytes());
                        hasher.update(e.as_bytes());
                    }
                    // v3 keys are RSA only; hash all material for
                    // anything nonstandard
                    params => {
                        if let Ok(buf) = params.to_bytes() {
                            hasher.update(&buf);
                        }
                    }
                }
                Fingerprint::V3(hasher.finalize().into())
            }
            KeyVersion::V4 => {
                let mut buf = Vec::new();
                self.to_writer_old(&mut buf).expect("writing to vec");
                Fingerprint::V4(Sha1::digest(&buf).into())
            }
        }
    }

    pub(crate) fn key_id(&self) -> KeyId {
        match self.version {
            KeyVersion::V2 | KeyVersion::V3 => match &self.public_params {
                // the low 64 bits of the public modulus
                PublicParams::Rsa { n, .. } => {
                    let bytes = n.as_bytes();
                    KeyId::from_slice(&bytes[bytes.len().saturating_sub(8)..])
                        .expect("modulus longer than 8 bytes")
                }
                _ => {
                    let fp = self.fingerprint();
                    let bytes = fp.as_bytes();
                    KeyId::from_slice(&bytes[bytes.len() - 8..]).expect("fingerprint length")
                }
            },
            KeyVersion::V4 => {
                let fp = self.fingerprint();
                let bytes = fp.as_bytes();
                KeyId::from_slice(&bytes[bytes.len() - 8..]).expect("fingerprint length")
            }
        }
    }

    pub(crate) fn verify_signature(
        &self,
        hash: HashAlgorithm,
        data: &[u8],
        sig: &[Mpi],
    ) -> Result<()> {
        match &self.public_params {
            PublicParams::Rsa { n, e } => rsa::verify(n, e, hash, data, sig),
            PublicParams::Dsa { p, q, g, y } => dsa::verify(p, q, g, y, data, sig),
            PublicParams::Elgamal { .. } => {
                unsupported_err!("signatures with Elgamal keys")
            }
            PublicParams::Ecdsa { curve, p } => ecdsa::verify(curve, p.as_bytes(), data, sig),
            PublicParams::Ecdh { .. } => bail!("ECDH is an encryption only algorithm"),
            PublicParams::EdDsa { curve, q } => eddsa::verify(curve, q.as_bytes(), data, sig),
        }
    }

    pub(crate) fn encrypt<R: Rng + CryptoRng>(
        &self,
        rng: &mut R,
        plain: &[u8],
    ) -> Result<EskBytes> {
        match &self.public_params {
            PublicParams::Rsa { n, e } => {
                let mpi = rsa::encrypt(rng, n, e, plain)?;
                Ok(EskBytes::Rsa { mpi })
            }
            PublicParams::Elgamal { p, g, y } => {
                let (first, second) = elgamal::encrypt(rng, p, g, y, plain)?;
                Ok(EskBytes::Elgamal { first, second })
            }
            PublicParams::Ecdh {
                curve,
                p,
                hash,
                alg_sym,
            } => {
                let fingerprint = self.fingerprint();
                let (public_point, encrypted_session_key) = ecdh::encrypt(
                    rng,
                    curve,
                    *alg_sym,
                    *hash,
                    fingerprint.as_bytes(),
                    p.as_bytes(),
                    plain,
                )?;
                Ok(EskBytes::Ecdh {
                    public_point,
                    encrypted_session_key,
                })
            }
            PublicParams::Dsa { .. } | PublicParams::Ecdsa { .. } | PublicParams::EdDsa { .. } => {
                bail!("{:?} is a signing only algorithm", self.algorithm)
            }
        }
    }
}

macro_rules! impl_public_key {
    ($name:ident, $tag:expr) => {
        #[derive(Debug, Clone, PartialEq, Eq)]
        pub struct $name(pub(crate) PubKeyInner);

        impl $name {
            pub fn new(
                version: KeyVersion,
                algorithm: PublicKeyAlgorithm,
                created_at: DateTime<Utc>,
                expiration: Option<u16>,
                public_params: PublicParams,
            ) -> Result<Self> {
                Ok($name(PubKeyInner::new(
                    version,
                    algorithm,
                    created_at,
                    expiration,
                    public_params,
                )?))
            }

            /// Parses the packet from the given body.
            pub fn from_slice(input: &[u8]) -> Result<Self> {
                let mut i = input;
                let inner = PubKeyInner::from_buf(&mut i)?;

                Ok($name(inner))
            }

            pub fn version(&self) -> KeyVersion {
                self.0.version
            }

            pub fn created_at(&self) -> &DateTime<Utc> {
                &self.0.created_at
            }

            /// Days until expiration, on legacy keys.
            pub fn expiration(&self) -> Option<u16> {
                self.0.expiration
            }

            pub fn public_params(&self) -> &PublicParams {
                &self.0.public_params
            }
        }

        impl Serialize for $name {
            fn to_writer<W: io::Write>(&self, writer: &mut W) -> Result<()> {
                self.0.to_writer(writer)
            }
        }

        impl PacketTrait for $name {
            fn tag(&self) -> Tag {
                $tag
            }
        }

        impl KeyTrait for $name {
            fn fingerprint(&self) -> Fingerprint {
                self.0.fingerprint()
            }

            fn key_id(&self) -> KeyId {
                self.0.key_id()
            }

            fn algorithm(&self) -> PublicKeyAlgorithm {
                self.0.algorithm
            }
        }

        impl PublicKeyTrait for $name {
            fn verify_signature(
                &self,
                hash: HashAlgorithm,
                data: &[u8],
                sig: &[Mpi],
            ) -> Result<()> {
                self.0.verify_signature(hash, data, sig)
            }

            fn encrypt<R: Rng + CryptoRng>(&self, rng: &mut R, plain: &[u8]) -> Result<EskBytes> {
                self.0.encrypt(rng, plain)
            }

            fn to_writer_old(&self, writer: &mut impl io::Write) -> Result<()> {
                self.0.to_writer_old(writer)
            }
        }
    };
}

impl_public_key!(PublicKey, Tag::PublicKey);
impl_public_key!(PublicSubkey, Tag::PublicSubkey);
