use byteorder::{BigEndian, ByteOrder};
use chrono::{DateTime, SubsecRound, Utc};
use digest::DynDigest;
use log::debug;

use crate::crypto::hash::HashAlgorithm;
use crate::crypto::public_key::PublicKeyAlgorithm;
use crate::errors::{bail, ensure, Result};
use crate::normalize_lines::{LineBreak, Normalized};
use crate::packet::signature::types::WriteHasher;
use crate::packet::{Signature, SignatureType, SignatureVersion, Subpacket, SubpacketData};
use crate::ser::Serialize;
use crate::types::{KeyId, PublicKeyTrait, SecretKeyTrait, Tag};

/// Everything about a signature except the signature values themselves:
/// the input to both signing and verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureConfig {
    pub version: SignatureVersion,
    pub typ: SignatureType,
    pub pub_alg: PublicKeyAlgorithm,
    pub hash_alg: HashAlgorithm,

    pub hashed_subpackets: Vec<Subpacket>,
    pub unhashed_subpackets: Vec<Subpacket>,

    /// Only set on v2 and v3 signatures.
    pub created: Option<DateTime<Utc>>,
    /// Only set on v2 and v3 signatures.
    pub issuer: Option<KeyId>,
}

impl SignatureConfig {
    /// A v4 signature configuration with a creation time and issuer
    /// already in place.
    pub fn v4(
        typ: SignatureType,
        pub_alg: PublicKeyAlgorithm,
        hash_alg: HashAlgorithm,
        issuer: KeyId,
    ) -> Self {
        SignatureConfig {
            version: SignatureVersion::V4,
            typ,
            pub_alg,
            hash_alg,
            hashed_subpackets: vec![Subpacket::regular(SubpacketData::SignatureCreationTime(
                Utc::now().trunc_subsecs(0),
            ))],
            unhashed_subpackets: vec![Subpacket::regular(SubpacketData::Issuer(issuer))],
            created: None,
            issuer: None,
        }
    }

    /// Sign the given document data.
    pub fn sign(self, key: &impl SecretKeyTrait, data: &[u8]) -> Result<Signature> {
        let mut hasher = self.hash_alg.new_hasher()?;

        self.hash_data_to_sign(&mut *hasher, data)?;
        let len = self.hash_signature_data(&mut hasher)?;
        hasher.update(&self.trailer(len));

        let hash = hasher.finalize();

        let signed_hash_value = [hash[0], hash[1]];
        let signature = key.create_signature(self.hash_alg, &hash)?;

        Ok(Signature::from_config(self, signed_hash_value, signature))
    }

    /// Create a certification signature over a user id or attribute.
    pub fn sign_certificate(
        self,
        key: &impl SecretKeyTrait,
        tag: Tag,
        id: &impl Serialize,
    ) -> Result<Signature> {
        self.sign_certificate_by(key, key, tag, id)
    }

    /// Create a certification signature over someone else's user id,
    /// bound to their primary key.
    pub fn sign_certificate_by(
        self,
        signer: &impl SecretKeyTrait,
        target_key: &impl PublicKeyTrait,
        tag: Tag,
        id: &impl Serialize,
    ) -> Result<Signature> {
        debug!("signing certificate {:?}", self.typ);

        let mut hasher = self.hash_alg.new_hasher()?;

        target_key.to_writer_old(&mut WriteHasher(&mut hasher))?;
        self.hash_certificate(&mut *hasher, tag, id)?;

        let len = self.hash_signature_data(&mut hasher)?;
        hasher.update(&self.trailer(len));

        let hash = hasher.finalize();
        let signed_hash_value = [hash[0], hash[1]];
        let signature = signer.create_signature(self.hash_alg, &hash)?;

        Ok(Signature::from_config(self, signed_hash_value, signature))
    }

    /// Sign a subkey binding.
    pub fn sign_key_binding(
        self,
        signing_key: &impl SecretKeyTrait,
        key: &impl PublicKeyTrait,
    ) -> Result<Signature> {
        debug!("signing key binding");

        let mut hasher = self.hash_alg.new_hasher()?;

        // the signing key, then the key being bound
        signing_key.to_writer_old(&mut WriteHasher(&mut hasher))?;
        key.to_writer_old(&mut WriteHasher(&mut hasher))?;

        let len = self.hash_signature_data(&mut hasher)?;
        hasher.update(&self.trailer(len));

        let hash = hasher.finalize();
        let signed_hash_value = [hash[0], hash[1]];
        let signature = signing_key.create_signature(self.hash_alg, &hash)?;

        Ok(Signature::from_config(self, signed_hash_value, signature))
    }

    /// Sign directly over a key, used for key revocations.
    pub fn sign_key(
        self,
        signing_key: &impl SecretKeyTrait,
        key: &impl PublicKeyTrait,
    ) -> Result<Signature> {
        debug!("signing key (revocation)");

        let mut hasher = self.hash_alg.new_hasher()?;

        key.to_writer_old(&mut WriteHasher(&mut hasher))?;

        let len = self.hash_signature_data(&mut hasher)?;
        hasher.update(&self.trailer(len));

        let hash = hasher.finalize();
        let signed_hash_value = [hash[0], hash[1]];
        let signature = signing_key.create_signature(self.hash_alg, &hash)?;

        Ok(Signature::from_config(self, signed_hash_value, signature))
    }

    /// Feed the certificate body (user id or attribute packet) into the
    /// hasher, with the v4 framing.
    pub(crate) fn hash_certificate(
        &self,
        hasher: &mut dyn DynDigest,
        tag: Tag,
        id: &impl Serialize,
    ) -> Result<()> {
        let packet_buf = id.to_bytes()?;

        match self.version {
            SignatureVersion::V2 | SignatureVersion::V3 => {
                // nothing to do
            }
            SignatureVersion::V4 => {
                let prefix = match tag {
                    Tag::UserId => 0xB4,
                    Tag::UserAttribute => 0xD1,
                    _ => bail!("invalid tag for certificate validation: {:?}", tag),
                };

                let mut prefix_buf = [prefix, 0u8, 0u8, 0u8, 0u8];
                BigEndian::write_u32(&mut prefix_buf[1..], packet_buf.len() as u32);
                hasher.update(&prefix_buf);
            }
        }

        hasher.update(&packet_buf);

        Ok(())
    }

    /// Feed the serialized signature metadata (the part that is part of
    /// the digest) into the hasher. Returns the length the trailer needs.
    pub(crate) fn hash_signature_data(&self, hasher: &mut Box<dyn DynDigest>) -> Result<usize> {
        match self.version {
            SignatureVersion::V2 | SignatureVersion::V3 => {
                let created = self
                    .created
                    .as_ref()
                    .ok_or_else(|| crate::errors::format_err!("missing v3 creation time"))?;

                let mut buf = [0u8; 5];
                buf[0] = self.typ.into();
                BigEndian::write_u32(&mut buf[1..], created.timestamp() as u32);

                hasher.update(&buf);

                // no trailer
                Ok(0)
            }
            SignatureVersion::V4 => {
                let mut res = vec![
                    self.version as u8,
                    self.typ.into(),
                    self.pub_alg.into(),
                    self.hash_alg.into(),
                    // filled below with the length
                    0u8,
                    0u8,
                ];

                let mut hashed_subpackets = Vec::new();
                for packet in &self.hashed_subpackets {
                    packet.to_writer(&mut hashed_subpackets)?;
                }
                ensure!(
                    hashed_subpackets.len() < 0x10000,
                    "hashed subpackets too long"
                );

                BigEndian::write_u16(&mut res[4..6], hashed_subpackets.len() as u16);
                res.extend(hashed_subpackets);

                hasher.update(&res);

                Ok(res.len())
            }
        }
    }

    /// Feed the document data into the hasher, honoring the text
    /// canonicalization for text signatures.
    pub(crate) fn hash_data_to_sign(&self, hasher: &mut dyn DynDigest, data: &[u8]) -> Result<()> {
        match self.typ {
            SignatureType::Binary => {
                hasher.update(data);
                Ok(())
            }
            SignatureType::Text => {
                let normalized: Vec<u8> =
                    Normalized::new(data.iter().copied(), LineBreak::Crlf).collect();
                hasher.update(&normalized);
                Ok(())
            }
            SignatureType::Standalone | SignatureType::Timestamp => {
                hasher.update(data);
                Ok(())
            }
            _ => bail!("{:?} is not a document signature type", self.typ),
        }
    }

    /// The trailing bytes hashed after the signature data.
    pub(crate) fn trailer(&self, len: usize) -> Vec<u8> {
        match self.version {
            SignatureVersion::V2 | SignatureVersion::V3 => Vec::new(),
            SignatureVersion::V4 => {
                let mut trailer = vec![0x04, 0xFF, 0, 0, 0, 0];
                BigEndian::write_u32(&mut trailer[2..], len as u32);
                trailer
            }
        }
    }

    /// Returns an iterator over all subpackets of this signature.
    pub fn subpackets(&self) -> impl Iterator<Item = &Subpacket> {
        self.hashed_subpackets
            .iter()
            .chain(self.unhashed_subpackets.iter())
    }

    pub fn created(&self) -> Option<&DateTime<Utc>> {
        if self.created.is_some() {
            return self.created.as_ref();
        }

        self.subpackets().find_map(|p| match &p.data {
            SubpacketData::SignatureCreationTime(d) => Some(d),
            _ => None,
        })
    }

    pub fn issuer(&self) -> Option<&KeyId> {
        if self.issuer.is_some() {
            return self.issuer.as_ref();
        }

        self.subpackets().find_map(|p| match &p.data {
            SubpacketData::Issuer(id) => Some(id),
            _ => None,
        })
    }
}
