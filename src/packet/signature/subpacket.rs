use std::io;

use byteorder::{BigEndian, WriteBytesExt};
use bytes::Buf;
use chrono::{DateTime, TimeZone, Utc};
use smallvec::SmallVec;

use crate::crypto::hash::HashAlgorithm;
use crate::crypto::public_key::PublicKeyAlgorithm;
use crate::crypto::sym::SymmetricKeyAlgorithm;
use crate::errors::{ensure, Result};
use crate::parsing::BufParsing;
use crate::ser::Serialize;
use crate::types::{CompressionAlgorithm, KeyId};
use crate::util::{read_subpacket_length, write_subpacket_length};

use super::Signature;

/// Usage flags of a key, from the key flags subpacket.
/// Ref: <https://tools.ietf.org/html/rfc4880.html#section-5.2.3.21>
#[derive(Debug, Default, Clone, PartialEq, Eq, Hash)]
pub struct KeyFlags(SmallVec<[u8; 1]>);

impl KeyFlags {
    const CERTIFY: u8 = 0x01;
    const SIGN: u8 = 0x02;
    const ENCRYPT_COMMS: u8 = 0x04;
    const ENCRYPT_STORAGE: u8 = 0x08;
    const SPLIT: u8 = 0x10;
    const AUTHENTICATION: u8 = 0x20;
    const SHARED: u8 = 0x80;

    pub fn from_slice(raw: &[u8]) -> Self {
        KeyFlags(SmallVec::from_slice(raw))
    }

    fn first(&self) -> u8 {
        self.0.first().copied().unwrap_or(0)
    }

    fn set(&mut self, flag: u8, value: bool) {
        if self.0.is_empty() {
            self.0.push(0);
        }
        if value {
            self.0[0] |= flag;
        } else {
            self.0[0] &= !flag;
        }
    }

    pub fn certify(&self) -> bool {
        self.first() & Self::CERTIFY != 0
    }

    pub fn sign(&self) -> bool {
        self.first() & Self::SIGN != 0
    }

    pub fn encrypt_comms(&self) -> bool {
        self.first() & Self::ENCRYPT_COMMS != 0
    }

    pub fn encrypt_storage(&self) -> bool {
        self.first() & Self::ENCRYPT_STORAGE != 0
    }

    pub fn split(&self) -> bool {
        self.first() & Self::SPLIT != 0
    }

    pub fn authentication(&self) -> bool {
        self.first() & Self::AUTHENTICATION != 0
    }

    pub fn shared(&self) -> bool {
        self.first() & Self::SHARED != 0
    }

    pub fn set_certify(&mut self, value: bool) {
        self.set(Self::CERTIFY, value)
    }

    pub fn set_sign(&mut self, value: bool) {
        self.set(Self::SIGN, value)
    }

    pub fn set_encrypt_comms(&mut self, value: bool) {
        self.set(Self::ENCRYPT_COMMS, value)
    }

    pub fn set_encrypt_storage(&mut self, value: bool) {
        self.set(Self::ENCRYPT_STORAGE, value)
    }

    pub fn set_authentication(&mut self, value: bool) {
        self.set(Self::AUTHENTICATION, value)
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }
}

/// A single signature subpacket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subpacket {
    pub is_critical: bool,
    pub data: SubpacketData,
}

impl Subpacket {
    /// A non critical subpacket.
    pub fn regular(data: SubpacketData) -> Self {
        Subpacket {
            is_critical: false,
            data,
        }
    }

    /// A critical subpacket.
    pub fn critical(data: SubpacketData) -> Self {
        Subpacket {
            is_critical: true,
            data,
        }
    }
}

/// Available signature subpackets.
/// Ref: <https://tools.ietf.org/html/rfc4880.html#section-5.2.3.1>
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubpacketData {
    SignatureCreationTime(DateTime<Utc>),
    /// Seconds after the creation time.
    SignatureExpirationTime(u32),
    ExportableCertification(bool),
    TrustSignature(u8, u8),
    RegularExpression(String),
    Revocable(bool),
    /// Seconds after the key creation time.
    KeyExpirationTime(u32),
    PreferredSymmetricAlgorithms(SmallVec<[SymmetricKeyAlgorithm; 8]>),
    RevocationKey {
        class: u8,
        algorithm: PublicKeyAlgorithm,
        fingerprint: [u8; 20],
    },
    Issuer(KeyId),
    NotationData {
        readable: bool,
        name: String,
        value: Vec<u8>,
    },
    PreferredHashAlgorithms(SmallVec<[HashAlgorithm; 8]>),
    PreferredCompressionAlgorithms(SmallVec<[CompressionAlgorithm; 8]>),
    KeyServerPreferences(Vec<u8>),
    PreferredKeyServer(String),
    IsPrimaryUserId(bool),
    PolicyUri(String),
    KeyFlags(KeyFlags),
    SignersUserId(String),
    RevocationReason(u8, String),
    Features(Vec<u8>),
    SignatureTarget(PublicKeyAlgorithm, HashAlgorithm, Vec<u8>),
    EmbeddedSignature(Box<Signature>),
    Other(u8, Vec<u8>),
}

impl SubpacketData {
    fn typ(&self) -> u8 {
        match self {
            SubpacketData::SignatureCreationTime(_) => 2,
            SubpacketData::SignatureExpirationTime(_) => 3,
            SubpacketData::ExportableCertification(_) => 4,
            SubpacketData::TrustSignature(_, _) => 5,
            SubpacketData::RegularExpression(_) => 6,
            SubpacketData::Revocable(_) => 7,
            SubpacketData::KeyExpirationTime(_) => 9,
            SubpacketData::PreferredSymmetricAlgorithms(_) => 11,
            SubpacketData::RevocationKey { .. } => 12,
            SubpacketData::Issuer(_) => 16,
            SubpacketData::NotationData { .. } => 20,
            SubpacketData::PreferredHashAlgorithms(_) => 21,
            SubpacketData::PreferredCompressionAlgorithms(_) => 22,
            SubpacketData::KeyServerPreferences(_) => 23,
            SubpacketData::PreferredKeyServer(_) => 24,
            SubpacketData::IsPrimaryUserId(_) => 25,
            SubpacketData::PolicyUri(_) => 26,
            SubpacketData::KeyFlags(_) => 27,
            SubpacketData::SignersUserId(_) => 28,
            SubpacketData::RevocationReason(_, _) => 29,
            SubpacketData::Features(_) => 30,
            SubpacketData::SignatureTarget(_, _, _) => 31,
            SubpacketData::EmbeddedSignature(_) => 32,
            SubpacketData::Other(typ, _) => *typ,
        }
    }

    fn body(&self) -> Result<Vec<u8>> {
        let mut body = Vec::new();

        match self {
            SubpacketData::SignatureCreationTime(t) => {
                body.write_u32::<BigEndian>(t.timestamp() as u32)?;
            }
            SubpacketData::SignatureExpirationTime(d) => {
                body.write_u32::<BigEndian>(*d)?;
            }
            SubpacketData::ExportableCertification(v) => {
                body.push(u8::from(*v));
            }
            SubpacketData::TrustSignature(depth, amount) => {
                body.push(*depth);
                body.push(*amount);
            }
            SubpacketData::RegularExpression(re) => {
                body.extend_from_slice(re.as_bytes());
            }
            SubpacketData::Revocable(v) => {
                body.push(u8::from(*v));
            }
            SubpacketData::KeyExpirationTime(d) => {
                body.write_u32::<BigEndian>(*d)?;
            }
            SubpacketData::PreferredSymmetricAlgorithms(algs) => {
                body.extend(algs.iter().map(|&a| u8::from(a)));
            }
            SubpacketData::RevocationKey {
                class,
                algorithm,
                fingerprint,
            } => {
                body.push(*class);
                body.push((*algorithm).into());
                body.extend_from_slice(fingerprint);
            }
            SubpacketData::Issuer(id) => {
                body.extend_from_slice(id.as_ref());
            }
            SubpacketData::NotationData {
                readable,
                name,
                value,
            } => {
                body.push(if *readable { 0x80 } else { 0 });
                body.extend_from_slice(&[0, 0, 0]);
                body.write_u16::<BigEndian>(name.len() as u16)?;
                body.write_u16::<BigEndian>(value.len() as u16)?;
                body.extend_from_slice(name.as_bytes());
                body.extend_from_slice(value);
            }
            SubpacketData::PreferredHashAlgorithms(algs) => {
                body.extend(algs.iter().map(|&a| u8::from(a)));
            }
            SubpacketData::PreferredCompressionAlgorithms(algs) => {
                body.extend(algs.iter().map(|&a| u8::from(a)));
            }
            SubpacketData::KeyServerPreferences(prefs) => {
                body.extend_from_slice(prefs);
            }
            SubpacketData::PreferredKeyServer(server) => {
                body.extend_from_slice(server.as_bytes());
            }
            SubpacketData::IsPrimaryUserId(v) => {
                body.push(u8::from(*v));
            }
            SubpacketData::PolicyUri(uri) => {
                body.extend_from_slice(uri.as_bytes());
            }
            SubpacketData::KeyFlags(flags) => {
                body.extend_from_slice(flags.as_slice());
            }
            SubpacketData::SignersUserId(id) => {
                body.extend_from_slice(id.as_bytes());
            }
            SubpacketData::RevocationReason(code, reason) => {
                body.push(*code);
                body.extend_from_slice(reason.as_bytes());
            }
            SubpacketData::Features(features) => {
                body.extend_from_slice(features);
            }
            SubpacketData::SignatureTarget(pub_alg, hash_alg, hash) => {
                body.push((*pub_alg).into());
                body.push((*hash_alg).into());
                body.extend_from_slice(hash);
            }
            SubpacketData::EmbeddedSignature(sig) => {
                sig.to_writer(&mut body)?;
            }
            SubpacketData::Other(_, data) => {
                body.extend_from_slice(data);
            }
        }

        Ok(body)
    }

    fn from_body(typ: u8, body: Vec<u8>) -> Result<Self> {
        let mut i = &body[..];

        let res = match typ {
            2 => {
                let ts = i.read_be_u32()?;
                SubpacketData::SignatureCreationTime(
                    Utc.timestamp_opt(i64::from(ts), 0)
                        .single()
                        .unwrap_or_default(),
                )
            }
            3 => SubpacketData::SignatureExpirationTime(i.read_be_u32()?),
            4 => SubpacketData::ExportableCertification(i.read_u8()? != 0),
            5 => SubpacketData::TrustSignature(i.read_u8()?, i.read_u8()?),
            6 => SubpacketData::RegularExpression(
                String::from_utf8_lossy(trim_trailing_nul(&body)).to_string(),
            ),
            7 => SubpacketData::Revocable(i.read_u8()? != 0),
            9 => SubpacketData::KeyExpirationTime(i.read_be_u32()?),
            11 => SubpacketData::PreferredSymmetricAlgorithms(
                body.iter().map(|&v| SymmetricKeyAlgorithm::from(v)).collect(),
            ),
            12 => {
                let class = i.read_u8()?;
                let algorithm = PublicKeyAlgorithm::from(i.read_u8()?);
                let fingerprint = i.read_array::<20>()?;
                SubpacketData::RevocationKey {
                    class,
                    algorithm,
                    fingerprint,
                }
            }
            16 => SubpacketData::Issuer(KeyId::from_slice(&i.take_bytes(8)?)?),
            20 => {
                let flags = i.read_array::<4>()?;
                let name_len = i.read_be_u16()? as usize;
                let value_len = i.read_be_u16()? as usize;
                let name = i.take_bytes(name_len)?;
                let value = i.take_bytes(value_len)?;
                SubpacketData::NotationData {
                    readable: flags[0] & 0x80 != 0,
                    name: String::from_utf8_lossy(&name).to_string(),
                    value,
                }
            }
            21 => SubpacketData::PreferredHashAlgorithms(
                body.iter().map(|&v| HashAlgorithm::from(v)).collect(),
            ),
            22 => SubpacketData::PreferredCompressionAlgorithms(
                body.iter().map(|&v| CompressionAlgorithm::from(v)).collect(),
            ),
            23 => SubpacketData::KeyServerPreferences(body.clone()),
            24 => SubpacketData::PreferredKeyServer(String::from_utf8_lossy(&body).to_string()),
            25 => SubpacketData::IsPrimaryUserId(i.read_u8()? != 0),
            26 => SubpacketData::PolicyUri(String::from_utf8_lossy(&body).to_string()),
            27 => SubpacketData::KeyFlags(KeyFlags::from_slice(&body)),
            28 => SubpacketData::SignersUserId(String::from_utf8_lossy(&body).to_string()),
            29 => {
                let code = i.read_u8()?;
                SubpacketData::RevocationReason(
                    code,
                    String::from_utf8_lossy(&body[1..]).to_string(),
                )
            }
            30 => SubpacketData::Features(body.clone()),
            31 => {
                let pub_alg = PublicKeyAlgorithm::from(i.read_u8()?);
                let hash_alg = HashAlgorithm::from(i.read_u8()?);
                SubpacketData::SignatureTarget(pub_alg, hash_alg, i.rest())
            }
            32 => SubpacketData::EmbeddedSignature(Box::new(Signature::from_slice(&body)?)),
            _ => SubpacketData::Other(typ, body.clone()),
        };

        Ok(res)
    }
}

fn trim_trailing_nul(body: &[u8]) -> &[u8] {
    body.strip_suffix(&[0]).unwrap_or(body)
}

impl Serialize for Subpacket {
    fn to_writer<W: io::Write>(&self, writer: &mut W) -> Result<()> {
        let body = self.data.body()?;

        write_subpacket_length(body.len() + 1, writer)?;
        let mut typ = self.data.typ();
        if self.is_critical {
            typ |= 0x80;
        }
        writer.write_all(&[typ])?;
        writer.write_all(&body)?;

        Ok(())
    }
}

/// Parse a subpacket area into its subpackets.
pub fn parse_subpackets(mut i: &[u8]) -> Result<Vec<Subpacket>> {
    let mut subpackets = Vec::new();

    while i.has_remaining() {
        let len = read_subpacket_length(&mut i)?;
        ensure!(len > 0, "empty signature subpacket");
        let mut body = i.take_bytes(len)?;

        let typ = body.remove(0);
        let is_critical = typ & 0x80 != 0;
        let data = SubpacketData::from_body(typ & 0x7F, body)?;

        subpackets.push(Subpacket { is_critical, data });
    }

    Ok(subpackets)
}

#[cfg(test)]
mod tests {
    use smallvec::smallvec;

    use super::*;

    #[test]
    fn subpacket_roundtrip() {
        let subpackets = vec![
            Subpacket::regular(SubpacketData::SignatureCreationTime(
                Utc.timestamp_opt(1_500_000_000, 0).unwrap(),
            )),
            Subpacket::regular(SubpacketData::Issuer(
                KeyId::from_slice(&[1, 2, 3, 4, 5, 6, 7, 8]).unwrap(),
            )),
            Subpacket::critical(SubpacketData::KeyExpirationTime(86400)),
            Subpacket::regular(SubpacketData::PreferredSymmetricAlgorithms(smallvec![
                SymmetricKeyAlgorithm::AES256,
                SymmetricKeyAlgorithm::AES128,
            ])),
            Subpacket::regular(SubpacketData::IsPrimaryUserId(true)),
            Subpacket::regular(SubpacketData::KeyFlags(KeyFlags::from_slice(&[0x03]))),
            Subpacket::regular(SubpacketData::Other(99, vec![1, 2, 3])),
            Subpacket::regular(SubpacketData::NotationData {
                readable: true,
                name: "test@example.org".to_string(),
                value: b"value".to_vec(),
            }),
        ];

        let mut buf = Vec::new();
        for p in &subpackets {
            p.to_writer(&mut buf).unwrap();
        }

        let back = parse_subpackets(&buf).unwrap();
        assert_eq!(subpackets, back);
    }

    #[test]
    fn key_flags() {
        let mut flags = KeyFlags::default();
        assert!(!flags.sign());
        flags.set_sign(true);
        flags.set_certify(true);
        assert!(flags.sign());
        assert!(flags.certify());
        assert!(!flags.encrypt_comms());
        assert_eq!(flags.as_slice(), &[0x03]);
    }
}
