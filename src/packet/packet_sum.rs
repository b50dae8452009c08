use std::io;

use crate::errors::{Error, Result};
use crate::packet::{
    AeadEncryptedData, CompressedData, LiteralData, Marker, ModDetectionCode, OnePassSignature,
    PacketTrait, PublicKey, PublicKeyEncryptedSessionKey, PublicSubkey, SecretKey, SecretSubkey,
    Signature, SymEncryptedData, SymEncryptedProtectedData, SymKeyEncryptedSessionKey, Trust,
    UserAttribute, UserId,
};
use crate::ser::Serialize;
use crate::types::Tag;

/// Represents a Packet. A packet is the record structure used to encode a
/// chunk of data in OpenPGP.
/// Ref: <https://tools.ietf.org/html/rfc4880.html#section-4>
#[derive(Debug, Clone, PartialEq, Eq)]
#[allow(clippy::large_enum_variant)]
pub enum Packet {
    CompressedData(CompressedData),
    PublicKey(PublicKey),
    PublicSubkey(PublicSubkey),
    SecretKey(SecretKey),
    SecretSubkey(SecretSubkey),
    LiteralData(LiteralData),
    Marker(Marker),
    ModDetectionCode(ModDetectionCode),
    OnePassSignature(OnePassSignature),
    PublicKeyEncryptedSessionKey(PublicKeyEncryptedSessionKey),
    Signature(Signature),
    SymEncryptedData(SymEncryptedData),
    SymEncryptedProtectedData(SymEncryptedProtectedData),
    AeadEncryptedData(AeadEncryptedData),
    SymKeyEncryptedSessionKey(SymKeyEncryptedSessionKey),
    Trust(Trust),
    UserAttribute(UserAttribute),
    UserId(UserId),
}

impl Packet {
    /// Parse a packet body for the given tag.
    pub fn from_parts(tag: Tag, body: &[u8]) -> Result<Self> {
        let res = match tag {
            Tag::PublicKeyEncryptedSessionKey => {
                PublicKeyEncryptedSessionKey::from_slice(body).map(Into::into)
            }
            Tag::Signature => Signature::from_slice(body).map(Into::into),
            Tag::SymKeyEncryptedSessionKey => {
                SymKeyEncryptedSessionKey::from_slice(body).map(Into::into)
            }
            Tag::OnePassSignature => OnePassSignature::from_slice(body).map(Into::into),
            Tag::SecretKey => SecretKey::from_slice(body).map(Into::into),
            Tag::PublicKey => PublicKey::from_slice(body).map(Into::into),
            Tag::SecretSubkey => SecretSubkey::from_slice(body).map(Into::into),
            Tag::CompressedData => CompressedData::from_slice(body).map(Into::into),
            Tag::SymEncryptedData => SymEncryptedData::from_slice(body).map(Into::into),
            Tag::Marker => Marker::from_slice(body).map(Into::into),
            Tag::Literal => LiteralData::from_slice(body).map(Into::into),
            Tag::Trust => Trust::from_slice(body).map(Into::into),
            Tag::UserId => UserId::from_slice(body).map(Into::into),
            Tag::PublicSubkey => PublicSubkey::from_slice(body).map(Into::into),
            Tag::UserAttribute => UserAttribute::from_slice(body).map(Into::into),
            Tag::SymEncryptedProtectedData => {
                SymEncryptedProtectedData::from_slice(body).map(Into::into)
            }
            Tag::ModDetectionCode => ModDetectionCode::from_slice(body).map(Into::into),
            Tag::AeadEncryptedData => AeadEncryptedData::from_slice(body).map(Into::into),
            Tag::Other(v) => Err(Error::Unsupported {
                message: format!("unknown packet tag {}", v),
            }),
        };

        // keep structural framing errors distinguishable from body level
        // parsing problems
        res.map_err(|err| match err {
            err @ Error::Unsupported { .. } => err,
            err => Error::InvalidPacketContent {
                source: Box::new(err),
            },
        })
    }

    pub fn tag(&self) -> Tag {
        match self {
            Packet::CompressedData(p) => p.tag(),
            Packet::PublicKey(p) => p.tag(),
            Packet::PublicSubkey(p) => p.tag(),
            Packet::SecretKey(p) => p.tag(),
            Packet::SecretSubkey(p) => p.tag(),
            Packet::LiteralData(p) => p.tag(),
            Packet::Marker(p) => p.tag(),
            Packet::ModDetectionCode(p) => p.tag(),
            Packet::OnePassSignature(p) => p.tag(),
            Packet::PublicKeyEncryptedSessionKey(p) => p.tag(),
            Packet::Signature(p) => p.tag(),
            Packet::SymEncryptedData(p) => p.tag(),
            Packet::SymEncryptedProtectedData(p) => p.tag(),
            Packet::AeadEncryptedData(p) => p.tag(),
            Packet::SymKeyEncryptedSessionKey(p) => p.tag(),
            Packet::Trust(p) => p.tag(),
            Packet::UserAttribute(p) => p.tag(),
            Packet::UserId(p) => p.tag(),
        }
    }
}

impl Serialize for Packet {
    fn to_writer<W: io::Write>(&self, writer: &mut W) -> Result<()> {
        match self {
            Packet::CompressedData(p) => crate::packet::write_packet(writer, p),
            Packet::PublicKey(p) => crate::packet::write_packet(writer, p),
            Packet::PublicSubkey(p) => crate::packet::write_packet(writer, p),
            Packet::SecretKey(p) => crate::packet::write_packet(writer, p),
            Packet::SecretSubkey(p) => crate::packet::write_packet(writer, p),
            Packet::LiteralData(p) => crate::packet::write_packet(writer, p),
            Packet::Marker(p) => crate::packet::write_packet(writer, p),
            Packet::ModDetectionCode(p) => crate::packet::write_packet(writer, p),
            Packet::OnePassSignature(p) => crate::packet::write_packet(writer, p),
            Packet::PublicKeyEncryptedSessionKey(p) => crate::packet::write_packet(writer, p),
            Packet::Signature(p) => crate::packet::write_packet(writer, p),
            Packet::SymEncryptedData(p) => crate::packet::write_packet(writer, p),
            Packet::SymEncryptedProtectedData(p) => crate::packet::write_packet(writer, p),
            Packet::AeadEncryptedData(p) => crate::packet::write_packet(writer, p),
            Packet::SymKeyEncryptedSessionKey(p) => crate::packet::write_packet(writer, p),
            Packet::Trust(p) => crate::packet::write_packet(writer, p),
            Packet::UserAttribute(p) => crate::packet::write_packet(writer, p),
            Packet::UserId(p) => crate::packet::write_packet(writer, p),
        }
    }
}

macro_rules! impl_packet_conversions {
    ($name:ident) => {
        impl From<$name> for Packet {
            fn from(other: $name) -> Packet {
                Packet::$name(other)
            }
        }

        impl TryFrom<Packet> for $name {
            type Error = Error;

            fn try_from(other: Packet) -> Result<$name> {
                match other {
                    Packet::$name(p) => Ok(p),
                    p => Err(crate::errors::format_err!(
                        "expected {} packet, got {:?}",
                        stringify!($name),
                        p.tag()
                    )),
                }
            }
        }
    };
}

impl_packet_conversions!(CompressedData);
impl_packet_conversions!(PublicKey);
impl_packet_conversions!(PublicSubkey);
impl_packet_conversions!(SecretKey);
impl_packet_conversions!(SecretSubkey);
impl_packet_conversions!(LiteralData);
impl_packet_conversions!(Marker);
impl_packet_conversions!(ModDetectionCode);
impl_packet_conversions!(OnePassSignature);
impl_packet_conversions!(PublicKeyEncryptedSessionKey);
impl_packet_conversions!(Signature);
impl_packet_conversions!(SymEncryptedData);
impl_packet_conversions!(SymEncryptedProtectedData);
impl_packet_conversions!(AeadEncryptedData);
impl_packet_conversions!(SymKeyEncryptedSessionKey);
impl_packet_conversions!(Trust);
impl_packet_conversions!(UserAttribute);
impl_packet_conversions!(UserId);
