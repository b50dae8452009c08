use std::io;

use bytes::Buf;

use crate::crypto::hash::HashAlgorithm;
use crate::crypto::public_key::PublicKeyAlgorithm;
use crate::errors::{ensure_eq, Result};
use crate::packet::{PacketTrait, SignatureType};
use crate::parsing::BufParsing;
use crate::ser::Serialize;
use crate::types::{KeyId, Tag};

/// One-Pass Signature Packet
/// Ref: <https://tools.ietf.org/html/rfc4880.html#section-5.4>
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OnePassSignature {
    pub version: u8,
    pub typ: SignatureType,
    pub hash_algorithm: HashAlgorithm,
    pub pub_algorithm: PublicKeyAlgorithm,
    pub key_id: KeyId,
    /// Zero when another one pass signature follows, nonzero for the
    /// last (outermost) one.
    pub last: u8,
}

impl OnePassSignature {
    pub fn new(
        typ: SignatureType,
        hash_algorithm: HashAlgorithm,
        pub_algorithm: PublicKeyAlgorithm,
        key_id: KeyId,
    ) -> Self {
        OnePassSignature {
            version: 3,
            typ,
            hash_algorithm,
            pub_algorithm,
            key_id,
            last: 1,
        }
    }

    pub fn from_slice(input: &[u8]) -> Result<Self> {
        let mut i = input;
        let version = i.read_u8()?;
        ensure_eq!(version, 3, "invalid one pass signature version");

        let typ = SignatureType::try_from_u8(i.read_u8()?)?;
        let hash_algorithm = HashAlgorithm::from(i.read_u8()?);
        let pub_algorithm = PublicKeyAlgorithm::from(i.read_u8()?);
        let key_id = KeyId::from_slice(&i.take_bytes(8)?)?;
        let last = i.read_u8()?;

        Ok(OnePassSignature {
            version,
            typ,
            hash_algorithm,
            pub_algorithm,
            key_id,
            last,
        })
    }
}

impl Serialize for OnePassSignature {
    fn to_writer<W: io::Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_all(&[
            self.version,
            self.typ.into(),
            self.hash_algorithm.into(),
            self.pub_algorithm.into(),
        ])?;
        writer.write_all(self.key_id.as_ref())?;
        writer.write_all(&[self.last])?;

        Ok(())
    }
}

impl PacketTrait for OnePassSignature {
    fn tag(&self) -> Tag {
        Tag::OnePassSignature
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip() {
        let ops = OnePassSignature::new(
            SignatureType::Binary,
            HashAlgorithm::Sha256,
            PublicKeyAlgorithm::RSA,
            KeyId::from_slice(&[1, 2, 3, 4, 5, 6, 7, 8]).unwrap(),
        );

        let bytes = ops.to_bytes().unwrap();
        let back = OnePassSignature::from_slice(&bytes).unwrap();
        assert_eq!(ops, back);
    }
}
