use std::io;

use bytes::Buf;
use rand::{CryptoRng, Rng};
use zeroize::Zeroizing;

use crate::crypto::checksum;
use crate::crypto::public_key::PublicKeyAlgorithm;
use crate::crypto::sym::SymmetricKeyAlgorithm;
use crate::errors::{ensure, Result};
use crate::packet::PacketTrait;
use crate::parsing::BufParsing;
use crate::ser::Serialize;
use crate::types::{EskBytes, KeyId, KeyTrait, PublicKeyTrait, Tag};

/// Public-Key Encrypted Session Key Packet.
/// Ref: <https://tools.ietf.org/html/rfc4880.html#section-5.1>
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicKeyEncryptedSessionKey {
    pub version: u8,
    pub id: KeyId,
    pub algorithm: PublicKeyAlgorithm,
    pub values: EskBytes,
}

impl PublicKeyEncryptedSessionKey {
    pub fn from_slice(input: &[u8]) -> Result<Self> {
        let mut i = input;
        let version = i.read_u8()?;
        crate::errors::ensure_eq!(version, 3, "invalid pkesk version");

        let id = KeyId::from_slice(&i.take_bytes(8)?)?;
        let algorithm = PublicKeyAlgorithm::from(i.read_u8()?);
        let values = EskBytes::from_buf(algorithm, &mut i)?;

        Ok(PublicKeyEncryptedSessionKey {
            version,
            id,
            algorithm,
            values,
        })
    }

    /// Build the session key payload (algorithm octet, key, simple
    /// checksum) and encrypt it to the given public key.
    pub fn from_session_key<R: CryptoRng + Rng>(
        rng: &mut R,
        session_key: &[u8],
        alg: SymmetricKeyAlgorithm,
        pkey: &(impl PublicKeyTrait + KeyTrait),
    ) -> Result<Self> {
        let mut data = Zeroizing::new(Vec::with_capacity(session_key.len() + 3));
        data.push(alg.into());
        data.extend_from_slice(session_key);
        data.extend_from_slice(&checksum::simple_sum(session_key).to_be_bytes());

        let values = pkey.encrypt(rng, &data)?;

        Ok(PublicKeyEncryptedSessionKey {
            version: 3,
            id: pkey.key_id(),
            algorithm: pkey.algorithm(),
            values,
        })
    }

    /// Split a decrypted session key payload into algorithm and key,
    /// verifying the checksum.
    pub fn unpack_session_key(decrypted: &[u8]) -> Result<(SymmetricKeyAlgorithm, Vec<u8>)> {
        ensure!(decrypted.len() > 3, "invalid session key payload");

        let alg = SymmetricKeyAlgorithm::from(decrypted[0]);
        let (key, check) = decrypted[1..].split_at(decrypted.len() - 3);
        checksum::simple(check, key)?;

        ensure!(
            alg.key_size() == key.len(),
            "session key length mismatch for {:?}",
            alg
        );

        Ok((alg, key.to_vec()))
    }

    /// Matches if this packet addresses the given key id, either
    /// directly or as a wildcard.
    pub fn matches(&self, id: &KeyId) -> bool {
        self.id.is_wildcard() || &self.id == id
    }
}

impl Serialize for PublicKeyEncryptedSessionKey {
    fn to_writer<W: io::Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_all(&[self.version])?;
        writer.write_all(self.id.as_ref())?;
        writer.write_all(&[self.algorithm.into()])?;
        self.values.to_writer(writer)?;

        Ok(())
    }
}

impl PacketTrait for PublicKeyEncryptedSessionKey {
    fn tag(&self) -> Tag {
        Tag::PublicKeyEncryptedSessionKey
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Mpi;

    #[test]
    fn parse_serialize_roundtrip() {
        let packet = PublicKeyEncryptedSessionKey {
            version: 3,
            id: KeyId::from_slice(&[9, 8, 7, 6, 5, 4, 3, 2]).unwrap(),
            algorithm: PublicKeyAlgorithm::RSA,
            values: EskBytes::Rsa {
                mpi: Mpi::from_slice(&[0x12, 0x34, 0x56]),
            },
        };

        let bytes = packet.to_bytes().unwrap();
        let back = PublicKeyEncryptedSessionKey::from_slice(&bytes).unwrap();
        assert_eq!(packet, back);
    }

    #[test]
    fn session_key_payload() {
        let key = vec![0xAB; 32];
        let mut payload = vec![u8::from(SymmetricKeyAlgorithm::AES256)];
        payload.extend_from_slice(&key);
        payload.extend_from_slice(&checksum::simple_sum(&key).to_be_bytes());

        let (alg, parsed) =
            PublicKeyEncryptedSessionKey::unpack_session_key(&payload).unwrap();
        assert_eq!(alg, SymmetricKeyAlgorithm::AES256);
        assert_eq!(parsed, key);

        // corrupting the checksum is detected
        let len = payload.len();
        payload[len - 1] ^= 1;
        assert!(PublicKeyEncryptedSessionKey::unpack_session_key(&payload).is_err());
    }
}
