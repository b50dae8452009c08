use std::io;

use bytes::Buf;
use rand::{CryptoRng, Rng};

use crate::crypto::sym::SymmetricKeyAlgorithm;
use crate::errors::{ensure_eq, Result};
use crate::packet::PacketTrait;
use crate::parsing::BufParsing;
use crate::ser::Serialize;
use crate::types::Tag;

/// Symmetrically Encrypted Integrity Protected Data Packet.
/// Ref: <https://tools.ietf.org/html/rfc4880.html#section-5.13>
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymEncryptedProtectedData {
    data: Vec<u8>,
}

impl SymEncryptedProtectedData {
    pub fn from_slice(input: &[u8]) -> Result<Self> {
        let mut i = input;
        let version = i.read_u8()?;
        ensure_eq!(version, 1, "invalid protected data packet version");

        Ok(SymEncryptedProtectedData { data: i.rest() })
    }

    /// Encrypt the given plaintext, appending the MDC.
    pub fn encrypt<R: Rng + CryptoRng>(
        rng: &mut R,
        alg: SymmetricKeyAlgorithm,
        key: &[u8],
        plaintext: &[u8],
    ) -> Result<Self> {
        Ok(SymEncryptedProtectedData {
            data: alg.encrypt_protected(rng, key, plaintext)?,
        })
    }

    /// Decrypt, verifying the MDC.
    pub fn decrypt(&self, alg: SymmetricKeyAlgorithm, key: &[u8]) -> Result<Vec<u8>> {
        alg.decrypt_protected(key, &self.data)
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }
}

impl Serialize for SymEncryptedProtectedData {
    fn to_writer<W: io::Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_all(&[0x01])?;
        writer.write_all(&self.data)?;

        Ok(())
    }
}

impl PacketTrait for SymEncryptedProtectedData {
    fn tag(&self) -> Tag {
        Tag::SymEncryptedProtectedData
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use super::*;

    #[test]
    fn roundtrip() {
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let alg = SymmetricKeyAlgorithm::AES128;
        let key = alg.new_session_key(&mut rng);

        let packet =
            SymEncryptedProtectedData::encrypt(&mut rng, alg, &key, b"protected data").unwrap();

        let bytes = packet.to_bytes().unwrap();
        let back = SymEncryptedProtectedData::from_slice(&bytes).unwrap();
        assert_eq!(packet, back);

        assert_eq!(back.decrypt(alg, &key).unwrap(), b"protected data");
    }
}
