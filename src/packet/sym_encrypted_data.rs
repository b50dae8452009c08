use std::io;

use rand::{CryptoRng, Rng};

use crate::crypto::sym::SymmetricKeyAlgorithm;
use crate::errors::{Error, Result};
use crate::packet::PacketTrait;
use crate::ser::Serialize;
use crate::types::Tag;

/// Symmetrically Encrypted Data Packet (legacy, no integrity
/// protection).
/// Ref: <https://tools.ietf.org/html/rfc4880.html#section-5.7>
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymEncryptedData {
    data: Vec<u8>,
}

impl SymEncryptedData {
    pub fn from_slice(input: &[u8]) -> Result<Self> {
        Ok(SymEncryptedData {
            data: input.to_vec(),
        })
    }

    /// Encrypt the given plaintext into a legacy packet.
    pub fn encrypt<R: Rng + CryptoRng>(
        rng: &mut R,
        alg: SymmetricKeyAlgorithm,
        key: &[u8],
        plaintext: &[u8],
    ) -> Result<Self> {
        Ok(SymEncryptedData {
            data: alg.encrypt_legacy(rng, key, plaintext)?,
        })
    }

    /// Decrypt.
    ///
    /// This packet format carries no integrity protection at all. For a
    /// modern large block cipher that combination signals tampering or a
    /// downgrade and is always rejected.
    pub fn decrypt(&self, alg: SymmetricKeyAlgorithm, key: &[u8]) -> Result<Vec<u8>> {
        if alg.is_modern() {
            return Err(Error::MissingMdc {
                algorithm: alg.to_string(),
            });
        }

        alg.decrypt_legacy(key, &self.data)
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }
}

impl Serialize for SymEncryptedData {
    fn to_writer<W: io::Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_all(&self.data)?;
        Ok(())
    }
}

impl PacketTrait for SymEncryptedData {
    fn tag(&self) -> Tag {
        Tag::SymEncryptedData
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use super::*;

    #[test]
    fn legacy_cipher_roundtrip() {
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let alg = SymmetricKeyAlgorithm::CAST5;
        let key = alg.new_session_key(&mut rng);

        let packet = SymEncryptedData::encrypt(&mut rng, alg, &key, b"legacy data").unwrap();
        assert_eq!(packet.decrypt(alg, &key).unwrap(), b"legacy data");
    }

    #[test]
    fn modern_cipher_requires_mdc() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let alg = SymmetricKeyAlgorithm::AES256;
        let key = alg.new_session_key(&mut rng);

        let packet = SymEncryptedData::encrypt(&mut rng, alg, &key, b"data").unwrap();
        assert!(matches!(
            packet.decrypt(alg, &key),
            Err(Error::MissingMdc { .. })
        ));
    }
}
