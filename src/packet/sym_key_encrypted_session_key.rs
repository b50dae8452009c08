use std::io;

use bytes::Buf;
use rand::{CryptoRng, Rng};
use zeroize::Zeroizing;

use crate::crypto::sym::SymmetricKeyAlgorithm;
use crate::errors::{ensure, ensure_eq, Result};
use crate::packet::PacketTrait;
use crate::parsing::BufParsing;
use crate::ser::Serialize;
use crate::types::{StringToKey, Tag};

/// Symmetric-Key Encrypted Session Key Packet.
/// Ref: <https://tools.ietf.org/html/rfc4880.html#section-5.3>
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymKeyEncryptedSessionKey {
    pub version: u8,
    pub sym_algorithm: SymmetricKeyAlgorithm,
    pub s2k: StringToKey,
    /// When absent, the s2k derived key is the session key itself.
    pub encrypted_key: Option<Vec<u8>>,
}

impl SymKeyEncryptedSessionKey {
    pub fn from_slice(input: &[u8]) -> Result<Self> {
        let mut i = input;
        let version = i.read_u8()?;
        ensure_eq!(version, 4, "invalid skesk version");

        let sym_algorithm = SymmetricKeyAlgorithm::from(i.read_u8()?);
        let s2k = StringToKey::from_buf(&mut i)?;

        let rest = i.rest();
        let encrypted_key = if rest.is_empty() { None } else { Some(rest) };

        Ok(SymKeyEncryptedSessionKey {
            version,
            sym_algorithm,
            s2k,
            encrypted_key,
        })
    }

    /// Wrap an existing session key for the given passphrase. The
    /// embedded form is used, so the packet can coexist with other
    /// session key packets.
    pub fn encrypt_session_key<R: Rng + CryptoRng>(
        rng: &mut R,
        passphrase: &str,
        session_key: &[u8],
        session_key_algorithm: SymmetricKeyAlgorithm,
        alg: SymmetricKeyAlgorithm,
    ) -> Result<Self> {
        ensure!(!passphrase.is_empty(), "missing password");

        let s2k = StringToKey::new_iterated(rng);
        let key = Zeroizing::new(s2k.derive_key(passphrase, alg.key_size())?);

        let mut plain = Zeroizing::new(Vec::with_capacity(session_key.len() + 1));
        plain.push(session_key_algorithm.into());
        plain.extend_from_slice(session_key);

        let iv = vec![0u8; alg.block_size()];
        let mut data = plain.to_vec();
        alg.encrypt_with_iv_regular(&key, &iv, &mut data)?;

        Ok(SymKeyEncryptedSessionKey {
            version: 4,
            sym_algorithm: alg,
            s2k,
            encrypted_key: Some(data),
        })
    }

    /// Recover the session key with the given passphrase.
    /// Returns the cipher algorithm of the data packet and the key.
    pub fn decrypt_session_key(
        &self,
        passphrase: &str,
    ) -> Result<(SymmetricKeyAlgorithm, Vec<u8>)> {
        let key = Zeroizing::new(
            self.s2k
                .derive_key(passphrase, self.sym_algorithm.key_size())?,
        );

        match &self.encrypted_key {
            None => Ok((self.sym_algorithm, key.to_vec())),
            Some(encrypted) => {
                let mut data = encrypted.clone();
                let iv = vec![0u8; self.sym_algorithm.block_size()];
                self.sym_algorithm
                    .decrypt_with_iv_regular(&key, &iv, &mut data)?;

                ensure!(data.len() > 1, "invalid decrypted session key");
                let alg = SymmetricKeyAlgorithm::from(data.remove(0));
                ensure!(
                    alg.key_size() == data.len(),
                    "decrypted session key length mismatch"
                );

                Ok((alg, data))
            }
        }
    }
}

impl Serialize for SymKeyEncryptedSessionKey {
    fn to_writer<W: io::Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_all(&[self.version, self.sym_algorithm.into()])?;
        self.s2k.to_writer(writer)?;
        if let Some(key) = &self.encrypted_key {
            writer.write_all(key)?;
        }

        Ok(())
    }
}

impl PacketTrait for SymKeyEncryptedSessionKey {
    fn tag(&self) -> Tag {
        Tag::SymKeyEncryptedSessionKey
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use super::*;

    #[test]
    fn embedded_session_key_roundtrip() {
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let session_key = SymmetricKeyAlgorithm::AES256.new_session_key(&mut rng);

        let skesk = SymKeyEncryptedSessionKey::encrypt_session_key(
            &mut rng,
            "hunter2",
            &session_key,
            SymmetricKeyAlgorithm::AES256,
            SymmetricKeyAlgorithm::AES128,
        )
        .unwrap();

        let bytes = skesk.to_bytes().unwrap();
        let back = SymKeyEncryptedSessionKey::from_slice(&bytes).unwrap();
        assert_eq!(skesk, back);

        let (alg, key) = back.decrypt_session_key("hunter2").unwrap();
        assert_eq!(alg, SymmetricKeyAlgorithm::AES256);
        assert_eq!(&key[..], &session_key[..]);
    }

    #[test]
    fn wrong_password_fails() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let session_key = SymmetricKeyAlgorithm::AES128.new_session_key(&mut rng);

        let skesk = SymKeyEncryptedSessionKey::encrypt_session_key(
            &mut rng,
            "correct",
            &session_key,
            SymmetricKeyAlgorithm::AES128,
            SymmetricKeyAlgorithm::AES128,
        )
        .unwrap();

        // a wrong password yields garbage, detected by the algorithm and
        // length sanity checks (probabilistically)
        let res = skesk.decrypt_session_key("wrong");
        match res {
            Ok((alg, key)) => {
                assert!(alg != SymmetricKeyAlgorithm::AES128 || key != session_key.to_vec())
            }
            Err(_) => {}
        }
    }
}
