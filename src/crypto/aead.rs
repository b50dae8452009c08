use aes::{Aes128, Aes192, Aes256};
use aes_gcm::aead::{Aead, KeyInit, Payload};
use aes_gcm::AesGcm;
use eax::Eax;
use generic_array::typenum::{U12, U15, U16};
use generic_array::GenericArray;
use num_enum::{FromPrimitive, IntoPrimitive};
use ocb3::Ocb3;

use crate::crypto::sym::SymmetricKeyAlgorithm;
use crate::errors::{unsupported_err, Error, Result};

type Aes128Gcm = AesGcm<Aes128, U12>;
type Aes192Gcm = AesGcm<Aes192, U12>;
type Aes256Gcm = AesGcm<Aes256, U12>;

type Aes128Ocb = Ocb3<Aes128, U15, U16>;
type Aes192Ocb = Ocb3<Aes192, U15, U16>;
type Aes256Ocb = Ocb3<Aes256, U15, U16>;

/// Available AEAD algorithms.
#[derive(Debug, PartialEq, Eq, Copy, Clone, Hash, FromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum AeadAlgorithm {
    Eax = 1,
    Ocb = 2,
    /// Experimental value, used by some producers.
    Gcm = 3,

    #[num_enum(catch_all)]
    Other(u8),
}

impl Default for AeadAlgorithm {
    fn default() -> Self {
        Self::Eax
    }
}

impl AeadAlgorithm {
    /// Nonce size in bytes.
    pub fn iv_length(self) -> usize {
        match self {
            AeadAlgorithm::Eax => 16,
            AeadAlgorithm::Ocb => 15,
            AeadAlgorithm::Gcm => 12,
            AeadAlgorithm::Other(_) => 0,
        }
    }

    /// Authentication tag size in bytes.
    pub fn tag_length(self) -> usize {
        16
    }

    fn error(self) -> Error {
        match self {
            AeadAlgorithm::Eax => Error::Eax,
            AeadAlgorithm::Ocb => Error::Ocb,
            _ => Error::Gcm,
        }
    }

    /// One shot encryption, returns ciphertext with the appended tag.
    pub fn encrypt(
        self,
        sym_alg: SymmetricKeyAlgorithm,
        key: &[u8],
        nonce: &[u8],
        aad: &[u8],
        plaintext: &[u8],
    ) -> Result<Vec<u8>> {
        let payload = Payload {
            msg: plaintext,
            aad,
        };

        let res = match (self, sym_alg) {
            (AeadAlgorithm::Eax, SymmetricKeyAlgorithm::AES128) => {
                Eax::<Aes128>::new(GenericArray::from_slice(key))
                    .encrypt(GenericArray::from_slice(nonce), payload)
            }
            (AeadAlgorithm::Eax, SymmetricKeyAlgorithm::AES192) => {
                Eax::<Aes192>::new(GenericArray::from_slice(key))
                    .encrypt(GenericArray::from_slice(nonce), payload)
            }
            (AeadAlgorithm::Eax, SymmetricKeyAlgorithm::AES256) => {
                Eax::<Aes256>::new(GenericArray::from_slice(key))
                    .encrypt(GenericArray::from_slice(nonce), payload)
            }
            (AeadAlgorithm::Ocb, SymmetricKeyAlgorithm::AES128) => {
                Aes128Ocb::new(GenericArray::from_slice(key))
                    .encrypt(GenericArray::from_slice(nonce), payload)
            }
            (AeadAlgorithm::Ocb, SymmetricKeyAlgorithm::AES192) => {
                Aes192Ocb::new(GenericArray::from_slice(key))
                    .encrypt(GenericArray::from_slice(nonce), payload)
            }
            (AeadAlgorithm::Ocb, SymmetricKeyAlgorithm::AES256) => {
                Aes256Ocb::new(GenericArray::from_slice(key))
                    .encrypt(GenericArray::from_slice(nonce), payload)
            }
            (AeadAlgorithm::Gcm, SymmetricKeyAlgorithm::AES128) => {
                Aes128Gcm::new(GenericArray::from_slice(key))
                    .encrypt(GenericArray::from_slice(nonce), payload)
            }
            (AeadAlgorithm::Gcm, SymmetricKeyAlgorithm::AES192) => {
                Aes192Gcm::new(GenericArray::from_slice(key))
                    .encrypt(GenericArray::from_slice(nonce), payload)
            }
            (AeadAlgorithm::Gcm, SymmetricKeyAlgorithm::AES256) => {
                Aes256Gcm::new(GenericArray::from_slice(key))
                    .encrypt(GenericArray::from_slice(nonce), payload)
            }
            _ => unsupported_err!("aead {:?} with cipher {:?}", self, sym_alg),
        };

        res.map_err(|_| self.error())
    }

    /// One shot decryption of ciphertext with an appended tag.
    pub fn decrypt(
        self,
        sym_alg: SymmetricKeyAlgorithm,
        key: &[u8],
        nonce: &[u8],
        aad: &[u8],
        ciphertext: &[u8],
    ) -> Result<Vec<u8>> {
        let payload = Payload {
            msg: ciphertext,
            aad,
        };

        let res = match (self, sym_alg) {
            (AeadAlgorithm::Eax, SymmetricKeyAlgorithm::AES128) => {
                Eax::<Aes128>::new(GenericArray::from_slice(key))
                    .decrypt(GenericArray::from_slice(nonce), payload)
            }
            (AeadAlgorithm::Eax, SymmetricKeyAlgorithm::AES192) => {
                Eax::<Aes192>::new(GenericArray::from_slice(key))
                    .decrypt(GenericArray::from_slice(nonce), payload)
            }
            (AeadAlgorithm::Eax, SymmetricKeyAlgorithm::AES256) => {
                Eax::<Aes256>::new(GenericArray::from_slice(key))
                    .decrypt(GenericArray::from_slice(nonce), payload)
            }
            (AeadAlgorithm::Ocb, SymmetricKeyAlgorithm::AES128) => {
                Aes128Ocb::new(GenericArray::from_slice(key))
                    .decrypt(GenericArray::from_slice(nonce), payload)
            }
            (AeadAlgorithm::Ocb, SymmetricKeyAlgorithm::AES192) => {
                Aes192Ocb::new(GenericArray::from_slice(key))
                    .decrypt(GenericArray::from_slice(nonce), payload)
            }
            (AeadAlgorithm::Ocb, SymmetricKeyAlgorithm::AES256) => {
                Aes256Ocb::new(GenericArray::from_slice(key))
                    .decrypt(GenericArray::from_slice(nonce), payload)
            }
            (AeadAlgorithm::Gcm, SymmetricKeyAlgorithm::AES128) => {
                Aes128Gcm::new(GenericArray::from_slice(key))
                    .decrypt(GenericArray::from_slice(nonce), payload)
            }
            (AeadAlgorithm::Gcm, SymmetricKeyAlgorithm::AES192) => {
                Aes192Gcm::new(GenericArray::from_slice(key))
                    .decrypt(GenericArray::from_slice(nonce), payload)
            }
            (AeadAlgorithm::Gcm, SymmetricKeyAlgorithm::AES256) => {
                Aes256Gcm::new(GenericArray::from_slice(key))
                    .decrypt(GenericArray::from_slice(nonce), payload)
            }
            _ => unsupported_err!("aead {:?} with cipher {:?}", self, sym_alg),
        };

        res.map_err(|_| self.error())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eax_roundtrip() {
        let key = [1u8; 32];
        let nonce = [2u8; 16];
        let aad = b"header";

        let ct = AeadAlgorithm::Eax
            .encrypt(SymmetricKeyAlgorithm::AES256, &key, &nonce, aad, b"secret")
            .unwrap();
        assert_eq!(ct.len(), 6 + 16);

        let pt = AeadAlgorithm::Eax
            .decrypt(SymmetricKeyAlgorithm::AES256, &key, &nonce, aad, &ct)
            .unwrap();
        assert_eq!(pt, b"secret");
    }

    #[test]
    fn eax_detects_bad_aad() {
        let key = [1u8; 16];
        let nonce = [2u8; 16];

        let ct = AeadAlgorithm::Eax
            .encrypt(
                SymmetricKeyAlgorithm::AES128,
                &key,
                &nonce,
                b"aad",
                b"secret",
            )
            .unwrap();

        assert!(matches!(
            AeadAlgorithm::Eax.decrypt(SymmetricKeyAlgorithm::AES128, &key, &nonce, b"bad", &ct),
            Err(Error::Eax)
        ));
    }

    #[test]
    fn gcm_roundtrip() {
        let key = [9u8; 16];
        let nonce = [3u8; 12];

        let ct = AeadAlgorithm::Gcm
            .encrypt(SymmetricKeyAlgorithm::AES128, &key, &nonce, b"", b"data")
            .unwrap();
        let pt = AeadAlgorithm::Gcm
            .decrypt(SymmetricKeyAlgorithm::AES128, &key, &nonce, b"", &ct)
            .unwrap();
        assert_eq!(pt, b"data");
    }
}
