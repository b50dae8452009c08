use std::io;

use chrono::{DateTime, Utc};
use log::debug;
use rand::{CryptoRng, Rng};
use sha1::{Digest, Sha1};
use zeroize::Zeroizing;

use crate::crypto::hash::HashAlgorithm;
use crate::crypto::public_key::PublicKeyAlgorithm;
use crate::crypto::sym::SymmetricKeyAlgorithm;
use crate::crypto::{dsa, ecdsa, eddsa, rsa};
use crate::errors::{Error, Result};
use crate::packet::key::public::PubKeyInner;
use crate::packet::PacketTrait;
use crate::ser::Serialize;
use crate::types::{
    EncryptedSecretParams, EskBytes, Fingerprint, KeyId, KeyTrait, KeyVersion, Mpi,
    PlainSecretParams, PublicKeyTrait, PublicParams, SecretKeyRepr, SecretKeyTrait, SecretParams,
    StringToKey, Tag,
};

macro_rules! impl_secret_key {
    ($name:ident, $tag:expr, $public:ident) => {
        /// Ref: <https://tools.ietf.org/html/rfc4880.html#section-5.5.3>
        #[derive(Debug, Clone, PartialEq, Eq)]
        pub struct $name {
            pub(crate) details: PubKeyInner,
            pub(crate) secret_params: SecretParams,
        }

        impl $name {
            pub fn new(public: crate::packet::$public, secret_params: PlainSecretParams) -> Self {
                $name {
                    details: public.0,
                    secret_params: SecretParams::Plain(secret_params),
                }
            }

            /// Parses the packet from the given body.
            pub fn from_slice(input: &[u8]) -> Result<Self> {
                let mut i = input;
                let details = PubKeyInner::from_buf(&mut i)?;
                let secret_params = SecretParams::from_buf(details.algorithm, &mut i)?;

                Ok($name {
                    details,
                    secret_params,
                })
            }

            pub fn version(&self) -> KeyVersion {
                self.details.version
            }

            pub fn created_at(&self) -> &DateTime<Utc> {
                &self.details.created_at
            }

            pub fn expiration(&self) -> Option<u16> {
                self.details.expiration
            }

            pub fn public_params(&self) -> &PublicParams {
                &self.details.public_params
            }

            pub fn secret_params(&self) -> &SecretParams {
                &self.secret_params
            }

            /// The public packet for this secret key.
            pub fn public_key(&self) -> crate::packet::$public {
                crate::packet::$public(self.details.clone())
            }

            /// The secret key material was stripped (gnu-dummy).
            pub fn is_stripped(&self) -> bool {
                matches!(self.secret_params, SecretParams::Stripped)
            }

            /// Decrypt the secret key material in place.
            ///
            /// Returns `Ok(false)` when the passphrase does not match
            /// (detected through the material checksum); structural
            /// failures and stripped keys raise errors.
            pub fn decrypt(&mut self, passphrase: &str) -> Result<bool> {
                let enc = match &self.secret_params {
                    SecretParams::Plain(_) => return Ok(true),
                    SecretParams::Stripped => return Err(Error::NoSecretMaterial),
                    SecretParams::Encrypted(enc) => enc,
                };

                debug!("decrypting secret key material");

                let key = Zeroizing::new(
                    enc.s2k.derive_key(passphrase, enc.alg.key_size())?,
                );

                let mut data = Zeroizing::new(enc.data.clone());
                enc.alg
                    .decrypt_with_iv_regular(&key, &enc.iv, &mut data)?;

                let params = match PlainSecretParams::from_slice_with_checksum(
                    self.details.algorithm,
                    &data,
                    enc.has_sha1_checksum(),
                ) {
                    Ok(params) => params,
                    Err(_) => return Ok(false),
                };

                self.secret_params = SecretParams::Plain(params);

                Ok(true)
            }

            /// Encrypt the secret key material with the given passphrase.
            pub fn set_password<R: Rng + CryptoRng>(
                &mut self,
                rng: &mut R,
                passphrase: &str,
            ) -> Result<()> {
                let s2k = StringToKey::new_iterated(rng);
                self.set_password_with_s2k(rng, passphrase, s2k, SymmetricKeyAlgorithm::AES128)
            }

            pub fn set_password_with_s2k<R: Rng + CryptoRng>(
                &mut self,
                rng: &mut R,
                passphrase: &str,
                s2k: StringToKey,
                alg: SymmetricKeyAlgorithm,
            ) -> Result<()> {
                let plain = match &self.secret_params {
                    SecretParams::Plain(plain) => plain,
                    SecretParams::Encrypted(_) => return Err(Error::LockedKey),
                    SecretParams::Stripped => return Err(Error::NoSecretMaterial),
                };

                let mut data = Zeroizing::new(plain.to_bytes()?);
                let hash: [u8; 20] = Sha1::digest(&data).into();
                data.extend_from_slice(&hash);

                let key = Zeroizing::new(s2k.derive_key(passphrase, alg.key_size())?);

                let mut iv = vec![0u8; alg.block_size()];
                rng.fill_bytes(&mut iv);

                let mut encrypted = data.to_vec();
                alg.encrypt_with_iv_regular(&key, &iv, &mut encrypted)?;

                self.secret_params = SecretParams::Encrypted(EncryptedSecretParams {
                    data: encrypted,
                    iv,
                    alg,
                    s2k,
                    usage: 254,
                });

                Ok(())
            }

            /// The usable secret key material. Fails when locked or
            /// stripped.
            pub fn secret_repr(&self) -> Result<SecretKeyRepr> {
                match &self.secret_params {
                    SecretParams::Plain(plain) => plain.as_repr(&self.details.public_params),
                    SecretParams::Encrypted(_) => Err(Error::LockedKey),
                    SecretParams::Stripped => Err(Error::NoSecretMaterial),
                }
            }
        }

        impl Serialize for $name {
            fn to_writer<W: io::Write>(&self, writer: &mut W) -> Result<()> {
                self.details.to_writer(writer)?;
                self.secret_params.to_writer(writer)?;

                Ok(())
            }
        }

        impl PacketTrait for $name {
            fn tag(&self) -> Tag {
                $tag
            }
        }

        impl KeyTrait for $name {
            fn fingerprint(&self) -> Fingerprint {
                self.details.fingerprint()
            }

            fn key_id(&self) -> KeyId {
                self.details.key_id()
            }

            fn algorithm(&self) -> PublicKeyAlgorithm {
                self.details.algorithm
            }
        }

        impl PublicKeyTrait for $name {
            fn verify_signature(
                &self,
                hash: HashAlgorithm,
                data: &[u8],
                sig: &[Mpi],
            ) -> Result<()> {
                self.details.verify_signature(hash, data, sig)
            }

            fn encrypt<R: Rng + CryptoRng>(&self, rng: &mut R, plain: &[u8]) -> Result<EskBytes> {
                self.details.encrypt(rng, plain)
            }

            fn to_writer_old(&self, writer: &mut impl io::Write) -> Result<()> {
                self.details.to_writer_old(writer)
            }
        }

        impl SecretKeyTrait for $name {
            fn is_decrypted(&self) -> bool {
                matches!(self.secret_params, SecretParams::Plain(_))
            }

            fn create_signature(&self, hash: HashAlgorithm, digest: &[u8]) -> Result<Vec<Mpi>> {
                let repr = self.secret_repr()?;

                match repr {
                    SecretKeyRepr::Rsa(ref key) => rsa::sign(key, hash, digest),
                    SecretKeyRepr::Dsa(ref key) => dsa::sign(key, hash, digest),
                    SecretKeyRepr::Elgamal(_) => {
                        crate::errors::unsupported_err!("signing with Elgamal keys")
                    }
                    SecretKeyRepr::Ecdsa(ref key) => ecdsa::sign(key, digest),
                    SecretKeyRepr::Ecdh(_) => {
                        crate::errors::bail!("ECDH is an encryption only algorithm")
                    }
                    SecretKeyRepr::EdDsa(ref key) => eddsa::sign(key, digest),
                }
            }
        }
    };
}

impl_secret_key!(SecretKey, Tag::SecretKey, PublicKey);
impl_secret_key!(SecretSubkey, Tag::SecretSubkey, PublicSubkey);

/// Decrypt a session key encrypted to this secret key.
pub(crate) fn decrypt_session_key(
    repr: &SecretKeyRepr,
    values: &EskBytes,
    fingerprint: &Fingerprint,
) -> Result<Vec<u8>> {
    match (repr, values) {
        (SecretKeyRepr::Rsa(key), EskBytes::Rsa { mpi }) => crate::crypto::rsa::decrypt(key, mpi),
        (SecretKeyRepr::Elgamal(key), EskBytes::Elgamal { first, second }) => {
            crate::crypto::elgamal::decrypt(key, first, second)
        }
        (
            SecretKeyRepr::Ecdh(key),
            EskBytes::Ecdh {
                public_point,
                encrypted_session_key,
            },
        ) => crate::crypto::ecdh::decrypt(
            key,
            public_point,
            encrypted_session_key,
            fingerprint.as_bytes(),
        ),
        (SecretKeyRepr::Dsa(_), _) | (SecretKeyRepr::Ecdsa(_), _) | (SecretKeyRepr::EdDsa(_), _) => {
            crate::errors::bail!("not an encryption key")
        }
        _ => crate::errors::bail!("mismatched session key values for this key"),
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use super::*;
    use crate::packet::PublicKey;
    use chrono::SubsecRound;

    fn test_key<R: Rng + CryptoRng>(rng: &mut R) -> SecretKey {
        let (public_params, plain) = eddsa::generate_key(rng);
        let public = PublicKey::new(
            KeyVersion::V4,
            PublicKeyAlgorithm::EdDsa,
            Utc::now().trunc_subsecs(0),
            None,
            public_params,
        )
        .unwrap();

        SecretKey::new(public, plain)
    }

    #[test]
    fn lock_unlock_roundtrip() {
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let mut key = test_key(&mut rng);
        let plain_before = key.secret_params.clone();

        assert!(key.is_decrypted());
        key.set_password(&mut rng, "banana").unwrap();
        assert!(!key.is_decrypted());

        // wrong passphrase fails soft
        assert!(!key.decrypt("apple").unwrap());
        assert!(!key.is_decrypted());

        assert!(key.decrypt("banana").unwrap());
        assert!(key.is_decrypted());
        assert_eq!(key.secret_params, plain_before);
    }

    #[test]
    fn locked_key_cannot_sign() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let mut key = test_key(&mut rng);
        key.set_password(&mut rng, "s3cret").unwrap();

        let res = key.create_signature(HashAlgorithm::Sha256, &[0u8; 32]);
        assert!(matches!(res, Err(Error::LockedKey)));
    }

    #[test]
    fn serialized_roundtrip() {
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let mut key = test_key(&mut rng);
        key.set_password(&mut rng, "round").unwrap();

        let bytes = key.to_bytes().unwrap();
        let mut back = SecretKey::from_slice(&bytes).unwrap();
        assert_eq!(key, back);

        assert!(back.decrypt("round").unwrap());
    }

    #[test]
    fn stripped_key() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let mut key = test_key(&mut rng);
        key.secret_params = SecretParams::Stripped;

        let bytes = key.to_bytes().unwrap();
        let mut back = SecretKey::from_slice(&bytes).unwrap();
        assert!(back.is_stripped());

        assert!(matches!(
            back.decrypt("anything"),
            Err(Error::NoSecretMaterial)
        ));
        assert!(matches!(
            back.create_signature(HashAlgorithm::Sha256, &[0u8; 32]),
            Err(Error::NoSecretMaterial)
        ));
    }
}
