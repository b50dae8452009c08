use rand::{CryptoRng, Rng};

use crate::crypto::hash::HashAlgorithm;
use crate::crypto::public_key::PublicKeyAlgorithm;
use crate::errors::Result;
use crate::types::{EskBytes, Fingerprint, KeyId, Mpi};

pub trait KeyTrait {
    /// Returns the fingerprint of the key.
    fn fingerprint(&self) -> Fingerprint;

    /// Returns the Key ID of the key.
    fn key_id(&self) -> KeyId;

    fn algorithm(&self) -> PublicKeyAlgorithm;
}

impl<T: KeyTrait> KeyTrait for &T {
    fn fingerprint(&self) -> Fingerprint {
        (*self).fingerprint()
    }

    fn key_id(&self) -> KeyId {
        (*self).key_id()
    }

    fn algorithm(&self) -> PublicKeyAlgorithm {
        (*self).algorithm()
    }
}

pub trait PublicKeyTrait: KeyTrait {
    /// Verify a signed message.
    /// Data will be hashed using `hash`, before verifying.
    fn verify_signature(&self, hash: HashAlgorithm, data: &[u8], sig: &[Mpi]) -> Result<()>;

    /// Encrypt the given `plain` for this key.
    fn encrypt<R: Rng + CryptoRng>(&self, rng: &mut R, plain: &[u8]) -> Result<EskBytes>;

    /// Serializes the key in the old packet framing (`0x99` prefixed), the
    /// form hashed into signatures and fingerprints.
    fn to_writer_old(&self, writer: &mut impl std::io::Write) -> Result<()>;
}

impl<T: PublicKeyTrait> PublicKeyTrait for &T {
    fn verify_signature(&self, hash: HashAlgorithm, data: &[u8], sig: &[Mpi]) -> Result<()> {
        (*self).verify_signature(hash, data, sig)
    }

    fn encrypt<R: Rng + CryptoRng>(&self, rng: &mut R, plain: &[u8]) -> Result<EskBytes> {
        (*self).encrypt(rng, plain)
    }

    fn to_writer_old(&self, writer: &mut impl std::io::Write) -> Result<()> {
        (*self).to_writer_old(writer)
    }
}

pub trait SecretKeyTrait: PublicKeyTrait {
    /// True once the secret material is available in plaintext.
    fn is_decrypted(&self) -> bool;

    /// Create a signature over the precomputed `digest`.
    /// Fails with `Error::LockedKey` when the material is still encrypted
    /// and `Error::NoSecretMaterial` for stripped keys.
    fn create_signature(&self, hash: HashAlgorithm, digest: &[u8]) -> Result<Vec<Mpi>>;
}

impl<T: SecretKeyTrait> SecretKeyTrait for &T {
    fn is_decrypted(&self) -> bool {
        (*self).is_decrypted()
    }

    fn create_signature(&self, hash: HashAlgorithm, digest: &[u8]) -> Result<Vec<Mpi>> {
        (*self).create_signature(hash, digest)
    }
}
