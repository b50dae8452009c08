use num_bigint::BigUint;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::crypto::ecc_curve::EccCurve;
use crate::crypto::hash::HashAlgorithm;
use crate::crypto::sym::SymmetricKeyAlgorithm;

/// The decrypted, in-memory representation of the secret key material,
/// ready to be used by the algorithm implementations.
#[derive(Debug)]
pub enum SecretKeyRepr {
    Rsa(rsa::RsaPrivateKey),
    Dsa(DsaSecretKey),
    Elgamal(ElgamalSecretKey),
    Ecdsa(EcdsaSecretKey),
    Ecdh(EcdhSecretKey),
    EdDsa(EddsaSecretKey),
}

#[derive(Clone, PartialEq, Eq)]
pub struct DsaSecretKey {
    pub x: BigUint,
    pub p: BigUint,
    pub q: BigUint,
    pub g: BigUint,
    pub y: BigUint,
}

impl std::fmt::Debug for DsaSecretKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DsaSecretKey").finish_non_exhaustive()
    }
}

#[derive(Clone, PartialEq, Eq)]
pub struct ElgamalSecretKey {
    pub x: BigUint,
    pub p: BigUint,
    pub g: BigUint,
    pub y: BigUint,
}

impl std::fmt::Debug for ElgamalSecretKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ElgamalSecretKey").finish_non_exhaustive()
    }
}

#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct EcdsaSecretKey {
    #[zeroize(skip)]
    pub curve: EccCurve,
    pub d: Vec<u8>,
}

impl std::fmt::Debug for EcdsaSecretKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EcdsaSecretKey")
            .field("curve", &self.curve)
            .finish_non_exhaustive()
    }
}

#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct EcdhSecretKey {
    #[zeroize(skip)]
    pub curve: EccCurve,
    /// Big endian secret scalar.
    pub secret: Vec<u8>,
    #[zeroize(skip)]
    pub hash: HashAlgorithm,
    #[zeroize(skip)]
    pub alg_sym: SymmetricKeyAlgorithm,
    #[zeroize(skip)]
    pub oid: Vec<u8>,
}

impl std::fmt::Debug for EcdhSecretKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EcdhSecretKey")
            .field("curve", &self.curve)
            .field("hash", &self.hash)
            .field("alg_sym", &self.alg_sym)
            .finish_non_exhaustive()
    }
}

#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct EddsaSecretKey {
    pub secret: [u8; 32],
}

impl std::fmt::Debug for EddsaSecretKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EddsaSecretKey").finish_non_exhaustive()
    }
}
