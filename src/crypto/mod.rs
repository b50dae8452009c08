//! Cryptographic primitives: algorithm registries, symmetric and
//! asymmetric operations, key derivation and checksums.

pub mod aead;
pub mod aes_kw;
pub mod checksum;
pub mod dsa;
pub mod ecc_curve;
pub mod ecdh;
pub mod ecdsa;
pub mod eddsa;
pub mod elgamal;
pub mod hash;
pub mod public_key;
pub mod rsa;
pub mod sym;

pub use self::aead::AeadAlgorithm;
pub use self::ecc_curve::EccCurve;
pub use self::hash::HashAlgorithm;
pub use self::public_key::PublicKeyAlgorithm;
pub use self::sym::SymmetricKeyAlgorithm;
