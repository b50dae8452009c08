use num_enum::{FromPrimitive, IntoPrimitive};

/// Available public key algorithms.
/// Ref: <https://tools.ietf.org/html/rfc4880.html#section-9.1>
#[derive(Debug, PartialEq, Eq, Copy, Clone, Hash, FromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum PublicKeyAlgorithm {
    /// RSA (Encrypt and Sign)
    RSA = 1,
    /// RSA Encrypt-Only (deprecated)
    RSAEncrypt = 2,
    /// RSA Sign-Only (deprecated)
    RSASign = 3,
    /// Elgamal (Encrypt-Only)
    Elgamal = 16,
    /// DSA (Digital Signature Algorithm)
    DSA = 17,
    /// Elliptic Curve Diffie-Hellman
    ECDH = 18,
    /// Elliptic Curve Digital Signature Algorithm
    ECDSA = 19,
    /// Elgamal (Encrypt and Sign, deprecated)
    ElgamalSign = 20,
    /// EdDSA (legacy framing)
    EdDsa = 22,

    #[num_enum(catch_all)]
    Other(u8),
}

impl PublicKeyAlgorithm {
    pub fn can_sign(self) -> bool {
        matches!(
            self,
            PublicKeyAlgorithm::RSA
                | PublicKeyAlgorithm::RSASign
                | PublicKeyAlgorithm::DSA
                | PublicKeyAlgorithm::ECDSA
                | PublicKeyAlgorithm::EdDsa
        )
    }

    pub fn can_encrypt(self) -> bool {
        matches!(
            self,
            PublicKeyAlgorithm::RSA
                | PublicKeyAlgorithm::RSAEncrypt
                | PublicKeyAlgorithm::Elgamal
                | PublicKeyAlgorithm::ECDH
        )
    }
}
