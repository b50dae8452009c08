use std::io;

use bytes::Buf;
use num_bigint::BigUint;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::crypto::checksum;
use crate::crypto::ecc_curve::EccCurve;
use crate::crypto::public_key::PublicKeyAlgorithm;
use crate::errors::{bail, ensure, ensure_eq, unsupported_err, Result};
use crate::ser::Serialize;
use crate::types::{
    DsaSecretKey, EcdhSecretKey, EcdsaSecretKey, EddsaSecretKey, ElgamalSecretKey, Mpi,
    PublicParams, SecretKeyRepr,
};

/// Decrypted, algorithm specific secret key material.
/// Ref: <https://tools.ietf.org/html/rfc4880.html#section-5.5.3>
#[derive(Debug, PartialEq, Eq, Clone, Zeroize, ZeroizeOnDrop)]
pub enum PlainSecretParams {
    Rsa { d: Mpi, p: Mpi, q: Mpi, u: Mpi },
    Dsa(Mpi),
    Elgamal(Mpi),
    Ecdsa(Mpi),
    Ecdh(Mpi),
    EdDsa(Mpi),
}

impl PlainSecretParams {
    pub fn from_buf<B: Buf>(alg: PublicKeyAlgorithm, i: &mut B) -> Result<Self> {
        match alg {
            PublicKeyAlgorithm::RSA
            | PublicKeyAlgorithm::RSAEncrypt
            | PublicKeyAlgorithm::RSASign => {
                let d = Mpi::from_buf(i)?;
                let p = Mpi::from_buf(i)?;
                let q = Mpi::from_buf(i)?;
                let u = Mpi::from_buf(i)?;
                Ok(PlainSecretParams::Rsa { d, p, q, u })
            }
            PublicKeyAlgorithm::DSA => Ok(PlainSecretParams::Dsa(Mpi::from_buf(i)?)),
            PublicKeyAlgorithm::Elgamal | PublicKeyAlgorithm::ElgamalSign => {
                Ok(PlainSecretParams::Elgamal(Mpi::from_buf(i)?))
            }
            PublicKeyAlgorithm::ECDSA => Ok(PlainSecretParams::Ecdsa(Mpi::from_buf(i)?)),
            PublicKeyAlgorithm::ECDH => Ok(PlainSecretParams::Ecdh(Mpi::from_buf(i)?)),
            PublicKeyAlgorithm::EdDsa => Ok(PlainSecretParams::EdDsa(Mpi::from_buf(i)?)),
            PublicKeyAlgorithm::Other(v) => {
                unsupported_err!("secret params for algorithm {}", v)
            }
        }
    }

    /// Parse from a decrypted buffer, verifying the trailing checksum.
    /// `sha1_checksum` selects between the 20 octet SHA1 form (s2k usage 254)
    /// and the two octet simple sum.
    pub fn from_slice_with_checksum(
        alg: PublicKeyAlgorithm,
        data: &[u8],
        sha1_checksum: bool,
    ) -> Result<Self> {
        let checksum_len = if sha1_checksum { 20 } else { 2 };
        ensure!(data.len() > checksum_len, "secret params too short");

        let (body, expected) = data.split_at(data.len() - checksum_len);
        if sha1_checksum {
            checksum::sha1(expected, body)?;
        } else {
            checksum::simple(expected, body)?;
        }

        let mut buf = body;
        let params = Self::from_buf(alg, &mut buf)?;
        ensure_eq!(buf.len(), 0, "trailing data after secret params");

        Ok(params)
    }

    /// Build the usable in-memory representation, combining with the public
    /// material.
    pub fn as_repr(&self, public: &PublicParams) -> Result<SecretKeyRepr> {
        match (self, public) {
            (PlainSecretParams::Rsa { d, p, q, .. }, PublicParams::Rsa { n, e }) => {
                let key = rsa::RsaPrivateKey::from_components(
                    BigUint::from(n),
                    BigUint::from(e),
                    BigUint::from(d),
                    vec![BigUint::from(p), BigUint::from(q)],
                )?;
                Ok(SecretKeyRepr::Rsa(key))
            }
            (PlainSecretParams::Dsa(x), PublicParams::Dsa { p, q, g, y }) => {
                Ok(SecretKeyRepr::Dsa(DsaSecretKey {
                    x: x.into(),
                    p: p.into(),
                    q: q.into(),
                    g: g.into(),
                    y: y.into(),
                }))
            }
            (PlainSecretParams::Elgamal(x), PublicParams::Elgamal { p, g, y }) => {
                Ok(SecretKeyRepr::Elgamal(ElgamalSecretKey {
                    x: x.into(),
                    p: p.into(),
                    g: g.into(),
                    y: y.into(),
                }))
            }
            (PlainSecretParams::Ecdsa(d), PublicParams::Ecdsa { curve, .. }) => {
                Ok(SecretKeyRepr::Ecdsa(EcdsaSecretKey {
                    curve: curve.clone(),
                    d: d.as_bytes().to_vec(),
                }))
            }
            (PlainSecretParams::Ecdh(d), PublicParams::Ecdh {
                curve,
                hash,
                alg_sym,
                ..
            }) => Ok(SecretKeyRepr::Ecdh(EcdhSecretKey {
                curve: curve.clone(),
                secret: d.as_bytes().to_vec(),
                hash: *hash,
                alg_sym: *alg_sym,
                oid: curve.oid(),
            })),
            (PlainSecretParams::EdDsa(seed), PublicParams::EdDsa { curve, .. }) => {
                ensure_eq!(curve, &EccCurve::Ed25519, "unsupported eddsa curve");
                let bytes = seed.to_padded(32);
                let mut secret = [0u8; 32];
                secret.copy_from_slice(&bytes);
                Ok(SecretKeyRepr::EdDsa(EddsaSecretKey { secret }))
            }
            _ => bail!("inconsistent key material: secret and public params disagree"),
        }
    }
}

impl Serialize for PlainSecretParams {
    fn to_writer<W: io::Write>(&self, writer: &mut W) -> Result<()> {
        match self {
            PlainSecretParams::Rsa { d, p, q, u } => {
                d.to_writer(writer)?;
                p.to_writer(writer)?;
                q.to_writer(writer)?;
                u.to_writer(writer)?;
            }
            PlainSecretParams::Dsa(x)
            | PlainSecretParams::Elgamal(x)
            | PlainSecretParams::Ecdsa(x)
            | PlainSecretParams::Ecdh(x)
            | PlainSecretParams::EdDsa(x) => {
                x.to_writer(writer)?;
            }
        }

        Ok(())
    }
}
