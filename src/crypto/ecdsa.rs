use elliptic_curve::sec1::ToEncodedPoint;
use rand::{CryptoRng, Rng};
use signature::hazmat::{PrehashSigner, PrehashVerifier};

use crate::crypto::ecc_curve::EccCurve;
use crate::errors::{ensure, ensure_eq, unsupported_err, Result};
use crate::types::{EcdsaSecretKey, Mpi, PlainSecretParams, PublicParams};

/// Generate an ECDSA key pair.
pub fn generate_key<R: Rng + CryptoRng>(
    rng: &mut R,
    curve: &EccCurve,
) -> Result<(PublicParams, PlainSecretParams)> {
    match curve {
        EccCurve::P256 => {
            let secret = p256::SecretKey::random(rng);
            let public = secret.public_key();
            Ok((
                PublicParams::Ecdsa {
                    curve: EccCurve::P256,
                    p: Mpi::from_slice(public.to_encoded_point(false).as_bytes()),
                },
                PlainSecretParams::Ecdsa(Mpi::from_slice(&secret.to_bytes())),
            ))
        }
        EccCurve::P384 => {
            let secret = p384::SecretKey::random(rng);
            let public = secret.public_key();
            Ok((
                PublicParams::Ecdsa {
                    curve: EccCurve::P384,
                    p: Mpi::from_slice(public.to_encoded_point(false).as_bytes()),
                },
                PlainSecretParams::Ecdsa(Mpi::from_slice(&secret.to_bytes())),
            ))
        }
        _ => unsupported_err!("curve {:?} for ECDSA", curve.to_string()),
    }
}

/// Verify an ECDSA signature.
pub fn verify(curve: &EccCurve, p: &[u8], hashed: &[u8], sig: &[Mpi]) -> Result<()> {
    ensure_eq!(sig.len(), 2, "invalid signature");

    match curve {
        EccCurve::P256 => {
            const FLEN: usize = 32;
            let r = sig[0].as_bytes();
            let s = sig[1].as_bytes();

            ensure!(r.len() <= FLEN, "invalid R (len)");
            ensure!(s.len() <= FLEN, "invalid S (len)");
            ensure_eq!(p.len(), 2 * FLEN + 1, "invalid P (len)");
            ensure_eq!(p[0], 0x04, "invalid P (prefix)");

            let pk = p256::ecdsa::VerifyingKey::from_sec1_bytes(p)?;

            // re-pad values that were encoded short
            let mut sig_bytes = [0u8; 2 * FLEN];
            sig_bytes[(FLEN - r.len())..FLEN].copy_from_slice(r);
            sig_bytes[FLEN + (FLEN - s.len())..].copy_from_slice(s);

            let sig = p256::ecdsa::Signature::from_slice(&sig_bytes)?;
            pk.verify_prehash(hashed, &sig)?;

            Ok(())
        }
        EccCurve::P384 => {
            const FLEN: usize = 48;
            let r = sig[0].as_bytes();
            let s = sig[1].as_bytes();

            ensure!(r.len() <= FLEN, "invalid R (len)");
            ensure!(s.len() <= FLEN, "invalid S (len)");
            ensure_eq!(p.len(), 2 * FLEN + 1, "invalid P (len)");
            ensure_eq!(p[0], 0x04, "invalid P (prefix)");

            let pk = p384::ecdsa::VerifyingKey::from_sec1_bytes(p)?;

            let mut sig_bytes = [0u8; 2 * FLEN];
            sig_bytes[(FLEN - r.len())..FLEN].copy_from_slice(r);
            sig_bytes[FLEN + (FLEN - s.len())..].copy_from_slice(s);

            let sig = p384::ecdsa::Signature::from_slice(&sig_bytes)?;
            pk.verify_prehash(hashed, &sig)?;

            Ok(())
        }
        _ => unsupported_err!("curve {:?} for ECDSA", curve.to_string()),
    }
}

/// Sign using ECDSA.
pub fn sign(secret_key: &EcdsaSecretKey, digest: &[u8]) -> Result<Vec<Mpi>> {
    let (r, s) = match secret_key.curve {
        EccCurve::P256 => {
            let d = left_pad(&secret_key.d, 32)?;
            let secret = p256::ecdsa::SigningKey::from_slice(&d)?;
            let signature: p256::ecdsa::Signature = secret.sign_prehash(digest)?;
            let (r, s) = signature.split_bytes();
            (r.to_vec(), s.to_vec())
        }
        EccCurve::P384 => {
            let d = left_pad(&secret_key.d, 48)?;
            let secret = p384::ecdsa::SigningKey::from_slice(&d)?;
            let signature: p384::ecdsa::Signature = secret.sign_prehash(digest)?;
            let (r, s) = signature.split_bytes();
            (r.to_vec(), s.to_vec())
        }
        _ => unsupported_err!("curve {:?} for ECDSA", secret_key.curve.to_string()),
    };

    Ok(vec![Mpi::from_slice(&r), Mpi::from_slice(&s)])
}

fn left_pad(bytes: &[u8], size: usize) -> Result<Vec<u8>> {
    ensure!(bytes.len() <= size, "invalid secret scalar length");
    let mut out = vec![0u8; size - bytes.len()];
    out.extend_from_slice(bytes);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use super::*;
    use crate::crypto::hash::HashAlgorithm;
    use crate::types::SecretKeyRepr;

    #[test]
    fn sign_verify_roundtrip() {
        let mut rng = ChaCha8Rng::seed_from_u64(0);

        for curve in [EccCurve::P256, EccCurve::P384] {
            let (public, secret) = generate_key(&mut rng, &curve).unwrap();
            let p = match &public {
                PublicParams::Ecdsa { p, .. } => p.clone(),
                _ => panic!("invalid key generated"),
            };

            let key = match secret.as_repr(&public).unwrap() {
                SecretKeyRepr::Ecdsa(key) => key,
                _ => panic!("invalid key generated"),
            };

            let digest = HashAlgorithm::Sha256.digest(b"data to sign").unwrap();
            let sig = sign(&key, &digest).unwrap();
            verify(&curve, p.as_bytes(), &digest, &sig).unwrap();

            let other = HashAlgorithm::Sha256.digest(b"data to sigm").unwrap();
            assert!(verify(&curve, p.as_bytes(), &other, &sig).is_err());
        }
    }
}
