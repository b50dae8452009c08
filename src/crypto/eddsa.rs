use ed25519_dalek::{Signer, Verifier};
use rand::{CryptoRng, Rng};
use zeroize::Zeroizing;

use crate::crypto::ecc_curve::EccCurve;
use crate::errors::{ensure, ensure_eq, Result};
use crate::types::{EddsaSecretKey, Mpi, PlainSecretParams, PublicParams};

/// Generate an EdDSA key pair on Ed25519.
pub fn generate_key<R: Rng + CryptoRng>(rng: &mut R) -> (PublicParams, PlainSecretParams) {
    let mut bytes = Zeroizing::new([0u8; 32]);
    rng.fill_bytes(&mut *bytes);

    let secret = ed25519_dalek::SigningKey::from_bytes(&bytes);
    let public = secret.verifying_key();

    // native point format, prefixed with 0x40
    let mut q = Vec::with_capacity(33);
    q.push(0x40);
    q.extend_from_slice(&public.to_bytes());

    (
        PublicParams::EdDsa {
            curve: EccCurve::Ed25519,
            q: Mpi::from_raw(q),
        },
        PlainSecretParams::EdDsa(Mpi::from_slice(&secret.to_bytes())),
    )
}

/// Sign using EdDSA.
pub fn sign(secret_key: &EddsaSecretKey, digest: &[u8]) -> Result<Vec<Mpi>> {
    let key = ed25519_dalek::SigningKey::from_bytes(&secret_key.secret);

    let signature = key.sign(digest);
    let bytes = signature.to_bytes();

    Ok(vec![
        Mpi::from_slice(&bytes[..32]),
        Mpi::from_slice(&bytes[32..]),
    ])
}

/// Verify an EdDSA signature.
pub fn verify(curve: &EccCurve, q: &[u8], hashed: &[u8], sig: &[Mpi]) -> Result<()> {
    ensure_eq!(curve, &EccCurve::Ed25519, "unsupported eddsa curve");
    ensure_eq!(sig.len(), 2, "invalid signature");
    ensure_eq!(q.len(), 33, "invalid Q (len)");
    ensure_eq!(q[0], 0x40, "invalid Q (prefix)");

    let r = sig[0].as_bytes();
    let s = sig[1].as_bytes();
    ensure!(r.len() <= 32, "invalid R (len)");
    ensure!(s.len() <= 32, "invalid S (len)");

    let mut sig_bytes = [0u8; 64];
    sig_bytes[(32 - r.len())..32].copy_from_slice(r);
    sig_bytes[32 + (32 - s.len())..].copy_from_slice(s);

    let mut pk = [0u8; 32];
    pk.copy_from_slice(&q[1..]);

    let key = ed25519_dalek::VerifyingKey::from_bytes(&pk)?;
    let signature = ed25519_dalek::Signature::from_bytes(&sig_bytes);

    key.verify(hashed, &signature)?;

    Ok(())
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
        let (public, secret) = generate_key(&mut rng);

        let q = match &public {
            PublicParams::EdDsa { q, .. } => q.clone(),
            _ => panic!("invalid key generated"),
        };

        let key = match secret.as_repr(&public).unwrap() {
            SecretKeyRepr::EdDsa(key) => key,
            _ => panic!("invalid key generated"),
        };

        let digest = HashAlgorithm::Sha256.digest(b"signed data").unwrap();
        let sig = sign(&key, &digest).unwrap();
        verify(&EccCurve::Ed25519, q.as_bytes(), &digest, &sig).unwrap();

        let other = HashAlgorithm::Sha256.digest(b"tampered").unwrap();
        assert!(verify(&EccCurve::Ed25519, q.as_bytes(), &other, &sig).is_err());
    }
}
