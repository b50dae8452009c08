use log::debug;
use num_bigint::{BigUint, RandBigInt};
use num_traits::One;
use rand::{CryptoRng, Rng};
use zeroize::Zeroizing;

use crate::errors::{ensure, ensure_eq, Error, Result};
use crate::types::{ElgamalSecretKey, Mpi};

/// EME-PKCS1-v1_5 encoding, used to pad the session key up to the size of
/// the group.
/// Ref: <https://tools.ietf.org/html/rfc4880.html#section-13.1.1>
fn pkcs1_encode<R: CryptoRng + Rng>(rng: &mut R, plain: &[u8], k: usize) -> Result<Vec<u8>> {
    ensure!(plain.len() <= k.saturating_sub(11), "message too long");

    let mut em = vec![0u8; k];
    em[1] = 0x02;

    // nonzero random padding
    for i in 2..(k - plain.len() - 1) {
        let mut b = 0u8;
        while b == 0 {
            b = rng.gen();
        }
        em[i] = b;
    }

    em[k - plain.len() - 1] = 0;
    em[k - plain.len()..].copy_from_slice(plain);

    Ok(em)
}

/// EME-PKCS1-v1_5 decoding.
fn pkcs1_decode(em: &[u8]) -> Result<Vec<u8>> {
    // the leading zero octet is already gone after bignum decoding
    ensure!(em.len() > 10, "message too short");
    ensure_eq!(em[0], 0x02, "invalid padding");

    let sep = em
        .iter()
        .skip(1)
        .position(|b| *b == 0)
        .ok_or(Error::UnpadError)?;

    Ok(em[sep + 2..].to_vec())
}

/// Elgamal encryption.
/// Ref: <https://tools.ietf.org/html/rfc4880.html#section-5.1>
pub fn encrypt<R: CryptoRng + Rng>(
    rng: &mut R,
    p: &Mpi,
    g: &Mpi,
    y: &Mpi,
    plain: &[u8],
) -> Result<(Mpi, Mpi)> {
    debug!("Elgamal encrypt");

    let p = BigUint::from(p);
    let g = BigUint::from(g);
    let y = BigUint::from(y);

    let k_size = p.to_bytes_be().len();
    let em = BigUint::from_bytes_be(&pkcs1_encode(rng, plain, k_size)?);

    // ephemeral exponent
    let one = BigUint::one();
    let k = rng.gen_biguint_range(&one, &(&p - &one));

    let c1 = g.modpow(&k, &p);
    let c2 = (em * y.modpow(&k, &p)) % &p;

    Ok((Mpi::from(c1), Mpi::from(c2)))
}

/// Elgamal decryption.
pub fn decrypt(key: &ElgamalSecretKey, first: &Mpi, second: &Mpi) -> Result<Vec<u8>> {
    debug!("Elgamal decrypt");

    let p = &key.p;
    let c1 = BigUint::from(first);
    let c2 = BigUint::from(second);

    // s = c1^x, m = c2 * s^-1 = c2 * c1^(p - 1 - x)  (p prime)
    let exp = p - BigUint::one() - &key.x;
    let m = (c2 * c1.modpow(&exp, p)) % p;

    let em = Zeroizing::new(m.to_bytes_be());
    pkcs1_decode(&em)
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use super::*;

    #[test]
    fn encrypt_decrypt_roundtrip() {
        let mut rng = ChaCha8Rng::seed_from_u64(0);

        // RFC 5114 1024-bit MODP group with 160-bit prime order subgroup
        let p = BigUint::parse_bytes(
            b"B10B8F96A080E01DDE92DE5EAE5D54EC52C99FBCFB06A3C69A6A9DCA52D23B61\
              6073E28675A23D189838EF1E2EE652C013ECB4AEA906112324975C3CD49B83BF\
              ACCBDD7D90C4BD7098488E9C219A73724EFFD6FAE5644738FAA31A4FF55BCCC0\
              A151AF5F0DC8B4BD45BF37DF365C1A65E68CFDA76D4DA708DF1FB2BC2E4A4371",
            16,
        )
        .unwrap();
        let g = BigUint::parse_bytes(
            b"A4D1CBD5C3FD34126765A442EFB99905F8104DD258AC507FD6406CFF14266D31\
              266FEA1E5C41564B777E690F5504F213160217B4B01B886A5E91547F9E2749F4\
              D7FBD7D3B9A92EE1909D0D2263F80A76A6A24C087A091F531DBF0A0169B6A28A\
              D662A4D18E73AFA32D779D5918D08BC8858F4DCEF97C2A24855E6EEB22B3B2E5",
            16,
        )
        .unwrap();

        let x = rng.gen_biguint_range(&BigUint::one(), &(&p - BigUint::one()));
        let y = g.modpow(&x, &p);

        let key = ElgamalSecretKey {
            x,
            p: p.clone(),
            g: g.clone(),
            y: y.clone(),
        };

        let plain = b"\x09some session key material\xff\x00\x01";
        let (c1, c2) = encrypt(
            &mut rng,
            &Mpi::from(&p),
            &Mpi::from(&g),
            &Mpi::from(&y),
            plain,
        )
        .unwrap();

        let decrypted = decrypt(&key, &c1, &c2).unwrap();
        assert_eq!(decrypted, plain);
    }
}
