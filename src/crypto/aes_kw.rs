use aes::{Aes128, Aes192, Aes256};
use generic_array::GenericArray;
use zeroize::Zeroizing;

use crate::errors::{Error, Result};

/// AES Key Wrap, as defined in RFC 3394.
pub fn wrap(key: &[u8], data: &[u8]) -> Result<Vec<u8>> {
    let mut out = vec![0u8; data.len() + 8];
    match key.len() {
        16 => {
            let kek = aes_kw::Kek::<Aes128>::new(GenericArray::from_slice(key));
            kek.wrap(data, &mut out)?;
        }
        24 => {
            let kek = aes_kw::Kek::<Aes192>::new(GenericArray::from_slice(key));
            kek.wrap(data, &mut out)?;
        }
        32 => {
            let kek = aes_kw::Kek::<Aes256>::new(GenericArray::from_slice(key));
            kek.wrap(data, &mut out)?;
        }
        _ => return Err(Error::InvalidKeyLength),
    }

    Ok(out)
}

/// AES Key Unwrap, as defined in RFC 3394.
pub fn unwrap(key: &[u8], data: &[u8]) -> Result<Zeroizing<Vec<u8>>> {
    if data.len() < 8 {
        return Err(Error::InvalidKeyLength);
    }

    let mut out = Zeroizing::new(vec![0u8; data.len() - 8]);
    match key.len() {
        16 => {
            let kek = aes_kw::Kek::<Aes128>::new(GenericArray::from_slice(key));
            kek.unwrap(data, &mut out)?;
        }
        24 => {
            let kek = aes_kw::Kek::<Aes192>::new(GenericArray::from_slice(key));
            kek.unwrap(data, &mut out)?;
        }
        32 => {
            let kek = aes_kw::Kek::<Aes256>::new(GenericArray::from_slice(key));
            kek.unwrap(data, &mut out)?;
        }
        _ => return Err(Error::InvalidKeyLength),
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    macro_rules! test_aes_kw {
        ($name:ident, $kek:expr, $input:expr, $output:expr) => {
            #[test]
            fn $name() {
                let kek = hex::decode($kek).unwrap();
                let input_bin = hex::decode($input).unwrap();
                let output_bin = hex::decode($output).unwrap();

                assert_eq!(
                    hex::encode(wrap(&kek, &input_bin).unwrap()),
                    $output.to_lowercase(),
                    "failed wrap"
                );
                assert_eq!(
                    hex::encode(unwrap(&kek, &output_bin).unwrap()),
                    $input.to_lowercase(),
                    "failed unwrap"
                );
            }
        };
    }

    // Test vectors from RFC 3394.
    test_aes_kw!(
        wrap_unwrap_128_key_128_kek,
        "000102030405060708090A0B0C0D0E0F",
        "00112233445566778899AABBCCDDEEFF",
        "1FA68B0A8112B447AEF34BD8FB5A7B829D3E862371D2CFE5"
    );
    test_aes_kw!(
        wrap_unwrap_128_key_256_kek,
        "000102030405060708090A0B0C0D0E0F101112131415161718191A1B1C1D1E1F",
        "00112233445566778899AABBCCDDEEFF",
        "64E8C3F9CE0F5BA263E9777905818A2A93C8191E7D6E8AE7"
    );
    test_aes_kw!(
        wrap_unwrap_256_key_256_kek,
        "000102030405060708090A0B0C0D0E0F101112131415161718191A1B1C1D1E1F",
        "00112233445566778899AABBCCDDEEFF000102030405060708090A0B0C0D0E0F",
        "28C9F404C4B810F4CBCCB35CFB87F8263F5786E2D80ED326CBC7F0E71A99F43BFB988B9B7A02DD21"
    );
}
