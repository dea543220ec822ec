use aes::{Aes128, Aes256};
use cbc::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit, block_padding::Pkcs7};
use des::TdesEde3;
use getrandom::fill;
use zeroize::Zeroizing;

use super::CipherSuite;
use crate::error::{Result, TokenError};

/// Fill buffer with cryptographically secure random bytes
fn secure_random(buf: &mut [u8]) -> Result<()> {
    fill(buf).map_err(|_| TokenError::RandomnessError)
}

/// Generate a fresh IV sized for the suite (empty for the null suite)
pub fn generate_iv(suite: CipherSuite) -> Result<Vec<u8>> {
    let mut iv = vec![0u8; suite.iv_len()];
    if !iv.is_empty() {
        secure_random(&mut iv)?;
    }
    Ok(iv)
}

pub(crate) fn cbc_encrypt<C>(key: &[u8], iv: &[u8], plaintext: &[u8]) -> Result<Vec<u8>>
where
    C: BlockEncryptMut + KeyIvInit,
{
    let cipher = C::new_from_slices(key, iv)
        .map_err(|_| TokenError::EncryptionError("invalid key or IV length".into()))?;
    Ok(cipher.encrypt_padded_vec_mut::<Pkcs7>(plaintext))
}

pub(crate) fn cbc_decrypt<C>(
    key: &[u8],
    iv: &[u8],
    ciphertext: &[u8],
) -> Result<Zeroizing<Vec<u8>>>
where
    C: BlockDecryptMut + KeyIvInit,
{
    let cipher = C::new_from_slices(key, iv)
        .map_err(|_| TokenError::DecryptionError("invalid key or IV length".into()))?;
    let plaintext = cipher
        .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
        .map_err(|_| TokenError::DecryptionError("invalid password or corrupted data".into()))?;
    Ok(Zeroizing::new(plaintext))
}

/// Encrypt plaintext with the suite's CBC cipher and PKCS#7 padding.
///
/// The null suite returns the input unchanged.
pub fn encrypt(suite: CipherSuite, key: &[u8], iv: &[u8], plaintext: &[u8]) -> Result<Vec<u8>> {
    match suite {
        CipherSuite::Null => Ok(plaintext.to_vec()),
        CipherSuite::Aes256Cbc => cbc_encrypt::<cbc::Encryptor<Aes256>>(key, iv, plaintext),
        CipherSuite::Aes128Cbc => cbc_encrypt::<cbc::Encryptor<Aes128>>(key, iv, plaintext),
        CipherSuite::TripleDesCbc => cbc_encrypt::<cbc::Encryptor<TdesEde3>>(key, iv, plaintext),
    }
}

/// Decrypt ciphertext and strip PKCS#7 padding.
pub fn decrypt(
    suite: CipherSuite,
    key: &[u8],
    iv: &[u8],
    ciphertext: &[u8],
) -> Result<Zeroizing<Vec<u8>>> {
    match suite {
        CipherSuite::Null => Ok(Zeroizing::new(ciphertext.to_vec())),
        CipherSuite::Aes256Cbc => cbc_decrypt::<cbc::Decryptor<Aes256>>(key, iv, ciphertext),
        CipherSuite::Aes128Cbc => cbc_decrypt::<cbc::Decryptor<Aes128>>(key, iv, ciphertext),
        CipherSuite::TripleDesCbc => cbc_decrypt::<cbc::Decryptor<TdesEde3>>(key, iv, ciphertext),
    }
}
