//! Reversible at-rest obfuscation of the token password itself.
//!
//! Operators keep the shared OpenToken password in configuration files in this
//! form. It is 3DES-EDE3-CBC with PKCS#7 padding under an operator-supplied
//! key and IV, and is unrelated to the token wire format.

use base64::{Engine as _, engine::general_purpose::STANDARD};
use des::TdesEde3;
use zeroize::Zeroizing;

use super::cipher::{cbc_decrypt, cbc_encrypt};
use crate::error::{Result, TokenError};

/// Length of the 3DES obfuscation key (24 bytes).
pub const OBFUSCATION_KEY_LEN: usize = 24;
/// Length of the 3DES obfuscation IV (8 bytes).
pub const OBFUSCATION_IV_LEN: usize = 8;

type Encryptor = cbc::Encryptor<TdesEde3>;
type Decryptor = cbc::Decryptor<TdesEde3>;

fn check_lengths(key: &[u8], iv: &[u8]) -> Result<()> {
    if key.len() != OBFUSCATION_KEY_LEN {
        return Err(TokenError::ObfuscationError(format!(
            "key must be {OBFUSCATION_KEY_LEN} bytes, got {}",
            key.len()
        )));
    }
    if iv.len() != OBFUSCATION_IV_LEN {
        return Err(TokenError::ObfuscationError(format!(
            "IV must be {OBFUSCATION_IV_LEN} bytes, got {}",
            iv.len()
        )));
    }
    Ok(())
}

pub fn obfuscate(plain: &str, key: &[u8], iv: &[u8]) -> Result<Vec<u8>> {
    check_lengths(key, iv)?;
    cbc_encrypt::<Encryptor>(key, iv, plain.as_bytes())
        .map_err(|e| TokenError::ObfuscationError(e.to_string()))
}

pub fn deobfuscate(data: &[u8], key: &[u8], iv: &[u8]) -> Result<Zeroizing<String>> {
    check_lengths(key, iv)?;
    let plain = cbc_decrypt::<Decryptor>(key, iv, data)
        .map_err(|_| TokenError::ObfuscationError("wrong key, IV or corrupted data".into()))?;
    let plain = std::str::from_utf8(&plain)
        .map_err(|_| TokenError::ObfuscationError("password is not valid UTF-8".into()))?;
    Ok(Zeroizing::new(plain.to_owned()))
}

fn decode_b64(value: &str, what: &str) -> Result<Zeroizing<Vec<u8>>> {
    STANDARD
        .decode(value.trim())
        .map(Zeroizing::new)
        .map_err(|e| TokenError::ObfuscationError(format!("{what} is not valid base64: {e}")))
}

/// Obfuscates a UTF-8 password under a base64 key and IV, returning base64.
pub fn obfuscate_password(utf8_password: &str, key_b64: &str, iv_b64: &str) -> Result<String> {
    let key = decode_b64(key_b64, "obfuscation key")?;
    let iv = decode_b64(iv_b64, "obfuscation IV")?;
    Ok(STANDARD.encode(obfuscate(utf8_password, &key, &iv)?))
}

/// Reverses [`obfuscate_password`].
pub fn deobfuscate_password(
    obfuscated_b64: &str,
    key_b64: &str,
    iv_b64: &str,
) -> Result<Zeroizing<String>> {
    let data = decode_b64(obfuscated_b64, "obfuscated password")?;
    let key = decode_b64(key_b64, "obfuscation key")?;
    let iv = decode_b64(iv_b64, "obfuscation IV")?;
    deobfuscate(&data, &key, &iv)
}
