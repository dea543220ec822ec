//! Integrity digest over the token's cleartext.
//!
//! Digest input, in order:
//! ```text
//! VERSION (1) | SUITE ID (1) | IV (iv_len, omitted when empty) | CLEARTEXT
//! ```
//! The reserved key-info field is always empty and contributes nothing.

use hmac::{Hmac, Mac};
use sha1::Sha1;
use sha1::digest::{FixedOutput, Update};
use subtle::ConstantTimeEq;

use super::{CipherSuite, DIGEST_LEN};
use crate::error::{Result, TokenError};

type HmacSha1 = Hmac<Sha1>;

fn absorb<U: Update>(state: &mut U, version: u8, suite: CipherSuite, iv: &[u8], cleartext: &[u8]) {
    state.update(&[version, suite.id()]);
    if !iv.is_empty() {
        state.update(iv);
    }
    state.update(cleartext);
}

/// Computes the 20-byte digest: HMAC-SHA1 under `key` for keyed suites,
/// plain SHA-1 for the null suite.
pub fn compute(
    version: u8,
    suite: CipherSuite,
    key: &[u8],
    iv: &[u8],
    cleartext: &[u8],
) -> Result<[u8; DIGEST_LEN]> {
    let mut out = [0u8; DIGEST_LEN];

    if suite.is_keyed() {
        let mut mac = HmacSha1::new_from_slice(key)
            .map_err(|_| TokenError::EncryptionError("invalid HMAC key".into()))?;
        absorb(&mut mac, version, suite, iv, cleartext);
        out.copy_from_slice(&mac.finalize().into_bytes());
    } else {
        let mut hasher = Sha1::default();
        absorb(&mut hasher, version, suite, iv, cleartext);
        out.copy_from_slice(&hasher.finalize_fixed());
    }

    Ok(out)
}

/// Recomputes the digest and compares it with `expected` in constant time.
pub fn verify(
    version: u8,
    suite: CipherSuite,
    key: &[u8],
    iv: &[u8],
    cleartext: &[u8],
    expected: &[u8; DIGEST_LEN],
) -> Result<()> {
    let actual = compute(version, suite, key, iv, cleartext)?;
    if bool::from(actual[..].ct_eq(&expected[..])) {
        Ok(())
    } else {
        Err(TokenError::IntegrityError)
    }
}
