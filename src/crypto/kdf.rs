use pbkdf2::pbkdf2_hmac;
use sha1::Sha1;
use zeroize::Zeroizing;

use super::CipherSuite;

/// PBKDF2 iteration count fixed by the OpenToken format.
pub const PBKDF2_ROUNDS: u32 = 1000;
/// The format uses a constant all-zero salt so both parties derive the same key
/// from the password alone.
pub const KDF_SALT: [u8; 8] = [0u8; 8];

/// Derives the suite's symmetric key from a shared password.
///
/// PBKDF2-HMAC-SHA1 with [`PBKDF2_ROUNDS`] rounds over [`KDF_SALT`], truncated
/// to the suite's key length. The null suite yields an empty key.
pub fn derive_key(password: &str, suite: CipherSuite) -> Zeroizing<Vec<u8>> {
    let mut key = Zeroizing::new(vec![0u8; suite.key_len()]);
    if !key.is_empty() {
        pbkdf2_hmac::<Sha1>(password.as_bytes(), &KDF_SALT, PBKDF2_ROUNDS, &mut key);
    }
    key
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kdf_is_deterministic() {
        let k1 = derive_key("password", CipherSuite::Aes128Cbc);
        let k2 = derive_key("password", CipherSuite::Aes128Cbc);

        assert_eq!(*k1, *k2);
    }

    #[test]
    fn key_length_follows_suite() {
        for suite in CipherSuite::ALL {
            assert_eq!(derive_key("pw", suite).len(), suite.key_len());
        }
    }

    #[test]
    fn shorter_key_is_prefix_of_longer_key() {
        // PBKDF2 output blocks do not depend on the requested length.
        let aes256 = derive_key("pw", CipherSuite::Aes256Cbc);
        let aes128 = derive_key("pw", CipherSuite::Aes128Cbc);

        assert_eq!(&aes256[..16], &aes128[..]);
    }

    #[test]
    fn password_affects_output() {
        let k1 = derive_key("pw1", CipherSuite::Aes256Cbc);
        let k2 = derive_key("pw2", CipherSuite::Aes256Cbc);

        assert_ne!(*k1, *k2);
    }
}
