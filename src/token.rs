//! OpenToken encode and decode pipelines.
//!
//! Encoding: derive key, digest the cleartext, compress, encrypt, frame, and
//! transport-encode. Decoding runs the same steps in reverse and only releases
//! the cleartext once the recomputed digest matches the one in the frame.

use tracing::{debug, warn};

use crate::compress::{compress, decompress};
use crate::crypto::{self, CipherSuite, digest};
use crate::error::{Result, TokenError};
use crate::format::{self, CURRENT_VERSION, Frame, transport};

/// Encodes a cleartext payload into an OpenToken string.
///
/// The payload is normally newline-delimited `key=value` pairs, see
/// [`Claims::to_payload`](crate::Claims::to_payload).
pub fn encode(payload: &str, suite_id: u8, password: &str) -> Result<String> {
    let suite = CipherSuite::from_id(suite_id)?;
    if payload.is_empty() {
        return Err(TokenError::PayloadError("payload must not be empty".into()));
    }

    let key = crypto::derive_key(password, suite);
    let iv = crypto::generate_iv(suite)?;

    let mac = digest::compute(CURRENT_VERSION, suite, &key, &iv, payload.as_bytes())?;
    let compressed = compress(payload.as_bytes())?;
    let ciphertext = crypto::encrypt(suite, &key, &iv, &compressed)?;

    let frame = Frame::new(suite, mac, iv, ciphertext);
    let token = transport::encode(&format::serialize(&frame)?);

    debug!(
        suite = suite.id(),
        payload_len = payload.len(),
        token_len = token.len(),
        "encoded token"
    );
    Ok(token)
}

/// Decodes an OpenToken and returns its cleartext payload.
///
/// `expected_suite_id` must match the suite the token was encoded with; the
/// frame confirms the suite rather than choosing it.
pub fn decode(token: &str, expected_suite_id: u8, password: &str) -> Result<String> {
    let suite = CipherSuite::from_id(expected_suite_id)?;

    let bytes = transport::decode(token)?;
    let frame = format::parse(&bytes, suite).inspect_err(|e| {
        if let TokenError::CipherSuiteMismatch { expected, found } = e {
            warn!(expected, found, "token cipher suite mismatch");
        }
    })?;

    let key = crypto::derive_key(password, suite);
    let compressed = crypto::decrypt(suite, &key, frame.iv(), frame.payload())?;
    let cleartext = decompress(&compressed)?;

    digest::verify(
        frame.version(),
        suite,
        &key,
        frame.iv(),
        &cleartext,
        frame.digest(),
    )
    .inspect_err(|_| warn!(suite = suite.id(), "token integrity check failed"))?;

    let payload = String::from_utf8(cleartext.to_vec())
        .map_err(|_| TokenError::PayloadError("payload is not valid UTF-8".into()))?;

    debug!(suite = suite.id(), payload_len = payload.len(), "decoded token");
    Ok(payload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::DIGEST_LEN;

    const PASSWORD: &str = "correcthorsebatterystaple";

    // Offsets inside a v1 frame.
    const DIGEST_AT: usize = 5;
    const IV_AT: usize = DIGEST_AT + DIGEST_LEN + 1;

    fn tamper(token: &str, index: usize) -> String {
        let mut bytes = transport::decode(token).unwrap();
        bytes[index] ^= 0x01;
        transport::encode(&bytes)
    }

    #[test]
    fn example_vector_roundtrip() {
        let token = encode("subject=alice", 2, PASSWORD).unwrap();

        let bytes = transport::decode(&token).unwrap();
        assert_eq!(&bytes[..3], b"OTK");
        assert!(token.starts_with("T1RL"));

        assert_eq!(decode(&token, 2, PASSWORD).unwrap(), "subject=alice");
    }

    #[test]
    fn roundtrip_every_suite() {
        let payload = "subject=alice\nnot-before=2024-01-01T00:00:00Z\nrole=admin=yes";
        for suite in CipherSuite::ALL {
            let token = encode(payload, suite.id(), PASSWORD).unwrap();
            assert_eq!(decode(&token, suite.id(), PASSWORD).unwrap(), payload);
        }
    }

    #[test]
    fn roundtrip_large_and_unicode_payloads() {
        let long = format!("subject=bob\nblob={}", "x".repeat(20_000));
        let unicode = "subject=zoë\ncity=Zürich\nnote=✓ 密码";
        for payload in [long.as_str(), unicode] {
            let token = encode(payload, 1, PASSWORD).unwrap();
            assert_eq!(decode(&token, 1, PASSWORD).unwrap(), payload);
        }
    }

    #[test]
    fn roundtrip_highly_compressible_payloads() {
        for groups in [10, 20, 40, 80, 2_000] {
            let payload = format!("subject=alice\n{}", "group=admins\n".repeat(groups));
            for suite in CipherSuite::ALL {
                let token = encode(&payload, suite.id(), PASSWORD).unwrap();
                assert_eq!(decode(&token, suite.id(), PASSWORD).unwrap(), payload);
            }
        }
    }

    #[test]
    fn oversized_payload_is_rejected() {
        let payload = format!("subject={}", "x".repeat(crate::compress::MAX_INFLATED_LEN));
        assert!(matches!(
            encode(&payload, 2, PASSWORD),
            Err(TokenError::PayloadError(_))
        ));
    }

    #[test]
    fn same_payload_gives_different_tokens() {
        let a = encode("subject=alice", 2, PASSWORD).unwrap();
        let b = encode("subject=alice", 2, PASSWORD).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn token_text_uses_transport_alphabet() {
        for suite in CipherSuite::ALL {
            let token = encode("subject=alice\nfoo=bar", suite.id(), PASSWORD).unwrap();
            let body = token.trim_end_matches('*');

            assert!(token.len() - body.len() <= 2);
            assert!(
                body.chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
            );
        }
    }

    #[test]
    fn invalid_suite_is_rejected_before_work() {
        assert!(matches!(
            encode("subject=alice", 4, PASSWORD),
            Err(TokenError::InvalidCipherSuite(4))
        ));
        assert!(matches!(
            decode("not even a token", 9, PASSWORD),
            Err(TokenError::InvalidCipherSuite(9))
        ));
    }

    #[test]
    fn empty_payload_is_rejected() {
        assert!(matches!(
            encode("", 2, PASSWORD),
            Err(TokenError::PayloadError(_))
        ));
    }

    #[test]
    fn suite_mismatch_fails_with_correct_password() {
        let token = encode("subject=alice", 2, PASSWORD).unwrap();

        match decode(&token, 1, PASSWORD) {
            Err(TokenError::CipherSuiteMismatch { expected, found }) => {
                assert_eq!((expected, found), (1, 2));
            }
            other => panic!("expected CipherSuiteMismatch, got: {other:?}"),
        }
    }

    #[test]
    fn wrong_password_fails() {
        let token = encode("subject=alice", 1, PASSWORD).unwrap();
        assert!(decode(&token, 1, "wrong").is_err());
    }

    #[test]
    fn digest_tampering_is_detected() {
        for suite in CipherSuite::ALL {
            let token = encode("subject=alice", suite.id(), PASSWORD).unwrap();
            for index in DIGEST_AT..DIGEST_AT + DIGEST_LEN {
                assert!(matches!(
                    decode(&tamper(&token, index), suite.id(), PASSWORD),
                    Err(TokenError::IntegrityError)
                ));
            }
        }
    }

    #[test]
    fn iv_and_ciphertext_tampering_never_alters_content() {
        let payload = "subject=alice\nrole=user";
        for suite in CipherSuite::ALL {
            let token = encode(payload, suite.id(), PASSWORD).unwrap();
            let len = transport::decode(&token).unwrap().len();
            let payload_at = IV_AT + suite.iv_len() + 3;

            let regions = (IV_AT..IV_AT + suite.iv_len()).chain(payload_at..len);
            for index in regions {
                match decode(&tamper(&token, index), suite.id(), PASSWORD) {
                    Err(
                        TokenError::IntegrityError
                        | TokenError::DecryptionError(_)
                        | TokenError::PayloadError(_)
                        | TokenError::MalformedFrame(_),
                    ) => {}
                    // Unused deflate padding bits carry no content.
                    Ok(decoded) if decoded == payload => {}
                    other => panic!("tampered byte {index} gave: {other:?}"),
                }
            }
        }
    }

    #[test]
    fn null_suite_digest_detects_payload_tampering() {
        let token = encode("subject=alice", 0, PASSWORD).unwrap();
        let bytes = transport::decode(&token).unwrap();
        assert_eq!(bytes[IV_AT - 1], 0);

        // Re-frame a different payload under the existing digest.
        let forged_payload = compress(b"subject=mallory").unwrap();
        let mut digest = [0u8; DIGEST_LEN];
        digest.copy_from_slice(&bytes[DIGEST_AT..DIGEST_AT + DIGEST_LEN]);
        let forged = Frame::new(CipherSuite::Null, digest, Vec::new(), forged_payload.to_vec());
        let forged = transport::encode(&format::serialize(&forged).unwrap());

        assert!(matches!(
            decode(&forged, 0, PASSWORD),
            Err(TokenError::IntegrityError)
        ));
    }

    #[test]
    fn null_suite_rejects_bytes_after_compressed_stream() {
        let cleartext = b"subject=alice";
        let mac = digest::compute(CURRENT_VERSION, CipherSuite::Null, &[], &[], cleartext).unwrap();
        let mut payload = compress(cleartext).unwrap().to_vec();
        payload.extend_from_slice(b"GARBAGE");

        let frame = Frame::new(CipherSuite::Null, mac, Vec::new(), payload);
        let token = transport::encode(&format::serialize(&frame).unwrap());

        assert!(matches!(
            decode(&token, 0, PASSWORD),
            Err(TokenError::PayloadError(_))
        ));
    }

    #[test]
    fn corrupted_header_and_version_fail() {
        let token = encode("subject=alice", 2, PASSWORD).unwrap();
        let bytes = transport::decode(&token).unwrap();

        let mut bad_header = bytes.clone();
        bad_header[0] = b'X';
        assert!(matches!(
            decode(&transport::encode(&bad_header), 2, PASSWORD),
            Err(TokenError::InvalidHeader)
        ));

        let mut bad_version = bytes.clone();
        bad_version[3] = 7;
        assert!(matches!(
            decode(&transport::encode(&bad_version), 2, PASSWORD),
            Err(TokenError::UnsupportedVersion(7))
        ));
    }

    #[test]
    fn truncated_token_fails_structurally() {
        let token = encode("subject=alice", 2, PASSWORD).unwrap();
        let bytes = transport::decode(&token).unwrap();

        for len in [0, 3, 10, 30, bytes.len() - 1] {
            let truncated = transport::encode(&bytes[..len]);
            assert!(matches!(
                decode(&truncated, 2, PASSWORD),
                Err(TokenError::MalformedFrame(_))
            ));
        }
    }

    #[test]
    fn garbage_text_fails_structurally() {
        assert!(matches!(
            decode("this is not a token!", 2, PASSWORD),
            Err(TokenError::MalformedFrame(_))
        ));
    }
}
