//! Token frame format v1.
//!
//! V1 Frame Format:
//! ```text
//! MAGIC "OTK" (3) | VERSION (1) | SUITE (1) | DIGEST (20) | IV_LEN (1) | IV (IV_LEN)
//!   | KEY_INFO_LEN (1, always 0) | PAYLOAD_LEN (2, big-endian) | PAYLOAD (PAYLOAD_LEN)
//! ```

use super::{Frame, MAGIC};
use crate::{
    crypto::{CipherSuite, DIGEST_LEN},
    error::{Result, TokenError},
    format::{MAGIC_LEN, VER_LEN},
};

/// Current frame format version.
pub const VERSION_V1: u8 = 1;

const SUITE_LEN: usize = 1;
const IV_LEN_LEN: usize = 1;
const KEY_INFO_LEN_LEN: usize = 1;
const PAYLOAD_LEN_LEN: usize = 2;

/// Frame length with an empty IV and an empty payload.
pub const MIN_FRAME_LEN: usize =
    MAGIC_LEN + VER_LEN + SUITE_LEN + DIGEST_LEN + IV_LEN_LEN + KEY_INFO_LEN_LEN + PAYLOAD_LEN_LEN;

/// Largest payload the 2-byte length prefix can describe.
pub const MAX_PAYLOAD_LEN: usize = u16::MAX as usize;

fn malformed(msg: impl Into<String>) -> TokenError {
    TokenError::MalformedFrame(msg.into())
}

/// Reads `len` bytes at `offset`, failing instead of reading past the end.
fn take<'a>(data: &'a [u8], offset: &mut usize, len: usize, field: &str) -> Result<&'a [u8]> {
    let end = offset
        .checked_add(len)
        .filter(|end| *end <= data.len())
        .ok_or_else(|| malformed(format!("token truncated in {field}")))?;
    let bytes = &data[*offset..end];
    *offset = end;
    Ok(bytes)
}

fn take_array<const N: usize>(data: &[u8], offset: &mut usize, field: &str) -> Result<[u8; N]> {
    let mut out = [0u8; N];
    out.copy_from_slice(take(data, offset, N, field)?);
    Ok(out)
}

/// Parses a v1 frame whose magic and version were already checked.
///
/// # Errors
///
/// Returns an error if the suite differs from `expected`, a length field is
/// inconsistent, or bytes follow the declared payload.
pub fn parse(data: &[u8], expected: CipherSuite) -> Result<Frame> {
    let mut offset = MAGIC_LEN + VER_LEN;

    let [suite_id] = take_array::<SUITE_LEN>(data, &mut offset, "cipher suite")?;
    if suite_id != expected.id() {
        return Err(TokenError::CipherSuiteMismatch {
            expected: expected.id(),
            found: suite_id,
        });
    }

    let digest = take_array::<DIGEST_LEN>(data, &mut offset, "digest")?;

    let [iv_len] = take_array::<IV_LEN_LEN>(data, &mut offset, "IV length")?;
    let iv_len = usize::from(iv_len);
    if iv_len != expected.iv_len() {
        return Err(malformed(format!(
            "IV length {iv_len} does not match cipher suite {expected}"
        )));
    }
    let iv = take(data, &mut offset, iv_len, "IV")?.to_vec();

    let [key_info_len] = take_array::<KEY_INFO_LEN_LEN>(data, &mut offset, "key info length")?;
    if key_info_len != 0 {
        return Err(malformed("key info is not supported"));
    }

    let payload_len = u16::from_be_bytes(take_array::<PAYLOAD_LEN_LEN>(
        data,
        &mut offset,
        "payload length",
    )?);
    let payload = take(data, &mut offset, usize::from(payload_len), "payload")?.to_vec();

    if offset != data.len() {
        return Err(malformed(format!(
            "{} trailing bytes after payload",
            data.len() - offset
        )));
    }

    Ok(Frame::new(expected, digest, iv, payload))
}

/// Serializes a Frame to v1 format bytes.
///
/// # Errors
///
/// Returns an error if the version is not v1, the IV does not fit the suite, or
/// the payload does not fit the 2-byte length prefix.
pub fn serialize(frame: &Frame) -> Result<Vec<u8>> {
    if frame.version() != VERSION_V1 {
        return Err(TokenError::UnsupportedVersion(frame.version()));
    }

    if frame.iv().len() != frame.suite().iv_len() {
        return Err(malformed(format!(
            "invalid IV length {} for cipher suite {}",
            frame.iv().len(),
            frame.suite()
        )));
    }

    let payload_len = u16::try_from(frame.payload().len()).map_err(|_| {
        malformed(format!(
            "payload of {} bytes exceeds {MAX_PAYLOAD_LEN}",
            frame.payload().len()
        ))
    })?;
    // iv_len() is at most 16 so the cast cannot truncate.
    let iv_len = frame.iv().len() as u8;

    let mut buf = Vec::with_capacity(MIN_FRAME_LEN + frame.iv().len() + frame.payload().len());

    buf.extend_from_slice(MAGIC);
    buf.push(VERSION_V1);
    buf.push(frame.suite().id());
    buf.extend_from_slice(frame.digest());

    buf.push(iv_len);
    buf.extend_from_slice(frame.iv());

    buf.push(0);

    buf.extend_from_slice(&payload_len.to_be_bytes());
    buf.extend_from_slice(frame.payload());

    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::Frame;

    fn sample() -> Frame {
        Frame::new(
            CipherSuite::TripleDesCbc,
            [9u8; DIGEST_LEN],
            vec![2u8; 8],
            vec![0xab; 24],
        )
    }

    #[test]
    fn frame_roundtrip() {
        let frame = sample();

        let bytes = serialize(&frame).unwrap();
        let parsed = parse(&bytes, CipherSuite::TripleDesCbc).unwrap();

        assert_eq!(bytes.len(), MIN_FRAME_LEN + 8 + 24);
        assert_eq!(parsed.version(), VERSION_V1);
        assert_eq!(parsed.suite(), CipherSuite::TripleDesCbc);
        assert_eq!(parsed.digest(), frame.digest());
        assert_eq!(parsed.iv(), frame.iv());
        assert_eq!(parsed.payload(), frame.payload());
    }

    #[test]
    fn field_positions() {
        let bytes = serialize(&sample()).unwrap();

        assert_eq!(&bytes[..3], b"OTK");
        assert_eq!(bytes[3], 1);
        assert_eq!(bytes[4], 3);
        assert_eq!(&bytes[5..25], &[9u8; 20]);
        assert_eq!(bytes[25], 8);
        assert_eq!(&bytes[26..34], &[2u8; 8]);
        assert_eq!(bytes[34], 0);
        assert_eq!(&bytes[35..37], &[0, 24]);
    }

    #[test]
    fn null_suite_frame_has_no_iv() {
        let frame = Frame::new(CipherSuite::Null, [0u8; DIGEST_LEN], Vec::new(), vec![1, 2, 3]);
        let bytes = serialize(&frame).unwrap();

        assert_eq!(bytes.len(), MIN_FRAME_LEN + 3);
        assert!(parse(&bytes, CipherSuite::Null).unwrap().iv().is_empty());
    }

    #[test]
    fn suite_mismatch_fails() {
        let bytes = serialize(&sample()).unwrap();

        match parse(&bytes, CipherSuite::Aes128Cbc) {
            Err(TokenError::CipherSuiteMismatch { expected, found }) => {
                assert_eq!((expected, found), (2, 3));
            }
            other => panic!("expected CipherSuiteMismatch, got: {other:?}"),
        }
    }

    #[test]
    fn every_truncation_fails() {
        let bytes = serialize(&sample()).unwrap();

        for len in MAGIC_LEN + VER_LEN..bytes.len() {
            assert!(
                matches!(
                    parse(&bytes[..len], CipherSuite::TripleDesCbc),
                    Err(TokenError::MalformedFrame(_))
                ),
                "truncation to {len} bytes was accepted"
            );
        }
    }

    #[test]
    fn trailing_bytes_fail() {
        let mut bytes = serialize(&sample()).unwrap();
        bytes.push(0);

        assert!(matches!(
            parse(&bytes, CipherSuite::TripleDesCbc),
            Err(TokenError::MalformedFrame(_))
        ));
    }

    #[test]
    fn inflated_payload_length_fails() {
        let mut bytes = serialize(&sample()).unwrap();
        bytes[36] = 25;

        assert!(matches!(
            parse(&bytes, CipherSuite::TripleDesCbc),
            Err(TokenError::MalformedFrame(_))
        ));
    }

    #[test]
    fn nonzero_key_info_fails() {
        let mut bytes = serialize(&sample()).unwrap();
        bytes[34] = 1;

        assert!(parse(&bytes, CipherSuite::TripleDesCbc).is_err());
    }

    #[test]
    fn wrong_iv_length_fails() {
        let mut bytes = serialize(&sample()).unwrap();
        bytes[25] = 16;

        assert!(matches!(
            parse(&bytes, CipherSuite::TripleDesCbc),
            Err(TokenError::MalformedFrame(_))
        ));
    }

    #[test]
    fn oversized_payload_is_not_serialized() {
        let frame = Frame::new(
            CipherSuite::Null,
            [0u8; DIGEST_LEN],
            Vec::new(),
            vec![0u8; MAX_PAYLOAD_LEN + 1],
        );

        assert!(matches!(serialize(&frame), Err(TokenError::MalformedFrame(_))));
    }
}
