//! zlib (RFC 1950) wrapped DEFLATE for token payloads.

use std::io::Write;

use flate2::{Compression, Decompress, FlushDecompress, Status, write::ZlibEncoder};
use zeroize::Zeroizing;

use crate::error::{Result, TokenError};
use crate::format::v1::MAX_PAYLOAD_LEN;

/// Largest cleartext a token may carry once inflated (16 full frames' worth).
pub const MAX_INFLATED_LEN: usize = 16 * MAX_PAYLOAD_LEN;

pub fn compress(data: &[u8]) -> Result<Zeroizing<Vec<u8>>> {
    if data.len() > MAX_INFLATED_LEN {
        return Err(TokenError::PayloadError(format!(
            "payload of {} bytes exceeds {MAX_INFLATED_LEN}",
            data.len()
        )));
    }

    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(data)
        .map_err(|e| TokenError::PayloadError(format!("compression failed: {e}")))?;
    encoder
        .finish()
        .map(Zeroizing::new)
        .map_err(|e| TokenError::PayloadError(format!("compression failed: {e}")))
}

/// Inflates exactly one complete zlib stream.
///
/// A corrupt or truncated stream, a checksum mismatch, bytes after the end of
/// the stream, or output beyond [`MAX_INFLATED_LEN`] is an error; partial
/// output is discarded.
pub fn decompress(data: &[u8]) -> Result<Zeroizing<Vec<u8>>> {
    let mut inflater = Decompress::new(true);
    let initial = data.len().saturating_mul(4).clamp(64, MAX_INFLATED_LEN + 1);
    let mut out = Zeroizing::new(Vec::with_capacity(initial));

    loop {
        if out.len() == out.capacity() {
            if out.len() > MAX_INFLATED_LEN {
                return Err(TokenError::PayloadError(format!(
                    "decompressed payload exceeds {MAX_INFLATED_LEN} bytes"
                )));
            }
            let grow = out.capacity().min(MAX_INFLATED_LEN + 1 - out.len());
            out.reserve_exact(grow);
        }

        let (before_in, before_out) = (inflater.total_in(), inflater.total_out());
        let offset = usize::try_from(before_in).map_or(data.len(), |n| n.min(data.len()));
        let status = inflater
            .decompress_vec(&data[offset..], &mut out, FlushDecompress::None)
            .map_err(|e| TokenError::PayloadError(format!("decompression failed: {e}")))?;

        if out.len() > MAX_INFLATED_LEN {
            return Err(TokenError::PayloadError(format!(
                "decompressed payload exceeds {MAX_INFLATED_LEN} bytes"
            )));
        }

        if status == Status::StreamEnd {
            if inflater.total_in() != data.len() as u64 {
                return Err(TokenError::PayloadError(
                    "decompression failed: trailing bytes after stream".into(),
                ));
            }
            return Ok(out);
        }

        let stalled = inflater.total_in() == before_in && inflater.total_out() == before_out;
        if stalled && out.len() < out.capacity() {
            return Err(TokenError::PayloadError(
                "decompression failed: truncated stream".into(),
            ));
        }
    }
}
