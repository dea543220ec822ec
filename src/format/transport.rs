//! Text transport encoding of token frames.
//!
//! Base64 over the URL-safe alphabet (`-` and `_`), with each trailing `=`
//! pad character replaced by `*`.

use base64::{Engine as _, engine::general_purpose::URL_SAFE};

use crate::error::{Result, TokenError};

const PAD: char = '=';
const TOKEN_PAD: char = '*';

fn is_token_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_'
}

/// Encodes frame bytes as token text.
pub fn encode(frame: &[u8]) -> String {
    URL_SAFE.encode(frame).replace(PAD, "*")
}

/// Decodes token text back into frame bytes.
///
/// Only the URL-safe alphabet is accepted, and `*` only as a trailing run of
/// at most two characters.
pub fn decode(token: &str) -> Result<Vec<u8>> {
    let body = token.trim_end_matches(TOKEN_PAD);
    let pad_len = token.len() - body.len();

    if pad_len > 2 {
        return Err(TokenError::MalformedFrame(format!(
            "invalid padding run of {pad_len} characters"
        )));
    }
    if let Some(bad) = body.chars().find(|c| !is_token_char(*c)) {
        return Err(TokenError::MalformedFrame(format!(
            "invalid character {bad:?} in token"
        )));
    }

    let mut padded = String::with_capacity(token.len());
    padded.push_str(body);
    padded.extend(std::iter::repeat_n(PAD, pad_len));

    URL_SAFE
        .decode(padded)
        .map_err(|e| TokenError::MalformedFrame(format!("invalid base64: {e}")))
}
