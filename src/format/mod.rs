//! Binary frame handling for OpenTokens.
//!
//! Provides version-aware parsing and serialization of the token frame and
//! its text transport encoding.

use crate::crypto::{CipherSuite, DIGEST_LEN};
use crate::error::{Result, TokenError};

pub mod transport;
pub mod v1;

/// Header literal opening every token frame ("OTK").
pub const MAGIC: &[u8; 3] = b"OTK";
/// Length of magic bytes.
pub const MAGIC_LEN: usize = 3;
/// Length of version field.
pub const VER_LEN: usize = 1;
/// Latest format version
pub const CURRENT_VERSION: u8 = v1::VERSION_V1;

/// A token frame with all of its fields.
///
/// Exists only while a token is being assembled or taken apart; the payload is
/// the ciphertext of the compressed cleartext.
#[derive(Debug)]
pub(crate) struct Frame {
    version: u8,
    suite: CipherSuite,
    digest: [u8; DIGEST_LEN],
    iv: Vec<u8>,
    payload: Vec<u8>,
}

impl Frame {
    /// Creates a new current-version Frame from its components.
    pub fn new(
        suite: CipherSuite,
        digest: [u8; DIGEST_LEN],
        iv: Vec<u8>,
        payload: Vec<u8>,
    ) -> Self {
        Self {
            version: CURRENT_VERSION,
            suite,
            digest,
            iv,
            payload,
        }
    }

    /// Returns the frame format version.
    pub fn version(&self) -> u8 {
        self.version
    }

    pub fn suite(&self) -> CipherSuite {
        self.suite
    }

    /// Returns the integrity digest over the cleartext.
    pub fn digest(&self) -> &[u8; DIGEST_LEN] {
        &self.digest
    }

    pub fn iv(&self) -> &[u8] {
        &self.iv
    }

    /// Returns the encrypted, compressed payload.
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }
}

/// Parses a token frame that must have been produced with `expected`.
///
/// Automatically dispatches to the appropriate version parser.
///
/// # Errors
///
/// Returns an error if:
/// - The frame is too short
/// - The header literal is invalid
/// - The version is unsupported
/// - The frame names a different cipher suite than `expected`
/// - A length field is inconsistent with the data that follows
pub(crate) fn parse(data: &[u8], expected: CipherSuite) -> Result<Frame> {
    if data.len() < MAGIC_LEN + VER_LEN {
        return Err(TokenError::MalformedFrame("token too short".into()));
    }

    if &data[..MAGIC_LEN] != MAGIC {
        return Err(TokenError::InvalidHeader);
    }

    let version = data[MAGIC_LEN];

    match version {
        v1::VERSION_V1 => v1::parse(data, expected),
        _ => Err(TokenError::UnsupportedVersion(version)),
    }
}

/// Serializes a Frame to bytes.
///
/// # Errors
///
/// Returns an error if the version is unsupported or a field does not fit
/// its length prefix.
pub(crate) fn serialize(frame: &Frame) -> Result<Vec<u8>> {
    match frame.version() {
        v1::VERSION_V1 => v1::serialize(frame),
        other => Err(TokenError::UnsupportedVersion(other)),
    }
}
