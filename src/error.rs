use thiserror::Error;

/// Errors produced while encoding, decoding or validating an OpenToken.
///
/// Every variant is terminal for the call that produced it; no partially
/// decoded payload is ever returned alongside an error.
#[derive(Debug, Error)]
pub enum TokenError {
    /// Cipher suite id is not in the registry.
    #[error("invalid cipher suite {0}: must be between 0 and {max}", max = crate::crypto::CipherSuite::ALL.len() - 1)]
    InvalidCipherSuite(u8),

    /// The OS random generator could not produce an IV.
    #[error("secure random source unavailable")]
    RandomnessError,

    /// Compression, decompression or UTF-8 decoding of the payload failed.
    #[error("payload error: {0}")]
    PayloadError(String),

    #[error("encryption failed: {0}")]
    EncryptionError(String),

    /// Wrong key, bad padding or an IV of the wrong size.
    #[error("decryption failed: {0}")]
    DecryptionError(String),

    #[error("invalid token header literal")]
    InvalidHeader,

    #[error("unsupported token version {0}, must be 1")]
    UnsupportedVersion(u8),

    /// The frame was produced with a different suite than the caller expected.
    #[error("expected cipher suite {expected} but token was encoded with {found}")]
    CipherSuiteMismatch { expected: u8, found: u8 },

    /// Recomputed digest does not match the one carried in the frame.
    #[error("token integrity check failed")]
    IntegrityError,

    /// Truncated frame, inconsistent length fields or bad transport encoding.
    #[error("malformed token: {0}")]
    MalformedFrame(String),

    #[error("token missing required claim '{0}'")]
    MissingRequiredClaim(String),

    /// A claim key or value cannot be represented in the `key=value` payload,
    /// or a timestamp claim could not be parsed.
    #[error("invalid claim '{key}': {reason}")]
    InvalidClaim { key: String, reason: String },

    #[error("'not-on-or-after' ({not_on_or_after}) is before 'not-before' ({not_before})")]
    InvalidValidityWindow {
        not_before: String,
        not_on_or_after: String,
    },

    #[error("must not use this token before {0}")]
    NotYetValid(String),

    #[error("this token has expired as of {0}")]
    Expired(String),

    #[error("this token is past its renewal limit {0}")]
    RenewalExpired(String),

    #[error("invalid token policy: {0}")]
    InvalidPolicy(String),

    #[error("password obfuscation failed: {0}")]
    ObfuscationError(String),
}

pub type Result<T> = std::result::Result<T, TokenError>;
