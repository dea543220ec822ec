use std::fmt;

use crate::error::{Result, TokenError};

/// The closed set of cipher suites an OpenToken may be encoded with.
///
/// The numeric id is carried in the frame and must be agreed out-of-band
/// between the issuing and the consuming party.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CipherSuite {
    /// No encryption. Integrity is still provided by an unkeyed SHA-1 digest.
    Null,
    Aes256Cbc,
    Aes128Cbc,
    TripleDesCbc,
}

impl CipherSuite {
    /// All suites in id order.
    pub const ALL: [CipherSuite; 4] = [
        CipherSuite::Null,
        CipherSuite::Aes256Cbc,
        CipherSuite::Aes128Cbc,
        CipherSuite::TripleDesCbc,
    ];

    /// Resolves a suite id, rejecting anything outside the registry.
    pub fn from_id(id: u8) -> Result<Self> {
        Self::ALL
            .get(usize::from(id))
            .copied()
            .ok_or(TokenError::InvalidCipherSuite(id))
    }

    pub fn id(self) -> u8 {
        match self {
            CipherSuite::Null => 0,
            CipherSuite::Aes256Cbc => 1,
            CipherSuite::Aes128Cbc => 2,
            CipherSuite::TripleDesCbc => 3,
        }
    }

    /// Symmetric key length in bytes.
    pub fn key_len(self) -> usize {
        match self {
            CipherSuite::Null => 0,
            CipherSuite::Aes256Cbc => 32,
            CipherSuite::Aes128Cbc => 16,
            CipherSuite::TripleDesCbc => 24,
        }
    }

    /// IV length in bytes (the cipher's block size for CBC suites).
    pub fn iv_len(self) -> usize {
        match self {
            CipherSuite::Null => 0,
            CipherSuite::Aes256Cbc | CipherSuite::Aes128Cbc => 16,
            CipherSuite::TripleDesCbc => 8,
        }
    }

    /// Whether the integrity digest is an HMAC keyed with the derived key.
    pub fn is_keyed(self) -> bool {
        self != CipherSuite::Null
    }

    pub fn name(self) -> &'static str {
        match self {
            CipherSuite::Null => "null",
            CipherSuite::Aes256Cbc => "aes-256-cbc",
            CipherSuite::Aes128Cbc => "aes-128-cbc",
            CipherSuite::TripleDesCbc => "des-ede3-cbc",
        }
    }
}

impl TryFrom<u8> for CipherSuite {
    type Error = TokenError;

    fn try_from(id: u8) -> Result<Self> {
        Self::from_id(id)
    }
}

impl fmt::Display for CipherSuite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.id(), self.name())
    }
}
