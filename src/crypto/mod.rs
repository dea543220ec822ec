//! Cryptographic primitives for OpenTokens.
//!
//! Provides the cipher suite registry, key derivation, CBC encryption, the
//! integrity digest and password obfuscation.

pub mod cipher;
pub mod digest;
pub mod kdf;
pub mod obfuscate;
pub mod suite;

pub use cipher::{decrypt, encrypt, generate_iv};
pub use kdf::derive_key;
pub use obfuscate::{deobfuscate, deobfuscate_password, obfuscate, obfuscate_password};
pub use suite::CipherSuite;

/// Length of the SHA-1 / HMAC-SHA1 integrity digest (20 bytes).
pub const DIGEST_LEN: usize = 20;
