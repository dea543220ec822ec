//! # opentoken
//!
//! Encoder and decoder for OpenTokens: small, self-contained tokens that carry
//! `key=value` claims between parties sharing a password, without a session
//! store.
//!
//! A token is the cleartext payload, digested (HMAC-SHA1), compressed (zlib),
//! encrypted with the chosen cipher suite and packed into a binary frame:
//!
//! ```text
//! "OTK" | VERSION | SUITE | DIGEST (20) | IV_LEN | IV | KEY_INFO_LEN (0) | PAYLOAD_LEN (u16 BE) | PAYLOAD
//! ```
//!
//! The frame travels as URL-safe base64 with `*` in place of `=` padding.
//!
//! ```no_run
//! let token = opentoken::encode("subject=alice", 2, "correcthorsebatterystaple")?;
//! let payload = opentoken::decode(&token, 2, "correcthorsebatterystaple")?;
//! assert_eq!(payload, "subject=alice");
//! # Ok::<(), opentoken::TokenError>(())
//! ```
//!
//! [`TokenAgent`] layers the claim rules on top: a required `subject` and the
//! `not-before` / `not-on-or-after` / `renew-until` validity window.

pub mod agent;
pub mod claims;
mod compress;
pub mod config;
pub mod crypto;
mod error;
mod format;
mod token;

pub use crate::agent::TokenAgent;
pub use crate::claims::Claims;
pub use crate::config::TokenPolicy;
pub use crate::crypto::{CipherSuite, deobfuscate_password, obfuscate_password};
pub use crate::error::{Result, TokenError};
pub use crate::token::{decode, encode};
