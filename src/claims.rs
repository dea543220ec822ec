//! Token claims and their `key=value` payload form.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Result, TokenError};

pub const SUBJECT: &str = "subject";
pub const NOT_BEFORE: &str = "not-before";
pub const NOT_ON_OR_AFTER: &str = "not-on-or-after";
pub const RENEW_UNTIL: &str = "renew-until";

/// Timestamp layout for the validity claims, UTC truncated to seconds.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Claims carried in a token payload.
///
/// A key may carry several values; repeating a key in the payload appends to
/// it rather than replacing it.
#[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq, Eq)]
#[serde(transparent)]
pub struct Claims {
    entries: BTreeMap<String, Vec<String>>,
}

impl Claims {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a value, keeping any values already stored under `key`.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.entries
            .entry(key.into())
            .or_default()
            .push(value.into());
        self
    }

    /// Replaces all values stored under `key` with `value`.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.entries.insert(key.into(), vec![value.into()]);
        self
    }

    pub fn remove(&mut self, key: &str) -> Option<Vec<String>> {
        self.entries.remove(key)
    }

    /// Returns the first value stored under `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .get(key)
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    pub fn get_all(&self, key: &str) -> &[String] {
        self.entries
            .get(key)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn subject(&self) -> Option<&str> {
        self.get(SUBJECT).filter(|s| !s.is_empty())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// Stores `at` under `key` in [`TIMESTAMP_FORMAT`].
    pub fn set_timestamp(&mut self, key: &str, at: DateTime<Utc>) -> &mut Self {
        self.set(key, format_timestamp(at))
    }

    /// Reads a timestamp claim.
    ///
    /// # Errors
    ///
    /// [`TokenError::MissingRequiredClaim`] if absent, [`TokenError::InvalidClaim`]
    /// if it is not an ISO-8601 UTC timestamp.
    pub fn timestamp(&self, key: &str) -> Result<DateTime<Utc>> {
        let raw = self
            .get(key)
            .ok_or_else(|| TokenError::MissingRequiredClaim(key.to_string()))?;
        parse_timestamp(raw).ok_or_else(|| TokenError::InvalidClaim {
            key: key.to_string(),
            reason: format!("'{raw}' is not an ISO-8601 timestamp"),
        })
    }

    /// Renders the claims as newline-delimited `key=value` lines, one line per
    /// value.
    ///
    /// # Errors
    ///
    /// Fails with [`TokenError::InvalidClaim`] if a key is empty or contains
    /// `=` or a newline, or if a value contains a newline. The payload format
    /// has no escaping, so such claims would not survive a round-trip.
    pub fn to_payload(&self) -> Result<String> {
        let mut lines = Vec::new();
        for (key, values) in &self.entries {
            if key.is_empty() || key.contains(['=', '\n']) {
                return Err(TokenError::InvalidClaim {
                    key: key.clone(),
                    reason: "key must be non-empty and contain no '=' or newline".into(),
                });
            }
            for value in values {
                if value.contains('\n') {
                    return Err(TokenError::InvalidClaim {
                        key: key.clone(),
                        reason: "value must not contain a newline".into(),
                    });
                }
                lines.push(format!("{key}={value}"));
            }
        }
        Ok(lines.join("\n"))
    }

    /// Parses a `key=value` payload. Each line is split on its first `=`; a
    /// line without `=` yields an empty value and blank lines are skipped.
    pub fn from_payload(payload: &str) -> Self {
        let mut claims = Self::new();
        for line in payload.split('\n').filter(|line| !line.is_empty()) {
            let (key, value) = line.split_once('=').unwrap_or((line, ""));
            claims.insert(key, value);
        }
        claims
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Claims {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut claims = Self::new();
        for (key, value) in iter {
            claims.insert(key, value);
        }
        claims
    }
}

pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.format(TIMESTAMP_FORMAT).to_string()
}

/// Accepts the canonical `YYYY-MM-DDTHH:MM:SSZ` form and any RFC 3339
/// timestamp (fractional seconds, numeric offsets).
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(raw, TIMESTAMP_FORMAT)
        .map(|naive| naive.and_utc())
        .or_else(|_| DateTime::parse_from_rfc3339(raw).map(|dt| dt.with_timezone(&Utc)))
        .ok()
}
