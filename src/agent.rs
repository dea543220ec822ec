//! Claims-level token issuing and validation.

use chrono::{DateTime, TimeDelta, Utc};
use tracing::{debug, warn};
use zeroize::Zeroizing;

use crate::claims::{self, Claims, NOT_BEFORE, NOT_ON_OR_AFTER, RENEW_UNTIL, SUBJECT};
use crate::config::TokenPolicy;
use crate::crypto::CipherSuite;
use crate::error::{Result, TokenError};
use crate::token;

/// Issues and validates OpenTokens for one shared password and cipher suite.
pub struct TokenAgent {
    suite: CipherSuite,
    password: Zeroizing<String>,
    policy: TokenPolicy,
}

impl std::fmt::Debug for TokenAgent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenAgent")
            .field("suite", &self.suite)
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

impl TokenAgent {
    pub fn new(suite: CipherSuite, password: Zeroizing<String>) -> Self {
        Self::with_policy(suite, password, TokenPolicy::default())
    }

    pub fn with_policy(
        suite: CipherSuite,
        password: Zeroizing<String>,
        policy: TokenPolicy,
    ) -> Self {
        Self {
            suite,
            password,
            policy,
        }
    }

    pub fn suite(&self) -> CipherSuite {
        self.suite
    }

    pub fn policy(&self) -> &TokenPolicy {
        &self.policy
    }

    pub fn create_token(&self, claims: &Claims) -> Result<String> {
        self.create_token_at(claims, Utc::now())
    }

    /// Stamps the validity claims relative to `now` and encodes the token.
    ///
    /// Any validity claims already present in `claims` are overwritten.
    pub fn create_token_at(&self, claims: &Claims, now: DateTime<Utc>) -> Result<String> {
        if claims.subject().is_none() {
            return Err(TokenError::MissingRequiredClaim(SUBJECT.into()));
        }

        let not_on_or_after = offset(now, self.policy.lifetime())?;
        let renew_until = offset(now, self.policy.renewal())?;

        let mut claims = claims.clone();
        claims
            .set_timestamp(NOT_BEFORE, now)
            .set_timestamp(NOT_ON_OR_AFTER, not_on_or_after)
            .set_timestamp(RENEW_UNTIL, renew_until);

        let payload = Zeroizing::new(claims.to_payload()?);
        token::encode(&payload, self.suite.id(), &self.password)
    }

    pub fn parse_token(&self, token: &str) -> Result<Claims> {
        self.parse_token_at(token, Utc::now())
    }

    /// Decodes a token and checks its claims against `now`.
    pub fn parse_token_at(&self, token: &str, now: DateTime<Utc>) -> Result<Claims> {
        let payload = Zeroizing::new(token::decode(token, self.suite.id(), &self.password)?);
        let claims = Claims::from_payload(&payload);

        self.validate_at(&claims, now)
            .inspect_err(|e| warn!(error = %e, "token rejected"))?;

        debug!(subject = claims.subject(), "token accepted");
        Ok(claims)
    }

    /// Applies the validity rules to already decoded claims.
    pub fn validate_at(&self, claims: &Claims, now: DateTime<Utc>) -> Result<()> {
        if claims.subject().is_none() {
            return Err(TokenError::MissingRequiredClaim(SUBJECT.into()));
        }

        let not_before = claims.timestamp(NOT_BEFORE)?;
        let not_on_or_after = claims.timestamp(NOT_ON_OR_AFTER)?;
        let renew_until = claims.timestamp(RENEW_UNTIL)?;

        if not_before > not_on_or_after {
            return Err(TokenError::InvalidValidityWindow {
                not_before: claims::format_timestamp(not_before),
                not_on_or_after: claims::format_timestamp(not_on_or_after),
            });
        }

        // Past the end of chrono's range nothing can be "too early".
        let too_early = now
            .checked_add_signed(self.policy.tolerance())
            .is_some_and(|latest| not_before > latest);
        if too_early {
            return Err(TokenError::NotYetValid(claims::format_timestamp(not_before)));
        }

        if now > not_on_or_after {
            return Err(TokenError::Expired(claims::format_timestamp(not_on_or_after)));
        }

        if now > renew_until {
            return Err(TokenError::RenewalExpired(claims::format_timestamp(renew_until)));
        }

        Ok(())
    }
}

fn offset(now: DateTime<Utc>, by: TimeDelta) -> Result<DateTime<Utc>> {
    now.checked_add_signed(by).ok_or_else(|| {
        TokenError::InvalidPolicy(format!(
            "{} + {}s is outside the representable time range",
            claims::format_timestamp(now),
            by.num_seconds()
        ))
    })
}
