use chrono::TimeDelta;

use crate::error::{Result, TokenError};

/// Validity rules applied when tokens are created and parsed.
///
/// All values are in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenPolicy {
    tolerance_secs: u32,
    lifetime_secs: u32,
    renewal_secs: u32,
}

impl Default for TokenPolicy {
    fn default() -> Self {
        Self {
            // allowed clock skew for 'not-before'
            tolerance_secs: 120, // 2 minutes
            // 'not-on-or-after' offset for new tokens
            lifetime_secs: 300, // 5 minutes
            // 'renew-until' offset for new tokens
            renewal_secs: 43_200, // 12 hours
        }
    }
}

impl TokenPolicy {
    pub fn new(tolerance_secs: u32, lifetime_secs: u32, renewal_secs: u32) -> Result<Self> {
        let policy = Self {
            tolerance_secs,
            lifetime_secs,
            renewal_secs,
        };
        policy.validate()?;
        Ok(policy)
    }

    pub fn tolerance_secs(&self) -> u32 {
        self.tolerance_secs
    }

    pub fn lifetime_secs(&self) -> u32 {
        self.lifetime_secs
    }

    pub fn renewal_secs(&self) -> u32 {
        self.renewal_secs
    }

    pub fn tolerance(&self) -> TimeDelta {
        TimeDelta::seconds(i64::from(self.tolerance_secs))
    }

    pub fn lifetime(&self) -> TimeDelta {
        TimeDelta::seconds(i64::from(self.lifetime_secs))
    }

    pub fn renewal(&self) -> TimeDelta {
        TimeDelta::seconds(i64::from(self.renewal_secs))
    }

    pub fn validate(&self) -> Result<()> {
        if self.lifetime_secs < 1 {
            return Err(TokenError::InvalidPolicy(
                "token lifetime must be >= 1 second".into(),
            ));
        }
        if self.renewal_secs < self.lifetime_secs {
            return Err(TokenError::InvalidPolicy(
                "renewal window must be at least the token lifetime".into(),
            ));
        }
        Ok(())
    }
}
