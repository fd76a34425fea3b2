//! Admission policies for one-time code issuance.

use crate::clock::{Clock, SystemClock};
use crate::error::AuthError;
use crate::storage::{CodeStore, TryStore};
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;

/// Outcome of [`IssuancePolicy::check`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PolicyCheck {
    pub valid: bool,
    /// Earliest instant a rejected issuer may try again, when known.
    pub valid_after: Option<DateTime<Utc>>,
}

impl PolicyCheck {
    pub const fn allowed() -> Self {
        Self {
            valid: true,
            valid_after: None,
        }
    }

    pub const fn rejected(valid_after: Option<DateTime<Utc>>) -> Self {
        Self {
            valid: false,
            valid_after,
        }
    }
}

/// Decides whether an issuer may receive another code.
pub trait IssuancePolicy: Send + Sync {
    fn check(&self, issuer: &str) -> Result<PolicyCheck, AuthError>;

    /// Human readable rejection reason, surfaced verbatim to callers.
    fn message(&self) -> String;

    /// Called after a code was issued to `issuer`.
    fn record(&self, _issuer: &str) -> Result<(), AuthError> {
        Ok(())
    }
}

/// Admits everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopPolicy;

impl IssuancePolicy for NoopPolicy {
    fn check(&self, _issuer: &str) -> Result<PolicyCheck, AuthError> {
        Ok(PolicyCheck::allowed())
    }

    fn message(&self) -> String {
        String::new()
    }
}

/// Caps the codes an issuer holds that are live or expired less than
/// `window` ago.
pub struct LimitPolicy {
    store: Arc<dyn CodeStore>,
    limit: usize,
    window: Duration,
}

impl LimitPolicy {
    pub fn new(store: Arc<dyn CodeStore>, limit: usize, window: Duration) -> Self {
        Self {
            store,
            limit,
            window,
        }
    }
}

impl IssuancePolicy for LimitPolicy {
    fn check(&self, issuer: &str) -> Result<PolicyCheck, AuthError> {
        let codes = self.store.last(issuer, self.window)?;
        if codes.len() < self.limit {
            return Ok(PolicyCheck::allowed());
        }

        // codes come back ordered by expiry; the oldest one frees a slot first
        let valid_after = codes
            .first()
            .and_then(|code| code.expires_at.checked_add_signed(self.window));
        Ok(PolicyCheck::rejected(valid_after))
    }

    fn message(&self) -> String {
        format!("The user cannot have more than {} codes", self.limit)
    }
}

/// Sliding window limit over recorded attempts: fewer than `limit`
/// attempts in the trailing `threshold`.
pub struct LimitIssuerPolicy {
    tries: Arc<dyn TryStore>,
    limit: usize,
    threshold: Duration,
    clock: Arc<dyn Clock>,
}

impl LimitIssuerPolicy {
    pub fn new(tries: Arc<dyn TryStore>, limit: usize, threshold: Duration) -> Self {
        Self {
            tries,
            limit,
            threshold,
            clock: Arc::new(SystemClock),
        }
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }
}

impl IssuancePolicy for LimitIssuerPolicy {
    fn check(&self, issuer: &str) -> Result<PolicyCheck, AuthError> {
        let after = self
            .clock
            .now()
            .checked_sub_signed(self.threshold)
            .ok_or_else(|| AuthError::config("Code window out of range"))?;
        let tries = self.tries.tries_after(issuer, after)?;

        if tries.len() < self.limit {
            return Ok(PolicyCheck::allowed());
        }

        // admitted again once all but `limit - 1` attempts left the window
        let valid_after = tries
            .len()
            .checked_sub(self.limit)
            .and_then(|oldest_kept| tries.get(oldest_kept))
            .and_then(|attempt| attempt.checked_add_signed(self.threshold));
        Ok(PolicyCheck::rejected(valid_after))
    }

    fn message(&self) -> String {
        format!(
            "The user cannot send more than {} codes in {} minutes",
            self.limit,
            self.threshold.num_minutes()
        )
    }

    fn record(&self, issuer: &str) -> Result<(), AuthError> {
        self.tries.add(issuer, self.clock.now())
    }
}
