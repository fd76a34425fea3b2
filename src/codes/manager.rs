use crate::clock::{Clock, SystemClock};
use crate::codes::policy::IssuancePolicy;
use crate::error::AuthError;
use crate::metrics;
use crate::random::CodeGenerator;
use crate::storage::{Code, CodeStatus, CodeStore, NewCode};
use chrono::Duration;
use std::sync::Arc;
use tracing::{info, warn};

/// Issues and redeems one-time codes.
pub struct CodeManager {
    generator: CodeGenerator,
    store: Arc<dyn CodeStore>,
    policy: Arc<dyn IssuancePolicy>,
    time_to_live: Duration,
    clock: Arc<dyn Clock>,
}

impl CodeManager {
    pub fn new(
        generator: CodeGenerator,
        store: Arc<dyn CodeStore>,
        policy: Arc<dyn IssuancePolicy>,
        time_to_live: Duration,
    ) -> Self {
        Self {
            generator,
            store,
            policy,
            time_to_live,
            clock: Arc::new(SystemClock),
        }
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Issue a fresh enabled code to `issuer` if the policy admits it.
    ///
    /// # Errors
    ///
    /// [`AuthError::PolicyRejected`] with the policy message when denied;
    /// [`AuthError::Config`] when the expiry is not representable. Policy
    /// and store failures are passed through.
    pub fn issue(&self, issuer: &str) -> Result<Code, AuthError> {
        let check = self.policy.check(issuer)?;
        if !check.valid {
            metrics::record_code_issued("rejected");
            warn!(
                issuer = %issuer,
                valid_after = ?check.valid_after,
                "Code issuance rejected by policy"
            );
            return Err(AuthError::PolicyRejected(self.policy.message()));
        }

        let expires_at = self
            .clock
            .now()
            .checked_add_signed(self.time_to_live)
            .ok_or_else(|| AuthError::config("Code time to live out of range"))?;

        let code = self.store.create(NewCode {
            issuer: issuer.to_string(),
            status: CodeStatus::Enabled,
            content: (self.generator)(),
            expires_at,
        })?;

        self.policy.record(issuer)?;

        metrics::record_code_issued("issued");
        info!(issuer = %issuer, code_id = %code.id, expires_at = %code.expires_at, "Issued code");

        Ok(code)
    }

    /// Redeem `content` for `issuer`.
    ///
    /// An expired code is still flipped to used before the expiry error is
    /// returned.
    ///
    /// # Errors
    ///
    /// - [`AuthError::NotFound`]: no such code for the issuer
    /// - [`AuthError::CodeUnavailable`]: already used or disabled, including
    ///   by a concurrent redemption
    /// - [`AuthError::ExpiredCode`]: past its expiry
    pub fn consume(&self, issuer: &str, content: &str) -> Result<Code, AuthError> {
        let result = self.try_consume(issuer, content);

        match &result {
            Ok(code) => {
                metrics::record_code_consumed("used");
                info!(issuer = %issuer, code_id = %code.id, "Consumed code");
            }
            Err(e) => {
                metrics::record_code_consumed(e.code());
                warn!(issuer = %issuer, error = %e, "Code redemption rejected");
            }
        }

        result
    }

    fn try_consume(&self, issuer: &str, content: &str) -> Result<Code, AuthError> {
        let mut code = self
            .store
            .find(issuer, content)?
            .ok_or_else(|| AuthError::not_found(format!("code for {}", issuer)))?;

        code.mark_as_used()?;

        // the store re-checks the status under its own lock
        self.store
            .update(&code.id, CodeStatus::Enabled, code.status)?
            .ok_or_else(|| AuthError::not_found(format!("code {}", code.id)))?;

        if code.is_expired_at(self.clock.now()) {
            return Err(AuthError::ExpiredCode);
        }

        Ok(code)
    }
}
