//! Claim assembly around the signing contract.
//!
//! Turns a [`ClaimSet`] into signed access tokens and recovers claims from
//! them. Token ids are `subject:random-suffix`, so every id is traceable to
//! its subject without a central counter.

use crate::clock::{Clock, SystemClock};
use crate::error::AuthError;
use crate::jwt::builder::ClaimSet;
use crate::jwt::claims::{Claims, RegisteredClaims};
use crate::jwt::signer::TokenSigner;
use crate::random::{IdGenerator, UuidGenerator};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Token type tag of every access token.
pub const BEARER: &str = "Bearer";

/// A signed access token and its bookkeeping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessToken {
    /// Token id (`jti`)
    pub id: String,
    /// Always [`BEARER`]
    pub token_type: String,
    /// Compact signed JWT
    pub content: String,
    /// Instant the token was signed
    pub issued_at: DateTime<Utc>,
    /// Instant the token stops being valid
    pub expires_at: DateTime<Utc>,
    /// Lifetime the token was issued with
    pub time_to_live: Duration,
}

/// Claims recovered from a signed token, with the claimed expiry decoded.
#[derive(Debug, Clone, PartialEq)]
pub struct RecoveredClaims {
    /// Every claim carried by the token
    pub claims: Claims,
    /// `exp` as an instant
    pub expires_at: DateTime<Utc>,
}

/// Builds, signs and recovers access token claims.
pub struct ClaimAssembler {
    signer: Arc<dyn TokenSigner>,
    clock: Arc<dyn Clock>,
    ids: Arc<dyn IdGenerator>,
    time_to_live: Duration,
    not_before: Duration,
}

impl ClaimAssembler {
    /// Create an assembler issuing tokens valid for `time_to_live`.
    pub fn new(signer: Arc<dyn TokenSigner>, time_to_live: Duration) -> Self {
        Self {
            signer,
            clock: Arc::new(SystemClock),
            ids: Arc::new(UuidGenerator),
            time_to_live,
            not_before: Duration::ZERO,
        }
    }

    /// Use another time source.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Use another token id suffix source.
    #[must_use]
    pub fn with_id_generator(mut self, ids: Arc<dyn IdGenerator>) -> Self {
        self.ids = ids;
        self
    }

    /// Delay between signing and the token becoming usable (`nbf`).
    #[must_use]
    pub fn with_not_before(mut self, delay: Duration) -> Self {
        self.not_before = delay;
        self
    }

    /// Configured access token lifetime.
    #[must_use]
    pub fn time_to_live(&self) -> Duration {
        self.time_to_live
    }

    /// Signing algorithm name.
    #[must_use]
    pub fn algorithm(&self) -> &str {
        self.signer.algorithm()
    }

    /// Stamp id and timing onto `set`, sign it, and describe the result.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Signing`] when the signer fails and
    /// [`AuthError::Config`] when the lifetime does not fit the calendar.
    pub fn issue(&self, set: ClaimSet) -> Result<AccessToken, AuthError> {
        let now = self.clock.now();
        let expires_at = shift(now, self.time_to_live)?;
        let not_before = shift(now, self.not_before)?;
        let jti = format!("{}:{}", set.subject, self.ids.next_id());

        let claims = Claims {
            registered: RegisteredClaims {
                iss: set.issuer,
                sub: set.subject,
                aud: set.audience,
                exp: expires_at.timestamp(),
                iat: now.timestamp(),
                nbf: not_before.timestamp(),
                jti: jti.clone(),
            },
            public: set.public,
            private: set.private,
        };

        let content = self.signer.sign(&claims)?;

        debug!(jti = %jti, exp = %expires_at, "Signed access token");

        Ok(AccessToken {
            id: jti,
            token_type: BEARER.to_string(),
            content,
            issued_at: now,
            expires_at,
            time_to_live: self.time_to_live,
        })
    }

    /// Recover the claims of a signed token.
    ///
    /// Reports the claimed expiry without judging it.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidToken`] when the signature does not verify.
    pub fn recover(&self, token: &str) -> Result<RecoveredClaims, AuthError> {
        let claims = self.signer.verify_signature(token)?;
        let expires_at =
            DateTime::from_timestamp(claims.expires_at(), 0).ok_or(AuthError::InvalidToken)?;

        Ok(RecoveredClaims { claims, expires_at })
    }
}

fn shift(from: DateTime<Utc>, by: Duration) -> Result<DateTime<Utc>, AuthError> {
    chrono::Duration::from_std(by)
        .ok()
        .and_then(|delta| from.checked_add_signed(delta))
        .ok_or_else(|| AuthError::config(format!("Duration out of range: {:?}", by)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::jwt::builder::ClaimsBuilder;
    use crate::jwt::claims::PublicClaims;
    use crate::jwt::signer::JwtSigner;
    use crate::random::SequenceGenerator;
    use chrono::TimeZone;
    use jsonwebtoken::Algorithm;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(1974, 12, 4, 1, 0, 0).unwrap()
    }

    fn assembler() -> ClaimAssembler {
        let signer = JwtSigner::hmac(Algorithm::HS256, b"test-secret-key-for-testing-only").unwrap();
        ClaimAssembler::new(Arc::new(signer), Duration::from_secs(300))
            .with_clock(Arc::new(FixedClock::new(t0())))
            .with_id_generator(Arc::new(SequenceGenerator::new("generated")))
    }

    fn claim_set() -> ClaimSet {
        ClaimsBuilder::new("custom-app".to_string())
            .subject("123456".to_string())
            .audience(vec!["app-ID".to_string()])
            .profile(PublicClaims {
                name: "john doe".to_string(),
                given_name: "john".to_string(),
                family_name: "doe".to_string(),
                ..PublicClaims::default()
            })
            .build()
            .unwrap()
    }

    #[test]
    fn test_issue_stamps_id_and_expiry() {
        let token = assembler().issue(claim_set()).unwrap();

        assert_eq!(token.id, "123456:generated-0");
        assert_eq!(token.token_type, BEARER);
        assert_eq!(token.issued_at, t0());
        assert_eq!(token.expires_at, t0() + chrono::Duration::minutes(5));
        assert_eq!(token.time_to_live, Duration::from_secs(300));
    }

    #[test]
    fn test_recover_returns_claims_and_expiry() {
        let assembler = assembler();
        let token = assembler.issue(claim_set()).unwrap();

        let recovered = assembler.recover(&token.content).unwrap();

        assert_eq!(recovered.expires_at, token.expires_at);
        assert_eq!(recovered.claims.registered.jti, token.id);
        assert_eq!(recovered.claims.registered.aud, vec!["app-ID".to_string()]);
        assert_eq!(recovered.claims.public.given_name, "john");
        assert_eq!(ClaimSet::from(recovered.claims), claim_set());
    }

    #[test]
    fn test_not_before_delay() {
        let assembler = assembler().with_not_before(Duration::from_secs(10));
        let token = assembler.issue(claim_set()).unwrap();
        let recovered = assembler.recover(&token.content).unwrap();

        assert_eq!(recovered.claims.registered.nbf, t0().timestamp() + 10);
        assert_eq!(recovered.claims.registered.iat, t0().timestamp());
    }

    #[test]
    fn test_issue_with_lifetime_past_the_calendar() {
        let signer = JwtSigner::hmac(Algorithm::HS256, b"test-secret-key-for-testing-only").unwrap();
        let assembler = ClaimAssembler::new(Arc::new(signer), Duration::from_secs(10_000_000_000_000))
            .with_clock(Arc::new(FixedClock::new(t0())));

        assert!(matches!(
            assembler.issue(claim_set()),
            Err(AuthError::Config(_))
        ));
    }

    #[test]
    fn test_recover_rejects_tampered_token() {
        let assembler = assembler();
        let token = assembler.issue(claim_set()).unwrap();
        let tampered = format!("{}x", token.content);

        assert!(matches!(
            assembler.recover(&tampered),
            Err(AuthError::InvalidToken)
        ));
    }
}
