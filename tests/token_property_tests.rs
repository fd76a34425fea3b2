//! Property-based tests for the token lifecycle.
//!
//! Property: Fresh Tokens Verify
//! Property: Refresh Requires Expiry
//! Property: Refresh Preserves Identity And Reuses The Handle

use auth_pool::clock::{Clock, FixedClock};
use auth_pool::jwt::{ClaimAssembler, JwtSigner};
use auth_pool::refresh::RefreshTokenGenerator;
use auth_pool::storage::InMemoryTokenStore;
use auth_pool::token::{Identity, TokenManager};
use auth_pool::AuthError;
use chrono::{Duration, TimeZone, Utc};
use jsonwebtoken::Algorithm;
use proptest::prelude::*;
use std::sync::Arc;

const SECRET: &[u8] = b"test-secret-key-for-property-testing-32b";

/// Generate arbitrary identities.
fn arb_identity() -> impl Strategy<Value = Identity> {
    (
        "[a-zA-Z0-9_-]{1,40}",
        "[a-z]{1,12}",
        "[a-z]{1,12}",
        "[a-z0-9.]{1,20}@[a-z]{1,10}\\.com",
        any::<bool>(),
        prop::option::of("https://[a-z]{1,10}\\.com/[a-z]{1,10}\\.png"),
    )
        .prop_map(|(id, given, family, email, verified, picture)| Identity {
            id,
            name: format!("{} {}", given, family),
            given_name: given,
            family_name: family,
            email,
            email_verified: verified,
            picture,
        })
}

/// Generate arbitrary TTL (1 minute to 24 hours).
fn arb_ttl() -> impl Strategy<Value = i64> {
    60i64..86400i64
}

fn manager(ttl_seconds: i64, clock: Arc<FixedClock>) -> TokenManager {
    let signer = JwtSigner::hmac(Algorithm::HS256, SECRET).unwrap();
    let assembler = ClaimAssembler::new(
        Arc::new(signer),
        std::time::Duration::from_secs(ttl_seconds as u64),
    )
    .with_clock(clock.clone());

    TokenManager::new(
        "property-issuer",
        vec!["property-app".to_string()],
        assembler,
        RefreshTokenGenerator::default().with_secret_length(64),
        Arc::new(InMemoryTokenStore::new()),
    )
    .with_clock(clock)
}

fn clock() -> Arc<FixedClock> {
    Arc::new(FixedClock::new(Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap()))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(50))]

    /// Property: Fresh Tokens Verify
    ///
    /// Any token verifies before its TTL runs out and carries the subject.
    #[test]
    fn prop_fresh_token_verifies(
        identity in arb_identity(),
        ttl in arb_ttl(),
        elapsed_pct in 0i64..100,
    ) {
        let clock = clock();
        let manager = manager(ttl, clock.clone());
        let pair = manager.create_token(&identity).unwrap();

        prop_assert_eq!(pair.access_token.token_type.as_str(), "Bearer");
        prop_assert_eq!(pair.access_token.expires_at, clock.now() + Duration::seconds(ttl));

        clock.advance(Duration::seconds(ttl * elapsed_pct / 100));
        let verified = manager.verify(&pair.access_token.content).unwrap();
        prop_assert_eq!(verified.subject, identity.id);
        prop_assert_eq!(verified.email, identity.email);

        clock.set(pair.access_token.expires_at);
        prop_assert!(matches!(
            manager.verify(&pair.access_token.content),
            Err(AuthError::ExpiredToken)
        ));
    }

    /// Property: Refresh Requires Expiry
    ///
    /// While the access token is valid, refresh fails regardless of what
    /// refresh string accompanies it.
    #[test]
    fn prop_refresh_rejected_before_expiry(
        identity in arb_identity(),
        ttl in arb_ttl(),
        refresh_string in prop::option::of("[a-zA-Z0-9=_-]{0,80}"),
    ) {
        let clock = clock();
        let manager = manager(ttl, clock.clone());
        let pair = manager.create_token(&identity).unwrap();

        let presented = refresh_string.unwrap_or_else(|| pair.refresh_token.token.clone());
        clock.advance(Duration::seconds(ttl - 1));

        prop_assert!(matches!(
            manager.refresh(&presented, &pair.access_token.content),
            Err(AuthError::TokenNotExpired)
        ));
    }

    /// Property: Refresh Preserves Identity And Reuses The Handle
    #[test]
    fn prop_refresh_after_expiry(
        identity in arb_identity(),
        ttl in arb_ttl(),
        overdue in 0i64..86400,
    ) {
        let clock = clock();
        let manager = manager(ttl, clock.clone());
        let pair = manager.create_token(&identity).unwrap();

        clock.advance(Duration::seconds(ttl + overdue));
        let first = manager
            .refresh(&pair.refresh_token.token, &pair.access_token.content)
            .unwrap();
        let second = manager
            .refresh(&pair.refresh_token.token, &pair.access_token.content)
            .unwrap();

        prop_assert_ne!(&first.id, &pair.access_token.id);
        prop_assert_ne!(&first.id, &second.id);
        prop_assert_eq!(first.expires_at, clock.now() + Duration::seconds(ttl));

        let verified = manager.verify(&first.content).unwrap();
        prop_assert_eq!(verified.subject, identity.id.clone());
        prop_assert_eq!(verified.email, identity.email.clone());
        prop_assert!(manager.verify(&second.content).is_ok());
    }

    /// Tokens signed with another key never verify.
    #[test]
    fn prop_foreign_signature_is_invalid(identity in arb_identity()) {
        let clock = clock();
        let manager = manager(600, clock.clone());

        let foreign_signer = JwtSigner::hmac(Algorithm::HS256, b"some-other-secret-entirely-32bytes").unwrap();
        let foreign = TokenManager::new(
            "property-issuer",
            vec![],
            ClaimAssembler::new(Arc::new(foreign_signer), std::time::Duration::from_secs(600))
                .with_clock(clock.clone()),
            RefreshTokenGenerator::default().with_secret_length(16),
            Arc::new(InMemoryTokenStore::new()),
        )
        .with_clock(clock);
        let pair = foreign.create_token(&identity).unwrap();

        prop_assert!(matches!(
            manager.verify(&pair.access_token.content),
            Err(AuthError::InvalidToken)
        ));
    }
}
