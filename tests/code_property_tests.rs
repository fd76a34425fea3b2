//! Property-based tests for one-time codes.
//!
//! Property: Codes Redeem Exactly Once
//! Property: Rejections Carry The Policy Message
//! Property: The Window Admits At Most Limit Codes

use auth_pool::clock::{Clock, FixedClock};
use auth_pool::codes::{CodeManager, IssuancePolicy, LimitIssuerPolicy, NoopPolicy};
use auth_pool::random::{fixed_code, numeric_code};
use auth_pool::storage::{CodeStatus, InMemoryCodeStore, InMemoryTryStore};
use auth_pool::AuthError;
use chrono::{Duration, TimeZone, Utc};
use proptest::prelude::*;
use std::sync::Arc;

fn arb_issuer() -> impl Strategy<Value = String> {
    "[a-z0-9.]{1,20}@[a-z]{1,10}\\.com".prop_map(|s| s)
}

fn clock() -> Arc<FixedClock> {
    Arc::new(FixedClock::new(Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap()))
}

fn codes(
    clock: Arc<FixedClock>,
    generator: auth_pool::random::CodeGenerator,
    policy: Arc<dyn IssuancePolicy>,
    ttl: Duration,
) -> CodeManager {
    CodeManager::new(
        generator,
        Arc::new(InMemoryCodeStore::new().with_clock(clock.clone())),
        policy,
        ttl,
    )
    .with_clock(clock)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Property: Codes Redeem Exactly Once
    #[test]
    fn prop_code_redeems_once(
        issuer in arb_issuer(),
        content in "[0-9]{4,8}",
        ttl_minutes in 1i64..120,
    ) {
        let clock = clock();
        let manager = codes(
            clock.clone(),
            fixed_code(content.clone()),
            Arc::new(NoopPolicy),
            Duration::minutes(ttl_minutes),
        );

        let issued = manager.issue(&issuer).unwrap();
        prop_assert_eq!(&issued.content, &content);
        prop_assert_eq!(issued.status, CodeStatus::Enabled);
        prop_assert_eq!(issued.expires_at, clock.now() + Duration::minutes(ttl_minutes));

        let used = manager.consume(&issuer, &content).unwrap();
        prop_assert_eq!(used.status, CodeStatus::Used);
        prop_assert!(matches!(
            manager.consume(&issuer, &content),
            Err(AuthError::CodeUnavailable)
        ));
    }

    /// Expired codes are rejected and cannot be retried.
    #[test]
    fn prop_expired_code_rejected(
        issuer in arb_issuer(),
        ttl_minutes in 1i64..120,
        overdue_seconds in 1i64..86400,
    ) {
        let clock = clock();
        let manager = codes(
            clock.clone(),
            fixed_code("123456"),
            Arc::new(NoopPolicy),
            Duration::minutes(ttl_minutes),
        );
        manager.issue(&issuer).unwrap();

        clock.advance(Duration::minutes(ttl_minutes) + Duration::seconds(overdue_seconds));
        prop_assert!(matches!(manager.consume(&issuer, "123456"), Err(AuthError::ExpiredCode)));
        prop_assert!(matches!(manager.consume(&issuer, "123456"), Err(AuthError::CodeUnavailable)));
    }

    /// Property: Rejections Carry The Policy Message
    #[test]
    fn prop_zero_limit_rejects_with_message(
        issuer in arb_issuer(),
        window_minutes in 1i64..1440,
    ) {
        let clock = clock();
        let policy = LimitIssuerPolicy::new(
            Arc::new(InMemoryTryStore::new()),
            0,
            Duration::minutes(window_minutes),
        )
        .with_clock(clock.clone());
        let expected = policy.message();
        let manager = codes(clock, numeric_code(6), Arc::new(policy), Duration::minutes(30));

        match manager.issue(&issuer) {
            Err(AuthError::PolicyRejected(message)) => prop_assert_eq!(message, expected),
            other => prop_assert!(false, "expected policy rejection, got {:?}", other),
        }
    }

    /// Property: The Window Admits At Most Limit Codes
    #[test]
    fn prop_window_limit(
        issuer in arb_issuer(),
        limit in 1usize..8,
        attempts in 1usize..16,
    ) {
        let clock = clock();
        let policy = LimitIssuerPolicy::new(Arc::new(InMemoryTryStore::new()), limit, Duration::hours(1))
            .with_clock(clock.clone());
        let manager = codes(clock.clone(), numeric_code(6), Arc::new(policy), Duration::minutes(30));

        let admitted = (0..attempts)
            .filter(|_| {
                clock.advance(Duration::seconds(1));
                manager.issue(&issuer).is_ok()
            })
            .count();
        prop_assert_eq!(admitted, attempts.min(limit));

        clock.advance(Duration::hours(1));
        prop_assert!(manager.issue(&issuer).is_ok());
    }

    /// Generated codes are digits of the requested length.
    #[test]
    fn prop_numeric_code_shape(length in 1usize..16) {
        let code = numeric_code(length)();
        prop_assert_eq!(code.len(), length);
        prop_assert!(code.chars().all(|c| c.is_ascii_digit()));
    }
}
