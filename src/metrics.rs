//! Prometheus metrics for token and code lifecycles.

use once_cell::sync::Lazy;
use prometheus::{register_counter_vec, CounterVec};

/// Tokens issued counter.
pub static TOKENS_ISSUED: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "auth_pool_tokens_issued_total",
        "Total number of tokens issued",
        &["token_type", "algorithm"]
    )
    .expect("Failed to register tokens_issued metric")
});

/// Tokens refreshed counter.
pub static TOKENS_REFRESHED: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "auth_pool_tokens_refreshed_total",
        "Total number of refresh attempts",
        &["status"]
    )
    .expect("Failed to register tokens_refreshed metric")
});

/// Token verifications counter.
pub static TOKENS_VERIFIED: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "auth_pool_tokens_verified_total",
        "Total number of access token verifications",
        &["status"]
    )
    .expect("Failed to register tokens_verified metric")
});

/// Codes issued counter.
pub static CODES_ISSUED: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "auth_pool_codes_issued_total",
        "Total number of code issuance attempts",
        &["status"]
    )
    .expect("Failed to register codes_issued metric")
});

/// Codes consumed counter.
pub static CODES_CONSUMED: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "auth_pool_codes_consumed_total",
        "Total number of code redemption attempts",
        &["status"]
    )
    .expect("Failed to register codes_consumed metric")
});

/// Record a token issuance.
pub fn record_token_issued(token_type: &str, algorithm: &str) {
    TOKENS_ISSUED
        .with_label_values(&[token_type, algorithm])
        .inc();
}

/// Record a refresh attempt.
pub fn record_token_refreshed(status: &str) {
    TOKENS_REFRESHED.with_label_values(&[status]).inc();
}

/// Record a verification.
pub fn record_token_verified(status: &str) {
    TOKENS_VERIFIED.with_label_values(&[status]).inc();
}

/// Record a code issuance attempt.
pub fn record_code_issued(status: &str) {
    CODES_ISSUED.with_label_values(&[status]).inc();
}

/// Record a code redemption attempt.
pub fn record_code_consumed(status: &str) {
    CODES_CONSUMED.with_label_values(&[status]).inc();
}
