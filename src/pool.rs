//! Ready-wired engine over the in-memory stores.

use crate::clock::{Clock, SystemClock};
use crate::codes::{CodeManager, LimitIssuerPolicy};
use crate::config::Config;
use crate::error::AuthError;
use crate::jwt::{AccessToken, ClaimAssembler};
use crate::random::numeric_code;
use crate::refresh::RefreshTokenGenerator;
use crate::storage::{Code, InMemoryCodeStore, InMemoryTokenStore, InMemoryTryStore};
use crate::token::{Identity, TokenManager, TokenPair, VerifiedToken};
use std::sync::Arc;
use tracing::info;

/// Token and code lifecycle engine behind one handle.
#[derive(Clone)]
pub struct AuthPool {
    tokens: Arc<TokenManager>,
    codes: Arc<CodeManager>,
}

impl AuthPool {
    /// Assemble a pool from already built managers.
    pub fn new(tokens: Arc<TokenManager>, codes: Arc<CodeManager>) -> Self {
        Self { tokens, codes }
    }

    /// Wire signer, stores, policy and managers from `config`.
    ///
    /// # Errors
    ///
    /// Returns a config error when the signer cannot be built.
    pub fn from_config(config: &Config) -> Result<Self, AuthError> {
        Self::from_config_with_clock(config, Arc::new(SystemClock))
    }

    /// Same as [`AuthPool::from_config`] with every component reading `clock`.
    ///
    /// # Errors
    ///
    /// Returns a config error when the signer cannot be built.
    pub fn from_config_with_clock(config: &Config, clock: Arc<dyn Clock>) -> Result<Self, AuthError> {
        let signer = config.build_signer()?;

        let assembler = ClaimAssembler::new(Arc::new(signer), config.access_token_ttl)
            .with_clock(clock.clone())
            .with_not_before(config.access_token_not_before);
        let tokens = TokenManager::new(
            config.jwt_issuer.clone(),
            config.jwt_audience.clone(),
            assembler,
            RefreshTokenGenerator::default().with_secret_length(config.refresh_secret_length),
            Arc::new(InMemoryTokenStore::new()),
        )
        .with_clock(clock.clone());

        let code_window = to_chrono(config.code_window)?;
        let policy = LimitIssuerPolicy::new(
            Arc::new(InMemoryTryStore::new().with_retention(code_window)),
            config.code_limit,
            code_window,
        )
        .with_clock(clock.clone());
        let codes = CodeManager::new(
            numeric_code(config.code_length),
            Arc::new(InMemoryCodeStore::new().with_clock(clock.clone())),
            Arc::new(policy),
            to_chrono(config.code_ttl)?,
        )
        .with_clock(clock);

        info!(
            issuer = %config.jwt_issuer,
            algorithm = %config.jwt_algorithm.as_str(),
            access_token_ttl = ?config.access_token_ttl,
            code_limit = config.code_limit,
            "Auth pool ready"
        );

        Ok(Self::new(Arc::new(tokens), Arc::new(codes)))
    }

    pub fn tokens(&self) -> &Arc<TokenManager> {
        &self.tokens
    }

    pub fn codes(&self) -> &Arc<CodeManager> {
        &self.codes
    }

    pub fn create_token(&self, identity: &Identity) -> Result<TokenPair, AuthError> {
        self.tokens.create_token(identity)
    }

    pub fn verify(&self, access_token: &str) -> Result<VerifiedToken, AuthError> {
        self.tokens.verify(access_token)
    }

    pub fn refresh(&self, refresh_token: &str, access_token: &str) -> Result<AccessToken, AuthError> {
        self.tokens.refresh(refresh_token, access_token)
    }

    pub fn issue_code(&self, issuer: &str) -> Result<Code, AuthError> {
        self.codes.issue(issuer)
    }

    pub fn consume_code(&self, issuer: &str, content: &str) -> Result<Code, AuthError> {
        self.codes.consume(issuer, content)
    }
}

fn to_chrono(duration: std::time::Duration) -> Result<chrono::Duration, AuthError> {
    chrono::Duration::from_std(duration)
        .map_err(|e| AuthError::config(format!("Duration out of range: {}", e)))
}
