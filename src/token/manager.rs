//! Access/refresh token pair lifecycle.
//!
//! Issuance signs an access token, issues a refresh handle for the same
//! subject and persists both halves, access first. Verification is a
//! signature check plus a clock check and never reads the store. Refresh is
//! only allowed once the access token has expired and does not rotate the
//! refresh handle.

use crate::clock::{Clock, SystemClock};
use crate::error::AuthError;
use crate::jwt::{
    AccessToken, ClaimAssembler, ClaimSet, ClaimsBuilder, PublicClaims, RegisteredClaims,
};
use crate::metrics;
use crate::refresh::{RefreshHandle, RefreshToken, RefreshTokenGenerator};
use crate::storage::{TokenEntity, TokenKind, TokenStore};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use subtle::ConstantTimeEq;
use tracing::{info, warn};

/// Identity attributes a token pair is issued for.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Identity {
    /// Subject id
    pub id: String,
    pub name: String,
    pub given_name: String,
    pub family_name: String,
    pub email: String,
    pub email_verified: bool,
    pub picture: Option<String>,
}

/// Result of [`TokenManager::create_token`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenPair {
    pub access_token: AccessToken,
    pub refresh_token: RefreshToken,
}

/// Result of a successful [`TokenManager::verify`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedToken {
    pub subject: String,
    pub email: String,
    pub expires_at: DateTime<Utc>,
}

/// Orchestrates token issuance, verification and refresh.
pub struct TokenManager {
    issuer: String,
    audience: Vec<String>,
    assembler: ClaimAssembler,
    refresh_tokens: RefreshTokenGenerator,
    store: Arc<dyn TokenStore>,
    clock: Arc<dyn Clock>,
}

impl TokenManager {
    /// Create a manager issuing tokens as `issuer` for `audience`.
    ///
    /// Give the assembler and the manager the same clock.
    pub fn new(
        issuer: impl Into<String>,
        audience: Vec<String>,
        assembler: ClaimAssembler,
        refresh_tokens: RefreshTokenGenerator,
        store: Arc<dyn TokenStore>,
    ) -> Self {
        Self {
            issuer: issuer.into(),
            audience,
            assembler,
            refresh_tokens,
            store,
            clock: Arc::new(SystemClock),
        }
    }

    /// Use another time source for expiry decisions and entity timestamps.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Issue and persist an access/refresh pair for `identity`.
    ///
    /// # Errors
    ///
    /// [`AuthError::Validation`] for an empty subject id. Signing and store
    /// errors are returned as-is. If the refresh entity fails to save, the
    /// access entity is already persisted and stays so.
    pub fn create_token(&self, identity: &Identity) -> Result<TokenPair, AuthError> {
        let set = ClaimsBuilder::new(self.issuer.clone())
            .subject(identity.id.clone())
            .audience(self.audience.clone())
            .profile(PublicClaims {
                name: identity.name.clone(),
                given_name: identity.given_name.clone(),
                family_name: identity.family_name.clone(),
                email: identity.email.clone(),
                email_verified: identity.email_verified,
                picture: identity.picture.clone(),
                ..PublicClaims::default()
            })
            .build()?;

        let access_token = self.assembler.issue(set)?;
        let handle = self.refresh_tokens.issue(&identity.id)?;

        self.persist(&access_token, &handle, &identity.id)?;

        metrics::record_token_issued(TokenKind::Access.as_str(), self.assembler.algorithm());
        metrics::record_token_issued(TokenKind::Refresh.as_str(), "opaque");

        info!(
            subject = %identity.id,
            access_token_id = %access_token.id,
            refresh_token_id = %handle.id(),
            "Issued token pair"
        );

        Ok(TokenPair {
            refresh_token: RefreshToken::from(&handle),
            access_token,
        })
    }

    fn persist(
        &self,
        access_token: &AccessToken,
        handle: &RefreshHandle,
        user_id: &str,
    ) -> Result<(), AuthError> {
        let now = self.clock.now();

        self.store.save(TokenEntity::access(
            access_token.id.clone(),
            user_id.to_string(),
            access_token.content.clone(),
            access_token.expires_at,
            now,
        ))?;

        self.store
            .save(TokenEntity::refresh(
                handle.id().to_string(),
                user_id.to_string(),
                handle.secret().to_string(),
                access_token.id.clone(),
                now,
            ))
            .inspect_err(|e| {
                warn!(
                    access_token_id = %access_token.id,
                    error = %e,
                    "Refresh entity not saved; access entity left orphaned"
                );
            })
    }

    /// Check an access token's signature and expiry.
    ///
    /// # Errors
    ///
    /// [`AuthError::InvalidToken`] if the signature fails or the token is
    /// not valid yet, [`AuthError::ExpiredToken`] if the expiry is not after
    /// now.
    pub fn verify(&self, token: &str) -> Result<VerifiedToken, AuthError> {
        let recovered = self.assembler.recover(token).inspect_err(|e| {
            metrics::record_token_verified(e.code());
        })?;
        let now = self.clock.now();

        if recovered.expires_at <= now {
            metrics::record_token_verified(crate::error::TOKEN_EXPIRED);
            return Err(AuthError::ExpiredToken);
        }

        // only `nbf` can fail here
        if !recovered.claims.is_valid_at(now.timestamp()) {
            metrics::record_token_verified(crate::error::TOKEN_INVALID);
            return Err(AuthError::InvalidToken);
        }

        metrics::record_token_verified("valid");

        let RegisteredClaims { sub, .. } = recovered.claims.registered;
        Ok(VerifiedToken {
            subject: sub,
            email: recovered.claims.public.email,
            expires_at: recovered.expires_at,
        })
    }

    /// Re-sign an expired access token using a refresh token.
    ///
    /// The new token carries the original registered and profile claims with
    /// a fresh id and expiry; application claims are not carried over. The refresh token stays valid for later refreshes.
    ///
    /// # Errors
    ///
    /// - [`AuthError::InvalidToken`]: access signature fails, refresh token is
    ///   malformed, belongs to another subject, or its secret does not match
    /// - [`AuthError::TokenNotExpired`]: the access token is still valid
    /// - [`AuthError::NotFound`]: no stored refresh entity
    /// - [`AuthError::DisabledToken`]: the refresh entity is not enabled
    pub fn refresh(&self, refresh_token: &str, access_token: &str) -> Result<AccessToken, AuthError> {
        self.try_refresh(refresh_token, access_token)
            .inspect(|_| metrics::record_token_refreshed("success"))
            .inspect_err(|e| {
                metrics::record_token_refreshed(e.code());
                warn!(error = %e, "Refresh rejected");
            })
    }

    fn try_refresh(&self, refresh_token: &str, access_token: &str) -> Result<AccessToken, AuthError> {
        let recovered = self.assembler.recover(access_token)?;

        if recovered.expires_at > self.clock.now() {
            return Err(AuthError::TokenNotExpired);
        }

        let handle = RefreshHandle::parse(refresh_token)?;
        let stored = self.store.find(handle.id())?;

        if !stored.is_enabled() {
            return Err(AuthError::DisabledToken);
        }

        let secret_matches: bool = stored
            .content
            .as_bytes()
            .ct_eq(handle.secret().as_bytes())
            .into();

        if stored.kind != TokenKind::Refresh
            || !secret_matches
            || stored.user_id != recovered.claims.registered.sub
        {
            return Err(AuthError::InvalidToken);
        }

        let mut set = ClaimSet::from(recovered.claims);
        set.private.clear();
        let renewed = self.assembler.issue(set)?;

        metrics::record_token_issued(TokenKind::Access.as_str(), self.assembler.algorithm());
        info!(
            subject = %stored.user_id,
            refresh_token_id = %stored.id,
            access_token_id = %renewed.id,
            "Refreshed access token"
        );

        Ok(renewed)
    }
}
