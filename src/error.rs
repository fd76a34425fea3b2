//! Error types for the token and code lifecycle engine.
//!
//! Every error carries a classification ([`ErrorKind`]) so callers can tell
//! "no such resource" apart from "resource invalid" or "resource expired".

use thiserror::Error;

/// Error type for all auth-pool operations.
#[derive(Error, Debug)]
pub enum AuthError {
    /// The token failed signature recovery or its secret did not match.
    #[error("the given token is not valid")]
    InvalidToken,

    /// The token's claimed expiry is not after the current time.
    #[error("the given token has expired")]
    ExpiredToken,

    /// Refresh was requested while the access token is still valid.
    #[error("the given access token has not expired")]
    TokenNotExpired,

    /// The stored refresh token is no longer enabled.
    #[error("the given token has been revoked")]
    DisabledToken,

    /// An entity with the same identifier already exists.
    #[error("duplicate entity: {0}")]
    DuplicateEntity(String),

    /// The requested resource does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The code has already been used or is disabled.
    #[error("the given code is not available")]
    CodeUnavailable,

    /// The code is past its expiry timestamp.
    #[error("the given code has expired")]
    ExpiredCode,

    /// The issuance policy rejected the request. The message belongs to the policy.
    #[error("{0}")]
    PolicyRejected(String),

    /// Input rejected by a provider or account rule.
    #[error("{0}")]
    Validation(String),

    /// The signing collaborator failed.
    #[error("could not sign token: {0}")]
    Signing(String),

    /// An identity provider failed.
    #[error("could not validate credentials: {message}")]
    Provider {
        /// Context added by the caller
        message: String,
        /// Underlying failure
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Code delivery failed.
    #[error("could not deliver code: {0}")]
    Delivery(String),

    /// A storage backend failed.
    #[error("storage error: {0}")]
    Storage(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Internal error.
    #[error("internal error: {0}")]
    Internal(String),
}

/// Coarse classification of an [`AuthError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Caller input was rejected. Surface verbatim, never retry.
    Validation,
    /// The resource does not exist.
    NotFound,
    /// The resource exists but its state forbids the operation.
    Conflict,
    /// The resource is past its validity window.
    Expired,
    /// A collaborator (signer, provider, sender, store) failed.
    External,
    /// Misconfiguration or a broken invariant.
    Internal,
}

impl AuthError {
    /// Classify this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidToken
            | Self::TokenNotExpired
            | Self::PolicyRejected(_)
            | Self::Validation(_) => ErrorKind::Validation,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::DuplicateEntity(_) | Self::CodeUnavailable | Self::DisabledToken => {
                ErrorKind::Conflict
            }
            Self::ExpiredToken | Self::ExpiredCode => ErrorKind::Expired,
            Self::Signing(_) | Self::Provider { .. } | Self::Delivery(_) | Self::Storage(_) => {
                ErrorKind::External
            }
            Self::Config(_) | Self::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Stable error code for wire responses.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::InvalidToken => TOKEN_INVALID,
            Self::ExpiredToken => TOKEN_EXPIRED,
            Self::TokenNotExpired => TOKEN_NOT_EXPIRED,
            Self::DisabledToken => TOKEN_DISABLED,
            Self::DuplicateEntity(_) => ENTITY_DUPLICATED,
            Self::NotFound(_) => NOT_FOUND,
            Self::CodeUnavailable => CODE_UNAVAILABLE,
            Self::ExpiredCode => CODE_EXPIRED,
            Self::PolicyRejected(_) => CODE_POLICY_REJECTED,
            Self::Validation(_) => VALIDATION_FAILED,
            Self::Signing(_) => SIGNING_FAILED,
            Self::Provider { .. } => PROVIDER_FAILED,
            Self::Delivery(_) => DELIVERY_FAILED,
            Self::Storage(_) => STORAGE_FAILED,
            Self::Config(_) | Self::Internal(_) => INTERNAL,
        }
    }

    /// Create a not found error.
    #[must_use]
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    /// Create a validation error.
    #[must_use]
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Wrap a provider failure with context.
    #[must_use]
    pub fn provider(
        message: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self::Provider {
            message: message.into(),
            source: source.into(),
        }
    }

    /// Create a delivery error.
    #[must_use]
    pub fn delivery(msg: impl Into<String>) -> Self {
        Self::Delivery(msg.into())
    }

    /// Create a storage error.
    #[must_use]
    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }

    /// Create a configuration error.
    #[must_use]
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an internal error.
    #[must_use]
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}

impl From<jsonwebtoken::errors::Error> for AuthError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        AuthError::Signing(err.to_string())
    }
}

// Error codes for wire responses
pub const TOKEN_INVALID: &str = "TOKEN_INVALID";
pub const TOKEN_EXPIRED: &str = "TOKEN_EXPIRED";
pub const TOKEN_NOT_EXPIRED: &str = "TOKEN_NOT_EXPIRED";
pub const TOKEN_DISABLED: &str = "TOKEN_DISABLED";
pub const ENTITY_DUPLICATED: &str = "ENTITY_DUPLICATED";
pub const NOT_FOUND: &str = "NOT_FOUND";
pub const CODE_UNAVAILABLE: &str = "CODE_UNAVAILABLE";
pub const CODE_EXPIRED: &str = "CODE_EXPIRED";
pub const CODE_POLICY_REJECTED: &str = "CODE_POLICY_REJECTED";
pub const VALIDATION_FAILED: &str = "VALIDATION_FAILED";
pub const SIGNING_FAILED: &str = "SIGNING_FAILED";
pub const PROVIDER_FAILED: &str = "PROVIDER_FAILED";
pub const DELIVERY_FAILED: &str = "DELIVERY_FAILED";
pub const STORAGE_FAILED: &str = "STORAGE_FAILED";
pub const INTERNAL: &str = "INTERNAL";
