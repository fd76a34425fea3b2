//! Account-facing flows built on the token and code engines.
//!
//! Identity providers, account synchronization, the local customer register
//! and code delivery are collaborators consumed through the traits below.

mod authenticator;
mod manager;
mod memory;
mod retriever;

pub use authenticator::{Authenticated, Authenticator};
pub use manager::AccountManager;
pub use memory::{Delivery, InMemoryCustomerRegister, InMemoryDirectory, RecordingCodeSender};
pub use retriever::{AccountRetriever, ProviderRegistry};

use crate::error::AuthError;
use crate::token::Identity;
use chrono::{DateTime, Utc};
use std::fmt;

/// Built-in provider names.
pub const GOOGLE: &str = "google";
pub const FACEBOOK: &str = "facebook";
pub const LOCAL: &str = "local";

/// What a user presents to a provider. `secret` may be a password or a
/// provider-issued token.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub email: String,
    pub secret: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            secret: secret.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("secret", &"[REDACTED]")
            .finish()
    }
}

/// Identity confirmed by a provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedIdentity {
    /// Id of the user inside the provider
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub photo_url: Option<String>,
    pub email_validated: bool,
}

/// An identity provider (google, facebook, local, ...).
pub trait Provider: Send + Sync {
    /// Check `credentials` and return the identity they prove.
    fn retrieve(&self, credentials: &Credentials) -> Result<ValidatedIdentity, AuthError>;

    fn name(&self) -> &str;
}

/// Result of [`AccountSynchronization::synchronize`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynchronizedAccount {
    /// Local customer id
    pub customer_id: String,
    /// Id of the user inside the provider
    pub reference_in_provider: String,
}

/// Creates or updates the local customer and federated account for a
/// provider identity.
pub trait AccountSynchronization: Send + Sync {
    fn synchronize(
        &self,
        provider: &str,
        identity: &ValidatedIdentity,
    ) -> Result<SynchronizedAccount, AuthError>;
}

/// A customer as seen by the authentication flows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomerAccount {
    pub id: String,
    pub email: String,
    pub email_verified: bool,
    pub name: String,
    pub first_name: String,
    pub last_name: String,
    pub photo_url: Option<String>,
}

impl From<&CustomerAccount> for Identity {
    fn from(account: &CustomerAccount) -> Self {
        Identity {
            id: account.id.clone(),
            name: account.name.clone(),
            given_name: account.first_name.clone(),
            family_name: account.last_name.clone(),
            email: account.email.clone(),
            email_verified: account.email_verified,
            picture: account.photo_url.clone(),
        }
    }
}

/// Local customer record gating authentication.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalAccount {
    pub id: String,
    pub status: String,
    pub enabled: bool,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Lookup of local customers by email.
pub trait LocalCustomerRegister: Send + Sync {
    /// `None` when no usable account exists for `email`.
    fn find(&self, email: &str) -> Result<Option<LocalAccount>, AuthError>;
}

/// A user of the local (password) provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalUser {
    pub nickname: String,
    pub email: String,
    pub validated_at: Option<DateTime<Utc>>,
}

impl LocalUser {
    pub fn is_validated(&self) -> bool {
        self.validated_at.is_some()
    }
}

/// User directory of the local provider.
pub trait LocalDirectory: Send + Sync {
    fn user(&self, nickname: &str) -> Result<Option<LocalUser>, AuthError>;

    fn mark_validated(&self, email: &str) -> Result<CustomerAccount, AuthError>;

    fn update_password(&self, email: &str, password: &str) -> Result<CustomerAccount, AuthError>;
}

/// Message template a code is delivered with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Template {
    Validation,
    Reminder,
}

impl Template {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Validation => "validation-email",
            Self::Reminder => "remind-email",
        }
    }
}

impl fmt::Display for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Delivers codes to users (mail, sms, ...).
pub trait CodeSender: Send + Sync {
    fn send(&self, template: Template, to: &str, code: &str) -> Result<(), AuthError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credentials_debug_hides_secret() {
        let credentials = Credentials::new("john@example.com", "hunter2");
        let debug = format!("{:?}", credentials);

        assert!(debug.contains("john@example.com"));
        assert!(!debug.contains("hunter2"));
    }

    #[test]
    fn test_identity_from_account() {
        let account = CustomerAccount {
            id: "customer-1".to_string(),
            email: "john@example.com".to_string(),
            email_verified: true,
            name: "John Doe".to_string(),
            first_name: "John".to_string(),
            last_name: "Doe".to_string(),
            photo_url: None,
        };

        let identity = Identity::from(&account);
        assert_eq!(identity.id, "customer-1");
        assert_eq!(identity.given_name, "John");
        assert_eq!(identity.family_name, "Doe");
        assert!(identity.email_verified);
    }

    #[test]
    fn test_template_names() {
        assert_eq!(Template::Validation.to_string(), "validation-email");
        assert_eq!(Template::Reminder.as_str(), "remind-email");
    }
}
