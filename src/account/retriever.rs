use crate::account::{AccountSynchronization, Credentials, CustomerAccount, Provider};
use crate::error::AuthError;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Providers by name.
#[derive(Default)]
pub struct ProviderRegistry {
    providers: HashMap<String, Arc<dyn Provider>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `provider` under its own name, replacing any previous one.
    #[must_use]
    pub fn with(mut self, provider: Arc<dyn Provider>) -> Self {
        self.providers.insert(provider.name().to_string(), provider);
        self
    }

    /// Provider registered as `name`, or [`AuthError::NotFound`].
    pub fn get(&self, name: &str) -> Result<Arc<dyn Provider>, AuthError> {
        self.providers
            .get(name)
            .cloned()
            .ok_or_else(|| AuthError::not_found(format!("provider {}", name)))
    }

    /// Retriever for the provider registered as `name`.
    pub fn retriever(
        &self,
        name: &str,
        synchronization: Arc<dyn AccountSynchronization>,
    ) -> Result<AccountRetriever, AuthError> {
        Ok(AccountRetriever::new(self.get(name)?, synchronization))
    }
}

/// Validates credentials with one provider and synchronizes the result into
/// a local customer account.
pub struct AccountRetriever {
    provider: Arc<dyn Provider>,
    synchronization: Arc<dyn AccountSynchronization>,
}

impl AccountRetriever {
    pub fn new(
        provider: Arc<dyn Provider>,
        synchronization: Arc<dyn AccountSynchronization>,
    ) -> Self {
        Self {
            provider,
            synchronization,
        }
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    pub fn retrieve(&self, credentials: &Credentials) -> Result<CustomerAccount, AuthError> {
        let identity = self.provider.retrieve(credentials)?;
        let synced = self
            .synchronization
            .synchronize(self.provider.name(), &identity)?;

        debug!(
            provider = %self.provider.name(),
            customer_id = %synced.customer_id,
            "Synchronized account"
        );

        Ok(CustomerAccount {
            id: synced.customer_id,
            name: format!("{} {}", identity.first_name, identity.last_name),
            email: identity.email,
            email_verified: identity.email_validated,
            first_name: identity.first_name,
            last_name: identity.last_name,
            photo_url: identity.photo_url,
        })
    }
}
