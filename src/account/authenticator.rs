use crate::account::{AccountRetriever, Credentials, CustomerAccount, LocalAccount, LocalCustomerRegister};
use crate::error::AuthError;
use crate::token::{Identity, TokenManager, TokenPair};
use std::sync::Arc;
use tracing::info;

/// Successful [`Authenticator::authenticate`].
#[derive(Debug, Clone)]
pub struct Authenticated {
    pub account: CustomerAccount,
    pub tokens: TokenPair,
}

/// Turns provider credentials into token pairs for enabled local customers.
pub struct Authenticator {
    tokens: Arc<TokenManager>,
    register: Arc<dyn LocalCustomerRegister>,
}

impl Authenticator {
    pub fn new(tokens: Arc<TokenManager>, register: Arc<dyn LocalCustomerRegister>) -> Self {
        Self { tokens, register }
    }

    pub fn authenticate(
        &self,
        retriever: &AccountRetriever,
        credentials: &Credentials,
    ) -> Result<Authenticated, AuthError> {
        let account = retriever.retrieve(credentials)?;
        self.enabled_account(&account.email)?;

        let tokens = self.tokens.create_token(&Identity::from(&account))?;

        info!(
            provider = %retriever.provider_name(),
            customer_id = %account.id,
            "Authenticated customer"
        );

        Ok(Authenticated { account, tokens })
    }

    /// Verify an access token and return the local account it belongs to.
    pub fn verify(&self, access_token: &str) -> Result<LocalAccount, AuthError> {
        let verified = self.tokens.verify(access_token)?;
        self.enabled_account(&verified.email)
    }

    fn enabled_account(&self, email: &str) -> Result<LocalAccount, AuthError> {
        let account = self
            .register
            .find(email)?
            .ok_or_else(|| AuthError::validation("the given user account does not exist"))?;

        if !account.enabled {
            return Err(AuthError::validation("the given user account is not available"));
        }

        Ok(account)
    }
}
