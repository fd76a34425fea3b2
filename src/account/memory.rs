//! In-memory reference collaborators for the account flows.

use crate::account::{
    CodeSender, CustomerAccount, LocalAccount, LocalCustomerRegister, LocalDirectory, LocalUser,
    Template,
};
use crate::clock::{Clock, SystemClock};
use crate::error::AuthError;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

/// Local customers by email.
#[derive(Debug, Default)]
pub struct InMemoryCustomerRegister {
    accounts: RwLock<HashMap<String, LocalAccount>>,
}

impl InMemoryCustomerRegister {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the account for its email.
    pub fn put(&self, account: LocalAccount) -> Result<(), AuthError> {
        let mut accounts = self
            .accounts
            .write()
            .map_err(|_| AuthError::internal("customer register lock poisoned"))?;
        accounts.insert(account.email.clone(), account);
        Ok(())
    }
}

impl LocalCustomerRegister for InMemoryCustomerRegister {
    fn find(&self, email: &str) -> Result<Option<LocalAccount>, AuthError> {
        let accounts = self
            .accounts
            .read()
            .map_err(|_| AuthError::internal("customer register lock poisoned"))?;
        Ok(accounts.get(email).cloned())
    }
}

#[derive(Debug, Clone)]
struct DirectoryEntry {
    user: LocalUser,
    account: CustomerAccount,
    password: String,
}

/// Local provider users keyed by nickname.
pub struct InMemoryDirectory {
    entries: Mutex<HashMap<String, DirectoryEntry>>,
    clock: Arc<dyn Clock>,
}

impl Default for InMemoryDirectory {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            clock: Arc::new(SystemClock),
        }
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Register an unvalidated user whose nickname is its email.
    pub fn sign_up(&self, account: CustomerAccount, password: &str) -> Result<(), AuthError> {
        let mut entries = self.lock()?;
        if entries.contains_key(&account.email) {
            return Err(AuthError::DuplicateEntity(account.email));
        }

        entries.insert(
            account.email.clone(),
            DirectoryEntry {
                user: LocalUser {
                    nickname: account.email.clone(),
                    email: account.email.clone(),
                    validated_at: None,
                },
                account,
                password: password.to_string(),
            },
        );
        Ok(())
    }

    /// Whether `password` is the current password of `email`.
    pub fn password_matches(&self, email: &str, password: &str) -> Result<bool, AuthError> {
        let entries = self.lock()?;
        Ok(entries
            .values()
            .any(|entry| entry.user.email == email && entry.password == password))
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, DirectoryEntry>>, AuthError> {
        self.entries
            .lock()
            .map_err(|_| AuthError::internal("directory lock poisoned"))
    }

    fn modify(
        &self,
        email: &str,
        change: impl FnOnce(&mut DirectoryEntry),
    ) -> Result<CustomerAccount, AuthError> {
        let mut entries = self.lock()?;
        let entry = entries
            .values_mut()
            .find(|entry| entry.user.email == email)
            .ok_or_else(|| AuthError::not_found(format!("user {}", email)))?;

        change(entry);
        Ok(entry.account.clone())
    }
}

impl LocalDirectory for InMemoryDirectory {
    fn user(&self, nickname: &str) -> Result<Option<LocalUser>, AuthError> {
        let entries = self.lock()?;
        Ok(entries.get(nickname).map(|entry| entry.user.clone()))
    }

    fn mark_validated(&self, email: &str) -> Result<CustomerAccount, AuthError> {
        let now = self.clock.now();
        self.modify(email, |entry| {
            entry.user.validated_at = Some(now);
            entry.account.email_verified = true;
        })
    }

    fn update_password(&self, email: &str, password: &str) -> Result<CustomerAccount, AuthError> {
        self.modify(email, |entry| entry.password = password.to_string())
    }
}

/// A code handed to a [`RecordingCodeSender`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    pub template: Template,
    pub to: String,
    pub code: String,
}

/// Keeps the last delivery per destination instead of sending anything.
#[derive(Debug, Default)]
pub struct RecordingCodeSender {
    sent: Mutex<HashMap<String, Delivery>>,
}

impl RecordingCodeSender {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_sent(&self, to: &str) -> Option<Delivery> {
        self.sent
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(to)
            .cloned()
    }
}

impl CodeSender for RecordingCodeSender {
    fn send(&self, template: Template, to: &str, code: &str) -> Result<(), AuthError> {
        let mut sent = self
            .sent
            .lock()
            .map_err(|_| AuthError::internal("code sender lock poisoned"))?;
        sent.insert(
            to.to_string(),
            Delivery {
                template,
                to: to.to_string(),
                code: code.to_string(),
            },
        );
        Ok(())
    }
}
