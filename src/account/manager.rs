use crate::account::{CodeSender, CustomerAccount, LocalDirectory, LocalUser, Template};
use crate::codes::CodeManager;
use crate::error::AuthError;
use std::sync::Arc;
use tracing::info;

/// Code-backed flows of the local provider: email validation and password
/// reset.
///
/// Codes are issued to and redeemed for the user's email, whatever nickname
/// the caller uses.
pub struct AccountManager {
    directory: Arc<dyn LocalDirectory>,
    codes: Arc<CodeManager>,
    sender: Arc<dyn CodeSender>,
}

impl AccountManager {
    pub fn new(
        directory: Arc<dyn LocalDirectory>,
        codes: Arc<CodeManager>,
        sender: Arc<dyn CodeSender>,
    ) -> Self {
        Self {
            directory,
            codes,
            sender,
        }
    }

    /// Send a validation code to a user that has not validated yet.
    pub fn send_validation_code(&self, nickname: &str) -> Result<(), AuthError> {
        let user = self.user(nickname)?;
        if user.is_validated() {
            return Err(AuthError::validation(
                "the given account has been validated already",
            ));
        }

        self.deliver(&user, Template::Validation)
    }

    /// Redeem a validation code and mark the user validated.
    pub fn validate_account(&self, nickname: &str, code: &str) -> Result<CustomerAccount, AuthError> {
        let user = self.user(nickname)?;
        self.codes.consume(&user.email, code)?;

        let account = self.directory.mark_validated(&user.email)?;
        info!(email = %user.email, "Validated account");
        Ok(account)
    }

    /// Send a password reset code to a validated user.
    pub fn remind_password(&self, nickname: &str) -> Result<(), AuthError> {
        let user = self.user(nickname)?;
        if !user.is_validated() {
            return Err(AuthError::validation(
                "the given account has not been validated",
            ));
        }

        self.deliver(&user, Template::Reminder)
    }

    /// Redeem a reset code and set a new password.
    pub fn reset_password(
        &self,
        nickname: &str,
        password: &str,
        code: &str,
    ) -> Result<CustomerAccount, AuthError> {
        let user = self.user(nickname)?;
        self.codes.consume(&user.email, code)?;

        let account = self.directory.update_password(&user.email, password)?;
        info!(email = %user.email, "Reset password");
        Ok(account)
    }

    fn user(&self, nickname: &str) -> Result<LocalUser, AuthError> {
        self.directory
            .user(nickname)?
            .ok_or_else(|| AuthError::not_found(format!("user {}", nickname)))
    }

    fn deliver(&self, user: &LocalUser, template: Template) -> Result<(), AuthError> {
        let code = self.codes.issue(&user.email)?;
        self.sender.send(template, &user.email, &code.content)?;

        info!(email = %user.email, template = %template, "Sent code");
        Ok(())
    }
}
