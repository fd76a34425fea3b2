use crate::error::AuthError;
use crate::random::{AlphanumericSecret, IdGenerator, SecretGenerator, UuidGenerator};
use crate::refresh::handle::{RefreshHandle, DELIMITER};
use std::sync::Arc;

/// Default refresh secret length.
pub const DEFAULT_SECRET_LENGTH: usize = 450;

/// Issues fresh refresh handles.
pub struct RefreshTokenGenerator {
    ids: Arc<dyn IdGenerator>,
    secrets: Arc<dyn SecretGenerator>,
    secret_length: usize,
}

impl Default for RefreshTokenGenerator {
    fn default() -> Self {
        Self::new(Arc::new(UuidGenerator), Arc::new(AlphanumericSecret))
    }
}

impl RefreshTokenGenerator {
    pub fn new(ids: Arc<dyn IdGenerator>, secrets: Arc<dyn SecretGenerator>) -> Self {
        RefreshTokenGenerator {
            ids,
            secrets,
            secret_length: DEFAULT_SECRET_LENGTH,
        }
    }

    pub fn with_secret_length(mut self, length: usize) -> Self {
        self.secret_length = length;
        self
    }

    /// Issue a handle owned by `owner`, with id `owner=generated-id`.
    pub fn issue(&self, owner: &str) -> Result<RefreshHandle, AuthError> {
        if owner.is_empty() || owner.contains(DELIMITER) {
            return Err(AuthError::validation(format!(
                "refresh token owner must be non-empty and free of '{}'",
                DELIMITER
            )));
        }

        let id = format!("{}={}", owner, self.ids.next_id());
        let secret = self.secrets.generate(self.secret_length);

        if id.contains(DELIMITER) || secret.contains(DELIMITER) {
            return Err(AuthError::internal("generated refresh token field contains the delimiter"));
        }

        Ok(RefreshHandle::new(id, secret, owner.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::SequenceGenerator;

    #[test]
    fn test_issue_composes_id() {
        let generator = RefreshTokenGenerator::new(
            Arc::new(SequenceGenerator::new("rt")),
            Arc::new(AlphanumericSecret),
        );

        let handle = generator.issue("user-1").unwrap();

        assert_eq!(handle.id(), "user-1=rt-0");
        assert_eq!(handle.subject(), "user-1");
        assert_eq!(handle.secret().len(), DEFAULT_SECRET_LENGTH);
    }

    #[test]
    fn test_generate_unique_secrets() {
        let generator = RefreshTokenGenerator::default().with_secret_length(64);
        let first = generator.issue("user-1").unwrap();
        let second = generator.issue("user-1").unwrap();

        assert_ne!(first.id(), second.id());
        assert_ne!(first.secret(), second.secret());
        assert_eq!(first.secret().len(), 64);
    }

    #[test]
    fn test_owner_with_delimiter_rejected() {
        let generator = RefreshTokenGenerator::default();
        assert!(generator.issue("bad:owner").is_err());
        assert!(generator.issue("").is_err());
    }

    #[test]
    fn test_issued_handle_round_trips() {
        let handle = RefreshTokenGenerator::default().issue("user-1").unwrap();
        assert_eq!(RefreshHandle::parse(&handle.serialize()).unwrap(), handle);
    }
}
