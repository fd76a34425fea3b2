//! Opaque refresh token wire form.
//!
//! A handle travels as URL-safe padded base64 of `id:secret:subject`.

use crate::error::AuthError;
use base64::{engine::general_purpose::URL_SAFE, Engine as _};
use std::fmt;

/// Field delimiter inside the decoded wire form.
pub const DELIMITER: char = ':';

/// Identifier, secret and owner of a refresh token.
#[derive(Clone, PartialEq, Eq)]
pub struct RefreshHandle {
    id: String,
    secret: String,
    subject: String,
}

impl RefreshHandle {
    /// Assemble a handle from already-composed parts.
    #[must_use]
    pub fn new(id: String, secret: String, subject: String) -> Self {
        Self {
            id,
            secret,
            subject,
        }
    }

    /// Externally visible id, `subject=generated-id` for issued handles.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Secret content. Compared against the stored entity on refresh.
    #[must_use]
    pub fn secret(&self) -> &str {
        &self.secret
    }

    /// Owning subject.
    #[must_use]
    pub fn subject(&self) -> &str {
        &self.subject
    }

    /// Encode into the transportable string.
    #[must_use]
    pub fn serialize(&self) -> String {
        let raw = format!(
            "{}{d}{}{d}{}",
            self.id,
            self.secret,
            self.subject,
            d = DELIMITER
        );
        URL_SAFE.encode(raw.as_bytes())
    }

    /// Decode a transportable string.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidToken`] unless the input decodes to exactly
    /// three delimited fields.
    pub fn parse(token: &str) -> Result<Self, AuthError> {
        let bytes = URL_SAFE
            .decode(token.as_bytes())
            .map_err(|_| AuthError::InvalidToken)?;
        let raw = String::from_utf8(bytes).map_err(|_| AuthError::InvalidToken)?;

        let parts: Vec<&str> = raw.split(DELIMITER).collect();
        match parts.as_slice() {
            [id, secret, subject] => Ok(Self::new(
                (*id).to_string(),
                (*secret).to_string(),
                (*subject).to_string(),
            )),
            _ => Err(AuthError::InvalidToken),
        }
    }
}

impl fmt::Debug for RefreshHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RefreshHandle")
            .field("id", &self.id)
            .field("secret", &"[REDACTED]")
            .field("subject", &self.subject)
            .finish()
    }
}

/// Refresh token as handed to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshToken {
    /// Handle id, the key of the stored refresh entity
    pub id: String,
    /// Serialized handle, the value the caller presents on refresh
    pub token: String,
}

impl From<&RefreshHandle> for RefreshToken {
    fn from(handle: &RefreshHandle) -> Self {
        RefreshToken {
            id: handle.id().to_string(),
            token: handle.serialize(),
        }
    }
}
