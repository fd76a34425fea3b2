//! Persisted access and refresh token entities.

use crate::error::AuthError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::RwLock;

/// Which half of a token pair an entity stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

impl TokenKind {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Access => "access",
            Self::Refresh => "refresh",
        }
    }
}

/// Lifecycle state of a stored token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenStatus {
    Enabled,
    Disabled,
    Used,
}

/// Durable record of an issued token, independent of its wire form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenEntity {
    pub id: String,
    pub kind: TokenKind,
    pub status: TokenStatus,
    pub user_id: String,
    /// Signed JWT for access entities, raw secret for refresh entities.
    pub content: String,
    /// Refresh entities point at the access entity issued with them.
    pub related_token_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl TokenEntity {
    /// New enabled access entity.
    pub fn access(
        id: String,
        user_id: String,
        content: String,
        expires_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Self {
        TokenEntity {
            id,
            kind: TokenKind::Access,
            status: TokenStatus::Enabled,
            user_id,
            content,
            related_token_id: None,
            created_at: now,
            updated_at: now,
            expires_at: Some(expires_at),
        }
    }

    /// New enabled refresh entity paired with `access_id`.
    pub fn refresh(
        id: String,
        user_id: String,
        secret: String,
        access_id: String,
        now: DateTime<Utc>,
    ) -> Self {
        TokenEntity {
            id,
            kind: TokenKind::Refresh,
            status: TokenStatus::Enabled,
            user_id,
            content: secret,
            related_token_id: Some(access_id),
            created_at: now,
            updated_at: now,
            expires_at: None,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.status == TokenStatus::Enabled
    }
}

/// Keyed persistence of token entities.
pub trait TokenStore: Send + Sync {
    /// Insert a new entity.
    ///
    /// Fails with [`AuthError::DuplicateEntity`] when the id is taken.
    fn save(&self, entity: TokenEntity) -> Result<(), AuthError>;

    /// Entity by id, or [`AuthError::NotFound`].
    fn find(&self, id: &str) -> Result<TokenEntity, AuthError>;
}

/// Reference [`TokenStore`] over a lock-guarded map.
#[derive(Debug, Default)]
pub struct InMemoryTokenStore {
    entities: RwLock<HashMap<String, TokenEntity>>,
}

impl InMemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entities.
    pub fn len(&self) -> Result<usize, AuthError> {
        let entities = self
            .entities
            .read()
            .map_err(|_| AuthError::internal("token store lock poisoned"))?;
        Ok(entities.len())
    }

    pub fn is_empty(&self) -> Result<bool, AuthError> {
        Ok(self.len()? == 0)
    }
}

impl TokenStore for InMemoryTokenStore {
    fn save(&self, entity: TokenEntity) -> Result<(), AuthError> {
        let mut entities = self
            .entities
            .write()
            .map_err(|_| AuthError::internal("token store lock poisoned"))?;

        if entities.contains_key(&entity.id) {
            return Err(AuthError::DuplicateEntity(entity.id));
        }

        entities.insert(entity.id.clone(), entity);
        Ok(())
    }

    fn find(&self, id: &str) -> Result<TokenEntity, AuthError> {
        let entities = self
            .entities
            .read()
            .map_err(|_| AuthError::internal("token store lock poisoned"))?;

        entities
            .get(id)
            .cloned()
            .ok_or_else(|| AuthError::not_found(format!("token {}", id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entity(id: &str) -> TokenEntity {
        let now = Utc::now();
        TokenEntity::access(
            id.to_string(),
            "user-1".to_string(),
            "jwt".to_string(),
            now,
            now,
        )
    }

    #[test]
    fn test_save_and_find() {
        let store = InMemoryTokenStore::new();
        store.save(entity("token-1")).unwrap();

        let found = store.find("token-1").unwrap();
        assert_eq!(found.kind, TokenKind::Access);
        assert!(found.is_enabled());
        assert_eq!(store.len().unwrap(), 1);
    }

    #[test]
    fn test_duplicate_rejected() {
        let store = InMemoryTokenStore::new();
        store.save(entity("token-1")).unwrap();

        let result = store.save(entity("token-1"));
        assert!(matches!(result, Err(AuthError::DuplicateEntity(id)) if id == "token-1"));
    }

    #[test]
    fn test_find_missing() {
        let store = InMemoryTokenStore::new();
        assert!(matches!(store.find("nope"), Err(AuthError::NotFound(_))));
    }

    #[test]
    fn test_refresh_entity_links_access() {
        let refresh = TokenEntity::refresh(
            "user-1=abc".to_string(),
            "user-1".to_string(),
            "secret".to_string(),
            "user-1:xyz".to_string(),
            Utc::now(),
        );

        assert_eq!(refresh.kind, TokenKind::Refresh);
        assert_eq!(refresh.related_token_id.as_deref(), Some("user-1:xyz"));
        assert!(refresh.expires_at.is_none());
    }

    #[test]
    fn test_entity_serializes_lowercase_tags() {
        let value = serde_json::to_value(entity("token-1")).unwrap();
        assert_eq!(value["kind"], "access");
        assert_eq!(value["status"], "enabled");
    }
}
