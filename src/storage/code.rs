//! One-time code records and their store.

use crate::clock::{Clock, SystemClock};
use crate::error::AuthError;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Code lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CodeStatus {
    Enabled,
    /// Reserved; nothing issues disabled codes yet.
    Disabled,
    Used,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Code {
    pub id: String,
    pub status: CodeStatus,
    pub content: String,
    pub issuer: String,
    pub expires_at: DateTime<Utc>,
}

impl Code {
    pub fn is_valid(&self) -> bool {
        self.status == CodeStatus::Enabled
    }

    /// Flip an enabled code to used.
    ///
    /// Fails with [`AuthError::CodeUnavailable`] for any other status.
    pub fn mark_as_used(&mut self) -> Result<(), AuthError> {
        if !self.is_valid() {
            return Err(AuthError::CodeUnavailable);
        }

        self.status = CodeStatus::Used;
        Ok(())
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }
}

/// Input of [`CodeStore::create`].
#[derive(Debug, Clone)]
pub struct NewCode {
    pub issuer: String,
    pub status: CodeStatus,
    pub content: String,
    pub expires_at: DateTime<Utc>,
}

/// Keyed persistence of codes, indexed by (issuer, content) and by id.
pub trait CodeStore: Send + Sync {
    fn create(&self, input: NewCode) -> Result<Code, AuthError>;

    /// Latest code with this content for the issuer. Absence is not an error.
    fn find(&self, issuer: &str, content: &str) -> Result<Option<Code>, AuthError>;

    /// Move code `id` from `expected` to `status` in one step.
    ///
    /// `None` when no such code exists; [`AuthError::CodeUnavailable`] when
    /// its current status is not `expected`.
    fn update(
        &self,
        id: &str,
        expected: CodeStatus,
        status: CodeStatus,
    ) -> Result<Option<Code>, AuthError>;

    /// Codes whose expiry, extended by `within`, is still in the future.
    fn last(&self, issuer: &str, within: Duration) -> Result<Vec<Code>, AuthError>;
}

#[derive(Debug, Default)]
struct CodeIndex {
    /// issuer -> content -> id
    by_issuer: HashMap<String, HashMap<String, String>>,
    by_id: HashMap<String, Code>,
    /// Codes ever created per issuer; source of monotonic ids.
    created: HashMap<String, u64>,
}

/// Reference [`CodeStore`]. Ids are `issuer-N` with N counting per issuer.
pub struct InMemoryCodeStore {
    index: Mutex<CodeIndex>,
    clock: Arc<dyn Clock>,
}

impl Default for InMemoryCodeStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryCodeStore {
    pub fn new() -> Self {
        Self {
            index: Mutex::new(CodeIndex::default()),
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, CodeIndex>, AuthError> {
        self.index
            .lock()
            .map_err(|_| AuthError::internal("code store lock poisoned"))
    }
}

impl CodeStore for InMemoryCodeStore {
    fn create(&self, input: NewCode) -> Result<Code, AuthError> {
        let mut index = self.lock()?;

        let counter = index.created.entry(input.issuer.clone()).or_insert(0);
        let id = format!("{}-{}", input.issuer, counter);
        *counter += 1;

        let code = Code {
            id: id.clone(),
            status: input.status,
            content: input.content,
            issuer: input.issuer,
            expires_at: input.expires_at,
        };

        index
            .by_issuer
            .entry(code.issuer.clone())
            .or_default()
            .insert(code.content.clone(), id.clone());
        index.by_id.insert(id, code.clone());

        Ok(code)
    }

    fn find(&self, issuer: &str, content: &str) -> Result<Option<Code>, AuthError> {
        let index = self.lock()?;

        let code = index
            .by_issuer
            .get(issuer)
            .and_then(|codes| codes.get(content))
            .and_then(|id| index.by_id.get(id))
            .cloned();

        Ok(code)
    }

    fn update(
        &self,
        id: &str,
        expected: CodeStatus,
        status: CodeStatus,
    ) -> Result<Option<Code>, AuthError> {
        let mut index = self.lock()?;

        let Some(code) = index.by_id.get_mut(id) else {
            return Ok(None);
        };
        if code.status != expected {
            return Err(AuthError::CodeUnavailable);
        }

        code.status = status;
        Ok(Some(code.clone()))
    }

    fn last(&self, issuer: &str, within: Duration) -> Result<Vec<Code>, AuthError> {
        let now = self.clock.now();
        let index = self.lock()?;

        let mut codes: Vec<Code> = index
            .by_id
            .values()
            .filter(|code| {
                code.issuer == issuer
                    && code
                        .expires_at
                        .checked_add_signed(within)
                        .map_or(true, |until| until > now)
            })
            .cloned()
            .collect();
        codes.sort_by(|a, b| a.expires_at.cmp(&b.expires_at));

        Ok(codes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap()
    }

    fn new_code(issuer: &str, content: &str, expires_at: DateTime<Utc>) -> NewCode {
        NewCode {
            issuer: issuer.to_string(),
            status: CodeStatus::Enabled,
            content: content.to_string(),
            expires_at,
        }
    }

    #[test]
    fn test_mark_as_used() {
        let mut code = Code {
            id: "a-0".to_string(),
            status: CodeStatus::Enabled,
            content: "123".to_string(),
            issuer: "a".to_string(),
            expires_at: t0(),
        };

        assert!(code.mark_as_used().is_ok());
        assert_eq!(code.status, CodeStatus::Used);
        assert!(matches!(code.mark_as_used(), Err(AuthError::CodeUnavailable)));
    }

    #[test]
    fn test_disabled_code_cannot_be_used() {
        let mut code = Code {
            id: "a-0".to_string(),
            status: CodeStatus::Disabled,
            content: "123".to_string(),
            issuer: "a".to_string(),
            expires_at: t0(),
        };

        assert!(code.mark_as_used().is_err());
    }

    #[test]
    fn test_create_assigns_monotonic_ids() {
        let store = InMemoryCodeStore::new();

        let first = store.create(new_code("a@example.com", "111", t0())).unwrap();
        let second = store.create(new_code("a@example.com", "111", t0())).unwrap();
        let other = store.create(new_code("b@example.com", "111", t0())).unwrap();

        assert_eq!(first.id, "a@example.com-0");
        assert_eq!(second.id, "a@example.com-1");
        assert_eq!(other.id, "b@example.com-0");
    }

    #[test]
    fn test_find_by_issuer_and_content() {
        let store = InMemoryCodeStore::new();
        store.create(new_code("a@example.com", "111", t0())).unwrap();

        assert!(store.find("a@example.com", "111").unwrap().is_some());
        assert!(store.find("a@example.com", "222").unwrap().is_none());
        assert!(store.find("b@example.com", "111").unwrap().is_none());
    }

    #[test]
    fn test_find_returns_latest_for_reused_content() {
        let store = InMemoryCodeStore::new();
        store.create(new_code("a@example.com", "111", t0())).unwrap();
        let latest = store.create(new_code("a@example.com", "111", t0())).unwrap();

        let found = store.find("a@example.com", "111").unwrap().unwrap();
        assert_eq!(found.id, latest.id);
    }

    #[test]
    fn test_update_status() {
        let store = InMemoryCodeStore::new();
        let code = store.create(new_code("a@example.com", "111", t0())).unwrap();

        let updated = store
            .update(&code.id, CodeStatus::Enabled, CodeStatus::Used)
            .unwrap()
            .unwrap();
        assert_eq!(updated.status, CodeStatus::Used);

        let found = store.find("a@example.com", "111").unwrap().unwrap();
        assert_eq!(found.status, CodeStatus::Used);

        assert!(store
            .update("missing", CodeStatus::Enabled, CodeStatus::Used)
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_update_requires_expected_status() {
        let store = InMemoryCodeStore::new();
        let code = store.create(new_code("a@example.com", "111", t0())).unwrap();
        store
            .update(&code.id, CodeStatus::Enabled, CodeStatus::Used)
            .unwrap();

        assert!(matches!(
            store.update(&code.id, CodeStatus::Enabled, CodeStatus::Used),
            Err(AuthError::CodeUnavailable)
        ));
        assert_eq!(
            store.find("a@example.com", "111").unwrap().unwrap().status,
            CodeStatus::Used
        );
    }

    #[test]
    fn test_update_flips_once_across_threads() {
        let store = InMemoryCodeStore::new();
        let code = store.create(new_code("a@example.com", "111", t0())).unwrap();

        let flipped = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|_| {
                    scope.spawn(|| store.update(&code.id, CodeStatus::Enabled, CodeStatus::Used))
                })
                .collect();
            handles
                .into_iter()
                .map(|handle| handle.join())
                .filter(|result| matches!(result, Ok(Ok(Some(_)))))
                .count()
        });

        assert_eq!(flipped, 1);
    }

    #[test]
    fn test_last_keeps_fresh_codes() {
        let clock = Arc::new(FixedClock::new(t0()));
        let store = InMemoryCodeStore::new().with_clock(clock);

        store
            .create(new_code("a@example.com", "old", t0() - Duration::hours(2)))
            .unwrap();
        store
            .create(new_code("a@example.com", "recent", t0() - Duration::minutes(10)))
            .unwrap();
        store
            .create(new_code("a@example.com", "live", t0() + Duration::minutes(10)))
            .unwrap();

        let fresh = store.last("a@example.com", Duration::minutes(30)).unwrap();
        let contents: Vec<&str> = fresh.iter().map(|c| c.content.as_str()).collect();
        assert_eq!(contents, vec!["recent", "live"]);

        assert!(store.last("b@example.com", Duration::hours(5)).unwrap().is_empty());
    }

    #[test]
    fn test_last_with_unbounded_window() {
        let clock = Arc::new(FixedClock::new(t0()));
        let store = InMemoryCodeStore::new().with_clock(clock);
        store
            .create(new_code("a@example.com", "old", t0() - Duration::days(365)))
            .unwrap();

        let codes = store.last("a@example.com", Duration::days(100_000_000)).unwrap();
        assert_eq!(codes.len(), 1);
    }
}
