//! Issuance attempt bookkeeping for rate limiting.

use crate::error::AuthError;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::Mutex;

/// Per-issuer attempt history.
pub trait TryStore: Send + Sync {
    fn add(&self, issuer: &str, at: DateTime<Utc>) -> Result<(), AuthError>;

    /// Attempts by `issuer` strictly after `after`, oldest first.
    fn tries_after(
        &self,
        issuer: &str,
        after: DateTime<Utc>,
    ) -> Result<Vec<DateTime<Utc>>, AuthError>;
}

#[derive(Debug, Default)]
struct TryRecord {
    total: usize,
    attempts: Vec<DateTime<Utc>>,
}

/// Reference [`TryStore`]: one record per issuer.
///
/// Attempts older than the retention period are dropped as new ones arrive,
/// so windows queried against it must not be longer than that period.
#[derive(Debug)]
pub struct InMemoryTryStore {
    records: Mutex<HashMap<String, TryRecord>>,
    retention: Duration,
}

impl Default for InMemoryTryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryTryStore {
    /// Store keeping one day of attempts.
    pub fn new() -> Self {
        Self {
            records: Mutex::new(HashMap::new()),
            retention: Duration::days(1),
        }
    }

    #[must_use]
    pub fn with_retention(mut self, retention: Duration) -> Self {
        self.retention = retention;
        self
    }

    /// Attempts ever recorded for `issuer`, pruned ones included.
    pub fn total(&self, issuer: &str) -> Result<usize, AuthError> {
        let records = self.lock()?;
        Ok(records.get(issuer).map_or(0, |r| r.total))
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, TryRecord>>, AuthError> {
        self.records
            .lock()
            .map_err(|_| AuthError::internal("try store lock poisoned"))
    }
}

impl TryStore for InMemoryTryStore {
    fn add(&self, issuer: &str, at: DateTime<Utc>) -> Result<(), AuthError> {
        let mut records = self.lock()?;
        let record = records.entry(issuer.to_string()).or_default();

        if let Some(cutoff) = at.checked_sub_signed(self.retention) {
            record.attempts.retain(|attempt| *attempt > cutoff);
        }
        record.attempts.push(at);
        record.total += 1;

        Ok(())
    }

    fn tries_after(
        &self,
        issuer: &str,
        after: DateTime<Utc>,
    ) -> Result<Vec<DateTime<Utc>>, AuthError> {
        let records = self.lock()?;

        let mut attempts: Vec<DateTime<Utc>> = records
            .get(issuer)
            .map(|record| {
                record
                    .attempts
                    .iter()
                    .copied()
                    .filter(|at| *at > after)
                    .collect()
            })
            .unwrap_or_default();
        attempts.sort();

        Ok(attempts)
    }
}
