//! Identifier, secret and code generation.

use rand::distributions::Alphanumeric;
use rand::Rng;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Produces unique identifiers.
pub trait IdGenerator: Send + Sync {
    /// Next identifier.
    fn next_id(&self) -> String;
}

/// Random v4 UUIDs.
#[derive(Debug, Default, Clone, Copy)]
pub struct UuidGenerator;

impl IdGenerator for UuidGenerator {
    fn next_id(&self) -> String {
        uuid::Uuid::new_v4().to_string()
    }
}

/// Deterministic `prefix-N` identifiers, for tests and fixtures.
#[derive(Debug)]
pub struct SequenceGenerator {
    prefix: String,
    next: AtomicU64,
}

impl SequenceGenerator {
    /// Start a sequence at zero.
    #[must_use]
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            next: AtomicU64::new(0),
        }
    }
}

impl IdGenerator for SequenceGenerator {
    fn next_id(&self) -> String {
        let n = self.next.fetch_add(1, Ordering::Relaxed);
        format!("{}-{}", self.prefix, n)
    }
}

/// Produces high-entropy secrets.
///
/// Output must never contain `:`, the opaque token delimiter.
pub trait SecretGenerator: Send + Sync {
    /// Secret of exactly `length` characters.
    fn generate(&self, length: usize) -> String;
}

/// Secrets drawn from `[A-Za-z0-9]`.
#[derive(Debug, Default, Clone, Copy)]
pub struct AlphanumericSecret;

impl SecretGenerator for AlphanumericSecret {
    fn generate(&self, length: usize) -> String {
        rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(length)
            .map(char::from)
            .collect()
    }
}

/// Produces one-time code contents.
pub type CodeGenerator = Arc<dyn Fn() -> String + Send + Sync>;

/// Code generator yielding `length` random decimal digits.
#[must_use]
pub fn numeric_code(length: usize) -> CodeGenerator {
    Arc::new(move || {
        let mut rng = rand::thread_rng();
        (0..length)
            .map(|_| char::from(b'0' + rng.gen_range(0..10u8)))
            .collect()
    })
}

/// Code generator that always yields `code`.
#[must_use]
pub fn fixed_code(code: impl Into<String>) -> CodeGenerator {
    let code = code.into();
    Arc::new(move || code.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uuid_ids_are_unique() {
        let generator = UuidGenerator;
        assert_ne!(generator.next_id(), generator.next_id());
    }

    #[test]
    fn test_sequence_is_deterministic() {
        let generator = SequenceGenerator::new("id");
        assert_eq!(generator.next_id(), "id-0");
        assert_eq!(generator.next_id(), "id-1");
    }

    #[test]
    fn test_secret_length_and_alphabet() {
        let secret = AlphanumericSecret.generate(450);
        assert_eq!(secret.len(), 450);
        assert!(secret.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn test_numeric_code() {
        let code = numeric_code(6)();
        assert_eq!(code.len(), 6);
        assert!(code.chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn test_fixed_code() {
        let generator = fixed_code("123456");
        assert_eq!(generator(), "123456");
        assert_eq!(generator(), "123456");
    }
}
