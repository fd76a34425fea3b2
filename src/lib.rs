//! Auth pool library.
//!
//! Issues, verifies and refreshes access/refresh token pairs, and issues and
//! redeems one-time verification codes under a pluggable issuance policy.
//! Identity providers, account synchronization and code delivery are
//! consumed through traits in [`account`].

#![forbid(unsafe_code)]

pub mod account;
pub mod clock;
pub mod codes;
pub mod config;
pub mod error;
pub mod jwt;
pub mod metrics;
pub mod pool;
pub mod random;
pub mod refresh;
pub mod storage;
pub mod telemetry;
pub mod token;

// Re-exports for convenience
pub use config::Config;
pub use error::{AuthError, ErrorKind};
pub use pool::AuthPool;
