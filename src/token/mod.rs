//! Token pair lifecycle.

mod manager;

pub use manager::{Identity, TokenManager, TokenPair, VerifiedToken};
