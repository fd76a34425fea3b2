//! Opaque refresh tokens.

pub mod generator;
pub mod handle;

pub use generator::{RefreshTokenGenerator, DEFAULT_SECRET_LENGTH};
pub use handle::{RefreshHandle, RefreshToken, DELIMITER};
