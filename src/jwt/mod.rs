//! Access token claims, signing and assembly.

pub mod assembler;
pub mod builder;
pub mod claims;
pub mod signer;

pub use assembler::{AccessToken, ClaimAssembler, RecoveredClaims, BEARER};
pub use builder::{ClaimSet, ClaimsBuilder};
pub use claims::{Claims, PrivateClaims, PublicClaims, RegisteredClaims};
pub use signer::{JwtSigner, TokenSigner};
