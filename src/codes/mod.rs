//! One-time verification codes: issuance under a policy, single redemption.

mod manager;
mod policy;

pub use manager::CodeManager;
pub use policy::{IssuancePolicy, LimitIssuerPolicy, LimitPolicy, NoopPolicy, PolicyCheck};
