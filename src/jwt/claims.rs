use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Registered claims (RFC 7519 §4.1).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RegisteredClaims {
    pub iss: String,
    pub sub: String,
    pub aud: Vec<String>,
    pub exp: i64,
    pub iat: i64,
    pub nbf: i64,
    pub jti: String,
}

/// Profile claims (OpenID Connect standard claims).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PublicClaims {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub given_name: String,
    #[serde(default)]
    pub family_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub email_verified: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub picture: Option<String>,
    #[serde(default)]
    pub phone_number: String,
    #[serde(default)]
    pub phone_number_verified: bool,
}

/// Application claims. Nothing is defined yet; unknown claims land here.
pub type PrivateClaims = HashMap<String, serde_json::Value>;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Claims {
    #[serde(flatten)]
    pub registered: RegisteredClaims,
    #[serde(flatten)]
    pub public: PublicClaims,
    #[serde(flatten)]
    pub private: PrivateClaims,
}

impl Claims {
    pub fn subject(&self) -> &str {
        &self.registered.sub
    }

    pub fn expires_at(&self) -> i64 {
        self.registered.exp
    }

    /// True while `timestamp` is inside `[nbf, exp)`.
    pub fn is_valid_at(&self, timestamp: i64) -> bool {
        timestamp >= self.registered.nbf && timestamp < self.registered.exp
    }
}
