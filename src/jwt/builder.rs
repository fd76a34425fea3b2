use crate::error::AuthError;
use crate::jwt::claims::{Claims, PrivateClaims, PublicClaims};

/// Identity claims of a token before the assembler stamps id and timing.
#[derive(Debug, Clone, PartialEq)]
pub struct ClaimSet {
    pub issuer: String,
    pub subject: String,
    pub audience: Vec<String>,
    pub public: PublicClaims,
    pub private: PrivateClaims,
}

impl From<Claims> for ClaimSet {
    /// Keeps identity claims, drops `jti`, `iat`, `nbf` and `exp`.
    fn from(claims: Claims) -> Self {
        ClaimSet {
            issuer: claims.registered.iss,
            subject: claims.registered.sub,
            audience: claims.registered.aud,
            public: claims.public,
            private: claims.private,
        }
    }
}

pub struct ClaimsBuilder {
    issuer: String,
    subject: Option<String>,
    audience: Vec<String>,
    public: PublicClaims,
    private: PrivateClaims,
}

impl ClaimsBuilder {
    pub fn new(issuer: String) -> Self {
        ClaimsBuilder {
            issuer,
            subject: None,
            audience: Vec::new(),
            public: PublicClaims::default(),
            private: PrivateClaims::new(),
        }
    }

    pub fn subject(mut self, subject: String) -> Self {
        self.subject = Some(subject);
        self
    }

    pub fn audience(mut self, audience: Vec<String>) -> Self {
        self.audience = audience;
        self
    }

    pub fn profile(mut self, public: PublicClaims) -> Self {
        self.public = public;
        self
    }

    pub fn private_claim(mut self, key: String, value: serde_json::Value) -> Self {
        self.private.insert(key, value);
        self
    }

    pub fn build(self) -> Result<ClaimSet, AuthError> {
        let subject = self
            .subject
            .filter(|s| !s.is_empty())
            .ok_or_else(|| AuthError::validation("Subject is required"))?;

        Ok(ClaimSet {
            issuer: self.issuer,
            subject,
            audience: self.audience,
            public: self.public,
            private: self.private,
        })
    }
}
