//! JWT signing contract and its `jsonwebtoken` implementation.
//!
//! The signer only proves integrity. Expiry, not-before and audience are left
//! unchecked here because refresh needs the claims of expired tokens; the
//! token manager owns every time-based decision.

use crate::error::AuthError;
use crate::jwt::claims::Claims;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use std::collections::HashSet;

/// Signs claims into a compact token and recovers them again.
pub trait TokenSigner: Send + Sync {
    /// Produce a compact signed token.
    fn sign(&self, claims: &Claims) -> Result<String, AuthError>;

    /// Check the signature and return the embedded claims.
    ///
    /// Fails with [`AuthError::InvalidToken`] when the token is malformed or
    /// the signature does not verify. Never fails because of expiry.
    fn verify_signature(&self, token: &str) -> Result<Claims, AuthError>;

    /// Algorithm name for the JWT header.
    fn algorithm(&self) -> &str;
}

/// [`TokenSigner`] backed by `jsonwebtoken` keys.
pub struct JwtSigner {
    algorithm: Algorithm,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    key_id: Option<String>,
}

impl JwtSigner {
    /// HMAC signer from a shared secret.
    ///
    /// # Errors
    ///
    /// Returns a config error when `algorithm` is not an HMAC algorithm.
    pub fn hmac(algorithm: Algorithm, secret: &[u8]) -> Result<Self, AuthError> {
        if !matches!(algorithm, Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512) {
            return Err(AuthError::config(format!(
                "{:?} is not an HMAC algorithm",
                algorithm
            )));
        }

        Ok(Self {
            algorithm,
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            key_id: None,
        })
    }

    /// Asymmetric signer from a PEM private key and PEM public key.
    ///
    /// # Errors
    ///
    /// Returns a config error when the keys cannot be parsed for `algorithm`.
    pub fn from_pem(
        algorithm: Algorithm,
        private_pem: &[u8],
        public_pem: &[u8],
    ) -> Result<Self, AuthError> {
        let invalid = |e: jsonwebtoken::errors::Error| {
            AuthError::config(format!("Invalid {:?} key: {}", algorithm, e))
        };

        let (encoding_key, decoding_key) = match algorithm {
            Algorithm::EdDSA => (
                EncodingKey::from_ed_pem(private_pem).map_err(invalid)?,
                DecodingKey::from_ed_pem(public_pem).map_err(invalid)?,
            ),
            Algorithm::RS256
            | Algorithm::RS384
            | Algorithm::RS512
            | Algorithm::PS256
            | Algorithm::PS384
            | Algorithm::PS512 => (
                EncodingKey::from_rsa_pem(private_pem).map_err(invalid)?,
                DecodingKey::from_rsa_pem(public_pem).map_err(invalid)?,
            ),
            Algorithm::ES256 | Algorithm::ES384 => (
                EncodingKey::from_ec_pem(private_pem).map_err(invalid)?,
                DecodingKey::from_ec_pem(public_pem).map_err(invalid)?,
            ),
            Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512 => {
                return Err(AuthError::config(format!(
                    "{:?} takes a shared secret, not a key pair",
                    algorithm
                )))
            }
        };

        Ok(Self {
            algorithm,
            encoding_key,
            decoding_key,
            key_id: None,
        })
    }

    /// Set the `kid` header value.
    #[must_use]
    pub fn with_key_id(mut self, key_id: impl Into<String>) -> Self {
        self.key_id = Some(key_id.into());
        self
    }

    fn validation(&self) -> Validation {
        let mut validation = Validation::new(self.algorithm);
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.validate_aud = false;
        validation.required_spec_claims = HashSet::new();
        validation
    }
}

impl TokenSigner for JwtSigner {
    fn sign(&self, claims: &Claims) -> Result<String, AuthError> {
        let mut header = Header::new(self.algorithm);
        header.kid = self.key_id.clone();

        encode(&header, claims, &self.encoding_key).map_err(AuthError::from)
    }

    fn verify_signature(&self, token: &str) -> Result<Claims, AuthError> {
        decode::<Claims>(token, &self.decoding_key, &self.validation())
            .map(|data| data.claims)
            .map_err(|_| AuthError::InvalidToken)
    }

    fn algorithm(&self) -> &str {
        match self.algorithm {
            Algorithm::HS256 => "HS256",
            Algorithm::HS384 => "HS384",
            Algorithm::HS512 => "HS512",
            Algorithm::ES256 => "ES256",
            Algorithm::ES384 => "ES384",
            Algorithm::RS256 => "RS256",
            Algorithm::RS384 => "RS384",
            Algorithm::RS512 => "RS512",
            Algorithm::PS256 => "PS256",
            Algorithm::PS384 => "PS384",
            Algorithm::PS512 => "PS512",
            Algorithm::EdDSA => "EdDSA",
        }
    }
}
