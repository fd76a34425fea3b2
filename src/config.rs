//! Centralized configuration for the auth pool.
//!
//! Everything is read from environment variables (optionally seeded from a
//! `.env` file) and validated up front. [`Config::from_lookup`] takes any
//! variable source so tests never touch the process environment.

use crate::error::AuthError;
use crate::jwt::JwtSigner;
use crate::telemetry::TracingConfig;
use base64::Engine;
use jsonwebtoken::Algorithm;
use rand::RngCore;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// JWT signing algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JwtAlgorithm {
    /// HMAC with SHA-256
    HS256,
    /// HMAC with SHA-384
    HS384,
    /// HMAC with SHA-512
    HS512,
    /// Ed25519
    EdDSA,
    /// RSA with SHA-256
    RS256,
    /// ECDSA with P-256 and SHA-256
    ES256,
}

impl JwtAlgorithm {
    /// Get algorithm name for JWT header.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::HS256 => "HS256",
            Self::HS384 => "HS384",
            Self::HS512 => "HS512",
            Self::EdDSA => "EdDSA",
            Self::RS256 => "RS256",
            Self::ES256 => "ES256",
        }
    }

    #[must_use]
    pub const fn is_hmac(&self) -> bool {
        matches!(self, Self::HS256 | Self::HS384 | Self::HS512)
    }

    #[must_use]
    pub const fn to_jsonwebtoken(self) -> Algorithm {
        match self {
            Self::HS256 => Algorithm::HS256,
            Self::HS384 => Algorithm::HS384,
            Self::HS512 => Algorithm::HS512,
            Self::EdDSA => Algorithm::EdDSA,
            Self::RS256 => Algorithm::RS256,
            Self::ES256 => Algorithm::ES256,
        }
    }
}

impl FromStr for JwtAlgorithm {
    type Err = AuthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "HS256" => Ok(Self::HS256),
            "HS384" => Ok(Self::HS384),
            "HS512" => Ok(Self::HS512),
            "EDDSA" => Ok(Self::EdDSA),
            "RS256" => Ok(Self::RS256),
            "ES256" => Ok(Self::ES256),
            _ => Err(AuthError::config(format!("Invalid JWT algorithm: {}", s))),
        }
    }
}

/// Auth pool configuration.
#[derive(Clone)]
pub struct Config {
    // JWT settings
    /// JWT issuer claim
    pub jwt_issuer: String,
    /// JWT audience claim
    pub jwt_audience: Vec<String>,
    /// JWT signing algorithm
    pub jwt_algorithm: JwtAlgorithm,
    /// Shared secret for HMAC algorithms
    pub jwt_secret: Vec<u8>,
    /// PEM private key for asymmetric algorithms
    pub jwt_private_key_pem: Option<String>,
    /// PEM public key for asymmetric algorithms
    pub jwt_public_key_pem: Option<String>,
    /// `kid` header value
    pub jwt_key_id: Option<String>,
    /// Access token TTL
    pub access_token_ttl: Duration,
    /// Delay before an access token becomes usable
    pub access_token_not_before: Duration,
    /// Refresh token secret length
    pub refresh_secret_length: usize,

    // Code settings
    /// Code TTL
    pub code_ttl: Duration,
    /// Digits per code
    pub code_length: usize,
    /// Codes an issuer may request per window
    pub code_limit: usize,
    /// Rate limit window
    pub code_window: Duration,

    // Logging
    pub log_level: String,
    pub log_json: bool,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("jwt_issuer", &self.jwt_issuer)
            .field("jwt_audience", &self.jwt_audience)
            .field("jwt_algorithm", &self.jwt_algorithm)
            .field("jwt_secret", &"[REDACTED]")
            .field("jwt_private_key_pem", &self.jwt_private_key_pem.as_ref().map(|_| "[REDACTED]"))
            .field("jwt_public_key_pem", &self.jwt_public_key_pem.is_some())
            .field("jwt_key_id", &self.jwt_key_id)
            .field("access_token_ttl", &self.access_token_ttl)
            .field("access_token_not_before", &self.access_token_not_before)
            .field("refresh_secret_length", &self.refresh_secret_length)
            .field("code_ttl", &self.code_ttl)
            .field("code_length", &self.code_length)
            .field("code_limit", &self.code_limit)
            .field("code_window", &self.code_window)
            .field("log_level", &self.log_level)
            .field("log_json", &self.log_json)
            .finish()
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is present but invalid.
    pub fn from_env() -> Result<Self, AuthError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration from an arbitrary variable source.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is present but invalid.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AuthError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let jwt_issuer = lookup("JWT_ISSUER").unwrap_or_else(|| "auth-pool".to_string());
        let jwt_audience = lookup("JWT_AUDIENCE")
            .map(|value| {
                value
                    .split(',')
                    .map(str::trim)
                    .filter(|aud| !aud.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default();
        let jwt_algorithm: JwtAlgorithm = lookup("JWT_ALGORITHM")
            .as_deref()
            .unwrap_or("HS256")
            .parse()?;
        let jwt_secret = parse_secret(lookup("JWT_SECRET"))?;
        let jwt_private_key_pem = lookup("JWT_PRIVATE_KEY_PEM").map(unescape_pem);
        let jwt_public_key_pem = lookup("JWT_PUBLIC_KEY_PEM").map(unescape_pem);
        let jwt_key_id = lookup("JWT_KEY_ID").filter(|kid| !kid.is_empty());

        let access_token_ttl = Duration::from_secs(parse_var(&lookup, "ACCESS_TOKEN_TTL", 900)?);
        let access_token_not_before =
            Duration::from_secs(parse_var(&lookup, "ACCESS_TOKEN_NOT_BEFORE", 0)?);
        let refresh_secret_length = parse_var(&lookup, "REFRESH_SECRET_LENGTH", 450)?;

        let code_ttl = Duration::from_secs(parse_var(&lookup, "CODE_TTL", 1800)?);
        let code_length = parse_var(&lookup, "CODE_LENGTH", 6)?;
        let code_limit = parse_var(&lookup, "CODE_LIMIT", 5)?;
        let code_window = Duration::from_secs(parse_var(&lookup, "CODE_WINDOW", 3600)?);

        let log_level = lookup("LOG_LEVEL").unwrap_or_else(|| "info".to_string());
        let log_json = parse_var(&lookup, "LOG_JSON", false)?;

        if access_token_ttl.is_zero() {
            return Err(AuthError::config("ACCESS_TOKEN_TTL must be positive"));
        }
        if refresh_secret_length == 0 {
            return Err(AuthError::config("REFRESH_SECRET_LENGTH must be positive"));
        }
        if code_length == 0 {
            return Err(AuthError::config("CODE_LENGTH must be positive"));
        }

        Ok(Self {
            jwt_issuer,
            jwt_audience,
            jwt_algorithm,
            jwt_secret,
            jwt_private_key_pem,
            jwt_public_key_pem,
            jwt_key_id,
            access_token_ttl,
            access_token_not_before,
            refresh_secret_length,
            code_ttl,
            code_length,
            code_limit,
            code_window,
            log_level,
            log_json,
        })
    }

    /// Signer for the configured algorithm and key material.
    ///
    /// # Errors
    ///
    /// Returns a config error when the key material is missing or unusable.
    pub fn build_signer(&self) -> Result<JwtSigner, AuthError> {
        let algorithm = self.jwt_algorithm.to_jsonwebtoken();

        let signer = if self.jwt_algorithm.is_hmac() {
            JwtSigner::hmac(algorithm, &self.jwt_secret)?
        } else {
            let private_pem = self.jwt_private_key_pem.as_deref().ok_or_else(|| {
                AuthError::config(format!(
                    "JWT_PRIVATE_KEY_PEM is required for {}",
                    self.jwt_algorithm.as_str()
                ))
            })?;
            let public_pem = self.jwt_public_key_pem.as_deref().ok_or_else(|| {
                AuthError::config(format!(
                    "JWT_PUBLIC_KEY_PEM is required for {}",
                    self.jwt_algorithm.as_str()
                ))
            })?;
            JwtSigner::from_pem(algorithm, private_pem.as_bytes(), public_pem.as_bytes())?
        };

        Ok(match &self.jwt_key_id {
            Some(kid) => signer.with_key_id(kid.clone()),
            None => signer,
        })
    }

    /// Tracing settings derived from the logging variables.
    #[must_use]
    pub fn tracing(&self) -> TracingConfig {
        let config = TracingConfig::default()
            .with_service_name("auth-pool")
            .with_log_level(self.log_level.clone());

        if self.log_json {
            config.with_json_output()
        } else {
            config
        }
    }
}

/// Parse variable with default value.
fn parse_var<T, F>(lookup: &F, name: &str, default: T) -> Result<T, AuthError>
where
    T: FromStr,
    T::Err: fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        Some(val) => val
            .trim()
            .parse()
            .map_err(|e| AuthError::config(format!("Invalid {}: {}", name, e))),
        None => Ok(default),
    }
}

/// Decode the base64 HMAC secret, or generate one for development.
fn parse_secret(value: Option<String>) -> Result<Vec<u8>, AuthError> {
    match value {
        Some(encoded) => {
            let bytes = base64::engine::general_purpose::STANDARD
                .decode(encoded.trim())
                .map_err(|e| AuthError::config(format!("Invalid JWT_SECRET: {}", e)))?;

            if bytes.len() < 32 {
                return Err(AuthError::config(format!(
                    "JWT_SECRET must be at least 32 bytes, got {}",
                    bytes.len()
                )));
            }

            Ok(bytes)
        }
        None => {
            let mut secret = vec![0u8; 64];
            rand::thread_rng().fill_bytes(&mut secret);
            Ok(secret)
        }
    }
}

/// PEM values set through env files often carry literal `\n`.
fn unescape_pem(value: String) -> String {
    value.replace("\\n", "\n")
}
