//! JWT token handling
//!
//! Tokens are HS256-signed and self-contained: the server keeps no session
//! table and no revocation list, so a token stays valid until its `exp`.

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// JWT configuration
#[derive(Clone)]
pub struct JwtConfig {
    /// Shared HMAC secret
    pub secret: String,
    /// Lifetime of tokens issued by the login flow, in seconds
    pub token_lifetime_seconds: i64,
}

impl JwtConfig {
    pub fn new(secret: impl Into<String>, token_lifetime_seconds: i64) -> Self {
        Self {
            secret: secret.into(),
            token_lifetime_seconds,
        }
    }
}

impl fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtConfig")
            .field("secret", &"<redacted>")
            .field("token_lifetime_seconds", &self.token_lifetime_seconds)
            .finish()
    }
}

/// Claims carried by a bearer token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Subject (user ID)
    pub sub: String,
    /// Role claims, in issue order
    pub roles: Vec<String>,
    /// Issued at (Unix timestamp)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

impl TokenClaims {
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.exp, 0)
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }
}

/// Token issuance and validation failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
    #[error("token is malformed")]
    MalformedToken,

    #[error("token signature is invalid")]
    InvalidSignature,

    #[error("token claim `{0}` is missing or has the wrong type")]
    MissingClaim(&'static str),

    #[error("token has expired")]
    Expired,

    #[error("failed to sign token: {0}")]
    SigningError(String),

    #[error("invalid token request: {0}")]
    InvalidRequest(&'static str),
}

/// Issues and validates HS256 bearer tokens with one immutable secret.
///
/// Cloning is cheap enough to hand one copy to every router layer; nothing
/// inside is mutated after construction.
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl TokenService {
    pub fn new(config: &JwtConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry and claim presence are checked by `check_claims` so each
        // failure keeps its own error kind.
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.required_spec_claims.clear();

        Self {
            encoding_key: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.secret.as_bytes()),
            validation,
        }
    }

    /// Issue a token valid for `lifetime_seconds` from now.
    pub fn issue<I, S>(
        &self,
        subject: &str,
        roles: I,
        lifetime_seconds: i64,
    ) -> Result<String, TokenError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.issue_at(subject, roles, lifetime_seconds, Utc::now())
    }

    /// Issue a token as if the current time were `now`.
    pub fn issue_at<I, S>(
        &self,
        subject: &str,
        roles: I,
        lifetime_seconds: i64,
        now: DateTime<Utc>,
    ) -> Result<String, TokenError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if subject.is_empty() {
            return Err(TokenError::InvalidRequest("subject must not be empty"));
        }
        let roles: Vec<String> = roles.into_iter().map(Into::into).collect();
        if roles.is_empty() {
            return Err(TokenError::InvalidRequest("at least one role is required"));
        }
        if lifetime_seconds <= 0 {
            return Err(TokenError::InvalidRequest("lifetime must be positive"));
        }

        let expires_at = Duration::try_seconds(lifetime_seconds)
            .and_then(|lifetime| now.checked_add_signed(lifetime))
            .ok_or(TokenError::InvalidRequest("lifetime is out of range"))?;

        let claims = TokenClaims {
            sub: subject.to_string(),
            roles,
            iat: Some(now.timestamp()),
            exp: expires_at.timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| TokenError::SigningError(e.to_string()))
    }

    /// Validate a token against the current time.
    pub fn validate(&self, token: &str) -> Result<TokenClaims, TokenError> {
        self.validate_at(token, Utc::now())
    }

    /// Validate a token as if the current time were `now`.
    pub fn validate_at(&self, token: &str, now: DateTime<Utc>) -> Result<TokenClaims, TokenError> {
        let data = decode::<Map<String, Value>>(token, &self.decoding_key, &self.validation)
            .map_err(|e| match e.kind() {
                ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => {
                    TokenError::InvalidSignature
                }
                _ => TokenError::MalformedToken,
            })?;

        let claims = check_claims(data.claims)?;

        if now.timestamp() >= claims.exp {
            return Err(TokenError::Expired);
        }

        Ok(claims)
    }
}

fn check_claims(raw: Map<String, Value>) -> Result<TokenClaims, TokenError> {
    let exp = raw
        .get("exp")
        .and_then(timestamp_value)
        .ok_or(TokenError::MissingClaim("exp"))?;

    let sub = raw
        .get("sub")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .ok_or(TokenError::MissingClaim("sub"))?
        .to_string();

    let roles = raw
        .get("roles")
        .and_then(Value::as_array)
        .and_then(|items| {
            items
                .iter()
                .map(|v| v.as_str().map(str::to_string))
                .collect::<Option<Vec<_>>>()
        })
        .ok_or(TokenError::MissingClaim("roles"))?;

    let iat = raw.get("iat").and_then(timestamp_value);

    Ok(TokenClaims { sub, roles, iat, exp })
}

fn timestamp_value(value: &Value) -> Option<i64> {
    value
        .as_i64()
        .or_else(|| value.as_f64().filter(|f| f.is_finite()).map(|f| f as i64))
}
