use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::AppError;
use crate::models::AccountKind;

/// Represents the claims encoded within a bearer token.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Claims {
    /// Username of the account the token was issued to.
    pub sub: String,
    /// Account kind the token was issued for. Checked on every decode.
    pub role: AccountKind,
    /// Issued-at timestamp (seconds since epoch).
    pub iat: i64,
    /// Expiration timestamp (seconds since epoch).
    pub exp: i64,
}

/// Signing material and defaults for issuing and validating tokens.
///
/// Both account kinds share the secret and algorithm; the `role` claim keeps a
/// developer token from being accepted by the employer API and vice versa.
#[derive(Clone)]
pub struct TokenKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    algorithm: Algorithm,
    ttl: Duration,
}

impl TokenKeys {
    pub fn new(secret: &str, algorithm: Algorithm, ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            algorithm,
            ttl,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(&config.secret_key, config.algorithm, config.token_ttl())
    }

    /// Issues a token for `subject` that expires after the configured time-to-live.
    pub fn issue_token(&self, subject: &str, kind: AccountKind) -> Result<String, AppError> {
        self.issue_token_with_ttl(subject, kind, self.ttl)
    }

    pub fn issue_token_with_ttl(
        &self,
        subject: &str,
        kind: AccountKind,
        ttl: Duration,
    ) -> Result<String, AppError> {
        let now = Utc::now();
        let claims = Claims {
            sub: subject.to_string(),
            role: kind,
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
        };

        encode(&Header::new(self.algorithm), &claims, &self.encoding)
            .map_err(|e| AppError::InternalServerError(format!("Failed to generate token: {}", e)))
    }

    /// Verifies signature, expiry and role, returning the decoded claims.
    ///
    /// Returns `AppError::Unauthorized` if the token is malformed, its signature is
    /// invalid, it has expired, or it was issued for a different account kind.
    pub fn decode_token(&self, token: &str, kind: AccountKind) -> Result<Claims, AppError> {
        let mut validation = Validation::new(self.algorithm);
        // expiry is exact
        validation.leeway = 0;

        let claims = decode::<Claims>(token, &self.decoding, &validation)
            .map(|data| data.claims)
            .map_err(|e| AppError::Unauthorized(format!("Invalid token: {}", e)))?;

        if claims.role != kind {
            return Err(AppError::Unauthorized(format!(
                "Invalid token: issued for a {} account",
                claims.role
            )));
        }
        Ok(claims)
    }
}
