pub mod extractors;
pub mod middleware;
pub mod password;
pub mod token;

use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::config::Config;
use crate::error::AppError;

// Re-export necessary items
pub use extractors::{Authenticated, CurrentDeveloper, CurrentEmployer};
pub use middleware::AuthMiddleware;
pub use password::{hash_password, verify_password};
pub use token::{Claims, TokenKeys};

lazy_static! {
    // Regex for username validation: alphanumeric, underscores, hyphens
    static ref USERNAME_REGEX: regex::Regex = regex::Regex::new(r"^[a-zA-Z0-9_-]+$").unwrap();
}

/// Everything the auth layer needs at request time, shared through `web::Data`.
#[derive(Clone)]
pub struct AuthSettings {
    pub tokens: TokenKeys,
    pub bcrypt_cost: u32,
}

impl AuthSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            tokens: TokenKeys::from_config(config),
            bcrypt_cost: config.bcrypt_cost,
        }
    }

    pub fn hash_password(&self, password: &str) -> Result<String, AppError> {
        hash_password(password, self.bcrypt_cost)
    }
}

/// Account fields common to both registration bodies.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct Credentials {
    /// Must be between 3 and 32 characters, alphanumeric, and can include underscores or hyphens.
    #[validate(
        length(min = 3, max = 32),
        regex(
            path = "USERNAME_REGEX",
            message = "Username must be alphanumeric, underscores, or hyphens"
        )
    )]
    pub username: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 6))]
    pub password: String,
}

/// Body of `POST /{developer,employer}/register/`: credentials plus the
/// kind-specific profile fields, all at the top level of the JSON object.
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterRequest<P> {
    #[serde(flatten)]
    pub credentials: Credentials,
    #[serde(flatten)]
    pub profile: P,
}

/// Form body of `POST /{developer,employer}/token` (OAuth2 password flow).
/// Other form fields such as `grant_type` are ignored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

/// Response of registration and login.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
}

impl TokenResponse {
    pub fn bearer(access_token: String) -> Self {
        Self {
            access_token,
            token_type: "bearer".to_string(),
        }
    }
}
