//! Bearer token handling for LAADS authorization
//!
//! The archive accepts a caller-supplied bearer token. This module only
//! loads, validates and redacts it; acquiring a token is out of scope.

use std::env;
use std::fmt;

use reqwest::header::HeaderValue;

use crate::constants::env as env_constants;
use crate::errors::{AuthError, AuthResult};

/// Authentication status information
#[derive(Debug, Clone)]
pub struct AuthStatus {
    /// Whether the token environment variable is set
    pub token_set: bool,
    /// Whether a .env file exists in the current directory
    pub dotenv_file_exists: bool,
}

impl AuthStatus {
    /// Check if a token is available in the environment
    pub fn has_credentials(&self) -> bool {
        self.token_set
    }

    /// Get descriptive status message for display
    pub fn status_message(&self) -> String {
        if self.token_set {
            "Bearer token configured".to_string()
        } else {
            format!("Missing token - set {} or add it to .env", env_constants::TOKEN)
        }
    }
}

/// Check current authentication status
pub fn get_auth_status() -> AuthStatus {
    AuthStatus {
        token_set: env::var(env_constants::TOKEN).is_ok(),
        dotenv_file_exists: std::path::Path::new(".env").exists(),
    }
}

/// Bearer credential sent with every archive request
#[derive(Clone, PartialEq, Eq)]
pub struct BearerToken(String);

impl BearerToken {
    /// Validate and wrap a raw token
    pub fn new(token: impl Into<String>) -> AuthResult<Self> {
        let token = token.into().trim().to_string();
        if token.is_empty() {
            return Err(AuthError::MissingToken);
        }
        if token.chars().any(char::is_whitespace) {
            return Err(AuthError::InvalidToken {
                reason: "token must not contain whitespace".to_string(),
            });
        }
        HeaderValue::from_str(&format!("Bearer {}", token)).map_err(|e| {
            AuthError::InvalidToken {
                reason: e.to_string(),
            }
        })?;
        Ok(Self(token))
    }

    /// Read the token from `LAADS_TOKEN`
    ///
    /// Only the binary calls this; library code receives the token as a value.
    pub fn from_env() -> AuthResult<Self> {
        match env::var(env_constants::TOKEN) {
            Ok(value) => Self::new(value),
            Err(_) => Err(AuthError::MissingToken),
        }
    }

    /// `Authorization` header value, marked sensitive so it is never logged
    pub fn header_value(&self) -> AuthResult<HeaderValue> {
        let mut value = HeaderValue::from_str(&format!("Bearer {}", self.0)).map_err(|e| {
            AuthError::InvalidToken {
                reason: e.to_string(),
            }
        })?;
        value.set_sensitive(true);
        Ok(value)
    }
}

impl fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("BearerToken(<redacted>)")
    }
}
