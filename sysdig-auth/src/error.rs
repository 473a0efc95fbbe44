//! Authentication error types.

use thiserror::Error;

/// Result type for authenticator operations.
pub type Result<T> = std::result::Result<T, AuthError>;

/// Authenticator errors.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The authenticator was configured with invalid values.
    #[error("Invalid authenticator configuration: {0}")]
    Config(String),

    /// A credential could not be represented as a header value.
    #[error("Invalid value for header {name}: {message}")]
    InvalidHeader {
        /// Header name.
        name: &'static str,
        /// Why the value was rejected.
        message: String,
    },

    /// The token endpoint answered with something other than 200 OK.
    #[error("Token exchange failed with status {status}: {body}")]
    TokenExchange {
        /// HTTP status code.
        status: u16,
        /// Response body, for diagnostics.
        body: String,
    },

    /// Authentication failed for a caller-defined reason.
    #[error("Authentication failed: {0}")]
    Failed(String),

    /// Underlying HTTP client error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Token response could not be decoded.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl AuthError {
    /// Check if the token endpoint rejected the credential itself.
    pub fn is_rejected_credential(&self) -> bool {
        matches!(self, Self::TokenExchange { status, .. } if *status == 400 || *status == 401)
    }

    /// Get the HTTP status code if this error came from a token exchange.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::TokenExchange { status, .. } => Some(*status),
            Self::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}
