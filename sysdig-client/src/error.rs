//! Sysdig client error types.

use serde::{Deserialize, Serialize};
use std::fmt;
use sysdig_auth::AuthError;
use thiserror::Error;

use crate::{ContextError, Response};

/// Result type for Sysdig client operations.
pub type Result<T> = std::result::Result<T, ClientError>;

/// Sysdig client errors.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Invalid client configuration or option.
    #[error("Configuration error: {0}")]
    Config(String),

    /// URL parsing or resolution failed.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Request body could not be serialized.
    #[error("Failed to encode request body: {0}")]
    Encode(#[source] serde_json::Error),

    /// Request could not be assembled.
    #[error("Failed to build request: {0}")]
    RequestBuild(String),

    /// The authenticator failed before anything was sent.
    #[error("Authentication failed: {0}")]
    Authentication(#[source] AuthError),

    /// Credential refresh after a 401/403 failed.
    #[error("Credential refresh failed: {0}")]
    Refresh(#[source] AuthError),

    /// The call's context was cancelled or timed out.
    #[error(transparent)]
    Context(#[from] ContextError),

    /// Underlying HTTP client error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// A gzip response body could not be inflated.
    #[error("Failed to inflate gzip response: {0}")]
    Decompress(#[source] std::io::Error),

    /// A response body could not be decoded.
    #[error("Failed to decode response: {0}")]
    Decode(#[source] serde_json::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The API answered with a non-2xx status.
    #[error(transparent)]
    Api(Box<ErrorResponse>),

    /// The Prometheus endpoint reported a query error.
    #[error("Prometheus API error ({error_type}): {message}")]
    Prometheus {
        /// Prometheus error type, e.g. `bad_data`.
        error_type: String,
        /// Error detail.
        message: String,
    },

    /// A call was made with arguments the API cannot accept.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

impl ClientError {
    /// Get the HTTP status code if this is an API error.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Api(e) => Some(e.status().as_u16()),
            Self::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Get the structured API error, if this is one.
    pub fn api_error(&self) -> Option<&ErrorResponse> {
        match self {
            Self::Api(e) => Some(e),
            _ => None,
        }
    }

    /// Check if the server rejected the credentials (401 or 403).
    pub fn is_authentication_failure(&self) -> bool {
        self.api_error()
            .is_some_and(|e| e.response.is_authentication_failure())
    }

    /// Check if the call ended because its context was done.
    pub fn is_context_error(&self) -> bool {
        matches!(self, Self::Context(_))
    }
}

impl From<ErrorResponse> for ClientError {
    fn from(error: ErrorResponse) -> Self {
        Self::Api(Box::new(error))
    }
}

/// One entry of an API error envelope.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiErrorDetail {
    /// Human-readable description.
    #[serde(default)]
    pub message: String,
    /// Machine-readable reason.
    #[serde(default)]
    pub reason: String,
}

impl fmt::Display for ApiErrorDetail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.message, self.reason)
    }
}

/// A non-2xx API response, decoded from the Sysdig error envelope.
///
/// The originating [`Response`] is kept whole, so its body can still be read.
#[derive(Debug, Clone)]
pub struct ErrorResponse {
    /// The response that carried the error.
    pub response: Response,
    /// Top-level message, or why the envelope could not be decoded.
    pub message: Option<String>,
    /// Individual errors.
    pub errors: Vec<ApiErrorDetail>,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    errors: Option<Vec<ApiErrorDetail>>,
}

impl ErrorResponse {
    /// Decode the error envelope carried by `response`.
    pub fn from_response(response: Response) -> Self {
        match serde_json::from_slice::<ErrorEnvelope>(response.bytes()) {
            Ok(envelope) => Self {
                response,
                message: envelope.message,
                errors: envelope.errors.unwrap_or_default(),
            },
            Err(e) => Self {
                response,
                message: Some(format!("error unmarshaling error response: {e}")),
                errors: Vec::new(),
            },
        }
    }

    /// HTTP status of the failed call.
    pub fn status(&self) -> http::StatusCode {
        self.response.status()
    }

    /// Method of the failed call.
    pub fn method(&self) -> &http::Method {
        self.response.method()
    }

    /// URL of the failed call.
    pub fn url(&self) -> &url::Url {
        self.response.url()
    }
}

impl fmt::Display for ErrorResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}: {} {} [",
            self.method(),
            self.url(),
            self.status().as_u16(),
            self.message.as_deref().unwrap_or_default()
        )?;
        for (i, error) in self.errors.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{error}")?;
        }
        f.write_str("]")
    }
}

impl std::error::Error for ErrorResponse {}
