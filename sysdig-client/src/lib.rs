//! # Sysdig Client
//!
//! Typed async client for the Sysdig monitoring REST API.
//!
//! ## Features
//!
//! - **Transport**: requests built against a configurable base URL, JSON bodies,
//!   gzip responses inflated transparently
//! - **Authentication**: pluggable [`Authenticator`]s; a rejected credential is
//!   refreshed and the request retried exactly once
//! - **Errors**: non-2xx responses decoded into [`ErrorResponse`]
//! - **Cancellation**: every call takes a [`Context`] with optional deadline
//! - **Services**: users, teams, events, alerts, dashboards, notification
//!   channels and a Prometheus-compatible query surface
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use sysdig_client::{AccessTokenAuthenticator, Client, Context};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = Client::builder()
//!         .authenticator(AccessTokenAuthenticator::new("my-token")?)
//!         .build()?;
//!
//!     let me = client.users().me(&Context::background()).await?;
//!     println!("Logged in as {}", me.username);
//!     Ok(())
//! }
//! ```
//!
//! ## From the Environment
//!
//! [`ClientBuilder::from_env`] reads `SYSDIG_BASE_URL`, `SYSDIG_IBM_REGION`,
//! `SYSDIG_IBM_PRIVATE_ENDPOINT`, `SYSDIG_ACCESS_TOKEN`, `SYSDIG_INSTANCE_ID`,
//! `SYSDIG_TEAM_ID`, `SYSDIG_USER_AGENT` and `SYSDIG_DEBUG`.
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use sysdig_client::{ClientBuilder, Context};
//!
//! # async fn run() -> sysdig_client::Result<()> {
//! let client = ClientBuilder::from_env()?.response_compression(true).build()?;
//!
//! let ctx = Context::background().with_timeout(Duration::from_secs(10));
//! let teams = client.teams().list(&ctx, Default::default()).await?;
//! # Ok(())
//! # }
//! ```

mod client;
mod config;
mod context;
mod error;
mod request;
mod response;
mod scope;
pub mod services;
mod time;

pub use client::Client;
pub use config::{ClientBuilder, ClientConfig, ClientOption, DEFAULT_BASE_URL, Region};
pub use context::{Context, ContextError};
pub use error::{ApiErrorDetail, ClientError, ErrorResponse, Result};
pub use response::Response;
pub use scope::{EventScope, Scope, Selector};
pub use services::*;
pub use time::{MicroDuration, MilliTime};

pub use sysdig_auth::{
    AccessTokenAuthenticator, AuthError, Authenticator, AuthenticatorFn, IamAuthenticator,
    Refreshable, bearer,
};

// Re-export common types
pub use bytes::Bytes;
pub use http::{HeaderMap, Method, StatusCode, header};
pub use url::Url;

/// Prelude for common imports.
///
/// ```
/// use sysdig_client::prelude::*;
/// ```
pub mod prelude {
    pub use crate::client::Client;
    pub use crate::config::{ClientBuilder, ClientOption, Region};
    pub use crate::context::{Context, ContextError};
    pub use crate::error::{ClientError, ErrorResponse, Result};
    pub use crate::response::Response;
    pub use crate::scope::{EventScope, Scope};
    pub use sysdig_auth::{AccessTokenAuthenticator, Authenticator, IamAuthenticator, Refreshable};
    pub use http::{Method, StatusCode};
}
