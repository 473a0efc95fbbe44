//! # Sysdig Auth
//!
//! Authenticators that attach credentials to outgoing Sysdig API requests.
//!
//! ## Features
//!
//! - **Authenticator**: the capability every credential source implements
//! - **Refreshable**: optional capability to renew a credential on demand
//! - **Access Token**: static bearer token with optional IBM instance and team routing
//! - **IBM Cloud IAM**: API key exchanged for short-lived bearer tokens, refreshed automatically
//!
//! ## Quick Start
//!
//! ```rust
//! use sysdig_auth::{AccessTokenAuthenticator, Authenticator};
//!
//! # tokio_test::block_on(async {
//! let auth = AccessTokenAuthenticator::builder("my-token")
//!     .sysdig_team_id("42")
//!     .build()
//!     .unwrap();
//!
//! let mut request = reqwest::Request::new(
//!     reqwest::Method::GET,
//!     "https://app.sysdigcloud.com/api/user/me".parse().unwrap(),
//! );
//! auth.authenticate(&mut request).await.unwrap();
//! assert_eq!(request.headers()["TeamID"], "42");
//! # });
//! ```
//!
//! ## IBM Cloud IAM
//!
//! ```rust,no_run
//! use sysdig_auth::IamAuthenticator;
//! use std::time::Duration;
//!
//! # fn run() -> sysdig_auth::Result<()> {
//! let auth = IamAuthenticator::builder("ibm-api-key")
//!     .ibm_instance_id("instance-guid")
//!     .refresh_before_expiration(Duration::from_secs(600))
//!     .build()?;
//! # Ok(())
//! # }
//! ```

mod access_token;
mod authenticator;
mod error;
mod ibm_iam;

pub use access_token::{AccessTokenAuthenticator, AccessTokenAuthenticatorBuilder};
pub use authenticator::{
    AUTHORIZATION_HEADER, Authenticator, AuthenticatorFn, IBM_INSTANCE_ID_HEADER, Refreshable,
    SYSDIG_TEAM_ID_HEADER, bearer,
};
pub use error::{AuthError, Result};
pub use ibm_iam::{
    DEFAULT_IAM_ENDPOINT, DEFAULT_REFRESH_BEFORE_EXPIRATION, IamAuthenticator,
    IamAuthenticatorBuilder, TEST_IAM_ENDPOINT, TOKEN_VALIDITY,
};

/// Prelude for common imports.
///
/// ```
/// use sysdig_auth::prelude::*;
/// ```
pub mod prelude {
    pub use crate::access_token::AccessTokenAuthenticator;
    pub use crate::authenticator::{Authenticator, AuthenticatorFn, Refreshable};
    pub use crate::error::{AuthError, Result};
    pub use crate::ibm_iam::IamAuthenticator;
}
