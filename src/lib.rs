// Sysdig - A typed async client for the Sysdig Monitor REST API
//
// This library bundles the transport client and the authenticators behind a
// single dependency.

// Re-export member crates
pub use sysdig_auth as auth;
pub use sysdig_client as client;

// Re-export core functionality
pub use sysdig_client::*;

// Re-export authenticators not already exposed by the client crate
pub use sysdig_auth::{
    AccessTokenAuthenticatorBuilder, IamAuthenticatorBuilder, DEFAULT_IAM_ENDPOINT,
    TEST_IAM_ENDPOINT,
};

/// Prelude for common imports.
///
/// ```
/// use sysdig::prelude::*;
/// ```
pub mod prelude {
    pub use sysdig_auth::{AccessTokenAuthenticatorBuilder, AuthError, IamAuthenticatorBuilder};
    pub use sysdig_client::prelude::*;
}
