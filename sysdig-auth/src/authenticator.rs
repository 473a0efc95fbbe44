//! The authenticator capability and its optional refresh extension.

use async_trait::async_trait;
use http::{HeaderName, HeaderValue};
use reqwest::Request;

use crate::{AuthError, Result};

/// Header carrying the bearer credential.
pub const AUTHORIZATION_HEADER: &str = "Authorization";
/// Header routing a request to an IBM Cloud Monitoring instance.
pub const IBM_INSTANCE_ID_HEADER: &str = "IBMInstanceID";
/// Header selecting the Sysdig team a request acts as.
pub const SYSDIG_TEAM_ID_HEADER: &str = "TeamID";

/// Attaches credentials to an outgoing request.
///
/// Implementations must be safe to call concurrently from many in-flight
/// requests. An authenticator that can renew its credential also exposes
/// [`Refreshable`] through [`Authenticator::refreshable`]; the client uses it
/// to retry once after a 401 or 403.
#[async_trait]
pub trait Authenticator: Send + Sync {
    /// Add credentials to the request.
    async fn authenticate(&self, request: &mut Request) -> Result<()>;

    /// The refresh capability, if this authenticator has one.
    fn refreshable(&self) -> Option<&dyn Refreshable> {
        None
    }
}

/// Renews a credential on demand.
#[async_trait]
pub trait Refreshable: Send + Sync {
    /// Obtain a fresh credential, replacing the cached one.
    async fn refresh(&self) -> Result<()>;
}

/// Adapts a plain function into an [`Authenticator`].
///
/// ```
/// use sysdig_auth::{AuthenticatorFn, bearer};
///
/// let auth = AuthenticatorFn::new(|request: &mut reqwest::Request| {
///     request
///         .headers_mut()
///         .insert("authorization", bearer("token").parse().unwrap());
///     Ok(())
/// });
/// ```
pub struct AuthenticatorFn<F> {
    func: F,
}

impl<F> AuthenticatorFn<F>
where
    F: Fn(&mut Request) -> Result<()> + Send + Sync,
{
    /// Wrap a function.
    pub fn new(func: F) -> Self {
        Self { func }
    }
}

#[async_trait]
impl<F> Authenticator for AuthenticatorFn<F>
where
    F: Fn(&mut Request) -> Result<()> + Send + Sync,
{
    async fn authenticate(&self, request: &mut Request) -> Result<()> {
        (self.func)(request)
    }
}

/// Format a bearer credential.
pub fn bearer(token: &str) -> String {
    format!("Bearer {token}")
}

pub(crate) fn set_header(request: &mut Request, name: &'static str, value: &str) -> Result<()> {
    let header_name =
        HeaderName::from_bytes(name.as_bytes()).map_err(|e| AuthError::InvalidHeader {
            name,
            message: e.to_string(),
        })?;
    let mut header_value = HeaderValue::from_str(value).map_err(|e| AuthError::InvalidHeader {
        name,
        message: e.to_string(),
    })?;
    if name == AUTHORIZATION_HEADER {
        header_value.set_sensitive(true);
    }
    request.headers_mut().insert(header_name, header_value);
    Ok(())
}
