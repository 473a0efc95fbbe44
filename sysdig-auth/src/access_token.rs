//! Static access token authentication.

use async_trait::async_trait;
use reqwest::Request;
use std::fmt;

use crate::authenticator::{
    AUTHORIZATION_HEADER, Authenticator, IBM_INSTANCE_ID_HEADER, SYSDIG_TEAM_ID_HEADER, bearer,
    set_header,
};
use crate::{AuthError, Result};

/// Sends a fixed Sysdig (or IBM Cloud Monitoring) access token on every request.
///
/// The token never changes, so this authenticator has no refresh capability.
#[derive(Clone)]
pub struct AccessTokenAuthenticator {
    token: String,
    ibm_instance_id: Option<String>,
    sysdig_team_id: Option<String>,
}

impl AccessTokenAuthenticator {
    /// Create an authenticator for the given token with no routing headers.
    pub fn new(token: impl Into<String>) -> Result<Self> {
        Self::builder(token).build()
    }

    /// Start building an authenticator for the given token.
    pub fn builder(token: impl Into<String>) -> AccessTokenAuthenticatorBuilder {
        AccessTokenAuthenticatorBuilder {
            token: token.into(),
            ibm_instance_id: None,
            sysdig_team_id: None,
        }
    }

    /// The IBM Cloud Monitoring instance requests are routed to.
    pub fn ibm_instance_id(&self) -> Option<&str> {
        self.ibm_instance_id.as_deref()
    }

    /// The Sysdig team requests act as.
    pub fn sysdig_team_id(&self) -> Option<&str> {
        self.sysdig_team_id.as_deref()
    }
}

impl fmt::Debug for AccessTokenAuthenticator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessTokenAuthenticator")
            .field("token", &"<redacted>")
            .field("ibm_instance_id", &self.ibm_instance_id)
            .field("sysdig_team_id", &self.sysdig_team_id)
            .finish()
    }
}

#[async_trait]
impl Authenticator for AccessTokenAuthenticator {
    async fn authenticate(&self, request: &mut Request) -> Result<()> {
        set_header(request, AUTHORIZATION_HEADER, &bearer(&self.token))?;
        if let Some(instance_id) = &self.ibm_instance_id {
            set_header(request, IBM_INSTANCE_ID_HEADER, instance_id)?;
        }
        if let Some(team_id) = &self.sysdig_team_id {
            set_header(request, SYSDIG_TEAM_ID_HEADER, team_id)?;
        }
        Ok(())
    }
}

/// Builder for [`AccessTokenAuthenticator`].
#[derive(Debug, Clone)]
pub struct AccessTokenAuthenticatorBuilder {
    token: String,
    ibm_instance_id: Option<String>,
    sysdig_team_id: Option<String>,
}

impl AccessTokenAuthenticatorBuilder {
    /// Route requests to an IBM Cloud Monitoring instance. Empty means unset.
    pub fn ibm_instance_id(mut self, instance_id: impl Into<String>) -> Self {
        self.ibm_instance_id = non_empty(instance_id.into());
        self
    }

    /// Act as the given Sysdig team. Empty means unset.
    pub fn sysdig_team_id(mut self, team_id: impl Into<String>) -> Self {
        self.sysdig_team_id = non_empty(team_id.into());
        self
    }

    /// Build the authenticator.
    ///
    /// Fails when the token is empty.
    pub fn build(self) -> Result<AccessTokenAuthenticator> {
        if self.token.is_empty() {
            return Err(AuthError::Config("access token cannot be blank".to_string()));
        }
        Ok(AccessTokenAuthenticator {
            token: self.token,
            ibm_instance_id: self.ibm_instance_id,
            sysdig_team_id: self.sysdig_team_id,
        })
    }
}

fn non_empty(value: String) -> Option<String> {
    (!value.is_empty()).then_some(value)
}
