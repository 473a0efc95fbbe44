//! IBM Cloud IAM authentication.
//!
//! An IBM Cloud API key is exchanged at the IAM token endpoint for a bearer
//! token valid for [`TOKEN_VALIDITY`]. The authenticator caches that token and
//! exchanges again once it is within the configured refresh window of
//! expiring, or whenever the client asks for a refresh after a 401/403.

use async_trait::async_trait;
use reqwest::{Request, StatusCode};
use serde::Deserialize;
use std::fmt;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::debug;

use crate::authenticator::{
    AUTHORIZATION_HEADER, Authenticator, IBM_INSTANCE_ID_HEADER, Refreshable,
    SYSDIG_TEAM_ID_HEADER, bearer, set_header,
};
use crate::{AuthError, Result};

/// Production IAM token endpoint.
pub const DEFAULT_IAM_ENDPOINT: &str = "https://iam.cloud.ibm.com/identity/token";
/// Staging IAM token endpoint.
pub const TEST_IAM_ENDPOINT: &str = "https://iam.test.cloud.ibm.com/identity/token";
/// How long before expiry a token is refreshed unless configured otherwise.
pub const DEFAULT_REFRESH_BEFORE_EXPIRATION: Duration = Duration::from_secs(5 * 60);
/// Lifetime of an IAM access token.
pub const TOKEN_VALIDITY: Duration = Duration::from_secs(60 * 60);

const API_KEY_GRANT_TYPE: &str = "urn:ibm:params:oauth:grant-type:apikey";
const CLOUD_IAM_RESPONSE_TYPE: &str = "cloud_iam";

/// Token endpoint response.
#[derive(Debug, Clone, Default, Deserialize)]
struct IamToken {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    token_type: Option<String>,
    #[serde(default)]
    expires_in: Option<u64>,
}

/// Cached credential, replaced wholesale on every successful exchange.
#[derive(Default)]
struct TokenState {
    token: Option<IamToken>,
    last_refresh: Option<Instant>,
}

impl TokenState {
    fn is_stale(&self, refresh_after: Duration) -> bool {
        match (&self.token, self.last_refresh) {
            (Some(_), Some(at)) => at.elapsed() > refresh_after,
            _ => true,
        }
    }
}

/// Authenticates with bearer tokens obtained from IBM Cloud IAM.
pub struct IamAuthenticator {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
    ibm_instance_id: Option<String>,
    sysdig_team_id: Option<String>,
    refresh_after: Duration,
    state: RwLock<TokenState>,
}

impl IamAuthenticator {
    /// Start building an authenticator for the given API key.
    pub fn builder(api_key: impl Into<String>) -> IamAuthenticatorBuilder {
        IamAuthenticatorBuilder {
            api_key: api_key.into(),
            http: None,
            endpoint: DEFAULT_IAM_ENDPOINT.to_string(),
            ibm_instance_id: None,
            sysdig_team_id: None,
            refresh_before_expiration: DEFAULT_REFRESH_BEFORE_EXPIRATION,
        }
    }

    /// Create an authenticator with default settings.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::builder(api_key).build()
    }

    /// The token endpoint in use.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Age at which a cached token is considered stale.
    pub fn refresh_after(&self) -> Duration {
        self.refresh_after
    }

    /// Exchange only if the cached token is still stale once the write lock
    /// is held, so callers queued behind a refresh reuse its result.
    async fn refresh_if_stale(&self) -> Result<String> {
        let mut state = self.state.write().await;
        if !state.is_stale(self.refresh_after)
            && let Some(token) = &state.token
        {
            return Ok(token.access_token.clone());
        }
        let token = self.exchange().await?;
        let access_token = token.access_token.clone();
        *state = TokenState {
            token: Some(token),
            last_refresh: Some(Instant::now()),
        };
        Ok(access_token)
    }

    async fn current_token(&self) -> Result<String> {
        {
            let state = self.state.read().await;
            if !state.is_stale(self.refresh_after)
                && let Some(token) = &state.token
            {
                return Ok(token.access_token.clone());
            }
        }
        self.refresh_if_stale().await
    }

    async fn exchange(&self) -> Result<IamToken> {
        debug!(endpoint = %self.endpoint, "Exchanging IBM Cloud API key for IAM token");

        let params = [
            ("grant_type", API_KEY_GRANT_TYPE),
            ("response_type", CLOUD_IAM_RESPONSE_TYPE),
            ("apikey", self.api_key.as_str()),
        ];
        let response = self
            .http
            .post(&self.endpoint)
            .header(http::header::ACCEPT, "application/json")
            .form(&params)
            .send()
            .await?;

        let status = response.status();
        if status != StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            debug!(status = %status, "IAM token exchange rejected");
            return Err(AuthError::TokenExchange {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.bytes().await?;
        let token: IamToken = serde_json::from_slice(&body)?;
        debug!(
            token_type = token.token_type.as_deref().unwrap_or("unknown"),
            expires_in = token.expires_in,
            has_refresh_token = token.refresh_token.is_some(),
            "IAM token obtained"
        );
        Ok(token)
    }
}

impl fmt::Debug for IamAuthenticator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IamAuthenticator")
            .field("endpoint", &self.endpoint)
            .field("api_key", &"<redacted>")
            .field("ibm_instance_id", &self.ibm_instance_id)
            .field("sysdig_team_id", &self.sysdig_team_id)
            .field("refresh_after", &self.refresh_after)
            .finish()
    }
}

#[async_trait]
impl Authenticator for IamAuthenticator {
    async fn authenticate(&self, request: &mut Request) -> Result<()> {
        let access_token = self.current_token().await?;

        set_header(request, AUTHORIZATION_HEADER, &bearer(&access_token))?;
        if let Some(instance_id) = &self.ibm_instance_id {
            set_header(request, IBM_INSTANCE_ID_HEADER, instance_id)?;
        }
        if let Some(team_id) = &self.sysdig_team_id {
            set_header(request, SYSDIG_TEAM_ID_HEADER, team_id)?;
        }
        Ok(())
    }

    fn refreshable(&self) -> Option<&dyn Refreshable> {
        Some(self)
    }
}

#[async_trait]
impl Refreshable for IamAuthenticator {
    /// Always exchanges, regardless of the cached token's age.
    async fn refresh(&self) -> Result<()> {
        let mut state = self.state.write().await;
        let token = self.exchange().await?;
        *state = TokenState {
            token: Some(token),
            last_refresh: Some(Instant::now()),
        };
        Ok(())
    }
}

/// Builder for [`IamAuthenticator`].
#[derive(Debug, Clone)]
pub struct IamAuthenticatorBuilder {
    api_key: String,
    http: Option<reqwest::Client>,
    endpoint: String,
    ibm_instance_id: Option<String>,
    sysdig_team_id: Option<String>,
    refresh_before_expiration: Duration,
}

impl IamAuthenticatorBuilder {
    /// Use a specific HTTP client for token exchanges.
    pub fn http_client(mut self, client: reqwest::Client) -> Self {
        self.http = Some(client);
        self
    }

    /// Override the IAM token endpoint.
    pub fn iam_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Route requests to an IBM Cloud Monitoring instance.
    pub fn ibm_instance_id(mut self, instance_id: impl Into<String>) -> Self {
        let instance_id = instance_id.into();
        self.ibm_instance_id = (!instance_id.is_empty()).then_some(instance_id);
        self
    }

    /// Act as the given Sysdig team.
    pub fn sysdig_team_id(mut self, team_id: impl Into<String>) -> Self {
        let team_id = team_id.into();
        self.sysdig_team_id = (!team_id.is_empty()).then_some(team_id);
        self
    }

    /// Refresh this long before the token's validity window closes.
    ///
    /// Must be shorter than [`TOKEN_VALIDITY`].
    pub fn refresh_before_expiration(mut self, duration: Duration) -> Self {
        self.refresh_before_expiration = duration;
        self
    }

    /// Build the authenticator.
    pub fn build(self) -> Result<IamAuthenticator> {
        if self.api_key.is_empty() {
            return Err(AuthError::Config("apikey cannot be blank".to_string()));
        }
        if self.refresh_before_expiration >= TOKEN_VALIDITY {
            return Err(AuthError::Config(format!(
                "invalid refresh before duration: {:?}, must be less than expiration time: {:?}",
                self.refresh_before_expiration, TOKEN_VALIDITY
            )));
        }

        Ok(IamAuthenticator {
            http: self.http.unwrap_or_default(),
            endpoint: self.endpoint,
            api_key: self.api_key,
            ibm_instance_id: self.ibm_instance_id,
            sysdig_team_id: self.sysdig_team_id,
            refresh_after: TOKEN_VALIDITY - self.refresh_before_expiration,
            state: RwLock::new(TokenState::default()),
        })
    }
}
