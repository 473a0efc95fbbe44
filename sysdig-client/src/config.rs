//! Client configuration.
//!
//! A client is configured by an ordered list of [`ClientOption`]s applied on
//! top of [`ClientConfig::new`]. Any option may reject its value, which
//! aborts construction with that error.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use sysdig_auth::{AccessTokenAuthenticator, Authenticator};
use url::Url;

use crate::{Client, ClientError, Result};

/// Sysdig SaaS endpoint used when no base URL is configured.
pub const DEFAULT_BASE_URL: &str = "https://app.sysdigcloud.com/";

const IBM_BASE_DOMAIN: &str = "monitoring.cloud.ibm.com";

/// IBM Cloud Monitoring regions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Region {
    /// Dallas.
    UsSouth,
    /// Frankfurt.
    EuDe,
    /// Osaka.
    JpOsa,
    /// Tokyo.
    JpTok,
    /// Washington DC.
    UsEast,
    /// Sydney.
    AuSyd,
    /// Toronto.
    CaTor,
    /// São Paulo.
    BrSao,
}

impl Region {
    /// All supported regions.
    pub const ALL: [Region; 8] = [
        Region::UsSouth,
        Region::EuDe,
        Region::JpOsa,
        Region::JpTok,
        Region::UsEast,
        Region::AuSyd,
        Region::CaTor,
        Region::BrSao,
    ];

    /// Region identifier as used in IBM Cloud hostnames.
    pub fn as_str(&self) -> &'static str {
        match self {
            Region::UsSouth => "us-south",
            Region::EuDe => "eu-de",
            Region::JpOsa => "jp-osa",
            Region::JpTok => "jp-tok",
            Region::UsEast => "us-east",
            Region::AuSyd => "au-syd",
            Region::CaTor => "ca-tor",
            Region::BrSao => "br-sao",
        }
    }

    /// Base URL of this region's monitoring endpoint.
    pub fn base_url(&self, private_endpoint: bool) -> String {
        if private_endpoint {
            format!("https://{}.private.{}/", self.as_str(), IBM_BASE_DOMAIN)
        } else {
            format!("https://{}.{}/", self.as_str(), IBM_BASE_DOMAIN)
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Region {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self> {
        Region::ALL
            .into_iter()
            .find(|region| region.as_str() == s)
            .ok_or_else(|| ClientError::Config(format!("unknown IBM region: {s}")))
    }
}

/// Sysdig client configuration.
#[derive(Clone)]
pub struct ClientConfig {
    /// Root that relative API paths resolve against. Must end in `/`.
    pub base_url: Url,
    /// User agent string. Empty means no header is sent.
    pub user_agent: String,
    /// Underlying HTTP client.
    pub http_client: reqwest::Client,
    /// Credential source for every request.
    pub authenticator: Option<Arc<dyn Authenticator>>,
    /// Ask the server for gzip-compressed responses.
    pub response_compression: bool,
    /// Dispatcher that receives this client's log events instead of the default subscriber.
    pub logger: Option<tracing::Dispatch>,
    /// Log full requests and responses.
    pub debug: bool,
}

impl ClientConfig {
    /// The configuration every option list starts from.
    pub fn new() -> Result<Self> {
        Ok(Self {
            base_url: Url::parse(DEFAULT_BASE_URL)?,
            user_agent: format!("sysdig-client/{}", env!("CARGO_PKG_VERSION")),
            http_client: reqwest::Client::new(),
            authenticator: None,
            response_compression: false,
            logger: None,
            debug: false,
        })
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("base_url", &self.base_url.as_str())
            .field("user_agent", &self.user_agent)
            .field("authenticator", &self.authenticator.is_some())
            .field("response_compression", &self.response_compression)
            .field("logger", &self.logger.is_some())
            .field("debug", &self.debug)
            .finish()
    }
}

/// A single named configuration option.
#[derive(Clone)]
pub enum ClientOption {
    /// Override the base URL.
    BaseUrl(String),
    /// Point at an IBM Cloud Monitoring region.
    IbmBaseUrl {
        /// Region to use.
        region: Region,
        /// Use the private network endpoint.
        private_endpoint: bool,
    },
    /// Use a specific HTTP client.
    HttpClient(reqwest::Client),
    /// Override the user agent.
    UserAgent(String),
    /// Set or clear the authenticator.
    Authenticator(Option<Arc<dyn Authenticator>>),
    /// Request compressed responses.
    ResponseCompression(bool),
    /// Route log events to a dispatcher.
    Logger(tracing::Dispatch),
    /// Enable request/response logging.
    Debug(bool),
}

impl ClientOption {
    pub(crate) fn apply(self, config: &mut ClientConfig) -> Result<()> {
        match self {
            ClientOption::BaseUrl(url) => {
                config.base_url = Url::parse(&url)?;
            }
            ClientOption::IbmBaseUrl {
                region,
                private_endpoint,
            } => {
                config.base_url = Url::parse(&region.base_url(private_endpoint))?;
            }
            ClientOption::HttpClient(client) => config.http_client = client,
            ClientOption::UserAgent(user_agent) => config.user_agent = user_agent,
            ClientOption::Authenticator(authenticator) => config.authenticator = authenticator,
            ClientOption::ResponseCompression(enable) => config.response_compression = enable,
            ClientOption::Logger(dispatch) => config.logger = Some(dispatch),
            ClientOption::Debug(enable) => config.debug = enable,
        }
        Ok(())
    }
}

impl fmt::Debug for ClientOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClientOption::BaseUrl(url) => f.debug_tuple("BaseUrl").field(url).finish(),
            ClientOption::IbmBaseUrl {
                region,
                private_endpoint,
            } => f
                .debug_struct("IbmBaseUrl")
                .field("region", region)
                .field("private_endpoint", private_endpoint)
                .finish(),
            ClientOption::HttpClient(_) => f.write_str("HttpClient(..)"),
            ClientOption::UserAgent(ua) => f.debug_tuple("UserAgent").field(ua).finish(),
            ClientOption::Authenticator(auth) => f
                .debug_tuple("Authenticator")
                .field(&auth.as_ref().map(|_| ".."))
                .finish(),
            ClientOption::ResponseCompression(enable) => {
                f.debug_tuple("ResponseCompression").field(enable).finish()
            }
            ClientOption::Logger(_) => f.write_str("Logger(..)"),
            ClientOption::Debug(enable) => f.debug_tuple("Debug").field(enable).finish(),
        }
    }
}

/// Fluent construction of a [`Client`].
///
/// Options are recorded in call order and applied by [`ClientBuilder::build`].
#[derive(Debug, Clone, Default)]
pub struct ClientBuilder {
    options: Vec<ClientOption>,
}

impl ClientBuilder {
    /// Start with no options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from the `SYSDIG_*` environment variables.
    ///
    /// Recognized: `SYSDIG_BASE_URL`, `SYSDIG_IBM_REGION`,
    /// `SYSDIG_IBM_PRIVATE_ENDPOINT`, `SYSDIG_USER_AGENT`, `SYSDIG_DEBUG`,
    /// `SYSDIG_ACCESS_TOKEN`, `SYSDIG_INSTANCE_ID` and `SYSDIG_TEAM_ID`.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Like [`ClientBuilder::from_env`], reading values through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|value| !value.is_empty());
        let mut builder = Self::new();

        if let Some(region) = var("SYSDIG_IBM_REGION") {
            let private_endpoint = var("SYSDIG_IBM_PRIVATE_ENDPOINT")
                .map(|value| parse_flag("SYSDIG_IBM_PRIVATE_ENDPOINT", &value))
                .transpose()?
                .unwrap_or(false);
            builder = builder.ibm_base_url(region.parse()?, private_endpoint);
        }
        if let Some(url) = var("SYSDIG_BASE_URL") {
            builder = builder.base_url(url);
        }
        if let Some(user_agent) = var("SYSDIG_USER_AGENT") {
            builder = builder.user_agent(user_agent);
        }
        if let Some(debug) = var("SYSDIG_DEBUG") {
            builder = builder.debug(parse_flag("SYSDIG_DEBUG", &debug)?);
        }
        if let Some(token) = var("SYSDIG_ACCESS_TOKEN") {
            let mut auth = AccessTokenAuthenticator::builder(token);
            if let Some(instance_id) = var("SYSDIG_INSTANCE_ID") {
                auth = auth.ibm_instance_id(instance_id);
            }
            if let Some(team_id) = var("SYSDIG_TEAM_ID") {
                auth = auth.sysdig_team_id(team_id);
            }
            let auth = auth
                .build()
                .map_err(|e| ClientError::Config(e.to_string()))?;
            builder = builder.authenticator(auth);
        }

        Ok(builder)
    }

    /// Append a raw option.
    pub fn option(mut self, option: ClientOption) -> Self {
        self.options.push(option);
        self
    }

    /// Override the base URL. Must end in `/`.
    pub fn base_url(self, url: impl Into<String>) -> Self {
        self.option(ClientOption::BaseUrl(url.into()))
    }

    /// Point at an IBM Cloud Monitoring region.
    pub fn ibm_base_url(self, region: Region, private_endpoint: bool) -> Self {
        self.option(ClientOption::IbmBaseUrl {
            region,
            private_endpoint,
        })
    }

    /// Use a specific HTTP client.
    pub fn http_client(self, client: reqwest::Client) -> Self {
        self.option(ClientOption::HttpClient(client))
    }

    /// Set the user agent string.
    pub fn user_agent(self, user_agent: impl Into<String>) -> Self {
        self.option(ClientOption::UserAgent(user_agent.into()))
    }

    /// Authenticate every request with `authenticator`.
    pub fn authenticator(self, authenticator: impl Authenticator + 'static) -> Self {
        self.option(ClientOption::Authenticator(Some(Arc::new(authenticator))))
    }

    /// Authenticate with a shared authenticator, or clear it with `None`.
    pub fn shared_authenticator(self, authenticator: Option<Arc<dyn Authenticator>>) -> Self {
        self.option(ClientOption::Authenticator(authenticator))
    }

    /// Ask the server for gzip-compressed responses.
    pub fn response_compression(self, enable: bool) -> Self {
        self.option(ClientOption::ResponseCompression(enable))
    }

    /// Route this client's log events to `dispatch`.
    pub fn logger(self, dispatch: tracing::Dispatch) -> Self {
        self.option(ClientOption::Logger(dispatch))
    }

    /// Log full requests and responses.
    pub fn debug(self, enable: bool) -> Self {
        self.option(ClientOption::Debug(enable))
    }

    /// Apply the options in order and build the client.
    pub fn build(self) -> Result<Client> {
        Client::new(self.options)
    }
}

fn parse_flag(name: &str, value: &str) -> Result<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ClientError::Config(format!(
            "{name} must be a boolean, got {value:?}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn apply(options: Vec<ClientOption>) -> Result<ClientConfig> {
        let mut config = ClientConfig::new()?;
        for option in options {
            option.apply(&mut config)?;
        }
        Ok(config)
    }

    #[test]
    fn test_defaults() {
        let config = ClientConfig::new().unwrap();
        assert_eq!(config.base_url.as_str(), DEFAULT_BASE_URL);
        assert!(config.user_agent.starts_with("sysdig-client/"));
        assert!(config.authenticator.is_none());
        assert!(!config.response_compression);
        assert!(!config.debug);
    }

    #[test]
    fn test_region_urls() {
        assert_eq!(
            Region::UsSouth.base_url(false),
            "https://us-south.monitoring.cloud.ibm.com/"
        );
        assert_eq!(
            Region::EuDe.base_url(true),
            "https://eu-de.private.monitoring.cloud.ibm.com/"
        );
        for region in Region::ALL {
            assert_eq!(region.as_str().parse::<Region>().unwrap(), region);
        }
        assert!("mars-1".parse::<Region>().is_err());
    }

    #[test]
    fn test_options_apply_in_order() {
        let config = apply(vec![
            ClientOption::IbmBaseUrl {
                region: Region::JpTok,
                private_endpoint: false,
            },
            ClientOption::BaseUrl("https://sysdig.example.com/".into()),
            ClientOption::UserAgent("custom/1.0".into()),
            ClientOption::ResponseCompression(true),
            ClientOption::Debug(true),
        ])
        .unwrap();

        assert_eq!(config.base_url.as_str(), "https://sysdig.example.com/");
        assert_eq!(config.user_agent, "custom/1.0");
        assert!(config.response_compression);
        assert!(config.debug);
    }

    #[test]
    fn test_malformed_base_url_rejected() {
        let err = apply(vec![ClientOption::BaseUrl("not a url".into())]).unwrap_err();
        assert!(matches!(err, ClientError::InvalidUrl(_)));
    }

    #[test]
    fn test_authenticator_can_be_cleared() {
        let auth: Arc<dyn Authenticator> = Arc::new(AccessTokenAuthenticator::new("t").unwrap());
        let config = apply(vec![
            ClientOption::Authenticator(Some(auth)),
            ClientOption::Authenticator(None),
        ])
        .unwrap();
        assert!(config.authenticator.is_none());
    }

    #[test]
    fn test_from_lookup() {
        let vars: HashMap<&str, &str> = HashMap::from([
            ("SYSDIG_IBM_REGION", "eu-de"),
            ("SYSDIG_IBM_PRIVATE_ENDPOINT", "true"),
            ("SYSDIG_ACCESS_TOKEN", "token"),
            ("SYSDIG_TEAM_ID", "12"),
            ("SYSDIG_DEBUG", "1"),
        ]);
        let client = ClientBuilder::from_lookup(|key| vars.get(key).map(|v| v.to_string()))
            .unwrap()
            .build()
            .unwrap();

        assert_eq!(
            client.base_url().as_str(),
            "https://eu-de.private.monitoring.cloud.ibm.com/"
        );
        assert!(client.config().debug);
        assert!(client.config().authenticator.is_some());
    }

    #[test]
    fn test_from_lookup_rejects_bad_values() {
        let bad_region = ClientBuilder::from_lookup(|key| {
            (key == "SYSDIG_IBM_REGION").then(|| "nowhere".to_string())
        });
        assert!(bad_region.is_err());

        let bad_flag =
            ClientBuilder::from_lookup(|key| (key == "SYSDIG_DEBUG").then(|| "maybe".to_string()));
        assert!(bad_flag.is_err());
    }

    #[test]
    fn test_empty_lookup_gives_defaults() {
        let client = ClientBuilder::from_lookup(|_| None).unwrap().build().unwrap();
        assert_eq!(client.base_url().as_str(), DEFAULT_BASE_URL);
    }
}
