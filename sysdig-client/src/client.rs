//! Sysdig API client and the request pipeline.

use bytes::Bytes;
use flate2::read::GzDecoder;
use reqwest::Request;
use serde::de::DeserializeOwned;
use std::io::{Read, Write};
use std::sync::Arc;
use tracing::{debug, error, warn};
use url::Url;

use crate::services::{
    AlertsService, DashboardsService, EventsService, NotificationChannelsService,
    PrometheusService, TeamsService, UsersService,
};
use crate::{
    ClientBuilder, ClientConfig, ClientError, ClientOption, Context, ContextError, ErrorResponse,
    Response, Result,
};

/// Client for the Sysdig Monitor API.
///
/// Cloning is cheap and clones share configuration and connection pool.
#[derive(Clone, Debug)]
pub struct Client {
    config: Arc<ClientConfig>,
}

impl Client {
    /// Create a client, applying `options` in order.
    pub fn new(options: impl IntoIterator<Item = ClientOption>) -> Result<Self> {
        let mut config = ClientConfig::new()?;
        for option in options {
            option.apply(&mut config)?;
        }
        Ok(Self {
            config: Arc::new(config),
        })
    }

    /// Create a client with default configuration.
    pub fn default_client() -> Result<Self> {
        Self::new([])
    }

    /// Start building a client.
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// Get the client configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// The base URL requests resolve against.
    pub fn base_url(&self) -> &Url {
        &self.config.base_url
    }

    /// Point this client at a different base URL, e.g. a mock server.
    pub fn set_base_url(&mut self, base_url: Url) {
        Arc::make_mut(&mut self.config).base_url = base_url;
    }

    /// Route this client's log events to `logger`, or back to the default subscriber.
    pub fn set_logger(&mut self, logger: Option<tracing::Dispatch>) {
        Arc::make_mut(&mut self.config).logger = logger;
    }

    /// The underlying HTTP client.
    pub fn http_client(&self) -> reqwest::Client {
        self.config.http_client.clone()
    }

    /// User endpoints.
    pub fn users(&self) -> UsersService<'_> {
        UsersService::new(self)
    }

    /// Team endpoints.
    pub fn teams(&self) -> TeamsService<'_> {
        TeamsService::new(self)
    }

    /// Event endpoints.
    pub fn events(&self) -> EventsService<'_> {
        EventsService::new(self)
    }

    /// Alert endpoints.
    pub fn alerts(&self) -> AlertsService<'_> {
        AlertsService::new(self)
    }

    /// Dashboard endpoints.
    pub fn dashboards(&self) -> DashboardsService<'_> {
        DashboardsService::new(self)
    }

    /// Notification channel endpoints.
    pub fn notification_channels(&self) -> NotificationChannelsService<'_> {
        NotificationChannelsService::new(self)
    }

    /// Prometheus-compatible query endpoints.
    pub fn prometheus(&self) -> PrometheusService<'_> {
        PrometheusService::new(self)
    }

    /// Send `request` and return the response once it is known to be a success.
    ///
    /// The authenticator, if any, runs before every attempt. When the server
    /// answers 401 or 403 and the authenticator can refresh, the credential
    /// is refreshed and the request is sent one more time; a second rejection
    /// is returned as is. Gzip bodies are inflated and non-2xx responses
    /// become [`ClientError::Api`].
    ///
    /// Authentication, refresh and the exchange itself are all abandoned as
    /// soon as `ctx` is done.
    pub async fn send(&self, ctx: &Context, request: Request) -> Result<Response> {
        let mut refreshed = false;

        loop {
            if let Some(e) = ctx.err() {
                return Err(e.into());
            }
            let mut attempt = clone_request(&request)?;
            self.authenticate(ctx, &mut attempt).await?;
            if self.config.debug {
                self.log_request(&attempt);
            }

            let response = self.dispatch(ctx, attempt).await?;

            if response.is_authentication_failure()
                && !refreshed
                && let Some(refreshable) = self
                    .config
                    .authenticator
                    .as_deref()
                    .and_then(|authenticator| authenticator.refreshable())
            {
                self.emit(|| {
                    debug!(
                        status = %response.status(),
                        url = %response.url(),
                        "Credentials rejected, refreshing"
                    )
                });
                let refresh = async { refreshable.refresh().await.map_err(ClientError::Refresh) };
                if let Err(e) = until_done(ctx, refresh).await {
                    self.emit(|| warn!(error = %e, "Credential refresh failed"));
                    return Err(e);
                }
                refreshed = true;
                continue;
            }

            return self.finish(response);
        }
    }

    /// Send `request` and decode the JSON body into `T`.
    ///
    /// An empty body decodes to `T::default()`.
    pub async fn decode<T>(&self, ctx: &Context, request: Request) -> Result<(T, Response)>
    where
        T: DeserializeOwned + Default,
    {
        let response = self.send(ctx, request).await?;
        let value = decode_body(response.bytes())?;
        Ok((value, response))
    }

    /// Send `request` and copy the raw body into `writer`.
    pub async fn copy_to<W>(
        &self,
        ctx: &Context,
        request: Request,
        writer: &mut W,
    ) -> Result<Response>
    where
        W: Write + Send + ?Sized,
    {
        let response = self.send(ctx, request).await?;
        writer.write_all(response.bytes())?;
        writer.flush()?;
        Ok(response)
    }

    /// Map a non-2xx response to [`ClientError::Api`].
    pub fn check_response(response: Response) -> Result<Response> {
        if response.is_success() {
            Ok(response)
        } else {
            Err(ErrorResponse::from_response(response).into())
        }
    }

    async fn authenticate(&self, ctx: &Context, request: &mut Request) -> Result<()> {
        let Some(authenticator) = &self.config.authenticator else {
            return Ok(());
        };

        if self.config.debug {
            self.emit(|| debug!(url = %request.url(), "Authenticating request"));
        }
        let url = request.url().clone();
        let exchange = async {
            authenticator
                .authenticate(request)
                .await
                .map_err(ClientError::Authentication)
        };
        until_done(ctx, exchange).await.inspect_err(|e| {
            self.emit(|| debug!(url = %url, error = %e, "Authentication did not complete"))
        })?;
        if self.config.debug {
            self.emit(|| debug!("Authentication succeeded"));
        }
        Ok(())
    }

    /// One network exchange, abandoned as soon as `ctx` is done.
    async fn dispatch(&self, ctx: &Context, request: Request) -> Result<Response> {
        let method = request.method().clone();
        let url = request.url().clone();
        let exchange = async {
            let response = self.config.http_client.execute(request).await?;
            Response::from_reqwest(method, url, response).await
        };
        until_done(ctx, exchange).await
    }

    fn finish(&self, mut response: Response) -> Result<Response> {
        if response.is_gzipped() && !response.bytes().is_empty() {
            let inflated = inflate_gzip(response.bytes()).map_err(|e| {
                self.emit(|| {
                    error!(error = %e, url = %response.url(), "Failed to inflate gzip response")
                });
                ClientError::Decompress(e)
            })?;
            response.replace_decoded_body(inflated);
        }

        if self.config.debug {
            self.log_response(&response);
        }

        Self::check_response(response)
    }

    fn log_request(&self, request: &Request) {
        let body = request
            .body()
            .and_then(|body| body.as_bytes())
            .map(String::from_utf8_lossy)
            .unwrap_or_default();
        self.emit(|| {
            debug!(
                method = %request.method(),
                url = %request.url(),
                headers = ?request.headers(),
                body = %body,
                "-> request"
            )
        });
    }

    fn log_response(&self, response: &Response) {
        let body = String::from_utf8_lossy(response.bytes());
        self.emit(|| {
            debug!(
                status = %response.status(),
                url = %response.url(),
                headers = ?response.headers(),
                body = %body,
                "<- response"
            )
        });
    }

    /// Run `f` with this client's logger as the active dispatcher.
    pub(crate) fn emit<R>(&self, f: impl FnOnce() -> R) -> R {
        match &self.config.logger {
            Some(dispatch) => tracing::dispatcher::with_default(dispatch, f),
            None => f(),
        }
    }
}

/// Run `operation` unless `ctx` is done first.
///
/// Errors observed once `ctx` is done are replaced by the context's error.
async fn until_done<T, F>(ctx: &Context, operation: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    if let Some(e) = ctx.err() {
        return Err(e.into());
    }

    tokio::select! {
        biased;
        _ = ctx.done() => Err(ctx.err().unwrap_or(ContextError::Canceled).into()),
        result = operation => result.map_err(|e| match ctx.err() {
            Some(ctx_err) => ctx_err.into(),
            None => e,
        }),
    }
}

/// Requests are consumed by sending, so every attempt sends a copy.
fn clone_request(request: &Request) -> Result<Request> {
    request
        .try_clone()
        .ok_or_else(|| ClientError::RequestBuild("request body cannot be replayed".to_string()))
}

fn inflate_gzip(body: &[u8]) -> std::io::Result<Bytes> {
    let mut inflated = Vec::new();
    GzDecoder::new(body).read_to_end(&mut inflated)?;
    Ok(Bytes::from(inflated))
}

fn decode_body<T>(body: &[u8]) -> Result<T>
where
    T: DeserializeOwned + Default,
{
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    serde_json::from_slice(body).map_err(ClientError::Decode)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::Compression;
    use flate2::write::GzEncoder;
    use http::{HeaderMap, Method, StatusCode};

    fn gzip(data: &[u8]) -> Vec<u8> {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(data).unwrap();
        encoder.finish().unwrap()
    }

    #[test]
    fn test_client_creation() {
        let client = Client::default_client().unwrap();
        assert_eq!(client.base_url().as_str(), crate::DEFAULT_BASE_URL);
        assert!(client.config().authenticator.is_none());
    }

    #[test]
    fn test_set_base_url_does_not_affect_clones() {
        let original = Client::default_client().unwrap();
        let mut test_client = original.clone();
        test_client.set_base_url("http://127.0.0.1:9999/".parse().unwrap());

        assert_eq!(test_client.base_url().as_str(), "http://127.0.0.1:9999/");
        assert_eq!(original.base_url().as_str(), crate::DEFAULT_BASE_URL);
    }

    #[test]
    fn test_inflate_gzip() {
        assert_eq!(inflate_gzip(&gzip(b"ok")).unwrap(), Bytes::from_static(b"ok"));
        assert!(inflate_gzip(b"not gzip").is_err());
    }

    #[test]
    fn test_decode_empty_body_is_default() {
        let value: Vec<String> = decode_body(b"").unwrap();
        assert!(value.is_empty());
        let value: Option<u32> = decode_body(b"  \n").unwrap();
        assert!(value.is_none());
    }

    #[test]
    fn test_decode_truncated_body_is_error() {
        let err = decode_body::<serde_json::Value>(b"{\"id\":").unwrap_err();
        assert!(matches!(err, ClientError::Decode(_)));
    }

    #[test]
    fn test_check_response() {
        let url: Url = "https://app.sysdigcloud.com/api/team/1".parse().unwrap();
        let ok = Response::from_parts(
            Method::GET,
            url.clone(),
            StatusCode::NO_CONTENT,
            HeaderMap::new(),
            "",
        );
        assert!(Client::check_response(ok).is_ok());

        let missing =
            Response::from_parts(Method::GET, url, StatusCode::NOT_FOUND, HeaderMap::new(), "{}");
        let err = Client::check_response(missing).unwrap_err();
        assert_eq!(err.status_code(), Some(404));
    }

    #[tokio::test]
    async fn test_until_done_skips_work_on_cancelled_context() {
        let ctx = Context::background().with_cancel();
        ctx.cancel();

        let mut started = false;
        let err = until_done(&ctx, async {
            started = true;
            Ok(())
        })
        .await
        .unwrap_err();

        assert!(!started);
        assert!(matches!(err, ClientError::Context(ContextError::Canceled)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_until_done_stops_at_deadline() {
        let ctx = Context::background().with_timeout(std::time::Duration::from_millis(100));

        let err = until_done(&ctx, async {
            tokio::time::sleep(std::time::Duration::from_secs(10)).await;
            Ok(())
        })
        .await
        .unwrap_err();

        assert!(matches!(err, ClientError::Context(ContextError::DeadlineExceeded)));
    }

    #[tokio::test]
    async fn test_until_done_prefers_context_error() {
        let ctx = Context::background().with_cancel();
        let err = until_done::<(), _>(&ctx, async {
            ctx.cancel();
            Err(ClientError::InvalidArgument("transport failed".to_string()))
        })
        .await
        .unwrap_err();

        assert!(matches!(err, ClientError::Context(ContextError::Canceled)));
    }
}
