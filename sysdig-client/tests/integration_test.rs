//! End-to-end tests for the transport pipeline against a mock Sysdig API.

use std::io::Write;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use flate2::Compression;
use flate2::write::GzEncoder;
use parking_lot::Mutex;
use serde_json::json;
use sysdig_client::{
    AccessTokenAuthenticator, AuthError, Authenticator, Client, ClientError, Context,
    ContextError, CreateEventRequest, IamAuthenticator, ProductType, Refreshable, Severity,
};
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Swaps a stale token for a fresh one on refresh and counts refreshes.
struct RotatingToken {
    token: Mutex<String>,
    refreshes: AtomicUsize,
    fail_refresh: bool,
}

impl RotatingToken {
    fn new(fail_refresh: bool) -> Arc<Self> {
        Arc::new(Self {
            token: Mutex::new("stale".to_string()),
            refreshes: AtomicUsize::new(0),
            fail_refresh,
        })
    }

    fn refreshes(&self) -> usize {
        self.refreshes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Authenticator for RotatingToken {
    async fn authenticate(&self, request: &mut reqwest::Request) -> sysdig_auth::Result<()> {
        let value = format!("Bearer {}", self.token.lock());
        request
            .headers_mut()
            .insert("Authorization", value.parse().unwrap());
        Ok(())
    }

    fn refreshable(&self) -> Option<&dyn Refreshable> {
        Some(self)
    }
}

#[async_trait]
impl Refreshable for RotatingToken {
    async fn refresh(&self) -> sysdig_auth::Result<()> {
        self.refreshes.fetch_add(1, Ordering::SeqCst);
        if self.fail_refresh {
            return Err(AuthError::Failed("identity provider unavailable".to_string()));
        }
        *self.token.lock() = "fresh".to_string();
        Ok(())
    }
}

fn client_for(server: &MockServer, auth: Option<Arc<dyn Authenticator>>) -> Client {
    Client::builder()
        .base_url(format!("{}/", server.uri()))
        .shared_authenticator(auth)
        .build()
        .unwrap()
}

fn iam_for(server: &MockServer) -> Arc<dyn Authenticator> {
    let auth = IamAuthenticator::builder("iam-api-key")
        .iam_endpoint(format!("{}/identity/token", server.uri()))
        .build()
        .unwrap();
    Arc::new(auth)
}

fn iam_token(token: &str) -> serde_json::Value {
    json!({"access_token": token, "token_type": "Bearer", "expires_in": 3600})
}

fn gzip(data: &[u8]) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

// =============================================================================
// Authentication and refresh
// =============================================================================

#[tokio::test]
async fn test_refresh_and_retry_once_on_403() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/user/me"))
        .and(header("Authorization", "Bearer stale"))
        .respond_with(ResponseTemplate::new(403))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/user/me"))
        .and(header("Authorization", "Bearer fresh"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"user": {"id": 7, "username": "ops"}})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let auth = RotatingToken::new(false);
    let client = client_for(&server, Some(auth.clone()));

    let user = client.users().me(&Context::background()).await.unwrap();
    assert_eq!(user.id, 7);
    assert_eq!(user.username, "ops");
    assert_eq!(auth.refreshes(), 1);
}

#[tokio::test]
async fn test_transient_rejection_recovers() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/team/3"))
        .respond_with(ResponseTemplate::new(401))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/team/3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"team": {"id": 3}})))
        .mount(&server)
        .await;

    let auth = RotatingToken::new(false);
    let client = client_for(&server, Some(auth.clone()));

    let team = client.teams().get(&Context::background(), 3).await.unwrap();
    assert_eq!(team.id, 3);
    assert_eq!(auth.refreshes(), 1);
}

#[tokio::test]
async fn test_second_rejection_is_returned() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/user/me"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({"message": "forbidden"})))
        .expect(2)
        .mount(&server)
        .await;

    let auth = RotatingToken::new(false);
    let client = client_for(&server, Some(auth.clone()));

    let err = client.users().me(&Context::background()).await.unwrap_err();
    assert_eq!(auth.refreshes(), 1);
    assert_eq!(err.status_code(), Some(403));
    assert!(err.is_authentication_failure());
    assert_eq!(
        err.api_error().and_then(|e| e.message.as_deref()),
        Some("forbidden")
    );
}

#[tokio::test]
async fn test_refresh_failure_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    let auth = RotatingToken::new(true);
    let client = client_for(&server, Some(auth.clone()));

    let err = client.users().me(&Context::background()).await.unwrap_err();
    assert!(matches!(err, ClientError::Refresh(AuthError::Failed(_))));
    assert_eq!(auth.refreshes(), 1);
}

#[tokio::test]
async fn test_retry_resends_same_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v2/events"))
        .and(header("Authorization", "Bearer stale"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v2/events"))
        .and(header("Authorization", "Bearer fresh"))
        .respond_with(
            ResponseTemplate::new(201).set_body_json(json!({"event": {"id": "e-2"}})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let auth = RotatingToken::new(false);
    let client = client_for(&server, Some(auth.clone()));
    let mut event = CreateEventRequest::new("rollout & <canary>");
    event.description = "second wave".to_string();

    let created = client
        .events()
        .create(&Context::background(), &event)
        .await
        .unwrap();
    assert_eq!(created.id, "e-2");
    assert_eq!(auth.refreshes(), 1);

    let received = server.received_requests().await.unwrap();
    assert_eq!(received.len(), 2);
    assert!(!received[0].body.is_empty());
    assert_eq!(received[0].body, received[1].body);
    assert_eq!(received[0].headers.get("content-type").unwrap(), "application/json");
    assert_eq!(received[1].headers.get("content-type").unwrap(), "application/json");
    let sent: serde_json::Value = serde_json::from_slice(&received[1].body).unwrap();
    assert_eq!(sent["event"]["name"], "rollout & <canary>");
}

#[tokio::test]
async fn test_static_token_is_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(header("Authorization", "Bearer static-token"))
        .and(header("TeamID", "42"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    let auth = AccessTokenAuthenticator::builder("static-token")
        .sysdig_team_id("42")
        .build()
        .unwrap();
    let client = client_for(&server, Some(Arc::new(auth)));

    let err = client.users().me(&Context::background()).await.unwrap_err();
    assert_eq!(err.status_code(), Some(401));
}

// =============================================================================
// Response handling
// =============================================================================

#[tokio::test]
async fn test_gzip_body_is_inflated() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/raw"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Content-Encoding", "gzip")
                .set_body_bytes(gzip(b"ok")),
        )
        .mount(&server)
        .await;

    let client = client_for(&server, None);
    let request = client.new_request(reqwest::Method::GET, "api/raw").unwrap();
    let mut out = Vec::new();
    let response = client
        .copy_to(&Context::background(), request, &mut out)
        .await
        .unwrap();

    assert_eq!(out, b"ok");
    assert_eq!(response.text().unwrap(), "ok");
    assert!(!response.is_gzipped());
}

#[tokio::test]
async fn test_error_envelope_mapping() {
    let server = MockServer::start().await;
    let body = json!({
        "message": "validation failed",
        "errors": [{"message": "name is required", "reason": "missing"}]
    });
    Mock::given(method("POST"))
        .and(path("/v2/events"))
        .respond_with(ResponseTemplate::new(422).set_body_json(body.clone()))
        .mount(&server)
        .await;

    let client = client_for(&server, None);
    let err = client
        .events()
        .create(&Context::background(), &CreateEventRequest::new(""))
        .await
        .unwrap_err();

    let api = err.api_error().unwrap();
    assert_eq!(api.status().as_u16(), 422);
    assert_eq!(*api.method(), reqwest::Method::POST);
    assert_eq!(api.errors.len(), 1);
    assert_eq!(api.errors[0].reason, "missing");
    assert_eq!(api.response.json::<serde_json::Value>().unwrap(), body);
    assert!(err.to_string().contains("422 validation failed [name is required (missing)]"));
}

#[tokio::test]
async fn test_unparseable_error_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let client = client_for(&server, None);
    let err = client.users().me(&Context::background()).await.unwrap_err();

    let api = err.api_error().unwrap();
    assert_eq!(api.status().as_u16(), 500);
    assert!(
        api.message
            .as_deref()
            .unwrap()
            .starts_with("error unmarshaling error response")
    );
    assert_eq!(api.response.text().unwrap(), "<html>oops</html>");
}

#[tokio::test]
async fn test_connection_failure_is_transport_error() {
    let client = Client::builder()
        .base_url("http://127.0.0.1:1/")
        .build()
        .unwrap();

    let err = client.users().me(&Context::background()).await.unwrap_err();
    assert!(matches!(err, ClientError::Http(_)), "unexpected error: {err:?}");
    assert!(!err.is_context_error());
}

#[tokio::test]
async fn test_error_reports_requested_url() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/user/me"))
        .respond_with(
            ResponseTemplate::new(302).insert_header("Location", format!("{}/moved", server.uri())),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/moved"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"message": "gone"})))
        .mount(&server)
        .await;

    let client = client_for(&server, None);
    let err = client.users().me(&Context::background()).await.unwrap_err();

    let api = err.api_error().unwrap();
    assert_eq!(api.status().as_u16(), 404);
    assert_eq!(api.url().path(), "/api/user/me");
}

#[tokio::test]
async fn test_string_ids_stay_in_one_path_segment() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/v2/events/a%2Fb%3Fc"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, None);
    let ctx = Context::background();
    client.events().delete(&ctx, "a/b?c").await.unwrap();

    let err = client.events().delete(&ctx, "..").await.unwrap_err();
    assert!(matches!(err, ClientError::InvalidArgument(_)));
    let err = client.notification_channels().get(&ctx, "").await.unwrap_err();
    assert!(matches!(err, ClientError::InvalidArgument(_)));
}

#[tokio::test]
async fn test_empty_body_decodes_to_default() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/team"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let client = client_for(&server, None);
    let teams = client
        .teams()
        .list(&Context::background(), ProductType::Any)
        .await
        .unwrap();
    assert!(teams.is_empty());
}

// =============================================================================
// Cancellation
// =============================================================================

#[tokio::test]
async fn test_cancelled_context_sends_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let client = client_for(&server, None);
    let ctx = Context::background().with_cancel();
    ctx.cancel();

    let err = client.users().me(&ctx).await.unwrap_err();
    assert!(matches!(err, ClientError::Context(ContextError::Canceled)));
}

#[tokio::test]
async fn test_deadline_wins_over_slow_server() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
        .mount(&server)
        .await;

    let client = client_for(&server, None);
    let ctx = Context::background().with_timeout(Duration::from_millis(50));

    let err = client.users().me(&ctx).await.unwrap_err();
    assert!(err.is_context_error());
    assert_eq!(err.to_string(), "context deadline exceeded");
}

#[tokio::test]
async fn test_cancelled_context_skips_token_exchange() {
    let iam = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/identity/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(iam_token("iam-token")))
        .expect(0)
        .mount(&iam)
        .await;
    let api = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&api)
        .await;

    let client = client_for(&api, Some(iam_for(&iam)));
    let ctx = Context::background().with_cancel();
    ctx.cancel();

    let err = client.users().me(&ctx).await.unwrap_err();
    assert!(matches!(err, ClientError::Context(ContextError::Canceled)));
}

#[tokio::test]
async fn test_deadline_interrupts_token_exchange() {
    let iam = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/identity/token"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(iam_token("iam-token"))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&iam)
        .await;
    let api = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&api)
        .await;

    let client = client_for(&api, Some(iam_for(&iam)));
    let ctx = Context::background().with_timeout(Duration::from_millis(100));

    let started = std::time::Instant::now();
    let err = client.users().me(&ctx).await.unwrap_err();
    assert!(matches!(err, ClientError::Context(ContextError::DeadlineExceeded)));
    assert!(started.elapsed() < Duration::from_secs(1));
}

#[tokio::test]
async fn test_deadline_interrupts_credential_refresh() {
    let iam = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/identity/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(iam_token("first")))
        .up_to_n_times(1)
        .mount(&iam)
        .await;
    Mock::given(method("POST"))
        .and(path("/identity/token"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(iam_token("second"))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&iam)
        .await;
    let api = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/user/me"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&api)
        .await;

    let client = client_for(&api, Some(iam_for(&iam)));
    let ctx = Context::background().with_timeout(Duration::from_millis(500));

    let started = std::time::Instant::now();
    let err = client.users().me(&ctx).await.unwrap_err();
    assert!(matches!(err, ClientError::Context(ContextError::DeadlineExceeded)));
    assert!(started.elapsed() < Duration::from_millis(1500));
}

// =============================================================================
// Debug tap
// =============================================================================

#[derive(Clone, Default)]
struct Captured(Arc<Mutex<Vec<u8>>>);

impl Write for Captured {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

#[tokio::test]
async fn test_debug_logs_exchange() {
    let server = MockServer::start().await;
    let body = json!({"event": {"id": "e-1", "name": "deploy", "severity": "LOW"}});
    Mock::given(method("POST"))
        .and(path("/v2/events"))
        .respond_with(
            ResponseTemplate::new(201)
                .insert_header("Content-Type", "application/json")
                .insert_header("Content-Encoding", "gzip")
                .set_body_bytes(gzip(body.to_string().as_bytes())),
        )
        .mount(&server)
        .await;

    let captured = Captured::default();
    let writer = captured.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_ansi(false)
        .with_writer(move || writer.clone())
        .finish();

    let client = Client::builder()
        .base_url(format!("{}/", server.uri()))
        .logger(tracing::Dispatch::new(subscriber))
        .debug(true)
        .build()
        .unwrap();

    let event = client
        .events()
        .create(&Context::background(), &CreateEventRequest::new("deploy"))
        .await
        .unwrap();
    assert_eq!(event.id, "e-1");
    assert_eq!(event.name, "deploy");
    assert_eq!(event.severity, Severity::Low);

    let output = String::from_utf8(captured.0.lock().clone()).unwrap();
    assert!(output.contains("-> request"));
    assert!(output.contains("<- response"));
    assert!(output.contains("\"id\":\"e-1\""));
}

// =============================================================================
// Services
// =============================================================================

#[tokio::test]
async fn test_create_event_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v2/events"))
        .and(header("Content-Type", "application/json"))
        .and(body_partial_json(json!({
            "event": {"name": "deploy <v2>", "severity": "HIGH"}
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "event": {
                "id": "e-9",
                "name": "deploy <v2>",
                "severity": "HIGH",
                "timestamp": 1700000000000i64
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, None);
    let mut request = CreateEventRequest::new("deploy <v2>");
    request.severity = Some(Severity::High);

    let event = client
        .events()
        .create(&Context::background(), &request)
        .await
        .unwrap();
    assert_eq!(event.id, "e-9");
    assert_eq!(event.severity, Severity::High);
    assert_eq!(event.timestamp.unix_millis(), 1_700_000_000_000);
}

#[tokio::test]
async fn test_list_teams_by_product() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/team"))
        .and(query_param("product", "SDS"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "teams": [{"id": 1, "name": "Secure Ops", "products": ["SDS"]}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, None);
    let teams = client
        .teams()
        .list(&Context::background(), ProductType::Secure)
        .await
        .unwrap();
    assert_eq!(teams.len(), 1);
    assert_eq!(teams[0].name, "Secure Ops");
}

#[tokio::test]
async fn test_prometheus_error_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/prometheus/api/v1/query"))
        .and(query_param("query", "up{"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "status": "error",
            "errorType": "bad_data",
            "error": "unexpected end of input"
        })))
        .mount(&server)
        .await;

    let client = client_for(&server, None);
    let err = client
        .prometheus()
        .query(&Context::background(), "up{", None)
        .await
        .unwrap_err();
    match err {
        ClientError::Prometheus { error_type, message } => {
            assert_eq!(error_type, "bad_data");
            assert_eq!(message, "unexpected end of input");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}
