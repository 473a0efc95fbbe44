//! Prometheus-compatible query surface.
//!
//! Calls go through the same transport as every other service. The
//! Prometheus `{status, data, errorType, error}` envelope is unwrapped here;
//! an `error` status becomes [`ClientError::Prometheus`] whether it arrives
//! with a 2xx or a 4xx/5xx status code.

use std::collections::BTreeMap;
use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use http::Method;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::with_query;
use crate::{Client, ClientError, Context, Result};

const STATUS_ERROR: &str = "error";

/// Shape of a query result.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultType {
    Matrix,
    #[default]
    Vector,
    Scalar,
    String,
}

/// Result of an instant or range query.
///
/// `result` is kept as raw JSON; its layout depends on `result_type`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct QueryResult {
    pub result_type: ResultType,
    pub result: serde_json::Value,
}

/// Time window for a range query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub step: Duration,
}

/// An alert as reported by the Prometheus alerts endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PrometheusAlert {
    pub labels: BTreeMap<String, String>,
    pub annotations: BTreeMap<String, String>,
    pub state: String,
    pub active_at: Option<DateTime<Utc>>,
    pub value: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Envelope<T> {
    #[serde(default)]
    status: String,
    data: Option<T>,
    error_type: Option<String>,
    error: Option<String>,
    #[serde(default)]
    warnings: Vec<String>,
}

// An empty body decodes to this; no bound on `T` is needed.
impl<T> Default for Envelope<T> {
    fn default() -> Self {
        Self {
            status: String::new(),
            data: None,
            error_type: None,
            error: None,
            warnings: Vec::new(),
        }
    }
}

impl<T> Envelope<T> {
    fn into_data(self) -> Result<T>
    where
        T: Default,
    {
        if self.status == STATUS_ERROR {
            return Err(ClientError::Prometheus {
                error_type: self.error_type.unwrap_or_default(),
                message: self.error.unwrap_or_default(),
            });
        }
        Ok(self.data.unwrap_or_default())
    }
}

#[derive(Default, Deserialize)]
struct AlertsData {
    #[serde(default)]
    alerts: Vec<PrometheusAlert>,
}

#[derive(Serialize)]
struct InstantQuery<'a> {
    query: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    time: Option<String>,
}

#[derive(Serialize)]
struct RangeQuery<'a> {
    query: &'a str,
    start: String,
    end: String,
    step: String,
}

/// Prometheus-compatible endpoints.
#[derive(Debug, Clone, Copy)]
pub struct PrometheusService<'a> {
    client: &'a Client,
}

impl<'a> PrometheusService<'a> {
    pub(crate) fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// Evaluate an instant query, at `time` or at the server's current time.
    pub async fn query(
        &self,
        ctx: &Context,
        query: &str,
        time: Option<DateTime<Utc>>,
    ) -> Result<QueryResult> {
        let path = with_query(
            "prometheus/api/v1/query",
            &InstantQuery {
                query,
                time: time.map(format_time),
            },
        )?;
        self.get(ctx, &path).await
    }

    /// Evaluate a query over a time window.
    pub async fn query_range(
        &self,
        ctx: &Context,
        query: &str,
        range: QueryRange,
    ) -> Result<QueryResult> {
        if range.step.is_zero() {
            return Err(ClientError::InvalidArgument(
                "query range step must be positive".to_string(),
            ));
        }
        if range.end < range.start {
            return Err(ClientError::InvalidArgument(
                "query range end is before start".to_string(),
            ));
        }
        let path = with_query(
            "prometheus/api/v1/query_range",
            &RangeQuery {
                query,
                start: format_time(range.start),
                end: format_time(range.end),
                step: format!("{}s", range.step.as_secs_f64()),
            },
        )?;
        self.get(ctx, &path).await
    }

    /// List active alerts.
    pub async fn alerts(&self, ctx: &Context) -> Result<Vec<PrometheusAlert>> {
        let data: AlertsData = self.get(ctx, "prometheus/api/v1/alerts").await?;
        Ok(data.alerts)
    }

    async fn get<T>(&self, ctx: &Context, path: &str) -> Result<T>
    where
        T: DeserializeOwned + Default,
    {
        let request = self.client.new_request(Method::GET, path)?;
        let envelope = match self.client.decode::<Envelope<T>>(ctx, request).await {
            Ok((envelope, _)) => envelope,
            Err(ClientError::Api(api)) => {
                return Err(match prometheus_error(api.response.bytes()) {
                    Some(error) => error,
                    None => ClientError::Api(api),
                });
            }
            Err(e) => return Err(e),
        };
        for warning in &envelope.warnings {
            self.client
                .emit(|| warn!(path, warning = %warning, "Prometheus query warning"));
        }
        envelope.into_data()
    }
}

fn format_time(time: DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Extract a Prometheus error from a failed response body, if it carries one.
fn prometheus_error(body: &[u8]) -> Option<ClientError> {
    let envelope: Envelope<serde_json::Value> = serde_json::from_slice(body).ok()?;
    if envelope.status != STATUS_ERROR {
        return None;
    }
    envelope.into_data().err()
}
