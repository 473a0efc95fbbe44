//! Alert endpoints.

use http::Method;
use serde::{Deserialize, Serialize};

use super::Severity;
use crate::{Client, Context, MicroDuration, MilliTime, Result};

/// Kind of alert.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertType {
    #[default]
    Manual,
    Event,
    Baseline,
    HostComparison,
    /// A type this client does not know about.
    #[serde(other)]
    Unknown,
}

/// An alert configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Alert {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_on: Option<MilliTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modified_on: Option<MilliTime>,
    #[serde(rename = "type")]
    pub alert_type: AlertType,
    pub name: String,
    pub description: String,
    pub enabled: bool,
    pub criteria: AlertCriteria,
    pub severity: Severity,
    pub severity_label: String,
    /// How long the condition must hold before the alert fires.
    pub timespan: MicroDuration,
    pub condition: String,
    pub custom_notification: AlertCustomNotification,
    pub notification_count: i64,
    pub team_id: i64,
    pub customer_id: i64,
    pub auto_created: bool,
    pub rate_of_change: bool,
    pub re_notify: bool,
    pub re_notify_minutes: i64,
    pub invalid_metrics: Vec<serde_json::Value>,
    pub group_name: String,
    pub valid: bool,
}

/// Notification template overrides.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AlertCustomNotification {
    pub title_template: String,
    pub use_new_template: bool,
}

/// What an event alert matches on.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertCriteria {
    pub text: String,
    pub source: serde_json::Value,
    pub severity: serde_json::Value,
    pub query: serde_json::Value,
    pub scope: serde_json::Value,
}

#[derive(Default, Deserialize)]
struct AlertResponse {
    #[serde(default)]
    alert: Alert,
}

#[derive(Default, Deserialize)]
struct ListAlertsResponse {
    #[serde(default)]
    alerts: Vec<Alert>,
}

/// Alert endpoints.
#[derive(Debug, Clone, Copy)]
pub struct AlertsService<'a> {
    client: &'a Client,
}

impl<'a> AlertsService<'a> {
    pub(crate) fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// Get an alert by id.
    pub async fn get(&self, ctx: &Context, alert_id: i64) -> Result<Alert> {
        let request = self
            .client
            .new_request(Method::GET, &format!("api/alerts/{alert_id}"))?;
        let (body, _) = self.client.decode::<AlertResponse>(ctx, request).await?;
        Ok(body.alert)
    }

    /// List alert configurations.
    pub async fn list(&self, ctx: &Context) -> Result<Vec<Alert>> {
        let request = self.client.new_request(Method::GET, "api/alerts")?;
        let (body, _) = self.client.decode::<ListAlertsResponse>(ctx, request).await?;
        Ok(body.alerts)
    }

    /// Delete an alert.
    pub async fn delete(&self, ctx: &Context, alert_id: i64) -> Result<()> {
        let request = self
            .client
            .new_request(Method::DELETE, &format!("api/alerts/{alert_id}"))?;
        self.client.send(ctx, request).await?;
        Ok(())
    }
}
