//! Dashboard endpoints (v3 API).

use http::Method;
use serde::{Deserialize, Serialize};

use super::{AlertStatus, EventCategory, Severity};
use crate::{Client, ClientError, Context, MilliTime, Result};

const DASHBOARD_SCHEMA: i64 = 3;

/// A dashboard.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Dashboard {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<i64>,
    pub team_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<i64>,
    pub name: String,
    pub description: String,
    pub panels: Vec<Panel>,
    pub layout: Vec<Layout>,
    pub event_display_settings: EventDisplaySettings,
    pub shared: bool,
    pub public: bool,
    pub public_notation: bool,
    pub public_token: String,
    pub favorite: bool,
    pub schema: i64,
    pub username: String,
    pub permissions: Vec<String>,
    pub sharing_settings: Vec<SharingSetting>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub scope_expression_list: Vec<ScopeExpression>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_on: Option<MilliTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modified_on: Option<MilliTime>,
}

impl Dashboard {
    /// An empty dashboard with the current schema.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            schema: DASHBOARD_SCHEMA,
            ..Self::default()
        }
    }
}

/// A dashboard panel.
///
/// Panel-type specific settings (queries, thresholds, axes, legend, markdown)
/// are kept as raw JSON so they survive a get/update round trip untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Panel {
    pub id: i64,
    #[serde(rename = "type")]
    pub panel_type: String,
    pub name: String,
    pub description: String,
    #[serde(flatten)]
    pub settings: serde_json::Map<String, serde_json::Value>,
}

/// Position and size of a panel on the grid.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Layout {
    pub panel_id: i64,
    pub x: i64,
    pub y: i64,
    pub w: i64,
    pub h: i64,
}

/// Who a dashboard is shared with.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SharingSetting {
    pub role: String,
    pub member: SharingSettingMember,
}

/// A user or team a dashboard is shared with.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SharingSettingMember {
    #[serde(rename = "type")]
    pub member_type: String,
    pub id: i64,
    pub name: String,
    pub team_theme: String,
}

/// One term of a dashboard scope.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ScopeExpression {
    pub operand: String,
    pub operator: String,
    pub display_name: String,
    pub value: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub descriptor: Option<String>,
    pub variable: bool,
    pub is_variable: bool,
}

/// Which events are overlaid on a dashboard.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EventDisplaySettings {
    pub enabled: bool,
    pub query_params: EventDisplayQuery,
}

/// Event overlay filter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EventDisplayQuery {
    pub severities: Vec<Severity>,
    pub alert_statuses: Vec<AlertStatus>,
    pub categories: Vec<EventCategory>,
    pub filter: Option<String>,
    pub team_scope: bool,
}

/// Outcome of a dashboard ownership transfer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DashboardTransferResult {
    pub id: i64,
    pub name: String,
    #[serde(rename = "privateDashboard")]
    pub private: bool,
    pub target_team_id: i64,
    pub target_team_name: String,
    pub current_team_id: i64,
    pub current_team_name: String,
    #[serde(rename = "sharingSettingsExcluded")]
    pub excluded: Vec<SharingSetting>,
    #[serde(rename = "sharingSettingsKept")]
    pub kept: Vec<SharingSetting>,
}

#[derive(Default, Deserialize)]
struct DashboardResponse {
    #[serde(default)]
    dashboard: Dashboard,
}

#[derive(Default, Deserialize)]
struct ListDashboardsResponse {
    #[serde(default)]
    dashboards: Vec<Dashboard>,
}

#[derive(Default, Deserialize)]
struct TransferResponse {
    #[serde(default)]
    results: DashboardTransferResult,
}

#[derive(Serialize)]
struct DashboardEnvelope<'a> {
    dashboard: &'a Dashboard,
}

#[derive(Serialize)]
struct FavoriteRequest {
    favorite: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TransferRequest<'a> {
    owner_id: i64,
    target_owner_id: i64,
    simulate: bool,
    dashboard_ids_to_be_transferred: &'a [i64],
}

/// Dashboard endpoints.
#[derive(Debug, Clone, Copy)]
pub struct DashboardsService<'a> {
    client: &'a Client,
}

impl<'a> DashboardsService<'a> {
    pub(crate) fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// Get a dashboard by id.
    pub async fn get(&self, ctx: &Context, dashboard_id: i64) -> Result<Dashboard> {
        let request = self
            .client
            .new_request(Method::GET, &format!("api/v3/dashboards/{dashboard_id}"))?;
        self.decode_dashboard(ctx, request).await
    }

    /// List dashboards visible to the current team.
    pub async fn list(&self, ctx: &Context) -> Result<Vec<Dashboard>> {
        let request = self.client.new_request(Method::GET, "api/v3/dashboards")?;
        let (body, _) = self
            .client
            .decode::<ListDashboardsResponse>(ctx, request)
            .await?;
        Ok(body.dashboards)
    }

    /// Create a dashboard. Server-assigned fields in `dashboard` are ignored.
    pub async fn create(&self, ctx: &Context, mut dashboard: Dashboard) -> Result<Dashboard> {
        dashboard.id = None;
        dashboard.version = None;
        dashboard.schema = DASHBOARD_SCHEMA;
        let request = self.client.new_json_request(
            Method::POST,
            "api/v3/dashboards",
            &DashboardEnvelope {
                dashboard: &dashboard,
            },
        )?;
        self.decode_dashboard(ctx, request).await
    }

    /// Replace a dashboard. `dashboard.id` and `dashboard.version` must be set.
    pub async fn update(&self, ctx: &Context, dashboard: &Dashboard) -> Result<Dashboard> {
        let dashboard_id = dashboard.id.ok_or_else(|| {
            ClientError::InvalidArgument("dashboard update requires an id".to_string())
        })?;
        let request = self.client.new_json_request(
            Method::PUT,
            &format!("api/v3/dashboards/{dashboard_id}"),
            &DashboardEnvelope { dashboard },
        )?;
        self.decode_dashboard(ctx, request).await
    }

    /// Delete a dashboard.
    pub async fn delete(&self, ctx: &Context, dashboard_id: i64) -> Result<()> {
        let request = self
            .client
            .new_request(Method::DELETE, &format!("api/v3/dashboards/{dashboard_id}"))?;
        self.client.send(ctx, request).await?;
        Ok(())
    }

    /// Mark or unmark a dashboard as a favorite.
    pub async fn favorite(
        &self,
        ctx: &Context,
        dashboard_id: i64,
        favorite: bool,
    ) -> Result<Dashboard> {
        let request = self.client.new_json_request(
            Method::PATCH,
            &format!("api/v3/dashboards/{dashboard_id}"),
            &FavoriteRequest { favorite },
        )?;
        self.decode_dashboard(ctx, request).await
    }

    /// Move dashboards from one owner to another.
    ///
    /// With `simulate` set, the server reports what would happen without
    /// changing anything.
    pub async fn transfer(
        &self,
        ctx: &Context,
        owner_id: i64,
        target_owner_id: i64,
        simulate: bool,
        dashboard_ids: &[i64],
    ) -> Result<DashboardTransferResult> {
        if dashboard_ids.is_empty() {
            return Err(ClientError::InvalidArgument(
                "no dashboard ids specified for transfer".to_string(),
            ));
        }
        let request = self.client.new_json_request(
            Method::POST,
            "api/v3/dashboards/transfer",
            &TransferRequest {
                owner_id,
                target_owner_id,
                simulate,
                dashboard_ids_to_be_transferred: dashboard_ids,
            },
        )?;
        let (body, _) = self.client.decode::<TransferResponse>(ctx, request).await?;
        Ok(body.results)
    }

    async fn decode_dashboard(
        &self,
        ctx: &Context,
        request: reqwest::Request,
    ) -> Result<Dashboard> {
        let (body, _) = self.client.decode::<DashboardResponse>(ctx, request).await?;
        Ok(body.dashboard)
    }
}
