//! Team endpoints.

use http::Method;
use serde::{Deserialize, Serialize};

use super::{User, with_query};
use crate::{Client, Context, MilliTime, Result};

/// Which product a team belongs to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProductType {
    /// Sysdig Monitor.
    #[serde(rename = "SDC")]
    Monitor,
    /// Sysdig Secure.
    #[serde(rename = "SDS")]
    Secure,
    /// Either product.
    #[default]
    #[serde(rename = "")]
    Any,
}

/// A Sysdig team.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Team {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub version: i64,
    pub origin: String,
    pub theme: String,
    pub show: String,
    pub customer_id: i64,
    pub products: Vec<String>,
    pub entry_point: TeamEntryPoint,
    pub default_team_role: String,
    pub immutable: bool,
    pub can_use_sysdig_capture: bool,
    pub can_use_agent_cli: bool,
    pub can_use_custom_events: bool,
    pub can_use_aws_metrics: bool,
    pub can_use_beacon_metrics: bool,
    pub can_use_rapid_response: bool,
    pub user_count: i64,
    pub namespace_filters: serde_json::Value,
    pub properties: serde_json::Value,
    pub default: bool,
    pub date_created: MilliTime,
    pub last_updated: MilliTime,
}

/// Page a team opens on.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TeamEntryPoint {
    pub module: String,
}

/// Members of a team.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TeamUsers {
    pub offset: i64,
    pub total: i64,
    pub users: Vec<User>,
}

/// Infrastructure visible to the current team.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Infrastructure {
    pub host_count: i64,
    pub container_count: i64,
    pub unresolved_events: i64,
    pub orchestrations: Vec<serde_json::Value>,
    pub platforms: Vec<serde_json::Value>,
    pub container_types: Vec<serde_json::Value>,
    pub metric_count: InfrastructureMetricCount,
    pub on_prem_overview: OnPremOverview,
    pub agent_metric_overview: InfrastructureAgentMetricOverview,
}

/// Metric totals by source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InfrastructureMetricCount {
    pub total: i64,
    pub jmx: i64,
    #[serde(rename = "statsD")]
    pub statsd: i64,
    #[serde(rename = "appCheck")]
    pub app_check: i64,
}

/// How many agents exceed their metric limits.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct InfrastructureAgentMetricOverview {
    pub exceeding_limit_count: i64,
    pub total_agents: i64,
    pub exceeding_limit_pct: f64,
}

/// On-premises version information.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct OnPremOverview {
    pub latest_version: String,
    pub customer_version: String,
    pub show_plan_info: bool,
}

#[derive(Default, Deserialize)]
struct TeamResponse {
    #[serde(default)]
    team: Team,
}

#[derive(Default, Deserialize)]
struct ListTeamsResponse {
    #[serde(default)]
    teams: Vec<Team>,
}

#[derive(Default, Deserialize)]
struct InfrastructureResponse {
    #[serde(default)]
    infrastructure: Infrastructure,
}

#[derive(Serialize)]
struct ListTeamsQuery {
    product: ProductType,
}

/// Team endpoints.
#[derive(Debug, Clone, Copy)]
pub struct TeamsService<'a> {
    client: &'a Client,
}

impl<'a> TeamsService<'a> {
    pub(crate) fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// Get a team by id.
    pub async fn get(&self, ctx: &Context, team_id: i64) -> Result<Team> {
        let request = self
            .client
            .new_request(Method::GET, &format!("api/team/{team_id}"))?;
        let (body, _) = self.client.decode::<TeamResponse>(ctx, request).await?;
        Ok(body.team)
    }

    /// List teams of a product.
    pub async fn list(&self, ctx: &Context, product: ProductType) -> Result<Vec<Team>> {
        let path = with_query("api/team", &ListTeamsQuery { product })?;
        let request = self.client.new_request(Method::GET, &path)?;
        let (body, _) = self.client.decode::<ListTeamsResponse>(ctx, request).await?;
        Ok(body.teams)
    }

    /// Members of a team.
    pub async fn list_users(&self, ctx: &Context, team_id: i64) -> Result<TeamUsers> {
        let request = self
            .client
            .new_request(Method::GET, &format!("api/team/{team_id}/users"))?;
        let (body, _) = self.client.decode(ctx, request).await?;
        Ok(body)
    }

    /// Delete a team.
    pub async fn delete(&self, ctx: &Context, team_id: i64) -> Result<()> {
        let request = self
            .client
            .new_request(Method::DELETE, &format!("api/team/{team_id}"))?;
        self.client.send(ctx, request).await?;
        Ok(())
    }

    /// Infrastructure visible to the current team.
    pub async fn infrastructure(&self, ctx: &Context) -> Result<Infrastructure> {
        let request = self
            .client
            .new_request(Method::GET, "api/team/infrastructure")?;
        let (body, _) = self
            .client
            .decode::<InfrastructureResponse>(ctx, request)
            .await?;
        Ok(body.infrastructure)
    }
}
