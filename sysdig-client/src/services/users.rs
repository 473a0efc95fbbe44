//! User endpoints.

use http::Method;
use serde::{Deserialize, Serialize};

use crate::{Client, Context, MilliTime, Result};

/// A Sysdig user.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    pub username: String,
    pub name: String,
    pub first_name: String,
    pub last_name: String,
    pub system_role: String,
    pub status: String,
    pub enabled: bool,
    pub version: i64,
    pub timezone: String,
    pub picture_url: String,
    pub terms_and_conditions: bool,
    pub oauth: bool,
    pub reset_password: bool,
    pub access_key: String,
    pub current_team: i64,
    pub products: Vec<String>,
    pub team_roles: Vec<TeamRole>,
    pub additional_roles: Vec<serde_json::Value>,
    pub customer: Customer,
    pub customer_settings: serde_json::Value,
    pub agent_install_params: AgentInstallParams,
    pub properties: UserProperties,
    pub date_created: MilliTime,
    pub last_updated: MilliTime,
    pub last_seen: i64,
}

/// Per-user properties.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserProperties {
    #[serde(rename = "resetPassword")]
    pub reset_password: bool,
    #[serde(rename = "OpenID Connect profile id")]
    pub openid_connect_profile_id: String,
    #[serde(rename = "iamId")]
    pub iam_id: String,
    pub openid: bool,
    pub user_email_alias: String,
    pub has_been_invited: bool,
}

/// Settings for installing an agent that reports to this account.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AgentInstallParams {
    pub access_key: String,
    pub collector_address: String,
    pub collector_port: u16,
    pub check_certificate: bool,
    pub ssl_enabled: bool,
}

/// The account a user belongs to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Customer {
    pub id: i64,
    pub name: String,
    pub access_key: String,
    pub external_id: String,
    pub date_created: MilliTime,
}

/// A user's role in one team.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TeamRole {
    pub team_id: i64,
    pub team_name: String,
    pub team_theme: String,
    pub user_id: i64,
    pub user_name: String,
    pub role: String,
    pub admin: bool,
}

/// Agents currently connected to the account.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectedAgents {
    pub total: i64,
    pub agents: Vec<Agent>,
}

/// A connected agent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Agent {
    pub id: String,
}

#[derive(Default, Deserialize)]
struct MeResponse {
    #[serde(default)]
    user: User,
}

#[derive(Default, Deserialize)]
struct TokenResponse {
    #[serde(default)]
    token: Token,
}

#[derive(Default, Deserialize)]
struct Token {
    #[serde(default)]
    key: String,
}

/// User endpoints.
#[derive(Debug, Clone, Copy)]
pub struct UsersService<'a> {
    client: &'a Client,
}

impl<'a> UsersService<'a> {
    pub(crate) fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// The user the credentials belong to.
    pub async fn me(&self, ctx: &Context) -> Result<User> {
        let request = self.client.new_request(Method::GET, "api/user/me")?;
        let (body, _) = self.client.decode::<MeResponse>(ctx, request).await?;
        Ok(body.user)
    }

    /// The current user's Sysdig API token.
    pub async fn token(&self, ctx: &Context) -> Result<String> {
        let request = self.client.new_request(Method::GET, "api/token")?;
        let (body, _) = self.client.decode::<TokenResponse>(ctx, request).await?;
        Ok(body.token.key)
    }

    /// Agents currently connected to the account.
    pub async fn connected_agents(&self, ctx: &Context) -> Result<ConnectedAgents> {
        let request = self.client.new_request(Method::GET, "api/agents/connected")?;
        let (body, _) = self.client.decode(ctx, request).await?;
        Ok(body)
    }
}
