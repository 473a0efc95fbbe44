//! Resource services.
//!
//! Each service borrows the [`Client`](crate::Client), builds a request for
//! one endpoint, and decodes the typed response through the shared pipeline.

mod alerts;
mod dashboards;
mod events;
mod notification_channels;
mod prometheus;
mod teams;
mod users;

pub use alerts::{Alert, AlertCriteria, AlertCustomNotification, AlertType, AlertsService};
pub use dashboards::{
    Dashboard, DashboardTransferResult, DashboardsService, EventDisplayQuery,
    EventDisplaySettings, Layout, Panel, ScopeExpression, SharingSetting, SharingSettingMember,
};
pub use events::{
    AlertStatus, CreateEventRequest, Direction, Event, EventCategory, EventsService,
    ListEventsOptions, ListEventsResponse, Severity,
};
pub use notification_channels::{
    NotificationChannel, NotificationChannelOptions, NotificationChannelType,
    NotificationChannelsService,
};
pub use prometheus::{PrometheusAlert, PrometheusService, QueryRange, QueryResult, ResultType};
pub use teams::{
    Infrastructure, InfrastructureAgentMetricOverview, InfrastructureMetricCount,
    OnPremOverview, ProductType, Team, TeamEntryPoint, TeamUsers, TeamsService,
};
pub use users::{
    Agent, AgentInstallParams, ConnectedAgents, Customer, TeamRole, User, UserProperties,
    UsersService,
};

use std::borrow::Cow;

use serde::Serialize;

use crate::{ClientError, Result};

/// Append `query` to `path` as a URL query string.
pub(crate) fn with_query<Q: Serialize>(path: &str, query: &Q) -> Result<String> {
    let encoded = serde_urlencoded::to_string(query)
        .map_err(|e| ClientError::RequestBuild(format!("failed to encode query: {e}")))?;
    if encoded.is_empty() {
        Ok(path.to_string())
    } else {
        Ok(format!("{path}?{encoded}"))
    }
}

/// Percent-encode `id` for use as a single path segment.
///
/// Ids that would resolve to another path (empty, `.` or `..`) are rejected.
pub(crate) fn path_segment(id: &str) -> Result<Cow<'_, str>> {
    match id {
        "" | "." | ".." => Err(ClientError::InvalidArgument(format!(
            "{id:?} is not a valid resource id"
        ))),
        _ => Ok(urlencoding::encode(id)),
    }
}
