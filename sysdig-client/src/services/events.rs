//! Event endpoints.

use http::Method;
use serde::{Deserialize, Serialize, Serializer};
use std::collections::HashMap;

use super::{path_segment, with_query};
use crate::{Client, Context, EventScope, MilliTime, Result};

/// Event severity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    High,
    Medium,
    Low,
    Info,
    #[default]
    None,
}

/// Event source category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EventCategory {
    Alert,
    #[default]
    Custom,
    Docker,
    Containerd,
    Kubernetes,
    /// A category this client does not know about.
    #[serde(other)]
    Unknown,
}

impl EventCategory {
    /// Query string form.
    pub fn as_str(&self) -> &'static str {
        match self {
            EventCategory::Alert => "ALERT",
            EventCategory::Custom => "CUSTOM",
            EventCategory::Docker => "DOCKER",
            EventCategory::Containerd => "CONTAINERD",
            EventCategory::Kubernetes => "KUBERNETES",
            EventCategory::Unknown => "UNKNOWN",
        }
    }
}

/// Alert event state used to filter listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertStatus {
    Triggered,
    Resolved,
    Acknowledged,
    Unacknowledged,
}

/// Paging direction relative to the pivot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Before,
    After,
}

/// A Sysdig event.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Event {
    pub id: String,
    pub version: i64,
    pub name: String,
    pub description: String,
    pub severity: Severity,
    pub scope: String,
    pub timestamp: MilliTime,
    pub created_on: MilliTime,
    pub scope_labels: HashMap<String, String>,
    pub tags: HashMap<String, String>,
    #[serde(rename = "type")]
    pub category: EventCategory,
}

/// A new custom event.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CreateEventRequest {
    pub name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,
    /// When the event happened. The server uses the receive time when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<MilliTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub severity: Option<Severity>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<EventScope>,
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    pub tags: HashMap<String, String>,
}

impl CreateEventRequest {
    /// An event with just a name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

/// Filters for listing events.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListEventsOptions {
    pub filter: Option<String>,
    pub alert_status: Option<AlertStatus>,
    pub categories: Vec<EventCategory>,
    pub direction: Option<Direction>,
    pub scope: Option<String>,
    pub limit: Option<u32>,
    pub pivot: Option<String>,
    pub from: Option<MilliTime>,
    pub to: Option<MilliTime>,
    pub include_total: bool,
}

/// A page of events.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ListEventsResponse {
    pub total: i64,
    pub matched: i64,
    pub events: Vec<Event>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ListEventsQuery<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    filter: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    alert_status: Option<AlertStatus>,
    #[serde(
        rename = "category",
        skip_serializing_if = "no_categories",
        serialize_with = "comma_joined"
    )]
    categories: &'a [EventCategory],
    #[serde(rename = "dir", skip_serializing_if = "Option::is_none")]
    direction: Option<Direction>,
    feed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    limit: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pivot: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    from: Option<MilliTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    to: Option<MilliTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    scope: Option<&'a str>,
    #[serde(rename = "include_pivot")]
    include_pivot: bool,
    #[serde(rename = "include_total")]
    include_total: bool,
}

impl<'a> From<&'a ListEventsOptions> for ListEventsQuery<'a> {
    fn from(options: &'a ListEventsOptions) -> Self {
        Self {
            filter: options.filter.as_deref(),
            alert_status: options.alert_status,
            categories: &options.categories,
            direction: options.direction,
            feed: true,
            limit: options.limit,
            pivot: options.pivot.as_deref(),
            from: options.from,
            to: options.to,
            scope: options.scope.as_deref(),
            include_pivot: true,
            include_total: options.include_total,
        }
    }
}

fn no_categories(categories: &&[EventCategory]) -> bool {
    categories.is_empty()
}

fn comma_joined<S>(
    categories: &&[EventCategory],
    serializer: S,
) -> std::result::Result<S::Ok, S::Error>
where
    S: Serializer,
{
    let joined = categories
        .iter()
        .map(EventCategory::as_str)
        .collect::<Vec<_>>()
        .join(",");
    serializer.serialize_str(&joined)
}

#[derive(Default, Deserialize)]
struct EventResponse {
    #[serde(default)]
    event: Event,
}

#[derive(Serialize)]
struct EventEnvelope<'a> {
    event: &'a CreateEventRequest,
}

/// Event endpoints.
#[derive(Debug, Clone, Copy)]
pub struct EventsService<'a> {
    client: &'a Client,
}

impl<'a> EventsService<'a> {
    pub(crate) fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// List events matching `options`.
    pub async fn list(
        &self,
        ctx: &Context,
        options: &ListEventsOptions,
    ) -> Result<ListEventsResponse> {
        let path = with_query("v2/events", &ListEventsQuery::from(options))?;
        let request = self.client.new_request(Method::GET, &path)?;
        let (body, _) = self.client.decode(ctx, request).await?;
        Ok(body)
    }

    /// Get an event by id.
    pub async fn get(&self, ctx: &Context, event_id: &str) -> Result<Event> {
        let request = self
            .client
            .new_request(Method::GET, &format!("v2/events/{}", path_segment(event_id)?))?;
        let (body, _) = self.client.decode::<EventResponse>(ctx, request).await?;
        Ok(body.event)
    }

    /// Delete an event.
    pub async fn delete(&self, ctx: &Context, event_id: &str) -> Result<()> {
        let request = self
            .client
            .new_request(Method::DELETE, &format!("v2/events/{}", path_segment(event_id)?))?;
        self.client.send(ctx, request).await?;
        Ok(())
    }

    /// Create a custom event.
    pub async fn create(&self, ctx: &Context, event: &CreateEventRequest) -> Result<Event> {
        let request =
            self.client
                .new_json_request(Method::POST, "v2/events", &EventEnvelope { event })?;
        let (body, _) = self.client.decode::<EventResponse>(ctx, request).await?;
        Ok(body.event)
    }
}
