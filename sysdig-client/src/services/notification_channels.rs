//! Notification channel endpoints.

use http::Method;
use serde::{Deserialize, Serialize};

use super::{path_segment, with_query};
use crate::{Client, Context, MilliTime, Result};

/// Where notifications are delivered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationChannelType {
    #[default]
    Email,
    Sns,
    PagerDuty,
    Slack,
    #[serde(rename = "OPSGENIE")]
    OpsGenie,
    #[serde(rename = "VICTOROPS")]
    VictorOps,
    Webhook,
}

/// A notification channel.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NotificationChannel {
    #[serde(rename = "type")]
    pub channel_type: NotificationChannelType,
    pub name: String,
    pub enabled: bool,
    pub options: NotificationChannelOptions,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_on: Option<MilliTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modified_on: Option<MilliTime>,
}

/// Channel settings. Which fields apply depends on the channel type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NotificationChannelOptions {
    #[serde(rename = "notifyOnOk")]
    pub notify_on_ok: bool,
    pub notify_on_resolve: bool,
    #[serde(rename = "resolveOnOk")]
    pub resolve_on_ok: bool,
    pub channel: String,
    pub email_recipients: Vec<String>,
    pub url: String,
    pub api_key: String,
    pub routing_key: String,
    pub account: String,
    pub service_key: String,
    pub service_name: String,
}

#[derive(Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NotificationChannelResponse {
    #[serde(default)]
    notification_channel: NotificationChannel,
}

#[derive(Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListNotificationChannelsResponse {
    #[serde(default)]
    notification_channels: Vec<NotificationChannel>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct NotificationChannelEnvelope<'a> {
    notification_channel: &'a NotificationChannel,
}

#[derive(Serialize)]
struct ListQuery {
    from: MilliTime,
    to: MilliTime,
}

/// Notification channel endpoints.
#[derive(Debug, Clone, Copy)]
pub struct NotificationChannelsService<'a> {
    client: &'a Client,
}

impl<'a> NotificationChannelsService<'a> {
    pub(crate) fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// Get a channel by id.
    pub async fn get(&self, ctx: &Context, channel_id: &str) -> Result<NotificationChannel> {
        let request = self.client.new_request(
            Method::GET,
            &format!("api/notificationChannels/{}", path_segment(channel_id)?),
        )?;
        let (body, _) = self
            .client
            .decode::<NotificationChannelResponse>(ctx, request)
            .await?;
        Ok(body.notification_channel)
    }

    /// List channels modified within `[from, to]`.
    pub async fn list(
        &self,
        ctx: &Context,
        from: MilliTime,
        to: MilliTime,
    ) -> Result<Vec<NotificationChannel>> {
        let path = with_query("api/notificationChannels", &ListQuery { from, to })?;
        let request = self.client.new_request(Method::GET, &path)?;
        let (body, _) = self
            .client
            .decode::<ListNotificationChannelsResponse>(ctx, request)
            .await?;
        Ok(body.notification_channels)
    }

    /// Create an enabled channel.
    pub async fn create(
        &self,
        ctx: &Context,
        channel_type: NotificationChannelType,
        name: impl Into<String>,
        options: NotificationChannelOptions,
    ) -> Result<NotificationChannel> {
        let channel = NotificationChannel {
            channel_type,
            name: name.into(),
            enabled: true,
            options,
            ..NotificationChannel::default()
        };
        let request = self.client.new_json_request(
            Method::POST,
            "api/notificationChannels",
            &NotificationChannelEnvelope {
                notification_channel: &channel,
            },
        )?;
        let (body, _) = self
            .client
            .decode::<NotificationChannelResponse>(ctx, request)
            .await?;
        Ok(body.notification_channel)
    }

    /// Delete a channel.
    pub async fn delete(&self, ctx: &Context, channel_id: &str) -> Result<()> {
        let request = self.client.new_request(
            Method::DELETE,
            &format!("api/notificationChannels/{}", path_segment(channel_id)?),
        )?;
        self.client.send(ctx, request).await?;
        Ok(())
    }
}
