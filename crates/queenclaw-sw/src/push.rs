//! Push payloads and the notification surface.

use async_trait::async_trait;
use queenclaw_common::{QueenClawError, Result};
use serde::Deserialize;
use serde_json::Value;
use tokio::sync::mpsc;

use crate::config::NotificationConfig;

/// Wire schema of an inbound push message.
///
/// `{ "title": ..., "body": ..., "tag"?: ..., "data"?: { "url"?: ..., ... } }`
#[derive(Debug, Clone, Deserialize)]
pub struct PushPayload {
    /// Display title.
    pub title: String,

    /// Body text.
    pub body: String,

    /// Grouping tag.
    #[serde(default)]
    pub tag: Option<String>,

    /// Opaque routing payload.
    #[serde(default)]
    pub data: Option<Value>,
}

impl PushPayload {
    /// Parse a push message body.
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        serde_json::from_slice(bytes)
            .map_err(|e| QueenClawError::push_with_source("unparseable push payload", e))
    }

    /// Build the notification this payload asks for, filling defaults from
    /// configuration.
    pub fn into_notification(self, defaults: &NotificationConfig) -> Notification {
        Notification {
            title: self.title,
            body: self.body,
            tag: self.tag.unwrap_or_else(|| defaults.default_tag.clone()),
            icon: defaults.icon.clone(),
            badge: defaults.badge.clone(),
            require_interaction: false,
            data: self.data.unwrap_or_else(|| Value::Object(Default::default())),
        }
    }
}

/// An OS-level notification intent.
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    /// Display title.
    pub title: String,

    /// Body text.
    pub body: String,

    /// Grouping tag.
    pub tag: String,

    /// Icon asset path.
    pub icon: String,

    /// Badge asset path.
    pub badge: String,

    /// Whether the notification stays until dismissed.
    pub require_interaction: bool,

    /// Opaque routing data, surfaced again on click.
    pub data: Value,
}

/// A user click on a displayed notification.
#[derive(Debug, Clone)]
pub struct NotificationClick {
    /// Tag of the clicked notification.
    pub tag: String,

    /// Routing data the notification carried.
    pub data: Value,
}

impl NotificationClick {
    /// Extract the routing target, defaulting to the root path.
    pub fn target(&self) -> &str {
        self.data
            .get("url")
            .and_then(Value::as_str)
            .unwrap_or("/")
    }
}

/// Display surface for notifications.
#[async_trait]
pub trait NotificationHost: Send + Sync + 'static {
    /// Display a notification.
    async fn show(&self, notification: Notification) -> Result<()>;

    /// Close a displayed notification by tag.
    async fn close(&self, tag: &str) -> Result<()>;
}

/// Notification surface events observed by the embedder.
#[derive(Debug, Clone, PartialEq)]
pub enum NotificationEvent {
    /// A notification was displayed.
    Shown(Notification),
    /// A notification was closed.
    Closed(String),
}

/// Host that forwards intents to the embedder over a channel.
pub struct ChannelNotificationHost {
    tx: mpsc::UnboundedSender<NotificationEvent>,
}

impl ChannelNotificationHost {
    /// Create a host and the receiver the embedder drains.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<NotificationEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

#[async_trait]
impl NotificationHost for ChannelNotificationHost {
    async fn show(&self, notification: Notification) -> Result<()> {
        self.tx
            .send(NotificationEvent::Shown(notification))
            .map_err(|_| QueenClawError::push("notification surface closed"))
    }

    async fn close(&self, tag: &str) -> Result<()> {
        self.tx
            .send(NotificationEvent::Closed(tag.to_string()))
            .map_err(|_| QueenClawError::push("notification surface closed"))
    }
}
