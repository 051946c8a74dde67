//! Outbound notification delivery.
//!
//! The sweep hands each message to a [`Notifier`]; retries, rate limiting and
//! the actual mail transport belong to the implementation.
//!
//! - [`LogNotifier`] writes the message to the log. Useful in development.
//! - [`WebhookNotifier`] posts the message as JSON to a mail relay.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use tracing::info;

use crate::config::NotifierConfig;
use crate::errors::{PortalError, PortalResult};
use crate::models::{Client, License};

/// Template the mail relay renders for expiration notices.
pub const LICENSE_NOTIFICATION_TEMPLATE: &str = "licenses/license_notification.html";

/// Values available to the notification template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NotificationContext {
    pub client: Client,
    pub licenses: Vec<License>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NotificationMessage {
    pub recipients: Vec<String>,
    pub subject: String,
    pub template: String,
    pub context: NotificationContext,
}

impl NotificationMessage {
    /// Expiration notice for `client` listing the licenses that triggered it.
    pub fn license_expiration(client: &Client, licenses: Vec<License>) -> Self {
        Self {
            recipients: vec![client.notification_email().to_string()],
            subject: format!("{client} has expiring licenses!"),
            template: LICENSE_NOTIFICATION_TEMPLATE.to_string(),
            context: NotificationContext {
                client: client.clone(),
                licenses,
            },
        }
    }
}

#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver one message. `Ok` means the transport accepted it.
    async fn send_notification(&self, message: &NotificationMessage) -> PortalResult<()>;
}

/// Writes messages to the log instead of sending them.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send_notification(&self, message: &NotificationMessage) -> PortalResult<()> {
        info!(
            recipients = ?message.recipients,
            subject = %message.subject,
            template = %message.template,
            licenses = message.context.licenses.len(),
            "Notification logged (not delivered)"
        );
        Ok(())
    }
}

/// Posts messages to an HTTP mail relay.
#[derive(Debug, Clone)]
pub struct WebhookNotifier {
    http: reqwest::Client,
    url: String,
}

impl WebhookNotifier {
    pub fn new(url: impl Into<String>, timeout: Duration) -> PortalResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| PortalError::NotifierError(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            url: url.into(),
        })
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn send_notification(&self, message: &NotificationMessage) -> PortalResult<()> {
        let response = self
            .http
            .post(&self.url)
            .json(message)
            .send()
            .await
            .map_err(|e| PortalError::NotifierError(format!("mail relay unreachable: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(PortalError::NotifierError(format!(
                "mail relay rejected message with status {status}"
            )));
        }

        Ok(())
    }
}

/// Build the notifier selected by `notifier.kind`.
pub fn notifier_from_config(config: &NotifierConfig) -> PortalResult<Arc<dyn Notifier>> {
    match config.kind.as_str() {
        "log" => Ok(Arc::new(LogNotifier)),
        "webhook" => Ok(Arc::new(WebhookNotifier::new(
            config.webhook_url.clone(),
            Duration::from_secs(config.timeout_secs),
        )?)),
        other => Err(PortalError::ConfigError(format!(
            "unsupported notifier kind: {other}"
        ))),
    }
}
