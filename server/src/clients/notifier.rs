use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Confirmation,
    Waitlist,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub booking_id: Uuid,
    pub kind: NotificationKind,
    pub email: String,
    pub reference_code: String,
    pub event_title: String,
}

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("notification transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("notification endpoint returned status {0}")]
    Status(u16),
}

#[async_trait]
pub trait NotificationSender: Send + Sync {
    async fn send(&self, notification: &Notification) -> Result<(), NotifyError>;
}

/// Fire-and-forget dispatch. The outcome is only logged.
pub fn dispatch(sender: Arc<dyn NotificationSender>, notification: Notification) {
    tokio::spawn(async move {
        match sender.send(&notification).await {
            Ok(()) => tracing::debug!(
                booking_id = %notification.booking_id,
                kind = ?notification.kind,
                "Notification sent"
            ),
            Err(e) => tracing::warn!(
                booking_id = %notification.booking_id,
                kind = ?notification.kind,
                error = %e,
                "Notification failed"
            ),
        }
    });
}

pub struct HttpNotifier {
    client: reqwest::Client,
    url: String,
}

impl HttpNotifier {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, NotifyError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl NotificationSender for HttpNotifier {
    async fn send(&self, notification: &Notification) -> Result<(), NotifyError> {
        let response = self.client.post(&self.url).json(notification).send().await?;
        if !response.status().is_success() {
            return Err(NotifyError::Status(response.status().as_u16()));
        }
        Ok(())
    }
}

/// Used when no notification endpoint is configured.
pub struct LogNotifier;

#[async_trait]
impl NotificationSender for LogNotifier {
    async fn send(&self, notification: &Notification) -> Result<(), NotifyError> {
        tracing::info!(
            booking_id = %notification.booking_id,
            kind = ?notification.kind,
            email = %notification.email,
            reference = %notification.reference_code,
            "Notification (log only)"
        );
        Ok(())
    }
}
