use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::models::Event;

#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("event not found")]
    NotFound,

    #[error("event directory timed out")]
    Timeout,

    #[error("event directory returned status {0}")]
    Status(u16),

    #[error("event directory transport error: {0}")]
    Transport(String),

    #[error("event directory returned an unreadable body: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for DirectoryError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            DirectoryError::Timeout
        } else if err.is_decode() {
            DirectoryError::Decode(err.to_string())
        } else {
            DirectoryError::Transport(err.to_string())
        }
    }
}

/// Authoritative owner of events and their seat counts.
#[async_trait]
pub trait EventDirectory: Send + Sync {
    async fn get_event(&self, event_id: Uuid) -> Result<Event, DirectoryError>;

    /// Atomically adds `delta` (negative to take seats) to `availableSeats`
    /// and returns the new value.
    ///
    /// The directory applies each `idempotency_key` at most once, so an
    /// adjustment whose response was lost can be resent safely.
    async fn adjust_seats(
        &self,
        event_id: Uuid,
        delta: i32,
        idempotency_key: &str,
    ) -> Result<i32, DirectoryError>;
}

pub const IDEMPOTENCY_KEY_HEADER: &str = "idempotency-key";

/// Key for taking a booking's seats.
pub fn reserve_key(booking_id: Uuid) -> String {
    format!("booking:{booking_id}:reserve")
}

/// Key for giving a booking's seats back.
pub fn release_key(booking_id: Uuid) -> String {
    format!("booking:{booking_id}:release")
}

#[derive(Serialize)]
struct SeatAdjustment<'a> {
    delta: i32,
    key: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SeatAdjustmentResult {
    available_seats: i32,
}

#[derive(Deserialize)]
struct EventEnvelope {
    event: Event,
}

/// The directory answers either with a bare event or `{"event": {...}}`.
#[derive(Deserialize)]
#[serde(untagged)]
enum EventBody {
    Wrapped(EventEnvelope),
    Bare(Event),
}

#[derive(Clone)]
pub struct HttpEventDirectory {
    client: reqwest::Client,
    base_url: String,
}

impl HttpEventDirectory {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, DirectoryError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn event_url(&self, event_id: Uuid) -> String {
        format!("{}/api/events/{}", self.base_url, event_id)
    }

    fn check_status(status: StatusCode) -> Result<(), DirectoryError> {
        if status == StatusCode::NOT_FOUND {
            Err(DirectoryError::NotFound)
        } else if !status.is_success() {
            Err(DirectoryError::Status(status.as_u16()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl EventDirectory for HttpEventDirectory {
    async fn get_event(&self, event_id: Uuid) -> Result<Event, DirectoryError> {
        let response = self.client.get(self.event_url(event_id)).send().await?;
        Self::check_status(response.status())?;

        match response.json::<EventBody>().await? {
            EventBody::Wrapped(envelope) => Ok(envelope.event),
            EventBody::Bare(event) => Ok(event),
        }
    }

    async fn adjust_seats(
        &self,
        event_id: Uuid,
        delta: i32,
        idempotency_key: &str,
    ) -> Result<i32, DirectoryError> {
        let url = format!("{}/seats", self.event_url(event_id));
        let response = self
            .client
            .patch(url)
            .header(IDEMPOTENCY_KEY_HEADER, idempotency_key)
            .json(&SeatAdjustment {
                delta,
                key: idempotency_key,
            })
            .send()
            .await?;
        Self::check_status(response.status())?;

        let result: SeatAdjustmentResult = response.json().await?;
        tracing::debug!(
            event_id = %event_id,
            delta,
            key = idempotency_key,
            available_seats = result.available_seats,
            "Adjusted event seats"
        );
        Ok(result.available_seats)
    }
}
