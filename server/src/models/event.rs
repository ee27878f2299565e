use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::booking::EventSnapshot;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventStatus {
    Draft,
    Published,
    Cancelled,
    Completed,
    #[serde(other)]
    Unknown,
}

/// Event record as served by the Event Directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    #[serde(alias = "_id")]
    pub id: Uuid,
    pub title: String,
    pub status: EventStatus,
    pub date: DateTime<Utc>,
    #[serde(default)]
    pub venue: String,
    #[serde(default)]
    pub time: String,
    #[serde(default)]
    pub capacity: i32,
    pub available_seats: i32,
    pub price: Decimal,
}

impl Event {
    pub fn is_cancelled(&self) -> bool {
        self.status == EventStatus::Cancelled
    }

    /// Second-granularity comparison against `now`.
    pub fn is_past(&self, now: DateTime<Utc>) -> bool {
        self.date.timestamp() < now.timestamp()
    }

    pub fn snapshot(&self) -> EventSnapshot {
        EventSnapshot {
            event_id: self.id,
            title: self.title.clone(),
            date: self.date,
            venue: self.venue.clone(),
            time: self.time.clone(),
        }
    }
}

/// Display fields pushed to bookings when an event is edited.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventMetadata {
    pub title: String,
    pub date: DateTime<Utc>,
    pub venue: String,
    pub time: String,
}
