use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Waitlisted,
    Cancelled,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Waitlisted => "waitlisted",
            BookingStatus::Cancelled => "cancelled",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Completed,
    Failed,
    Refunded,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Completed => "completed",
            PaymentStatus::Failed => "failed",
            PaymentStatus::Refunded => "refunded",
        }
    }
}

/// Where a booking stands with respect to its seat decrement in the Event
/// Directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeatSync {
    /// Waitlisted bookings never hold seats.
    NotRequired,
    /// Confirmed, but the decrement has not been applied.
    Pending,
    /// A decrement is in flight; whoever claimed it settles it.
    Claimed,
    Applied,
}

impl SeatSync {
    pub fn as_str(&self) -> &'static str {
        match self {
            SeatSync::NotRequired => "not_required",
            SeatSync::Pending => "pending",
            SeatSync::Claimed => "claimed",
            SeatSync::Applied => "applied",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown status '{0}'")]
pub struct UnknownStatus(pub String);

impl FromStr for BookingStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(BookingStatus::Pending),
            "confirmed" => Ok(BookingStatus::Confirmed),
            "waitlisted" => Ok(BookingStatus::Waitlisted),
            "cancelled" => Ok(BookingStatus::Cancelled),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

impl FromStr for PaymentStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(PaymentStatus::Pending),
            "completed" => Ok(PaymentStatus::Completed),
            "failed" => Ok(PaymentStatus::Failed),
            "refunded" => Ok(PaymentStatus::Refunded),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

impl FromStr for SeatSync {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "not_required" => Ok(SeatSync::NotRequired),
            "pending" => Ok(SeatSync::Pending),
            "claimed" => Ok(SeatSync::Claimed),
            "applied" => Ok(SeatSync::Applied),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Copy of the event's display fields taken when the booking is created.
///
/// This is a cache of the Event Directory record. It only changes through an
/// explicit metadata sync, so it can be stale in between.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventSnapshot {
    pub event_id: Uuid,
    pub title: String,
    pub date: DateTime<Utc>,
    pub venue: String,
    pub time: String,
}

impl EventSnapshot {
    /// Second-granularity comparison against `now`.
    pub fn is_past(&self, now: DateTime<Utc>) -> bool {
        self.date.timestamp() < now.timestamp()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub id: Uuid,
    pub reference_code: String,
    pub user_id: Uuid,
    pub user_name: String,
    pub user_email: String,
    pub event: EventSnapshot,
    pub tickets: i32,
    pub price_per_ticket: Decimal,
    pub total_amount: Decimal,
    pub booking_status: BookingStatus,
    pub payment_status: PaymentStatus,
    pub payment_method: String,
    pub seat_sync: SeatSync,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Booking {
    /// `None` when the product does not fit in a `Decimal`.
    pub fn total_for(tickets: i32, price_per_ticket: Decimal) -> Option<Decimal> {
        price_per_ticket.checked_mul(Decimal::from(tickets))
    }

    pub fn is_cancelled(&self) -> bool {
        self.booking_status == BookingStatus::Cancelled
    }

    /// A confirmed booking whose seat decrement never reached the directory.
    pub fn awaiting_seat_sync(&self) -> bool {
        self.booking_status == BookingStatus::Confirmed && self.seat_sync == SeatSync::Pending
    }
}

/// Generates a human-readable reference such as `BK-3F9A1C0D77E2`.
pub fn generate_reference_code() -> String {
    let raw = Uuid::new_v4().simple().to_string().to_uppercase();
    format!("BK-{}", &raw[..12])
}

/// Flat row layout of the `bookings` table.
#[derive(Debug, Clone, FromRow)]
pub struct BookingRow {
    pub id: Uuid,
    pub reference_code: String,
    pub user_id: Uuid,
    pub user_name: String,
    pub user_email: String,
    pub event_id: Uuid,
    pub event_title: String,
    pub event_date: DateTime<Utc>,
    pub event_venue: String,
    pub event_time: String,
    pub tickets: i32,
    pub price_per_ticket: Decimal,
    pub total_amount: Decimal,
    pub booking_status: String,
    pub payment_status: String,
    pub payment_method: String,
    pub seat_sync: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<BookingRow> for Booking {
    type Error = UnknownStatus;

    fn try_from(row: BookingRow) -> Result<Self, Self::Error> {
        Ok(Booking {
            id: row.id,
            reference_code: row.reference_code,
            user_id: row.user_id,
            user_name: row.user_name,
            user_email: row.user_email,
            event: EventSnapshot {
                event_id: row.event_id,
                title: row.event_title,
                date: row.event_date,
                venue: row.event_venue,
                time: row.event_time,
            },
            tickets: row.tickets,
            price_per_ticket: row.price_per_ticket,
            total_amount: row.total_amount,
            booking_status: row.booking_status.parse()?,
            payment_status: row.payment_status.parse()?,
            payment_method: row.payment_method,
            seat_sync: row.seat_sync.parse()?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}
