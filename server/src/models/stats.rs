use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

/// Totals over the non-cancelled bookings of one event.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventBookingStats {
    pub event_id: Uuid,
    pub bookings: i64,
    pub tickets: i64,
    pub revenue: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WaitlistBreakdown {
    pub event_id: Uuid,
    pub event_title: String,
    pub bookings: i64,
    pub tickets: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingAnalytics {
    pub total_bookings: i64,
    pub confirmed: i64,
    pub waitlisted: i64,
    pub cancelled: i64,
    pub pending: i64,
    pub revenue: Decimal,
    pub tickets_sold: i64,
    pub waitlist_by_event: Vec<WaitlistBreakdown>,
}
