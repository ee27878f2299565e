use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use super::{BookingStore, StoreResult};
use crate::models::booking::BookingRow;
use crate::models::{
    Booking, BookingAnalytics, EventBookingStats, EventMetadata, WaitlistBreakdown,
};

const BOOKING_COLUMNS: &str = "id, reference_code, user_id, user_name, user_email, \
    event_id, event_title, event_date, event_venue, event_time, tickets, \
    price_per_ticket, total_amount, booking_status, payment_status, payment_method, \
    seat_sync, created_at, updated_at";

#[derive(FromRow)]
struct StatsRow {
    bookings: i64,
    tickets: i64,
    revenue: Decimal,
}

#[derive(FromRow)]
struct AnalyticsRow {
    total_bookings: i64,
    confirmed: i64,
    waitlisted: i64,
    cancelled: i64,
    pending: i64,
    revenue: Decimal,
    tickets_sold: i64,
}

#[derive(FromRow)]
struct WaitlistRow {
    event_id: Uuid,
    event_title: String,
    bookings: i64,
    tickets: i64,
}

#[derive(Clone)]
pub struct PgBookingStore {
    pool: PgPool,
}

impl PgBookingStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn decode(row: BookingRow) -> StoreResult<Booking> {
        Booking::try_from(row).map_err(|e| sqlx::Error::Decode(Box::new(e)))
    }

    fn decode_all(rows: Vec<BookingRow>) -> StoreResult<Vec<Booking>> {
        rows.into_iter().map(Self::decode).collect()
    }
}

#[async_trait]
impl BookingStore for PgBookingStore {
    async fn insert(&self, booking: &Booking) -> StoreResult<bool> {
        let result = sqlx::query(
            "INSERT INTO bookings (id, reference_code, user_id, user_name, user_email, \
             event_id, event_title, event_date, event_venue, event_time, tickets, \
             price_per_ticket, total_amount, booking_status, payment_status, payment_method, \
             seat_sync, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19) \
             ON CONFLICT (reference_code) DO NOTHING",
        )
        .bind(booking.id)
        .bind(&booking.reference_code)
        .bind(booking.user_id)
        .bind(&booking.user_name)
        .bind(&booking.user_email)
        .bind(booking.event.event_id)
        .bind(&booking.event.title)
        .bind(booking.event.date)
        .bind(&booking.event.venue)
        .bind(&booking.event.time)
        .bind(booking.tickets)
        .bind(booking.price_per_ticket)
        .bind(booking.total_amount)
        .bind(booking.booking_status.as_str())
        .bind(booking.payment_status.as_str())
        .bind(&booking.payment_method)
        .bind(booking.seat_sync.as_str())
        .bind(booking.created_at)
        .bind(booking.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<Booking>> {
        let row = sqlx::query_as::<_, BookingRow>(&format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(Self::decode).transpose()
    }

    async fn find_by_reference(&self, reference_code: &str) -> StoreResult<Option<Booking>> {
        let row = sqlx::query_as::<_, BookingRow>(&format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings WHERE reference_code = $1"
        ))
        .bind(reference_code)
        .fetch_optional(&self.pool)
        .await?;
        row.map(Self::decode).transpose()
    }

    async fn list_for_user(&self, user_id: Uuid) -> StoreResult<Vec<Booking>> {
        let rows = sqlx::query_as::<_, BookingRow>(&format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings WHERE user_id = $1 ORDER BY created_at DESC"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Self::decode_all(rows)
    }

    async fn list_for_event(&self, event_id: Uuid) -> StoreResult<Vec<Booking>> {
        let rows = sqlx::query_as::<_, BookingRow>(&format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings WHERE event_id = $1 ORDER BY created_at DESC"
        ))
        .bind(event_id)
        .fetch_all(&self.pool)
        .await?;
        Self::decode_all(rows)
    }

    async fn has_active_booking(&self, user_id: Uuid, event_id: Uuid) -> StoreResult<bool> {
        let (exists,): (bool,) = sqlx::query_as(
            "SELECT EXISTS (SELECT 1 FROM bookings WHERE user_id = $1 AND event_id = $2 \
             AND booking_status <> 'cancelled')",
        )
        .bind(user_id)
        .bind(event_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    async fn claim_seat_sync(&self, id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query(
            "UPDATE bookings SET seat_sync = 'claimed', updated_at = NOW() \
             WHERE id = $1 AND booking_status = 'confirmed' AND seat_sync = 'pending'",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn settle_seat_claim(&self, id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query(
            "UPDATE bookings SET seat_sync = 'applied', updated_at = NOW() \
             WHERE id = $1 AND booking_status <> 'cancelled' AND seat_sync = 'claimed'",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn release_seat_claim(&self, id: Uuid) -> StoreResult<()> {
        sqlx::query(
            "UPDATE bookings SET seat_sync = 'pending', updated_at = NOW() \
             WHERE id = $1 AND seat_sync = 'claimed'",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn cancel(&self, id: Uuid, refund: bool) -> StoreResult<Option<Booking>> {
        // The status guard keeps a concurrent second cancel from refunding twice.
        let row = sqlx::query_as::<_, BookingRow>(&format!(
            "UPDATE bookings SET booking_status = 'cancelled', \
             payment_status = CASE WHEN $2 THEN 'refunded' ELSE payment_status END, \
             updated_at = NOW() \
             WHERE id = $1 AND booking_status <> 'cancelled' \
             RETURNING {BOOKING_COLUMNS}"
        ))
        .bind(id)
        .bind(refund)
        .fetch_optional(&self.pool)
        .await?;
        row.map(Self::decode).transpose()
    }

    async fn cancel_all_for_event(&self, event_id: Uuid) -> StoreResult<u64> {
        let result = sqlx::query(
            "UPDATE bookings SET booking_status = 'cancelled', updated_at = NOW() \
             WHERE event_id = $1 AND booking_status <> 'cancelled'",
        )
        .bind(event_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    async fn sync_event_metadata(
        &self,
        event_id: Uuid,
        metadata: &EventMetadata,
    ) -> StoreResult<u64> {
        let result = sqlx::query(
            "UPDATE bookings SET event_title = $2, event_date = $3, event_venue = $4, \
             event_time = $5, updated_at = NOW() WHERE event_id = $1",
        )
        .bind(event_id)
        .bind(&metadata.title)
        .bind(metadata.date)
        .bind(&metadata.venue)
        .bind(&metadata.time)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    async fn event_stats(&self, event_id: Uuid) -> StoreResult<EventBookingStats> {
        let row = sqlx::query_as::<_, StatsRow>(
            "SELECT COUNT(*)::BIGINT AS bookings, \
             COALESCE(SUM(tickets), 0)::BIGINT AS tickets, \
             COALESCE(SUM(total_amount) FILTER (WHERE booking_status = 'confirmed'), 0) AS revenue \
             FROM bookings WHERE event_id = $1 AND booking_status <> 'cancelled'",
        )
        .bind(event_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(EventBookingStats {
            event_id,
            bookings: row.bookings,
            tickets: row.tickets,
            revenue: row.revenue,
        })
    }

    async fn analytics(&self) -> StoreResult<BookingAnalytics> {
        let totals = sqlx::query_as::<_, AnalyticsRow>(
            "SELECT COUNT(*)::BIGINT AS total_bookings, \
             COUNT(*) FILTER (WHERE booking_status = 'confirmed')::BIGINT AS confirmed, \
             COUNT(*) FILTER (WHERE booking_status = 'waitlisted')::BIGINT AS waitlisted, \
             COUNT(*) FILTER (WHERE booking_status = 'cancelled')::BIGINT AS cancelled, \
             COUNT(*) FILTER (WHERE booking_status = 'pending')::BIGINT AS pending, \
             COALESCE(SUM(total_amount) FILTER (WHERE booking_status = 'confirmed'), 0) AS revenue, \
             COALESCE(SUM(tickets) FILTER (WHERE booking_status = 'confirmed'), 0)::BIGINT AS tickets_sold \
             FROM bookings",
        )
        .fetch_one(&self.pool)
        .await?;

        let waitlists = sqlx::query_as::<_, WaitlistRow>(
            "SELECT event_id, MAX(event_title) AS event_title, COUNT(*)::BIGINT AS bookings, \
             COALESCE(SUM(tickets), 0)::BIGINT AS tickets \
             FROM bookings WHERE booking_status = 'waitlisted' \
             GROUP BY event_id ORDER BY 4 DESC",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(BookingAnalytics {
            total_bookings: totals.total_bookings,
            confirmed: totals.confirmed,
            waitlisted: totals.waitlisted,
            cancelled: totals.cancelled,
            pending: totals.pending,
            revenue: totals.revenue,
            tickets_sold: totals.tickets_sold,
            waitlist_by_event: waitlists
                .into_iter()
                .map(|row| WaitlistBreakdown {
                    event_id: row.event_id,
                    event_title: row.event_title,
                    bookings: row.bookings,
                    tickets: row.tickets,
                })
                .collect(),
        })
    }

    async fn list_awaiting_seat_sync(&self) -> StoreResult<Vec<Booking>> {
        let rows = sqlx::query_as::<_, BookingRow>(&format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings \
             WHERE booking_status = 'confirmed' AND seat_sync = 'pending' ORDER BY created_at"
        ))
        .fetch_all(&self.pool)
        .await?;
        Self::decode_all(rows)
    }
}
