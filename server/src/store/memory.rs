use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{BookingStore, StoreResult};
use crate::models::{
    Booking, BookingAnalytics, BookingStatus, EventBookingStats, EventMetadata, PaymentStatus,
    SeatSync, WaitlistBreakdown,
};

/// Process-local store for tests and database-less runs.
#[derive(Default)]
pub struct InMemoryBookingStore {
    bookings: RwLock<HashMap<Uuid, Booking>>,
}

impl InMemoryBookingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.bookings.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.bookings.read().await.is_empty()
    }

    fn newest_first(mut bookings: Vec<Booking>) -> Vec<Booking> {
        bookings.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        bookings
    }
}

#[async_trait]
impl BookingStore for InMemoryBookingStore {
    async fn insert(&self, booking: &Booking) -> StoreResult<bool> {
        let mut bookings = self.bookings.write().await;
        if bookings
            .values()
            .any(|b| b.reference_code == booking.reference_code)
        {
            return Ok(false);
        }
        bookings.insert(booking.id, booking.clone());
        Ok(true)
    }

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<Booking>> {
        Ok(self.bookings.read().await.get(&id).cloned())
    }

    async fn find_by_reference(&self, reference_code: &str) -> StoreResult<Option<Booking>> {
        Ok(self
            .bookings
            .read()
            .await
            .values()
            .find(|b| b.reference_code == reference_code)
            .cloned())
    }

    async fn list_for_user(&self, user_id: Uuid) -> StoreResult<Vec<Booking>> {
        let bookings = self.bookings.read().await;
        let mine = bookings
            .values()
            .filter(|b| b.user_id == user_id)
            .cloned()
            .collect();
        Ok(Self::newest_first(mine))
    }

    async fn list_for_event(&self, event_id: Uuid) -> StoreResult<Vec<Booking>> {
        let bookings = self.bookings.read().await;
        let matching = bookings
            .values()
            .filter(|b| b.event.event_id == event_id)
            .cloned()
            .collect();
        Ok(Self::newest_first(matching))
    }

    async fn has_active_booking(&self, user_id: Uuid, event_id: Uuid) -> StoreResult<bool> {
        Ok(self.bookings.read().await.values().any(|b| {
            b.user_id == user_id && b.event.event_id == event_id && !b.is_cancelled()
        }))
    }

    async fn claim_seat_sync(&self, id: Uuid) -> StoreResult<bool> {
        let mut bookings = self.bookings.write().await;
        match bookings.get_mut(&id) {
            Some(booking) if booking.awaiting_seat_sync() => {
                booking.seat_sync = SeatSync::Claimed;
                booking.updated_at = Utc::now();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn settle_seat_claim(&self, id: Uuid) -> StoreResult<bool> {
        let mut bookings = self.bookings.write().await;
        match bookings.get_mut(&id) {
            Some(booking) if booking.seat_sync == SeatSync::Claimed && !booking.is_cancelled() => {
                booking.seat_sync = SeatSync::Applied;
                booking.updated_at = Utc::now();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn release_seat_claim(&self, id: Uuid) -> StoreResult<()> {
        if let Some(booking) = self.bookings.write().await.get_mut(&id) {
            if booking.seat_sync == SeatSync::Claimed {
                booking.seat_sync = SeatSync::Pending;
                booking.updated_at = Utc::now();
            }
        }
        Ok(())
    }

    async fn cancel(&self, id: Uuid, refund: bool) -> StoreResult<Option<Booking>> {
        let mut bookings = self.bookings.write().await;
        let Some(booking) = bookings.get_mut(&id) else {
            return Ok(None);
        };
        if booking.is_cancelled() {
            return Ok(None);
        }
        booking.booking_status = BookingStatus::Cancelled;
        if refund {
            booking.payment_status = PaymentStatus::Refunded;
        }
        booking.updated_at = Utc::now();
        Ok(Some(booking.clone()))
    }

    async fn cancel_all_for_event(&self, event_id: Uuid) -> StoreResult<u64> {
        let mut bookings = self.bookings.write().await;
        let now = Utc::now();
        let mut count = 0;
        for booking in bookings
            .values_mut()
            .filter(|b| b.event.event_id == event_id && !b.is_cancelled())
        {
            booking.booking_status = BookingStatus::Cancelled;
            booking.updated_at = now;
            count += 1;
        }
        Ok(count)
    }

    async fn sync_event_metadata(
        &self,
        event_id: Uuid,
        metadata: &EventMetadata,
    ) -> StoreResult<u64> {
        let mut bookings = self.bookings.write().await;
        let now = Utc::now();
        let mut count = 0;
        for booking in bookings
            .values_mut()
            .filter(|b| b.event.event_id == event_id)
        {
            booking.event.title = metadata.title.clone();
            booking.event.date = metadata.date;
            booking.event.venue = metadata.venue.clone();
            booking.event.time = metadata.time.clone();
            booking.updated_at = now;
            count += 1;
        }
        Ok(count)
    }

    async fn event_stats(&self, event_id: Uuid) -> StoreResult<EventBookingStats> {
        let bookings = self.bookings.read().await;
        let mut stats = EventBookingStats {
            event_id,
            bookings: 0,
            tickets: 0,
            revenue: Decimal::ZERO,
        };
        for booking in bookings
            .values()
            .filter(|b| b.event.event_id == event_id && !b.is_cancelled())
        {
            stats.bookings += 1;
            stats.tickets += i64::from(booking.tickets);
            if booking.booking_status == BookingStatus::Confirmed {
                stats.revenue += booking.total_amount;
            }
        }
        Ok(stats)
    }

    async fn analytics(&self) -> StoreResult<BookingAnalytics> {
        let bookings = self.bookings.read().await;
        let mut analytics = BookingAnalytics {
            total_bookings: 0,
            confirmed: 0,
            waitlisted: 0,
            cancelled: 0,
            pending: 0,
            revenue: Decimal::ZERO,
            tickets_sold: 0,
            waitlist_by_event: Vec::new(),
        };
        let mut waitlists: BTreeMap<Uuid, WaitlistBreakdown> = BTreeMap::new();

        for booking in bookings.values() {
            analytics.total_bookings += 1;
            match booking.booking_status {
                BookingStatus::Confirmed => {
                    analytics.confirmed += 1;
                    analytics.revenue += booking.total_amount;
                    analytics.tickets_sold += i64::from(booking.tickets);
                }
                BookingStatus::Waitlisted => {
                    analytics.waitlisted += 1;
                    let entry = waitlists
                        .entry(booking.event.event_id)
                        .or_insert_with(|| WaitlistBreakdown {
                            event_id: booking.event.event_id,
                            event_title: booking.event.title.clone(),
                            bookings: 0,
                            tickets: 0,
                        });
                    entry.bookings += 1;
                    entry.tickets += i64::from(booking.tickets);
                }
                BookingStatus::Cancelled => analytics.cancelled += 1,
                BookingStatus::Pending => analytics.pending += 1,
            }
        }

        let mut breakdown: Vec<_> = waitlists.into_values().collect();
        breakdown.sort_by(|a, b| b.tickets.cmp(&a.tickets));
        analytics.waitlist_by_event = breakdown;
        Ok(analytics)
    }

    async fn list_awaiting_seat_sync(&self) -> StoreResult<Vec<Booking>> {
        let bookings = self.bookings.read().await;
        let mut pending: Vec<_> = bookings
            .values()
            .filter(|b| b.awaiting_seat_sync())
            .cloned()
            .collect();
        pending.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(pending)
    }
}
