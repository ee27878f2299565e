use async_trait::async_trait;
use uuid::Uuid;

use crate::models::{Booking, BookingAnalytics, EventBookingStats, EventMetadata};

pub mod memory;
pub mod postgres;

pub use memory::InMemoryBookingStore;
pub use postgres::PgBookingStore;

pub type StoreResult<T> = Result<T, sqlx::Error>;

/// Document-style table of bookings keyed by booking id.
#[async_trait]
pub trait BookingStore: Send + Sync {
    /// Returns `false` without writing when the reference code is taken.
    async fn insert(&self, booking: &Booking) -> StoreResult<bool>;

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<Booking>>;

    async fn find_by_reference(&self, reference_code: &str) -> StoreResult<Option<Booking>>;

    /// Most recent first.
    async fn list_for_user(&self, user_id: Uuid) -> StoreResult<Vec<Booking>>;

    /// Most recent first.
    async fn list_for_event(&self, event_id: Uuid) -> StoreResult<Vec<Booking>>;

    /// True when the user holds a non-cancelled booking for the event.
    async fn has_active_booking(&self, user_id: Uuid, event_id: Uuid) -> StoreResult<bool>;

    /// `pending -> claimed` for a confirmed booking. Only the caller that gets
    /// `true` back may send the decrement.
    async fn claim_seat_sync(&self, id: Uuid) -> StoreResult<bool>;

    /// `claimed -> applied`, unless the booking was cancelled while the claim
    /// was held. `false` means the caller owns giving the seats back.
    async fn settle_seat_claim(&self, id: Uuid) -> StoreResult<bool>;

    /// `claimed -> pending` after a decrement that did not go through.
    async fn release_seat_claim(&self, id: Uuid) -> StoreResult<()>;

    /// Moves a non-cancelled booking to cancelled, setting the payment status
    /// to refunded when `refund` is set. Returns `None` if the booking was
    /// already cancelled or does not exist. The returned `seat_sync` is the
    /// state the booking was in at the moment it was cancelled.
    async fn cancel(&self, id: Uuid, refund: bool) -> StoreResult<Option<Booking>>;

    async fn cancel_all_for_event(&self, event_id: Uuid) -> StoreResult<u64>;

    async fn sync_event_metadata(&self, event_id: Uuid, metadata: &EventMetadata)
        -> StoreResult<u64>;

    async fn event_stats(&self, event_id: Uuid) -> StoreResult<EventBookingStats>;

    async fn analytics(&self) -> StoreResult<BookingAnalytics>;

    /// Confirmed bookings whose seat decrement has not been applied.
    async fn list_awaiting_seat_sync(&self) -> StoreResult<Vec<Booking>>;
}
