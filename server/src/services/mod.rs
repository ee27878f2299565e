//! The booking orchestrator.
//!
//! `BookingService` owns the booking records and coordinates with the event
//! directory (seat counts), the payment decider and the notification sender.
//! Its operations are split by concern:
//!
//! - [`allocation`]: turning a ticket request into a confirmed, waitlisted or
//!   rejected booking.
//! - [`lifecycle`]: cancellation, bulk cancellation, metadata sync and seat
//!   reconciliation.
//! - [`queries`]: listings, lookups and aggregate statistics.
//!
//! - [`seats`]: the claim protocol around each seat decrement.
//!
//! Nothing here holds a lock across a request. Concurrent requests for the
//! same event each read the directory's seat count independently, so
//! preventing oversell is left to the directory's atomic adjustment.
//!
//! A confirmed booking's decrement is guarded by its `seat_sync` state:
//! only the caller that moves it from `pending` to `claimed` may send the
//! decrement, and every adjustment carries a per-booking idempotency key, so
//! concurrent reconciles, a reconcile racing a cancel, or a retry after a
//! lost response each move the seat count at most once.

use std::sync::Arc;

use crate::clients::{EventDirectory, NotificationSender};
use crate::models::booking::generate_reference_code;
use crate::payment::PaymentDecider;
use crate::store::BookingStore;

pub mod allocation;
pub mod lifecycle;
pub mod queries;
pub mod seats;

#[cfg(test)]
pub(crate) mod testing;

pub use allocation::{AllocationOutcome, BookingRequest, CreateBookingBody};
pub use lifecycle::ReconcileReport;

pub type ReferenceGenerator = Arc<dyn Fn() -> String + Send + Sync>;

#[derive(Clone)]
pub struct BookingService {
    store: Arc<dyn BookingStore>,
    directory: Arc<dyn EventDirectory>,
    notifier: Arc<dyn NotificationSender>,
    payment: Arc<dyn PaymentDecider>,
    reference_codes: ReferenceGenerator,
}

impl BookingService {
    pub fn new(
        store: Arc<dyn BookingStore>,
        directory: Arc<dyn EventDirectory>,
        notifier: Arc<dyn NotificationSender>,
        payment: Arc<dyn PaymentDecider>,
    ) -> Self {
        Self {
            store,
            directory,
            notifier,
            payment,
            reference_codes: Arc::new(generate_reference_code),
        }
    }

    /// Replaces the reference code source.
    pub fn with_reference_generator(mut self, generator: ReferenceGenerator) -> Self {
        self.reference_codes = generator;
        self
    }
}
