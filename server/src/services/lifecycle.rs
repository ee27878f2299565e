use chrono::Utc;
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use super::seats::Decrement;
use super::BookingService;
use crate::auth::{authorize, Action};
use crate::models::{Booking, BookingStatus, EventMetadata, Identity, SeatSync};
use crate::utils::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReconcileReport {
    pub attempted: usize,
    pub synced: usize,
}

impl BookingService {
    /// Cancels one booking. Seats are handed back to the directory only for
    /// confirmed bookings whose decrement was applied when the cancel landed.
    /// A booking caught mid-decrement is restored by whoever holds its claim.
    /// A failed restore is logged and the cancellation still stands.
    pub async fn cancel_booking(
        &self,
        identity: &Identity,
        booking_id: Uuid,
    ) -> Result<Booking, AppError> {
        let booking = self
            .store
            .find_by_id(booking_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Booking not found".to_string()))?;

        authorize(
            identity,
            Action::CancelBooking {
                owner: booking.user_id,
            },
        )
        .require()?;

        if booking.is_cancelled() {
            return Err(already_cancelled());
        }
        if booking.event.is_past(Utc::now()) {
            return Err(AppError::DomainError(
                "Cannot cancel booking for past events".to_string(),
            ));
        }

        let was_confirmed = booking.booking_status == BookingStatus::Confirmed;
        let cancelled = self
            .store
            .cancel(booking.id, was_confirmed)
            .await?
            .ok_or_else(already_cancelled)?;

        info!(
            booking_id = %booking.id,
            event_id = %booking.event.event_id,
            refunded = was_confirmed,
            "Booking cancelled"
        );

        if cancelled.seat_sync == SeatSync::Applied {
            self.restore_seats(&cancelled).await;
        }

        Ok(cancelled)
    }

    /// Cancels every live booking of an event that is itself being cancelled.
    /// Seats are not restored one by one.
    pub async fn cancel_all_for_event(
        &self,
        identity: &Identity,
        event_id: Uuid,
    ) -> Result<u64, AppError> {
        authorize(identity, Action::ManageEvent).require()?;

        let count = self.store.cancel_all_for_event(event_id).await?;
        info!(event_id = %event_id, count, "Cancelled all bookings for event");
        Ok(count)
    }

    /// Overwrites the cached event fields on every booking of `event_id`.
    pub async fn sync_event_metadata(
        &self,
        identity: &Identity,
        event_id: Uuid,
        metadata: EventMetadata,
    ) -> Result<u64, AppError> {
        authorize(identity, Action::ManageEvent).require()?;

        let count = self.store.sync_event_metadata(event_id, &metadata).await?;
        info!(event_id = %event_id, count, "Synced event metadata into bookings");
        Ok(count)
    }

    /// Retries the seat decrement for confirmed bookings that never got one.
    ///
    /// Each booking is claimed before its decrement is sent. Bookings another
    /// caller claimed or cancelled in the meantime are skipped and do not
    /// count as attempted.
    pub async fn reconcile_seat_sync(
        &self,
        identity: &Identity,
    ) -> Result<ReconcileReport, AppError> {
        authorize(identity, Action::ManageEvent).require()?;

        let pending = self.store.list_awaiting_seat_sync().await?;
        let mut report = ReconcileReport {
            attempted: 0,
            synced: 0,
        };

        for booking in pending {
            if !self.store.claim_seat_sync(booking.id).await? {
                continue;
            }
            report.attempted += 1;
            match self.apply_claimed_decrement(&booking).await {
                Decrement::Applied => {
                    report.synced += 1;
                    info!(booking_id = %booking.id, "Seat decrement reconciled");
                }
                Decrement::Superseded => {}
                Decrement::Failed(e) => {
                    warn!(booking_id = %booking.id, error = %e, "Seat decrement still failing");
                }
            }
        }

        info!(attempted = report.attempted, synced = report.synced, "Seat reconciliation finished");
        Ok(report)
    }
}

fn already_cancelled() -> AppError {
    AppError::DomainError("Booking is already cancelled".to_string())
}
