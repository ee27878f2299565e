use tracing::{error, info, warn};

use super::BookingService;
use crate::clients::{release_key, reserve_key, DirectoryError};
use crate::models::Booking;

/// How a claimed decrement ended.
#[derive(Debug)]
pub(crate) enum Decrement {
    Applied,
    /// The booking was cancelled while the claim was held; the seats were
    /// handed straight back.
    Superseded,
    Failed(DirectoryError),
}

impl BookingService {
    /// Sends the decrement for a booking whose `seat_sync` claim the caller
    /// holds, then settles or releases the claim.
    pub(crate) async fn apply_claimed_decrement(&self, booking: &Booking) -> Decrement {
        let event_id = booking.event.event_id;
        if let Err(e) = self
            .directory
            .adjust_seats(event_id, -booking.tickets, &reserve_key(booking.id))
            .await
        {
            if let Err(store_err) = self.store.release_seat_claim(booking.id).await {
                error!(
                    booking_id = %booking.id,
                    error = %store_err,
                    "Failed to release seat claim; booking needs manual reconciliation"
                );
            }
            return Decrement::Failed(e);
        }

        match self.store.settle_seat_claim(booking.id).await {
            Ok(true) => Decrement::Applied,
            Ok(false) => {
                info!(
                    booking_id = %booking.id,
                    "Booking cancelled during seat decrement, handing seats back"
                );
                self.restore_seats(booking).await;
                Decrement::Superseded
            }
            Err(e) => {
                error!(
                    booking_id = %booking.id,
                    event_id = %event_id,
                    error = %e,
                    "Seat decrement applied but claim could not be settled"
                );
                Decrement::Applied
            }
        }
    }

    /// Gives a booking's seats back. Failures are logged, never returned.
    pub(crate) async fn restore_seats(&self, booking: &Booking) {
        if let Err(e) = self
            .directory
            .adjust_seats(
                booking.event.event_id,
                booking.tickets,
                &release_key(booking.id),
            )
            .await
        {
            warn!(
                booking_id = %booking.id,
                event_id = %booking.event.event_id,
                tickets = booking.tickets,
                error = %e,
                "Failed to restore event seats"
            );
        }
    }
}
