use uuid::Uuid;

use super::BookingService;
use crate::auth::{authorize, Action};
use crate::models::{Booking, BookingAnalytics, EventBookingStats, Identity};
use crate::utils::error::AppError;

impl BookingService {
    pub async fn list_for_caller(&self, identity: &Identity) -> Result<Vec<Booking>, AppError> {
        Ok(self.store.list_for_user(identity.id).await?)
    }

    pub async fn get_booking(&self, identity: &Identity, id: Uuid) -> Result<Booking, AppError> {
        let booking = self.store.find_by_id(id).await?;
        Self::readable(identity, booking)
    }

    pub async fn get_by_reference(
        &self,
        identity: &Identity,
        reference_code: &str,
    ) -> Result<Booking, AppError> {
        let booking = self
            .store
            .find_by_reference(&reference_code.trim().to_uppercase())
            .await?;
        Self::readable(identity, booking)
    }

    pub async fn has_booking(&self, identity: &Identity, event_id: Uuid) -> Result<bool, AppError> {
        Ok(self.store.has_active_booking(identity.id, event_id).await?)
    }

    pub async fn event_bookings(
        &self,
        identity: &Identity,
        event_id: Uuid,
    ) -> Result<Vec<Booking>, AppError> {
        authorize(identity, Action::ViewEventBookings).require()?;
        Ok(self.store.list_for_event(event_id).await?)
    }

    pub async fn event_stats(
        &self,
        identity: &Identity,
        event_id: Uuid,
    ) -> Result<EventBookingStats, AppError> {
        authorize(identity, Action::ViewEventBookings).require()?;
        Ok(self.store.event_stats(event_id).await?)
    }

    pub async fn analytics(&self, identity: &Identity) -> Result<BookingAnalytics, AppError> {
        authorize(identity, Action::ViewAnalytics).require()?;
        Ok(self.store.analytics().await?)
    }

    fn readable(identity: &Identity, booking: Option<Booking>) -> Result<Booking, AppError> {
        let booking =
            booking.ok_or_else(|| AppError::NotFound("Booking not found".to_string()))?;
        authorize(
            identity,
            Action::ReadBooking {
                owner: booking.user_id,
            },
        )
        .require()?;
        Ok(booking)
    }
}
