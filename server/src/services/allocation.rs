use chrono::Utc;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use super::seats::Decrement;
use super::BookingService;
use crate::clients::{dispatch, Notification, NotificationKind};
use crate::models::{Booking, BookingStatus, Event, Identity, PaymentStatus, SeatSync};
use crate::payment::{PaymentOutcome, PaymentRequest};
use crate::utils::error::AppError;

const DEFAULT_PAYMENT_METHOD: &str = "card";
const REFERENCE_ATTEMPTS: usize = 5;

/// Raw create-booking body. Fields stay loose so bad input becomes a
/// `ValidationError` rather than a JSON rejection.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookingBody {
    pub event_id: Option<String>,
    pub tickets: Option<Value>,
    pub join_waitlist: Option<bool>,
    pub payment_method: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookingRequest {
    pub event_id: Uuid,
    pub tickets: i32,
    pub join_waitlist: bool,
    pub payment_method: String,
}

impl CreateBookingBody {
    pub fn validate(self) -> Result<BookingRequest, AppError> {
        let (Some(event_id), Some(tickets)) = (self.event_id, self.tickets) else {
            return Err(AppError::ValidationError(
                "Event ID and number of tickets are required".to_string(),
            ));
        };

        let event_id = Uuid::parse_str(event_id.trim())
            .map_err(|_| AppError::ValidationError("Invalid event ID".to_string()))?;

        let tickets = parse_ticket_count(&tickets).ok_or_else(|| {
            AppError::ValidationError("Number of tickets must be a positive integer".to_string())
        })?;

        Ok(BookingRequest {
            event_id,
            tickets,
            join_waitlist: self.join_waitlist.unwrap_or(false),
            payment_method: self
                .payment_method
                .filter(|m| !m.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_PAYMENT_METHOD.to_string()),
        })
    }
}

fn parse_ticket_count(value: &Value) -> Option<i32> {
    let count = match value {
        Value::Number(n) => n.as_i64()?,
        Value::String(s) => s.trim().parse::<i64>().ok()?,
        _ => return None,
    };
    if count < 1 {
        return None;
    }
    i32::try_from(count).ok()
}

#[derive(Debug, Clone)]
pub enum AllocationOutcome {
    Confirmed(Booking),
    Waitlisted(Booking),
}

impl AllocationOutcome {
    pub fn booking(&self) -> &Booking {
        match self {
            AllocationOutcome::Confirmed(booking) | AllocationOutcome::Waitlisted(booking) => {
                booking
            }
        }
    }
}

impl BookingService {
    /// Allocates seats for `request`.
    ///
    /// Validation and business checks run before anything is written. A
    /// confirmed booking is persisted holding its seat claim before the
    /// directory decrement. If that decrement fails the booking stays
    /// confirmed with `seat_sync = pending` and the caller receives an
    /// upstream error.
    #[instrument(
        skip(self, identity, request),
        fields(user_id = %identity.id, event_id = %request.event_id, tickets = request.tickets)
    )]
    pub async fn create_booking(
        &self,
        identity: &Identity,
        request: BookingRequest,
    ) -> Result<AllocationOutcome, AppError> {
        let event = self
            .directory
            .get_event(request.event_id)
            .await
            .map_err(AppError::from_event_lookup)?;

        let now = Utc::now();
        if event.is_cancelled() {
            return Err(AppError::DomainError("Event has been cancelled".to_string()));
        }
        if event.is_past(now) {
            return Err(AppError::DomainError(
                "Cannot book tickets for past events".to_string(),
            ));
        }

        if request.tickets > event.available_seats {
            if !request.join_waitlist {
                return Err(AppError::DomainError(
                    "Not enough seats available".to_string(),
                ));
            }
            return self.waitlist(identity, &event, &request).await;
        }

        let total = total_amount(&request, &event)?;
        let payment = PaymentRequest {
            user_id: identity.id,
            event_id: event.id,
            amount: total,
            method: &request.payment_method,
        };
        match self.payment.decide(&payment) {
            PaymentOutcome::Approved => {}
            PaymentOutcome::Declined => {
                warn!("Payment declined");
                return Err(AppError::PaymentError(
                    "Payment failed. Please try again.".to_string(),
                ));
            }
            PaymentOutcome::Unavailable => {
                return Err(AppError::UpstreamError(
                    "Payment service unavailable".to_string(),
                ));
            }
        }

        // Inserted already claimed, so no reconcile can pick it up while the
        // decrement below is in flight.
        let booking = self
            .insert_new(new_booking(
                identity,
                &event,
                &request,
                total,
                BookingStatus::Confirmed,
                PaymentStatus::Completed,
            ))
            .await?;
        info!(
            booking_id = %booking.id,
            reference = %booking.reference_code,
            "Booking confirmed, applying seat decrement"
        );

        match self.apply_claimed_decrement(&booking).await {
            Decrement::Applied => {}
            Decrement::Superseded => {
                return Err(AppError::DomainError(
                    "Booking was cancelled before seats were confirmed".to_string(),
                ));
            }
            Decrement::Failed(e) => {
                error!(
                    booking_id = %booking.id,
                    error = %e,
                    "Seat decrement failed; booking left confirmed and pending seat sync"
                );
                return Err(AppError::UpstreamError(
                    "Failed to update event seats".to_string(),
                ));
            }
        }

        let booking = Booking {
            seat_sync: SeatSync::Applied,
            ..booking
        };

        self.notify(&booking, NotificationKind::Confirmation);
        Ok(AllocationOutcome::Confirmed(booking))
    }

    async fn waitlist(
        &self,
        identity: &Identity,
        event: &Event,
        request: &BookingRequest,
    ) -> Result<AllocationOutcome, AppError> {
        let total = total_amount(request, event)?;
        let booking = self
            .insert_new(new_booking(
                identity,
                event,
                request,
                total,
                BookingStatus::Waitlisted,
                PaymentStatus::Pending,
            ))
            .await?;
        info!(
            booking_id = %booking.id,
            available_seats = event.available_seats,
            "Added to waitlist"
        );

        self.notify(&booking, NotificationKind::Waitlist);
        Ok(AllocationOutcome::Waitlisted(booking))
    }

    /// Persists `booking`, drawing a fresh reference code whenever the
    /// current one is already taken.
    async fn insert_new(&self, mut booking: Booking) -> Result<Booking, AppError> {
        for attempt in 1..=REFERENCE_ATTEMPTS {
            booking.reference_code = (self.reference_codes)();
            if self.store.insert(&booking).await? {
                return Ok(booking);
            }
            warn!(
                reference = %booking.reference_code,
                attempt,
                "Reference code collision, drawing another"
            );
        }
        error!(booking_id = %booking.id, "Could not allocate a unique reference code");
        Err(AppError::UpstreamError(
            "Could not allocate a booking reference".to_string(),
        ))
    }

    pub(crate) fn notify(&self, booking: &Booking, kind: NotificationKind) {
        dispatch(
            self.notifier.clone(),
            Notification {
                booking_id: booking.id,
                kind,
                email: booking.user_email.clone(),
                reference_code: booking.reference_code.clone(),
                event_title: booking.event.title.clone(),
            },
        );
    }
}

fn total_amount(request: &BookingRequest, event: &Event) -> Result<Decimal, AppError> {
    Booking::total_for(request.tickets, event.price).ok_or_else(|| {
        error!(event_id = %event.id, price = %event.price, tickets = request.tickets, "Booking total overflows");
        AppError::UpstreamError("Event price is out of range".to_string())
    })
}

/// The reference code is filled in by `insert_new`.
fn new_booking(
    identity: &Identity,
    event: &Event,
    request: &BookingRequest,
    total_amount: Decimal,
    booking_status: BookingStatus,
    payment_status: PaymentStatus,
) -> Booking {
    let now = Utc::now();
    Booking {
        id: Uuid::new_v4(),
        reference_code: String::new(),
        user_id: identity.id,
        user_name: identity.name.clone(),
        user_email: identity.email.clone(),
        event: event.snapshot(),
        tickets: request.tickets,
        price_per_ticket: event.price,
        total_amount,
        booking_status,
        payment_status,
        payment_method: request.payment_method.clone(),
        seat_sync: match booking_status {
            BookingStatus::Confirmed => SeatSync::Claimed,
            _ => SeatSync::NotRequired,
        },
        created_at: now,
        updated_at: now,
    }
}
