use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::response::Response;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{Booking, BookingAnalytics, EventBookingStats, EventMetadata, Identity};
use crate::routes::AppState;
use crate::services::{AllocationOutcome, CreateBookingBody};
use crate::utils::error::AppError;
use crate::utils::response::{accepted, created, ok, success};

#[derive(Serialize)]
struct BookingPayload {
    booking: Booking,
}

#[derive(Serialize)]
struct BookingsPayload {
    count: usize,
    bookings: Vec<Booking>,
}

impl From<Vec<Booking>> for BookingsPayload {
    fn from(bookings: Vec<Booking>) -> Self {
        Self {
            count: bookings.len(),
            bookings,
        }
    }
}

#[derive(Serialize)]
struct CountPayload {
    count: u64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct HasBookingPayload {
    has_booking: bool,
}

#[derive(Serialize)]
struct StatsPayload<T: Serialize> {
    stats: T,
}

#[derive(Debug, Deserialize)]
pub struct SyncEventBody {
    pub title: Option<String>,
    pub date: Option<DateTime<Utc>>,
    pub venue: Option<String>,
    pub time: Option<String>,
}

impl SyncEventBody {
    fn into_metadata(self) -> Result<EventMetadata, AppError> {
        match (self.title, self.date, self.venue, self.time) {
            (Some(title), Some(date), Some(venue), Some(time)) => Ok(EventMetadata {
                title,
                date,
                venue,
                time,
            }),
            _ => Err(AppError::ValidationError(
                "Title, date, venue and time are required".to_string(),
            )),
        }
    }
}

fn body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    payload
        .map(|Json(value)| value)
        .map_err(|rejection| AppError::ValidationError(rejection.body_text()))
}

fn parse_id(raw: &str, what: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw).map_err(|_| AppError::ValidationError(format!("Invalid {what} ID")))
}

pub async fn create_booking(
    State(state): State<AppState>,
    identity: Identity,
    payload: Result<Json<CreateBookingBody>, JsonRejection>,
) -> Result<Response, AppError> {
    let request = body(payload)?.validate()?;

    match state.bookings.create_booking(&identity, request).await? {
        AllocationOutcome::Confirmed(booking) => {
            Ok(created(BookingPayload { booking }, "Booking confirmed"))
        }
        AllocationOutcome::Waitlisted(booking) => Ok(accepted(
            BookingPayload { booking },
            "Added to waitlist",
        )),
    }
}

pub async fn list_my_bookings(
    State(state): State<AppState>,
    identity: Identity,
) -> Result<Response, AppError> {
    let bookings = state.bookings.list_for_caller(&identity).await?;
    Ok(ok(BookingsPayload::from(bookings)))
}

pub async fn get_booking(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let booking = state
        .bookings
        .get_booking(&identity, parse_id(&id, "booking")?)
        .await?;
    Ok(ok(BookingPayload { booking }))
}

pub async fn get_booking_by_reference(
    State(state): State<AppState>,
    identity: Identity,
    Path(reference): Path<String>,
) -> Result<Response, AppError> {
    let booking = state.bookings.get_by_reference(&identity, &reference).await?;
    Ok(ok(BookingPayload { booking }))
}

pub async fn check_booking(
    State(state): State<AppState>,
    identity: Identity,
    Path(event_id): Path<String>,
) -> Result<Response, AppError> {
    let has_booking = state
        .bookings
        .has_booking(&identity, parse_id(&event_id, "event")?)
        .await?;
    Ok(ok(HasBookingPayload { has_booking }))
}

pub async fn cancel_booking(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let booking = state
        .bookings
        .cancel_booking(&identity, parse_id(&id, "booking")?)
        .await?;
    Ok(success(
        BookingPayload { booking },
        "Booking cancelled successfully",
    ))
}

pub async fn event_bookings(
    State(state): State<AppState>,
    identity: Identity,
    Path(event_id): Path<String>,
) -> Result<Response, AppError> {
    let bookings = state
        .bookings
        .event_bookings(&identity, parse_id(&event_id, "event")?)
        .await?;
    Ok(ok(BookingsPayload::from(bookings)))
}

pub async fn event_stats(
    State(state): State<AppState>,
    identity: Identity,
    Path(event_id): Path<String>,
) -> Result<Response, AppError> {
    let stats: EventBookingStats = state
        .bookings
        .event_stats(&identity, parse_id(&event_id, "event")?)
        .await?;
    Ok(ok(StatsPayload { stats }))
}

pub async fn cancel_event_bookings(
    State(state): State<AppState>,
    identity: Identity,
    Path(event_id): Path<String>,
) -> Result<Response, AppError> {
    let count = state
        .bookings
        .cancel_all_for_event(&identity, parse_id(&event_id, "event")?)
        .await?;
    Ok(success(
        CountPayload { count },
        format!("{count} booking(s) cancelled"),
    ))
}

pub async fn sync_event(
    State(state): State<AppState>,
    identity: Identity,
    Path(event_id): Path<String>,
    payload: Result<Json<SyncEventBody>, JsonRejection>,
) -> Result<Response, AppError> {
    let event_id = parse_id(&event_id, "event")?;
    let metadata = body(payload)?.into_metadata()?;
    let count = state
        .bookings
        .sync_event_metadata(&identity, event_id, metadata)
        .await?;
    Ok(success(
        CountPayload { count },
        format!("{count} booking(s) updated"),
    ))
}

pub async fn reconcile_seats(
    State(state): State<AppState>,
    identity: Identity,
) -> Result<Response, AppError> {
    let reconciled = state.bookings.reconcile_seat_sync(&identity).await?;
    Ok(ok(reconciled))
}

pub async fn analytics(
    State(state): State<AppState>,
    identity: Identity,
) -> Result<Response, AppError> {
    let stats: BookingAnalytics = state.bookings.analytics(&identity).await?;
    Ok(ok(StatsPayload { stats }))
}
