//! Caller identity and capability checks.
//!
//! The identity provider sits in front of this service and forwards the
//! authenticated caller as `x-user-*` headers, which are trusted as-is.

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::HeaderMap;
use uuid::Uuid;

use crate::models::{Identity, Role};
use crate::utils::error::AppError;

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_NAME_HEADER: &str = "x-user-name";
pub const USER_EMAIL_HEADER: &str = "x-user-email";
pub const USER_ROLE_HEADER: &str = "x-user-role";

/// Something a caller wants to do.
#[derive(Debug, Clone, Copy)]
pub enum Action {
    ReadBooking { owner: Uuid },
    CancelBooking { owner: Uuid },
    ViewEventBookings,
    ManageEvent,
    ViewAnalytics,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    Granted,
    Denied(&'static str),
}

impl Capability {
    pub fn is_granted(&self) -> bool {
        matches!(self, Capability::Granted)
    }

    pub fn require(self) -> Result<(), AppError> {
        match self {
            Capability::Granted => Ok(()),
            Capability::Denied(reason) => Err(AppError::AccessDenied(reason.to_string())),
        }
    }
}

pub fn authorize(identity: &Identity, action: Action) -> Capability {
    match (identity.role, action) {
        (Role::Admin, _) => Capability::Granted,
        (Role::User, Action::ReadBooking { owner }) if owner == identity.id => Capability::Granted,
        (Role::User, Action::ReadBooking { .. }) => {
            Capability::Denied("Not authorized to access this booking")
        }
        (Role::User, Action::CancelBooking { owner }) if owner == identity.id => {
            Capability::Granted
        }
        (Role::User, Action::CancelBooking { .. }) => {
            Capability::Denied("Not authorized to cancel this booking")
        }
        (Role::User, Action::ViewEventBookings | Action::ManageEvent | Action::ViewAnalytics) => {
            Capability::Denied("Admin access required")
        }
    }
}

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

impl Identity {
    pub fn from_headers(headers: &HeaderMap) -> Result<Self, AppError> {
        let unauthenticated = || AppError::AuthError("Authentication required".to_string());

        let id = header(headers, USER_ID_HEADER)
            .and_then(|raw| Uuid::parse_str(raw).ok())
            .ok_or_else(unauthenticated)?;

        let role = match header(headers, USER_ROLE_HEADER).map(str::to_lowercase) {
            Some(role) if role == "admin" => Role::Admin,
            _ => Role::User,
        };

        Ok(Identity {
            id,
            name: header(headers, USER_NAME_HEADER).unwrap_or_default().to_string(),
            email: header(headers, USER_EMAIL_HEADER).unwrap_or_default().to_string(),
            role,
        })
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for Identity
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Identity::from_headers(&parts.headers)
    }
}
