use axum::{
    routing::{get, post, put},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::config::{create_cors_layer, security_header_layers, Config};
use crate::handlers::{bookings, health_check};
use crate::services::BookingService;

#[derive(Clone)]
pub struct AppState {
    pub bookings: BookingService,
}

pub fn booking_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            post(bookings::create_booking).get(bookings::list_my_bookings),
        )
        .route("/analytics", get(bookings::analytics))
        .route("/reconcile", post(bookings::reconcile_seats))
        .route("/reference/:reference", get(bookings::get_booking_by_reference))
        .route("/check/:event_id", get(bookings::check_booking))
        .route("/event/:event_id", get(bookings::event_bookings))
        .route("/event/:event_id/stats", get(bookings::event_stats))
        .route(
            "/event/:event_id/cancel-all",
            put(bookings::cancel_event_bookings),
        )
        .route("/event/:event_id/sync", put(bookings::sync_event))
        .route("/:id", get(bookings::get_booking))
        .route("/:id/cancel", put(bookings::cancel_booking))
}

pub fn create_routes(state: AppState, config: &Config) -> Router {
    let mut router = Router::new()
        .route("/health", get(health_check))
        .nest("/api/bookings", booking_routes())
        .with_state(state);

    for layer in security_header_layers(config.production) {
        router = router.layer(layer);
    }

    router
        .layer(create_cors_layer(config))
        .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use chrono::{Duration, Utc};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::auth::{USER_EMAIL_HEADER, USER_ID_HEADER, USER_NAME_HEADER, USER_ROLE_HEADER};
    use crate::models::Identity;
    use crate::services::testing::{admin, event, user, Harness};

    fn app(h: &Harness) -> Router {
        let state = AppState {
            bookings: h.service.clone(),
        };
        create_routes(state, &Config::from_vars(|_| None))
    }

    fn request(
        method: &str,
        uri: &str,
        caller: Option<&Identity>,
        body: Option<Value>,
    ) -> Request<Body> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(caller) = caller {
            builder = builder
                .header(USER_ID_HEADER, caller.id.to_string())
                .header(USER_NAME_HEADER, caller.name.as_str())
                .header(USER_EMAIL_HEADER, caller.email.as_str())
                .header(
                    USER_ROLE_HEADER,
                    if caller.is_admin() { "admin" } else { "user" },
                );
        }
        match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        }
    }

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    #[tokio::test]
    async fn test_health_check() {
        let h = Harness::approving();
        let response = app(&h)
            .oneshot(request("GET", "/health", None, None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["x-content-type-options"], "nosniff");
        assert!(response.headers().get("strict-transport-security").is_none());
    }

    #[tokio::test]
    async fn test_create_booking_confirmed() {
        let h = Harness::approving();
        let ev = event(10, Utc::now() + Duration::days(1));
        h.directory.add(ev.clone());
        let caller = user();

        let (status, body) = send(
            app(&h),
            request(
                "POST",
                "/api/bookings",
                Some(&caller),
                Some(json!({ "eventId": ev.id, "tickets": 2 })),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["success"], true);
        assert_eq!(body["booking"]["bookingStatus"], "confirmed");
        assert_eq!(body["booking"]["paymentStatus"], "completed");
        assert_eq!(body["booking"]["tickets"], 2);
        assert_eq!(body["booking"]["userId"], caller.id.to_string());
        assert_eq!(h.directory.adjustments(), vec![(ev.id, -2)]);
    }

    #[tokio::test]
    async fn test_create_booking_waitlisted() {
        let h = Harness::approving();
        let ev = event(1, Utc::now() + Duration::days(1));
        h.directory.add(ev.clone());

        let (status, body) = send(
            app(&h),
            request(
                "POST",
                "/api/bookings",
                Some(&user()),
                Some(json!({ "eventId": ev.id, "tickets": 2, "joinWaitlist": true })),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::ACCEPTED);
        assert_eq!(body["booking"]["bookingStatus"], "waitlisted");
        assert!(h.directory.adjustments().is_empty());
    }

    #[tokio::test]
    async fn test_create_booking_not_enough_seats() {
        let h = Harness::approving();
        let ev = event(1, Utc::now() + Duration::days(1));
        h.directory.add(ev.clone());

        let (status, body) = send(
            app(&h),
            request(
                "POST",
                "/api/bookings",
                Some(&user()),
                Some(json!({ "eventId": ev.id, "tickets": 2, "joinWaitlist": false })),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "Not enough seats available");
    }

    #[tokio::test]
    async fn test_create_booking_validation() {
        let h = Harness::approving();
        let (status, body) = send(
            app(&h),
            request("POST", "/api/bookings", Some(&user()), Some(json!({ "tickets": 2 }))),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "VALIDATION_ERROR");

        let malformed = Request::builder()
            .method("POST")
            .uri("/api/bookings")
            .header(USER_ID_HEADER, user().id.to_string())
            .header("content-type", "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let (status, body) = send(app(&h), malformed).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_requires_identity() {
        let h = Harness::approving();
        let (status, body) = send(app(&h), request("GET", "/api/bookings", None, None)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "Authentication required");
    }

    #[tokio::test]
    async fn test_seat_update_failure_is_500() {
        let h = Harness::approving();
        let ev = event(10, Utc::now() + Duration::days(1));
        h.directory.add(ev.clone());
        h.directory.fail_adjust.store(true, Ordering::SeqCst);

        let (status, body) = send(
            app(&h),
            request(
                "POST",
                "/api/bookings",
                Some(&user()),
                Some(json!({ "eventId": ev.id, "tickets": 1 })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Failed to update event seats");
    }

    #[tokio::test]
    async fn test_seat_claim_store_failure_still_201() {
        let h = Harness::approving();
        let ev = event(10, Utc::now() + Duration::days(1));
        h.directory.add(ev.clone());
        h.store.fail_settle.store(true, Ordering::SeqCst);

        let (status, body) = send(
            app(&h),
            request(
                "POST",
                "/api/bookings",
                Some(&user()),
                Some(json!({ "eventId": ev.id, "tickets": 2 })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["booking"]["bookingStatus"], "confirmed");
        assert_eq!(h.directory.available(ev.id), 8);
    }

    #[tokio::test]
    async fn test_cancel_and_lookup_flow() {
        let h = Harness::approving();
        let ev = event(10, Utc::now() + Duration::days(1));
        h.directory.add(ev.clone());
        let caller = user();

        let (_, created) = send(
            app(&h),
            request(
                "POST",
                "/api/bookings",
                Some(&caller),
                Some(json!({ "eventId": ev.id, "tickets": 3 })),
            ),
        )
        .await;
        let id = created["booking"]["id"].as_str().unwrap().to_string();
        let reference = created["booking"]["referenceCode"].as_str().unwrap().to_string();

        let (status, _) = send(
            app(&h),
            request("GET", &format!("/api/bookings/reference/{reference}"), Some(&user()), None),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, body) = send(
            app(&h),
            request("GET", &format!("/api/bookings/check/{}", ev.id), Some(&caller), None),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["hasBooking"], true);

        let (status, body) = send(
            app(&h),
            request("PUT", &format!("/api/bookings/{id}/cancel"), Some(&caller), None),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["booking"]["bookingStatus"], "cancelled");
        assert_eq!(body["booking"]["paymentStatus"], "refunded");
        assert_eq!(h.directory.adjustments(), vec![(ev.id, -3), (ev.id, 3)]);

        let (status, body) = send(
            app(&h),
            request("PUT", &format!("/api/bookings/{id}/cancel"), Some(&caller), None),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Booking is already cancelled");
    }

    #[tokio::test]
    async fn test_admin_endpoints() {
        let h = Harness::approving();
        let ev = event(10, Utc::now() + Duration::days(1));
        h.directory.add(ev.clone());
        send(
            app(&h),
            request(
                "POST",
                "/api/bookings",
                Some(&user()),
                Some(json!({ "eventId": ev.id, "tickets": 2 })),
            ),
        )
        .await;

        let stats_uri = format!("/api/bookings/event/{}/stats", ev.id);
        let (status, _) = send(app(&h), request("GET", &stats_uri, Some(&user()), None)).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, body) = send(app(&h), request("GET", &stats_uri, Some(&admin()), None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["stats"]["tickets"], 2);

        let (status, body) = send(
            app(&h),
            request(
                "PUT",
                &format!("/api/bookings/event/{}/sync", ev.id),
                Some(&admin()),
                Some(json!({
                    "title": "Renamed",
                    "date": "2031-01-01T20:00:00Z",
                    "venue": "Arena",
                    "time": "20:00"
                })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["count"], 1);

        let (status, body) = send(
            app(&h),
            request(
                "PUT",
                &format!("/api/bookings/event/{}/cancel-all", ev.id),
                Some(&admin()),
                None,
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["count"], 1);

        let (status, body) = send(
            app(&h),
            request("GET", "/api/bookings/analytics", Some(&admin()), None),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["stats"]["cancelled"], 1);

        let (status, body) = send(
            app(&h),
            request("POST", "/api/bookings/reconcile", Some(&admin()), None),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["attempted"], 0);
        assert_eq!(body["synced"], 0);
        assert!(body.get("reconciled").is_none());
    }
}
