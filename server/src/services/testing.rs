//! Fakes shared by service and handler tests.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use super::BookingService;
use crate::clients::{DirectoryError, EventDirectory, Notification, NotificationSender, NotifyError};
use crate::models::{
    Booking, BookingAnalytics, Event, EventBookingStats, EventMetadata, EventStatus, Identity,
    Role,
};
use crate::payment::{FixedPayment, PaymentOutcome};
use crate::store::{BookingStore, InMemoryBookingStore, StoreResult};

/// Directory fake that honours idempotency keys the way the real one must.
#[derive(Default)]
pub struct FakeDirectory {
    events: Mutex<HashMap<Uuid, Event>>,
    adjustments: Mutex<Vec<(Uuid, i32)>>,
    applied_keys: Mutex<HashSet<String>>,
    pub fail_lookup: AtomicBool,
    pub fail_adjust: AtomicBool,
    /// Apply the adjustment, then report a timeout as if the response was lost.
    pub apply_then_timeout: AtomicBool,
    /// Hand control back to the runtime before every adjustment.
    pub yield_before_adjust: AtomicBool,
}

impl FakeDirectory {
    pub fn add(&self, event: Event) {
        self.events.lock().unwrap().insert(event.id, event);
    }

    pub fn adjustments(&self) -> Vec<(Uuid, i32)> {
        self.adjustments.lock().unwrap().clone()
    }

    pub fn available(&self, event_id: Uuid) -> i32 {
        self.events.lock().unwrap()[&event_id].available_seats
    }
}

#[async_trait]
impl EventDirectory for FakeDirectory {
    async fn get_event(&self, event_id: Uuid) -> Result<Event, DirectoryError> {
        if self.fail_lookup.load(Ordering::SeqCst) {
            return Err(DirectoryError::Status(503));
        }
        self.events
            .lock()
            .unwrap()
            .get(&event_id)
            .cloned()
            .ok_or(DirectoryError::NotFound)
    }

    async fn adjust_seats(
        &self,
        event_id: Uuid,
        delta: i32,
        idempotency_key: &str,
    ) -> Result<i32, DirectoryError> {
        if self.yield_before_adjust.load(Ordering::SeqCst) {
            tokio::task::yield_now().await;
        }
        self.adjustments.lock().unwrap().push((event_id, delta));
        if self.fail_adjust.load(Ordering::SeqCst) {
            return Err(DirectoryError::Timeout);
        }
        let mut events = self.events.lock().unwrap();
        let event = events.get_mut(&event_id).ok_or(DirectoryError::NotFound)?;
        if self
            .applied_keys
            .lock()
            .unwrap()
            .insert(idempotency_key.to_string())
        {
            event.available_seats += delta;
        }
        if self.apply_then_timeout.load(Ordering::SeqCst) {
            return Err(DirectoryError::Timeout);
        }
        Ok(event.available_seats)
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<Notification>>,
    pub fail: AtomicBool,
}

impl RecordingNotifier {
    pub fn sent(&self) -> Vec<Notification> {
        self.sent.lock().unwrap().clone()
    }

    /// Notifications are spawned, so give them a moment to land.
    pub async fn wait_for(&self, count: usize) -> Vec<Notification> {
        for _ in 0..50 {
            if self.sent.lock().unwrap().len() >= count {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        self.sent()
    }
}

#[async_trait]
impl NotificationSender for RecordingNotifier {
    async fn send(&self, notification: &Notification) -> Result<(), NotifyError> {
        self.sent.lock().unwrap().push(notification.clone());
        if self.fail.load(Ordering::SeqCst) {
            return Err(NotifyError::Status(500));
        }
        Ok(())
    }
}

/// In-memory store with switchable failures.
#[derive(Default)]
pub struct TestStore {
    inner: InMemoryBookingStore,
    pub fail_settle: AtomicBool,
}

impl TestStore {
    pub async fn is_empty(&self) -> bool {
        self.inner.is_empty().await
    }
}

#[async_trait]
impl BookingStore for TestStore {
    async fn insert(&self, booking: &Booking) -> StoreResult<bool> {
        self.inner.insert(booking).await
    }

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<Booking>> {
        self.inner.find_by_id(id).await
    }

    async fn find_by_reference(&self, reference_code: &str) -> StoreResult<Option<Booking>> {
        self.inner.find_by_reference(reference_code).await
    }

    async fn list_for_user(&self, user_id: Uuid) -> StoreResult<Vec<Booking>> {
        self.inner.list_for_user(user_id).await
    }

    async fn list_for_event(&self, event_id: Uuid) -> StoreResult<Vec<Booking>> {
        self.inner.list_for_event(event_id).await
    }

    async fn has_active_booking(&self, user_id: Uuid, event_id: Uuid) -> StoreResult<bool> {
        self.inner.has_active_booking(user_id, event_id).await
    }

    async fn claim_seat_sync(&self, id: Uuid) -> StoreResult<bool> {
        self.inner.claim_seat_sync(id).await
    }

    async fn settle_seat_claim(&self, id: Uuid) -> StoreResult<bool> {
        if self.fail_settle.load(Ordering::SeqCst) {
            return Err(sqlx::Error::PoolTimedOut);
        }
        self.inner.settle_seat_claim(id).await
    }

    async fn release_seat_claim(&self, id: Uuid) -> StoreResult<()> {
        self.inner.release_seat_claim(id).await
    }

    async fn cancel(&self, id: Uuid, refund: bool) -> StoreResult<Option<Booking>> {
        self.inner.cancel(id, refund).await
    }

    async fn cancel_all_for_event(&self, event_id: Uuid) -> StoreResult<u64> {
        self.inner.cancel_all_for_event(event_id).await
    }

    async fn sync_event_metadata(
        &self,
        event_id: Uuid,
        metadata: &EventMetadata,
    ) -> StoreResult<u64> {
        self.inner.sync_event_metadata(event_id, metadata).await
    }

    async fn event_stats(&self, event_id: Uuid) -> StoreResult<EventBookingStats> {
        self.inner.event_stats(event_id).await
    }

    async fn analytics(&self) -> StoreResult<BookingAnalytics> {
        self.inner.analytics().await
    }

    async fn list_awaiting_seat_sync(&self) -> StoreResult<Vec<Booking>> {
        self.inner.list_awaiting_seat_sync().await
    }
}

pub struct Harness {
    pub service: BookingService,
    pub store: Arc<TestStore>,
    pub directory: Arc<FakeDirectory>,
    pub notifier: Arc<RecordingNotifier>,
}

impl Harness {
    pub fn new(payment: PaymentOutcome) -> Self {
        let store = Arc::new(TestStore::default());
        let directory = Arc::new(FakeDirectory::default());
        let notifier = Arc::new(RecordingNotifier::default());
        let service = BookingService::new(
            store.clone(),
            directory.clone(),
            notifier.clone(),
            Arc::new(FixedPayment(payment)),
        );
        Self {
            service,
            store,
            directory,
            notifier,
        }
    }

    pub fn approving() -> Self {
        Self::new(PaymentOutcome::Approved)
    }
}

pub fn event(available_seats: i32, date: DateTime<Utc>) -> Event {
    Event {
        id: Uuid::new_v4(),
        title: "Jazz Night".to_string(),
        status: EventStatus::Published,
        date,
        venue: "Blue Hall".to_string(),
        time: "20:00".to_string(),
        capacity: 100,
        available_seats,
        price: Decimal::new(2550, 2),
    }
}

pub fn user() -> Identity {
    Identity {
        id: Uuid::new_v4(),
        name: "Ada Lovelace".to_string(),
        email: "ada@example.com".to_string(),
        role: Role::User,
    }
}

pub fn admin() -> Identity {
    Identity {
        id: Uuid::new_v4(),
        name: "Root".to_string(),
        email: "root@example.com".to_string(),
        role: Role::Admin,
    }
}
