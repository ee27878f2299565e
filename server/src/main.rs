use std::sync::Arc;

use dotenvy::dotenv;
use sqlx::postgres::PgPoolOptions;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use booking_server::clients::{
    EventDirectory, HttpEventDirectory, HttpNotifier, LogNotifier, NotificationSender,
};
use booking_server::config::Config;
use booking_server::payment::RandomPayment;
use booking_server::routes::{create_routes, AppState};
use booking_server::services::BookingService;
use booking_server::store::{BookingStore, InMemoryBookingStore, PgBookingStore};

const DEFAULT_LOG_FILTER: &str = "booking_server=info,tower_http=info";

#[tokio::main]
async fn main() {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .init();

    let config = Config::from_env();

    let store: Arc<dyn BookingStore> = if config.uses_memory_store() {
        tracing::warn!("Using in-memory booking store; data is lost on restart");
        Arc::new(InMemoryBookingStore::new())
    } else {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .connect(&config.database_url)
            .await
            .expect("Failed to connect to database");

        tracing::info!("Successfully connected to database");

        sqlx::migrate!()
            .run(&pool)
            .await
            .expect("Failed to run migrations");

        tracing::info!("Migrations run successfully");
        Arc::new(PgBookingStore::new(pool))
    };

    let directory: Arc<dyn EventDirectory> = Arc::new(
        HttpEventDirectory::new(&config.event_service_url, config.upstream_timeout)
            .expect("Failed to build event directory client"),
    );

    let notifier: Arc<dyn NotificationSender> = match &config.notification_url {
        Some(url) => Arc::new(
            HttpNotifier::new(url, config.upstream_timeout)
                .expect("Failed to build notification client"),
        ),
        None => Arc::new(LogNotifier),
    };

    let payment = Arc::new(RandomPayment::new(config.payment_failure_rate));

    let state = AppState {
        bookings: BookingService::new(store, directory, notifier, payment),
    };
    let app = create_routes(state, &config);

    tracing::info!(
        event_service = %config.event_service_url,
        failure_rate = config.payment_failure_rate,
        "Server running at http://{}",
        config.bind_addr
    );

    let listener = TcpListener::bind(config.bind_addr)
        .await
        .expect("Failed to bind address");

    axum::serve(listener, app).await.expect("Server failed");
}
