use std::sync::{Arc, Mutex};

use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use institute_bookings::config::AppConfig;
use institute_bookings::db;
use institute_bookings::handlers;
use institute_bookings::services::bookings::BookingService;
use institute_bookings::services::scheduling::local_clock;
use institute_bookings::services::store::SqliteBookingStore;
use institute_bookings::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::from_env();
    config.scheduling.validate()?;
    tracing::info!(
        window_start = config.scheduling.slot_start_hour,
        window_end = config.scheduling.slot_end_hour,
        step_minutes = config.scheduling.search_step_minutes,
        horizon_days = config.scheduling.search_horizon_days,
        "scheduling configured"
    );

    let conn = db::init_db(&config.database_url)?;
    let store = SqliteBookingStore::new(Arc::new(Mutex::new(conn)));

    let state = Arc::new(AppState {
        bookings: BookingService::new(Arc::new(store), config.scheduling.clone(), local_clock()),
        config: config.clone(),
    });

    let app = handlers::router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("starting server on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
