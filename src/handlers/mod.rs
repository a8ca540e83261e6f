pub mod bookings;
pub mod calendar;
pub mod health;

use std::sync::Arc;

use axum::routing::{get, patch};
use axum::Router;

use crate::state::AppState;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health::health))
        .route(
            "/api/bookings",
            get(bookings::list_bookings).post(bookings::create_booking),
        )
        .route(
            "/api/bookings/:id",
            get(bookings::get_booking).delete(bookings::delete_booking),
        )
        .route("/api/bookings/:id/approve", patch(bookings::approve_booking))
        .route("/api/bookings/:id/reject", patch(bookings::reject_booking))
        .route(
            "/api/bookings/:id/calendar.ics",
            get(calendar::download_ics),
        )
        .with_state(state)
}
