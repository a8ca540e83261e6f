use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use crate::errors::AppError;
use crate::models::{Booking, BookingFilter, BookingStatus, NewBooking};
use crate::state::AppState;

// POST /api/bookings
pub async fn create_booking(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<NewBooking>, JsonRejection>,
) -> Result<(StatusCode, Json<Booking>), AppError> {
    let Json(req) = payload.map_err(|e| AppError::Validation(e.body_text()))?;
    let booking = state.bookings.create(req).await?;
    Ok((StatusCode::CREATED, Json(booking)))
}

// GET /api/bookings?status=&by=
#[derive(Deserialize)]
pub struct BookingsQuery {
    pub status: Option<String>,
    pub by: Option<String>,
}

pub async fn list_bookings(
    State(state): State<Arc<AppState>>,
    Query(query): Query<BookingsQuery>,
) -> Result<Json<Vec<Booking>>, AppError> {
    let status = match query.status.as_deref().filter(|s| !s.is_empty()) {
        Some(s) => Some(
            BookingStatus::parse(s)
                .ok_or_else(|| AppError::Validation(format!("Unknown status: {s}")))?,
        ),
        None => None,
    };
    let filter = BookingFilter {
        status,
        by: query.by.filter(|b| !b.is_empty()),
        ..Default::default()
    };

    Ok(Json(state.bookings.list(&filter).await?))
}

// GET /api/bookings/:id
pub async fn get_booking(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Booking>, AppError> {
    Ok(Json(state.bookings.get(&id).await?))
}

// PATCH /api/bookings/:id/approve
pub async fn approve_booking(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let booking = state.bookings.approve(&id).await?;
    Ok(Json(serde_json::json!({ "success": true, "booking": booking })))
}

// PATCH /api/bookings/:id/reject
pub async fn reject_booking(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let booking = state.bookings.reject(&id).await?;
    Ok(Json(serde_json::json!({ "success": true, "booking": booking })))
}

// DELETE /api/bookings/:id
pub async fn delete_booking(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    state.bookings.delete(&id).await?;
    Ok(Json(serde_json::json!({ "success": true })))
}
