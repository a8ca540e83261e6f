use std::sync::Arc;

use tokio::sync::Mutex;

use crate::config::SchedulingConfig;
use crate::errors::AppError;
use crate::models::{Booking, BookingFilter, BookingStatus, NewBooking};
use crate::services::calendar::generate_ics;
use crate::services::scheduling::{find_next_available_slot, Clock};
use crate::services::store::{BookingStore, ClaimOutcome};

const MAX_CLAIM_ATTEMPTS: usize = 3;

/// Booking lifecycle: create as pending, then approve into a slot or reject.
pub struct BookingService {
    store: Arc<dyn BookingStore>,
    config: SchedulingConfig,
    clock: Clock,
    // Search-and-commit runs one approval at a time within this process;
    // the store's conditional claim covers writers outside it.
    approvals: Mutex<()>,
}

impl BookingService {
    pub fn new(store: Arc<dyn BookingStore>, config: SchedulingConfig, clock: Clock) -> Self {
        Self {
            store,
            config,
            clock,
            approvals: Mutex::new(()),
        }
    }

    pub async fn create(&self, req: NewBooking) -> Result<Booking, AppError> {
        let booking = req.into_booking(uuid::Uuid::new_v4().to_string(), (self.clock)())?;
        self.store.create(&booking).await?;
        tracing::info!(booking_id = %booking.id, by = %booking.by, hrs = booking.hrs, "booking requested");
        Ok(booking)
    }

    pub async fn list(&self, filter: &BookingFilter) -> Result<Vec<Booking>, AppError> {
        Ok(self.store.find(filter).await?)
    }

    pub async fn get(&self, id: &str) -> Result<Booking, AppError> {
        self.store.find_by_id(id).await?.ok_or_else(not_found)
    }

    pub async fn approve(&self, id: &str) -> Result<Booking, AppError> {
        let _guard = self.approvals.lock().await;

        for attempt in 1..=MAX_CLAIM_ATTEMPTS {
            let booking = self.get(id).await?;
            if booking.status != BookingStatus::Pending {
                return Err(AppError::InvalidState);
            }

            let now = (self.clock)();
            let slot = find_next_available_slot(self.store.as_ref(), booking.hrs, now, &self.config)
                .await?
                .ok_or(AppError::NoCapacity)?;

            match self.store.claim_slot(id, &slot, &now).await? {
                ClaimOutcome::Claimed(booked) => {
                    tracing::info!(
                        booking_id = %id,
                        start = %slot.start,
                        end = %slot.end,
                        "booking approved"
                    );
                    return Ok(booked);
                }
                ClaimOutcome::NotPending(_) => return Err(AppError::InvalidState),
                ClaimOutcome::Missing => return Err(not_found()),
                ClaimOutcome::SlotTaken => {
                    tracing::warn!(booking_id = %id, attempt, start = %slot.start, "slot claimed concurrently, searching again");
                }
            }
        }

        Err(AppError::Conflict(
            "Slot was claimed concurrently, please retry".to_string(),
        ))
    }

    /// Rejection is allowed from any state.
    pub async fn reject(&self, id: &str) -> Result<Booking, AppError> {
        let mut booking = self.get(id).await?;
        booking.status = BookingStatus::Rejected;
        booking.updated_at = (self.clock)();

        if !self.store.save(&booking).await? {
            return Err(not_found());
        }
        tracing::info!(booking_id = %id, "booking rejected");
        Ok(booking)
    }

    pub async fn delete(&self, id: &str) -> Result<(), AppError> {
        if !self.store.delete(id).await? {
            return Err(not_found());
        }
        tracing::info!(booking_id = %id, "booking deleted");
        Ok(())
    }

    pub async fn calendar(&self, id: &str) -> Result<String, AppError> {
        let booking = self.get(id).await?;
        if booking.status != BookingStatus::Booked {
            return Err(AppError::Validation(
                "Booking has not been scheduled".to_string(),
            ));
        }
        generate_ics(&booking).ok_or_else(|| {
            AppError::Validation("Booking has not been scheduled".to_string())
        })
    }
}

fn not_found() -> AppError {
    AppError::NotFound("Booking not found".to_string())
}
