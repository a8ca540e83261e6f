use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::NaiveDateTime;
use rusqlite::Connection;

use crate::db::queries;
pub use crate::db::queries::ClaimOutcome;
use crate::models::{Booking, BookingFilter, Slot};

/// Persistence seam for bookings. Implementations guarantee single-document
/// atomicity only; `claim_slot` is the one conditional write.
#[async_trait]
pub trait BookingStore: Send + Sync {
    async fn create(&self, booking: &Booking) -> anyhow::Result<()>;
    async fn find_by_id(&self, id: &str) -> anyhow::Result<Option<Booking>>;
    async fn find(&self, filter: &BookingFilter) -> anyhow::Result<Vec<Booking>>;
    /// Returns false when no booking with that id exists.
    async fn save(&self, booking: &Booking) -> anyhow::Result<bool>;
    async fn claim_slot(
        &self,
        id: &str,
        slot: &Slot,
        now: &NaiveDateTime,
    ) -> anyhow::Result<ClaimOutcome>;
    async fn delete(&self, id: &str) -> anyhow::Result<bool>;
}

pub struct SqliteBookingStore {
    db: Arc<Mutex<Connection>>,
}

impl SqliteBookingStore {
    pub fn new(db: Arc<Mutex<Connection>>) -> Self {
        Self { db }
    }

    fn conn(&self) -> anyhow::Result<std::sync::MutexGuard<'_, Connection>> {
        self.db
            .lock()
            .map_err(|_| anyhow::anyhow!("database connection mutex poisoned"))
    }
}

#[async_trait]
impl BookingStore for SqliteBookingStore {
    async fn create(&self, booking: &Booking) -> anyhow::Result<()> {
        let conn = self.conn()?;
        queries::create_booking(&conn, booking)
    }

    async fn find_by_id(&self, id: &str) -> anyhow::Result<Option<Booking>> {
        let conn = self.conn()?;
        queries::get_booking_by_id(&conn, id)
    }

    async fn find(&self, filter: &BookingFilter) -> anyhow::Result<Vec<Booking>> {
        let conn = self.conn()?;
        queries::find_bookings(&conn, filter)
    }

    async fn save(&self, booking: &Booking) -> anyhow::Result<bool> {
        let conn = self.conn()?;
        queries::save_booking(&conn, booking)
    }

    async fn claim_slot(
        &self,
        id: &str,
        slot: &Slot,
        now: &NaiveDateTime,
    ) -> anyhow::Result<ClaimOutcome> {
        let conn = self.conn()?;
        queries::claim_slot(&conn, id, slot, now)
    }

    async fn delete(&self, id: &str) -> anyhow::Result<bool> {
        let conn = self.conn()?;
        queries::delete_booking(&conn, id)
    }
}
