use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::models::Slot;
use crate::services::scheduling::hours_to_duration;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub id: String,
    pub by: String,
    pub title: String,
    pub hrs: f64,
    #[serde(rename = "type")]
    pub booking_type: String,
    pub category: Category,
    pub status: BookingStatus,
    pub date: Option<NaiveDateTime>,
    pub start: Option<NaiveDateTime>,
    pub end: Option<NaiveDateTime>,
    pub link: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Booking {
    pub fn slot(&self) -> Option<Slot> {
        match (self.date, self.start, self.end) {
            (Some(date), Some(start), Some(end)) => Some(Slot { date, start, end }),
            _ => None,
        }
    }
}

/// `Approved` is accepted on the wire and in storage but nothing transitions
/// into it; approval goes straight from `Pending` to `Booked`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Pending,
    Approved,
    Booked,
    Rejected,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Approved => "approved",
            BookingStatus::Booked => "booked",
            BookingStatus::Rejected => "rejected",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(BookingStatus::Pending),
            "approved" => Some(BookingStatus::Approved),
            "booked" => Some(BookingStatus::Booked),
            "rejected" => Some(BookingStatus::Rejected),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Recorded,
    Live,
    #[default]
    Onsite,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Recorded => "recorded",
            Category::Live => "live",
            Category::Onsite => "onsite",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "recorded" => Category::Recorded,
            "live" => Category::Live,
            _ => Category::Onsite,
        }
    }
}

/// Body of `POST /api/bookings`. Every field is optional here so a missing
/// one surfaces as a validation error instead of a deserialization failure.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewBooking {
    pub by: Option<String>,
    pub title: Option<String>,
    pub hrs: Option<f64>,
    #[serde(rename = "type")]
    pub booking_type: Option<String>,
    pub category: Option<Category>,
}

impl NewBooking {
    pub fn into_booking(self, id: String, now: NaiveDateTime) -> Result<Booking, AppError> {
        let by = required(self.by, "by")?;
        let title = required(self.title, "title")?;
        let booking_type = required(self.booking_type, "type")?;
        let hrs = self
            .hrs
            .ok_or_else(|| AppError::Validation("Missing required field: hrs".to_string()))?;
        if !hrs.is_finite() || hrs <= 0.0 || hours_to_duration(hrs) <= Duration::zero() {
            return Err(AppError::Validation(
                "hrs must be a positive number".to_string(),
            ));
        }

        Ok(Booking {
            id,
            by,
            title,
            hrs,
            booking_type,
            category: self.category.unwrap_or_default(),
            status: BookingStatus::Pending,
            date: None,
            start: None,
            end: None,
            link: None,
            created_at: now,
            updated_at: now,
        })
    }
}

fn required(value: Option<String>, field: &str) -> Result<String, AppError> {
    match value.map(|v| v.trim().to_string()) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(AppError::Validation(format!(
            "Missing required field: {field}"
        ))),
    }
}

/// Equality and date-range predicates for listing bookings.
#[derive(Debug, Clone, Default)]
pub struct BookingFilter {
    pub status: Option<BookingStatus>,
    pub by: Option<String>,
    pub from: Option<NaiveDateTime>,
    pub to: Option<NaiveDateTime>,
}
