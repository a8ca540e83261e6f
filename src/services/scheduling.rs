use std::sync::Arc;

use chrono::{Duration, Local, NaiveDate, NaiveDateTime, NaiveTime};

use crate::config::SchedulingConfig;
use crate::models::{BookingFilter, BookingStatus, Slot};
use crate::services::store::BookingStore;

/// Source of the current local time.
pub type Clock = Arc<dyn Fn() -> NaiveDateTime + Send + Sync>;

pub fn local_clock() -> Clock {
    Arc::new(|| Local::now().naive_local())
}

pub fn fixed_clock(at: NaiveDateTime) -> Clock {
    Arc::new(move || at)
}

/// Fractional hours as a millisecond-precision duration, clamped to
/// `[0, i64::MAX / 1000]` milliseconds.
pub fn hours_to_duration(hrs: f64) -> Duration {
    let ms = (hrs * 3_600_000.0)
        .round()
        .clamp(0.0, (i64::MAX / 1000) as f64);
    Duration::milliseconds(ms as i64)
}

fn midnight(day: NaiveDate) -> NaiveDateTime {
    day.and_time(NaiveTime::MIN)
}

/// First `[start, start + duration)` on `day`, stepping from the window
/// opening, that fits before the window closes and overlaps none of `booked`.
pub fn first_free_slot(
    day: NaiveDate,
    duration: Duration,
    booked: &[(NaiveDateTime, NaiveDateTime)],
    config: &SchedulingConfig,
) -> Option<Slot> {
    let date = midnight(day);
    let day_start = date + Duration::hours(config.slot_start_hour as i64);
    let day_end = date + Duration::hours(config.slot_end_hour as i64);
    let step = Duration::minutes(config.search_step_minutes as i64);

    let mut candidate = day_start;
    while candidate + duration <= day_end {
        let slot = Slot {
            date,
            start: candidate,
            end: candidate + duration,
        };
        // Half-open: abutting intervals are not a conflict.
        if !booked.iter().any(|(start, end)| slot.overlaps(start, end)) {
            return Some(slot);
        }
        candidate += step;
    }
    None
}

/// Earliest free slot of `hrs` hours, starting with the day after `now` and
/// scanning at most `search_horizon_days` days. `None` when nothing fits.
pub async fn find_next_available_slot(
    store: &dyn BookingStore,
    hrs: f64,
    now: NaiveDateTime,
    config: &SchedulingConfig,
) -> anyhow::Result<Option<Slot>> {
    let duration = hours_to_duration(hrs);
    if duration <= Duration::zero() || duration > Duration::hours(config.window_hours() as i64) {
        tracing::debug!(hrs, "duration cannot fit in the working window");
        return Ok(None);
    }

    let Some(first_day) = now.date().succ_opt() else {
        return Ok(None);
    };

    for day in first_day
        .iter_days()
        .take(config.search_horizon_days as usize)
    {
        let filter = BookingFilter {
            status: Some(BookingStatus::Booked),
            from: Some(midnight(day)),
            to: Some(midnight(day) + Duration::days(1) - Duration::milliseconds(1)),
            ..Default::default()
        };
        let mut booked: Vec<(NaiveDateTime, NaiveDateTime)> = store
            .find(&filter)
            .await?
            .into_iter()
            .filter_map(|b| Some((b.start?, b.end?)))
            .collect();
        booked.sort();

        if let Some(slot) = first_free_slot(day, duration, &booked, config) {
            return Ok(Some(slot));
        }
        tracing::debug!(%day, existing = booked.len(), "no free slot, trying next day");
    }

    tracing::warn!(
        hrs,
        horizon_days = config.search_horizon_days,
        "slot search exhausted its horizon"
    );
    Ok(None)
}
