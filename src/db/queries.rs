use anyhow::Context;
use chrono::NaiveDateTime;
use rusqlite::types::ToSql;
use rusqlite::{params, Connection};

use crate::models::{Booking, BookingFilter, BookingStatus, Category, Slot};

/// Local-time text with millisecond precision; lexical order is chronological.
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

const BOOKING_COLUMNS: &str = "id, requested_by, title, hrs, booking_type, category, status, \
     date, start_at, end_at, link, created_at, updated_at";

/// Result of a conditional slot claim.
#[derive(Debug, Clone, PartialEq)]
pub enum ClaimOutcome {
    Claimed(Booking),
    NotPending(Booking),
    SlotTaken,
    Missing,
}

fn fmt_ts(dt: &NaiveDateTime) -> String {
    dt.format(DATETIME_FORMAT).to_string()
}

fn parse_ts(s: &str) -> anyhow::Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, DATETIME_FORMAT)
        .with_context(|| format!("malformed timestamp in bookings table: {s}"))
}

// ── Bookings ──

pub fn create_booking(conn: &Connection, booking: &Booking) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO bookings (id, requested_by, title, hrs, booking_type, category, status, date, start_at, end_at, link, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
        params![
            booking.id,
            booking.by,
            booking.title,
            booking.hrs,
            booking.booking_type,
            booking.category.as_str(),
            booking.status.as_str(),
            booking.date.as_ref().map(fmt_ts),
            booking.start.as_ref().map(fmt_ts),
            booking.end.as_ref().map(fmt_ts),
            booking.link,
            fmt_ts(&booking.created_at),
            fmt_ts(&booking.updated_at),
        ],
    )?;
    Ok(())
}

pub fn get_booking_by_id(conn: &Connection, id: &str) -> anyhow::Result<Option<Booking>> {
    let result = conn.query_row(
        &format!("SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = ?1"),
        params![id],
        |row| Ok(parse_booking_row(row)),
    );

    match result {
        Ok(booking) => Ok(Some(booking?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Bookings matching every set predicate, ordered by slot start. Unscheduled
/// bookings (null start) sort first.
pub fn find_bookings(conn: &Connection, filter: &BookingFilter) -> anyhow::Result<Vec<Booking>> {
    let mut clauses: Vec<&str> = vec![];
    let mut params_vec: Vec<Box<dyn ToSql>> = vec![];

    if let Some(status) = filter.status {
        clauses.push("status = ?");
        params_vec.push(Box::new(status.as_str()));
    }
    if let Some(by) = &filter.by {
        clauses.push("requested_by = ?");
        params_vec.push(Box::new(by.clone()));
    }
    if let Some(from) = &filter.from {
        clauses.push("date >= ?");
        params_vec.push(Box::new(fmt_ts(from)));
    }
    if let Some(to) = &filter.to {
        clauses.push("date <= ?");
        params_vec.push(Box::new(fmt_ts(to)));
    }

    let mut sql = format!("SELECT {BOOKING_COLUMNS} FROM bookings");
    if !clauses.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&clauses.join(" AND "));
    }
    sql.push_str(" ORDER BY start_at ASC, created_at ASC");

    let mut stmt = conn.prepare(&sql)?;
    let params_refs: Vec<&dyn ToSql> = params_vec.iter().map(|p| p.as_ref()).collect();
    let rows = stmt.query_map(params_refs.as_slice(), |row| Ok(parse_booking_row(row)))?;

    let mut bookings = vec![];
    for row in rows {
        bookings.push(row??);
    }
    Ok(bookings)
}

pub fn save_booking(conn: &Connection, booking: &Booking) -> anyhow::Result<bool> {
    let count = conn.execute(
        "UPDATE bookings SET requested_by = ?1, title = ?2, hrs = ?3, booking_type = ?4, category = ?5,
           status = ?6, date = ?7, start_at = ?8, end_at = ?9, link = ?10, updated_at = ?11
         WHERE id = ?12",
        params![
            booking.by,
            booking.title,
            booking.hrs,
            booking.booking_type,
            booking.category.as_str(),
            booking.status.as_str(),
            booking.date.as_ref().map(fmt_ts),
            booking.start.as_ref().map(fmt_ts),
            booking.end.as_ref().map(fmt_ts),
            booking.link,
            fmt_ts(&booking.updated_at),
            booking.id,
        ],
    )?;
    Ok(count > 0)
}

/// Moves a pending booking to `booked` on `slot`, in one statement, only if no
/// other booked interval overlaps it.
pub fn claim_slot(
    conn: &Connection,
    id: &str,
    slot: &Slot,
    now: &NaiveDateTime,
) -> anyhow::Result<ClaimOutcome> {
    let start = fmt_ts(&slot.start);
    let end = fmt_ts(&slot.end);

    let count = conn.execute(
        "UPDATE bookings SET status = 'booked', date = ?1, start_at = ?2, end_at = ?3, updated_at = ?4
         WHERE id = ?5 AND status = 'pending'
           AND NOT EXISTS (
             SELECT 1 FROM bookings other
             WHERE other.status = 'booked' AND other.id != ?5
               AND other.start_at < ?3 AND other.end_at > ?2
           )",
        params![fmt_ts(&slot.date), start, end, fmt_ts(now), id],
    )?;

    let current = get_booking_by_id(conn, id)?;
    Ok(match current {
        None => ClaimOutcome::Missing,
        Some(b) if count > 0 => ClaimOutcome::Claimed(b),
        Some(b) if b.status != BookingStatus::Pending => ClaimOutcome::NotPending(b),
        Some(_) => ClaimOutcome::SlotTaken,
    })
}

pub fn delete_booking(conn: &Connection, id: &str) -> anyhow::Result<bool> {
    let count = conn.execute("DELETE FROM bookings WHERE id = ?1", params![id])?;
    Ok(count > 0)
}

fn parse_booking_row(row: &rusqlite::Row) -> anyhow::Result<Booking> {
    let status_str: String = row.get(6)?;
    let category_str: String = row.get(5)?;
    let date: Option<String> = row.get(7)?;
    let start: Option<String> = row.get(8)?;
    let end: Option<String> = row.get(9)?;
    let created_at: String = row.get(11)?;
    let updated_at: String = row.get(12)?;

    let status = BookingStatus::parse(&status_str)
        .with_context(|| format!("unknown booking status in bookings table: {status_str}"))?;

    Ok(Booking {
        id: row.get(0)?,
        by: row.get(1)?,
        title: row.get(2)?,
        hrs: row.get(3)?,
        booking_type: row.get(4)?,
        category: Category::parse(&category_str),
        status,
        date: date.as_deref().map(parse_ts).transpose()?,
        start: start.as_deref().map(parse_ts).transpose()?,
        end: end.as_deref().map(parse_ts).transpose()?,
        link: row.get(10)?,
        created_at: parse_ts(&created_at)?,
        updated_at: parse_ts(&updated_at)?,
    })
}
