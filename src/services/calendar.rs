use crate::models::Booking;

/// iCalendar event for a scheduled booking; `None` until a slot is assigned.
pub fn generate_ics(booking: &Booking) -> Option<String> {
    let slot = booking.slot()?;
    let dtstart = slot.start.format("%Y%m%dT%H%M%S").to_string();
    let dtend = slot.end.format("%Y%m%dT%H%M%S").to_string();
    let dtstamp = booking.updated_at.format("%Y%m%dT%H%M%S").to_string();
    let uid = format!("{}@institute-bookings", booking.id);

    let summary = escape_text(&booking.title);
    let mut description = format!(
        "{} session ({}) requested by {}",
        booking.category.as_str(),
        booking.booking_type,
        booking.by
    );
    if let Some(link) = &booking.link {
        description.push_str(&format!(" - {link}"));
    }
    let description = escape_text(&description);

    Some(format!(
        "BEGIN:VCALENDAR\r\n\
         VERSION:2.0\r\n\
         PRODID:-//Institute//Bookings//EN\r\n\
         BEGIN:VEVENT\r\n\
         UID:{uid}\r\n\
         DTSTAMP:{dtstamp}\r\n\
         DTSTART:{dtstart}\r\n\
         DTEND:{dtend}\r\n\
         SUMMARY:{summary}\r\n\
         DESCRIPTION:{description}\r\n\
         END:VEVENT\r\n\
         END:VCALENDAR\r\n"
    ))
}

fn escape_text(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace(';', "\\;")
        .replace(',', "\\,")
        .replace('\n', "\\n")
}
