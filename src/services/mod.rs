pub mod bookings;
pub mod calendar;
pub mod scheduling;
pub mod store;
