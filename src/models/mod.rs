pub mod booking;
pub mod slot;

pub use booking::{Booking, BookingFilter, BookingStatus, Category, NewBooking};
pub use slot::Slot;
