pub mod booking;

pub use booking::{Booking, BookingFilter, BookingStatus, CreateBookingRequest};
