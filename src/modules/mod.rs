pub mod bookings;
pub mod health;
pub mod payments;
pub mod properties;
pub mod reports;
pub mod seats;
pub mod students;
