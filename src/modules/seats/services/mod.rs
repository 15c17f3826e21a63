pub mod seat_service;

pub use seat_service::{SeatAssignment, SeatService};
