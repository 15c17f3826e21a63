pub mod assignment_repository;
pub mod seat_repository;
pub mod shift_repository;

pub use assignment_repository::{AssignmentRepository, MySqlAssignmentRepository};
pub use seat_repository::{MySqlSeatRepository, SeatRepository};
pub use shift_repository::{MySqlShiftRepository, ShiftRepository};
