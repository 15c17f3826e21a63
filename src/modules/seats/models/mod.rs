pub mod assignment;
pub mod seat;
pub mod shift;

pub use assignment::{
    Assignment, AssignmentStatus, CreateAssignmentRequest, ReleaseAssignmentRequest,
};
pub use seat::{CreateSeatRequest, Seat, SeatStatus};
pub use shift::{CreateShiftRequest, Shift};
