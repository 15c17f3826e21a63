pub mod error;
pub mod response;
pub mod validators;

pub use error::{AppError, Result};
pub use response::{ApiResponse, PageRequest, Pagination};
