pub mod property;

pub use property::{CreatePropertyRequest, Property};
