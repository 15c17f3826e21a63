pub mod controllers;

pub use controllers::{configure, DatabaseProbe, ReadinessProbe};
