pub mod seat_controller;

pub use seat_controller::configure;
