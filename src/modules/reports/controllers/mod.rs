pub mod report_controller;

pub use report_controller::{configure, dashboard, payment_stats, revenue};
