//! Read-only aggregation over the payment ledger and seat inventory.

pub mod controllers;
pub mod models;
pub mod repositories;
pub mod services;

pub use repositories::{MySqlReportRepository, ReportRepository};
pub use services::ReportService;
