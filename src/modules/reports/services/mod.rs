pub mod report_service;

pub use report_service::{validate_date_range, ReportService, MAX_REPORT_DAYS};
