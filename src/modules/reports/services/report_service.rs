use std::sync::Arc;

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use tracing::{info, warn};

use crate::core::{AppError, Result};
use crate::modules::reports::models::{DashboardStats, PaymentStats, RevenueReport};
use crate::modules::reports::repositories::ReportRepository;

/// Longest range a revenue report may cover, both ends inclusive
pub const MAX_REPORT_DAYS: i64 = 366;

/// Read-only reporting over the payment ledger
pub struct ReportService {
    reports: Arc<dyn ReportRepository>,
}

impl ReportService {
    pub fn new(reports: Arc<dyn ReportRepository>) -> Self {
        Self { reports }
    }

    /// Per-status and per-method totals plus the overdue backlog
    pub async fn payment_stats(&self, property_id: Option<&str>) -> Result<PaymentStats> {
        let now = Utc::now();

        let by_status = self.reports.status_breakdown(property_id).await?;
        let by_method = self.reports.method_breakdown(property_id).await?;
        let overdue = self.reports.overdue_summary(property_id, now).await?;

        Ok(PaymentStats::new(by_status, by_method, overdue))
    }

    pub async fn dashboard(&self, property_id: Option<&str>) -> Result<DashboardStats> {
        let now = Utc::now();

        let counts = self
            .reports
            .dashboard_counts(property_id, month_start(now))
            .await?;
        let overdue = self.reports.overdue_summary(property_id, now).await?;

        Ok(DashboardStats::new(counts, overdue))
    }

    /// Collections per day between `start_date` and `end_date`, inclusive
    pub async fn revenue(
        &self,
        start_date: NaiveDate,
        end_date: NaiveDate,
        property_id: Option<&str>,
    ) -> Result<RevenueReport> {
        validate_date_range(start_date, end_date)?;

        info!(
            start = %start_date,
            end = %end_date,
            property_id = property_id.unwrap_or("all"),
            "Generating revenue report"
        );

        let days = self
            .reports
            .daily_revenue(start_date, end_date, property_id)
            .await?;
        let report = RevenueReport::new(
            start_date,
            end_date,
            property_id.map(str::to_string),
            days,
        );

        if report.is_empty() {
            warn!(start = %start_date, end = %end_date, "No collections in report period");
        }

        Ok(report)
    }
}

/// `start_date` must not be after `end_date`, and the range must fit in a year
pub fn validate_date_range(start_date: NaiveDate, end_date: NaiveDate) -> Result<()> {
    if start_date > end_date {
        return Err(AppError::validation(format!(
            "start_date ({}) must be before or equal to end_date ({})",
            start_date, end_date
        )));
    }

    let days = (end_date - start_date).num_days() + 1;
    if days > MAX_REPORT_DAYS {
        return Err(AppError::validation(format!(
            "Date range too large: {} days (maximum {} days)",
            days, MAX_REPORT_DAYS
        )));
    }

    Ok(())
}

fn month_start(now: DateTime<Utc>) -> DateTime<Utc> {
    now.date_naive()
        .with_day(1)
        .and_then(|day| day.and_hms_opt(0, 0, 0))
        .map(|start| start.and_utc())
        .unwrap_or(now)
}
