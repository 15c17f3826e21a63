use std::sync::Arc;

use actix_web::{web, HttpResponse};
use chrono::{Duration, NaiveDate, Utc};
use serde::Deserialize;

use crate::core::{ApiResponse, AppError};
use crate::middleware::auth::Operator;
use crate::modules::reports::services::ReportService;

/// Days covered by a revenue report when no start date is given
const DEFAULT_REVENUE_DAYS: i64 = 30;

#[derive(Debug, Default, Deserialize)]
pub struct PropertyScopeQuery {
    #[serde(alias = "propertyId")]
    pub property_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RevenueQuery {
    /// Inclusive, YYYY-MM-DD; defaults to 30 days before `end_date`
    #[serde(alias = "startDate")]
    pub start_date: Option<NaiveDate>,
    /// Inclusive, YYYY-MM-DD; defaults to today
    #[serde(alias = "endDate")]
    pub end_date: Option<NaiveDate>,
    #[serde(alias = "propertyId")]
    pub property_id: Option<String>,
}

impl RevenueQuery {
    fn range(&self, today: NaiveDate) -> (NaiveDate, NaiveDate) {
        let end = self.end_date.unwrap_or(today);
        let start = self
            .start_date
            .unwrap_or(end - Duration::days(DEFAULT_REVENUE_DAYS - 1));
        (start, end)
    }
}

/// GET /payments/stats/payment-stats?propertyId=
pub async fn payment_stats(
    service: web::Data<Arc<ReportService>>,
    _operator: Operator,
    query: web::Query<PropertyScopeQuery>,
) -> Result<HttpResponse, AppError> {
    let stats = service.payment_stats(query.property_id.as_deref()).await?;
    Ok(ApiResponse::ok(stats).into_ok())
}

/// GET /payments/stats/dashboard?propertyId=
pub async fn dashboard(
    service: web::Data<Arc<ReportService>>,
    _operator: Operator,
    query: web::Query<PropertyScopeQuery>,
) -> Result<HttpResponse, AppError> {
    let stats = service.dashboard(query.property_id.as_deref()).await?;
    Ok(ApiResponse::ok(stats).into_ok())
}

/// GET /reports/revenue?startDate=&endDate=&propertyId=
pub async fn revenue(
    service: web::Data<Arc<ReportService>>,
    _operator: Operator,
    query: web::Query<RevenueQuery>,
) -> Result<HttpResponse, AppError> {
    let (start, end) = query.range(Utc::now().date_naive());
    let report = service
        .revenue(start, end, query.property_id.as_deref())
        .await?;
    Ok(ApiResponse::ok(report).into_ok())
}

/// Routes under `/reports`; the payment stats handlers are mounted by the payments scope
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(web::scope("/reports").route("/revenue", web::get().to(revenue)));
}
