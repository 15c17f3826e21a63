use std::sync::Arc;

use actix_web::{web, HttpResponse};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::info;

use crate::core::validators::sanitize_optional;
use crate::core::{ApiResponse, AppError, PageRequest, Pagination, Result};
use crate::middleware::auth::Operator;
use crate::middleware::RequestIdValue;
use crate::modules::payments::controllers::payment_response::{
    PaymentResponse, RecordedPaymentResponse,
};
use crate::modules::payments::models::{
    FeeType, PaymentFilter, PaymentMethod, PaymentPage, PaymentSort, PaymentStatus, PaymentSummary,
    PaymentUpdate, StatusFilter, UiPaymentMethod,
};
use crate::modules::payments::services::{
    CreatePaymentCommand, InstallmentCommand, PaymentService,
};
use crate::modules::reports::controllers::{dashboard, payment_stats};

/// Body of `POST /payments`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePaymentRequest {
    pub student_id: String,
    #[serde(alias = "seatNumber")]
    pub seat_no: String,
    pub collected_amount: Decimal,
    /// Dashboard vocabulary; unknown or missing values are recorded as cash
    #[serde(default)]
    pub payment_method: Option<String>,
    /// RFC 3339 timestamp or YYYY-MM-DD
    #[serde(default)]
    pub payment_date: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub transaction_id: Option<String>,
}

/// Body of `POST /payments/{id}/installments`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddInstallmentRequest {
    #[serde(alias = "collectedAmount")]
    pub amount: Decimal,
    #[serde(default)]
    pub payment_method: Option<String>,
    #[serde(default)]
    pub payment_date: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub transaction_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePaymentRequest {
    pub due_date: Option<String>,
    pub period_start: Option<NaiveDate>,
    pub period_end: Option<NaiveDate>,
    pub fee_type: Option<String>,
    pub description: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletePaymentRequest {
    pub payment_method: String,
}

#[derive(Debug, Deserialize)]
pub struct RefundPaymentRequest {
    pub reason: String,
}

/// `GET /payments` query; snake_case names with camelCase aliases
#[derive(Debug, Default, Deserialize)]
pub struct ListPaymentsQuery {
    pub status: Option<String>,
    #[serde(alias = "paymentMethod")]
    pub payment_method: Option<String>,
    #[serde(alias = "propertyId")]
    pub property_id: Option<String>,
    #[serde(alias = "studentId")]
    pub student_id: Option<String>,
    #[serde(alias = "startDate")]
    pub start_date: Option<NaiveDate>,
    #[serde(alias = "endDate")]
    pub end_date: Option<NaiveDate>,
    pub search: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
    #[serde(alias = "sortBy")]
    pub sort_by: Option<String>,
    #[serde(alias = "sortOrder")]
    pub sort_order: Option<String>,
}

impl ListPaymentsQuery {
    fn filter(&self) -> Result<PaymentFilter> {
        let status = self
            .status
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty() && !s.eq_ignore_ascii_case("all"))
            .map(StatusFilter::parse)
            .transpose()?;

        Ok(PaymentFilter {
            status,
            payment_method: self
                .payment_method
                .as_deref()
                .map(str::trim)
                .filter(|m| !m.is_empty() && !m.eq_ignore_ascii_case("all"))
                .map(method_filter),
            property_id: sanitize_optional(self.property_id.clone()),
            student_id: sanitize_optional(self.student_id.clone()),
            start_date: self.start_date,
            end_date: self.end_date,
            search: None,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct OverdueQuery {
    #[serde(alias = "propertyId")]
    pub property_id: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ReceiptQuery {
    #[serde(alias = "receiptNumber")]
    pub receipt_number: Option<String>,
}

/// Storage channel named by a list filter: storage names are accepted as-is,
/// anything else goes through the dashboard vocabulary
fn method_filter(value: &str) -> PaymentMethod {
    PaymentMethod::ALL
        .into_iter()
        .find(|m| m.as_str().eq_ignore_ascii_case(value))
        .unwrap_or_else(|| UiPaymentMethod::parse(value).to_storage())
}

/// Method named on a completion; either vocabulary, nothing else
fn required_method(value: &str) -> Result<PaymentMethod> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AppError::validation("paymentMethod is required"));
    }

    PaymentMethod::ALL
        .into_iter()
        .find(|m| m.as_str().eq_ignore_ascii_case(value))
        .or_else(|| UiPaymentMethod::try_parse(value).map(UiPaymentMethod::to_storage))
        .ok_or_else(|| AppError::validation(format!("Unknown payment method: '{}'", value)))
}

fn storage_method(value: Option<&str>) -> PaymentMethod {
    value
        .map(UiPaymentMethod::parse)
        .unwrap_or(UiPaymentMethod::Cash)
        .to_storage()
}

/// Accept an RFC 3339 timestamp or a bare date (midnight UTC)
fn parse_timestamp(value: &str, field: &str) -> Result<DateTime<Utc>> {
    let value = value.trim();

    if let Ok(timestamp) = DateTime::parse_from_rfc3339(value) {
        return Ok(timestamp.with_timezone(&Utc));
    }

    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map(|date| date.and_time(NaiveTime::MIN).and_utc())
        .map_err(|_| {
            AppError::validation(format!(
                "Invalid {}: '{}'. Expected YYYY-MM-DD or an RFC 3339 timestamp",
                field, value
            ))
        })
}

fn parse_optional_timestamp(value: Option<&str>, field: &str) -> Result<Option<DateTime<Utc>>> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(|v| parse_timestamp(v, field))
        .transpose()
}

fn installment_command(
    amount: Decimal,
    payment_method: Option<&str>,
    payment_date: Option<&str>,
    description: Option<String>,
    notes: Option<String>,
    transaction_id: Option<String>,
) -> Result<InstallmentCommand> {
    let mut command = InstallmentCommand::new(amount, storage_method(payment_method));
    command.payment_date = parse_optional_timestamp(payment_date, "paymentDate")?;
    command.description = sanitize_optional(description);
    command.notes = sanitize_optional(notes);
    command.transaction_id = sanitize_optional(transaction_id);
    Ok(command)
}

fn recorded_message(response: &RecordedPaymentResponse) -> &'static str {
    if response.payment.status == PaymentStatus::Completed {
        "Payment completed"
    } else {
        "Installment recorded"
    }
}

/// Correlate an accepted ledger change with the request that made it
fn log_ledger_change(
    request_id: &RequestIdValue,
    operator: &Operator,
    payment_id: &str,
    action: &'static str,
) {
    info!(
        request_id = request_id.0.as_str(),
        operator = operator.name.as_str(),
        payment_id,
        action,
        "Ledger change accepted"
    );
}

fn page_response(payments: PaymentPage, page: PageRequest) -> HttpResponse {
    ApiResponse::paginated(
        PaymentResponse::list(payments.payments, Utc::now()),
        Pagination::new(page.page, page.limit, payments.total),
        Some(payments.summary),
    )
    .into_ok()
}

/// POST /payments
pub async fn create_payment(
    service: web::Data<Arc<PaymentService>>,
    operator: Operator,
    request_id: RequestIdValue,
    request: web::Json<CreatePaymentRequest>,
) -> std::result::Result<HttpResponse, AppError> {
    let request = request.into_inner();

    let student_id = request.student_id.trim().to_string();
    if student_id.is_empty() {
        return Err(AppError::validation("studentId is required"));
    }
    if request.seat_no.trim().is_empty() {
        return Err(AppError::validation("seatNo is required"));
    }

    let command = CreatePaymentCommand {
        student_id,
        seat_number: request.seat_no,
        installment: installment_command(
            request.collected_amount,
            request.payment_method.as_deref(),
            request.payment_date.as_deref(),
            request.description,
            request.notes,
            request.transaction_id,
        )?,
    };

    let recorded = service.create_payment(command, &operator.name).await?;
    log_ledger_change(&request_id, &operator, &recorded.payment.id, "collect");
    let response = RecordedPaymentResponse::new(recorded, Utc::now());
    let message = recorded_message(&response);

    Ok(ApiResponse::ok(response).with_message(message).into_created())
}

/// GET /payments
pub async fn list_payments(
    service: web::Data<Arc<PaymentService>>,
    _operator: Operator,
    query: web::Query<ListPaymentsQuery>,
) -> std::result::Result<HttpResponse, AppError> {
    let filter = query.filter()?;
    let sort = PaymentSort::parse(query.sort_by.as_deref(), query.sort_order.as_deref())?;
    let page = PageRequest::new(query.page, query.limit);

    let payments = service
        .list_payments(filter, query.search.as_deref(), sort, page)
        .await?;

    Ok(page_response(payments, page))
}

/// GET /payments/overdue
pub async fn overdue_payments(
    service: web::Data<Arc<PaymentService>>,
    _operator: Operator,
    query: web::Query<OverdueQuery>,
) -> std::result::Result<HttpResponse, AppError> {
    let page = PageRequest::new(query.page, query.limit);
    let payments = service
        .overdue_payments(sanitize_optional(query.property_id.clone()), page)
        .await?;

    Ok(page_response(payments, page))
}

/// GET /payments/student/{student_id}
pub async fn student_payments(
    service: web::Data<Arc<PaymentService>>,
    _operator: Operator,
    path: web::Path<String>,
) -> std::result::Result<HttpResponse, AppError> {
    let payments = service.student_payments(&path.into_inner()).await?;
    let summary = PaymentSummary::from_payments(&payments);

    Ok(ApiResponse::summarized(PaymentResponse::list(payments, Utc::now()), summary).into_ok())
}

/// GET /payments/{id}
pub async fn get_payment(
    service: web::Data<Arc<PaymentService>>,
    _operator: Operator,
    path: web::Path<String>,
) -> std::result::Result<HttpResponse, AppError> {
    let details = service.get_payment(&path.into_inner()).await?;
    Ok(ApiResponse::ok(PaymentResponse::with_details(details, Utc::now())).into_ok())
}

/// PUT /payments/{id}
pub async fn update_payment(
    service: web::Data<Arc<PaymentService>>,
    operator: Operator,
    request_id: RequestIdValue,
    path: web::Path<String>,
    request: web::Json<UpdatePaymentRequest>,
) -> std::result::Result<HttpResponse, AppError> {
    let request = request.into_inner();

    let update = PaymentUpdate {
        due_date: parse_optional_timestamp(request.due_date.as_deref(), "dueDate")?,
        period_start: request.period_start,
        period_end: request.period_end,
        fee_type: request
            .fee_type
            .as_deref()
            .map(|f| f.parse::<FeeType>().map_err(AppError::validation))
            .transpose()?,
        description: sanitize_optional(request.description),
        notes: sanitize_optional(request.notes),
    };

    let payment = service.update_payment(&path.into_inner(), update).await?;
    log_ledger_change(&request_id, &operator, &payment.id, "update");
    Ok(ApiResponse::ok(PaymentResponse::new(payment, Utc::now()))
        .with_message("Payment updated")
        .into_ok())
}

/// POST /payments/{id}/installments
pub async fn add_installment(
    service: web::Data<Arc<PaymentService>>,
    operator: Operator,
    request_id: RequestIdValue,
    path: web::Path<String>,
    request: web::Json<AddInstallmentRequest>,
) -> std::result::Result<HttpResponse, AppError> {
    let request = request.into_inner();
    let command = installment_command(
        request.amount,
        request.payment_method.as_deref(),
        request.payment_date.as_deref(),
        request.description,
        request.notes,
        request.transaction_id,
    )?;

    let recorded = service
        .add_installment(&path.into_inner(), command, &operator.name)
        .await?;
    log_ledger_change(&request_id, &operator, &recorded.payment.id, "installment");
    let response = RecordedPaymentResponse::new(recorded, Utc::now());
    let message = recorded_message(&response);

    Ok(ApiResponse::ok(response).with_message(message).into_created())
}

/// PUT /payments/{id}/complete
pub async fn complete_payment(
    service: web::Data<Arc<PaymentService>>,
    operator: Operator,
    request_id: RequestIdValue,
    path: web::Path<String>,
    request: web::Json<CompletePaymentRequest>,
) -> std::result::Result<HttpResponse, AppError> {
    let method = required_method(&request.payment_method)?;

    let recorded = service
        .complete_payment(&path.into_inner(), method, &operator.name)
        .await?;
    log_ledger_change(&request_id, &operator, &recorded.payment.id, "complete");

    Ok(ApiResponse::ok(RecordedPaymentResponse::new(recorded, Utc::now()))
        .with_message("Payment completed")
        .into_ok())
}

/// PUT /payments/{id}/refund
pub async fn refund_payment(
    service: web::Data<Arc<PaymentService>>,
    operator: Operator,
    request_id: RequestIdValue,
    path: web::Path<String>,
    request: web::Json<RefundPaymentRequest>,
) -> std::result::Result<HttpResponse, AppError> {
    let payment = service
        .refund_payment(
            &path.into_inner(),
            request.into_inner().reason.trim().to_string(),
            &operator.name,
        )
        .await?;
    log_ledger_change(&request_id, &operator, &payment.id, "refund");

    Ok(ApiResponse::ok(PaymentResponse::new(payment, Utc::now()))
        .with_message("Payment refunded")
        .into_ok())
}

/// GET /payments/{id}/receipt?receiptNumber=
pub async fn payment_receipt(
    service: web::Data<Arc<PaymentService>>,
    _operator: Operator,
    path: web::Path<String>,
    query: web::Query<ReceiptQuery>,
) -> std::result::Result<HttpResponse, AppError> {
    let receipt = service
        .receipt(&path.into_inner(), query.receipt_number.as_deref())
        .await?;
    Ok(ApiResponse::ok(receipt).into_ok())
}

/// Static segments are registered before `/{id}` so they are matched first
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/payments")
            .route("", web::get().to(list_payments))
            .route("", web::post().to(create_payment))
            .route("/overdue", web::get().to(overdue_payments))
            .route("/stats/payment-stats", web::get().to(payment_stats))
            .route("/stats/dashboard", web::get().to(dashboard))
            .route("/student/{student_id}", web::get().to(student_payments))
            .route("/{id}", web::get().to(get_payment))
            .route("/{id}", web::put().to(update_payment))
            .route("/{id}/installments", web::post().to(add_installment))
            .route("/{id}/complete", web::put().to(complete_payment))
            .route("/{id}/refund", web::put().to(refund_payment))
            .route("/{id}/receipt", web::get().to(payment_receipt)),
    );
}
