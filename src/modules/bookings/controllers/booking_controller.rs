use std::sync::Arc;

use actix_web::{web, HttpResponse};
use serde::Deserialize;

use crate::core::{ApiResponse, AppError, PageRequest, Pagination};
use crate::middleware::auth::Operator;
use crate::modules::bookings::models::{BookingFilter, BookingStatus, CreateBookingRequest};
use crate::modules::bookings::services::BookingService;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListBookingsQuery {
    pub student_id: Option<String>,
    pub seat_id: Option<String>,
    pub status: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl ListBookingsQuery {
    fn filter(&self) -> Result<BookingFilter, AppError> {
        Ok(BookingFilter {
            student_id: self.student_id.clone(),
            seat_id: self.seat_id.clone(),
            status: self
                .status
                .as_deref()
                .map(|s| s.parse::<BookingStatus>().map_err(AppError::validation))
                .transpose()?,
        })
    }
}

/// POST /bookings
pub async fn create_booking(
    service: web::Data<Arc<BookingService>>,
    _operator: Operator,
    request: web::Json<CreateBookingRequest>,
) -> Result<HttpResponse, AppError> {
    let booking = service.create_booking(request.into_inner()).await?;
    Ok(ApiResponse::ok(booking)
        .with_message("Booking created")
        .into_created())
}

/// GET /bookings?studentId=&seatId=&status=&page=&limit=
pub async fn list_bookings(
    service: web::Data<Arc<BookingService>>,
    _operator: Operator,
    query: web::Query<ListBookingsQuery>,
) -> Result<HttpResponse, AppError> {
    let filter = query.filter()?;
    let page = PageRequest::new(query.page, query.limit);
    let (bookings, total) = service.list_bookings(&filter, page).await?;

    Ok(ApiResponse::<_, ()>::paginated(
        bookings,
        Pagination::new(page.page, page.limit, total),
        None,
    )
    .into_ok())
}

/// GET /bookings/{id}
pub async fn get_booking(
    service: web::Data<Arc<BookingService>>,
    _operator: Operator,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let booking = service.get_booking(&path.into_inner()).await?;
    Ok(ApiResponse::ok(booking).into_ok())
}

/// PUT /bookings/{id}/cancel
pub async fn cancel_booking(
    service: web::Data<Arc<BookingService>>,
    _operator: Operator,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let booking = service.cancel_booking(&path.into_inner()).await?;
    Ok(ApiResponse::ok(booking)
        .with_message("Booking cancelled")
        .into_ok())
}

/// PUT /bookings/{id}/confirm
pub async fn confirm_booking(
    service: web::Data<Arc<BookingService>>,
    _operator: Operator,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let booking = service.confirm_booking(&path.into_inner()).await?;
    Ok(ApiResponse::ok(booking)
        .with_message("Booking confirmed")
        .into_ok())
}

/// PUT /bookings/{id}/complete
pub async fn complete_booking(
    service: web::Data<Arc<BookingService>>,
    _operator: Operator,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let booking = service.complete_booking(&path.into_inner()).await?;
    Ok(ApiResponse::ok(booking)
        .with_message("Booking completed")
        .into_ok())
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/bookings")
            .route("", web::post().to(create_booking))
            .route("", web::get().to(list_bookings))
            .route("/{id}", web::get().to(get_booking))
            .route("/{id}/cancel", web::put().to(cancel_booking))
            .route("/{id}/confirm", web::put().to(confirm_booking))
            .route("/{id}/complete", web::put().to(complete_booking)),
    );
}
