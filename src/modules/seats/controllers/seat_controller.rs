use std::sync::Arc;

use actix_web::{web, HttpResponse};
use serde::Deserialize;

use crate::core::{ApiResponse, AppError};
use crate::middleware::auth::Operator;
use crate::modules::seats::models::{
    CreateAssignmentRequest, CreateSeatRequest, CreateShiftRequest, ReleaseAssignmentRequest,
};
use crate::modules::seats::services::SeatService;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListSeatsQuery {
    pub property_id: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListShiftsQuery {
    pub property_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateSeatStatusRequest {
    pub status: String,
}

/// POST /seats
pub async fn create_seat(
    service: web::Data<Arc<SeatService>>,
    _operator: Operator,
    request: web::Json<CreateSeatRequest>,
) -> Result<HttpResponse, AppError> {
    let seat = service.create_seat(request.into_inner()).await?;
    Ok(ApiResponse::ok(seat).with_message("Seat created").into_created())
}

/// GET /seats?propertyId=&status=
pub async fn list_seats(
    service: web::Data<Arc<SeatService>>,
    _operator: Operator,
    query: web::Query<ListSeatsQuery>,
) -> Result<HttpResponse, AppError> {
    let seats = service
        .list_seats(query.property_id.as_deref(), query.status.as_deref())
        .await?;
    Ok(ApiResponse::ok(seats).into_ok())
}

/// GET /seats/{id}
pub async fn get_seat(
    service: web::Data<Arc<SeatService>>,
    _operator: Operator,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let seat = service.get_seat(&path.into_inner()).await?;
    Ok(ApiResponse::ok(seat).into_ok())
}

/// PUT /seats/{id}/status
pub async fn update_seat_status(
    service: web::Data<Arc<SeatService>>,
    _operator: Operator,
    path: web::Path<String>,
    request: web::Json<UpdateSeatStatusRequest>,
) -> Result<HttpResponse, AppError> {
    let seat = service
        .update_seat_status(&path.into_inner(), &request.status)
        .await?;
    Ok(ApiResponse::ok(seat).with_message("Seat status updated").into_ok())
}

/// POST /shifts
pub async fn create_shift(
    service: web::Data<Arc<SeatService>>,
    _operator: Operator,
    request: web::Json<CreateShiftRequest>,
) -> Result<HttpResponse, AppError> {
    let shift = service.create_shift(request.into_inner()).await?;
    Ok(ApiResponse::ok(shift).with_message("Shift created").into_created())
}

/// GET /shifts?propertyId=
pub async fn list_shifts(
    service: web::Data<Arc<SeatService>>,
    _operator: Operator,
    query: web::Query<ListShiftsQuery>,
) -> Result<HttpResponse, AppError> {
    let shifts = service.list_shifts(query.property_id.as_deref()).await?;
    Ok(ApiResponse::ok(shifts).into_ok())
}

/// POST /assignments
pub async fn create_assignment(
    service: web::Data<Arc<SeatService>>,
    _operator: Operator,
    request: web::Json<CreateAssignmentRequest>,
) -> Result<HttpResponse, AppError> {
    let result = service.assign_seat(request.into_inner()).await?;
    Ok(ApiResponse::ok(result).with_message("Seat assigned").into_created())
}

/// PUT /assignments/{id}/release
pub async fn release_assignment(
    service: web::Data<Arc<SeatService>>,
    _operator: Operator,
    path: web::Path<String>,
    request: Option<web::Json<ReleaseAssignmentRequest>>,
) -> Result<HttpResponse, AppError> {
    let request = request.map(|r| r.into_inner()).unwrap_or_default();
    let assignment = service
        .release_assignment(&path.into_inner(), request)
        .await?;
    Ok(ApiResponse::ok(assignment)
        .with_message("Assignment released")
        .into_ok())
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/seats")
            .route("", web::post().to(create_seat))
            .route("", web::get().to(list_seats))
            .route("/{id}", web::get().to(get_seat))
            .route("/{id}/status", web::put().to(update_seat_status)),
    )
    .service(
        web::scope("/shifts")
            .route("", web::post().to(create_shift))
            .route("", web::get().to(list_shifts)),
    )
    .service(
        web::scope("/assignments")
            .route("", web::post().to(create_assignment))
            .route("/{id}/release", web::put().to(release_assignment)),
    );
}
