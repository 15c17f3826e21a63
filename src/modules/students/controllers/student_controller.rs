use std::sync::Arc;

use actix_web::{web, HttpResponse};
use serde::Deserialize;

use crate::core::{ApiResponse, AppError, PageRequest, Pagination};
use crate::middleware::auth::Operator;
use crate::modules::students::models::{CreateStudentRequest, UpdateStudentRequest};
use crate::modules::students::services::StudentService;

#[derive(Debug, Deserialize)]
pub struct ListStudentsQuery {
    pub search: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

/// POST /students
pub async fn create_student(
    service: web::Data<Arc<StudentService>>,
    _operator: Operator,
    request: web::Json<CreateStudentRequest>,
) -> Result<HttpResponse, AppError> {
    let student = service.create_student(request.into_inner()).await?;
    Ok(ApiResponse::ok(student)
        .with_message("Student created")
        .into_created())
}

/// GET /students?search=&page=&limit=
pub async fn list_students(
    service: web::Data<Arc<StudentService>>,
    _operator: Operator,
    query: web::Query<ListStudentsQuery>,
) -> Result<HttpResponse, AppError> {
    let page = PageRequest::new(query.page, query.limit);
    let (students, total) = service
        .list_students(query.search.as_deref(), page)
        .await?;

    Ok(ApiResponse::<_, ()>::paginated(
        students,
        Pagination::new(page.page, page.limit, total),
        None,
    )
    .into_ok())
}

/// GET /students/{id}
pub async fn get_student(
    service: web::Data<Arc<StudentService>>,
    _operator: Operator,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let student = service.get_student(&path.into_inner()).await?;
    Ok(ApiResponse::ok(student).into_ok())
}

/// PUT /students/{id}
pub async fn update_student(
    service: web::Data<Arc<StudentService>>,
    _operator: Operator,
    path: web::Path<String>,
    request: web::Json<UpdateStudentRequest>,
) -> Result<HttpResponse, AppError> {
    let student = service
        .update_student(&path.into_inner(), request.into_inner())
        .await?;
    Ok(ApiResponse::ok(student)
        .with_message("Student updated")
        .into_ok())
}

/// GET /students/{id}/assignments
pub async fn student_assignments(
    service: web::Data<Arc<StudentService>>,
    _operator: Operator,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let assignments = service.student_assignments(&path.into_inner()).await?;
    Ok(ApiResponse::ok(assignments).into_ok())
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/students")
            .route("", web::post().to(create_student))
            .route("", web::get().to(list_students))
            .route("/{id}", web::get().to(get_student))
            .route("/{id}", web::put().to(update_student))
            .route("/{id}/assignments", web::get().to(student_assignments)),
    );
}
