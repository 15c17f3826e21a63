use std::sync::Arc;

use actix_web::{web, HttpResponse};
use serde::Deserialize;

use crate::core::{ApiResponse, AppError};
use crate::middleware::auth::Operator;
use crate::modules::properties::models::CreatePropertyRequest;
use crate::modules::properties::services::PropertyService;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListPropertiesQuery {
    #[serde(default)]
    pub active_only: bool,
}

/// POST /properties
pub async fn create_property(
    service: web::Data<Arc<PropertyService>>,
    _operator: Operator,
    request: web::Json<CreatePropertyRequest>,
) -> Result<HttpResponse, AppError> {
    let property = service.create_property(request.into_inner()).await?;

    Ok(ApiResponse::ok(property)
        .with_message("Property created")
        .into_created())
}

/// GET /properties
pub async fn list_properties(
    service: web::Data<Arc<PropertyService>>,
    _operator: Operator,
    query: web::Query<ListPropertiesQuery>,
) -> Result<HttpResponse, AppError> {
    let properties = service.list_properties(query.active_only).await?;

    Ok(ApiResponse::ok(properties).into_ok())
}

/// GET /properties/{id}
pub async fn get_property(
    service: web::Data<Arc<PropertyService>>,
    _operator: Operator,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let property = service.get_property(&path.into_inner()).await?;

    Ok(ApiResponse::ok(property).into_ok())
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/properties")
            .route("", web::post().to(create_property))
            .route("", web::get().to(list_properties))
            .route("/{id}", web::get().to(get_property)),
    );
}
