use std::sync::Arc;

use chrono::Utc;
use tracing::info;

use crate::core::{AppError, Result};
use crate::modules::properties::models::{CreatePropertyRequest, Property};
use crate::modules::properties::repositories::PropertyRepository;

pub struct PropertyService {
    repository: Arc<dyn PropertyRepository>,
}

impl PropertyService {
    pub fn new(repository: Arc<dyn PropertyRepository>) -> Self {
        Self { repository }
    }

    pub async fn create_property(&self, request: CreatePropertyRequest) -> Result<Property> {
        let property = Property::new(request, Utc::now())?;
        self.repository.create(&property).await?;

        info!(property_id = property.id.as_str(), name = property.name.as_str(), "Property created");

        Ok(property)
    }

    pub async fn get_property(&self, id: &str) -> Result<Property> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Property '{}' not found", id)))
    }

    pub async fn list_properties(&self, active_only: bool) -> Result<Vec<Property>> {
        self.repository.list(active_only).await
    }
}
