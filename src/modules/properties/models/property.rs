use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::validators::{sanitize_optional, sanitize_string, validate_phone};
use crate::core::{AppError, Result};

/// A branch/building that owns seats and shifts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Property {
    pub id: String,
    pub name: String,
    pub address: String,
    pub contact_phone: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePropertyRequest {
    pub name: String,
    pub address: String,
    #[serde(default)]
    pub contact_phone: Option<String>,
}

impl CreatePropertyRequest {
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(AppError::validation("Property name is required"));
        }
        if self.address.trim().is_empty() {
            return Err(AppError::validation("Property address is required"));
        }
        if let Some(phone) = self.contact_phone.as_deref().map(str::trim) {
            if !phone.is_empty() && !validate_phone(phone) {
                return Err(AppError::validation(format!(
                    "Invalid contact phone: {}",
                    phone
                )));
            }
        }
        Ok(())
    }
}

impl Property {
    pub fn new(request: CreatePropertyRequest, now: DateTime<Utc>) -> Result<Self> {
        request.validate()?;

        Ok(Self {
            id: Uuid::new_v4().to_string(),
            name: sanitize_string(&request.name),
            address: sanitize_string(&request.address),
            contact_phone: sanitize_optional(request.contact_phone),
            is_active: true,
            created_at: now,
            updated_at: now,
        })
    }
}
