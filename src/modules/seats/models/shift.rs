use chrono::{DateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::validators::sanitize_string;
use crate::core::{AppError, Result};

/// A daily time window seats are let out for (morning, evening, ...)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Shift {
    pub id: String,
    pub property_id: String,
    pub name: String,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateShiftRequest {
    pub property_id: String,
    pub name: String,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

impl Shift {
    pub fn new(request: CreateShiftRequest, now: DateTime<Utc>) -> Result<Self> {
        if request.name.trim().is_empty() {
            return Err(AppError::validation("Shift name is required"));
        }
        if request.start_time >= request.end_time {
            return Err(AppError::validation(format!(
                "Shift start ({}) must be before its end ({})",
                request.start_time, request.end_time
            )));
        }

        Ok(Self {
            id: Uuid::new_v4().to_string(),
            property_id: request.property_id.trim().to_string(),
            name: sanitize_string(&request.name),
            start_time: request.start_time,
            end_time: request.end_time,
            created_at: now,
        })
    }
}
