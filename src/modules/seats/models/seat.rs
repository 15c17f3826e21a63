use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::validators::sanitize_string;
use crate::core::{AppError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeatStatus {
    Available,
    Occupied,
    Reserved,
    Maintenance,
}

impl SeatStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Available => "available",
            Self::Occupied => "occupied",
            Self::Reserved => "reserved",
            Self::Maintenance => "maintenance",
        }
    }
}

impl std::fmt::Display for SeatStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for SeatStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "available" => Ok(Self::Available),
            "occupied" => Ok(Self::Occupied),
            "reserved" => Ok(Self::Reserved),
            "maintenance" => Ok(Self::Maintenance),
            _ => Err(format!("Invalid seat status: {}", s)),
        }
    }
}

/// A physical seat. `current_student_id` is a back reference kept in step
/// with assignments; the assignment rows are the source of truth.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Seat {
    pub id: String,
    pub property_id: String,
    pub seat_number: String,
    pub status: SeatStatus,
    pub current_student_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSeatRequest {
    pub property_id: String,
    pub seat_number: String,
}

impl Seat {
    pub fn new(request: CreateSeatRequest, now: DateTime<Utc>) -> Result<Self> {
        let seat_number = sanitize_string(&request.seat_number).to_uppercase();
        if seat_number.is_empty() {
            return Err(AppError::validation("Seat number is required"));
        }
        if request.property_id.trim().is_empty() {
            return Err(AppError::validation("propertyId is required"));
        }

        Ok(Self {
            id: Uuid::new_v4().to_string(),
            property_id: request.property_id.trim().to_string(),
            seat_number,
            status: SeatStatus::Available,
            current_student_id: None,
            created_at: now,
            updated_at: now,
        })
    }

    /// Manual status change from the dashboard. Occupancy is driven by
    /// assignments only, so `occupied` cannot be set by hand and an occupied
    /// seat cannot be moved elsewhere until it is released.
    pub fn set_status(&mut self, status: SeatStatus, now: DateTime<Utc>) -> Result<()> {
        if status == SeatStatus::Occupied {
            return Err(AppError::validation(
                "Seats become occupied through an assignment",
            ));
        }
        if self.status == SeatStatus::Occupied {
            return Err(AppError::validation(format!(
                "Seat {} is occupied; release its assignments first",
                self.seat_number
            )));
        }

        self.status = status;
        self.updated_at = now;
        Ok(())
    }

    pub fn occupy(&mut self, student_id: &str, now: DateTime<Utc>) {
        self.status = SeatStatus::Occupied;
        self.current_student_id = Some(student_id.to_string());
        self.updated_at = now;
    }

    pub fn vacate(&mut self, now: DateTime<Utc>) {
        self.status = SeatStatus::Available;
        self.current_student_id = None;
        self.updated_at = now;
    }

    pub fn accepts_assignment(&self) -> Result<()> {
        match self.status {
            SeatStatus::Maintenance => Err(AppError::validation(format!(
                "Seat {} is under maintenance",
                self.seat_number
            ))),
            _ => Ok(()),
        }
    }
}
