use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::{AppError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssignmentStatus {
    Active,
    Ended,
}

impl AssignmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Ended => "ended",
        }
    }
}

impl std::str::FromStr for AssignmentStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "active" => Ok(Self::Active),
            "ended" => Ok(Self::Ended),
            _ => Err(format!("Invalid assignment status: {}", s)),
        }
    }
}

/// A student's claim on a seat for one shift; billed through one payment ledger
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Assignment {
    pub id: String,
    pub student_id: String,
    pub seat_id: String,
    pub shift_id: String,
    pub monthly_rent: Decimal,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub status: AssignmentStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAssignmentRequest {
    pub student_id: String,
    pub seat_id: String,
    pub shift_id: String,
    /// Falls back to the configured default rent
    #[serde(default)]
    pub monthly_rent: Option<Decimal>,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReleaseAssignmentRequest {
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
}

impl Assignment {
    pub fn new(
        request: CreateAssignmentRequest,
        default_rent: Decimal,
        now: DateTime<Utc>,
    ) -> Result<Self> {
        let monthly_rent = request.monthly_rent.unwrap_or(default_rent);
        if monthly_rent <= Decimal::ZERO || monthly_rent.round_dp(2) != monthly_rent {
            return Err(AppError::validation(format!(
                "Monthly rent must be a positive amount with at most 2 decimal places, got {}",
                monthly_rent
            )));
        }

        Ok(Self {
            id: Uuid::new_v4().to_string(),
            student_id: request.student_id,
            seat_id: request.seat_id,
            shift_id: request.shift_id,
            monthly_rent,
            start_date: request.start_date.unwrap_or_else(|| now.date_naive()),
            end_date: None,
            status: AssignmentStatus::Active,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn is_active(&self) -> bool {
        self.status == AssignmentStatus::Active
    }

    pub fn release(&mut self, end_date: Option<NaiveDate>, now: DateTime<Utc>) -> Result<()> {
        if !self.is_active() {
            return Err(AppError::validation(format!(
                "Assignment {} has already ended",
                self.id
            )));
        }

        let end_date = end_date.unwrap_or_else(|| now.date_naive());
        if end_date < self.start_date {
            return Err(AppError::validation(format!(
                "End date ({}) must not be before the start date ({})",
                end_date, self.start_date
            )));
        }

        self.status = AssignmentStatus::Ended;
        self.end_date = Some(end_date);
        self.updated_at = now;
        Ok(())
    }
}
