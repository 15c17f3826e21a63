use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::validators::sanitize_optional;
use crate::core::{AppError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Cancelled,
    Completed,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Cancelled => "cancelled",
            Self::Completed => "completed",
        }
    }
}

impl std::fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for BookingStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "confirmed" => Ok(Self::Confirmed),
            "cancelled" => Ok(Self::Cancelled),
            "completed" => Ok(Self::Completed),
            _ => Err(format!("Invalid booking status: {}", s)),
        }
    }
}

/// Short-term seat reservation, independent of the payment ledger
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub id: String,
    pub student_id: String,
    pub seat_id: String,
    pub shift_id: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub status: BookingStatus,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookingRequest {
    pub student_id: String,
    pub seat_id: String,
    #[serde(default)]
    pub shift_id: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct BookingFilter {
    pub student_id: Option<String>,
    pub seat_id: Option<String>,
    pub status: Option<BookingStatus>,
}

impl BookingFilter {
    pub fn matches(&self, booking: &Booking) -> bool {
        self.student_id.as_ref().is_none_or(|id| id == &booking.student_id)
            && self.seat_id.as_ref().is_none_or(|id| id == &booking.seat_id)
            && self.status.is_none_or(|status| status == booking.status)
    }
}

impl Booking {
    pub fn new(request: CreateBookingRequest, now: DateTime<Utc>) -> Result<Self> {
        if request.end_date < request.start_date {
            return Err(AppError::validation(format!(
                "endDate ({}) must not be before startDate ({})",
                request.end_date, request.start_date
            )));
        }

        Ok(Self {
            id: Uuid::new_v4().to_string(),
            student_id: request.student_id,
            seat_id: request.seat_id,
            shift_id: sanitize_optional(request.shift_id),
            start_date: request.start_date,
            end_date: request.end_date,
            status: BookingStatus::Pending,
            notes: sanitize_optional(request.notes),
            created_at: now,
            updated_at: now,
        })
    }

    /// Whether two bookings compete for the same seat on some day.
    /// Bookings on different shifts share the seat; a booking without a shift holds the whole day.
    pub fn conflicts_with(&self, other: &Booking) -> bool {
        if other.id == self.id || other.seat_id != self.seat_id {
            return false;
        }
        if other.status == BookingStatus::Cancelled {
            return false;
        }

        let shifts_overlap = match (&self.shift_id, &other.shift_id) {
            (Some(a), Some(b)) => a == b,
            _ => true,
        };

        shifts_overlap && self.start_date <= other.end_date && other.start_date <= self.end_date
    }

    pub fn cancel(&mut self, now: DateTime<Utc>) -> Result<()> {
        match self.status {
            BookingStatus::Pending | BookingStatus::Confirmed => {
                self.status = BookingStatus::Cancelled;
                self.updated_at = now;
                Ok(())
            }
            status => Err(AppError::validation(format!(
                "Cannot cancel a {} booking",
                status
            ))),
        }
    }

    pub fn confirm(&mut self, now: DateTime<Utc>) -> Result<()> {
        if self.status != BookingStatus::Pending {
            return Err(AppError::validation(format!(
                "Only pending bookings can be confirmed (status: {})",
                self.status
            )));
        }
        self.status = BookingStatus::Confirmed;
        self.updated_at = now;
        Ok(())
    }

    pub fn complete(&mut self, now: DateTime<Utc>) -> Result<()> {
        if self.status != BookingStatus::Confirmed {
            return Err(AppError::validation(format!(
                "Only confirmed bookings can be completed (status: {})",
                self.status
            )));
        }
        self.status = BookingStatus::Completed;
        self.updated_at = now;
        Ok(())
    }
}
