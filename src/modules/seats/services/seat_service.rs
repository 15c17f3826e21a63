use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{info, warn};

use crate::core::{AppError, Result};
use crate::modules::properties::repositories::PropertyRepository;
use crate::modules::seats::models::{
    Assignment, CreateAssignmentRequest, CreateSeatRequest, CreateShiftRequest,
    ReleaseAssignmentRequest, Seat, SeatStatus, Shift,
};
use crate::modules::seats::repositories::{
    AssignmentRepository, SeatRepository, ShiftRepository,
};
use crate::modules::students::repositories::StudentRepository;

/// Result of assigning a student to a seat
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeatAssignment {
    pub assignment: Assignment,
    pub seat: Seat,
}

/// Seats, shifts and assignments
pub struct SeatService {
    seats: Arc<dyn SeatRepository>,
    shifts: Arc<dyn ShiftRepository>,
    assignments: Arc<dyn AssignmentRepository>,
    properties: Arc<dyn PropertyRepository>,
    students: Arc<dyn StudentRepository>,
    default_monthly_rent: Decimal,
}

impl SeatService {
    pub fn new(
        seats: Arc<dyn SeatRepository>,
        shifts: Arc<dyn ShiftRepository>,
        assignments: Arc<dyn AssignmentRepository>,
        properties: Arc<dyn PropertyRepository>,
        students: Arc<dyn StudentRepository>,
        default_monthly_rent: Decimal,
    ) -> Self {
        Self {
            seats,
            shifts,
            assignments,
            properties,
            students,
            default_monthly_rent,
        }
    }

    async fn require_property(&self, property_id: &str) -> Result<()> {
        self.properties
            .find_by_id(property_id)
            .await?
            .map(|_| ())
            .ok_or_else(|| AppError::not_found(format!("Property '{}' not found", property_id)))
    }

    pub async fn create_seat(&self, request: CreateSeatRequest) -> Result<Seat> {
        let seat = Seat::new(request, Utc::now())?;
        self.require_property(&seat.property_id).await?;

        self.seats.create(&seat).await?;
        info!(seat_id = seat.id.as_str(), seat_number = seat.seat_number.as_str(), "Seat created");

        Ok(seat)
    }

    pub async fn get_seat(&self, id: &str) -> Result<Seat> {
        self.seats
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Seat '{}' not found", id)))
    }

    pub async fn list_seats(
        &self,
        property_id: Option<&str>,
        status: Option<&str>,
    ) -> Result<Vec<Seat>> {
        let status = status
            .map(|s| s.parse::<SeatStatus>().map_err(AppError::validation))
            .transpose()?;

        self.seats.list(property_id, status).await
    }

    pub async fn update_seat_status(&self, id: &str, status: &str) -> Result<Seat> {
        let status: SeatStatus = status.parse().map_err(AppError::validation)?;
        let mut seat = self.get_seat(id).await?;
        let previous = seat.status;

        seat.set_status(status, Utc::now())?;
        self.seats.update(&seat).await?;

        info!(
            seat_id = seat.id.as_str(),
            from = %previous,
            to = %seat.status,
            "Seat status changed"
        );

        Ok(seat)
    }

    pub async fn create_shift(&self, request: CreateShiftRequest) -> Result<Shift> {
        let shift = Shift::new(request, Utc::now())?;
        self.require_property(&shift.property_id).await?;

        self.shifts.create(&shift).await?;
        info!(shift_id = shift.id.as_str(), name = shift.name.as_str(), "Shift created");

        Ok(shift)
    }

    pub async fn list_shifts(&self, property_id: Option<&str>) -> Result<Vec<Shift>> {
        self.shifts.list(property_id).await
    }

    /// Assign a student to a seat for one shift and mark the seat occupied
    pub async fn assign_seat(&self, request: CreateAssignmentRequest) -> Result<SeatAssignment> {
        let student = self
            .students
            .find_by_id(&request.student_id)
            .await?
            .ok_or_else(|| {
                AppError::not_found(format!("Student '{}' not found", request.student_id))
            })?;
        if !student.is_active {
            return Err(AppError::validation(format!(
                "Student '{}' is inactive",
                student.id
            )));
        }

        let seat = self.get_seat(&request.seat_id).await?;
        let shift = self
            .shifts
            .find_by_id(&request.shift_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Shift '{}' not found", request.shift_id)))?;

        if shift.property_id != seat.property_id {
            return Err(AppError::validation(format!(
                "Shift '{}' does not belong to the property of seat {}",
                shift.name, seat.seat_number
            )));
        }

        let now = Utc::now();
        let assignment = Assignment::new(request, self.default_monthly_rent, now)?;
        let seat = self.assignments.assign(&assignment, now).await.map_err(|e| {
            if matches!(e, AppError::Conflict(_)) {
                warn!(seat_id = seat.id.as_str(), shift_id = shift.id.as_str(), "Seat already taken for shift");
            }
            e
        })?;

        info!(
            assignment_id = assignment.id.as_str(),
            student_id = assignment.student_id.as_str(),
            seat_number = seat.seat_number.as_str(),
            monthly_rent = %assignment.monthly_rent,
            "Seat assigned"
        );

        Ok(SeatAssignment { assignment, seat })
    }

    pub async fn release_assignment(
        &self,
        id: &str,
        request: ReleaseAssignmentRequest,
    ) -> Result<Assignment> {
        let assignment = self
            .assignments
            .release(id, request.end_date, Utc::now())
            .await?;

        info!(
            assignment_id = assignment.id.as_str(),
            seat_id = assignment.seat_id.as_str(),
            "Assignment released"
        );

        Ok(assignment)
    }
}
