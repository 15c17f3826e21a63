use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use crate::core::{AppError, PageRequest, Result};
use crate::modules::bookings::models::{Booking, BookingFilter, CreateBookingRequest};
use crate::modules::bookings::repositories::BookingRepository;
use crate::modules::seats::models::SeatStatus;
use crate::modules::seats::repositories::SeatRepository;
use crate::modules::students::repositories::StudentRepository;

pub struct BookingService {
    bookings: Arc<dyn BookingRepository>,
    seats: Arc<dyn SeatRepository>,
    students: Arc<dyn StudentRepository>,
}

impl BookingService {
    pub fn new(
        bookings: Arc<dyn BookingRepository>,
        seats: Arc<dyn SeatRepository>,
        students: Arc<dyn StudentRepository>,
    ) -> Self {
        Self {
            bookings,
            seats,
            students,
        }
    }

    pub async fn create_booking(&self, request: CreateBookingRequest) -> Result<Booking> {
        let booking = Booking::new(request, Utc::now())?;

        self.students
            .find_by_id(&booking.student_id)
            .await?
            .ok_or_else(|| {
                AppError::not_found(format!("Student '{}' not found", booking.student_id))
            })?;

        let seat = self
            .seats
            .find_by_id(&booking.seat_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Seat '{}' not found", booking.seat_id)))?;
        if seat.status == SeatStatus::Maintenance {
            return Err(AppError::validation(format!(
                "Seat {} is under maintenance",
                seat.seat_number
            )));
        }

        if let Err(e) = self.bookings.create(&booking).await {
            if matches!(e, AppError::Conflict(_)) {
                warn!(
                    seat_id = booking.seat_id.as_str(),
                    start_date = %booking.start_date,
                    end_date = %booking.end_date,
                    "Booking rejected: overlapping reservation"
                );
            }
            return Err(e);
        }

        info!(
            booking_id = booking.id.as_str(),
            seat_id = booking.seat_id.as_str(),
            "Booking created"
        );

        Ok(booking)
    }

    pub async fn get_booking(&self, id: &str) -> Result<Booking> {
        self.bookings
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Booking '{}' not found", id)))
    }

    pub async fn list_bookings(
        &self,
        filter: &BookingFilter,
        page: PageRequest,
    ) -> Result<(Vec<Booking>, u64)> {
        self.bookings.list(filter, page).await
    }

    pub async fn cancel_booking(&self, id: &str) -> Result<Booking> {
        let mut booking = self.get_booking(id).await?;
        booking.cancel(Utc::now())?;
        self.bookings.update_status(&booking).await?;

        info!(booking_id = booking.id.as_str(), "Booking cancelled");
        Ok(booking)
    }

    pub async fn confirm_booking(&self, id: &str) -> Result<Booking> {
        let mut booking = self.get_booking(id).await?;
        booking.confirm(Utc::now())?;
        self.bookings.update_status(&booking).await?;

        info!(booking_id = booking.id.as_str(), "Booking confirmed");
        Ok(booking)
    }

    pub async fn complete_booking(&self, id: &str) -> Result<Booking> {
        let mut booking = self.get_booking(id).await?;
        booking.complete(Utc::now())?;
        self.bookings.update_status(&booking).await?;

        info!(booking_id = booking.id.as_str(), "Booking completed");
        Ok(booking)
    }
}
