// Short-term seat bookings and seat assignment rules

#[macro_use]
#[path = "../helpers/mod.rs"]
mod helpers;

use chrono::NaiveDate;
use rust_decimal_macros::dec;

use helpers::TestContext;
use smlekha::core::{AppError, PageRequest};
use smlekha::modules::bookings::models::{BookingFilter, BookingStatus, CreateBookingRequest};
use smlekha::modules::seats::models::{
    CreateAssignmentRequest, ReleaseAssignmentRequest, SeatStatus,
};

fn june(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 6, day).unwrap()
}

fn booking(
    student_id: &str,
    seat_id: &str,
    shift_id: Option<&str>,
    start: u32,
    end: u32,
) -> CreateBookingRequest {
    CreateBookingRequest {
        student_id: student_id.to_string(),
        seat_id: seat_id.to_string(),
        shift_id: shift_id.map(str::to_string),
        start_date: june(start),
        end_date: june(end),
        notes: None,
    }
}

#[tokio::test]
async fn test_overlapping_bookings_conflict_per_shift() {
    let ctx = TestContext::new();
    let seeded = ctx.seed().await;
    let evening = ctx
        .create_shift(&seeded.property.id, "Evening", 14, 20)
        .await;
    let bookings = &ctx.services.bookings;
    let student = &seeded.student.id;
    let seat = &seeded.seat.id;

    let first = bookings
        .create_booking(booking(student, seat, Some(seeded.shift.id.as_str()), 1, 10))
        .await
        .unwrap();
    assert_eq!(first.status, BookingStatus::Pending);

    let clash = bookings
        .create_booking(booking(student, seat, Some(seeded.shift.id.as_str()), 10, 15))
        .await;
    assert!(matches!(clash, Err(AppError::Conflict(_))));

    bookings
        .create_booking(booking(student, seat, Some(evening.id.as_str()), 5, 8))
        .await
        .expect("a different shift shares the seat");

    let whole_day = bookings
        .create_booking(booking(student, seat, None, 7, 7))
        .await;
    assert!(matches!(whole_day, Err(AppError::Conflict(_))));

    bookings
        .create_booking(booking(student, seat, Some(seeded.shift.id.as_str()), 11, 20))
        .await
        .expect("adjacent range does not overlap");
}

#[tokio::test]
async fn test_cancelled_booking_frees_the_range() {
    let ctx = TestContext::new();
    let seeded = ctx.seed().await;
    let bookings = &ctx.services.bookings;

    let first = bookings
        .create_booking(booking(&seeded.student.id, &seeded.seat.id, None, 1, 5))
        .await
        .unwrap();
    let cancelled = bookings.cancel_booking(&first.id).await.unwrap();
    assert_eq!(cancelled.status, BookingStatus::Cancelled);

    bookings
        .create_booking(booking(&seeded.student.id, &seeded.seat.id, None, 3, 4))
        .await
        .expect("cancelled bookings do not block the seat");

    let again = bookings.cancel_booking(&first.id).await;
    assert!(matches!(again, Err(AppError::Validation(_))));
}

#[tokio::test]
async fn test_booking_lifecycle() {
    let ctx = TestContext::new();
    let seeded = ctx.seed().await;
    let bookings = &ctx.services.bookings;

    let created = bookings
        .create_booking(booking(&seeded.student.id, &seeded.seat.id, None, 1, 2))
        .await
        .unwrap();

    let early = bookings.complete_booking(&created.id).await;
    assert!(matches!(early, Err(AppError::Validation(_))));

    let confirmed = bookings.confirm_booking(&created.id).await.unwrap();
    assert_eq!(confirmed.status, BookingStatus::Confirmed);

    let completed = bookings.complete_booking(&created.id).await.unwrap();
    assert_eq!(completed.status, BookingStatus::Completed);

    let stored = bookings.get_booking(&created.id).await.unwrap();
    assert_eq!(stored.status, BookingStatus::Completed);

    let (confirmed_only, total) = bookings
        .list_bookings(
            &BookingFilter {
                status: Some(BookingStatus::Confirmed),
                ..BookingFilter::default()
            },
            PageRequest::default(),
        )
        .await
        .unwrap();
    assert!(confirmed_only.is_empty());
    assert_eq!(total, 0);
}

#[tokio::test]
async fn test_invalid_bookings_are_rejected() {
    let ctx = TestContext::new();
    let seeded = ctx.seed().await;
    let bookings = &ctx.services.bookings;

    let inverted = bookings
        .create_booking(booking(&seeded.student.id, &seeded.seat.id, None, 10, 1))
        .await;
    assert!(matches!(inverted, Err(AppError::Validation(_))));

    let unknown_student = bookings
        .create_booking(booking("ghost", &seeded.seat.id, None, 1, 2))
        .await;
    assert!(matches!(unknown_student, Err(AppError::NotFound(_))));

    let spare = ctx.create_seat(&seeded.property.id, "C01").await;
    ctx.services
        .seats
        .update_seat_status(&spare.id, "maintenance")
        .await
        .unwrap();
    let broken = bookings
        .create_booking(booking(&seeded.student.id, &spare.id, None, 1, 2))
        .await;
    assert!(matches!(broken, Err(AppError::Validation(_))));
}

#[tokio::test]
async fn test_assignment_occupies_and_release_frees_the_seat() {
    let ctx = TestContext::new();
    let seeded = ctx.seed().await;
    let seats = &ctx.services.seats;

    let seat = seats.get_seat(&seeded.seat.id).await.unwrap();
    assert_eq!(seat.status, SeatStatus::Occupied);
    assert_eq!(seat.current_student_id.as_deref(), Some(seeded.student.id.as_str()));
    assert_eq!(seeded.assignment.monthly_rent, dec!(1600));

    let other = ctx.create_student("Ravi Kumar", "9123456780").await;
    let taken = seats
        .assign_seat(CreateAssignmentRequest {
            student_id: other.id.clone(),
            seat_id: seeded.seat.id.clone(),
            shift_id: seeded.shift.id.clone(),
            monthly_rent: None,
            start_date: None,
        })
        .await;
    assert!(matches!(taken, Err(AppError::Conflict(_))));

    let manual = seats.update_seat_status(&seeded.seat.id, "available").await;
    assert!(matches!(manual, Err(AppError::Validation(_))));

    seats
        .release_assignment(&seeded.assignment.id, ReleaseAssignmentRequest::default())
        .await
        .unwrap();
    let seat = seats.get_seat(&seeded.seat.id).await.unwrap();
    assert_eq!(seat.status, SeatStatus::Available);
    assert!(seat.current_student_id.is_none());

    let twice = seats
        .release_assignment(&seeded.assignment.id, ReleaseAssignmentRequest::default())
        .await;
    assert!(matches!(twice, Err(AppError::Validation(_))));
}

#[tokio::test]
async fn test_occupied_cannot_be_set_by_hand() {
    let ctx = TestContext::new();
    let seeded = ctx.seed().await;
    let spare = ctx.create_seat(&seeded.property.id, "C02").await;

    let result = ctx
        .services
        .seats
        .update_seat_status(&spare.id, "occupied")
        .await;
    assert!(matches!(result, Err(AppError::Validation(_))));

    let reserved = ctx
        .services
        .seats
        .update_seat_status(&spare.id, "reserved")
        .await
        .unwrap();
    assert_eq!(reserved.status, SeatStatus::Reserved);
}
