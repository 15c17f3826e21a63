use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{MySql, MySqlPool, QueryBuilder};

use crate::core::{AppError, PageRequest, Result};
use crate::modules::bookings::models::{Booking, BookingFilter};

#[async_trait]
pub trait BookingRepository: Send + Sync {
    /// Insert a booking unless it overlaps a live booking on the same seat (Conflict)
    async fn create(&self, booking: &Booking) -> Result<()>;

    async fn find_by_id(&self, id: &str) -> Result<Option<Booking>>;

    async fn list(&self, filter: &BookingFilter, page: PageRequest) -> Result<(Vec<Booking>, u64)>;

    async fn update_status(&self, booking: &Booking) -> Result<()>;
}

pub struct MySqlBookingRepository {
    pool: MySqlPool,
}

impl MySqlBookingRepository {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

const BOOKING_COLUMNS: &str =
    "id, student_id, seat_id, shift_id, start_date, end_date, status, notes, created_at, updated_at";

#[derive(sqlx::FromRow)]
struct BookingRow {
    id: String,
    student_id: String,
    seat_id: String,
    shift_id: Option<String>,
    start_date: NaiveDate,
    end_date: NaiveDate,
    status: String,
    notes: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<BookingRow> for Booking {
    type Error = AppError;

    fn try_from(row: BookingRow) -> Result<Self> {
        Ok(Self {
            id: row.id,
            student_id: row.student_id,
            seat_id: row.seat_id,
            shift_id: row.shift_id,
            start_date: row.start_date,
            end_date: row.end_date,
            status: row.status.parse().map_err(AppError::Internal)?,
            notes: row.notes,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn push_filter(builder: &mut QueryBuilder<'_, MySql>, filter: &BookingFilter) {
    if let Some(student_id) = &filter.student_id {
        builder.push(" AND student_id = ").push_bind(student_id.clone());
    }
    if let Some(seat_id) = &filter.seat_id {
        builder.push(" AND seat_id = ").push_bind(seat_id.clone());
    }
    if let Some(status) = filter.status {
        builder.push(" AND status = ").push_bind(status.as_str());
    }
}

#[async_trait]
impl BookingRepository for MySqlBookingRepository {
    async fn create(&self, booking: &Booking) -> Result<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AppError::Internal(format!("Failed to start transaction: {}", e)))?;

        // Lock the seat so overlapping inserts for it run one at a time
        sqlx::query("SELECT id FROM seats WHERE id = ? FOR UPDATE")
            .bind(&booking.seat_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to lock seat: {}", e)))?
            .ok_or_else(|| AppError::not_found(format!("Seat '{}' not found", booking.seat_id)))?;

        let overlapping: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM bookings
            WHERE seat_id = ?
              AND status <> 'cancelled'
              AND start_date <= ?
              AND end_date >= ?
              AND (? IS NULL OR shift_id IS NULL OR shift_id = ?)
            "#,
        )
        .bind(&booking.seat_id)
        .bind(booking.end_date)
        .bind(booking.start_date)
        .bind(&booking.shift_id)
        .bind(&booking.shift_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to check booking overlap: {}", e)))?;

        if overlapping > 0 {
            return Err(AppError::conflict(format!(
                "Seat is already booked between {} and {}",
                booking.start_date, booking.end_date
            )));
        }

        sqlx::query(&format!(
            "INSERT INTO bookings ({}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            BOOKING_COLUMNS
        ))
        .bind(&booking.id)
        .bind(&booking.student_id)
        .bind(&booking.seat_id)
        .bind(&booking.shift_id)
        .bind(booking.start_date)
        .bind(booking.end_date)
        .bind(booking.status.as_str())
        .bind(&booking.notes)
        .bind(booking.created_at)
        .bind(booking.updated_at)
        .execute(&mut *tx)
        .await?;

        tx.commit()
            .await
            .map_err(|e| AppError::Internal(format!("Failed to commit transaction: {}", e)))?;

        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Booking>> {
        sqlx::query_as::<_, BookingRow>(&format!(
            "SELECT {} FROM bookings WHERE id = ?",
            BOOKING_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to fetch booking: {}", e)))?
        .map(Booking::try_from)
        .transpose()
    }

    async fn list(&self, filter: &BookingFilter, page: PageRequest) -> Result<(Vec<Booking>, u64)> {
        let mut count_query = QueryBuilder::<MySql>::new("SELECT COUNT(*) FROM bookings WHERE 1 = 1");
        push_filter(&mut count_query, filter);
        let total = count_query
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to count bookings: {}", e)))?;

        let mut query = QueryBuilder::<MySql>::new(format!(
            "SELECT {} FROM bookings WHERE 1 = 1",
            BOOKING_COLUMNS
        ));
        push_filter(&mut query, filter);
        query
            .push(" ORDER BY start_date DESC, created_at DESC LIMIT ")
            .push_bind(i64::from(page.limit))
            .push(" OFFSET ")
            .push_bind(page.offset() as i64);

        let rows = query
            .build_query_as::<BookingRow>()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to list bookings: {}", e)))?;

        let bookings = rows
            .into_iter()
            .map(Booking::try_from)
            .collect::<Result<Vec<_>>>()?;

        Ok((bookings, total.max(0) as u64))
    }

    async fn update_status(&self, booking: &Booking) -> Result<()> {
        let rows_affected = sqlx::query("UPDATE bookings SET status = ?, updated_at = ? WHERE id = ?")
            .bind(booking.status.as_str())
            .bind(booking.updated_at)
            .bind(&booking.id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to update booking: {}", e)))?
            .rows_affected();

        if rows_affected == 0 {
            return Err(AppError::not_found(format!("Booking '{}' not found", booking.id)));
        }

        Ok(())
    }
}
