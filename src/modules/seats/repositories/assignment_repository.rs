use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::{MySql, MySqlPool, Transaction};

use super::seat_repository::{SeatRow, SEAT_COLUMNS};
use crate::core::{AppError, Result};
use crate::modules::seats::models::{Assignment, Seat};

#[async_trait]
pub trait AssignmentRepository: Send + Sync {
    async fn find_by_id(&self, id: &str) -> Result<Option<Assignment>>;

    /// The student's most recent active assignment on this seat
    async fn find_active(&self, student_id: &str, seat_id: &str) -> Result<Option<Assignment>>;

    async fn list_for_student(&self, student_id: &str) -> Result<Vec<Assignment>>;

    /// Insert an assignment and mark its seat occupied, atomically.
    /// Fails with Conflict when the seat already has an active assignment for the shift.
    async fn assign(&self, assignment: &Assignment, now: DateTime<Utc>) -> Result<Seat>;

    /// End an assignment; the seat is freed once no active assignment holds it
    async fn release(
        &self,
        id: &str,
        end_date: Option<NaiveDate>,
        now: DateTime<Utc>,
    ) -> Result<Assignment>;
}

pub struct MySqlAssignmentRepository {
    pool: MySqlPool,
}

impl MySqlAssignmentRepository {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    async fn lock_seat(tx: &mut Transaction<'_, MySql>, seat_id: &str) -> Result<Seat> {
        sqlx::query_as::<_, SeatRow>(&format!(
            "SELECT {} FROM seats WHERE id = ? FOR UPDATE",
            SEAT_COLUMNS
        ))
        .bind(seat_id)
        .fetch_optional(&mut **tx)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to lock seat: {}", e)))?
        .ok_or_else(|| AppError::not_found(format!("Seat '{}' not found", seat_id)))?
        .try_into()
    }

    async fn save_seat(tx: &mut Transaction<'_, MySql>, seat: &Seat) -> Result<()> {
        sqlx::query("UPDATE seats SET status = ?, current_student_id = ?, updated_at = ? WHERE id = ?")
            .bind(seat.status.as_str())
            .bind(&seat.current_student_id)
            .bind(seat.updated_at)
            .bind(&seat.id)
            .execute(&mut **tx)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to update seat: {}", e)))?;
        Ok(())
    }
}

const ASSIGNMENT_COLUMNS: &str = "id, student_id, seat_id, shift_id, monthly_rent, start_date, \
     end_date, status, created_at, updated_at";

#[derive(sqlx::FromRow)]
struct AssignmentRow {
    id: String,
    student_id: String,
    seat_id: String,
    shift_id: String,
    monthly_rent: Decimal,
    start_date: NaiveDate,
    end_date: Option<NaiveDate>,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<AssignmentRow> for Assignment {
    type Error = AppError;

    fn try_from(row: AssignmentRow) -> Result<Self> {
        Ok(Self {
            id: row.id,
            student_id: row.student_id,
            seat_id: row.seat_id,
            shift_id: row.shift_id,
            monthly_rent: row.monthly_rent,
            start_date: row.start_date,
            end_date: row.end_date,
            status: row.status.parse().map_err(AppError::Internal)?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[async_trait]
impl AssignmentRepository for MySqlAssignmentRepository {
    async fn find_by_id(&self, id: &str) -> Result<Option<Assignment>> {
        sqlx::query_as::<_, AssignmentRow>(&format!(
            "SELECT {} FROM assignments WHERE id = ?",
            ASSIGNMENT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to fetch assignment: {}", e)))?
        .map(Assignment::try_from)
        .transpose()
    }

    async fn find_active(&self, student_id: &str, seat_id: &str) -> Result<Option<Assignment>> {
        sqlx::query_as::<_, AssignmentRow>(&format!(
            "SELECT {} FROM assignments \
             WHERE student_id = ? AND seat_id = ? AND status = 'active' \
             ORDER BY start_date DESC, created_at DESC LIMIT 1",
            ASSIGNMENT_COLUMNS
        ))
        .bind(student_id)
        .bind(seat_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to fetch assignment: {}", e)))?
        .map(Assignment::try_from)
        .transpose()
    }

    async fn list_for_student(&self, student_id: &str) -> Result<Vec<Assignment>> {
        let rows = sqlx::query_as::<_, AssignmentRow>(&format!(
            "SELECT {} FROM assignments WHERE student_id = ? ORDER BY start_date DESC, created_at DESC",
            ASSIGNMENT_COLUMNS
        ))
        .bind(student_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to list assignments: {}", e)))?;

        rows.into_iter().map(Assignment::try_from).collect()
    }

    async fn assign(&self, assignment: &Assignment, now: DateTime<Utc>) -> Result<Seat> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AppError::Internal(format!("Failed to start transaction: {}", e)))?;

        // Serializes concurrent assignments to the same seat
        let mut seat = Self::lock_seat(&mut tx, &assignment.seat_id).await?;
        seat.accepts_assignment()?;

        let taken: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM assignments WHERE seat_id = ? AND shift_id = ? AND status = 'active'",
        )
        .bind(&assignment.seat_id)
        .bind(&assignment.shift_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to check seat availability: {}", e)))?;

        if taken > 0 {
            return Err(AppError::conflict(format!(
                "Seat {} already has an active assignment for this shift",
                seat.seat_number
            )));
        }

        sqlx::query(&format!(
            "INSERT INTO assignments ({}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            ASSIGNMENT_COLUMNS
        ))
        .bind(&assignment.id)
        .bind(&assignment.student_id)
        .bind(&assignment.seat_id)
        .bind(&assignment.shift_id)
        .bind(assignment.monthly_rent)
        .bind(assignment.start_date)
        .bind(assignment.end_date)
        .bind(assignment.status.as_str())
        .bind(assignment.created_at)
        .bind(assignment.updated_at)
        .execute(&mut *tx)
        .await?;

        seat.occupy(&assignment.student_id, now);
        Self::save_seat(&mut tx, &seat).await?;

        tx.commit()
            .await
            .map_err(|e| AppError::Internal(format!("Failed to commit transaction: {}", e)))?;

        Ok(seat)
    }

    async fn release(
        &self,
        id: &str,
        end_date: Option<NaiveDate>,
        now: DateTime<Utc>,
    ) -> Result<Assignment> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AppError::Internal(format!("Failed to start transaction: {}", e)))?;

        let mut assignment: Assignment = sqlx::query_as::<_, AssignmentRow>(&format!(
            "SELECT {} FROM assignments WHERE id = ? FOR UPDATE",
            ASSIGNMENT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to lock assignment: {}", e)))?
        .ok_or_else(|| AppError::not_found(format!("Assignment '{}' not found", id)))?
        .try_into()?;

        let mut seat = Self::lock_seat(&mut tx, &assignment.seat_id).await?;
        assignment.release(end_date, now)?;

        sqlx::query("UPDATE assignments SET status = ?, end_date = ?, updated_at = ? WHERE id = ?")
            .bind(assignment.status.as_str())
            .bind(assignment.end_date)
            .bind(assignment.updated_at)
            .bind(&assignment.id)
            .execute(&mut *tx)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to update assignment: {}", e)))?;

        let remaining: Option<String> = sqlx::query_scalar(
            "SELECT student_id FROM assignments WHERE seat_id = ? AND status = 'active' \
             ORDER BY start_date DESC LIMIT 1",
        )
        .bind(&seat.id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to check seat occupancy: {}", e)))?;

        match remaining {
            Some(student_id) => seat.occupy(&student_id, now),
            None => seat.vacate(now),
        }
        Self::save_seat(&mut tx, &seat).await?;

        tx.commit()
            .await
            .map_err(|e| AppError::Internal(format!("Failed to commit transaction: {}", e)))?;

        Ok(assignment)
    }
}
