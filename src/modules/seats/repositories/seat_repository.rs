use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{MySql, MySqlPool, QueryBuilder};

use crate::core::{AppError, Result};
use crate::modules::seats::models::{Seat, SeatStatus};

#[async_trait]
pub trait SeatRepository: Send + Sync {
    async fn create(&self, seat: &Seat) -> Result<()>;

    async fn find_by_id(&self, id: &str) -> Result<Option<Seat>>;

    /// Every seat carrying this number, ordered by property
    async fn find_all_by_number(&self, seat_number: &str) -> Result<Vec<Seat>>;

    async fn list(&self, property_id: Option<&str>, status: Option<SeatStatus>) -> Result<Vec<Seat>>;

    async fn update(&self, seat: &Seat) -> Result<()>;
}

pub struct MySqlSeatRepository {
    pool: MySqlPool,
}

impl MySqlSeatRepository {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

pub(crate) const SEAT_COLUMNS: &str =
    "id, property_id, seat_number, status, current_student_id, created_at, updated_at";

#[derive(sqlx::FromRow)]
pub(crate) struct SeatRow {
    id: String,
    property_id: String,
    seat_number: String,
    status: String,
    current_student_id: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<SeatRow> for Seat {
    type Error = AppError;

    fn try_from(row: SeatRow) -> Result<Self> {
        let status = row.status.parse().map_err(AppError::Internal)?;

        Ok(Self {
            id: row.id,
            property_id: row.property_id,
            seat_number: row.seat_number,
            status,
            current_student_id: row.current_student_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[async_trait]
impl SeatRepository for MySqlSeatRepository {
    async fn create(&self, seat: &Seat) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO seats (id, property_id, seat_number, status, current_student_id, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&seat.id)
        .bind(&seat.property_id)
        .bind(&seat.seat_number)
        .bind(seat.status.as_str())
        .bind(&seat.current_student_id)
        .bind(seat.created_at)
        .bind(seat.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Seat>> {
        sqlx::query_as::<_, SeatRow>(&format!("SELECT {} FROM seats WHERE id = ?", SEAT_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to fetch seat: {}", e)))?
            .map(Seat::try_from)
            .transpose()
    }

    async fn find_all_by_number(&self, seat_number: &str) -> Result<Vec<Seat>> {
        let rows = sqlx::query_as::<_, SeatRow>(&format!(
            "SELECT {} FROM seats WHERE seat_number = ? ORDER BY property_id ASC",
            SEAT_COLUMNS
        ))
        .bind(seat_number.trim().to_uppercase())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to fetch seats: {}", e)))?;

        rows.into_iter().map(Seat::try_from).collect()
    }

    async fn list(&self, property_id: Option<&str>, status: Option<SeatStatus>) -> Result<Vec<Seat>> {
        let mut query = QueryBuilder::<MySql>::new(format!(
            "SELECT {} FROM seats WHERE 1 = 1",
            SEAT_COLUMNS
        ));
        if let Some(property_id) = property_id {
            query.push(" AND property_id = ").push_bind(property_id.to_string());
        }
        if let Some(status) = status {
            query.push(" AND status = ").push_bind(status.as_str());
        }
        query.push(" ORDER BY property_id ASC, seat_number ASC");

        let rows = query
            .build_query_as::<SeatRow>()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to list seats: {}", e)))?;

        rows.into_iter().map(Seat::try_from).collect()
    }

    async fn update(&self, seat: &Seat) -> Result<()> {
        let rows_affected = sqlx::query(
            "UPDATE seats SET status = ?, current_student_id = ?, updated_at = ? WHERE id = ?",
        )
        .bind(seat.status.as_str())
        .bind(&seat.current_student_id)
        .bind(seat.updated_at)
        .bind(&seat.id)
        .execute(&self.pool)
        .await?
        .rows_affected();

        if rows_affected == 0 {
            return Err(AppError::not_found(format!("Seat '{}' not found", seat.id)));
        }

        Ok(())
    }
}
