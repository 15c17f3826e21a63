use async_trait::async_trait;
use chrono::{DateTime, NaiveTime, Utc};
use sqlx::MySqlPool;

use crate::core::{AppError, Result};
use crate::modules::seats::models::Shift;

#[async_trait]
pub trait ShiftRepository: Send + Sync {
    async fn create(&self, shift: &Shift) -> Result<()>;

    async fn find_by_id(&self, id: &str) -> Result<Option<Shift>>;

    /// Shifts ordered by start time
    async fn list(&self, property_id: Option<&str>) -> Result<Vec<Shift>>;
}

pub struct MySqlShiftRepository {
    pool: MySqlPool,
}

impl MySqlShiftRepository {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct ShiftRow {
    id: String,
    property_id: String,
    name: String,
    start_time: NaiveTime,
    end_time: NaiveTime,
    created_at: DateTime<Utc>,
}

impl From<ShiftRow> for Shift {
    fn from(row: ShiftRow) -> Self {
        Self {
            id: row.id,
            property_id: row.property_id,
            name: row.name,
            start_time: row.start_time,
            end_time: row.end_time,
            created_at: row.created_at,
        }
    }
}

#[async_trait]
impl ShiftRepository for MySqlShiftRepository {
    async fn create(&self, shift: &Shift) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO shifts (id, property_id, name, start_time, end_time, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&shift.id)
        .bind(&shift.property_id)
        .bind(&shift.name)
        .bind(shift.start_time)
        .bind(shift.end_time)
        .bind(shift.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Shift>> {
        let row = sqlx::query_as::<_, ShiftRow>(
            "SELECT id, property_id, name, start_time, end_time, created_at FROM shifts WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to fetch shift: {}", e)))?;

        Ok(row.map(Shift::from))
    }

    async fn list(&self, property_id: Option<&str>) -> Result<Vec<Shift>> {
        let rows = sqlx::query_as::<_, ShiftRow>(
            r#"
            SELECT id, property_id, name, start_time, end_time, created_at
            FROM shifts
            WHERE (? IS NULL OR property_id = ?)
            ORDER BY start_time ASC, name ASC
            "#,
        )
        .bind(property_id)
        .bind(property_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to list shifts: {}", e)))?;

        Ok(rows.into_iter().map(Shift::from).collect())
    }
}
