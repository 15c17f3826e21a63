use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::MySqlPool;

use crate::core::{AppError, Result};
use crate::modules::properties::models::Property;

#[async_trait]
pub trait PropertyRepository: Send + Sync {
    async fn create(&self, property: &Property) -> Result<()>;

    async fn find_by_id(&self, id: &str) -> Result<Option<Property>>;

    /// All properties ordered by name
    async fn list(&self, active_only: bool) -> Result<Vec<Property>>;
}

pub struct MySqlPropertyRepository {
    pool: MySqlPool,
}

impl MySqlPropertyRepository {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct PropertyRow {
    id: String,
    name: String,
    address: String,
    contact_phone: Option<String>,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<PropertyRow> for Property {
    fn from(row: PropertyRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            address: row.address,
            contact_phone: row.contact_phone,
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[async_trait]
impl PropertyRepository for MySqlPropertyRepository {
    async fn create(&self, property: &Property) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO properties (id, name, address, contact_phone, is_active, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&property.id)
        .bind(&property.name)
        .bind(&property.address)
        .bind(&property.contact_phone)
        .bind(property.is_active)
        .bind(property.created_at)
        .bind(property.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Property>> {
        let row = sqlx::query_as::<_, PropertyRow>(
            r#"
            SELECT id, name, address, contact_phone, is_active, created_at, updated_at
            FROM properties
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to fetch property: {}", e)))?;

        Ok(row.map(Property::from))
    }

    async fn list(&self, active_only: bool) -> Result<Vec<Property>> {
        let rows = sqlx::query_as::<_, PropertyRow>(
            r#"
            SELECT id, name, address, contact_phone, is_active, created_at, updated_at
            FROM properties
            WHERE (? = FALSE OR is_active = TRUE)
            ORDER BY name ASC
            "#,
        )
        .bind(active_only)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to list properties: {}", e)))?;

        Ok(rows.into_iter().map(Property::from).collect())
    }
}
