use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{MySql, MySqlPool, QueryBuilder};

use crate::core::validators::like_pattern;
use crate::core::{AppError, PageRequest, Result};
use crate::modules::students::models::Student;

#[async_trait]
pub trait StudentRepository: Send + Sync {
    async fn create(&self, student: &Student) -> Result<()>;

    async fn find_by_id(&self, id: &str) -> Result<Option<Student>>;

    async fn find_by_email(&self, email: &str) -> Result<Option<Student>>;

    async fn update(&self, student: &Student) -> Result<()>;

    /// Page of students, optionally narrowed by a name/email/phone search, plus the total
    async fn list(&self, search: Option<&str>, page: PageRequest) -> Result<(Vec<Student>, u64)>;

    /// Ids of every student whose name, email or phone contains `term`
    async fn search_ids(&self, term: &str) -> Result<Vec<String>>;
}

pub struct MySqlStudentRepository {
    pool: MySqlPool,
}

impl MySqlStudentRepository {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

const STUDENT_COLUMNS: &str =
    "id, name, email, phone, address, is_active, created_at, updated_at";

#[derive(sqlx::FromRow)]
struct StudentRow {
    id: String,
    name: String,
    email: Option<String>,
    phone: String,
    address: Option<String>,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<StudentRow> for Student {
    fn from(row: StudentRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            email: row.email,
            phone: row.phone,
            address: row.address,
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

fn push_search(builder: &mut QueryBuilder<'_, MySql>, term: &str) {
    let pattern = like_pattern(term);
    builder
        .push(" AND (name LIKE ")
        .push_bind(pattern.clone())
        .push(" OR email LIKE ")
        .push_bind(pattern.clone())
        .push(" OR phone LIKE ")
        .push_bind(pattern)
        .push(")");
}

#[async_trait]
impl StudentRepository for MySqlStudentRepository {
    async fn create(&self, student: &Student) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO students (id, name, email, phone, address, is_active, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&student.id)
        .bind(&student.name)
        .bind(&student.email)
        .bind(&student.phone)
        .bind(&student.address)
        .bind(student.is_active)
        .bind(student.created_at)
        .bind(student.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Student>> {
        let row = sqlx::query_as::<_, StudentRow>(&format!(
            "SELECT {} FROM students WHERE id = ?",
            STUDENT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to fetch student: {}", e)))?;

        Ok(row.map(Student::from))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Student>> {
        let row = sqlx::query_as::<_, StudentRow>(&format!(
            "SELECT {} FROM students WHERE email = ?",
            STUDENT_COLUMNS
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to fetch student: {}", e)))?;

        Ok(row.map(Student::from))
    }

    async fn update(&self, student: &Student) -> Result<()> {
        let rows_affected = sqlx::query(
            r#"
            UPDATE students
            SET name = ?, email = ?, phone = ?, address = ?, is_active = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&student.name)
        .bind(&student.email)
        .bind(&student.phone)
        .bind(&student.address)
        .bind(student.is_active)
        .bind(student.updated_at)
        .bind(&student.id)
        .execute(&self.pool)
        .await?
        .rows_affected();

        if rows_affected == 0 {
            return Err(AppError::not_found(format!("Student '{}' not found", student.id)));
        }

        Ok(())
    }

    async fn list(&self, search: Option<&str>, page: PageRequest) -> Result<(Vec<Student>, u64)> {
        let mut count_query = QueryBuilder::<MySql>::new("SELECT COUNT(*) FROM students WHERE 1 = 1");
        if let Some(term) = search {
            push_search(&mut count_query, term);
        }
        let total = count_query
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to count students: {}", e)))?;

        let mut query = QueryBuilder::<MySql>::new(format!(
            "SELECT {} FROM students WHERE 1 = 1",
            STUDENT_COLUMNS
        ));
        if let Some(term) = search {
            push_search(&mut query, term);
        }
        query
            .push(" ORDER BY name ASC, id ASC LIMIT ")
            .push_bind(i64::from(page.limit))
            .push(" OFFSET ")
            .push_bind(page.offset() as i64);

        let rows = query
            .build_query_as::<StudentRow>()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to list students: {}", e)))?;

        Ok((
            rows.into_iter().map(Student::from).collect(),
            total.max(0) as u64,
        ))
    }

    async fn search_ids(&self, term: &str) -> Result<Vec<String>> {
        let mut query = QueryBuilder::<MySql>::new("SELECT id FROM students WHERE 1 = 1");
        push_search(&mut query, term);

        query
            .build_query_scalar::<String>()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to search students: {}", e)))
    }
}
