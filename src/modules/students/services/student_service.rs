use std::sync::Arc;

use chrono::Utc;
use tracing::info;

use crate::core::{AppError, PageRequest, Result};
use crate::modules::seats::models::Assignment;
use crate::modules::seats::repositories::AssignmentRepository;
use crate::modules::students::models::{CreateStudentRequest, Student, UpdateStudentRequest};
use crate::modules::students::repositories::StudentRepository;

pub struct StudentService {
    students: Arc<dyn StudentRepository>,
    assignments: Arc<dyn AssignmentRepository>,
}

impl StudentService {
    pub fn new(
        students: Arc<dyn StudentRepository>,
        assignments: Arc<dyn AssignmentRepository>,
    ) -> Self {
        Self {
            students,
            assignments,
        }
    }

    async fn ensure_email_free(&self, email: Option<&str>, owner: Option<&str>) -> Result<()> {
        let Some(email) = email else {
            return Ok(());
        };

        match self.students.find_by_email(email).await? {
            Some(existing) if Some(existing.id.as_str()) != owner => Err(AppError::conflict(
                format!("A student with email {} already exists", email),
            )),
            _ => Ok(()),
        }
    }

    pub async fn create_student(&self, request: CreateStudentRequest) -> Result<Student> {
        let student = Student::new(request, Utc::now())?;
        self.ensure_email_free(student.email.as_deref(), None).await?;

        self.students.create(&student).await?;
        info!(student_id = student.id.as_str(), "Student registered");

        Ok(student)
    }

    pub async fn get_student(&self, id: &str) -> Result<Student> {
        self.students
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Student '{}' not found", id)))
    }

    pub async fn update_student(&self, id: &str, request: UpdateStudentRequest) -> Result<Student> {
        let mut student = self.get_student(id).await?;
        student.apply_update(request, Utc::now())?;
        self.ensure_email_free(student.email.as_deref(), Some(&student.id))
            .await?;

        self.students.update(&student).await?;
        info!(student_id = student.id.as_str(), "Student updated");

        Ok(student)
    }

    pub async fn list_students(
        &self,
        search: Option<&str>,
        page: PageRequest,
    ) -> Result<(Vec<Student>, u64)> {
        let search = search.map(str::trim).filter(|s| !s.is_empty());
        self.students.list(search, page).await
    }

    pub async fn student_assignments(&self, id: &str) -> Result<Vec<Assignment>> {
        self.get_student(id).await?;
        self.assignments.list_for_student(id).await
    }
}
