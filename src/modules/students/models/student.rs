use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::validators::{sanitize_optional, sanitize_string, validate_email, validate_phone};
use crate::core::{AppError, Result};

/// A person who may hold seat assignments
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    pub id: String,
    pub name: String,
    pub email: Option<String>,
    pub phone: String,
    pub address: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateStudentRequest {
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    pub phone: String,
    #[serde(default)]
    pub address: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStudentRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub is_active: Option<bool>,
}

fn check_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(AppError::validation("Student name is required"));
    }
    Ok(())
}

fn check_phone(phone: &str) -> Result<()> {
    if !validate_phone(phone.trim()) {
        return Err(AppError::validation(format!(
            "Invalid phone number: {} (expected 10 digits, optionally prefixed with +91)",
            phone
        )));
    }
    Ok(())
}

fn check_email(email: Option<&str>) -> Result<()> {
    match email.map(str::trim) {
        Some(email) if !email.is_empty() && !validate_email(email) => Err(AppError::validation(
            format!("Invalid email address: {}", email),
        )),
        _ => Ok(()),
    }
}

fn normalize_email(email: Option<String>) -> Option<String> {
    sanitize_optional(email).map(|e| e.to_lowercase())
}

impl Student {
    pub fn new(request: CreateStudentRequest, now: DateTime<Utc>) -> Result<Self> {
        check_name(&request.name)?;
        check_phone(&request.phone)?;
        check_email(request.email.as_deref())?;

        Ok(Self {
            id: Uuid::new_v4().to_string(),
            name: sanitize_string(&request.name),
            email: normalize_email(request.email),
            phone: sanitize_string(&request.phone),
            address: sanitize_optional(request.address),
            is_active: true,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn apply_update(&mut self, request: UpdateStudentRequest, now: DateTime<Utc>) -> Result<()> {
        if let Some(name) = request.name {
            check_name(&name)?;
            self.name = sanitize_string(&name);
        }
        if let Some(phone) = request.phone {
            check_phone(&phone)?;
            self.phone = sanitize_string(&phone);
        }
        if request.email.is_some() {
            check_email(request.email.as_deref())?;
            self.email = normalize_email(request.email);
        }
        if request.address.is_some() {
            self.address = sanitize_optional(request.address);
        }
        if let Some(is_active) = request.is_active {
            self.is_active = is_active;
        }
        self.updated_at = now;

        Ok(())
    }

    /// Case-insensitive match on name, email or phone
    pub fn matches_search(&self, term: &str) -> bool {
        let term = term.trim().to_lowercase();
        if term.is_empty() {
            return true;
        }

        self.name.to_lowercase().contains(&term)
            || self.phone.contains(&term)
            || self
                .email
                .as_deref()
                .is_some_and(|e| e.to_lowercase().contains(&term))
    }
}
