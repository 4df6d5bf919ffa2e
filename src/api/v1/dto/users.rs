/*
 * Responsibility
 * - Users の request/response DTO
 * - body の形式チェックは validate() で行う (input_guard は URL しか見ない)
 */
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::repos::user_repo::UserRow;

const MAX_NAME_LEN: usize = 100;
const MAX_EMAIL_LEN: usize = 254;

fn validate_email(email: &str) -> Result<(), &'static str> {
    let email = email.trim();
    if email.len() > MAX_EMAIL_LEN {
        return Err("email must be <= 254 chars");
    }
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') => Ok(()),
        _ => Err("email is invalid"),
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub name: String,
    pub email: String,
}

impl CreateUserRequest {
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.name.trim().is_empty() {
            return Err("name is required");
        }
        if self.name.len() > MAX_NAME_LEN {
            return Err("name must be <= 100 chars");
        }
        validate_email(&self.email)
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    pub name: Option<String>,
    pub email: Option<String>,
}

impl UpdateUserRequest {
    pub fn validate(&self) -> Result<(), &'static str> {
        if let Some(name) = &self.name {
            if name.trim().is_empty() {
                return Err("name cannot be empty");
            }
            if name.len() > MAX_NAME_LEN {
                return Err("name must be <= 100 chars");
            }
        }
        if let Some(email) = &self.email {
            validate_email(email)?;
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
pub struct ListUsersQuery {
    pub name: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl ListUsersQuery {
    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(50).clamp(1, 200)
    }

    pub fn offset(&self) -> i64 {
        self.offset.unwrap_or(0).max(0)
    }
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<UserRow> for UserResponse {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            email: row.email,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}
