use crate::error::app_error::AppError;
use chrono::{DateTime, Utc};
use rocket::serde::{Deserialize, Serialize};
use schemars::JsonSchema;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;
use validator::Validate;

/// Admin privilege level. Declaration order gives the access order `Admin < System`.
#[derive(Serialize, Deserialize, Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Default, JsonSchema, sqlx::Type)]
#[serde(rename_all = "UPPERCASE")]
#[sqlx(type_name = "admin_role", rename_all = "UPPERCASE")]
pub enum AdminRole {
    #[default]
    Admin,
    System,
}

impl AdminRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            AdminRole::Admin => "ADMIN",
            AdminRole::System => "SYSTEM",
        }
    }
}

impl fmt::Display for AdminRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AdminRole {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "SYSTEM" => Ok(AdminRole::System),
            "ADMIN" => Ok(AdminRole::Admin),
            _ => Err(AppError::validation("Invalid role")),
        }
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AdminUser {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: AdminRole,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AdminUser {
    pub fn is_system(&self) -> bool {
        self.role == AdminRole::System
    }
}

/// A validated admin row ready to be inserted. `password_hash` is already a digest.
#[derive(Debug, Clone)]
pub struct NewAdmin {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: AdminRole,
}

/// Field changes for an existing admin; `None` leaves the column untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdminChanges {
    pub name: Option<String>,
    pub email: Option<String>,
    pub role: Option<AdminRole>,
}

impl AdminChanges {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.email.is_none() && self.role.is_none()
    }
}

#[derive(Serialize, Debug, Clone, JsonSchema)]
pub struct AdminUserResponse {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: AdminRole,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&AdminUser> for AdminUserResponse {
    fn from(admin: &AdminUser) -> Self {
        Self {
            id: admin.id,
            name: admin.name.clone(),
            email: admin.email.clone(),
            role: admin.role,
            created_at: admin.created_at,
            updated_at: admin.updated_at,
        }
    }
}

#[derive(Serialize, Debug, JsonSchema)]
pub struct AdminUserListResponse {
    pub items: Vec<AdminUserResponse>,
}

#[derive(Serialize, Debug, JsonSchema)]
pub struct AdminCreatedResponse {
    pub id: Uuid,
}

#[derive(Deserialize, Debug, Validate, JsonSchema)]
pub struct CreateAdminRequest {
    #[validate(length(max = 120))]
    pub name: String,
    #[validate(length(max = 255))]
    pub email: String,
    pub password: String,
    /// `SYSTEM` or `ADMIN`; kept as text so unknown values surface as validation errors.
    pub role: String,
}

#[derive(Deserialize, Debug, Default, Validate, JsonSchema)]
pub struct UpdateAdminRequest {
    #[validate(length(max = 120))]
    pub name: Option<String>,
    #[validate(length(max = 255))]
    pub email: Option<String>,
    pub role: Option<String>,
}
