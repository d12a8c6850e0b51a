use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::macros::string_enum;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub tech_id: Option<Uuid>, // linked technician, if any
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub full_name: Option<String>,
    pub role: UserRole,
    pub status: UserStatus,
    pub last_login: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

string_enum! {
    #[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
    pub enum UserRole {
        Admin => "admin",
        Manager => "manager",
        Technician => "technician",
    }
}

string_enum! {
    #[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
    pub enum UserStatus {
        Active => "active",
        Inactive => "inactive",
        Suspended => "suspended",
    }
}

impl Default for UserRole {
    fn default() -> Self {
        UserRole::Technician
    }
}

impl User {
    pub fn new(
        email: String,
        password_hash: String,
        full_name: Option<String>,
        role: Option<UserRole>,
    ) -> Self {
        let now = Utc::now();
        User {
            id: Uuid::new_v4(),
            tech_id: None,
            email,
            password_hash,
            full_name,
            role: role.unwrap_or_default(),
            status: UserStatus::Active,
            last_login: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }

    pub fn is_manager_or_admin(&self) -> bool {
        matches!(self.role, UserRole::Admin | UserRole::Manager)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserInput {
    pub email: String,
    pub password: String,
    pub full_name: Option<String>,
    pub role: Option<UserRole>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginInput {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordInput {
    pub current_password: String,
    pub new_password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub token: String,
    pub user: UserInfo,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserInfo {
    pub id: Uuid,
    pub tech_id: Option<Uuid>,
    pub email: String,
    pub full_name: Option<String>,
    pub role: UserRole,
}

impl From<User> for UserInfo {
    fn from(user: User) -> Self {
        UserInfo {
            id: user.id,
            tech_id: user.tech_id,
            email: user.email,
            full_name: user.full_name,
            role: user.role,
        }
    }
}
