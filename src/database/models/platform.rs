use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::macros::string_enum;

/// A job-sourcing platform (marketplace the jobs come from).
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Platform {
    pub id: Uuid,
    pub name: String,
    pub code: String,
    pub status: PlatformStatus,
    pub created_at: DateTime<Utc>,
}

string_enum! {
    #[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
    pub enum PlatformStatus {
        Active => "active",
        Inactive => "inactive",
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePlatformInput {
    pub name: String,
    pub code: String,
}
