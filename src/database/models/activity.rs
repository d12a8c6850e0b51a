use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ActivityLog {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub action_type: String,
    pub entity_type: String,
    pub entity_id: Option<Uuid>,
    pub old_values: Option<String>, // JSON serialized as TEXT
    pub new_values: Option<String>,
    pub description: Option<String>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreateActivityInput {
    pub user_id: Option<Uuid>,
    pub action_type: String,
    pub entity_type: String,
    pub entity_id: Option<Uuid>,
    pub old_values: Option<serde_json::Value>,
    pub new_values: Option<serde_json::Value>,
    pub description: Option<String>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityFilter {
    pub user_id: Option<Uuid>,
    pub action_type: Option<String>,
    pub entity_type: Option<String>,
    pub from_date: Option<DateTime<Utc>>,
    pub to_date: Option<DateTime<Utc>>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

// Common entity types for consistency
#[allow(non_snake_case)]
pub mod EntityType {
    pub const TIME_ENTRY: &str = "time_entry";
    pub const JOB: &str = "job";
    pub const TECHNICIAN: &str = "technician";
    pub const USER: &str = "user";
    pub const PAY_PERIOD: &str = "pay_period";
    pub const MILEAGE_RATE: &str = "mileage_rate";
    pub const REPORT: &str = "report";
}

// Common action types
#[allow(non_snake_case)]
pub mod ActionType {
    pub const CREATED: &str = "created";
    pub const UPDATED: &str = "updated";
    pub const DELETED: &str = "deleted";
    pub const SUBMITTED: &str = "submitted";
    pub const VERIFIED: &str = "verified";
    pub const REJECTED: &str = "rejected";
    pub const BULK_SUBMITTED: &str = "bulk_submitted";
    pub const BULK_VERIFIED: &str = "bulk_verified";
    pub const IMPORTED: &str = "imported";
    pub const PERIOD_CLOSED: &str = "period_closed";
    pub const REPORT_GENERATED: &str = "report_generated";
    pub const LOGIN: &str = "login";
    pub const REGISTERED: &str = "registered";
    pub const PASSWORD_CHANGED: &str = "password_changed";
}
