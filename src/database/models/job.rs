use bigdecimal::BigDecimal;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::macros::string_enum;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: Uuid,
    pub platform_id: Uuid,
    pub platform_job_code: Option<String>,
    pub ticket_number: Option<String>,
    pub description: String,
    pub client_name: Option<String>,
    pub location: Option<String>,
    pub billing_type: BillingType,
    pub billing_amount: Option<BigDecimal>, // required before pay calculation
    pub estimated_hours: Option<BigDecimal>,
    pub expenses: BigDecimal,
    pub commissions: BigDecimal,
    pub job_status: JobStatus,
    pub job_date: Option<NaiveDate>,
    pub external_url: Option<String>,
    pub created_by: Option<Uuid>,
    pub updated_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

string_enum! {
    #[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
    pub enum BillingType {
        FlatRate => "flat_rate",
        Hourly => "hourly",
        PerTask => "per_task",
    }
}

string_enum! {
    #[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
    pub enum JobStatus {
        Pending => "pending",
        Assigned => "assigned",
        InProgress => "in_progress",
        Completed => "completed",
        Cancelled => "cancelled",
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateJobInput {
    pub platform_id: Uuid,
    pub platform_job_code: Option<String>,
    pub ticket_number: Option<String>,
    pub description: String,
    pub client_name: Option<String>,
    pub location: Option<String>,
    pub billing_type: Option<BillingType>,
    pub billing_amount: Option<BigDecimal>,
    pub estimated_hours: Option<BigDecimal>,
    pub expenses: Option<BigDecimal>,
    pub commissions: Option<BigDecimal>,
    pub job_date: Option<NaiveDate>,
    pub external_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateJobInput {
    pub platform_job_code: Option<String>,
    pub ticket_number: Option<String>,
    pub description: Option<String>,
    pub client_name: Option<String>,
    pub location: Option<String>,
    pub billing_type: Option<BillingType>,
    pub billing_amount: Option<BigDecimal>,
    pub estimated_hours: Option<BigDecimal>,
    pub expenses: Option<BigDecimal>,
    pub commissions: Option<BigDecimal>,
    pub job_status: Option<JobStatus>,
    pub job_date: Option<NaiveDate>,
    pub external_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobQuery {
    pub platform_id: Option<Uuid>,
    pub status: Option<String>,
    pub from_date: Option<NaiveDate>,
    pub to_date: Option<NaiveDate>,
}
