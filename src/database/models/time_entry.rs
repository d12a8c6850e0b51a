use bigdecimal::BigDecimal;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::macros::string_enum;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct TimeEntry {
    pub id: Uuid,
    pub job_id: Uuid,
    pub tech_id: Option<Uuid>, // null for imported rows pending assignment
    pub period_id: Option<Uuid>,
    pub date_worked: NaiveDate,
    pub time_in: Option<NaiveTime>,
    pub time_out: Option<NaiveTime>,
    pub hours_worked: Option<BigDecimal>,
    pub mileage: BigDecimal,
    pub per_diem: BigDecimal,
    pub personal_expenses: BigDecimal,
    pub status: TimeEntryStatus,
    pub rejection_reason: Option<String>,
    pub notes: Option<String>,
    pub verified_by: Option<Uuid>,
    pub verified_at: Option<DateTime<Utc>>,
    pub created_by: Option<Uuid>,
    pub updated_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

string_enum! {
    #[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
    pub enum TimeEntryStatus {
        Draft => "draft",
        Submitted => "submitted",
        Verified => "verified",
        Billed => "billed",
        Paid => "paid",
    }
}

impl TimeEntryStatus {
    /// Verified, billed and paid entries all count toward pay and reports;
    /// draft and submitted never do.
    pub fn is_payable(&self) -> bool {
        matches!(
            self,
            TimeEntryStatus::Verified | TimeEntryStatus::Billed | TimeEntryStatus::Paid
        )
    }

    pub const PAYABLE: [TimeEntryStatus; 3] = [
        TimeEntryStatus::Verified,
        TimeEntryStatus::Billed,
        TimeEntryStatus::Paid,
    ];
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTimeEntryInput {
    pub job_id: Uuid,
    pub tech_id: Option<Uuid>,
    pub period_id: Option<Uuid>,
    pub date_worked: NaiveDate,
    pub time_in: Option<NaiveTime>,
    pub time_out: Option<NaiveTime>,
    pub hours_worked: Option<BigDecimal>,
    pub mileage: Option<BigDecimal>,
    pub per_diem: Option<BigDecimal>,
    pub personal_expenses: Option<BigDecimal>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTimeEntryInput {
    pub job_id: Option<Uuid>,
    pub tech_id: Option<Uuid>,
    pub date_worked: Option<NaiveDate>,
    pub time_in: Option<Option<NaiveTime>>,
    pub time_out: Option<Option<NaiveTime>>,
    pub hours_worked: Option<Option<BigDecimal>>,
    pub mileage: Option<BigDecimal>,
    pub per_diem: Option<BigDecimal>,
    pub personal_expenses: Option<BigDecimal>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeEntryQuery {
    pub tech_id: Option<Uuid>,
    pub job_id: Option<Uuid>,
    pub status: Option<String>,
    pub period_id: Option<Uuid>,
    pub from_date: Option<NaiveDate>,
    pub to_date: Option<NaiveDate>,
    pub unassigned: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RejectInput {
    pub reason: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkEntryInput {
    pub entry_ids: Vec<Uuid>,
}

/// Per-entry outcome of a bulk transition. Failures never abort the batch.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkEntryError {
    pub entry_id: Uuid,
    pub error: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkOutcome {
    pub succeeded: Vec<Uuid>,
    pub errors: Vec<BulkEntryError>,
}
