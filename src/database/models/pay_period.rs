use bigdecimal::BigDecimal;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::macros::string_enum;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct PayPeriod {
    pub id: Uuid,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub period_name: Option<String>,
    pub status: PayPeriodStatus,
    pub total_hours: Option<BigDecimal>,
    pub created_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
}

string_enum! {
    #[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
    pub enum PayPeriodStatus {
        Open => "open",
        Closed => "closed",
        Archived => "archived",
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePayPeriodInput {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub period_name: Option<String>,
}

/// Pay period row plus derived entry rollups, for listings.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PayPeriodSummary {
    #[serde(flatten)]
    pub period: PayPeriod,
    pub entry_count: i64,
    pub logged_hours: BigDecimal,
    pub verified_hours: BigDecimal,
}
