use bigdecimal::BigDecimal;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Point-in-time mileage reimbursement rate. The rate effective for a work
/// date D is the row with effective_date <= D < next row's effective_date;
/// rates are never recalculated retroactively.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct MileageRate {
    pub id: Uuid,
    pub rate_per_mile: BigDecimal, // NUMERIC(6,3)
    pub effective_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMileageRateInput {
    pub rate_per_mile: BigDecimal,
    pub effective_date: NaiveDate,
    pub description: Option<String>,
}
