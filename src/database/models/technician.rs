use bigdecimal::BigDecimal;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::macros::string_enum;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Technician {
    pub id: Uuid,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub hourly_rate: BigDecimal, // guaranteed minimum rate, NUMERIC(10,2)
    pub status: TechnicianStatus,
    pub hire_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

string_enum! {
    #[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
    pub enum TechnicianStatus {
        Active => "active",
        Inactive => "inactive",
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTechnicianInput {
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub hourly_rate: Option<BigDecimal>,
    pub hire_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTechnicianInput {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub hourly_rate: Option<BigDecimal>,
    pub status: Option<TechnicianStatus>,
    pub hire_date: Option<NaiveDate>,
}
