use anyhow::Result;
use bigdecimal::BigDecimal;
use chrono::{NaiveDate, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::database::{
    models::{CreatePayPeriodInput, PayPeriod, PayPeriodStatus},
    utils::sql,
};

#[derive(Clone)]
pub struct PayPeriodRepository {
    pool: PgPool,
}

const PERIOD_COLUMNS: &str = r#"
    id,
    start_date,
    end_date,
    period_name,
    status,
    total_hours,
    created_at,
    closed_at
"#;

impl PayPeriodRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, input: CreatePayPeriodInput) -> Result<PayPeriod> {
        let period_name = input
            .period_name
            .unwrap_or_else(|| format!("{} to {}", input.start_date, input.end_date));

        let period = sqlx::query_as::<_, PayPeriod>(&sql(&format!(
            r#"
            INSERT INTO
                pay_periods (id, start_date, end_date, period_name, status, created_at)
            VALUES
                (?, ?, ?, ?, ?, ?)
            RETURNING {}
            "#,
            PERIOD_COLUMNS
        )))
        .bind(Uuid::new_v4())
        .bind(input.start_date)
        .bind(input.end_date)
        .bind(period_name)
        .bind(PayPeriodStatus::Open)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(period)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<PayPeriod>> {
        let period = sqlx::query_as::<_, PayPeriod>(&format!(
            "SELECT {} FROM pay_periods WHERE id = $1",
            PERIOD_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(period)
    }

    pub async fn find_open_for_date(&self, date: NaiveDate) -> Result<Option<PayPeriod>> {
        let period = sqlx::query_as::<_, PayPeriod>(&format!(
            "SELECT {} FROM pay_periods
             WHERE start_date <= $1 AND end_date >= $1 AND status = 'open'",
            PERIOD_COLUMNS
        ))
        .bind(date)
        .fetch_optional(&self.pool)
        .await?;

        Ok(period)
    }

    pub async fn find_overlapping(
        &self,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Option<PayPeriod>> {
        let period = sqlx::query_as::<_, PayPeriod>(&format!(
            "SELECT {} FROM pay_periods WHERE start_date <= $1 AND end_date >= $2",
            PERIOD_COLUMNS
        ))
        .bind(end_date)
        .bind(start_date)
        .fetch_optional(&self.pool)
        .await?;

        Ok(period)
    }

    pub async fn get_all(&self, status: Option<PayPeriodStatus>) -> Result<Vec<PayPeriod>> {
        let periods = match status {
            Some(s) => {
                sqlx::query_as::<_, PayPeriod>(&format!(
                    "SELECT {} FROM pay_periods WHERE status = $1 ORDER BY end_date DESC",
                    PERIOD_COLUMNS
                ))
                .bind(s)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, PayPeriod>(&format!(
                    "SELECT {} FROM pay_periods ORDER BY end_date DESC",
                    PERIOD_COLUMNS
                ))
                .fetch_all(&self.pool)
                .await?
            }
        };

        Ok(periods)
    }

    /// Close an open period. Status guard in SQL, same shape as entry
    /// transitions: returns None when the period is not open anymore.
    pub async fn close(&self, id: Uuid, total_hours: BigDecimal) -> Result<Option<PayPeriod>> {
        let period = sqlx::query_as::<_, PayPeriod>(&format!(
            r#"
            UPDATE pay_periods
            SET status = $1, total_hours = $2, closed_at = $3
            WHERE id = $4 AND status = $5
            RETURNING {}
            "#,
            PERIOD_COLUMNS
        ))
        .bind(PayPeriodStatus::Closed)
        .bind(total_hours)
        .bind(Utc::now())
        .bind(id)
        .bind(PayPeriodStatus::Open)
        .fetch_optional(&self.pool)
        .await?;

        Ok(period)
    }
}
