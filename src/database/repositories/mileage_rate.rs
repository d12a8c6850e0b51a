use anyhow::Result;
use chrono::{Duration, NaiveDate, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::database::{
    models::{CreateMileageRateInput, MileageRate},
    utils::sql,
};

#[derive(Clone)]
pub struct MileageRateRepository {
    pool: PgPool,
}

const RATE_COLUMNS: &str = r#"
    id,
    rate_per_mile,
    effective_date,
    end_date,
    description,
    created_at
"#;

impl MileageRateRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a new rate and close the previous open-ended one the day before
    /// the new rate takes effect.
    pub async fn create(&self, input: CreateMileageRateInput) -> Result<MileageRate> {
        sqlx::query(
            "UPDATE mileage_rates SET end_date = $1
             WHERE end_date IS NULL AND effective_date < $2",
        )
        .bind(input.effective_date - Duration::days(1))
        .bind(input.effective_date)
        .execute(&self.pool)
        .await?;

        let rate = sqlx::query_as::<_, MileageRate>(&sql(&format!(
            r#"
            INSERT INTO
                mileage_rates (id, rate_per_mile, effective_date, description, created_at)
            VALUES
                (?, ?, ?, ?, ?)
            RETURNING {}
            "#,
            RATE_COLUMNS
        )))
        .bind(Uuid::new_v4())
        .bind(&input.rate_per_mile)
        .bind(input.effective_date)
        .bind(&input.description)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(rate)
    }

    pub async fn get_all(&self) -> Result<Vec<MileageRate>> {
        let rates = sqlx::query_as::<_, MileageRate>(&format!(
            "SELECT {} FROM mileage_rates ORDER BY effective_date DESC",
            RATE_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(rates)
    }

    /// The rate effective as of a work date, if any.
    pub async fn rate_for_date(&self, date: NaiveDate) -> Result<Option<MileageRate>> {
        let rate = sqlx::query_as::<_, MileageRate>(&format!(
            "SELECT {} FROM mileage_rates
             WHERE effective_date <= $1
             ORDER BY effective_date DESC
             LIMIT 1",
            RATE_COLUMNS
        ))
        .bind(date)
        .fetch_optional(&self.pool)
        .await?;

        Ok(rate)
    }
}
