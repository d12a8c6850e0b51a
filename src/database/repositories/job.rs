use anyhow::Result;
use bigdecimal::BigDecimal;
use chrono::{NaiveDate, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::database::{
    models::{CreateJobInput, Job, JobStatus, UpdateJobInput},
    utils::sql,
};

#[derive(Clone)]
pub struct JobRepository {
    pool: PgPool,
}

const JOB_COLUMNS: &str = r#"
    id,
    platform_id,
    platform_job_code,
    ticket_number,
    description,
    client_name,
    location,
    billing_type,
    billing_amount,
    estimated_hours,
    expenses,
    commissions,
    job_status,
    job_date,
    external_url,
    created_by,
    updated_by,
    created_at,
    updated_at
"#;

impl JobRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, input: CreateJobInput, created_by: Option<Uuid>) -> Result<Job> {
        let now = Utc::now();
        let zero = BigDecimal::from(0);

        let job = sqlx::query_as::<_, Job>(&sql(&format!(
            r#"
            INSERT INTO
                jobs (
                    id, platform_id, platform_job_code, ticket_number, description,
                    client_name, location, billing_type, billing_amount, estimated_hours,
                    expenses, commissions, job_status, job_date, external_url,
                    created_by, updated_by, created_at, updated_at
                )
            VALUES
                (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING {}
            "#,
            JOB_COLUMNS
        )))
        .bind(Uuid::new_v4())
        .bind(input.platform_id)
        .bind(&input.platform_job_code)
        .bind(&input.ticket_number)
        .bind(&input.description)
        .bind(&input.client_name)
        .bind(&input.location)
        .bind(input.billing_type.unwrap_or(crate::database::models::BillingType::FlatRate))
        .bind(&input.billing_amount)
        .bind(&input.estimated_hours)
        .bind(input.expenses.unwrap_or_else(|| zero.clone()))
        .bind(input.commissions.unwrap_or(zero))
        .bind(JobStatus::Pending)
        .bind(input.job_date)
        .bind(&input.external_url)
        .bind(created_by)
        .bind(created_by)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        Ok(job)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Job>> {
        let job = sqlx::query_as::<_, Job>(&format!(
            "SELECT {} FROM jobs WHERE id = $1",
            JOB_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(job)
    }

    pub async fn find_by_external_url(&self, url: &str) -> Result<Option<Job>> {
        let job = sqlx::query_as::<_, Job>(&format!(
            "SELECT {} FROM jobs WHERE external_url = $1",
            JOB_COLUMNS
        ))
        .bind(url)
        .fetch_optional(&self.pool)
        .await?;

        Ok(job)
    }

    pub async fn find_by_ticket_number(&self, ticket_number: &str) -> Result<Option<Job>> {
        let job = sqlx::query_as::<_, Job>(&format!(
            "SELECT {} FROM jobs WHERE ticket_number = $1",
            JOB_COLUMNS
        ))
        .bind(ticket_number)
        .fetch_optional(&self.pool)
        .await?;

        Ok(job)
    }

    pub async fn get_jobs(
        &self,
        platform_id: Option<Uuid>,
        status: Option<JobStatus>,
        from_date: Option<NaiveDate>,
        to_date: Option<NaiveDate>,
    ) -> Result<Vec<Job>> {
        let mut query = format!("SELECT {} FROM jobs", JOB_COLUMNS);

        let mut params = Vec::new();
        let mut conditions = vec![];

        if let Some(pid) = platform_id {
            conditions.push(format!("platform_id = ${}::uuid", params.len() + 1));
            params.push(pid.to_string());
        }

        if let Some(s) = status {
            conditions.push(format!("job_status = ${}", params.len() + 1));
            params.push(s.to_string());
        }

        if let Some(fd) = from_date {
            conditions.push(format!("job_date >= ${}::date", params.len() + 1));
            params.push(fd.to_string());
        }

        if let Some(td) = to_date {
            conditions.push(format!("job_date <= ${}::date", params.len() + 1));
            params.push(td.to_string());
        }

        if !conditions.is_empty() {
            query.push_str(" WHERE ");
            query.push_str(&conditions.join(" AND "));
        }

        query.push_str(" ORDER BY job_date DESC NULLS LAST, created_at DESC");

        let mut prepared = sqlx::query_as::<_, Job>(&query);
        for param in params {
            prepared = prepared.bind(param);
        }

        let jobs = prepared.fetch_all(&self.pool).await?;

        Ok(jobs)
    }

    pub async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Job>> {
        let jobs = sqlx::query_as::<_, Job>(&format!(
            "SELECT {} FROM jobs WHERE id = ANY($1)",
            JOB_COLUMNS
        ))
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(jobs)
    }

    pub async fn update(
        &self,
        id: Uuid,
        input: UpdateJobInput,
        updated_by: Option<Uuid>,
    ) -> Result<Option<Job>> {
        let job = sqlx::query_as::<_, Job>(&format!(
            r#"
            UPDATE jobs
            SET
                platform_job_code = COALESCE($1, platform_job_code),
                ticket_number = COALESCE($2, ticket_number),
                description = COALESCE($3, description),
                client_name = COALESCE($4, client_name),
                location = COALESCE($5, location),
                billing_type = COALESCE($6, billing_type),
                billing_amount = COALESCE($7, billing_amount),
                estimated_hours = COALESCE($8, estimated_hours),
                expenses = COALESCE($9, expenses),
                commissions = COALESCE($10, commissions),
                job_status = COALESCE($11, job_status),
                job_date = COALESCE($12, job_date),
                external_url = COALESCE($13, external_url),
                updated_by = $14,
                updated_at = $15
            WHERE id = $16
            RETURNING {}
            "#,
            JOB_COLUMNS
        ))
        .bind(input.platform_job_code)
        .bind(input.ticket_number)
        .bind(input.description)
        .bind(input.client_name)
        .bind(input.location)
        .bind(input.billing_type)
        .bind(input.billing_amount)
        .bind(input.estimated_hours)
        .bind(input.expenses)
        .bind(input.commissions)
        .bind(input.job_status)
        .bind(input.job_date)
        .bind(input.external_url)
        .bind(updated_by)
        .bind(Utc::now())
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(job)
    }

    pub async fn set_status(&self, id: Uuid, status: JobStatus) -> Result<()> {
        sqlx::query("UPDATE jobs SET job_status = $1, updated_at = $2 WHERE id = $3")
            .bind(status)
            .bind(Utc::now())
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    pub async fn count_active(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM jobs WHERE job_status IN ('pending', 'assigned', 'in_progress')",
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }
}
