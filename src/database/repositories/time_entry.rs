use anyhow::Result;
use bigdecimal::BigDecimal;
use chrono::{NaiveDate, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::database::{
    models::{TimeEntry, TimeEntryQuery, TimeEntryStatus},
    utils::sql,
};

#[derive(Clone)]
pub struct TimeEntryRepository {
    pool: PgPool,
}

const ENTRY_COLUMNS: &str = r#"
    id,
    job_id,
    tech_id,
    period_id,
    date_worked,
    time_in,
    time_out,
    hours_worked,
    mileage,
    per_diem,
    personal_expenses,
    status,
    rejection_reason,
    notes,
    verified_by,
    verified_at,
    created_by,
    updated_by,
    created_at,
    updated_at
"#;

fn payable_statuses() -> Vec<String> {
    TimeEntryStatus::PAYABLE
        .iter()
        .map(|s| s.to_string())
        .collect()
}

impl TimeEntryRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, entry: &TimeEntry) -> Result<TimeEntry> {
        let created = sqlx::query_as::<_, TimeEntry>(&sql(&format!(
            r#"
            INSERT INTO
                time_entries (
                    id, job_id, tech_id, period_id, date_worked, time_in, time_out,
                    hours_worked, mileage, per_diem, personal_expenses, status,
                    rejection_reason, notes, verified_by, verified_at,
                    created_by, updated_by, created_at, updated_at
                )
            VALUES
                (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING {}
            "#,
            ENTRY_COLUMNS
        )))
        .bind(entry.id)
        .bind(entry.job_id)
        .bind(entry.tech_id)
        .bind(entry.period_id)
        .bind(entry.date_worked)
        .bind(entry.time_in)
        .bind(entry.time_out)
        .bind(&entry.hours_worked)
        .bind(&entry.mileage)
        .bind(&entry.per_diem)
        .bind(&entry.personal_expenses)
        .bind(entry.status)
        .bind(&entry.rejection_reason)
        .bind(&entry.notes)
        .bind(entry.verified_by)
        .bind(entry.verified_at)
        .bind(entry.created_by)
        .bind(entry.updated_by)
        .bind(entry.created_at)
        .bind(entry.updated_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(created)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<TimeEntry>> {
        let entry = sqlx::query_as::<_, TimeEntry>(&format!(
            "SELECT {} FROM time_entries WHERE id = $1",
            ENTRY_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(entry)
    }

    pub async fn get_entries(&self, filter: &TimeEntryQuery) -> Result<Vec<TimeEntry>> {
        let mut query = format!("SELECT {} FROM time_entries", ENTRY_COLUMNS);

        let mut params = Vec::new();
        let mut conditions = vec![];

        if filter.unassigned.unwrap_or(false) {
            conditions.push("tech_id IS NULL".to_string());
        } else if let Some(tid) = filter.tech_id {
            conditions.push(format!("tech_id = ${}::uuid", params.len() + 1));
            params.push(tid.to_string());
        }

        if let Some(jid) = filter.job_id {
            conditions.push(format!("job_id = ${}::uuid", params.len() + 1));
            params.push(jid.to_string());
        }

        if let Some(status) = &filter.status {
            conditions.push(format!("status = ${}", params.len() + 1));
            params.push(status.clone());
        }

        if let Some(pid) = filter.period_id {
            conditions.push(format!("period_id = ${}::uuid", params.len() + 1));
            params.push(pid.to_string());
        }

        if let Some(fd) = filter.from_date {
            conditions.push(format!("date_worked >= ${}::date", params.len() + 1));
            params.push(fd.to_string());
        }

        if let Some(td) = filter.to_date {
            conditions.push(format!("date_worked <= ${}::date", params.len() + 1));
            params.push(td.to_string());
        }

        if !conditions.is_empty() {
            query.push_str(" WHERE ");
            query.push_str(&conditions.join(" AND "));
        }

        query.push_str(" ORDER BY date_worked DESC, created_at DESC");

        let mut prepared = sqlx::query_as::<_, TimeEntry>(&query);
        for param in params {
            prepared = prepared.bind(param);
        }

        let entries = prepared.fetch_all(&self.pool).await?;

        Ok(entries)
    }

    /// All entries for a job that count toward pay (verified/billed/paid).
    pub async fn payable_for_job(&self, job_id: Uuid) -> Result<Vec<TimeEntry>> {
        let entries = sqlx::query_as::<_, TimeEntry>(&format!(
            "SELECT {} FROM time_entries WHERE job_id = $1 AND status = ANY($2) ORDER BY date_worked",
            ENTRY_COLUMNS
        ))
        .bind(job_id)
        .bind(payable_statuses())
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }

    /// Payable entries across a set of jobs, for billing rollups.
    pub async fn payable_for_jobs(&self, job_ids: &[Uuid]) -> Result<Vec<TimeEntry>> {
        let entries = sqlx::query_as::<_, TimeEntry>(&format!(
            "SELECT {} FROM time_entries WHERE job_id = ANY($1) AND status = ANY($2) ORDER BY date_worked",
            ENTRY_COLUMNS
        ))
        .bind(job_ids)
        .bind(payable_statuses())
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }

    /// Payable entries in a date range, optionally narrowed to one technician.
    pub async fn payable_in_range(
        &self,
        from_date: NaiveDate,
        to_date: NaiveDate,
        tech_id: Option<Uuid>,
    ) -> Result<Vec<TimeEntry>> {
        let mut query = format!(
            "SELECT {} FROM time_entries
             WHERE date_worked >= $1 AND date_worked <= $2 AND status = ANY($3)",
            ENTRY_COLUMNS
        );

        if tech_id.is_some() {
            query.push_str(" AND tech_id = $4");
        }

        query.push_str(" ORDER BY date_worked");

        let mut prepared = sqlx::query_as::<_, TimeEntry>(&query)
            .bind(from_date)
            .bind(to_date)
            .bind(payable_statuses());

        if let Some(tid) = tech_id {
            prepared = prepared.bind(tid);
        }

        let entries = prepared.fetch_all(&self.pool).await?;

        Ok(entries)
    }

    pub async fn entries_for_tech_in_range(
        &self,
        tech_id: Uuid,
        from_date: NaiveDate,
        to_date: NaiveDate,
    ) -> Result<Vec<TimeEntry>> {
        let entries = sqlx::query_as::<_, TimeEntry>(&format!(
            "SELECT {} FROM time_entries
             WHERE tech_id = $1 AND date_worked >= $2 AND date_worked <= $3
             ORDER BY date_worked",
            ENTRY_COLUMNS
        ))
        .bind(tech_id)
        .bind(from_date)
        .bind(to_date)
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }

    pub async fn entries_for_period(&self, period_id: Uuid) -> Result<Vec<TimeEntry>> {
        let entries = sqlx::query_as::<_, TimeEntry>(&format!(
            "SELECT {} FROM time_entries WHERE period_id = $1 ORDER BY date_worked",
            ENTRY_COLUMNS
        ))
        .bind(period_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }

    /// Optimistic status transition: the row is mutated only when its status
    /// still matches `expected`. Returns None when the guard loses the race.
    pub async fn transition_status(
        &self,
        id: Uuid,
        expected: TimeEntryStatus,
        next: TimeEntryStatus,
        updated_by: Uuid,
    ) -> Result<Option<TimeEntry>> {
        let entry = sqlx::query_as::<_, TimeEntry>(&format!(
            r#"
            UPDATE time_entries
            SET status = $1, updated_by = $2, updated_at = $3
            WHERE id = $4 AND status = $5
            RETURNING {}
            "#,
            ENTRY_COLUMNS
        ))
        .bind(next)
        .bind(updated_by)
        .bind(Utc::now())
        .bind(id)
        .bind(expected)
        .fetch_optional(&self.pool)
        .await?;

        Ok(entry)
    }

    /// Submitted -> verified with verifier stamp, same compare-and-swap guard.
    pub async fn mark_verified(&self, id: Uuid, verified_by: Uuid) -> Result<Option<TimeEntry>> {
        let now = Utc::now();

        let entry = sqlx::query_as::<_, TimeEntry>(&format!(
            r#"
            UPDATE time_entries
            SET status = $1, verified_by = $2, verified_at = $3,
                rejection_reason = NULL, updated_by = $2, updated_at = $3
            WHERE id = $4 AND status = $5
            RETURNING {}
            "#,
            ENTRY_COLUMNS
        ))
        .bind(TimeEntryStatus::Verified)
        .bind(verified_by)
        .bind(now)
        .bind(id)
        .bind(TimeEntryStatus::Submitted)
        .fetch_optional(&self.pool)
        .await?;

        Ok(entry)
    }

    /// Submitted -> draft with the rejection reason attached.
    pub async fn mark_rejected(
        &self,
        id: Uuid,
        rejected_by: Uuid,
        reason: &str,
    ) -> Result<Option<TimeEntry>> {
        let entry = sqlx::query_as::<_, TimeEntry>(&format!(
            r#"
            UPDATE time_entries
            SET status = $1, rejection_reason = $2, updated_by = $3, updated_at = $4
            WHERE id = $5 AND status = $6
            RETURNING {}
            "#,
            ENTRY_COLUMNS
        ))
        .bind(TimeEntryStatus::Draft)
        .bind(reason)
        .bind(rejected_by)
        .bind(Utc::now())
        .bind(id)
        .bind(TimeEntryStatus::Submitted)
        .fetch_optional(&self.pool)
        .await?;

        Ok(entry)
    }

    pub async fn update_fields(&self, entry: &TimeEntry) -> Result<TimeEntry> {
        let updated = sqlx::query_as::<_, TimeEntry>(&format!(
            r#"
            UPDATE time_entries
            SET
                job_id = $1,
                tech_id = $2,
                period_id = $3,
                date_worked = $4,
                time_in = $5,
                time_out = $6,
                hours_worked = $7,
                mileage = $8,
                per_diem = $9,
                personal_expenses = $10,
                notes = $11,
                updated_by = $12,
                updated_at = $13
            WHERE id = $14
            RETURNING {}
            "#,
            ENTRY_COLUMNS
        ))
        .bind(entry.job_id)
        .bind(entry.tech_id)
        .bind(entry.period_id)
        .bind(entry.date_worked)
        .bind(entry.time_in)
        .bind(entry.time_out)
        .bind(&entry.hours_worked)
        .bind(&entry.mileage)
        .bind(&entry.per_diem)
        .bind(&entry.personal_expenses)
        .bind(&entry.notes)
        .bind(entry.updated_by)
        .bind(Utc::now())
        .bind(entry.id)
        .fetch_one(&self.pool)
        .await?;

        Ok(updated)
    }

    /// Delete a draft entry. Returns false when the entry was not draft
    /// (or did not exist) — the same status guard as transitions.
    pub async fn delete_draft(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM time_entries WHERE id = $1 AND status = 'draft'")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Import dedup key: (job_id, date_worked, hours_worked).
    pub async fn find_duplicate(
        &self,
        job_id: Uuid,
        date_worked: NaiveDate,
        hours_worked: &BigDecimal,
    ) -> Result<Option<TimeEntry>> {
        let entry = sqlx::query_as::<_, TimeEntry>(&format!(
            "SELECT {} FROM time_entries
             WHERE job_id = $1 AND date_worked = $2 AND hours_worked = $3",
            ENTRY_COLUMNS
        ))
        .bind(job_id)
        .bind(date_worked)
        .bind(hours_worked)
        .fetch_optional(&self.pool)
        .await?;

        Ok(entry)
    }

    pub async fn count_by_status(&self, status: TimeEntryStatus) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM time_entries WHERE status = $1")
            .bind(status)
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    pub async fn count_unverified_in_period(&self, period_id: Uuid) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM time_entries
             WHERE period_id = $1 AND status IN ('draft', 'submitted')",
        )
        .bind(period_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    /// Attach entries without a period to a newly created period by date range.
    pub async fn attach_to_period(
        &self,
        period_id: Uuid,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<u64> {
        let result = sqlx::query(
            "UPDATE time_entries SET period_id = $1
             WHERE period_id IS NULL AND date_worked >= $2 AND date_worked <= $3",
        )
        .bind(period_id)
        .bind(start_date)
        .bind(end_date)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}
