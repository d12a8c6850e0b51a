use bigdecimal::{BigDecimal, Zero};
use chrono::{NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::database::models::{CreateJobInput, Job, JobStatus, TimeEntry, TimeEntryStatus};
use crate::database::repositories::{JobRepository, PlatformRepository, TimeEntryRepository};
use crate::error::AppError;
use crate::services::workflow::derive_hours;

/// A scraped work order delivered by the import producer. Technician
/// references are always absent; imported entries stay in draft until a
/// manager assigns them.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkOrderImport {
    pub work_order_id: String,
    pub url: Option<String>,
    pub title: Option<String>,
    pub company: Option<String>,
    pub platform: Option<String>,
    pub total_pay: Option<BigDecimal>,
    pub scheduled_date: Option<String>,
    #[serde(default)]
    pub time_entries: Vec<TimeEntryImport>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeEntryImport {
    pub hours: Option<BigDecimal>,
    pub date: Option<String>,
    pub time_in: Option<String>,
    pub time_out: Option<String>,
    pub mileage: Option<BigDecimal>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportSummary {
    pub imported_jobs: usize,
    pub imported_entries: usize,
    pub skipped_jobs: usize,
    pub skipped_entries: usize,
    pub errors: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportPreviewItem {
    pub work_order_id: String,
    pub title: Option<String>,
    pub existing_job_id: Option<Uuid>,
    pub entry_count: usize,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportPreview {
    pub new_jobs: Vec<ImportPreviewItem>,
    pub existing_jobs: Vec<ImportPreviewItem>,
    pub total_entries: usize,
}

/// Scraper dates arrive in a handful of US formats.
pub fn parse_import_date(raw: &str) -> Option<NaiveDate> {
    let candidate = raw.split_whitespace().last().unwrap_or(raw);
    for format in ["%m/%d/%Y", "%Y-%m-%d", "%m/%d/%y"] {
        if let Ok(date) = NaiveDate::parse_from_str(candidate, format) {
            return Some(date);
        }
    }
    None
}

/// Clock times arrive as "1:35 PM", "13:35" and similar.
pub fn parse_import_time(raw: &str) -> Option<NaiveTime> {
    let cleaned = raw.trim().to_uppercase();
    for format in ["%I:%M %p", "%I:%M%p", "%H:%M", "%I:%M:%S %p"] {
        if let Ok(time) = NaiveTime::parse_from_str(&cleaned, format) {
            return Some(time);
        }
    }
    None
}

#[derive(Clone)]
pub struct ImportService {
    job_repository: JobRepository,
    entry_repository: TimeEntryRepository,
    platform_repository: PlatformRepository,
}

impl ImportService {
    pub fn new(pool: PgPool) -> Self {
        Self {
            job_repository: JobRepository::new(pool.clone()),
            entry_repository: TimeEntryRepository::new(pool.clone()),
            platform_repository: PlatformRepository::new(pool),
        }
    }

    async fn find_existing_job(&self, order: &WorkOrderImport) -> Result<Option<Job>, AppError> {
        if let Some(url) = order.url.as_deref().filter(|u| !u.is_empty()) {
            if let Some(job) = self.job_repository.find_by_external_url(url).await? {
                return Ok(Some(job));
            }
        }

        let ticket = format!("WO-{}", order.work_order_id);
        Ok(self.job_repository.find_by_ticket_number(&ticket).await?)
    }

    /// Import a batch of scraped work orders. Per-item errors are collected,
    /// never aborting the batch; already-present jobs and entries are
    /// skipped, not duplicated.
    pub async fn import_work_orders(
        &self,
        orders: &[WorkOrderImport],
        imported_by: Uuid,
    ) -> Result<ImportSummary, AppError> {
        let mut summary = ImportSummary::default();

        for order in orders {
            match self.import_one(order, imported_by, &mut summary).await {
                Ok(()) => {}
                Err(err) => summary.errors.push(format!(
                    "work order {}: {}",
                    order.work_order_id, err
                )),
            }
        }

        Ok(summary)
    }

    async fn import_one(
        &self,
        order: &WorkOrderImport,
        imported_by: Uuid,
        summary: &mut ImportSummary,
    ) -> Result<(), AppError> {
        let job = match self.find_existing_job(order).await? {
            Some(existing) => {
                summary.skipped_jobs += 1;
                existing
            }
            None => {
                let platform_name = order.platform.as_deref().unwrap_or("Field Nation");
                let code: String = platform_name
                    .split_whitespace()
                    .filter_map(|w| w.chars().next())
                    .collect::<String>()
                    .to_uppercase();
                let platform = self
                    .platform_repository
                    .find_or_create(platform_name, &code)
                    .await?;

                let description = order
                    .title
                    .clone()
                    .filter(|t| !t.is_empty())
                    .unwrap_or_else(|| format!("{} #{}", platform_name, order.work_order_id));

                let input = CreateJobInput {
                    platform_id: platform.id,
                    platform_job_code: Some(order.work_order_id.clone()),
                    ticket_number: Some(format!("WO-{}", order.work_order_id)),
                    description,
                    client_name: order.company.clone(),
                    location: None,
                    billing_type: None,
                    billing_amount: order.total_pay.clone(),
                    estimated_hours: None,
                    expenses: None,
                    commissions: None,
                    job_date: order.scheduled_date.as_deref().and_then(parse_import_date),
                    external_url: order.url.clone(),
                };

                let mut job = self.job_repository.create(input, Some(imported_by)).await?;

                // Scraped orders describe finished work.
                self.job_repository
                    .set_status(job.id, JobStatus::Completed)
                    .await?;
                job.job_status = JobStatus::Completed;

                summary.imported_jobs += 1;
                job
            }
        };

        for item in &order.time_entries {
            let date_worked = item
                .date
                .as_deref()
                .and_then(parse_import_date)
                .or(job.job_date)
                .unwrap_or_else(|| Utc::now().date_naive());

            let time_in = item.time_in.as_deref().and_then(parse_import_time);
            let time_out = item.time_out.as_deref().and_then(parse_import_time);
            let hours_worked = derive_hours(item.hours.clone(), time_in, time_out);

            // Dedup key: (job, date worked, hours). A match means the entry
            // is already present and is skipped.
            let dedup_hours = hours_worked.clone().unwrap_or_else(BigDecimal::zero);
            if self
                .entry_repository
                .find_duplicate(job.id, date_worked, &dedup_hours)
                .await?
                .is_some()
            {
                summary.skipped_entries += 1;
                continue;
            }

            let now = Utc::now();
            let entry = TimeEntry {
                id: Uuid::new_v4(),
                job_id: job.id,
                tech_id: None, // unassigned until a manager picks the tech
                period_id: None,
                date_worked,
                time_in,
                time_out,
                hours_worked,
                mileage: item.mileage.clone().unwrap_or_else(BigDecimal::zero),
                per_diem: BigDecimal::zero(),
                personal_expenses: BigDecimal::zero(),
                status: TimeEntryStatus::Draft,
                rejection_reason: None,
                notes: Some(format!("Imported from WO#{}", order.work_order_id)),
                verified_by: None,
                verified_at: None,
                created_by: Some(imported_by),
                updated_by: Some(imported_by),
                created_at: now,
                updated_at: now,
            };

            self.entry_repository.create(&entry).await?;
            summary.imported_entries += 1;
        }

        Ok(())
    }

    /// Report what an import would do without writing anything.
    pub async fn preview(&self, orders: &[WorkOrderImport]) -> Result<ImportPreview, AppError> {
        let mut preview = ImportPreview::default();

        for order in orders {
            let existing = self.find_existing_job(order).await?;
            let item = ImportPreviewItem {
                work_order_id: order.work_order_id.clone(),
                title: order.title.clone(),
                existing_job_id: existing.as_ref().map(|j| j.id),
                entry_count: order.time_entries.len(),
            };
            preview.total_entries += item.entry_count;

            if existing.is_some() {
                preview.existing_jobs.push(item);
            } else {
                preview.new_jobs.push(item);
            }
        }

        Ok(preview)
    }
}
