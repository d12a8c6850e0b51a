use std::collections::{BTreeMap, BTreeSet};

use bigdecimal::{BigDecimal, Zero};
use chrono::{Datelike, Duration, NaiveDate, Utc};
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::database::models::{
    Job, JobStatus, TimeEntry, TimeEntryQuery, TimeEntryStatus,
};
use crate::database::repositories::{
    JobRepository, MileageRateRepository, PlatformRepository, TechnicianRepository,
    TimeEntryRepository,
};
use crate::error::AppError;
use crate::services::pay::{
    JobPayBreakdown, PayConfig, PayError, PayTotals, PayWarning, compute_job_pay,
};

/// One job's pay line inside a technician's payroll breakdown.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobPayLine {
    pub job_id: Uuid,
    pub ticket_number: Option<String>,
    pub description: String,
    pub external_url: Option<String>,
    pub billing_amount: Option<BigDecimal>,
    pub entry_dates: Vec<NaiveDate>,
    pub date_display: Option<String>,
    pub hours: BigDecimal,
    pub effective_rate: BigDecimal,
    pub using_minimum: bool,
    pub base_pay: BigDecimal,
    pub mileage: BigDecimal,
    pub mileage_pay: BigDecimal,
    pub per_diem: BigDecimal,
    pub personal_expenses: BigDecimal,
    pub profit_share: BigDecimal,
    pub total_pay: BigDecimal,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TechnicianPayroll {
    pub tech_id: Uuid,
    pub tech_name: String,
    pub min_rate: BigDecimal,
    pub jobs: Vec<JobPayLine>,
    pub totals: PayTotals,
}

/// A job the report could not price; rendered as an explicit
/// "cannot calculate" row instead of silently zeroing.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobCalcFailure {
    pub job_id: Uuid,
    pub ticket_number: Option<String>,
    pub error: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PayrollReport {
    pub from_date: NaiveDate,
    pub to_date: NaiveDate,
    pub technicians: Vec<TechnicianPayroll>,
    pub grand_totals: PayTotals,
    pub failures: Vec<JobCalcFailure>,
    pub warnings: Vec<PayWarning>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobBillingLine {
    pub job_id: Uuid,
    pub ticket_number: Option<String>,
    pub description: String,
    pub client_name: Option<String>,
    pub platform: Option<String>,
    pub billing_type: String,
    pub billing_amount: Option<BigDecimal>,
    pub job_net: Option<BigDecimal>,
    pub actual_hours: BigDecimal,
    pub entry_count: i64,
    pub job_status: JobStatus,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobBillingReport {
    pub from_date: Option<NaiveDate>,
    pub to_date: Option<NaiveDate>,
    pub jobs: Vec<JobBillingLine>,
    pub total_billing: BigDecimal,
    pub total_hours: BigDecimal,
    pub job_count: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HoursBucket {
    pub key: String,
    pub entry_count: usize,
    pub hours: BigDecimal,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusSummary {
    pub status: TimeEntryStatus,
    pub entry_count: usize,
    pub hours: BigDecimal,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TechnicianSummary {
    pub by_status: Vec<StatusSummary>,
    pub week_start: NaiveDate,
    pub week_entry_count: usize,
    pub week_hours: BigDecimal,
}

fn entry_hours(entry: &TimeEntry) -> BigDecimal {
    entry.hours_worked.clone().unwrap_or_else(BigDecimal::zero)
}

fn date_display(dates: &[NaiveDate]) -> Option<String> {
    match dates {
        [] => None,
        [only] => Some(only.to_string()),
        [first, .., last] => Some(format!("{} - {}", first, last)),
    }
}

/// Fold per-job breakdowns into per-technician payroll rows. Pure so the
/// reconciliation invariants are testable without a database: every grand
/// total is the exact sum of the per-technician subtotals, which are in
/// turn exact sums of their rounded job rows.
pub fn build_payroll_report(
    from_date: NaiveDate,
    to_date: NaiveDate,
    priced_jobs: &[(Job, JobPayBreakdown)],
    failures: Vec<JobCalcFailure>,
    tech_filter: Option<Uuid>,
) -> PayrollReport {
    let mut technicians: BTreeMap<Uuid, TechnicianPayroll> = BTreeMap::new();
    let mut warnings = Vec::new();

    for (job, breakdown) in priced_jobs {
        warnings.extend(breakdown.warnings.iter().cloned());

        for row in &breakdown.technicians {
            if tech_filter.is_some_and(|tid| tid != row.tech_id) {
                continue;
            }

            let mut entry_dates: Vec<NaiveDate> =
                row.entries.iter().map(|e| e.date_worked).collect();
            entry_dates.sort();
            entry_dates.dedup();

            let line = JobPayLine {
                job_id: job.id,
                ticket_number: job.ticket_number.clone(),
                description: job.description.clone(),
                external_url: job.external_url.clone(),
                billing_amount: job.billing_amount.clone(),
                date_display: date_display(&entry_dates),
                entry_dates,
                hours: row.hours.clone(),
                effective_rate: row.effective_rate.clone(),
                using_minimum: row.using_minimum,
                base_pay: row.base_pay.clone(),
                mileage: row.mileage.clone(),
                mileage_pay: row.mileage_pay.clone(),
                per_diem: row.per_diem.clone(),
                personal_expenses: row.personal_expenses.clone(),
                profit_share: row.profit_share.clone(),
                total_pay: row.total_pay.clone(),
            };

            let tech = technicians
                .entry(row.tech_id)
                .or_insert_with(|| TechnicianPayroll {
                    tech_id: row.tech_id,
                    tech_name: row.tech_name.clone(),
                    min_rate: row.min_rate.clone(),
                    jobs: Vec::new(),
                    totals: PayTotals::default(),
                });

            tech.totals.total_hours += &line.hours;
            tech.totals.total_base_pay += &line.base_pay;
            tech.totals.total_mileage_pay += &line.mileage_pay;
            tech.totals.total_per_diem += &line.per_diem;
            tech.totals.total_personal_expenses += &line.personal_expenses;
            tech.totals.total_profit_share += &line.profit_share;
            tech.totals.total_pay += &line.total_pay;
            tech.jobs.push(line);
        }
    }

    let mut technicians: Vec<TechnicianPayroll> = technicians.into_values().collect();
    for tech in &mut technicians {
        tech.jobs
            .sort_by(|a, b| a.entry_dates.first().cmp(&b.entry_dates.first()));
    }
    technicians.sort_by(|a, b| a.tech_name.cmp(&b.tech_name).then(a.tech_id.cmp(&b.tech_id)));

    let mut grand_totals = PayTotals::default();
    for tech in &technicians {
        grand_totals.total_hours += &tech.totals.total_hours;
        grand_totals.total_base_pay += &tech.totals.total_base_pay;
        grand_totals.total_mileage_pay += &tech.totals.total_mileage_pay;
        grand_totals.total_per_diem += &tech.totals.total_per_diem;
        grand_totals.total_personal_expenses += &tech.totals.total_personal_expenses;
        grand_totals.total_profit_share += &tech.totals.total_profit_share;
        grand_totals.total_pay += &tech.totals.total_pay;
    }

    PayrollReport {
        from_date,
        to_date,
        technicians,
        grand_totals,
        failures,
        warnings,
    }
}

/// Group a technician's entries by day, ISO week start, or job.
pub fn group_hours(entries: &[TimeEntry], group_by: &str) -> Vec<HoursBucket> {
    let mut buckets: BTreeMap<String, (usize, BigDecimal)> = BTreeMap::new();

    for entry in entries {
        let key = match group_by {
            "week" => {
                let week_start = entry.date_worked
                    - Duration::days(entry.date_worked.weekday().num_days_from_monday() as i64);
                week_start.to_string()
            }
            "job" => entry.job_id.to_string(),
            _ => entry.date_worked.to_string(),
        };

        let bucket = buckets.entry(key).or_insert((0, BigDecimal::zero()));
        bucket.0 += 1;
        bucket.1 += entry_hours(entry);
    }

    buckets
        .into_iter()
        .map(|(key, (entry_count, hours))| HoursBucket {
            key,
            entry_count,
            hours,
        })
        .collect()
}

/// Per-status and current-week rollup of one technician's entries.
pub fn summarize_entries(entries: &[TimeEntry], today: NaiveDate) -> TechnicianSummary {
    let week_start = today - Duration::days(today.weekday().num_days_from_monday() as i64);

    let mut by_status: BTreeMap<String, (TimeEntryStatus, usize, BigDecimal)> = BTreeMap::new();
    let mut week_entry_count = 0;
    let mut week_hours = BigDecimal::zero();

    for entry in entries {
        let slot = by_status
            .entry(entry.status.to_string())
            .or_insert((entry.status, 0, BigDecimal::zero()));
        slot.1 += 1;
        slot.2 += entry_hours(entry);

        if entry.date_worked >= week_start {
            week_entry_count += 1;
            week_hours += entry_hours(entry);
        }
    }

    TechnicianSummary {
        by_status: by_status
            .into_values()
            .map(|(status, entry_count, hours)| StatusSummary {
                status,
                entry_count,
                hours,
            })
            .collect(),
        week_start,
        week_entry_count,
        week_hours,
    }
}

#[derive(Clone)]
pub struct ReportService {
    entry_repository: TimeEntryRepository,
    job_repository: JobRepository,
    technician_repository: TechnicianRepository,
    rate_repository: MileageRateRepository,
    platform_repository: PlatformRepository,
    pay_config: PayConfig,
}

impl ReportService {
    pub fn new(pool: PgPool) -> Self {
        Self {
            entry_repository: TimeEntryRepository::new(pool.clone()),
            job_repository: JobRepository::new(pool.clone()),
            technician_repository: TechnicianRepository::new(pool.clone()),
            rate_repository: MileageRateRepository::new(pool.clone()),
            platform_repository: PlatformRepository::new(pool),
            pay_config: PayConfig::default(),
        }
    }

    /// Per-technician payroll over a date range. Jobs are selected by their
    /// payable entries in the range; each selected job is priced once over
    /// all of its payable entries. One job failing to price never affects
    /// the others.
    pub async fn payroll_report(
        &self,
        from_date: NaiveDate,
        to_date: NaiveDate,
        tech_filter: Option<Uuid>,
    ) -> Result<PayrollReport, AppError> {
        let range_entries = self
            .entry_repository
            .payable_in_range(from_date, to_date, tech_filter)
            .await?;

        let job_ids: Vec<Uuid> = range_entries
            .iter()
            .map(|e| e.job_id)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let jobs = self.job_repository.find_by_ids(&job_ids).await?;
        let rates = self.rate_repository.get_all().await?;

        let mut priced = Vec::new();
        let mut failures = Vec::new();

        for job in jobs {
            // Cancelled jobs are excluded from pay calculation outright.
            if job.job_status == JobStatus::Cancelled {
                continue;
            }

            let entries = self.entry_repository.payable_for_job(job.id).await?;
            let tech_ids: Vec<Uuid> = entries
                .iter()
                .filter_map(|e| e.tech_id)
                .collect::<BTreeSet<_>>()
                .into_iter()
                .collect();
            let technicians = self.technician_repository.find_by_ids(&tech_ids).await?;

            match compute_job_pay(&job, &entries, &technicians, &rates, &self.pay_config) {
                Ok(breakdown) => priced.push((job, breakdown)),
                Err(err @ PayError::IncompleteJobData(_)) => failures.push(JobCalcFailure {
                    job_id: job.id,
                    ticket_number: job.ticket_number.clone(),
                    error: err.to_string(),
                }),
                Err(PayError::CancelledJob(_)) => {}
            }
        }

        Ok(build_payroll_report(
            from_date,
            to_date,
            &priced,
            failures,
            tech_filter,
        ))
    }

    /// Per-job billing/income view, independent of technician grouping.
    pub async fn job_billing_report(
        &self,
        from_date: Option<NaiveDate>,
        to_date: Option<NaiveDate>,
    ) -> Result<JobBillingReport, AppError> {
        let jobs = self
            .job_repository
            .get_jobs(None, None, from_date, to_date)
            .await?;

        let job_ids: Vec<Uuid> = jobs.iter().map(|j| j.id).collect();
        let entries = self.entry_repository.payable_for_jobs(&job_ids).await?;
        let platforms = self.platform_repository.get_all().await?;

        let mut hours_by_job: BTreeMap<Uuid, (i64, BigDecimal)> = BTreeMap::new();
        for entry in &entries {
            let slot = hours_by_job
                .entry(entry.job_id)
                .or_insert((0, BigDecimal::zero()));
            slot.0 += 1;
            slot.1 += entry_hours(entry);
        }

        let mut lines = Vec::new();
        let mut total_billing = BigDecimal::zero();
        let mut total_hours = BigDecimal::zero();

        for job in jobs {
            let (entry_count, actual_hours) = hours_by_job
                .get(&job.id)
                .cloned()
                .unwrap_or((0, BigDecimal::zero()));

            let job_net = job
                .billing_amount
                .as_ref()
                .map(|billing| billing - &job.expenses - &job.commissions);

            if let Some(billing) = &job.billing_amount {
                total_billing += billing;
            }
            total_hours += &actual_hours;

            lines.push(JobBillingLine {
                job_id: job.id,
                ticket_number: job.ticket_number,
                description: job.description,
                client_name: job.client_name,
                platform: platforms
                    .iter()
                    .find(|p| p.id == job.platform_id)
                    .map(|p| p.name.clone()),
                billing_type: job.billing_type.to_string(),
                billing_amount: job.billing_amount,
                job_net,
                actual_hours,
                entry_count,
                job_status: job.job_status,
            });
        }

        Ok(JobBillingReport {
            from_date,
            to_date,
            job_count: lines.len(),
            jobs: lines,
            total_billing,
            total_hours,
        })
    }

    pub async fn technician_hours(
        &self,
        tech_id: Uuid,
        from_date: NaiveDate,
        to_date: NaiveDate,
        group_by: &str,
    ) -> Result<Vec<HoursBucket>, AppError> {
        let entries = self
            .entry_repository
            .entries_for_tech_in_range(tech_id, from_date, to_date)
            .await?;

        Ok(group_hours(&entries, group_by))
    }

    pub async fn technician_summary(&self, tech_id: Uuid) -> Result<TechnicianSummary, AppError> {
        let entries = self
            .entry_repository
            .get_entries(&TimeEntryQuery {
                tech_id: Some(tech_id),
                ..Default::default()
            })
            .await?;

        Ok(summarize_entries(&entries, Utc::now().date_naive()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use pretty_assertions::assert_eq;
    use std::str::FromStr;

    use crate::database::models::{BillingType, Technician, TechnicianStatus};

    fn dec(s: &str) -> BigDecimal {
        BigDecimal::from_str(s).unwrap()
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::from_str(s).unwrap()
    }

    fn job(billing: &str) -> Job {
        let now = Utc::now();
        Job {
            id: Uuid::new_v4(),
            platform_id: Uuid::new_v4(),
            platform_job_code: None,
            ticket_number: Some("T-1".to_string()),
            description: "Install".to_string(),
            client_name: None,
            location: None,
            billing_type: BillingType::FlatRate,
            billing_amount: Some(dec(billing)),
            estimated_hours: None,
            expenses: BigDecimal::zero(),
            commissions: BigDecimal::zero(),
            job_status: JobStatus::Completed,
            job_date: Some(date("2026-01-10")),
            external_url: None,
            created_by: None,
            updated_by: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn technician(name: &str, rate: &str) -> Technician {
        let now = Utc::now();
        Technician {
            id: Uuid::new_v4(),
            name: name.to_string(),
            email: None,
            phone: None,
            hourly_rate: dec(rate),
            status: TechnicianStatus::Active,
            hire_date: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn entry(job_id: Uuid, tech_id: Uuid, hours: &str, worked: &str) -> TimeEntry {
        let now = Utc::now();
        TimeEntry {
            id: Uuid::new_v4(),
            job_id,
            tech_id: Some(tech_id),
            period_id: None,
            date_worked: date(worked),
            time_in: None,
            time_out: None,
            hours_worked: Some(dec(hours)),
            mileage: BigDecimal::zero(),
            per_diem: BigDecimal::zero(),
            personal_expenses: BigDecimal::zero(),
            status: TimeEntryStatus::Verified,
            rejection_reason: None,
            notes: None,
            verified_by: None,
            verified_at: None,
            created_by: None,
            updated_by: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn priced(job: Job, entries: &[TimeEntry], techs: &[Technician]) -> (Job, JobPayBreakdown) {
        let breakdown =
            compute_job_pay(&job, entries, techs, &[], &PayConfig::default()).unwrap();
        (job, breakdown)
    }

    #[test]
    fn grand_totals_equal_sum_of_subtotals() {
        let tech_a = technician("Alice", "20");
        let tech_b = technician("Bob", "35");

        let job1 = job("1000");
        let job1_entries = vec![
            entry(job1.id, tech_a.id, "6", "2026-01-05"),
            entry(job1.id, tech_b.id, "4", "2026-01-06"),
        ];
        let job2 = job("333.33");
        let job2_entries = vec![entry(job2.id, tech_a.id, "3.5", "2026-01-08")];

        let techs = vec![tech_a.clone(), tech_b.clone()];
        let report = build_payroll_report(
            date("2026-01-01"),
            date("2026-01-31"),
            &[
                priced(job1, &job1_entries, &techs),
                priced(job2, &job2_entries, &techs),
            ],
            Vec::new(),
            None,
        );

        let mut summed = PayTotals::default();
        for tech in &report.technicians {
            summed.total_hours += &tech.totals.total_hours;
            summed.total_base_pay += &tech.totals.total_base_pay;
            summed.total_mileage_pay += &tech.totals.total_mileage_pay;
            summed.total_per_diem += &tech.totals.total_per_diem;
            summed.total_personal_expenses += &tech.totals.total_personal_expenses;
            summed.total_profit_share += &tech.totals.total_profit_share;
            summed.total_pay += &tech.totals.total_pay;
        }

        assert_eq!(report.grand_totals.total_pay, summed.total_pay);
        assert_eq!(report.grand_totals.total_hours, summed.total_hours);
        assert_eq!(report.grand_totals.total_base_pay, summed.total_base_pay);
        assert_eq!(
            report.grand_totals.total_profit_share,
            summed.total_profit_share
        );
    }

    #[test]
    fn tech_filter_drops_other_rows() {
        let tech_a = technician("Alice", "20");
        let tech_b = technician("Bob", "35");
        let job1 = job("1000");
        let entries = vec![
            entry(job1.id, tech_a.id, "6", "2026-01-05"),
            entry(job1.id, tech_b.id, "4", "2026-01-06"),
        ];
        let techs = vec![tech_a.clone(), tech_b];

        let report = build_payroll_report(
            date("2026-01-01"),
            date("2026-01-31"),
            &[priced(job1, &entries, &techs)],
            Vec::new(),
            Some(tech_a.id),
        );

        assert_eq!(report.technicians.len(), 1);
        assert_eq!(report.technicians[0].tech_id, tech_a.id);
    }

    #[test]
    fn job_lines_are_ordered_by_first_entry_date() {
        let tech = technician("Alice", "0");
        let later = job("100");
        let later_entries = vec![entry(later.id, tech.id, "2", "2026-01-20")];
        let earlier = job("100");
        let earlier_entries = vec![entry(earlier.id, tech.id, "2", "2026-01-03")];
        let techs = vec![tech.clone()];

        let report = build_payroll_report(
            date("2026-01-01"),
            date("2026-01-31"),
            &[
                priced(later.clone(), &later_entries, &techs),
                priced(earlier.clone(), &earlier_entries, &techs),
            ],
            Vec::new(),
            None,
        );

        let jobs = &report.technicians[0].jobs;
        assert_eq!(jobs[0].job_id, earlier.id);
        assert_eq!(jobs[1].job_id, later.id);
    }

    #[test]
    fn failures_are_reported_alongside_results() {
        let tech = technician("Alice", "20");
        let ok_job = job("500");
        let entries = vec![entry(ok_job.id, tech.id, "5", "2026-01-05")];
        let techs = vec![tech];

        let failing_id = Uuid::new_v4();
        let report = build_payroll_report(
            date("2026-01-01"),
            date("2026-01-31"),
            &[priced(ok_job, &entries, &techs)],
            vec![JobCalcFailure {
                job_id: failing_id,
                ticket_number: Some("T-9".to_string()),
                error: "no billing amount".to_string(),
            }],
            None,
        );

        assert_eq!(report.technicians.len(), 1);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].job_id, failing_id);
    }

    #[test]
    fn hours_group_by_week_uses_monday_start() {
        let tech = technician("Alice", "0");
        let job1 = job("100");
        let entries = vec![
            // Wed Jan 7 2026 and Thu Jan 8 share the Monday Jan 5 bucket
            entry(job1.id, tech.id, "3", "2026-01-07"),
            entry(job1.id, tech.id, "4", "2026-01-08"),
            // Mon Jan 12 starts its own bucket
            entry(job1.id, tech.id, "5", "2026-01-12"),
        ];

        let buckets = group_hours(&entries, "week");
        assert_eq!(buckets.len(), 2);
        assert_eq!(buckets[0].key, "2026-01-05");
        assert_eq!(buckets[0].hours, dec("7"));
        assert_eq!(buckets[1].key, "2026-01-12");
        assert_eq!(buckets[1].hours, dec("5"));
    }

    #[test]
    fn summary_counts_by_status_and_week() {
        let tech = technician("Alice", "0");
        let job1 = job("100");
        let mut submitted = entry(job1.id, tech.id, "4", "2026-01-12");
        submitted.status = TimeEntryStatus::Submitted;
        let verified = entry(job1.id, tech.id, "6", "2026-01-13");
        let mut old_draft = entry(job1.id, tech.id, "2", "2025-12-01");
        old_draft.status = TimeEntryStatus::Draft;

        let entries = vec![submitted, verified, old_draft];
        // "today" is Thursday Jan 15; the week began Monday Jan 12
        let summary = summarize_entries(&entries, date("2026-01-15"));

        assert_eq!(summary.week_start, date("2026-01-12"));
        assert_eq!(summary.week_entry_count, 2);
        assert_eq!(summary.week_hours, dec("10"));
        assert_eq!(summary.by_status.len(), 3);
    }
}
