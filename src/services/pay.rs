use std::collections::BTreeMap;

use bigdecimal::{BigDecimal, RoundingMode, Zero};
use chrono::NaiveDate;
use serde::Serialize;
use sqlx::PgPool;
use thiserror::Error;
use uuid::Uuid;

use crate::database::models::{Job, JobStatus, MileageRate, Technician, TimeEntry};
use crate::database::repositories::{
    JobRepository, MileageRateRepository, TechnicianRepository, TimeEntryRepository,
};
use crate::error::AppError;

/// Pay calculation parameters. The technician pool share is a business rule
/// (half of job net goes to the combined technician pool) carried here as a
/// named parameter rather than a literal inside the allocation code.
#[derive(Debug, Clone)]
pub struct PayConfig {
    pub tech_pool_share: BigDecimal,
}

impl Default for PayConfig {
    fn default() -> Self {
        PayConfig {
            // 0.5 == the 50/50 company/technician split
            tech_pool_share: BigDecimal::from(1) / BigDecimal::from(2),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PayError {
    #[error("job {0} has no billing amount; cannot calculate pay")]
    IncompleteJobData(Uuid),

    #[error("job {0} is cancelled and excluded from pay calculation")]
    CancelledJob(Uuid),
}

/// Non-fatal conditions surfaced alongside a breakdown. A warning never
/// aborts the job calculation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum PayWarning {
    /// Entry has no technician assigned and is excluded entirely.
    #[serde(rename_all = "camelCase")]
    UnassignedEntry { entry_id: Uuid },
    /// No mileage rate effective for the entry's work date; mileage pay
    /// defaults to zero for that entry.
    #[serde(rename_all = "camelCase")]
    RateNotFound {
        entry_id: Uuid,
        date_worked: NaiveDate,
    },
}

/// One pay line per time entry, kept for drill-down.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryPayLine {
    pub entry_id: Uuid,
    pub date_worked: NaiveDate,
    pub hours: BigDecimal,
    pub mileage: BigDecimal,
    pub mileage_rate: Option<BigDecimal>,
    pub mileage_pay: BigDecimal,
}

/// Derived pay result for one (job, technician) pair. Never persisted;
/// reproducible from the job, its payable entries, the technician minimum
/// rates and the mileage rate table.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TechnicianPay {
    pub tech_id: Uuid,
    pub tech_name: String,
    pub hours: BigDecimal,
    pub min_rate: BigDecimal,
    pub effective_rate: BigDecimal,
    pub base_pay: BigDecimal,
    pub mileage: BigDecimal,
    pub mileage_pay: BigDecimal,
    pub per_diem: BigDecimal,
    pub personal_expenses: BigDecimal,
    pub profit_share: BigDecimal,
    pub total_pay: BigDecimal,
    pub using_minimum: bool,
    pub entries: Vec<EntryPayLine>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PayTotals {
    pub total_hours: BigDecimal,
    pub total_base_pay: BigDecimal,
    pub total_mileage_pay: BigDecimal,
    pub total_per_diem: BigDecimal,
    pub total_personal_expenses: BigDecimal,
    pub total_profit_share: BigDecimal,
    pub total_pay: BigDecimal,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobPayBreakdown {
    pub job_id: Uuid,
    pub job_net: BigDecimal,
    pub tech_pool: BigDecimal,
    pub technicians: Vec<TechnicianPay>,
    pub totals: PayTotals,
    pub warnings: Vec<PayWarning>,
}

fn round2(value: &BigDecimal) -> BigDecimal {
    value.with_scale_round(2, RoundingMode::HalfUp)
}

/// Mileage rate effective as of a work date: the newest row whose
/// effective_date is on or before the date. Rates are a point-in-time
/// snapshot; changing the table later never rewrites history.
pub fn rate_for_date<'a>(rates: &'a [MileageRate], date: NaiveDate) -> Option<&'a MileageRate> {
    rates
        .iter()
        .filter(|r| r.effective_date <= date)
        .max_by_key(|r| r.effective_date)
}

struct TechAccumulator {
    name: String,
    min_rate: BigDecimal,
    hours: BigDecimal,
    mileage: BigDecimal,
    mileage_pay: BigDecimal,
    per_diem: BigDecimal,
    personal_expenses: BigDecimal,
    entries: Vec<EntryPayLine>,
}

/// Compute the pay breakdown for one job from a snapshot of its payable
/// entries. Pure: no I/O, no clock, deterministic output ordering, so two
/// calls on the same inputs produce identical results.
pub fn compute_job_pay(
    job: &Job,
    entries: &[TimeEntry],
    technicians: &[Technician],
    rates: &[MileageRate],
    config: &PayConfig,
) -> Result<JobPayBreakdown, PayError> {
    if job.job_status == JobStatus::Cancelled {
        return Err(PayError::CancelledJob(job.id));
    }

    let billing_amount = job
        .billing_amount
        .as_ref()
        .ok_or(PayError::IncompleteJobData(job.id))?;

    let job_net = billing_amount - &job.expenses - &job.commissions;
    let tech_pool = &job_net * &config.tech_pool_share;

    let mut warnings = Vec::new();

    // Group entries by technician; unassigned entries cannot be paid and are
    // excluded with a warning instead of failing the whole job.
    // BTreeMap keeps technician ordering stable across calls.
    let mut grouped: BTreeMap<Uuid, TechAccumulator> = BTreeMap::new();

    for entry in entries {
        let Some(tech_id) = entry.tech_id else {
            warnings.push(PayWarning::UnassignedEntry { entry_id: entry.id });
            continue;
        };

        let acc = grouped.entry(tech_id).or_insert_with(|| {
            let tech = technicians.iter().find(|t| t.id == tech_id);
            TechAccumulator {
                name: tech
                    .map(|t| t.name.clone())
                    .unwrap_or_else(|| format!("Tech {}", tech_id)),
                min_rate: tech
                    .map(|t| t.hourly_rate.clone())
                    .unwrap_or_else(BigDecimal::zero),
                hours: BigDecimal::zero(),
                mileage: BigDecimal::zero(),
                mileage_pay: BigDecimal::zero(),
                per_diem: BigDecimal::zero(),
                personal_expenses: BigDecimal::zero(),
                entries: Vec::new(),
            }
        });

        let entry_hours = entry.hours_worked.clone().unwrap_or_else(BigDecimal::zero);

        let (mileage_rate, mileage_pay) = if entry.mileage.is_zero() {
            (None, BigDecimal::zero())
        } else {
            match rate_for_date(rates, entry.date_worked) {
                Some(rate) => {
                    let pay = &entry.mileage * &rate.rate_per_mile;
                    (Some(rate.rate_per_mile.clone()), pay)
                }
                None => {
                    warnings.push(PayWarning::RateNotFound {
                        entry_id: entry.id,
                        date_worked: entry.date_worked,
                    });
                    (None, BigDecimal::zero())
                }
            }
        };

        acc.hours += &entry_hours;
        acc.mileage += &entry.mileage;
        acc.mileage_pay += &mileage_pay;
        acc.per_diem += &entry.per_diem;
        acc.personal_expenses += &entry.personal_expenses;
        acc.entries.push(EntryPayLine {
            entry_id: entry.id,
            date_worked: entry.date_worked,
            hours: round2(&entry_hours),
            mileage: round2(&entry.mileage),
            mileage_rate,
            mileage_pay: round2(&mileage_pay),
        });
    }

    let total_hours: BigDecimal = grouped.values().map(|a| a.hours.clone()).sum();

    // Zero qualifying hours: nothing to allocate, short-circuit instead of
    // dividing by zero.
    if total_hours.is_zero() {
        return Ok(JobPayBreakdown {
            job_id: job.id,
            job_net: round2(&job_net),
            tech_pool: round2(&tech_pool),
            technicians: Vec::new(),
            totals: PayTotals::default(),
            warnings,
        });
    }

    // Proportional allocation with the minimum-rate floor. The floor is a
    // guarantee, not a reallocation: when one technician is topped up to
    // their minimum the others keep their hours-proportional share and the
    // shortfall lands on the company side of the split.
    struct Allocated {
        tech_id: Uuid,
        base_pay: BigDecimal,
        effective_rate: BigDecimal,
        using_minimum: bool,
    }

    let mut allocations = Vec::new();
    let mut total_base_pay = BigDecimal::zero();

    for (tech_id, acc) in &grouped {
        let weighted_base = &tech_pool * &acc.hours / &total_hours;

        let (base_pay, effective_rate, using_minimum) = if acc.hours.is_zero() {
            (BigDecimal::zero(), acc.min_rate.clone(), false)
        } else {
            let calculated_rate = &weighted_base / &acc.hours;
            if calculated_rate < acc.min_rate {
                let floored = &acc.min_rate * &acc.hours;
                (floored, acc.min_rate.clone(), true)
            } else {
                (weighted_base, calculated_rate, false)
            }
        };

        total_base_pay += &base_pay;
        allocations.push(Allocated {
            tech_id: *tech_id,
            base_pay,
            effective_rate,
            using_minimum,
        });
    }

    // Profit share is informational: the company margin after technician
    // base pay, attributed proportionally to hours. Not part of total_pay.
    let profit_pool = &job_net - &total_base_pay;
    let mut profit_shares: BTreeMap<Uuid, BigDecimal> = BTreeMap::new();
    for (tech_id, acc) in &grouped {
        let share = &profit_pool * &acc.hours / &total_hours;
        profit_shares.insert(*tech_id, round2(&share));
    }

    // Rounded profit rows must sum exactly to the rounded pool; any
    // remainder cent lands on the technician with the most hours.
    let rounded_pool = round2(&profit_pool);
    let rows_sum: BigDecimal = profit_shares.values().cloned().sum();
    let remainder = &rounded_pool - &rows_sum;
    if !remainder.is_zero() {
        if let Some(largest) = grouped
            .iter()
            .max_by(|a, b| a.1.hours.cmp(&b.1.hours))
            .map(|(id, _)| *id)
        {
            if let Some(share) = profit_shares.get_mut(&largest) {
                *share += remainder;
            }
        }
    }

    // Assemble rows, rounding at this presentation boundary only. Totals are
    // sums of the rounded rows so the report reconciles to the cent.
    let mut technicians_out = Vec::new();
    let mut totals = PayTotals::default();

    for alloc in allocations {
        let acc = &grouped[&alloc.tech_id];
        let base_pay = round2(&alloc.base_pay);
        let mileage_pay = round2(&acc.mileage_pay);
        let per_diem = round2(&acc.per_diem);
        let personal_expenses = round2(&acc.personal_expenses);
        let total_pay = &base_pay + &mileage_pay + &per_diem + &personal_expenses;
        let profit_share = profit_shares
            .get(&alloc.tech_id)
            .cloned()
            .unwrap_or_else(BigDecimal::zero);
        let hours = round2(&acc.hours);

        totals.total_hours += &hours;
        totals.total_base_pay += &base_pay;
        totals.total_mileage_pay += &mileage_pay;
        totals.total_per_diem += &per_diem;
        totals.total_personal_expenses += &personal_expenses;
        totals.total_profit_share += &profit_share;
        totals.total_pay += &total_pay;

        technicians_out.push(TechnicianPay {
            tech_id: alloc.tech_id,
            tech_name: acc.name.clone(),
            hours,
            min_rate: round2(&acc.min_rate),
            effective_rate: round2(&alloc.effective_rate),
            base_pay,
            mileage: round2(&acc.mileage),
            mileage_pay,
            per_diem,
            personal_expenses,
            profit_share,
            total_pay,
            using_minimum: alloc.using_minimum,
            entries: acc.entries.clone(),
        });
    }

    // Stable presentation order: by name, then id for ties.
    technicians_out.sort_by(|a, b| a.tech_name.cmp(&b.tech_name).then(a.tech_id.cmp(&b.tech_id)));

    Ok(JobPayBreakdown {
        job_id: job.id,
        job_net: round2(&job_net),
        tech_pool: round2(&tech_pool),
        technicians: technicians_out,
        totals,
        warnings,
    })
}

/// Thin async shell over the pure engine: loads the snapshot for one job and
/// computes. Results are never cached; every call re-reads the entries and
/// the rate table.
#[derive(Clone)]
pub struct PayService {
    job_repository: JobRepository,
    entry_repository: TimeEntryRepository,
    technician_repository: TechnicianRepository,
    rate_repository: MileageRateRepository,
    config: PayConfig,
}

impl PayService {
    pub fn new(pool: PgPool) -> Self {
        Self {
            job_repository: JobRepository::new(pool.clone()),
            entry_repository: TimeEntryRepository::new(pool.clone()),
            technician_repository: TechnicianRepository::new(pool.clone()),
            rate_repository: MileageRateRepository::new(pool),
            config: PayConfig::default(),
        }
    }

    pub fn config(&self) -> &PayConfig {
        &self.config
    }

    pub async fn calculate_job_pay(&self, job_id: Uuid) -> Result<JobPayBreakdown, AppError> {
        let job = self
            .job_repository
            .find_by_id(job_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Job {}", job_id)))?;

        self.calculate_for_job(&job).await
    }

    pub async fn calculate_for_job(&self, job: &Job) -> Result<JobPayBreakdown, AppError> {
        let entries = self.entry_repository.payable_for_job(job.id).await?;

        let tech_ids: Vec<Uuid> = entries
            .iter()
            .filter_map(|e| e.tech_id)
            .collect::<std::collections::BTreeSet<_>>()
            .into_iter()
            .collect();

        let technicians = self.technician_repository.find_by_ids(&tech_ids).await?;
        let rates = self.rate_repository.get_all().await?;

        let breakdown = compute_job_pay(job, &entries, &technicians, &rates, &self.config)?;
        Ok(breakdown)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use pretty_assertions::assert_eq;
    use std::str::FromStr;

    use crate::database::models::{BillingType, TimeEntryStatus};

    fn dec(s: &str) -> BigDecimal {
        BigDecimal::from_str(s).unwrap()
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::from_str(s).unwrap()
    }

    fn job(billing: Option<&str>, expenses: &str, commissions: &str) -> Job {
        let now = Utc::now();
        Job {
            id: Uuid::new_v4(),
            platform_id: Uuid::new_v4(),
            platform_job_code: None,
            ticket_number: Some("T-100".to_string()),
            description: "Rack install".to_string(),
            client_name: None,
            location: None,
            billing_type: BillingType::FlatRate,
            billing_amount: billing.map(dec),
            estimated_hours: None,
            expenses: dec(expenses),
            commissions: dec(commissions),
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
            status: crate::database::models::TechnicianStatus::Active,
            hire_date: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn entry(job_id: Uuid, tech_id: Option<Uuid>, hours: &str, worked: &str) -> TimeEntry {
        let now = Utc::now();
        TimeEntry {
            id: Uuid::new_v4(),
            job_id,
            tech_id,
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

    fn mileage_rate(rate: &str, effective: &str) -> MileageRate {
        MileageRate {
            id: Uuid::new_v4(),
            rate_per_mile: dec(rate),
            effective_date: date(effective),
            end_date: None,
            description: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn single_tech_above_floor() {
        // billing 1000, expenses 100 -> net 900, pool 450; 10h at min 20/hr
        // -> calculated rate 45/hr beats the floor
        let job = job(Some("1000"), "100", "0");
        let tech = technician("Alice", "20");
        let entries = vec![entry(job.id, Some(tech.id), "10", "2026-01-10")];

        let result =
            compute_job_pay(&job, &entries, &[tech.clone()], &[], &PayConfig::default()).unwrap();

        assert_eq!(result.job_net, dec("900.00"));
        assert_eq!(result.tech_pool, dec("450.00"));
        assert_eq!(result.technicians.len(), 1);

        let row = &result.technicians[0];
        assert_eq!(row.base_pay, dec("450.00"));
        assert_eq!(row.effective_rate, dec("45.00"));
        assert!(!row.using_minimum);
        assert_eq!(row.total_pay, dec("450.00"));
    }

    #[test]
    fn floor_tops_up_one_tech_without_touching_the_other() {
        // Scenario: 8h + 2h split of a 450 pool; tech B's 60/hr floor beats
        // the proportional 90, tech A keeps the unfloored 360.
        let job = job(Some("1000"), "100", "0");
        let tech_a = technician("Alice", "20");
        let tech_b = technician("Bob", "60");
        let entries = vec![
            entry(job.id, Some(tech_a.id), "8", "2026-01-10"),
            entry(job.id, Some(tech_b.id), "2", "2026-01-10"),
        ];

        let result = compute_job_pay(
            &job,
            &entries,
            &[tech_a.clone(), tech_b.clone()],
            &[],
            &PayConfig::default(),
        )
        .unwrap();

        let a = result
            .technicians
            .iter()
            .find(|t| t.tech_id == tech_a.id)
            .unwrap();
        let b = result
            .technicians
            .iter()
            .find(|t| t.tech_id == tech_b.id)
            .unwrap();

        assert_eq!(a.base_pay, dec("360.00"));
        assert!(!a.using_minimum);
        assert_eq!(a.effective_rate, dec("45.00"));

        assert_eq!(b.base_pay, dec("120.00"));
        assert!(b.using_minimum);
        assert_eq!(b.effective_rate, dec("60.00"));

        // Floors overshoot the pool; the total exceeds 450 and that is fine.
        assert_eq!(result.totals.total_base_pay, dec("480.00"));
    }

    #[test]
    fn prefloor_allocation_conserves_pool() {
        let job = job(Some("1234.56"), "78.90", "12.34");
        let t1 = technician("A", "0");
        let t2 = technician("B", "0");
        let t3 = technician("C", "0");
        let entries = vec![
            entry(job.id, Some(t1.id), "3.25", "2026-01-05"),
            entry(job.id, Some(t2.id), "5.5", "2026-01-06"),
            entry(job.id, Some(t3.id), "1.75", "2026-01-07"),
        ];

        let result = compute_job_pay(
            &job,
            &entries,
            &[t1, t2, t3],
            &[],
            &PayConfig::default(),
        )
        .unwrap();

        // With zero floors nothing is topped up, so the rounded rows must sum
        // to the pool within a cent per row.
        let sum: BigDecimal = result
            .technicians
            .iter()
            .map(|t| t.base_pay.clone())
            .sum();
        let diff = (&sum - &result.tech_pool).abs();
        assert!(diff <= dec("0.03"), "pool drifted by {}", diff);
    }

    #[test]
    fn missing_billing_amount_is_an_error() {
        let job = job(None, "0", "0");
        let tech = technician("Alice", "20");
        let entries = vec![entry(job.id, Some(tech.id), "4", "2026-01-10")];

        let err = compute_job_pay(&job, &entries, &[tech], &[], &PayConfig::default())
            .unwrap_err();
        assert_eq!(err, PayError::IncompleteJobData(job.id));
    }

    #[test]
    fn cancelled_job_is_refused() {
        let mut job = job(Some("500"), "0", "0");
        job.job_status = JobStatus::Cancelled;

        let err = compute_job_pay(&job, &[], &[], &[], &PayConfig::default()).unwrap_err();
        assert_eq!(err, PayError::CancelledJob(job.id));
    }

    #[test]
    fn zero_hours_short_circuits_empty() {
        let job = job(Some("500"), "0", "0");
        let tech = technician("Alice", "20");
        let entries = vec![entry(job.id, Some(tech.id), "0", "2026-01-10")];

        let result =
            compute_job_pay(&job, &entries, &[tech], &[], &PayConfig::default()).unwrap();
        assert!(result.technicians.is_empty());
        assert_eq!(result.totals.total_pay, BigDecimal::zero());
    }

    #[test]
    fn unassigned_entry_warns_and_is_excluded() {
        let job = job(Some("1000"), "100", "0");
        let tech = technician("Alice", "20");
        let entries = vec![
            entry(job.id, Some(tech.id), "10", "2026-01-10"),
            entry(job.id, None, "3", "2026-01-11"),
        ];

        let result =
            compute_job_pay(&job, &entries, &[tech], &[], &PayConfig::default()).unwrap();

        assert_eq!(result.technicians.len(), 1);
        // The unassigned 3h never dilute the assigned technician's share.
        assert_eq!(result.technicians[0].base_pay, dec("450.00"));
        assert!(matches!(
            result.warnings[0],
            PayWarning::UnassignedEntry { .. }
        ));
    }

    #[test]
    fn mileage_uses_rate_effective_on_work_date() {
        let job = job(Some("1000"), "0", "0");
        let tech = technician("Alice", "10");
        let mut e = entry(job.id, Some(tech.id), "5", "2026-02-01");
        e.mileage = dec("100");

        let rates = vec![
            mileage_rate("0.60", "2025-01-01"),
            mileage_rate("0.67", "2026-01-01"),
        ];

        let result =
            compute_job_pay(&job, &[e], &[tech], &rates, &PayConfig::default()).unwrap();

        let row = &result.technicians[0];
        assert_eq!(row.mileage_pay, dec("67.00"));
        assert_eq!(row.entries[0].mileage_rate, Some(dec("0.67")));
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn entry_before_any_rate_warns_and_pays_zero_mileage() {
        let job = job(Some("1000"), "0", "0");
        let tech = technician("Alice", "10");
        let mut e = entry(job.id, Some(tech.id), "5", "2024-06-01");
        e.mileage = dec("40");

        let rates = vec![mileage_rate("0.67", "2026-01-01")];

        let result =
            compute_job_pay(&job, &[e], &[tech], &rates, &PayConfig::default()).unwrap();

        let row = &result.technicians[0];
        assert_eq!(row.mileage_pay, dec("0.00"));
        assert!(matches!(
            result.warnings[0],
            PayWarning::RateNotFound { .. }
        ));
        // Base pay is unaffected by the missing rate.
        assert_eq!(row.base_pay, dec("500.00"));
    }

    #[test]
    fn per_diem_and_expenses_pass_through() {
        let job = job(Some("1000"), "0", "0");
        let tech = technician("Alice", "10");
        let mut e = entry(job.id, Some(tech.id), "5", "2026-01-10");
        e.per_diem = dec("35");
        e.personal_expenses = dec("12.50");

        let result =
            compute_job_pay(&job, &[e], &[tech], &[], &PayConfig::default()).unwrap();

        let row = &result.technicians[0];
        assert_eq!(row.per_diem, dec("35.00"));
        assert_eq!(row.personal_expenses, dec("12.50"));
        assert_eq!(row.total_pay, dec("547.50")); // 500 base + 35 + 12.50
    }

    #[test]
    fn profit_share_rows_reconcile_to_pool() {
        // Three techs with hours chosen so thirds round awkwardly.
        let job = job(Some("1000"), "0", "0");
        let t1 = technician("A", "0");
        let t2 = technician("B", "0");
        let t3 = technician("C", "0");
        let entries = vec![
            entry(job.id, Some(t1.id), "1", "2026-01-05"),
            entry(job.id, Some(t2.id), "1", "2026-01-06"),
            entry(job.id, Some(t3.id), "1", "2026-01-07"),
        ];

        let result = compute_job_pay(
            &job,
            &entries,
            &[t1, t2, t3],
            &[],
            &PayConfig::default(),
        )
        .unwrap();

        // profit pool = 1000 - 500 = 500; thirds are 166.666..
        let rows_sum: BigDecimal = result
            .technicians
            .iter()
            .map(|t| t.profit_share.clone())
            .sum();
        assert_eq!(rows_sum, dec("500.00"));
    }

    #[test]
    fn calculation_is_idempotent() {
        let job = job(Some("873.21"), "41.10", "9.99");
        let t1 = technician("A", "22");
        let t2 = technician("B", "31");
        let mut e1 = entry(job.id, Some(t1.id), "7.25", "2026-03-02");
        e1.mileage = dec("18.4");
        let e2 = entry(job.id, Some(t2.id), "2.75", "2026-03-03");
        let rates = vec![mileage_rate("0.67", "2026-01-01")];

        let entries = vec![e1, e2];
        let techs = vec![t1, t2];
        let config = PayConfig::default();

        let first = compute_job_pay(&job, &entries, &techs, &rates, &config).unwrap();
        let second = compute_job_pay(&job, &entries, &techs, &rates, &config).unwrap();

        assert_eq!(
            serde_json::to_value(&first).unwrap(),
            serde_json::to_value(&second).unwrap()
        );
    }

    #[test]
    fn floor_never_decreases_anyones_pay() {
        let job = job(Some("400"), "0", "0");
        let low = technician("Low", "0");
        let high = technician("High", "90");
        let entries = vec![
            entry(job.id, Some(low.id), "6", "2026-01-05"),
            entry(job.id, Some(high.id), "4", "2026-01-05"),
        ];

        // pool 200: low gets 120, high's share 80 < 90*4=360 floor
        let floored = compute_job_pay(
            &job,
            &entries,
            &[low.clone(), high.clone()],
            &[],
            &PayConfig::default(),
        )
        .unwrap();

        let zero_floor_high = Technician {
            hourly_rate: dec("0"),
            ..high.clone()
        };
        let unfloored = compute_job_pay(
            &job,
            &entries,
            &[low.clone(), zero_floor_high],
            &[],
            &PayConfig::default(),
        )
        .unwrap();

        for t in &floored.technicians {
            let counterpart = unfloored
                .technicians
                .iter()
                .find(|u| u.tech_id == t.tech_id)
                .unwrap();
            assert!(t.base_pay >= counterpart.base_pay);
        }

        let low_row = floored
            .technicians
            .iter()
            .find(|t| t.tech_id == low.id)
            .unwrap();
        assert_eq!(low_row.base_pay, dec("120.00"));
    }
}
