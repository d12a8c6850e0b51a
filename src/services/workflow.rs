use bigdecimal::{BigDecimal, RoundingMode, Zero};
use chrono::{NaiveTime, Utc};
use sqlx::PgPool;
use thiserror::Error;
use uuid::Uuid;

use crate::database::models::{
    BulkEntryError, BulkOutcome, CreateTimeEntryInput, TimeEntry, TimeEntryStatus,
    UpdateTimeEntryInput,
};
use crate::database::repositories::{
    JobRepository, PayPeriodRepository, TechnicianRepository, TimeEntryRepository,
};
use crate::error::AppError;
use crate::services::auth::Claims;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum WorkflowError {
    #[error("invalid transition: entry is {actual}, expected {expected}")]
    InvalidTransition {
        expected: TimeEntryStatus,
        actual: TimeEntryStatus,
    },

    #[error("technician must be assigned before submission")]
    MissingAssignment,

    #[error("hours worked required before submission")]
    MissingHours,

    #[error("rejection reason is required")]
    MissingReason,

    #[error("permission denied: {0}")]
    PermissionDenied(String),

    #[error("time entry {0} not found")]
    NotFound(Uuid),
}

/// Hours between a clock-in/clock-out pair. The duration is truncated to
/// whole minutes before conversion to decimal hours (seconds are dropped,
/// never rounded up), then expressed at 2 decimal places half-up. Pairs
/// where time_out <= time_in wrap overnight by 24h.
pub fn hours_between(time_in: NaiveTime, time_out: NaiveTime) -> BigDecimal {
    let mut seconds = (time_out - time_in).num_seconds();
    if seconds < 0 {
        seconds += 24 * 3600;
    }
    let minutes = seconds / 60;

    (BigDecimal::from(minutes) / BigDecimal::from(60)).with_scale_round(2, RoundingMode::HalfUp)
}

/// Resolve the hours for an entry: explicit hours always win over the
/// computed clock pair.
pub fn derive_hours(
    hours_worked: Option<BigDecimal>,
    time_in: Option<NaiveTime>,
    time_out: Option<NaiveTime>,
) -> Option<BigDecimal> {
    match (hours_worked, time_in, time_out) {
        (Some(hours), _, _) => Some(hours),
        (None, Some(t_in), Some(t_out)) => Some(hours_between(t_in, t_out)),
        _ => None,
    }
}

/// Draft -> submitted guard.
pub fn check_submit(entry: &TimeEntry) -> Result<(), WorkflowError> {
    if entry.status != TimeEntryStatus::Draft {
        return Err(WorkflowError::InvalidTransition {
            expected: TimeEntryStatus::Draft,
            actual: entry.status,
        });
    }
    if entry.tech_id.is_none() {
        return Err(WorkflowError::MissingAssignment);
    }
    match &entry.hours_worked {
        Some(hours) if hours > &BigDecimal::zero() => Ok(()),
        _ => Err(WorkflowError::MissingHours),
    }
}

/// Submitted -> verified guard. Verification is a manager/admin action.
pub fn check_verify(entry: &TimeEntry, claims: &Claims) -> Result<(), WorkflowError> {
    if !claims.is_manager_or_admin() {
        return Err(WorkflowError::PermissionDenied(
            "only managers can verify time entries".to_string(),
        ));
    }
    if entry.status != TimeEntryStatus::Submitted {
        return Err(WorkflowError::InvalidTransition {
            expected: TimeEntryStatus::Submitted,
            actual: entry.status,
        });
    }
    Ok(())
}

/// Submitted -> draft (rejected) guard; a reason is mandatory so the
/// technician can see why the entry came back.
pub fn check_reject(entry: &TimeEntry, claims: &Claims, reason: &str) -> Result<(), WorkflowError> {
    if !claims.is_manager_or_admin() {
        return Err(WorkflowError::PermissionDenied(
            "only managers can reject time entries".to_string(),
        ));
    }
    if reason.trim().is_empty() {
        return Err(WorkflowError::MissingReason);
    }
    if entry.status != TimeEntryStatus::Submitted {
        return Err(WorkflowError::InvalidTransition {
            expected: TimeEntryStatus::Submitted,
            actual: entry.status,
        });
    }
    Ok(())
}

/// Owns time entry creation, edits and every lifecycle transition. Each
/// transition re-checks the current status in SQL (compare-and-swap), so
/// two racing calls cannot both win; the loser sees InvalidTransition.
#[derive(Clone)]
pub struct WorkflowService {
    entry_repository: TimeEntryRepository,
    job_repository: JobRepository,
    technician_repository: TechnicianRepository,
    period_repository: PayPeriodRepository,
}

impl WorkflowService {
    pub fn new(pool: PgPool) -> Self {
        Self {
            entry_repository: TimeEntryRepository::new(pool.clone()),
            job_repository: JobRepository::new(pool.clone()),
            technician_repository: TechnicianRepository::new(pool.clone()),
            period_repository: PayPeriodRepository::new(pool),
        }
    }

    pub async fn create_entry(
        &self,
        claims: &Claims,
        input: CreateTimeEntryInput,
    ) -> Result<TimeEntry, AppError> {
        let job = self
            .job_repository
            .find_by_id(input.job_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Job {}", input.job_id)))?;

        // Technicians always log against their own record; managers may
        // leave the entry unassigned (import path).
        let tech_id = if claims.is_manager_or_admin() {
            input.tech_id
        } else {
            Some(claims.tech_id.ok_or_else(|| {
                AppError::BadRequest("User is not linked to a technician".to_string())
            })?)
        };

        if let Some(tid) = tech_id {
            self.technician_repository
                .find_by_id(tid)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("Technician {}", tid)))?;
        }

        let hours_worked = derive_hours(input.hours_worked, input.time_in, input.time_out);

        let period_id = match input.period_id {
            Some(pid) => Some(pid),
            None => self
                .period_repository
                .find_open_for_date(input.date_worked)
                .await?
                .map(|p| p.id),
        };

        let now = Utc::now();
        let entry = TimeEntry {
            id: Uuid::new_v4(),
            job_id: job.id,
            tech_id,
            period_id,
            date_worked: input.date_worked,
            time_in: input.time_in,
            time_out: input.time_out,
            hours_worked,
            mileage: input.mileage.unwrap_or_else(BigDecimal::zero),
            per_diem: input.per_diem.unwrap_or_else(BigDecimal::zero),
            personal_expenses: input.personal_expenses.unwrap_or_else(BigDecimal::zero),
            status: TimeEntryStatus::Draft,
            rejection_reason: None,
            notes: input.notes.and_then(|n| {
                let trimmed = n.trim().to_string();
                (!trimmed.is_empty()).then_some(trimmed)
            }),
            verified_by: None,
            verified_at: None,
            created_by: Some(claims.sub),
            updated_by: Some(claims.sub),
            created_at: now,
            updated_at: now,
        };

        let created = self.entry_repository.create(&entry).await?;
        Ok(created)
    }

    pub async fn update_entry(
        &self,
        claims: &Claims,
        entry_id: Uuid,
        input: UpdateTimeEntryInput,
    ) -> Result<TimeEntry, AppError> {
        let mut entry = self
            .entry_repository
            .find_by_id(entry_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Time entry {}", entry_id)))?;

        self.check_can_modify(claims, &entry)?;

        if let Some(date_worked) = input.date_worked {
            entry.date_worked = date_worked;
        }
        if let Some(time_in) = input.time_in {
            entry.time_in = time_in;
        }
        if let Some(time_out) = input.time_out {
            entry.time_out = time_out;
        }

        match input.hours_worked {
            Some(hours) => entry.hours_worked = hours,
            None => {
                if let (Some(t_in), Some(t_out)) = (entry.time_in, entry.time_out) {
                    entry.hours_worked = Some(hours_between(t_in, t_out));
                }
            }
        }

        if let Some(mileage) = input.mileage {
            entry.mileage = mileage;
        }
        if let Some(per_diem) = input.per_diem {
            entry.per_diem = per_diem;
        }
        if let Some(personal_expenses) = input.personal_expenses {
            entry.personal_expenses = personal_expenses;
        }
        if let Some(notes) = input.notes {
            let trimmed = notes.trim().to_string();
            entry.notes = (!trimmed.is_empty()).then_some(trimmed);
        }

        // Only managers may move an entry to another job or technician.
        if claims.is_manager_or_admin() {
            if let Some(job_id) = input.job_id {
                self.job_repository
                    .find_by_id(job_id)
                    .await?
                    .ok_or_else(|| AppError::NotFound(format!("Job {}", job_id)))?;
                entry.job_id = job_id;
            }
            if let Some(tech_id) = input.tech_id {
                self.technician_repository
                    .find_by_id(tech_id)
                    .await?
                    .ok_or_else(|| AppError::NotFound(format!("Technician {}", tech_id)))?;
                entry.tech_id = Some(tech_id);
            }
        }

        entry.updated_by = Some(claims.sub);

        let updated = self.entry_repository.update_fields(&entry).await?;
        Ok(updated)
    }

    pub async fn delete_entry(&self, claims: &Claims, entry_id: Uuid) -> Result<(), AppError> {
        let entry = self
            .entry_repository
            .find_by_id(entry_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Time entry {}", entry_id)))?;

        if !claims.is_manager_or_admin() && entry.tech_id != claims.tech_id {
            return Err(AppError::PermissionDenied(
                "Cannot delete another technician's entry".to_string(),
            ));
        }

        if !self.entry_repository.delete_draft(entry_id).await? {
            return Err(AppError::BadRequest(
                "Only draft entries can be deleted".to_string(),
            ));
        }

        Ok(())
    }

    pub async fn submit(&self, claims: &Claims, entry_id: Uuid) -> Result<TimeEntry, AppError> {
        let entry = self
            .entry_repository
            .find_by_id(entry_id)
            .await?
            .ok_or(WorkflowError::NotFound(entry_id))
            .map_err(AppError::from)?;

        if !claims.is_manager_or_admin() && entry.tech_id != claims.tech_id {
            return Err(AppError::PermissionDenied(
                "Cannot submit another technician's entry".to_string(),
            ));
        }

        check_submit(&entry)?;

        // Guard passed on the snapshot; the UPDATE re-checks the status so a
        // concurrent transition loses cleanly instead of double-applying.
        match self
            .entry_repository
            .transition_status(
                entry_id,
                TimeEntryStatus::Draft,
                TimeEntryStatus::Submitted,
                claims.sub,
            )
            .await?
        {
            Some(updated) => Ok(updated),
            None => Err(self.conflict(entry_id, TimeEntryStatus::Draft).await),
        }
    }

    pub async fn verify(&self, claims: &Claims, entry_id: Uuid) -> Result<TimeEntry, AppError> {
        let entry = self
            .entry_repository
            .find_by_id(entry_id)
            .await?
            .ok_or(WorkflowError::NotFound(entry_id))
            .map_err(AppError::from)?;

        check_verify(&entry, claims)?;

        match self.entry_repository.mark_verified(entry_id, claims.sub).await? {
            Some(updated) => Ok(updated),
            None => Err(self.conflict(entry_id, TimeEntryStatus::Submitted).await),
        }
    }

    pub async fn reject(
        &self,
        claims: &Claims,
        entry_id: Uuid,
        reason: &str,
    ) -> Result<TimeEntry, AppError> {
        let entry = self
            .entry_repository
            .find_by_id(entry_id)
            .await?
            .ok_or(WorkflowError::NotFound(entry_id))
            .map_err(AppError::from)?;

        check_reject(&entry, claims, reason)?;

        match self
            .entry_repository
            .mark_rejected(entry_id, claims.sub, reason.trim())
            .await?
        {
            Some(updated) => Ok(updated),
            None => Err(self.conflict(entry_id, TimeEntryStatus::Submitted).await),
        }
    }

    /// Submit a batch of entries. Each id is its own atomic transition; a
    /// failure is recorded per entry and never aborts the rest.
    pub async fn bulk_submit(&self, claims: &Claims, entry_ids: &[Uuid]) -> BulkOutcome {
        let mut outcome = BulkOutcome {
            succeeded: Vec::new(),
            errors: Vec::new(),
        };

        for &entry_id in entry_ids {
            match self.submit(claims, entry_id).await {
                Ok(_) => outcome.succeeded.push(entry_id),
                Err(err) => outcome.errors.push(BulkEntryError {
                    entry_id,
                    error: err.to_string(),
                }),
            }
        }

        outcome
    }

    /// Verify a batch of entries with the same per-entry semantics as
    /// bulk_submit.
    pub async fn bulk_verify(&self, claims: &Claims, entry_ids: &[Uuid]) -> BulkOutcome {
        let mut outcome = BulkOutcome {
            succeeded: Vec::new(),
            errors: Vec::new(),
        };

        for &entry_id in entry_ids {
            match self.verify(claims, entry_id).await {
                Ok(_) => outcome.succeeded.push(entry_id),
                Err(err) => outcome.errors.push(BulkEntryError {
                    entry_id,
                    error: err.to_string(),
                }),
            }
        }

        outcome
    }

    fn check_can_modify(&self, claims: &Claims, entry: &TimeEntry) -> Result<(), AppError> {
        if claims.is_manager_or_admin() {
            return Ok(());
        }
        if entry.tech_id != claims.tech_id {
            return Err(AppError::PermissionDenied(
                "Cannot modify another technician's entry".to_string(),
            ));
        }
        if !matches!(
            entry.status,
            TimeEntryStatus::Draft | TimeEntryStatus::Submitted
        ) {
            return Err(AppError::BadRequest(
                "Only draft or submitted entries can be edited".to_string(),
            ));
        }
        Ok(())
    }

    /// The CAS update matched nothing: report the entry's actual status (or
    /// that it vanished) as the losing side of the race.
    async fn conflict(&self, entry_id: Uuid, expected: TimeEntryStatus) -> AppError {
        match self.entry_repository.find_by_id(entry_id).await {
            Ok(Some(current)) => WorkflowError::InvalidTransition {
                expected,
                actual: current.status,
            }
            .into(),
            Ok(None) => WorkflowError::NotFound(entry_id).into(),
            Err(err) => err.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;
    use std::str::FromStr;

    use crate::database::models::UserRole;

    fn dec(s: &str) -> BigDecimal {
        BigDecimal::from_str(s).unwrap()
    }

    fn time(s: &str) -> NaiveTime {
        NaiveTime::from_str(s).unwrap()
    }

    fn draft_entry(tech_id: Option<Uuid>, hours: Option<&str>) -> TimeEntry {
        let now = Utc::now();
        TimeEntry {
            id: Uuid::new_v4(),
            job_id: Uuid::new_v4(),
            tech_id,
            period_id: None,
            date_worked: NaiveDate::from_str("2026-01-12").unwrap(),
            time_in: None,
            time_out: None,
            hours_worked: hours.map(dec),
            mileage: BigDecimal::zero(),
            per_diem: BigDecimal::zero(),
            personal_expenses: BigDecimal::zero(),
            status: TimeEntryStatus::Draft,
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

    fn claims_with_role(role: UserRole) -> Claims {
        Claims {
            sub: Uuid::new_v4(),
            email: "user@example.com".to_string(),
            tech_id: None,
            role,
            exp: 0,
        }
    }

    #[test]
    fn hours_truncate_to_whole_minutes() {
        // 8:00:00 -> 16:30:59 is 8h30m59s; seconds drop, leaving 8.5h
        let hours = hours_between(time("08:00:00"), time("16:30:59"));
        assert_eq!(hours, dec("8.50"));
    }

    #[test]
    fn hours_round_half_up_at_two_decimals() {
        // 8:00 -> 8:55 = 55 minutes = 0.91666.. -> 0.92
        let hours = hours_between(time("08:00:00"), time("08:55:00"));
        assert_eq!(hours, dec("0.92"));
    }

    #[test]
    fn overnight_pair_wraps() {
        // 22:00 -> 06:00 crosses midnight: 8 hours
        let hours = hours_between(time("22:00:00"), time("06:00:00"));
        assert_eq!(hours, dec("8.00"));
    }

    #[test]
    fn explicit_hours_override_clock_pair() {
        // 8:00 -> 16:00 computes 8h but the entered 6.5 wins
        let hours = derive_hours(
            Some(dec("6.5")),
            Some(time("08:00:00")),
            Some(time("16:00:00")),
        );
        assert_eq!(hours, Some(dec("6.5")));
    }

    #[test]
    fn no_hours_derivable_from_partial_pair() {
        assert_eq!(derive_hours(None, Some(time("08:00:00")), None), None);
        assert_eq!(derive_hours(None, None, None), None);
    }

    #[test]
    fn submit_requires_assignment_regardless_of_other_fields() {
        // Property from the spec: a null technician blocks submission no
        // matter what else the entry carries.
        let mut entry = draft_entry(None, Some("8"));
        entry.mileage = dec("120");
        entry.notes = Some("fully filled".to_string());

        assert_eq!(check_submit(&entry), Err(WorkflowError::MissingAssignment));
    }

    #[test]
    fn submit_requires_draft_status() {
        let mut entry = draft_entry(Some(Uuid::new_v4()), Some("8"));
        entry.status = TimeEntryStatus::Submitted;

        assert_eq!(
            check_submit(&entry),
            Err(WorkflowError::InvalidTransition {
                expected: TimeEntryStatus::Draft,
                actual: TimeEntryStatus::Submitted,
            })
        );
    }

    #[test]
    fn submit_requires_positive_hours() {
        let entry = draft_entry(Some(Uuid::new_v4()), Some("0"));
        assert_eq!(check_submit(&entry), Err(WorkflowError::MissingHours));

        let entry = draft_entry(Some(Uuid::new_v4()), None);
        assert_eq!(check_submit(&entry), Err(WorkflowError::MissingHours));
    }

    #[test]
    fn submit_ok_for_assigned_draft_with_hours() {
        let entry = draft_entry(Some(Uuid::new_v4()), Some("7.25"));
        assert_eq!(check_submit(&entry), Ok(()));
    }

    #[test]
    fn verify_requires_manager_role() {
        let mut entry = draft_entry(Some(Uuid::new_v4()), Some("8"));
        entry.status = TimeEntryStatus::Submitted;

        let technician = claims_with_role(UserRole::Technician);
        assert!(matches!(
            check_verify(&entry, &technician),
            Err(WorkflowError::PermissionDenied(_))
        ));

        let manager = claims_with_role(UserRole::Manager);
        assert_eq!(check_verify(&entry, &manager), Ok(()));

        let admin = claims_with_role(UserRole::Admin);
        assert_eq!(check_verify(&entry, &admin), Ok(()));
    }

    #[test]
    fn verify_requires_submitted_status() {
        let entry = draft_entry(Some(Uuid::new_v4()), Some("8"));
        let manager = claims_with_role(UserRole::Manager);

        assert_eq!(
            check_verify(&entry, &manager),
            Err(WorkflowError::InvalidTransition {
                expected: TimeEntryStatus::Submitted,
                actual: TimeEntryStatus::Draft,
            })
        );
    }

    #[test]
    fn reject_requires_reason() {
        let mut entry = draft_entry(Some(Uuid::new_v4()), Some("8"));
        entry.status = TimeEntryStatus::Submitted;
        let manager = claims_with_role(UserRole::Manager);

        assert_eq!(
            check_reject(&entry, &manager, "   "),
            Err(WorkflowError::MissingReason)
        );
        assert_eq!(
            check_reject(&entry, &manager, "hours look wrong"),
            Ok(())
        );
    }

    #[test]
    fn submit_reject_resubmit_cycle_guards_hold() {
        // Scenario: draft -> submitted -> draft(reason) -> submitted, with
        // every guard validated against the status at call time.
        let manager = claims_with_role(UserRole::Manager);
        let mut entry = draft_entry(Some(Uuid::new_v4()), Some("8"));

        assert_eq!(check_submit(&entry), Ok(()));
        entry.status = TimeEntryStatus::Submitted;

        // A second submit on the now-submitted entry loses.
        assert!(check_submit(&entry).is_err());

        assert_eq!(check_reject(&entry, &manager, "bad hours"), Ok(()));
        entry.status = TimeEntryStatus::Draft;
        entry.rejection_reason = Some("bad hours".to_string());

        // Rejection returned it to draft, so verify is now invalid...
        assert!(check_verify(&entry, &manager).is_err());
        // ...and resubmission is allowed again.
        assert_eq!(check_submit(&entry), Ok(()));
    }

    #[test]
    fn verified_entry_cannot_be_rejected() {
        let mut entry = draft_entry(Some(Uuid::new_v4()), Some("8"));
        entry.status = TimeEntryStatus::Verified;
        let manager = claims_with_role(UserRole::Manager);

        assert_eq!(
            check_reject(&entry, &manager, "too late"),
            Err(WorkflowError::InvalidTransition {
                expected: TimeEntryStatus::Submitted,
                actual: TimeEntryStatus::Verified,
            })
        );
    }
}
