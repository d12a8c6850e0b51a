use actix_web::{HttpRequest, HttpResponse, web};
use bigdecimal::{BigDecimal, Zero};
use chrono::{Datelike, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::AppState;
use crate::database::models::{ActionType, ActivityFilter, EntityType, TimeEntryQuery, TimeEntryStatus};
use crate::database::repositories::{JobRepository, TechnicianRepository, TimeEntryRepository};
use crate::error::AppError;
use crate::handlers::shared::ApiResponse;
use crate::services::ReportService;
use crate::services::auth::Claims;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RangeQuery {
    pub from_date: NaiveDate,
    pub to_date: NaiveDate,
    pub tech_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptionalRangeQuery {
    pub from_date: Option<NaiveDate>,
    pub to_date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HoursQuery {
    pub tech_id: Option<Uuid>,
    pub from_date: NaiveDate,
    pub to_date: NaiveDate,
    pub group_by: Option<String>,
}

/// Per-technician payroll breakdown over a date range, manager only.
pub async fn payroll_report(
    claims: Claims,
    state: web::Data<AppState>,
    reports: web::Data<ReportService>,
    query: web::Query<RangeQuery>,
    req: HttpRequest,
) -> Result<HttpResponse, AppError> {
    if !claims.is_manager_or_admin() {
        return Err(AppError::PermissionDenied(
            "Only managers can run payroll reports".to_string(),
        ));
    }

    let report = reports
        .payroll_report(query.from_date, query.to_date, query.tech_id)
        .await?;

    state
        .activity_logger
        .log(
            Some(claims.sub),
            ActionType::REPORT_GENERATED,
            EntityType::REPORT,
            None,
            None,
            None,
            format!(
                "Payroll report generated for {} to {}",
                query.from_date, query.to_date
            ),
            &req,
        )
        .await;

    Ok(HttpResponse::Ok().json(ApiResponse::success(report)))
}

/// Per-job billing/income view, manager only.
pub async fn job_billing_report(
    claims: Claims,
    state: web::Data<AppState>,
    reports: web::Data<ReportService>,
    query: web::Query<OptionalRangeQuery>,
    req: HttpRequest,
) -> Result<HttpResponse, AppError> {
    if !claims.is_manager_or_admin() {
        return Err(AppError::PermissionDenied(
            "Only managers can run billing reports".to_string(),
        ));
    }

    let report = reports
        .job_billing_report(query.from_date, query.to_date)
        .await?;

    state
        .activity_logger
        .log(
            Some(claims.sub),
            ActionType::REPORT_GENERATED,
            EntityType::REPORT,
            None,
            None,
            None,
            "Job billing report generated",
            &req,
        )
        .await;

    Ok(HttpResponse::Ok().json(ApiResponse::success(report)))
}

/// Hours breakdown for one technician. Technicians see their own; managers
/// may pick any technician.
pub async fn technician_hours(
    claims: Claims,
    reports: web::Data<ReportService>,
    query: web::Query<HoursQuery>,
) -> Result<HttpResponse, AppError> {
    let tech_id = if claims.is_manager_or_admin() {
        query.tech_id.ok_or_else(|| {
            AppError::BadRequest("Technician ID required".to_string())
        })?
    } else {
        let own = claims.tech_id.ok_or_else(|| {
            AppError::BadRequest("User is not linked to a technician".to_string())
        })?;
        if query.tech_id.is_some_and(|requested| requested != own) {
            return Err(AppError::PermissionDenied(
                "Cannot view another technician's hours".to_string(),
            ));
        }
        own
    };

    let group_by = query.group_by.as_deref().unwrap_or("day");
    let buckets = reports
        .technician_hours(tech_id, query.from_date, query.to_date, group_by)
        .await?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(buckets)))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ManagerDashboard {
    pub pending_verification: i64,
    pub active_jobs: i64,
    pub active_technicians: i64,
    pub month_hours_total: BigDecimal,
    pub month_hours_verified: BigDecimal,
    pub month_hours_pending: BigDecimal,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TechnicianDashboard {
    pub month_hours: BigDecimal,
    pub week_hours: BigDecimal,
    pub draft_entries: usize,
    pub pending_entries: usize,
}

/// Role-dependent dashboard stats: managers see team-wide counters,
/// technicians their own.
pub async fn dashboard(
    claims: Claims,
    entry_repo: web::Data<TimeEntryRepository>,
    job_repo: web::Data<JobRepository>,
    tech_repo: web::Data<TechnicianRepository>,
) -> Result<HttpResponse, AppError> {
    let today = Utc::now().date_naive();
    let month_start = today.with_day(1).unwrap_or(today);

    if claims.is_manager_or_admin() {
        let month_entries = entry_repo
            .get_entries(&TimeEntryQuery {
                from_date: Some(month_start),
                ..Default::default()
            })
            .await?;

        let mut total = BigDecimal::zero();
        let mut verified = BigDecimal::zero();
        let mut pending = BigDecimal::zero();
        for entry in &month_entries {
            let hours = entry.hours_worked.clone().unwrap_or_else(BigDecimal::zero);
            total += &hours;
            if entry.status.is_payable() {
                verified += &hours;
            } else {
                pending += &hours;
            }
        }

        let stats = ManagerDashboard {
            pending_verification: entry_repo.count_by_status(TimeEntryStatus::Submitted).await?,
            active_jobs: job_repo.count_active().await?,
            active_technicians: tech_repo.count_active().await?,
            month_hours_total: total,
            month_hours_verified: verified,
            month_hours_pending: pending,
        };

        return Ok(HttpResponse::Ok().json(ApiResponse::success(stats)));
    }

    let tech_id = claims
        .tech_id
        .ok_or_else(|| AppError::BadRequest("User is not linked to a technician".to_string()))?;

    let entries = entry_repo
        .get_entries(&TimeEntryQuery {
            tech_id: Some(tech_id),
            from_date: Some(month_start),
            ..Default::default()
        })
        .await?;

    let week_start = today - Duration::days(today.weekday().num_days_from_monday() as i64);
    let mut month_hours = BigDecimal::zero();
    let mut week_hours = BigDecimal::zero();
    let mut draft_entries = 0;
    let mut pending_entries = 0;

    for entry in &entries {
        let hours = entry.hours_worked.clone().unwrap_or_else(BigDecimal::zero);
        month_hours += &hours;
        if entry.date_worked >= week_start {
            week_hours += &hours;
        }
        match entry.status {
            TimeEntryStatus::Draft => draft_entries += 1,
            TimeEntryStatus::Submitted => pending_entries += 1,
            _ => {}
        }
    }

    let stats = TechnicianDashboard {
        month_hours,
        week_hours,
        draft_entries,
        pending_entries,
    };

    Ok(HttpResponse::Ok().json(ApiResponse::success(stats)))
}

/// Audit log query, admin only.
pub async fn audit_log(
    claims: Claims,
    state: web::Data<AppState>,
    query: web::Query<ActivityFilter>,
) -> Result<HttpResponse, AppError> {
    if !claims.is_admin() {
        return Err(AppError::PermissionDenied(
            "Only admins can query the audit log".to_string(),
        ));
    }

    let activities = state.activity_repository.get_activities(&query).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(activities)))
}
