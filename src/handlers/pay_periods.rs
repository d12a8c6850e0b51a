use actix_web::{HttpRequest, HttpResponse, web};
use bigdecimal::{BigDecimal, Zero};
use serde::Deserialize;
use uuid::Uuid;

use crate::AppState;
use crate::database::models::{
    ActionType, CreatePayPeriodInput, EntityType, PayPeriodStatus, PayPeriodSummary,
};
use crate::database::repositories::{PayPeriodRepository, TimeEntryRepository};
use crate::error::AppError;
use crate::handlers::shared::ApiResponse;
use crate::services::auth::Claims;

#[derive(Debug, Deserialize)]
pub struct PayPeriodQuery {
    pub status: Option<String>,
}

pub async fn list_pay_periods(
    _claims: Claims,
    period_repo: web::Data<PayPeriodRepository>,
    entry_repo: web::Data<TimeEntryRepository>,
    query: web::Query<PayPeriodQuery>,
) -> Result<HttpResponse, AppError> {
    let status = match &query.status {
        Some(raw) => Some(raw.parse::<PayPeriodStatus>().map_err(AppError::BadRequest)?),
        None => None,
    };

    let periods = period_repo.get_all(status).await?;

    let mut summaries = Vec::with_capacity(periods.len());
    for period in periods {
        let entries = entry_repo.entries_for_period(period.id).await?;

        let mut logged_hours = BigDecimal::zero();
        let mut verified_hours = BigDecimal::zero();
        for entry in &entries {
            let hours = entry.hours_worked.clone().unwrap_or_else(BigDecimal::zero);
            logged_hours += &hours;
            if entry.status.is_payable() {
                verified_hours += &hours;
            }
        }

        summaries.push(PayPeriodSummary {
            entry_count: entries.len() as i64,
            logged_hours,
            verified_hours,
            period,
        });
    }

    Ok(HttpResponse::Ok().json(ApiResponse::success(summaries)))
}

pub async fn create_pay_period(
    claims: Claims,
    state: web::Data<AppState>,
    period_repo: web::Data<PayPeriodRepository>,
    entry_repo: web::Data<TimeEntryRepository>,
    input: web::Json<CreatePayPeriodInput>,
    req: HttpRequest,
) -> Result<HttpResponse, AppError> {
    if !claims.is_manager_or_admin() {
        return Err(AppError::PermissionDenied(
            "Only managers can create pay periods".to_string(),
        ));
    }

    let input = input.into_inner();
    if input.end_date < input.start_date {
        return Err(AppError::BadRequest(
            "End date must not precede start date".to_string(),
        ));
    }

    if period_repo
        .find_overlapping(input.start_date, input.end_date)
        .await?
        .is_some()
    {
        return Err(AppError::Conflict(
            "Pay period overlaps with an existing period".to_string(),
        ));
    }

    let period = period_repo.create(input).await?;

    // Sweep loose entries in the window into the new period.
    let attached = entry_repo
        .attach_to_period(period.id, period.start_date, period.end_date)
        .await?;

    state
        .activity_logger
        .log(
            Some(claims.sub),
            ActionType::CREATED,
            EntityType::PAY_PERIOD,
            Some(period.id),
            None,
            serde_json::to_value(&period).ok(),
            format!(
                "Pay period {} created, {} entries attached",
                period.period_name.as_deref().unwrap_or("-"),
                attached
            ),
            &req,
        )
        .await;

    Ok(HttpResponse::Created().json(ApiResponse::success(period)))
}

/// Close an open period. Refused while draft/submitted entries remain in
/// it; the close itself is a status CAS like entry transitions.
pub async fn close_pay_period(
    claims: Claims,
    state: web::Data<AppState>,
    period_repo: web::Data<PayPeriodRepository>,
    entry_repo: web::Data<TimeEntryRepository>,
    path: web::Path<Uuid>,
    req: HttpRequest,
) -> Result<HttpResponse, AppError> {
    if !claims.is_manager_or_admin() {
        return Err(AppError::PermissionDenied(
            "Only managers can close pay periods".to_string(),
        ));
    }

    let period_id = path.into_inner();
    let period = period_repo
        .find_by_id(period_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Pay period {}", period_id)))?;

    if period.status != PayPeriodStatus::Open {
        return Err(AppError::BadRequest("Period is not open".to_string()));
    }

    let unverified = entry_repo.count_unverified_in_period(period_id).await?;
    if unverified > 0 {
        return Err(AppError::BadRequest(format!(
            "Cannot close period with {} unverified entries",
            unverified
        )));
    }

    let entries = entry_repo.entries_for_period(period_id).await?;
    let total_hours: BigDecimal = entries
        .iter()
        .filter_map(|e| e.hours_worked.clone())
        .sum();

    let closed = period_repo
        .close(period_id, total_hours.clone())
        .await?
        .ok_or_else(|| AppError::Conflict("Period is not open".to_string()))?;

    state
        .activity_logger
        .log(
            Some(claims.sub),
            ActionType::PERIOD_CLOSED,
            EntityType::PAY_PERIOD,
            Some(period_id),
            Some(serde_json::json!({ "status": PayPeriodStatus::Open.to_string() })),
            Some(serde_json::json!({
                "status": PayPeriodStatus::Closed.to_string(),
                "totalHours": total_hours.to_string(),
            })),
            format!(
                "Pay period {} closed",
                closed.period_name.as_deref().unwrap_or("-")
            ),
            &req,
        )
        .await;

    Ok(HttpResponse::Ok().json(ApiResponse::success(closed)))
}
