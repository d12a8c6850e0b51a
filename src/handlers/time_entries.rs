use actix_web::{HttpRequest, HttpResponse, web};
use uuid::Uuid;

use crate::AppState;
use crate::database::models::{
    ActionType, BulkEntryInput, CreateTimeEntryInput, EntityType, RejectInput, TimeEntryQuery,
    TimeEntryStatus, UpdateTimeEntryInput,
};
use crate::database::repositories::TimeEntryRepository;
use crate::error::AppError;
use crate::handlers::shared::ApiResponse;
use crate::services::auth::Claims;
use crate::services::{ReportService, WorkflowService};

pub async fn list_time_entries(
    claims: Claims,
    repo: web::Data<TimeEntryRepository>,
    query: web::Query<TimeEntryQuery>,
) -> Result<HttpResponse, AppError> {
    let mut filter = query.into_inner();

    // Technicians only ever see their own entries.
    if !claims.is_manager_or_admin() {
        let tech_id = claims.tech_id.ok_or_else(|| {
            AppError::BadRequest("User is not linked to a technician".to_string())
        })?;
        filter.tech_id = Some(tech_id);
        filter.unassigned = None;
    }

    let entries = repo.get_entries(&filter).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(entries)))
}

pub async fn get_time_entry(
    claims: Claims,
    repo: web::Data<TimeEntryRepository>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let entry_id = path.into_inner();
    let entry = repo
        .find_by_id(entry_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Time entry {}", entry_id)))?;

    if !claims.is_manager_or_admin() && entry.tech_id != claims.tech_id {
        return Err(AppError::PermissionDenied(
            "Cannot view another technician's entry".to_string(),
        ));
    }

    Ok(HttpResponse::Ok().json(ApiResponse::success(entry)))
}

pub async fn create_time_entry(
    claims: Claims,
    state: web::Data<AppState>,
    workflow: web::Data<WorkflowService>,
    input: web::Json<CreateTimeEntryInput>,
    req: HttpRequest,
) -> Result<HttpResponse, AppError> {
    let entry = workflow.create_entry(&claims, input.into_inner()).await?;

    state
        .activity_logger
        .log(
            Some(claims.sub),
            ActionType::CREATED,
            EntityType::TIME_ENTRY,
            Some(entry.id),
            None,
            serde_json::to_value(&entry).ok(),
            format!("Time entry created for job {}", entry.job_id),
            &req,
        )
        .await;

    Ok(HttpResponse::Created().json(ApiResponse::success(entry)))
}

pub async fn update_time_entry(
    claims: Claims,
    state: web::Data<AppState>,
    workflow: web::Data<WorkflowService>,
    repo: web::Data<TimeEntryRepository>,
    path: web::Path<Uuid>,
    input: web::Json<UpdateTimeEntryInput>,
    req: HttpRequest,
) -> Result<HttpResponse, AppError> {
    let entry_id = path.into_inner();
    let before = repo.find_by_id(entry_id).await?;

    let entry = workflow
        .update_entry(&claims, entry_id, input.into_inner())
        .await?;

    state
        .activity_logger
        .log(
            Some(claims.sub),
            ActionType::UPDATED,
            EntityType::TIME_ENTRY,
            Some(entry.id),
            before.and_then(|b| serde_json::to_value(&b).ok()),
            serde_json::to_value(&entry).ok(),
            "Time entry updated",
            &req,
        )
        .await;

    Ok(HttpResponse::Ok().json(ApiResponse::success(entry)))
}

pub async fn delete_time_entry(
    claims: Claims,
    state: web::Data<AppState>,
    workflow: web::Data<WorkflowService>,
    path: web::Path<Uuid>,
    req: HttpRequest,
) -> Result<HttpResponse, AppError> {
    let entry_id = path.into_inner();
    workflow.delete_entry(&claims, entry_id).await?;

    state
        .activity_logger
        .log(
            Some(claims.sub),
            ActionType::DELETED,
            EntityType::TIME_ENTRY,
            Some(entry_id),
            None,
            None,
            "Draft time entry deleted",
            &req,
        )
        .await;

    Ok(HttpResponse::Ok().json(ApiResponse::<()>::success_with_message(
        None,
        "Time entry deleted",
    )))
}

pub async fn submit_time_entry(
    claims: Claims,
    state: web::Data<AppState>,
    workflow: web::Data<WorkflowService>,
    path: web::Path<Uuid>,
    req: HttpRequest,
) -> Result<HttpResponse, AppError> {
    let entry = workflow.submit(&claims, path.into_inner()).await?;

    state
        .activity_logger
        .log_transition(
            claims.sub,
            ActionType::SUBMITTED,
            EntityType::TIME_ENTRY,
            entry.id,
            &TimeEntryStatus::Draft.to_string(),
            &entry.status.to_string(),
            "Time entry submitted for verification",
            &req,
        )
        .await;

    Ok(HttpResponse::Ok().json(ApiResponse::success(entry)))
}

pub async fn verify_time_entry(
    claims: Claims,
    state: web::Data<AppState>,
    workflow: web::Data<WorkflowService>,
    path: web::Path<Uuid>,
    req: HttpRequest,
) -> Result<HttpResponse, AppError> {
    let entry = workflow.verify(&claims, path.into_inner()).await?;

    state
        .activity_logger
        .log_transition(
            claims.sub,
            ActionType::VERIFIED,
            EntityType::TIME_ENTRY,
            entry.id,
            &TimeEntryStatus::Submitted.to_string(),
            &entry.status.to_string(),
            "Time entry verified",
            &req,
        )
        .await;

    Ok(HttpResponse::Ok().json(ApiResponse::success(entry)))
}

pub async fn reject_time_entry(
    claims: Claims,
    state: web::Data<AppState>,
    workflow: web::Data<WorkflowService>,
    path: web::Path<Uuid>,
    input: web::Json<RejectInput>,
    req: HttpRequest,
) -> Result<HttpResponse, AppError> {
    let entry = workflow
        .reject(&claims, path.into_inner(), &input.reason)
        .await?;

    state
        .activity_logger
        .log(
            Some(claims.sub),
            ActionType::REJECTED,
            EntityType::TIME_ENTRY,
            Some(entry.id),
            Some(serde_json::json!({ "status": TimeEntryStatus::Submitted.to_string() })),
            Some(serde_json::json!({
                "status": entry.status.to_string(),
                "rejectionReason": entry.rejection_reason.clone(),
            })),
            "Time entry rejected and returned to draft",
            &req,
        )
        .await;

    Ok(HttpResponse::Ok().json(ApiResponse::success(entry)))
}

pub async fn bulk_submit(
    claims: Claims,
    state: web::Data<AppState>,
    workflow: web::Data<WorkflowService>,
    input: web::Json<BulkEntryInput>,
    req: HttpRequest,
) -> Result<HttpResponse, AppError> {
    let outcome = workflow.bulk_submit(&claims, &input.entry_ids).await;

    if !outcome.succeeded.is_empty() {
        state
            .activity_logger
            .log(
                Some(claims.sub),
                ActionType::BULK_SUBMITTED,
                EntityType::TIME_ENTRY,
                None,
                None,
                serde_json::to_value(&outcome.succeeded).ok(),
                format!("Bulk submitted {} time entries", outcome.succeeded.len()),
                &req,
            )
            .await;
    }

    Ok(HttpResponse::Ok().json(ApiResponse::success(outcome)))
}

pub async fn bulk_verify(
    claims: Claims,
    state: web::Data<AppState>,
    workflow: web::Data<WorkflowService>,
    input: web::Json<BulkEntryInput>,
    req: HttpRequest,
) -> Result<HttpResponse, AppError> {
    let outcome = workflow.bulk_verify(&claims, &input.entry_ids).await;

    if !outcome.succeeded.is_empty() {
        state
            .activity_logger
            .log(
                Some(claims.sub),
                ActionType::BULK_VERIFIED,
                EntityType::TIME_ENTRY,
                None,
                None,
                serde_json::to_value(&outcome.succeeded).ok(),
                format!("Bulk verified {} time entries", outcome.succeeded.len()),
                &req,
            )
            .await;
    }

    Ok(HttpResponse::Ok().json(ApiResponse::success(outcome)))
}

/// The caller's own status/week rollup.
pub async fn my_summary(
    claims: Claims,
    reports: web::Data<ReportService>,
) -> Result<HttpResponse, AppError> {
    let tech_id = claims
        .tech_id
        .ok_or_else(|| AppError::BadRequest("User is not linked to a technician".to_string()))?;

    let summary = reports.technician_summary(tech_id).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(summary)))
}
