use actix_web::{HttpRequest, HttpResponse, web};
use uuid::Uuid;

use crate::AppState;
use crate::database::models::{
    ActionType, CreateJobInput, CreatePlatformInput, EntityType, JobQuery, JobStatus,
    UpdateJobInput,
};
use crate::database::repositories::{JobRepository, PlatformRepository};
use crate::error::AppError;
use crate::handlers::shared::ApiResponse;
use crate::services::PayService;
use crate::services::auth::Claims;

pub async fn create_job(
    claims: Claims,
    state: web::Data<AppState>,
    repo: web::Data<JobRepository>,
    input: web::Json<CreateJobInput>,
    req: HttpRequest,
) -> Result<HttpResponse, AppError> {
    if !claims.is_manager_or_admin() {
        return Err(AppError::PermissionDenied(
            "Only managers can create jobs".to_string(),
        ));
    }

    let job = repo.create(input.into_inner(), Some(claims.sub)).await?;

    state
        .activity_logger
        .log(
            Some(claims.sub),
            ActionType::CREATED,
            EntityType::JOB,
            Some(job.id),
            None,
            serde_json::to_value(&job).ok(),
            format!("Job {} created", job.ticket_number.as_deref().unwrap_or("-")),
            &req,
        )
        .await;

    Ok(HttpResponse::Created().json(ApiResponse::success(job)))
}

pub async fn get_jobs(
    _claims: Claims,
    repo: web::Data<JobRepository>,
    query: web::Query<JobQuery>,
) -> Result<HttpResponse, AppError> {
    let status = match &query.status {
        Some(raw) => Some(raw.parse::<JobStatus>().map_err(AppError::BadRequest)?),
        None => None,
    };

    let jobs = repo
        .get_jobs(query.platform_id, status, query.from_date, query.to_date)
        .await?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(jobs)))
}

pub async fn get_job(
    _claims: Claims,
    repo: web::Data<JobRepository>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let job_id = path.into_inner();
    let job = repo
        .find_by_id(job_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Job {}", job_id)))?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(job)))
}

pub async fn update_job(
    claims: Claims,
    state: web::Data<AppState>,
    repo: web::Data<JobRepository>,
    path: web::Path<Uuid>,
    input: web::Json<UpdateJobInput>,
    req: HttpRequest,
) -> Result<HttpResponse, AppError> {
    if !claims.is_manager_or_admin() {
        return Err(AppError::PermissionDenied(
            "Only managers can update jobs".to_string(),
        ));
    }

    let job_id = path.into_inner();
    let before = repo.find_by_id(job_id).await?;

    let job = repo
        .update(job_id, input.into_inner(), Some(claims.sub))
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Job {}", job_id)))?;

    state
        .activity_logger
        .log(
            Some(claims.sub),
            ActionType::UPDATED,
            EntityType::JOB,
            Some(job_id),
            before.and_then(|b| serde_json::to_value(&b).ok()),
            serde_json::to_value(&job).ok(),
            format!("Job {} updated", job.ticket_number.as_deref().unwrap_or("-")),
            &req,
        )
        .await;

    Ok(HttpResponse::Ok().json(ApiResponse::success(job)))
}

/// Full pay breakdown for one job, computed on demand from its payable
/// entries. Never cached.
pub async fn get_job_pay(
    claims: Claims,
    pay_service: web::Data<PayService>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    if !claims.is_manager_or_admin() {
        return Err(AppError::PermissionDenied(
            "Only managers can view job pay".to_string(),
        ));
    }

    let breakdown = pay_service.calculate_job_pay(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(breakdown)))
}

pub async fn create_platform(
    claims: Claims,
    repo: web::Data<PlatformRepository>,
    input: web::Json<CreatePlatformInput>,
) -> Result<HttpResponse, AppError> {
    if !claims.is_manager_or_admin() {
        return Err(AppError::PermissionDenied(
            "Only managers can create platforms".to_string(),
        ));
    }

    let platform = repo.create(input.into_inner()).await?;
    Ok(HttpResponse::Created().json(ApiResponse::success(platform)))
}

pub async fn get_platforms(
    _claims: Claims,
    repo: web::Data<PlatformRepository>,
) -> Result<HttpResponse, AppError> {
    let platforms = repo.get_all().await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(platforms)))
}
