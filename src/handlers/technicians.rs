use actix_web::{HttpRequest, HttpResponse, web};
use serde::Deserialize;
use uuid::Uuid;

use crate::AppState;
use crate::database::models::{
    ActionType, CreateTechnicianInput, EntityType, TechnicianStatus, UpdateTechnicianInput,
};
use crate::database::repositories::TechnicianRepository;
use crate::error::AppError;
use crate::handlers::shared::ApiResponse;
use crate::services::auth::Claims;

#[derive(Debug, Deserialize)]
pub struct TechnicianQuery {
    pub status: Option<String>,
}

pub async fn create_technician(
    claims: Claims,
    state: web::Data<AppState>,
    repo: web::Data<TechnicianRepository>,
    input: web::Json<CreateTechnicianInput>,
    req: HttpRequest,
) -> Result<HttpResponse, AppError> {
    if !claims.is_manager_or_admin() {
        return Err(AppError::PermissionDenied(
            "Only managers can create technicians".to_string(),
        ));
    }

    let technician = repo.create(input.into_inner()).await?;

    state
        .activity_logger
        .log(
            Some(claims.sub),
            ActionType::CREATED,
            EntityType::TECHNICIAN,
            Some(technician.id),
            None,
            serde_json::to_value(&technician).ok(),
            format!("Technician {} created", technician.name),
            &req,
        )
        .await;

    Ok(HttpResponse::Created().json(ApiResponse::success(technician)))
}

pub async fn get_technicians(
    _claims: Claims,
    repo: web::Data<TechnicianRepository>,
    query: web::Query<TechnicianQuery>,
) -> Result<HttpResponse, AppError> {
    let status = match &query.status {
        Some(raw) => Some(
            raw.parse::<TechnicianStatus>()
                .map_err(AppError::BadRequest)?,
        ),
        None => None,
    };

    let technicians = repo.get_all(status).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(technicians)))
}

pub async fn get_technician(
    _claims: Claims,
    repo: web::Data<TechnicianRepository>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let tech_id = path.into_inner();
    let technician = repo
        .find_by_id(tech_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Technician {}", tech_id)))?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(technician)))
}

pub async fn update_technician(
    claims: Claims,
    state: web::Data<AppState>,
    repo: web::Data<TechnicianRepository>,
    path: web::Path<Uuid>,
    input: web::Json<UpdateTechnicianInput>,
    req: HttpRequest,
) -> Result<HttpResponse, AppError> {
    if !claims.is_manager_or_admin() {
        return Err(AppError::PermissionDenied(
            "Only managers can update technicians".to_string(),
        ));
    }

    let tech_id = path.into_inner();
    let before = repo.find_by_id(tech_id).await?;

    let technician = repo
        .update(tech_id, input.into_inner())
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Technician {}", tech_id)))?;

    state
        .activity_logger
        .log(
            Some(claims.sub),
            ActionType::UPDATED,
            EntityType::TECHNICIAN,
            Some(tech_id),
            before.and_then(|b| serde_json::to_value(&b).ok()),
            serde_json::to_value(&technician).ok(),
            format!("Technician {} updated", technician.name),
            &req,
        )
        .await;

    Ok(HttpResponse::Ok().json(ApiResponse::success(technician)))
}
