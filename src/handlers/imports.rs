use actix_web::{HttpRequest, HttpResponse, web};

use crate::AppState;
use crate::database::models::{ActionType, EntityType};
use crate::error::AppError;
use crate::handlers::shared::ApiResponse;
use crate::services::ImportService;
use crate::services::auth::Claims;
use crate::services::import::WorkOrderImport;

/// Ingest scraped work orders (admin only). Dedup and per-item error
/// collection happen in the import service; the response always reports
/// what was imported, skipped and failed.
pub async fn import_work_orders(
    claims: Claims,
    state: web::Data<AppState>,
    service: web::Data<ImportService>,
    input: web::Json<Vec<WorkOrderImport>>,
    req: HttpRequest,
) -> Result<HttpResponse, AppError> {
    if !claims.is_admin() {
        return Err(AppError::PermissionDenied(
            "Only admins can import work orders".to_string(),
        ));
    }

    let summary = service.import_work_orders(&input, claims.sub).await?;

    state
        .activity_logger
        .log(
            Some(claims.sub),
            ActionType::IMPORTED,
            EntityType::JOB,
            None,
            None,
            serde_json::to_value(&summary).ok(),
            format!(
                "Imported {} jobs and {} time entries ({} errors)",
                summary.imported_jobs,
                summary.imported_entries,
                summary.errors.len()
            ),
            &req,
        )
        .await;

    Ok(HttpResponse::Ok().json(ApiResponse::success(summary)))
}

/// Dry-run view of an import payload.
pub async fn preview_import(
    claims: Claims,
    service: web::Data<ImportService>,
    input: web::Json<Vec<WorkOrderImport>>,
) -> Result<HttpResponse, AppError> {
    if !claims.is_admin() {
        return Err(AppError::PermissionDenied(
            "Only admins can preview imports".to_string(),
        ));
    }

    let preview = service.preview(&input).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(preview)))
}
