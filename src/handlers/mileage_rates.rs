use actix_web::{HttpRequest, HttpResponse, web};
use chrono::Utc;

use crate::AppState;
use crate::database::models::{ActionType, CreateMileageRateInput, EntityType};
use crate::database::repositories::MileageRateRepository;
use crate::error::AppError;
use crate::handlers::shared::ApiResponse;
use crate::services::auth::Claims;

pub async fn list_mileage_rates(
    _claims: Claims,
    repo: web::Data<MileageRateRepository>,
) -> Result<HttpResponse, AppError> {
    let rates = repo.get_all().await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(rates)))
}

pub async fn create_mileage_rate(
    claims: Claims,
    state: web::Data<AppState>,
    repo: web::Data<MileageRateRepository>,
    input: web::Json<CreateMileageRateInput>,
    req: HttpRequest,
) -> Result<HttpResponse, AppError> {
    if !claims.is_admin() {
        return Err(AppError::PermissionDenied(
            "Only admins can create mileage rates".to_string(),
        ));
    }

    let rate = repo.create(input.into_inner()).await?;

    state
        .activity_logger
        .log(
            Some(claims.sub),
            ActionType::CREATED,
            EntityType::MILEAGE_RATE,
            Some(rate.id),
            None,
            serde_json::to_value(&rate).ok(),
            format!(
                "Mileage rate {} effective {} created",
                rate.rate_per_mile, rate.effective_date
            ),
            &req,
        )
        .await;

    Ok(HttpResponse::Created().json(ApiResponse::success(rate)))
}

/// The rate effective today, if the table has one.
pub async fn current_mileage_rate(
    _claims: Claims,
    repo: web::Data<MileageRateRepository>,
) -> Result<HttpResponse, AppError> {
    let rate = repo.rate_for_date(Utc::now().date_naive()).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(rate)))
}
