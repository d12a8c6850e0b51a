use actix_web::{HttpRequest, HttpResponse, web};

use crate::AppState;
use crate::database::models::{
    ActionType, ChangePasswordInput, CreateUserInput, EntityType, LoginInput, UserInfo,
};
use crate::database::repositories::UserRepository;
use crate::error::AppError;
use crate::handlers::shared::ApiResponse;
use crate::services::auth::Claims;

pub async fn register(
    state: web::Data<AppState>,
    input: web::Json<CreateUserInput>,
    req: HttpRequest,
) -> Result<HttpResponse, AppError> {
    let response = state
        .auth_service
        .register(input.into_inner())
        .await
        .map_err(|err| AppError::BadRequest(err.to_string()))?;

    state
        .activity_logger
        .log(
            Some(response.user.id),
            ActionType::REGISTERED,
            EntityType::USER,
            Some(response.user.id),
            None,
            None,
            format!("User {} registered", response.user.email),
            &req,
        )
        .await;

    Ok(HttpResponse::Created().json(ApiResponse::success(response)))
}

pub async fn login(
    state: web::Data<AppState>,
    input: web::Json<LoginInput>,
    req: HttpRequest,
) -> Result<HttpResponse, AppError> {
    let response = state
        .auth_service
        .login(input.into_inner())
        .await
        .map_err(|_| AppError::Unauthorized)?;

    state
        .activity_logger
        .log(
            Some(response.user.id),
            ActionType::LOGIN,
            EntityType::USER,
            Some(response.user.id),
            None,
            None,
            format!("User {} logged in", response.user.email),
            &req,
        )
        .await;

    Ok(HttpResponse::Ok().json(ApiResponse::success(response)))
}

pub async fn me(
    claims: Claims,
    user_repo: web::Data<UserRepository>,
) -> Result<HttpResponse, AppError> {
    let user = user_repo
        .find_by_id(claims.sub)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {}", claims.sub)))?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(UserInfo::from(user))))
}

pub async fn change_password(
    claims: Claims,
    state: web::Data<AppState>,
    input: web::Json<ChangePasswordInput>,
    req: HttpRequest,
) -> Result<HttpResponse, AppError> {
    state
        .auth_service
        .change_password(claims.sub, &input.current_password, &input.new_password)
        .await
        .map_err(|err| AppError::BadRequest(err.to_string()))?;

    state
        .activity_logger
        .log(
            Some(claims.sub),
            ActionType::PASSWORD_CHANGED,
            EntityType::USER,
            Some(claims.sub),
            None,
            None,
            "Password changed",
            &req,
        )
        .await;

    Ok(HttpResponse::Ok().json(ApiResponse::<()>::success_with_message(
        None,
        "Password changed",
    )))
}
