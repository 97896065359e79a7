use actix_web::{get, post, put, web, HttpResponse};
use log::debug;

use crate::auth::AuthenticatedUser;
use crate::config::{AppConfig, DbPool};
use crate::errors::ApiError;
use crate::models::{LoginRequest, ProfileUpdate, RefreshRequest, RegisterRequest};
use crate::services::{AuthService, UserService};

#[post("/auth/register")]
async fn register(
    pool: web::Data<DbPool>,
    config: web::Data<AppConfig>,
    body: web::Json<RegisterRequest>,
) -> Result<HttpResponse, ApiError> {
    debug!("Registration attempt for: {}", body.email);
    let session = AuthService::register(body.into_inner(), &config, &pool).await?;
    Ok(HttpResponse::Created().json(session))
}

#[post("/auth/login")]
async fn login(
    pool: web::Data<DbPool>,
    config: web::Data<AppConfig>,
    body: web::Json<LoginRequest>,
) -> Result<HttpResponse, ApiError> {
    debug!("Login attempt for user: {}", body.email);
    let session = AuthService::login(&body, &config, &pool).await?;
    Ok(HttpResponse::Ok().json(session))
}

#[post("/auth/refresh")]
async fn refresh(
    pool: web::Data<DbPool>,
    config: web::Data<AppConfig>,
    body: web::Json<RefreshRequest>,
) -> Result<HttpResponse, ApiError> {
    if body.refresh_token.trim().is_empty() {
        return Err(ApiError::validation("Refresh token is required"));
    }
    let session = AuthService::refresh(&body.refresh_token, &config, &pool).await?;
    Ok(HttpResponse::Ok().json(session))
}

#[get("/auth/me")]
async fn me(user: AuthenticatedUser, pool: web::Data<DbPool>) -> Result<HttpResponse, ApiError> {
    let profile = UserService::get_user_by_id(user.user_id, &pool).await?;
    Ok(HttpResponse::Ok().json(profile))
}

#[put("/auth/me")]
async fn update_me(
    user: AuthenticatedUser,
    pool: web::Data<DbPool>,
    body: web::Json<ProfileUpdate>,
) -> Result<HttpResponse, ApiError> {
    let profile = UserService::update_profile(user.user_id, body.into_inner(), &pool).await?;
    Ok(HttpResponse::Ok().json(profile))
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(register)
        .service(login)
        .service(refresh)
        .service(me)
        .service(update_me);
}
