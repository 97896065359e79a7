use actix_web::{delete, get, put, web, HttpResponse};
use serde_json::json;

use crate::auth::AuthenticatedUser;
use crate::config::DbPool;
use crate::errors::ApiError;
use crate::models::{AdminUserUpdate, Role, UserFilter};
use crate::services::UserService;

#[get("/users")]
async fn list_users(
    user: AuthenticatedUser,
    pool: web::Data<DbPool>,
    query: web::Query<UserFilter>,
) -> Result<HttpResponse, ApiError> {
    user.require(Role::Admin)?;
    let users = UserService::list_users(query.into_inner(), &pool).await?;
    Ok(HttpResponse::Ok().json(users))
}

#[get("/users/{id}")]
async fn get_user(
    user: AuthenticatedUser,
    pool: web::Data<DbPool>,
    path: web::Path<i32>,
) -> Result<HttpResponse, ApiError> {
    user.require(Role::Admin)?;
    let found = UserService::get_user_by_id(path.into_inner(), &pool).await?;
    Ok(HttpResponse::Ok().json(found))
}

#[put("/users/{id}")]
async fn update_user(
    user: AuthenticatedUser,
    pool: web::Data<DbPool>,
    path: web::Path<i32>,
    body: web::Json<AdminUserUpdate>,
) -> Result<HttpResponse, ApiError> {
    user.require(Role::Admin)?;
    let updated = UserService::admin_update(path.into_inner(), body.into_inner(), &pool).await?;
    Ok(HttpResponse::Ok().json(updated))
}

#[delete("/users/{id}")]
async fn delete_user(
    user: AuthenticatedUser,
    pool: web::Data<DbPool>,
    path: web::Path<i32>,
) -> Result<HttpResponse, ApiError> {
    user.require(Role::Admin)?;
    let target = path.into_inner();
    if target == user.user_id {
        return Err(ApiError::validation("You cannot delete your own account"));
    }
    UserService::delete_user(target, &pool).await?;
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "User deleted successfully"
    })))
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(list_users)
        .service(get_user)
        .service(update_user)
        .service(delete_user);
}
