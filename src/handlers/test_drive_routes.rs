use actix_web::{delete, get, post, put, web, HttpResponse};
use serde_json::json;

use crate::auth::AuthenticatedUser;
use crate::config::{AppConfig, DbPool};
use crate::errors::ApiError;
use crate::models::{CreateTestDriveRequest, Role, TestDriveFilter, UpdateTestDriveStatusRequest};
use crate::services::TestDriveService;

#[post("/test-drives")]
async fn book_test_drive(
    user: AuthenticatedUser,
    pool: web::Data<DbPool>,
    config: web::Data<AppConfig>,
    body: web::Json<CreateTestDriveRequest>,
) -> Result<HttpResponse, ApiError> {
    let drive = TestDriveService::create_test_drive(user.user_id, body.into_inner(), &config, &pool).await?;
    Ok(HttpResponse::Created().json(drive))
}

#[get("/test-drives/my")]
async fn my_test_drives(user: AuthenticatedUser, pool: web::Data<DbPool>) -> Result<HttpResponse, ApiError> {
    let drives = TestDriveService::list_for_user(user.user_id, &pool).await?;
    Ok(HttpResponse::Ok().json(drives))
}

#[get("/test-drives")]
async fn list_test_drives(
    user: AuthenticatedUser,
    pool: web::Data<DbPool>,
    query: web::Query<TestDriveFilter>,
) -> Result<HttpResponse, ApiError> {
    user.require(Role::Manager)?;
    let drives = TestDriveService::list_test_drives(query.into_inner(), &pool).await?;
    Ok(HttpResponse::Ok().json(drives))
}

#[get("/test-drives/{id}")]
async fn get_test_drive(
    user: AuthenticatedUser,
    pool: web::Data<DbPool>,
    path: web::Path<i32>,
) -> Result<HttpResponse, ApiError> {
    let drive = TestDriveService::get_test_drive(path.into_inner(), &pool).await?;
    user.require_owner_or_staff(drive.user_id)?;
    Ok(HttpResponse::Ok().json(drive))
}

#[put("/test-drives/{id}/status")]
async fn update_status(
    user: AuthenticatedUser,
    pool: web::Data<DbPool>,
    path: web::Path<i32>,
    body: web::Json<UpdateTestDriveStatusRequest>,
) -> Result<HttpResponse, ApiError> {
    user.require(Role::Manager)?;
    let drive = TestDriveService::update_status(path.into_inner(), body.into_inner(), user.user_id, &pool).await?;
    Ok(HttpResponse::Ok().json(drive))
}

#[put("/test-drives/{id}/cancel")]
async fn cancel_test_drive(
    user: AuthenticatedUser,
    pool: web::Data<DbPool>,
    path: web::Path<i32>,
) -> Result<HttpResponse, ApiError> {
    let drive = TestDriveService::cancel_own(path.into_inner(), user.user_id, &pool).await?;
    Ok(HttpResponse::Ok().json(drive))
}

#[delete("/test-drives/{id}")]
async fn delete_test_drive(
    user: AuthenticatedUser,
    pool: web::Data<DbPool>,
    path: web::Path<i32>,
) -> Result<HttpResponse, ApiError> {
    user.require(Role::Admin)?;
    TestDriveService::delete_test_drive(path.into_inner(), &pool).await?;
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Test drive deleted successfully"
    })))
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(book_test_drive)
        .service(my_test_drives)
        .service(list_test_drives)
        .service(get_test_drive)
        .service(update_status)
        .service(cancel_test_drive)
        .service(delete_test_drive);
}
