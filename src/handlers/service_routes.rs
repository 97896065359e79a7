use actix_web::{delete, get, post, put, web, HttpResponse};
use serde_json::json;

use crate::auth::AuthenticatedUser;
use crate::config::{AppConfig, DbPool};
use crate::errors::ApiError;
use crate::models::{
    CreateServiceAppointmentRequest, Role, ServiceAppointmentFilter, UpdateServiceStatusRequest,
};
use crate::services::ServiceAppointmentService;

#[post("/service-appointments")]
async fn book_appointment(
    user: AuthenticatedUser,
    pool: web::Data<DbPool>,
    config: web::Data<AppConfig>,
    body: web::Json<CreateServiceAppointmentRequest>,
) -> Result<HttpResponse, ApiError> {
    let appointment =
        ServiceAppointmentService::create_appointment(user.user_id, body.into_inner(), &config, &pool).await?;
    Ok(HttpResponse::Created().json(appointment))
}

#[get("/service-appointments/my")]
async fn my_appointments(user: AuthenticatedUser, pool: web::Data<DbPool>) -> Result<HttpResponse, ApiError> {
    let appointments = ServiceAppointmentService::list_for_user(user.user_id, &pool).await?;
    Ok(HttpResponse::Ok().json(appointments))
}

#[get("/service-appointments")]
async fn list_appointments(
    user: AuthenticatedUser,
    pool: web::Data<DbPool>,
    query: web::Query<ServiceAppointmentFilter>,
) -> Result<HttpResponse, ApiError> {
    user.require(Role::Manager)?;
    let appointments = ServiceAppointmentService::list_appointments(query.into_inner(), &pool).await?;
    Ok(HttpResponse::Ok().json(appointments))
}

#[get("/service-appointments/{id}")]
async fn get_appointment(
    user: AuthenticatedUser,
    pool: web::Data<DbPool>,
    path: web::Path<i32>,
) -> Result<HttpResponse, ApiError> {
    let appointment = ServiceAppointmentService::get_appointment(path.into_inner(), &pool).await?;
    user.require_owner_or_staff(appointment.user_id)?;
    Ok(HttpResponse::Ok().json(appointment))
}

#[put("/service-appointments/{id}/status")]
async fn update_status(
    user: AuthenticatedUser,
    pool: web::Data<DbPool>,
    path: web::Path<i32>,
    body: web::Json<UpdateServiceStatusRequest>,
) -> Result<HttpResponse, ApiError> {
    user.require(Role::Manager)?;
    let appointment =
        ServiceAppointmentService::update_status(path.into_inner(), body.into_inner(), user.user_id, &pool).await?;
    Ok(HttpResponse::Ok().json(appointment))
}

#[put("/service-appointments/{id}/cancel")]
async fn cancel_appointment(
    user: AuthenticatedUser,
    pool: web::Data<DbPool>,
    path: web::Path<i32>,
) -> Result<HttpResponse, ApiError> {
    let appointment = ServiceAppointmentService::cancel_own(path.into_inner(), user.user_id, &pool).await?;
    Ok(HttpResponse::Ok().json(appointment))
}

#[delete("/service-appointments/{id}")]
async fn delete_appointment(
    user: AuthenticatedUser,
    pool: web::Data<DbPool>,
    path: web::Path<i32>,
) -> Result<HttpResponse, ApiError> {
    user.require(Role::Admin)?;
    ServiceAppointmentService::delete_appointment(path.into_inner(), &pool).await?;
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Service appointment deleted successfully"
    })))
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(book_appointment)
        .service(my_appointments)
        .service(list_appointments)
        .service(get_appointment)
        .service(update_status)
        .service(cancel_appointment)
        .service(delete_appointment);
}
