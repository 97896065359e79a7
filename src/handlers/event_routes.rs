use actix_web::{delete, get, post, put, web, HttpResponse};
use serde_json::json;

use crate::auth::AuthenticatedUser;
use crate::config::DbPool;
use crate::errors::ApiError;
use crate::models::{
    CreateEventRequest, EventFilter, RegisterForEventRequest, Role, UpdateEventRequest, UpdateEventStatusRequest,
};
use crate::services::EventService;

#[get("/events")]
async fn list_events(pool: web::Data<DbPool>, query: web::Query<EventFilter>) -> Result<HttpResponse, ApiError> {
    let events = EventService::list_events(query.into_inner(), &pool).await?;
    Ok(HttpResponse::Ok().json(events))
}

#[get("/events/{id}")]
async fn get_event(pool: web::Data<DbPool>, path: web::Path<i32>) -> Result<HttpResponse, ApiError> {
    let event = EventService::get_event(path.into_inner(), &pool).await?;
    Ok(HttpResponse::Ok().json(event))
}

#[post("/events")]
async fn create_event(
    user: AuthenticatedUser,
    pool: web::Data<DbPool>,
    body: web::Json<CreateEventRequest>,
) -> Result<HttpResponse, ApiError> {
    user.require(Role::Manager)?;
    let event = EventService::create_event(body.into_inner(), &pool).await?;
    Ok(HttpResponse::Created().json(event))
}

#[put("/events/{id}")]
async fn update_event(
    user: AuthenticatedUser,
    pool: web::Data<DbPool>,
    path: web::Path<i32>,
    body: web::Json<UpdateEventRequest>,
) -> Result<HttpResponse, ApiError> {
    user.require(Role::Manager)?;
    let event = EventService::update_event(path.into_inner(), body.into_inner(), &pool).await?;
    Ok(HttpResponse::Ok().json(event))
}

#[put("/events/{id}/status")]
async fn update_event_status(
    user: AuthenticatedUser,
    pool: web::Data<DbPool>,
    path: web::Path<i32>,
    body: web::Json<UpdateEventStatusRequest>,
) -> Result<HttpResponse, ApiError> {
    user.require(Role::Manager)?;
    let event = EventService::update_status(path.into_inner(), body.status, &pool).await?;
    Ok(HttpResponse::Ok().json(event))
}

#[delete("/events/{id}")]
async fn delete_event(
    user: AuthenticatedUser,
    pool: web::Data<DbPool>,
    path: web::Path<i32>,
) -> Result<HttpResponse, ApiError> {
    user.require(Role::Admin)?;
    EventService::delete_event(path.into_inner(), &pool).await?;
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Event deleted successfully"
    })))
}

#[post("/events/{id}/register")]
async fn register_for_event(
    user: AuthenticatedUser,
    pool: web::Data<DbPool>,
    path: web::Path<i32>,
    body: web::Bytes,
) -> Result<HttpResponse, ApiError> {
    let req = RegisterForEventRequest::from_body(&body).map_err(ApiError::ValidationError)?;
    let registration = EventService::register(path.into_inner(), user.user_id, req, &pool).await?;
    Ok(HttpResponse::Created().json(registration))
}

#[get("/events/{id}/registrations")]
async fn event_registrations(
    user: AuthenticatedUser,
    pool: web::Data<DbPool>,
    path: web::Path<i32>,
) -> Result<HttpResponse, ApiError> {
    user.require(Role::Manager)?;
    let registrations = EventService::list_registrations(path.into_inner(), &pool).await?;
    Ok(HttpResponse::Ok().json(registrations))
}

#[post("/events/{id}/reconcile")]
async fn reconcile_event(
    user: AuthenticatedUser,
    pool: web::Data<DbPool>,
    path: web::Path<i32>,
) -> Result<HttpResponse, ApiError> {
    user.require(Role::Admin)?;
    let report = EventService::reconcile(path.into_inner(), &pool).await?;
    Ok(HttpResponse::Ok().json(report))
}

#[get("/registrations/my")]
async fn my_registrations(user: AuthenticatedUser, pool: web::Data<DbPool>) -> Result<HttpResponse, ApiError> {
    let registrations = EventService::list_for_user(user.user_id, &pool).await?;
    Ok(HttpResponse::Ok().json(registrations))
}

#[put("/registrations/{id}/cancel")]
async fn cancel_registration(
    user: AuthenticatedUser,
    pool: web::Data<DbPool>,
    path: web::Path<i32>,
) -> Result<HttpResponse, ApiError> {
    let registration = EventService::cancel_registration(path.into_inner(), user.user_id, &pool).await?;
    Ok(HttpResponse::Ok().json(registration))
}

#[put("/registrations/{id}/attend")]
async fn mark_attended(
    user: AuthenticatedUser,
    pool: web::Data<DbPool>,
    path: web::Path<i32>,
) -> Result<HttpResponse, ApiError> {
    user.require(Role::Manager)?;
    let registration = EventService::mark_attended(path.into_inner(), &pool).await?;
    Ok(HttpResponse::Ok().json(registration))
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(list_events)
        .service(get_event)
        .service(create_event)
        .service(update_event)
        .service(update_event_status)
        .service(delete_event)
        .service(register_for_event)
        .service(event_registrations)
        .service(reconcile_event)
        .service(my_registrations)
        .service(cancel_registration)
        .service(mark_attended);
}
