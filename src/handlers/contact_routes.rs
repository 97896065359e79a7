use actix_web::{delete, get, post, put, web, HttpResponse};
use serde_json::json;

use crate::auth::AuthenticatedUser;
use crate::config::DbPool;
use crate::errors::ApiError;
use crate::models::{
    AssignContactRequest, ContactFilter, CreateContactRequest, RespondContactRequest, Role,
    UpdateContactStatusRequest,
};
use crate::services::ContactService;

/// Open to visitors; a valid token links the request to the account.
#[post("/contacts")]
async fn submit_contact(
    user: Option<AuthenticatedUser>,
    pool: web::Data<DbPool>,
    body: web::Json<CreateContactRequest>,
) -> Result<HttpResponse, ApiError> {
    let contact = ContactService::submit(body.into_inner(), user.map(|u| u.user_id), &pool).await?;
    Ok(HttpResponse::Created().json(contact))
}

#[get("/contacts")]
async fn list_contacts(
    user: AuthenticatedUser,
    pool: web::Data<DbPool>,
    query: web::Query<ContactFilter>,
) -> Result<HttpResponse, ApiError> {
    user.require(Role::Manager)?;
    let contacts = ContactService::list_contacts(query.into_inner(), &pool).await?;
    Ok(HttpResponse::Ok().json(contacts))
}

#[get("/contacts/{id}")]
async fn get_contact(
    user: AuthenticatedUser,
    pool: web::Data<DbPool>,
    path: web::Path<i32>,
) -> Result<HttpResponse, ApiError> {
    user.require(Role::Manager)?;
    let contact = ContactService::get_contact(path.into_inner(), &pool).await?;
    Ok(HttpResponse::Ok().json(contact))
}

#[put("/contacts/{id}/assign")]
async fn assign_contact(
    user: AuthenticatedUser,
    pool: web::Data<DbPool>,
    path: web::Path<i32>,
    body: web::Json<AssignContactRequest>,
) -> Result<HttpResponse, ApiError> {
    user.require(Role::Manager)?;
    let contact = ContactService::assign(path.into_inner(), body.assigned_to, &pool).await?;
    Ok(HttpResponse::Ok().json(contact))
}

#[put("/contacts/{id}/respond")]
async fn respond_contact(
    user: AuthenticatedUser,
    pool: web::Data<DbPool>,
    path: web::Path<i32>,
    body: web::Json<RespondContactRequest>,
) -> Result<HttpResponse, ApiError> {
    user.require(Role::Manager)?;
    let contact = ContactService::respond(path.into_inner(), body.into_inner().response, &pool).await?;
    Ok(HttpResponse::Ok().json(contact))
}

#[put("/contacts/{id}/status")]
async fn update_contact_status(
    user: AuthenticatedUser,
    pool: web::Data<DbPool>,
    path: web::Path<i32>,
    body: web::Json<UpdateContactStatusRequest>,
) -> Result<HttpResponse, ApiError> {
    user.require(Role::Manager)?;
    let contact = ContactService::update_status(path.into_inner(), body.status, &pool).await?;
    Ok(HttpResponse::Ok().json(contact))
}

#[delete("/contacts/{id}")]
async fn delete_contact(
    user: AuthenticatedUser,
    pool: web::Data<DbPool>,
    path: web::Path<i32>,
) -> Result<HttpResponse, ApiError> {
    user.require(Role::Admin)?;
    ContactService::delete_contact(path.into_inner(), &pool).await?;
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Contact deleted successfully"
    })))
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(submit_contact)
        .service(list_contacts)
        .service(get_contact)
        .service(assign_contact)
        .service(respond_contact)
        .service(update_contact_status)
        .service(delete_contact);
}
