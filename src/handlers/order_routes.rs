use actix_web::{delete, get, post, put, web, HttpResponse};
use serde_json::json;

use crate::auth::AuthenticatedUser;
use crate::config::DbPool;
use crate::errors::ApiError;
use crate::models::{CreateOrderRequest, OrderFilter, Role, UpdateOrderStatusRequest};
use crate::services::OrderService;

#[post("/orders")]
async fn create_order(
    user: AuthenticatedUser,
    pool: web::Data<DbPool>,
    body: web::Json<CreateOrderRequest>,
) -> Result<HttpResponse, ApiError> {
    let order = OrderService::create_order(user.user_id, body.into_inner(), &pool).await?;
    Ok(HttpResponse::Created().json(order))
}

#[get("/orders/my")]
async fn my_orders(user: AuthenticatedUser, pool: web::Data<DbPool>) -> Result<HttpResponse, ApiError> {
    let orders = OrderService::list_for_user(user.user_id, &pool).await?;
    Ok(HttpResponse::Ok().json(orders))
}

#[get("/orders")]
async fn list_orders(
    user: AuthenticatedUser,
    pool: web::Data<DbPool>,
    query: web::Query<OrderFilter>,
) -> Result<HttpResponse, ApiError> {
    user.require(Role::Manager)?;
    let orders = OrderService::list_orders(query.into_inner(), &pool).await?;
    Ok(HttpResponse::Ok().json(orders))
}

#[get("/orders/{id}")]
async fn get_order(
    user: AuthenticatedUser,
    pool: web::Data<DbPool>,
    path: web::Path<i32>,
) -> Result<HttpResponse, ApiError> {
    let order = OrderService::get_order(path.into_inner(), &pool).await?;
    user.require_owner_or_staff(order.user_id)?;
    Ok(HttpResponse::Ok().json(order))
}

#[put("/orders/{id}/status")]
async fn update_status(
    user: AuthenticatedUser,
    pool: web::Data<DbPool>,
    path: web::Path<i32>,
    body: web::Json<UpdateOrderStatusRequest>,
) -> Result<HttpResponse, ApiError> {
    user.require(Role::Manager)?;
    let order = OrderService::update_status(path.into_inner(), body.into_inner(), &pool).await?;
    Ok(HttpResponse::Ok().json(order))
}

#[put("/orders/{id}/cancel")]
async fn cancel_order(
    user: AuthenticatedUser,
    pool: web::Data<DbPool>,
    path: web::Path<i32>,
) -> Result<HttpResponse, ApiError> {
    let order = OrderService::cancel_own(path.into_inner(), user.user_id, &pool).await?;
    Ok(HttpResponse::Ok().json(order))
}

#[delete("/orders/{id}")]
async fn delete_order(
    user: AuthenticatedUser,
    pool: web::Data<DbPool>,
    path: web::Path<i32>,
) -> Result<HttpResponse, ApiError> {
    user.require(Role::Admin)?;
    OrderService::delete_order(path.into_inner(), &pool).await?;
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Order deleted successfully"
    })))
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(create_order)
        .service(my_orders)
        .service(list_orders)
        .service(get_order)
        .service(update_status)
        .service(cancel_order)
        .service(delete_order);
}
