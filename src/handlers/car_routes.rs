use actix_web::{delete, get, post, put, web, HttpResponse};
use serde::Deserialize;
use serde_json::json;

use crate::auth::AuthenticatedUser;
use crate::booking::BookingMode;
use crate::config::DbPool;
use crate::errors::ApiError;
use crate::models::{CarFilter, CreateCarRequest, MainImageRequest, Role, UpdateCarRequest};
use crate::services::CarService;

#[derive(Deserialize)]
struct BookableQuery {
    mode: BookingMode,
}

#[get("/cars")]
async fn list_cars(pool: web::Data<DbPool>, query: web::Query<CarFilter>) -> Result<HttpResponse, ApiError> {
    let page = CarService::list_cars(query.into_inner(), &pool).await?;
    Ok(HttpResponse::Ok().json(page))
}

#[get("/cars/bookable")]
async fn list_bookable(
    pool: web::Data<DbPool>,
    query: web::Query<BookableQuery>,
) -> Result<HttpResponse, ApiError> {
    let cars = CarService::list_bookable(query.mode, &pool).await?;
    Ok(HttpResponse::Ok().json(cars))
}

#[get("/cars/{id}")]
async fn get_car(pool: web::Data<DbPool>, path: web::Path<i32>) -> Result<HttpResponse, ApiError> {
    let car = CarService::get_car(path.into_inner(), &pool).await?;
    Ok(HttpResponse::Ok().json(car))
}

#[post("/cars")]
async fn create_car(
    user: AuthenticatedUser,
    pool: web::Data<DbPool>,
    body: web::Json<CreateCarRequest>,
) -> Result<HttpResponse, ApiError> {
    user.require(Role::Manager)?;
    let car = CarService::create_car(body.into_inner(), &pool).await?;
    Ok(HttpResponse::Created().json(car))
}

#[put("/cars/{id}")]
async fn update_car(
    user: AuthenticatedUser,
    pool: web::Data<DbPool>,
    path: web::Path<i32>,
    body: web::Json<UpdateCarRequest>,
) -> Result<HttpResponse, ApiError> {
    user.require(Role::Manager)?;
    let car = CarService::update_car(path.into_inner(), body.into_inner(), &pool).await?;
    Ok(HttpResponse::Ok().json(car))
}

#[put("/cars/{id}/main-image")]
async fn set_main_image(
    user: AuthenticatedUser,
    pool: web::Data<DbPool>,
    path: web::Path<i32>,
    body: web::Json<MainImageRequest>,
) -> Result<HttpResponse, ApiError> {
    user.require(Role::Manager)?;
    let car = CarService::set_main_image(path.into_inner(), body.main_image_index, &pool).await?;
    Ok(HttpResponse::Ok().json(car))
}

#[delete("/cars/{id}")]
async fn delete_car(
    user: AuthenticatedUser,
    pool: web::Data<DbPool>,
    path: web::Path<i32>,
) -> Result<HttpResponse, ApiError> {
    user.require(Role::Admin)?;
    CarService::delete_car(path.into_inner(), &pool).await?;
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Car deleted successfully"
    })))
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    // Literal segments before `{id}`.
    cfg.service(list_cars)
        .service(list_bookable)
        .service(get_car)
        .service(create_car)
        .service(update_car)
        .service(set_main_image)
        .service(delete_car);
}
