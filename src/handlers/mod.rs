use actix_web::{get, web, HttpResponse, Responder};
use serde_json::json;

pub mod auth_routes;
pub mod car_routes;
pub mod contact_routes;
pub mod event_routes;
pub mod order_routes;
pub mod service_routes;
pub mod test_drive_routes;
pub mod user_routes;

#[get("/health")]
async fn health_check() -> impl Responder {
    HttpResponse::Ok().json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

/// Mounts every route; call inside the `/api` scope.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(health_check);
    auth_routes::configure(cfg);
    user_routes::configure(cfg);
    car_routes::configure(cfg);
    order_routes::configure(cfg);
    test_drive_routes::configure(cfg);
    service_routes::configure(cfg);
    event_routes::configure(cfg);
    contact_routes::configure(cfg);
}
