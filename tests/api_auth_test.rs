//! HTTP-level checks that resolve before any query runs: authentication,
//! role gating and request validation. The pool is built unchecked and never
//! connects.

use actix_web::http::{header, StatusCode};
use actix_web::{test, web, App};
use chrono::NaiveDate;
use diesel::pg::PgConnection;
use diesel::r2d2::{ConnectionManager, Pool};
use serde_json::{json, Value};

use dealership::config::{AppConfig, DbPool};
use dealership::handlers;
use dealership::middleware::{RequestLogger, REQUEST_ID_HEADER};
use dealership::models::{Role, User};
use dealership::services::AuthService;

fn offline_pool() -> DbPool {
    Pool::builder()
        .max_size(1)
        .min_idle(Some(0))
        .build_unchecked(ConnectionManager::<PgConnection>::new("postgres://nobody@127.0.0.1:1/none"))
}

fn token_for(role: Role, config: &AppConfig) -> String {
    let ts = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap().and_hms_opt(0, 0, 0).unwrap();
    let user = User {
        id: 11,
        email: format!("{}@example.com", role),
        password_hash: String::new(),
        role,
        first_name: None,
        last_name: None,
        phone: None,
        address: None,
        vip_status: false,
        active: true,
        last_login: None,
        created_at: ts,
        updated_at: ts,
    };
    AuthService::generate_token(&user, config).unwrap()
}

macro_rules! app {
    ($config:expr) => {
        test::init_service(
            App::new()
                .wrap(RequestLogger)
                .app_data(web::Data::new(offline_pool()))
                .app_data(web::Data::new($config.clone()))
                .service(web::scope("/api").configure(handlers::configure)),
        )
        .await
    };
}

#[actix_web::test]
async fn health_reports_ok_and_echoes_request_id() {
    let config = AppConfig::default();
    let app = app!(config);

    let req = test::TestRequest::get()
        .uri("/api/health")
        .insert_header((REQUEST_ID_HEADER, "abc123"))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers().get(REQUEST_ID_HEADER).unwrap(), "abc123");
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], "ok");
}

#[actix_web::test]
async fn protected_route_without_token_is_unauthorized() {
    let config = AppConfig::default();
    let app = app!(config);

    let req = test::TestRequest::get().uri("/api/orders/my").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn token_from_another_secret_is_unauthorized() {
    let config = AppConfig::default();
    let app = app!(config);
    let foreign = token_for(Role::Admin, &AppConfig::default());

    let req = test::TestRequest::get()
        .uri("/api/users")
        .insert_header((header::AUTHORIZATION, format!("Bearer {}", foreign)))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn customers_cannot_reach_staff_routes() {
    let config = AppConfig::default();
    let app = app!(config);
    let bearer = format!("Bearer {}", token_for(Role::User, &config));

    for (method, uri) in [
        ("GET", "/api/orders"),
        ("GET", "/api/test-drives"),
        ("GET", "/api/service-appointments"),
        ("GET", "/api/contacts"),
        ("GET", "/api/events/1/registrations"),
        ("PUT", "/api/registrations/1/attend"),
    ] {
        let req = match method {
            "GET" => test::TestRequest::get(),
            _ => test::TestRequest::put(),
        }
        .uri(uri)
        .insert_header((header::AUTHORIZATION, bearer.clone()))
        .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN, "{} {}", method, uri);
    }
}

#[actix_web::test]
async fn managers_cannot_delete() {
    let config = AppConfig::default();
    let app = app!(config);

    let req = test::TestRequest::delete()
        .uri("/api/cars/1")
        .insert_header((header::AUTHORIZATION, format!("Bearer {}", token_for(Role::Manager, &config))))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn rental_without_dates_is_rejected() {
    let config = AppConfig::default();
    let app = app!(config);

    let req = test::TestRequest::post()
        .uri("/api/orders")
        .insert_header((header::AUTHORIZATION, format!("Bearer {}", token_for(Role::User, &config))))
        .set_json(json!({ "carId": 1, "orderType": "rental" }))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "Rental orders require a start and end date");
}

#[actix_web::test]
async fn test_drive_in_the_past_is_rejected() {
    let config = AppConfig::default();
    let app = app!(config);

    let req = test::TestRequest::post()
        .uri("/api/test-drives")
        .insert_header((header::AUTHORIZATION, format!("Bearer {}", token_for(Role::User, &config))))
        .set_json(json!({ "carId": 1, "scheduledDate": "2020-01-01T10:00:00" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn service_appointment_needs_a_vehicle() {
    let config = AppConfig::default();
    let app = app!(config);

    let req = test::TestRequest::post()
        .uri("/api/service-appointments")
        .insert_header((header::AUTHORIZATION, format!("Bearer {}", token_for(Role::User, &config))))
        .set_json(json!({ "scheduledDate": "2030-01-01T10:00:00", "serviceType": "oil change" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn contact_form_validates_email_without_login() {
    let config = AppConfig::default();
    let app = app!(config);

    let req = test::TestRequest::post()
        .uri("/api/contacts")
        .set_json(json!({
            "name": "Ana",
            "email": "not-an-email",
            "subject": "Financing",
            "message": "Do you offer leasing?"
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn unknown_booking_mode_is_rejected() {
    let config = AppConfig::default();
    let app = app!(config);

    let req = test::TestRequest::get().uri("/api/cars/bookable?mode=spaceship").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn malformed_guest_count_is_rejected() {
    let config = AppConfig::default();
    let app = app!(config);

    for payload in [r#"{"guestCount": "4"}"#, r#"{"guestCount": 4.5}"#, r#"{"guestCount": 4"#] {
        let req = test::TestRequest::post()
            .uri("/api/events/1/register")
            .insert_header((header::AUTHORIZATION, format!("Bearer {}", token_for(Role::User, &config))))
            .insert_header((header::CONTENT_TYPE, "application/json"))
            .set_payload(payload)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "payload {}", payload);
    }
}

#[actix_web::test]
async fn far_future_bookings_are_rejected() {
    let config = AppConfig::default();
    let app = app!(config);
    let token = format!("Bearer {}", token_for(Role::User, &config));

    let drive = test::TestRequest::post()
        .uri("/api/test-drives")
        .insert_header((header::AUTHORIZATION, token.clone()))
        .set_json(json!({ "carId": 1, "scheduledDate": "+262142-12-31T23:00:00" }))
        .to_request();
    let resp = test::call_service(&app, drive).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "Scheduled date out of range");

    let visit = test::TestRequest::post()
        .uri("/api/service-appointments")
        .insert_header((header::AUTHORIZATION, token))
        .set_json(json!({
            "customerCarInfo": "VW Golf 2015",
            "scheduledDate": "+262142-12-31T23:00:00",
            "serviceType": "inspection"
        }))
        .to_request();
    let resp = test::call_service(&app, visit).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "Scheduled date out of range");
}
