//! End-to-end booking scenarios against a real Postgres.
//!
//! Run with `TEST_DATABASE_URL=postgres://... cargo test -- --ignored`.
//! Every test truncates all tables, so they are serialised.

use chrono::{Duration, NaiveDate, NaiveDateTime, Utc};
use diesel::connection::SimpleConnection;
use diesel::prelude::*;
use rust_decimal_macros::dec;
use serial_test::serial;

use dealership::config::{AppConfig, DbPool};
use dealership::db::{create_pool, init_schema};
use dealership::errors::ApiError;
use dealership::models::*;
use dealership::services::{
    CarService, EventService, OrderService, ServiceAppointmentService, TestDriveService, UserService,
};

fn setup() -> DbPool {
    let url = std::env::var("TEST_DATABASE_URL").expect("TEST_DATABASE_URL must be set");
    let pool = create_pool(&url).unwrap();
    init_schema(&pool).unwrap();
    pool.get()
        .unwrap()
        .batch_execute(
            "TRUNCATE contacts, event_registrations, events, service_appointments, \
             test_drives, orders, cars, refresh_tokens, users RESTART IDENTITY CASCADE",
        )
        .unwrap();
    pool
}

async fn customer(email: &str, pool: &DbPool) -> User {
    let req = RegisterRequest {
        email: email.to_string(),
        password: "correct-horse".to_string(),
        first_name: None,
        last_name: None,
        phone: None,
        address: None,
    };
    UserService::create_user(req, Role::User, pool).await.unwrap()
}

async fn car(vin: &str, pool: &DbPool) -> Car {
    let req: CreateCarRequest = serde_json::from_value(serde_json::json!({
        "brand": "Skoda",
        "model": "Octavia",
        "year": 2023,
        "vin": vin,
        "price": "31000",
        "rentalAvailable": true,
        "rentalPricePerDay": "80",
        "images": ["front.jpg", "side.jpg"]
    }))
    .unwrap();
    CarService::create_car(req, pool).await.unwrap()
}

fn date(m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2031, m, d).unwrap()
}

fn future_at(hour: u32) -> NaiveDateTime {
    (Utc::now() + Duration::days(30)).date_naive().and_hms_opt(hour, 0, 0).unwrap()
}

fn order(car_id: i32, kind: OrderType) -> CreateOrderRequest {
    CreateOrderRequest {
        car_id,
        order_type: kind,
        total_amount: None,
        payment_method: None,
        rental_start_date: None,
        rental_end_date: None,
        reservation_date: None,
        notes: None,
    }
}

fn rental(car_id: i32, start: NaiveDate, end: NaiveDate) -> CreateOrderRequest {
    CreateOrderRequest {
        rental_start_date: Some(start),
        rental_end_date: Some(end),
        ..order(car_id, OrderType::Rental)
    }
}

#[actix_web::test]
#[serial]
#[ignore]
async fn purchase_locks_car_until_cancelled() {
    let pool = setup();
    let alice = customer("alice@example.com", &pool).await;
    let bob = customer("bob@example.com", &pool).await;
    let octavia = car("VIN-PURCHASE-1", &pool).await;
    assert_eq!(octavia.main_image.as_deref(), Some("front.jpg"));

    let first = OrderService::create_order(alice.id, order(octavia.id, OrderType::Purchase), &pool)
        .await
        .unwrap();
    assert_eq!(first.total_amount, dec!(31000));
    assert!(!CarService::get_car(octavia.id, &pool).await.unwrap().available);

    let second = OrderService::create_order(bob.id, order(octavia.id, OrderType::Purchase), &pool).await;
    assert!(matches!(second, Err(ApiError::ValidationError(_))));

    let cancelled = OrderService::cancel_own(first.id, alice.id, &pool).await.unwrap();
    assert_eq!(cancelled.status, OrderStatus::Cancelled);
    assert!(CarService::get_car(octavia.id, &pool).await.unwrap().available);

    // Cancelling again changes nothing and does not error.
    let again = OrderService::cancel_own(first.id, alice.id, &pool).await.unwrap();
    assert_eq!(again.status, OrderStatus::Cancelled);

    OrderService::create_order(bob.id, order(octavia.id, OrderType::Purchase), &pool)
        .await
        .unwrap();
}

fn mark_unavailable(car_id: i32, pool: &DbPool) {
    use dealership::schema::cars::dsl::*;
    diesel::update(cars.find(car_id))
        .set(available.eq(false))
        .execute(&mut pool.get().unwrap())
        .unwrap();
}

fn advance(status: OrderStatus) -> UpdateOrderStatusRequest {
    UpdateOrderStatusRequest { status, notes: None }
}

#[actix_web::test]
#[serial]
#[ignore]
async fn completing_a_rental_releases_the_car() {
    let pool = setup();
    let alice = customer("alice@example.com", &pool).await;
    let octavia = car("VIN-RENTAL-DONE", &pool).await;

    let booked = OrderService::create_order(alice.id, rental(octavia.id, date(5, 1), date(5, 3)), &pool)
        .await
        .unwrap();
    mark_unavailable(octavia.id, &pool);

    let confirmed = OrderService::update_status(booked.id, advance(OrderStatus::Confirmed), &pool)
        .await
        .unwrap();
    assert_eq!(confirmed.status, OrderStatus::Confirmed);
    assert!(!CarService::get_car(octavia.id, &pool).await.unwrap().available);

    let completed = OrderService::update_status(booked.id, advance(OrderStatus::Completed), &pool)
        .await
        .unwrap();
    assert_eq!(completed.status, OrderStatus::Completed);
    assert!(CarService::get_car(octavia.id, &pool).await.unwrap().available);

    let reopened = OrderService::update_status(booked.id, advance(OrderStatus::Pending), &pool).await;
    assert!(matches!(reopened, Err(ApiError::ValidationError(_))));
}

#[actix_web::test]
#[serial]
#[ignore]
async fn completing_a_reservation_releases_the_car() {
    let pool = setup();
    let alice = customer("alice@example.com", &pool).await;
    let octavia = car("VIN-RESERVE-DONE", &pool).await;

    let held = OrderService::create_order(
        alice.id,
        CreateOrderRequest {
            reservation_date: Some(date(8, 14)),
            ..order(octavia.id, OrderType::Reservation)
        },
        &pool,
    )
    .await
    .unwrap();
    mark_unavailable(octavia.id, &pool);

    OrderService::update_status(held.id, advance(OrderStatus::Confirmed), &pool).await.unwrap();
    OrderService::update_status(held.id, advance(OrderStatus::Completed), &pool).await.unwrap();
    assert!(CarService::get_car(octavia.id, &pool).await.unwrap().available);
}

#[actix_web::test]
#[serial]
#[ignore]
async fn disabled_account_cannot_book_with_live_token() {
    let pool = setup();
    let alice = customer("alice@example.com", &pool).await;
    let octavia = car("VIN-DISABLED-1", &pool).await;
    {
        use dealership::schema::users::dsl::*;
        diesel::update(users.find(alice.id))
            .set(active.eq(false))
            .execute(&mut pool.get().unwrap())
            .unwrap();
    }

    let refused = OrderService::create_order(alice.id, order(octavia.id, OrderType::Purchase), &pool).await;
    assert!(matches!(refused, Err(ApiError::ForbiddenError(_))));
    assert!(CarService::get_car(octavia.id, &pool).await.unwrap().available);
}

#[actix_web::test]
#[serial]
#[ignore]
async fn overlapping_rentals_are_rejected() {
    let pool = setup();
    let alice = customer("alice@example.com", &pool).await;
    let octavia = car("VIN-RENTAL-1", &pool).await;

    let booked = OrderService::create_order(alice.id, rental(octavia.id, date(6, 1), date(6, 10)), &pool)
        .await
        .unwrap();
    assert_eq!(booked.total_amount, dec!(720));

    let overlap = OrderService::create_order(alice.id, rental(octavia.id, date(6, 5), date(6, 15)), &pool).await;
    assert!(matches!(overlap, Err(ApiError::ValidationError(_))));

    OrderService::create_order(alice.id, rental(octavia.id, date(6, 11), date(6, 20)), &pool)
        .await
        .unwrap();
}

#[actix_web::test]
#[serial]
#[ignore]
async fn test_drives_keep_a_buffer() {
    let pool = setup();
    let config = AppConfig::default();
    let alice = customer("alice@example.com", &pool).await;
    let octavia = car("VIN-DRIVE-1", &pool).await;

    let booking = |at: NaiveDateTime| CreateTestDriveRequest {
        car_id: octavia.id,
        scheduled_date: at,
        duration: None,
        notes: None,
    };

    TestDriveService::create_test_drive(alice.id, booking(future_at(10)), &config, &pool)
        .await
        .unwrap();

    let clash = TestDriveService::create_test_drive(alice.id, booking(future_at(11)), &config, &pool).await;
    assert!(matches!(clash, Err(ApiError::ValidationError(_))));

    TestDriveService::create_test_drive(alice.id, booking(future_at(13)), &config, &pool)
        .await
        .unwrap();
}

#[actix_web::test]
#[serial]
#[ignore]
async fn service_bays_fill_up() {
    let pool = setup();
    let config = AppConfig::default();
    let alice = customer("alice@example.com", &pool).await;

    let visit = |at: NaiveDateTime| CreateServiceAppointmentRequest {
        car_id: None,
        customer_car_info: Some("VW Golf 2015".to_string()),
        scheduled_date: at,
        service_type: "inspection".to_string(),
        description: None,
        estimated_cost: None,
    };

    for _ in 0..config.service_bays {
        ServiceAppointmentService::create_appointment(alice.id, visit(future_at(9)), &config, &pool)
            .await
            .unwrap();
    }

    let full = ServiceAppointmentService::create_appointment(alice.id, visit(future_at(10)), &config, &pool).await;
    assert!(matches!(full, Err(ApiError::ValidationError(_))));

    // Back-to-back with the 09:00 slot.
    ServiceAppointmentService::create_appointment(alice.id, visit(future_at(12)), &config, &pool)
        .await
        .unwrap();
}

#[actix_web::test]
#[serial]
#[ignore]
async fn event_seats_are_counted_with_guests() {
    let pool = setup();
    let alice = customer("alice@example.com", &pool).await;
    let bob = customer("bob@example.com", &pool).await;

    let event = EventService::create_event(
        CreateEventRequest {
            title: "Launch evening".to_string(),
            description: None,
            event_type: None,
            location: None,
            event_date: future_at(18),
            end_date: None,
            registration_deadline: None,
            capacity: 3,
            vip_only: false,
            image: None,
        },
        &pool,
    )
    .await
    .unwrap();

    let with_guest = || RegisterForEventRequest { guest_count: 1, notes: None };

    let reg = EventService::register(event.id, alice.id, with_guest(), &pool).await.unwrap();
    assert_eq!(EventService::get_event(event.id, &pool).await.unwrap().registered_count, 2);

    let no_room = EventService::register(event.id, bob.id, with_guest(), &pool).await;
    assert!(matches!(no_room, Err(ApiError::ValidationError(_))));

    let duplicate = EventService::register(event.id, alice.id, RegisterForEventRequest::default(), &pool).await;
    assert!(matches!(duplicate, Err(ApiError::ValidationError(_))));

    EventService::cancel_registration(reg.id, alice.id, &pool).await.unwrap();
    EventService::cancel_registration(reg.id, alice.id, &pool).await.unwrap();
    assert_eq!(EventService::get_event(event.id, &pool).await.unwrap().registered_count, 0);

    EventService::register(event.id, bob.id, with_guest(), &pool).await.unwrap();
    let report = EventService::reconcile(event.id, &pool).await.unwrap();
    assert_eq!(report.stored_count, 2);
    assert_eq!(report.live_count, 2);
}
