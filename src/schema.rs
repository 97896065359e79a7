// Database schema definitions
diesel::table! {
    users (id) {
        id -> Int4,
        email -> Varchar,
        password_hash -> Varchar,
        role -> Varchar,
        first_name -> Nullable<Varchar>,
        last_name -> Nullable<Varchar>,
        phone -> Nullable<Varchar>,
        address -> Nullable<Varchar>,
        vip_status -> Bool,
        active -> Bool,
        last_login -> Nullable<Timestamp>,
        created_at -> Timestamp,
        updated_at -> Timestamp,
    }
}

diesel::table! {
    refresh_tokens (id) {
        id -> Int4,
        user_id -> Int4,
        token -> Varchar,
        expires_at -> Timestamp,
        created_at -> Timestamp,
    }
}

diesel::table! {
    cars (id) {
        id -> Int4,
        brand -> Varchar,
        model -> Varchar,
        year -> Int4,
        vin -> Varchar,
        price -> Numeric,
        mileage -> Int4,
        color -> Nullable<Varchar>,
        fuel_type -> Nullable<Varchar>,
        transmission -> Nullable<Varchar>,
        body_type -> Nullable<Varchar>,
        category -> Nullable<Varchar>,
        description -> Nullable<Text>,
        available -> Bool,
        rental_available -> Bool,
        rental_price_per_day -> Nullable<Numeric>,
        test_drive_available -> Bool,
        images -> Array<Text>,
        main_image -> Nullable<Varchar>,
        features -> Array<Text>,
        created_at -> Timestamp,
        updated_at -> Timestamp,
    }
}

diesel::table! {
    orders (id) {
        id -> Int4,
        user_id -> Int4,
        car_id -> Int4,
        order_type -> Varchar,
        status -> Varchar,
        total_amount -> Numeric,
        payment_method -> Nullable<Varchar>,
        rental_start_date -> Nullable<Date>,
        rental_end_date -> Nullable<Date>,
        reservation_date -> Nullable<Date>,
        notes -> Nullable<Text>,
        created_at -> Timestamp,
        updated_at -> Timestamp,
    }
}

diesel::table! {
    test_drives (id) {
        id -> Int4,
        user_id -> Int4,
        car_id -> Int4,
        scheduled_date -> Timestamp,
        duration -> Int4,
        status -> Varchar,
        assigned_manager_id -> Nullable<Int4>,
        notes -> Nullable<Text>,
        feedback -> Nullable<Text>,
        created_at -> Timestamp,
        updated_at -> Timestamp,
    }
}

diesel::table! {
    service_appointments (id) {
        id -> Int4,
        user_id -> Int4,
        car_id -> Nullable<Int4>,
        customer_car_info -> Nullable<Varchar>,
        scheduled_date -> Timestamp,
        service_type -> Varchar,
        description -> Nullable<Text>,
        status -> Varchar,
        estimated_cost -> Nullable<Numeric>,
        final_cost -> Nullable<Numeric>,
        parts_replaced -> Array<Text>,
        mechanic_notes -> Nullable<Text>,
        assigned_manager_id -> Nullable<Int4>,
        created_at -> Timestamp,
        updated_at -> Timestamp,
    }
}

diesel::table! {
    events (id) {
        id -> Int4,
        title -> Varchar,
        description -> Nullable<Text>,
        event_type -> Varchar,
        location -> Nullable<Varchar>,
        event_date -> Timestamp,
        end_date -> Nullable<Timestamp>,
        registration_deadline -> Nullable<Timestamp>,
        capacity -> Int4,
        registered_count -> Int4,
        vip_only -> Bool,
        image -> Nullable<Varchar>,
        status -> Varchar,
        created_at -> Timestamp,
        updated_at -> Timestamp,
    }
}

diesel::table! {
    event_registrations (id) {
        id -> Int4,
        user_id -> Int4,
        event_id -> Int4,
        guest_count -> Int4,
        status -> Varchar,
        notes -> Nullable<Text>,
        created_at -> Timestamp,
        updated_at -> Timestamp,
    }
}

diesel::table! {
    contacts (id) {
        id -> Int4,
        name -> Varchar,
        email -> Varchar,
        phone -> Nullable<Varchar>,
        subject -> Varchar,
        message -> Text,
        user_id -> Nullable<Int4>,
        status -> Varchar,
        assigned_to -> Nullable<Int4>,
        response -> Nullable<Text>,
        response_date -> Nullable<Timestamp>,
        created_at -> Timestamp,
        updated_at -> Timestamp,
    }
}

diesel::joinable!(refresh_tokens -> users (user_id));
diesel::joinable!(orders -> users (user_id));
diesel::joinable!(orders -> cars (car_id));
diesel::joinable!(test_drives -> cars (car_id));
diesel::joinable!(service_appointments -> cars (car_id));
diesel::joinable!(event_registrations -> events (event_id));
diesel::joinable!(event_registrations -> users (user_id));

diesel::allow_tables_to_appear_in_same_query!(
    users, refresh_tokens, cars, orders, test_drives,
    service_appointments, events, event_registrations, contacts,
);
