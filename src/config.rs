use diesel::r2d2::{self, ConnectionManager};
use diesel::pg::PgConnection;
use std::env;
use log::warn;
use rand::{thread_rng, Rng};
use rand::distributions::Alphanumeric;

// Type aliases
pub type DbPool = r2d2::Pool<ConnectionManager<PgConnection>>;

// Database initialization SQL
pub const DB_INIT_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id SERIAL PRIMARY KEY,
    email VARCHAR(255) UNIQUE NOT NULL,
    password_hash VARCHAR(255) NOT NULL,
    role VARCHAR(20) NOT NULL DEFAULT 'user',
    first_name VARCHAR(100),
    last_name VARCHAR(100),
    phone VARCHAR(50),
    address VARCHAR(255),
    vip_status BOOLEAN NOT NULL DEFAULT FALSE,
    active BOOLEAN NOT NULL DEFAULT TRUE,
    last_login TIMESTAMP,
    created_at TIMESTAMP NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMP NOT NULL DEFAULT NOW()
);

CREATE TABLE IF NOT EXISTS refresh_tokens (
    id SERIAL PRIMARY KEY,
    user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    token VARCHAR(255) NOT NULL,
    expires_at TIMESTAMP NOT NULL,
    created_at TIMESTAMP NOT NULL DEFAULT NOW()
);

CREATE TABLE IF NOT EXISTS cars (
    id SERIAL PRIMARY KEY,
    brand VARCHAR(100) NOT NULL,
    model VARCHAR(100) NOT NULL,
    year INTEGER NOT NULL,
    vin VARCHAR(32) UNIQUE NOT NULL,
    price NUMERIC(12, 2) NOT NULL,
    mileage INTEGER NOT NULL DEFAULT 0,
    color VARCHAR(50),
    fuel_type VARCHAR(50),
    transmission VARCHAR(50),
    body_type VARCHAR(50),
    category VARCHAR(50),
    description TEXT,
    available BOOLEAN NOT NULL DEFAULT TRUE,
    rental_available BOOLEAN NOT NULL DEFAULT FALSE,
    rental_price_per_day NUMERIC(12, 2),
    test_drive_available BOOLEAN NOT NULL DEFAULT TRUE,
    images TEXT[] NOT NULL DEFAULT '{}',
    main_image VARCHAR(512),
    features TEXT[] NOT NULL DEFAULT '{}',
    created_at TIMESTAMP NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMP NOT NULL DEFAULT NOW()
);

CREATE TABLE IF NOT EXISTS orders (
    id SERIAL PRIMARY KEY,
    user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    car_id INTEGER NOT NULL REFERENCES cars(id) ON DELETE CASCADE,
    order_type VARCHAR(20) NOT NULL,
    status VARCHAR(20) NOT NULL DEFAULT 'pending',
    total_amount NUMERIC(12, 2) NOT NULL,
    payment_method VARCHAR(50),
    rental_start_date DATE,
    rental_end_date DATE,
    reservation_date DATE,
    notes TEXT,
    created_at TIMESTAMP NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMP NOT NULL DEFAULT NOW(),
    CONSTRAINT chk_rental_range CHECK (
        rental_start_date IS NULL OR rental_end_date IS NULL OR rental_start_date <= rental_end_date
    )
);

CREATE TABLE IF NOT EXISTS test_drives (
    id SERIAL PRIMARY KEY,
    user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    car_id INTEGER NOT NULL REFERENCES cars(id) ON DELETE CASCADE,
    scheduled_date TIMESTAMP NOT NULL,
    duration INTEGER NOT NULL DEFAULT 60,
    status VARCHAR(20) NOT NULL DEFAULT 'pending',
    assigned_manager_id INTEGER REFERENCES users(id) ON DELETE SET NULL,
    notes TEXT,
    feedback TEXT,
    created_at TIMESTAMP NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMP NOT NULL DEFAULT NOW()
);

CREATE TABLE IF NOT EXISTS service_appointments (
    id SERIAL PRIMARY KEY,
    user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    car_id INTEGER REFERENCES cars(id) ON DELETE SET NULL,
    customer_car_info VARCHAR(255),
    scheduled_date TIMESTAMP NOT NULL,
    service_type VARCHAR(100) NOT NULL,
    description TEXT,
    status VARCHAR(20) NOT NULL DEFAULT 'scheduled',
    estimated_cost NUMERIC(12, 2),
    final_cost NUMERIC(12, 2),
    parts_replaced TEXT[] NOT NULL DEFAULT '{}',
    mechanic_notes TEXT,
    assigned_manager_id INTEGER REFERENCES users(id) ON DELETE SET NULL,
    created_at TIMESTAMP NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMP NOT NULL DEFAULT NOW()
);

CREATE TABLE IF NOT EXISTS events (
    id SERIAL PRIMARY KEY,
    title VARCHAR(255) NOT NULL,
    description TEXT,
    event_type VARCHAR(50) NOT NULL DEFAULT 'other',
    location VARCHAR(255),
    event_date TIMESTAMP NOT NULL,
    end_date TIMESTAMP,
    registration_deadline TIMESTAMP,
    capacity INTEGER NOT NULL CHECK (capacity >= 0),
    registered_count INTEGER NOT NULL DEFAULT 0,
    vip_only BOOLEAN NOT NULL DEFAULT FALSE,
    image VARCHAR(512),
    status VARCHAR(20) NOT NULL DEFAULT 'upcoming',
    created_at TIMESTAMP NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMP NOT NULL DEFAULT NOW()
);

CREATE TABLE IF NOT EXISTS event_registrations (
    id SERIAL PRIMARY KEY,
    user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    event_id INTEGER NOT NULL REFERENCES events(id) ON DELETE CASCADE,
    guest_count INTEGER NOT NULL DEFAULT 0 CHECK (guest_count >= 0),
    status VARCHAR(20) NOT NULL DEFAULT 'registered',
    notes TEXT,
    created_at TIMESTAMP NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMP NOT NULL DEFAULT NOW()
);

CREATE UNIQUE INDEX IF NOT EXISTS uq_event_registration_active
    ON event_registrations (user_id, event_id)
    WHERE status <> 'cancelled';

CREATE TABLE IF NOT EXISTS contacts (
    id SERIAL PRIMARY KEY,
    name VARCHAR(255) NOT NULL,
    email VARCHAR(255) NOT NULL,
    phone VARCHAR(50),
    subject VARCHAR(255) NOT NULL,
    message TEXT NOT NULL,
    user_id INTEGER REFERENCES users(id) ON DELETE SET NULL,
    status VARCHAR(20) NOT NULL DEFAULT 'new',
    assigned_to INTEGER REFERENCES users(id) ON DELETE SET NULL,
    response TEXT,
    response_date TIMESTAMP,
    created_at TIMESTAMP NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMP NOT NULL DEFAULT NOW()
);

CREATE INDEX IF NOT EXISTS idx_orders_car_status ON orders (car_id, status);
CREATE INDEX IF NOT EXISTS idx_test_drives_car_date ON test_drives (car_id, scheduled_date);
CREATE INDEX IF NOT EXISTS idx_service_appointments_date ON service_appointments (scheduled_date);
"#;

const DEFAULT_JWT_SECRET: &str = "your_jwt_secret_key_here";

// Config
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub workers: usize,
    pub environment: String,
    pub jwt_secret: String,
    pub jwt_expiry: i64, // In hours
    pub refresh_expiry: i64, // In days
    pub service_bays: i64,
    pub test_drive_buffer_minutes: i64,
    pub service_slot_hours: i64,
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

impl AppConfig {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let environment = env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());

        let jwt_secret = match env::var("JWT_SECRET") {
            Ok(val) => val,
            Err(e) => {
                warn!("Failed to load JWT_SECRET: {}", e);
                warn!("Using default JWT secret - THIS IS NOT SECURE FOR PRODUCTION!");
                DEFAULT_JWT_SECRET.to_string()
            }
        };

        Self {
            database_url: env::var("DATABASE_URL").unwrap_or_default(),
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env_or("PORT", 8080),
            workers: env_or("WORKERS", 2),
            environment,
            jwt_secret,
            jwt_expiry: env_or("JWT_EXPIRY_HOURS", 24),
            refresh_expiry: env_or("REFRESH_EXPIRY_DAYS", 30),
            service_bays: env_or("SERVICE_BAYS", 3),
            test_drive_buffer_minutes: env_or("TEST_DRIVE_BUFFER_MINUTES", 60),
            service_slot_hours: env_or("SERVICE_SLOT_HOURS", 3),
        }
    }

    pub fn is_production(&self) -> bool {
        self.environment.eq_ignore_ascii_case("production")
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.database_url.is_empty() {
            return Err("DATABASE_URL must be set".to_string());
        }

        if self.jwt_secret == DEFAULT_JWT_SECRET {
            if self.is_production() {
                return Err("JWT_SECRET must be set in production".to_string());
            }
            warn!("Using default JWT secret is not secure for production!");
        }

        if self.jwt_expiry <= 0 {
            return Err("JWT_EXPIRY_HOURS must be positive".to_string());
        }

        if self.refresh_expiry <= 0 {
            return Err("REFRESH_EXPIRY_DAYS must be positive".to_string());
        }

        if self.workers == 0 {
            return Err("WORKERS must be positive".to_string());
        }

        if self.service_bays <= 0 {
            return Err("SERVICE_BAYS must be positive".to_string());
        }

        if self.test_drive_buffer_minutes < 0 {
            return Err("TEST_DRIVE_BUFFER_MINUTES must not be negative".to_string());
        }

        if self.service_slot_hours <= 0 {
            return Err("SERVICE_SLOT_HOURS must be positive".to_string());
        }

        Ok(())
    }

    pub fn generate_secure_secret() -> String {
        thread_rng()
            .sample_iter(&Alphanumeric)
            .take(32)
            .map(char::from)
            .collect()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_url: String::new(),
            host: "127.0.0.1".to_string(),
            port: 8080,
            workers: 2,
            environment: "development".to_string(),
            jwt_secret: Self::generate_secure_secret(),
            jwt_expiry: 24,
            refresh_expiry: 30,
            service_bays: 3,
            test_drive_buffer_minutes: 60,
            service_slot_hours: 3,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> AppConfig {
        AppConfig {
            database_url: "postgres://localhost/dealership".to_string(),
            ..AppConfig::default()
        }
    }

    #[test]
    fn default_config_with_database_url_is_valid() {
        assert!(valid().validate().is_ok());
    }

    #[test]
    fn rejects_non_positive_values() {
        let cfg = AppConfig { jwt_expiry: 0, ..valid() };
        assert!(cfg.validate().is_err());

        let cfg = AppConfig { service_bays: 0, ..valid() };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn default_secret_is_rejected_in_production() {
        let cfg = AppConfig {
            environment: "production".to_string(),
            jwt_secret: DEFAULT_JWT_SECRET.to_string(),
            ..valid()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn generated_secret_is_alphanumeric() {
        let secret = AppConfig::generate_secure_secret();
        assert_eq!(secret.len(), 32);
        assert!(secret.chars().all(|c| c.is_ascii_alphanumeric()));
    }
}
