pub mod auth;
pub mod booking;
pub mod config;
pub mod db;
pub mod errors;
pub mod handlers;
pub mod logger;
pub mod middleware;
pub mod models;
pub mod schema;
pub mod services;

pub use crate::config::{AppConfig, DbPool};
pub use crate::errors::ApiError;
