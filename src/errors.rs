use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use serde_json::json;
use log::{warn, error, debug};
use std::sync::OnceLock;
use thiserror::Error;

static EXPOSE_DETAILS: OnceLock<bool> = OnceLock::new();

/// Controls whether 5xx responses carry the underlying error message.
/// Set once at start-up; defaults to hiding details.
pub fn set_expose_error_details(expose: bool) {
    let _ = EXPOSE_DETAILS.set(expose);
}

fn expose_details() -> bool {
    EXPOSE_DETAILS.get().copied().unwrap_or(false)
}

// Custom error handling
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Validation error: {0}")]
    ValidationError(String),
    #[error("Authentication error: {0}")]
    AuthError(String),
    #[error("Permission denied: {0}")]
    ForbiddenError(String),
    #[error("Not found: {0}")]
    NotFoundError(String),
    #[error("Internal server error: {0}")]
    InternalError(String),
}

impl ApiError {
    pub fn validation(msg: impl Into<String>) -> Self {
        ApiError::ValidationError(msg.into())
    }

    pub fn not_found(what: &str) -> Self {
        ApiError::NotFoundError(format!("{} not found", what))
    }

    fn server_error_body(msg: &str) -> serde_json::Value {
        if expose_details() {
            json!({ "error": "Internal server error", "details": msg })
        } else {
            json!({ "error": "Internal server error" })
        }
    }
}

pub const CONCURRENT_BOOKING: &str = "Concurrent booking detected, please retry";

impl From<diesel::result::Error> for ApiError {
    fn from(e: diesel::result::Error) -> Self {
        use diesel::result::{DatabaseErrorKind, Error};

        match e {
            Error::NotFound => ApiError::NotFoundError("Record not found".to_string()),
            // Raised by any statement of a SERIALIZABLE transaction, not only the commit.
            Error::DatabaseError(DatabaseErrorKind::SerializationFailure, info) => {
                error!("Serialization failure: {}", info.message());
                ApiError::DatabaseError(CONCURRENT_BOOKING.to_string())
            }
            other => ApiError::DatabaseError(other.to_string()),
        }
    }
}

impl From<r2d2::Error> for ApiError {
    fn from(e: r2d2::Error) -> Self {
        error!("Failed to get database connection: {}", e);
        ApiError::DatabaseError(e.to_string())
    }
}

impl From<actix_web::error::BlockingError> for ApiError {
    fn from(e: actix_web::error::BlockingError) -> Self {
        error!("Database operation error: {}", e);
        ApiError::InternalError(e.to_string())
    }
}

impl ResponseError for ApiError {
    fn error_response(&self) -> HttpResponse {
        match self {
            ApiError::DatabaseError(msg) => {
                error!("\x1B[1;31mDATABASE ERROR:\x1B[0m {}", msg);
                HttpResponse::InternalServerError().json(Self::server_error_body(msg))
            },
            ApiError::ValidationError(msg) => {
                warn!("\x1B[1;33mVALIDATION ERROR:\x1B[0m {}", msg);
                HttpResponse::BadRequest().json(json!({ "error": msg }))
            },
            ApiError::AuthError(msg) => {
                warn!("\x1B[1;33mAUTHENTICATION ERROR:\x1B[0m {}", msg);
                HttpResponse::Unauthorized().json(json!({ "error": msg }))
            },
            ApiError::ForbiddenError(msg) => {
                warn!("\x1B[1;33mPERMISSION DENIED:\x1B[0m {}", msg);
                HttpResponse::Forbidden().json(json!({ "error": msg }))
            },
            ApiError::NotFoundError(msg) => {
                debug!("\x1B[1;36mNOT FOUND ERROR:\x1B[0m {}", msg);
                HttpResponse::NotFound().json(json!({ "error": msg }))
            },
            ApiError::InternalError(msg) => {
                error!("\x1B[1;31mINTERNAL SERVER ERROR:\x1B[0m {}", msg);
                HttpResponse::InternalServerError().json(Self::server_error_body(msg))
            },
        }
    }

    fn status_code(&self) -> StatusCode {
        match *self {
            ApiError::DatabaseError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::ValidationError(_) => StatusCode::BAD_REQUEST,
            ApiError::AuthError(_) => StatusCode::UNAUTHORIZED,
            ApiError::ForbiddenError(_) => StatusCode::FORBIDDEN,
            ApiError::NotFoundError(_) => StatusCode::NOT_FOUND,
            ApiError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_follow_taxonomy() {
        assert_eq!(ApiError::validation("x").status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::not_found("Car").status_code(), StatusCode::NOT_FOUND);
        assert_eq!(ApiError::ForbiddenError("x".into()).status_code(), StatusCode::FORBIDDEN);
        assert_eq!(ApiError::AuthError("x".into()).status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(ApiError::DatabaseError("x".into()).status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn diesel_not_found_maps_to_not_found() {
        let err: ApiError = diesel::result::Error::NotFound.into();
        assert!(matches!(err, ApiError::NotFoundError(_)));
    }

    #[test]
    fn serialization_failure_maps_to_retry_message() {
        let raw = diesel::result::Error::DatabaseError(
            diesel::result::DatabaseErrorKind::SerializationFailure,
            Box::new("could not serialize access due to read/write dependencies".to_string()),
        );
        let err: ApiError = raw.into();
        assert!(matches!(err, ApiError::DatabaseError(ref msg) if msg == CONCURRENT_BOOKING));
    }

    #[test]
    fn not_found_message_names_entity() {
        assert_eq!(ApiError::not_found("Event").to_string(), "Not found: Event not found");
    }
}
