use actix_web::{dev::Payload, http::header, web, FromRequest, HttpRequest};
use log::{debug, error};
use std::future::{ready, Ready};

use crate::config::AppConfig;
use crate::errors::ApiError;
use crate::models::Role;
use crate::services::AuthService;

/// Caller identity taken from a `Bearer` token.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user_id: i32,
    pub email: String,
    pub role: Role,
}

impl AuthenticatedUser {
    pub fn require(&self, role: Role) -> Result<(), ApiError> {
        if self.role.at_least(role) {
            Ok(())
        } else {
            debug!("User {} ({}) denied: {} required", self.user_id, self.role, role);
            Err(ApiError::ForbiddenError("Insufficient permissions".to_string()))
        }
    }

    pub fn is_staff(&self) -> bool {
        self.role.at_least(Role::Manager)
    }

    /// Owners see their own records; managers and admins see everyone's.
    pub fn require_owner_or_staff(&self, owner_id: i32) -> Result<(), ApiError> {
        if self.user_id == owner_id || self.is_staff() {
            Ok(())
        } else {
            Err(ApiError::ForbiddenError("Access denied".to_string()))
        }
    }
}

fn bearer_token(req: &HttpRequest) -> Option<&str> {
    req.headers()
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

fn authenticate(req: &HttpRequest) -> Result<AuthenticatedUser, ApiError> {
    let config = req.app_data::<web::Data<AppConfig>>().ok_or_else(|| {
        error!("AppConfig missing from app data");
        ApiError::InternalError("Server misconfigured".to_string())
    })?;

    let token = bearer_token(req)
        .ok_or_else(|| ApiError::AuthError("Missing or malformed Authorization header".to_string()))?;

    let claims = AuthService::decode_token(token, config)?;
    Ok(AuthenticatedUser {
        user_id: claims.user_id,
        email: claims.email,
        role: claims.role,
    })
}

impl FromRequest for AuthenticatedUser {
    type Error = ApiError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(authenticate(req))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn caller(role: Role) -> AuthenticatedUser {
        AuthenticatedUser { user_id: 7, email: "x@example.com".to_string(), role }
    }

    #[test]
    fn roles_are_ordered() {
        assert!(caller(Role::Admin).require(Role::Manager).is_ok());
        assert!(caller(Role::Manager).require(Role::Manager).is_ok());
        assert!(matches!(
            caller(Role::User).require(Role::Manager),
            Err(ApiError::ForbiddenError(_))
        ));
    }

    #[test]
    fn owner_or_staff() {
        assert!(caller(Role::User).require_owner_or_staff(7).is_ok());
        assert!(caller(Role::User).require_owner_or_staff(8).is_err());
        assert!(caller(Role::Manager).require_owner_or_staff(8).is_ok());
    }

    #[actix_web::test]
    async fn extracts_valid_bearer_token() {
        use crate::models::User;
        use chrono::NaiveDate;

        let config = AppConfig::default();
        let ts = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap().and_hms_opt(0, 0, 0).unwrap();
        let user = User {
            id: 3,
            email: "m@example.com".to_string(),
            password_hash: String::new(),
            role: Role::Manager,
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
        let token = AuthService::generate_token(&user, &config).unwrap();

        let req = actix_web::test::TestRequest::default()
            .app_data(web::Data::new(config))
            .insert_header((header::AUTHORIZATION, format!("Bearer {}", token)))
            .to_http_request();
        let caller = authenticate(&req).unwrap();
        assert_eq!(caller.user_id, 3);
        assert_eq!(caller.role, Role::Manager);
    }

    #[actix_web::test]
    async fn missing_header_is_unauthorized() {
        let req = actix_web::test::TestRequest::default()
            .app_data(web::Data::new(AppConfig::default()))
            .to_http_request();
        assert!(matches!(authenticate(&req), Err(ApiError::AuthError(_))));
    }
}
