use bcrypt::{hash, verify, DEFAULT_COST};
use chrono::{Duration, Utc};
use diesel::prelude::*;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use log::{debug, error, info};
use uuid::Uuid;

use crate::config::{AppConfig, DbPool};
use crate::db;
use crate::errors::ApiError;
use crate::models::*;
use crate::services::UserService;

pub struct AuthService;

impl AuthService {
    pub fn hash_password(password: &str) -> Result<String, ApiError> {
        hash(password, DEFAULT_COST)
            .map_err(|e| {
                error!("Failed to hash password: {}", e);
                ApiError::InternalError("Failed to hash password".to_string())
            })
    }

    pub fn verify_password(password: &str, hash: &str) -> Result<bool, ApiError> {
        verify(password, hash)
            .map_err(|e| {
                error!("Failed to verify password: {}", e);
                ApiError::InternalError("Failed to verify password".to_string())
            })
    }

    pub fn generate_token(user: &User, config: &AppConfig) -> Result<String, ApiError> {
        let now = Utc::now();
        let iat = now.timestamp() as usize;
        let exp = (now + Duration::hours(config.jwt_expiry)).timestamp() as usize;

        let claims = Claims {
            sub: user.id.to_string(),
            exp,
            iat,
            user_id: user.id,
            email: user.email.clone(),
            role: user.role,
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(config.jwt_secret.as_bytes())
        )
        .map_err(|e| {
            error!("Failed to generate token: {}", e);
            ApiError::InternalError("Failed to generate token".to_string())
        })
    }

    pub fn decode_token(token: &str, config: &AppConfig) -> Result<Claims, ApiError> {
        decode::<Claims>(
            token,
            &DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            &Validation::default(),
        )
        .map(|data| data.claims)
        .map_err(|e| {
            debug!("Rejected token: {}", e);
            ApiError::AuthError("Invalid or expired token".to_string())
        })
    }

    pub fn generate_refresh_token() -> String {
        Uuid::new_v4().to_string()
    }

    pub async fn store_refresh_token(
        user_id: i32,
        token: &str,
        config: &AppConfig,
        pool: &DbPool
    ) -> Result<(), ApiError> {
        let expires_at = (Utc::now() + Duration::days(config.refresh_expiry)).naive_utc();

        let new_token = NewRefreshToken {
            user_id,
            token: token.to_string(),
            expires_at,
        };

        db::run(pool, move |conn| {
            use crate::schema::refresh_tokens::dsl::*;
            diesel::insert_into(refresh_tokens)
                .values(&new_token)
                .execute(conn)
                .map_err(|e| {
                    error!("Failed to store refresh token: {}", e);
                    ApiError::from(e)
                })
        })
        .await?;

        Ok(())
    }

    pub async fn update_last_login(user_id_param: i32, pool: &DbPool) -> Result<(), ApiError> {
        db::run(pool, move |conn| {
            use crate::schema::users::dsl::*;
            diesel::update(users.find(user_id_param))
                .set(last_login.eq(Some(Utc::now().naive_utc())))
                .execute(conn)
                .map_err(ApiError::from)
        })
        .await?;

        Ok(())
    }

    pub async fn purge_expired_tokens(pool: &DbPool) -> Result<usize, ApiError> {
        let purged = db::run(pool, move |conn| {
            use crate::schema::refresh_tokens::dsl::*;
            diesel::delete(refresh_tokens.filter(expires_at.le(Utc::now().naive_utc())))
                .execute(conn)
                .map_err(ApiError::from)
        })
        .await?;

        if purged > 0 {
            info!("Purged {} expired refresh token(s)", purged);
        }
        Ok(purged)
    }

    async fn issue_session(user: User, config: &AppConfig, pool: &DbPool) -> Result<LoginResponse, ApiError> {
        let token = Self::generate_token(&user, config)?;
        let refresh_token = Self::generate_refresh_token();
        Self::store_refresh_token(user.id, &refresh_token, config, pool).await?;
        Ok(LoginResponse { token, refresh_token, user })
    }

    pub async fn register(req: RegisterRequest, config: &AppConfig, pool: &DbPool) -> Result<LoginResponse, ApiError> {
        let user = UserService::create_user(req, Role::User, pool).await?;
        Self::issue_session(user, config, pool).await
    }

    pub async fn login(req: &LoginRequest, config: &AppConfig, pool: &DbPool) -> Result<LoginResponse, ApiError> {
        let user = match UserService::find_by_email(&req.email, pool).await? {
            Some(user) => user,
            None => {
                debug!("Login failed: User not found with email {}", req.email);
                return Err(ApiError::AuthError("Invalid credentials".to_string()));
            },
        };

        if !Self::verify_password(&req.password, &user.password_hash)? {
            debug!("Login failed: Invalid password for user {}", req.email);
            return Err(ApiError::AuthError("Invalid credentials".to_string()));
        }

        if !user.active {
            debug!("Login failed: account {} is disabled", req.email);
            return Err(ApiError::ForbiddenError("Account is disabled".to_string()));
        }

        Self::update_last_login(user.id, pool).await?;
        info!("User {} logged in successfully", user.email);
        Self::issue_session(user, config, pool).await
    }

    /// Exchanges a live refresh token for a new session; the old token is
    /// deleted in the same step.
    pub async fn refresh(refresh: &str, config: &AppConfig, pool: &DbPool) -> Result<LoginResponse, ApiError> {
        let token_str = refresh.to_string();

        let record = db::run(pool, move |conn| {
            use crate::schema::refresh_tokens::dsl::*;
            let record = refresh_tokens
                .filter(token.eq(&token_str))
                .filter(expires_at.gt(Utc::now().naive_utc()))
                .select(RefreshToken::as_select())
                .first(conn)
                .optional()?;
            if let Some(found) = &record {
                diesel::delete(refresh_tokens.find(found.id)).execute(conn)?;
            }
            Ok(record)
        })
        .await?
        .ok_or_else(|| ApiError::AuthError("Invalid or expired refresh token".to_string()))?;

        let user = UserService::get_user_by_id(record.user_id, pool).await?;
        if !user.active {
            return Err(ApiError::ForbiddenError("Account is disabled".to_string()));
        }

        info!("Token refreshed for user {}", user.email);
        Self::issue_session(user, config, pool).await
    }
}
