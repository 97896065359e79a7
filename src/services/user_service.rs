use chrono::Utc;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use log::{debug, info};

use crate::config::DbPool;
use crate::db;
use crate::errors::ApiError;
use crate::models::*;
use crate::services::AuthService;

const MIN_PASSWORD_LEN: usize = 8;

pub struct UserService;

fn ensure_active(user: User) -> Result<User, ApiError> {
    if user.active {
        Ok(user)
    } else {
        debug!("Booking refused: account {} is disabled", user.id);
        Err(ApiError::ForbiddenError("Account is disabled".to_string()))
    }
}

impl UserService {
    /// Loads the caller for a write; a disabled account is refused even while
    /// its access token is still valid.
    pub(crate) fn load_active(conn: &mut PgConnection, user_id: i32) -> Result<User, ApiError> {
        use crate::schema::users::dsl::*;
        let user = users
            .find(user_id)
            .select(User::as_select())
            .first(conn)
            .optional()?
            .ok_or_else(|| ApiError::AuthError("Account no longer exists".to_string()))?;
        ensure_active(user)
    }

    pub async fn find_by_email(email_addr: &str, pool: &DbPool) -> Result<Option<User>, ApiError> {
        let email_copy = email_addr.trim().to_lowercase();
        db::run(pool, move |conn| {
            use crate::schema::users::dsl::*;
            users
                .filter(email.eq(email_copy))
                .select(User::as_select())
                .first(conn)
                .optional()
                .map_err(ApiError::from)
        })
        .await
    }

    pub async fn create_user(req: RegisterRequest, role: Role, pool: &DbPool) -> Result<User, ApiError> {
        let email = req.email.trim().to_lowercase();
        if !email.contains('@') {
            return Err(ApiError::validation("A valid email address is required"));
        }
        if req.password.len() < MIN_PASSWORD_LEN {
            return Err(ApiError::validation(format!(
                "Password must be at least {} characters",
                MIN_PASSWORD_LEN
            )));
        }

        let password_hash = AuthService::hash_password(&req.password)?;
        let new_user = NewUser {
            email,
            password_hash,
            role,
            first_name: req.first_name,
            last_name: req.last_name,
            phone: req.phone,
            address: req.address,
        };

        let user = db::run(pool, move |conn| {
            use crate::schema::users::dsl::*;
            diesel::insert_into(users)
                .values(&new_user)
                .returning(User::as_returning())
                .get_result(conn)
                .map_err(|e| match e {
                    DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                        debug!("Attempted to create user with existing email: {}", new_user.email);
                        ApiError::validation("Email already exists")
                    }
                    other => ApiError::from(other),
                })
        })
        .await?;

        info!("Created new user with ID: {}", user.id);
        Ok(user)
    }

    pub async fn get_user_by_id(user_id: i32, pool: &DbPool) -> Result<User, ApiError> {
        db::run(pool, move |conn| {
            use crate::schema::users::dsl::*;
            users
                .find(user_id)
                .select(User::as_select())
                .first(conn)
                .optional()?
                .ok_or_else(|| ApiError::not_found("User"))
        })
        .await
    }

    pub async fn list_users(filter: UserFilter, pool: &DbPool) -> Result<Vec<User>, ApiError> {
        db::run(pool, move |conn| {
            use crate::schema::users::dsl::*;
            let mut query = users.select(User::as_select()).into_boxed();
            if let Some(r) = filter.role {
                query = query.filter(role.eq(r));
            }
            if let Some(a) = filter.active {
                query = query.filter(active.eq(a));
            }
            query.order(created_at.desc()).load(conn).map_err(ApiError::from)
        })
        .await
    }

    pub async fn update_profile(user_id: i32, changes: ProfileUpdate, pool: &DbPool) -> Result<User, ApiError> {
        db::run(pool, move |conn| {
            use crate::schema::users::dsl::*;
            diesel::update(users.find(user_id))
                .set((&changes, updated_at.eq(Utc::now().naive_utc())))
                .returning(User::as_returning())
                .get_result(conn)
                .optional()?
                .ok_or_else(|| ApiError::not_found("User"))
        })
        .await
    }

    pub async fn admin_update(user_id: i32, changes: AdminUserUpdate, pool: &DbPool) -> Result<User, ApiError> {
        let user = db::run(pool, move |conn| {
            use crate::schema::users::dsl::*;
            diesel::update(users.find(user_id))
                .set((&changes, updated_at.eq(Utc::now().naive_utc())))
                .returning(User::as_returning())
                .get_result(conn)
                .optional()?
                .ok_or_else(|| ApiError::not_found("User"))
        })
        .await?;

        info!(
            "User {} updated by admin: role={}, vip={}, active={}",
            user.id, user.role, user.vip_status, user.active
        );
        Ok(user)
    }

    pub async fn delete_user(user_id: i32, pool: &DbPool) -> Result<(), ApiError> {
        let deleted = db::run(pool, move |conn| {
            use crate::schema::users::dsl::*;
            diesel::delete(users.find(user_id)).execute(conn).map_err(ApiError::from)
        })
        .await?;

        if deleted == 0 {
            return Err(ApiError::not_found("User"));
        }
        info!("Deleted user {}", user_id);
        Ok(())
    }
}
