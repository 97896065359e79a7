use actix_web::web;
use diesel::connection::SimpleConnection;
use diesel::pg::PgConnection;
use diesel::r2d2::{self, ConnectionManager};
use diesel::result::Error as DieselError;
use diesel::Connection;
use log::{error, info};

use crate::config::{DbPool, DB_INIT_SQL};
use crate::errors::ApiError;

pub fn create_pool(database_url: &str) -> Result<DbPool, ApiError> {
    let manager = ConnectionManager::<PgConnection>::new(database_url);
    r2d2::Pool::builder()
        .build(manager)
        .map_err(|e| {
            error!("Failed to create database connection pool: {}", e);
            ApiError::DatabaseError(e.to_string())
        })
}

/// Creates missing tables and indexes. Safe to run on every start.
pub fn init_schema(pool: &DbPool) -> Result<(), ApiError> {
    let mut conn = pool.get()?;
    conn.batch_execute(DB_INIT_SQL).map_err(|e| {
        error!("Failed to execute database initialization script: {}", e);
        ApiError::DatabaseError(e.to_string())
    })?;
    info!("Database initialization complete.");
    Ok(())
}

/// Runs `f` with a pooled connection on the blocking thread pool.
pub async fn run<F, T>(pool: &DbPool, f: F) -> Result<T, ApiError>
where
    F: FnOnce(&mut PgConnection) -> Result<T, ApiError> + Send + 'static,
    T: Send + 'static,
{
    let conn = pool.get()?;
    web::block(move || {
        let mut conn = conn;
        f(&mut conn)
    })
    .await?
}

/// Like [`run`], but inside a SERIALIZABLE transaction so a conflict check and
/// the write that depends on it commit together or not at all.
pub async fn run_serializable<F, T>(pool: &DbPool, f: F) -> Result<T, ApiError>
where
    F: FnOnce(&mut PgConnection) -> Result<T, ApiError> + Send + 'static,
    T: Send + 'static,
{
    run(pool, move |conn| {
        conn.build_transaction()
            .serializable()
            .run::<T, TxError, _>(|conn| f(conn).map_err(TxError::Api))
            .map_err(ApiError::from)
    })
    .await
}

/// Plain blocking transaction for multi-row writes without a prior read check.
pub fn transaction<T, F>(conn: &mut PgConnection, f: F) -> Result<T, ApiError>
where
    F: FnOnce(&mut PgConnection) -> Result<T, ApiError>,
{
    conn.transaction::<T, TxError, _>(|conn| f(conn).map_err(TxError::Api))
        .map_err(ApiError::from)
}

// diesel needs the transaction error type to absorb its own errors.
#[derive(Debug)]
enum TxError {
    Api(ApiError),
    Diesel(DieselError),
}

impl From<DieselError> for TxError {
    fn from(e: DieselError) -> Self {
        TxError::Diesel(e)
    }
}

impl From<TxError> for ApiError {
    fn from(e: TxError) -> Self {
        match e {
            TxError::Api(api) => api,
            TxError::Diesel(diesel) => ApiError::from(diesel),
        }
    }
}
