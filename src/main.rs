use actix_web::{web, App, HttpServer};
use log::{error, info, warn};
use std::time::Duration;

use dealership::config::AppConfig;
use dealership::db::{create_pool, init_schema};
use dealership::errors::set_expose_error_details;
use dealership::handlers;
use dealership::logger::setup_logger;
use dealership::middleware::RequestLogger;
use dealership::services::AuthService;
use dealership::DbPool;

const TOKEN_PURGE_INTERVAL: Duration = Duration::from_secs(60 * 60);

fn spawn_token_purge(pool: DbPool) {
    actix_web::rt::spawn(async move {
        let mut ticker = tokio::time::interval(TOKEN_PURGE_INTERVAL);
        loop {
            ticker.tick().await;
            if let Err(e) = AuthService::purge_expired_tokens(&pool).await {
                warn!("Refresh token purge failed: {}", e);
            }
        }
    });
}

fn invalid_setup(e: impl std::fmt::Display) -> std::io::Error {
    std::io::Error::other(e.to_string())
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    setup_logger();

    // Load and validate configuration
    let config = AppConfig::from_env();
    if let Err(e) = config.validate() {
        error!("Configuration validation error: {}", e);
        return Err(invalid_setup(e));
    }
    set_expose_error_details(!config.is_production());

    info!("Connecting to database");
    let pool = create_pool(&config.database_url).map_err(invalid_setup)?;
    init_schema(&pool).map_err(invalid_setup)?;

    spawn_token_purge(pool.clone());

    let host = config.host.clone();
    let port = config.port;
    let workers = config.workers;
    info!("Starting HTTP server at http://{}:{} ({} env)", host, port, config.environment);

    HttpServer::new(move || {
        App::new()
            .wrap(RequestLogger)
            .app_data(web::Data::new(pool.clone()))
            .app_data(web::Data::new(config.clone()))
            .service(web::scope("/api").configure(handlers::configure))
    })
    .workers(workers)
    .keep_alive(Duration::from_secs(75))
    .shutdown_timeout(30)
    .bind((host, port))?
    .run()
    .await
}
