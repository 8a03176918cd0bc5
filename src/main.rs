mod config;
mod db;
mod error;
mod middleware;
mod models;
mod routes;
mod services;
mod utils;
#[cfg(test)]
mod test_support;

use std::io;

use actix_web::{middleware::Logger, web, App, HttpServer};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::config::AppConfig;
use crate::services::account_service::AccountService;

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("busmonitor=info,actix_web=info")),
        )
        .init();

    let config = AppConfig::from_env().map_err(|e| {
        error!(error = %e, "invalid configuration");
        io::Error::other(e)
    })?;

    info!("Connecting to database...");
    let db = db::establish_connection(&config).await.map_err(|e| {
        error!(error = %e, "failed to connect to database");
        io::Error::other(e)
    })?;
    info!("Database connected");

    if config.init_schema {
        db::create_schema(&db).await.map_err(io::Error::other)?;
    }

    if let Some(seed) = &config.admin_seed {
        if AccountService::ensure_admin(&db, &config, seed).await.map_err(io::Error::other)? {
            info!(username = %seed.username, "admin account created");
        }
    }

    let bind_addr = (config.host.clone(), config.port);
    info!(host = %bind_addr.0, port = bind_addr.1, "Starting server");

    let config_data = web::Data::new(config);
    let db_data = web::Data::new(db);

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .app_data(db_data.clone())
            .app_data(config_data.clone())
            .configure(routes::configure_routes)
    })
        .bind(bind_addr)?
        .run()
        .await
}
