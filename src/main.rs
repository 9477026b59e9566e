use actix_web::middleware::NormalizePath;
use actix_web::web::Data;
use actix_web::{App, HttpServer, Responder, get};
use dotenvy::dotenv;
use std::sync::Arc;

mod api;
mod auth;
mod config;
mod db;
mod directory;
mod docs;
mod engine;
mod error;
mod ledger;
mod model;
mod models;
mod routes;
mod utils;

use config::Config;
use db::init_db;

use crate::directory::MySqlDirectory;
use crate::docs::ApiDoc;
use crate::engine::RequestService;
use crate::ledger::mysql::mysql_ledgers;
use crate::utils::directory_cache::CachedDirectory;
use tracing::{info, warn};
use tracing_appender::rolling;
use utoipa::OpenApi; // ← needed for ApiDoc::openapi()
use utoipa_swagger_ui::SwaggerUi;

#[get("/")]
async fn index() -> impl Responder {
    "Absence ledger is running"
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();

    let config = Config::from_env();

    // Rolling daily log
    let file_appender = rolling::daily("logs", "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_max_level(tracing::Level::DEBUG)
        .with_ansi(false)
        .with_target(false) // removes module path
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .pretty()
        .init();

    info!("Server starting...");

    let pool = init_db(&config.database_url).await;

    let directory = Arc::new(CachedDirectory::new(
        Arc::new(MySqlDirectory::new(pool.clone())),
        config.directory_cache_capacity,
        config.directory_cache_ttl,
    ));
    let service = RequestService::new(mysql_ledgers(&pool), directory.clone());

    // Clone values for the closures (avoid move issues)
    let server_addr = config.server_addr.clone();
    let config_data = config.clone();
    let warmup_batch = config.directory_warmup_batch;
    let pool_for_cache_warmup = pool.clone();

    actix_web::rt::spawn(async move {
        if let Err(e) = directory.warmup(&pool_for_cache_warmup, warmup_batch).await {
            warn!(error = ?e, "Failed to warmup directory cache");
        }
    });

    HttpServer::new(move || {
        App::new()
            .wrap(actix_web::middleware::Logger::default())
            .wrap(NormalizePath::trim())
            .service(
                // wildcard {_:.*} so the JS/CSS assets match too
                SwaggerUi::new("/swagger-ui/{_:.*}")
                    .url("/api-doc/openapi.json", ApiDoc::openapi()),
            )
            .app_data(Data::new(service.clone()))
            .app_data(Data::new(config.clone()))
            .service(index)
            // request routes with auth + rate limiting
            .configure(|cfg| routes::configure(cfg, config_data.clone()))
    })
    .bind(server_addr)?
    .run()
    .await
}
