#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Actix-Web API server for the NJ Safe Drinking Water explorer.
//!
//! Every page of the dashboard is exposed as a JSON endpoint under `/api`
//! (map layers, charts and table in one response) plus a CSV download at
//! `/api/{page}/csv`. Regions are passed as query parameters; see
//! [`nj_sdwa_server_models::PageQueryParams`].

mod handlers;
pub mod interactive;

use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{App, HttpServer, middleware, web};
use nj_sdwa_dashboard::{Dashboard, DashboardConfig};

/// Shared application state.
pub struct AppState {
    /// Page pipelines over the live data sources.
    pub dashboard: Arc<Dashboard>,
}

/// Registers the `/api` routes.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .route("/health", web::get().to(handlers::health))
            .route("/measures", web::get().to(handlers::measures))
            .route("/region", web::post().to(handlers::region_check))
            .route("/overview", web::get().to(handlers::overview))
            .route("/systems", web::get().to(handlers::systems))
            .route("/violations", web::get().to(handlers::violations))
            .route("/ej", web::get().to(handlers::environmental_justice))
            .route("/lead", web::get().to(handlers::lead))
            .route("/watershed", web::get().to(handlers::watershed))
            .route("/{page}/csv", web::get().to(handlers::csv)),
    );
}

/// Starts the API server.
///
/// Binds to `BIND_ADDR`:`PORT` (default `127.0.0.1:8080`). This is a
/// regular async function; the caller provides the runtime (e.g. via
/// `#[actix_web::main]`).
///
/// # Errors
///
/// Returns an `std::io::Result` error if the HTTP server fails to bind or
/// encounters a runtime error.
#[allow(clippy::future_not_send)]
pub async fn run_server(config: DashboardConfig) -> std::io::Result<()> {
    log::info!(
        "Serving {} systems for fiscal year {}",
        config.state,
        config.fiscal_year
    );
    let state = web::Data::new(AppState {
        dashboard: Arc::new(Dashboard::remote(config)),
    });

    let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1".to_string());
    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8080);

    log::info!("Starting server on {bind_addr}:{port}");

    HttpServer::new(move || {
        App::new()
            .wrap(Cors::permissive())
            .wrap(middleware::Logger::default())
            .app_data(state.clone())
            .configure(configure)
    })
    .bind((bind_addr, port))?
    .run()
    .await
}
