//! Clearslip API composition root.

#![forbid(unsafe_code)]

mod api_config;
mod api_router;
mod api_services;
mod auth;
mod dev_seed;
mod dto;
mod error;
mod handlers;
mod middleware;
mod state;

use axum::Router;
use clearslip_core::AppError;
use tower_sessions::cookie::SameSite;
use tower_sessions::cookie::time::Duration;
use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer, SessionStore};
use tower_sessions_sqlx_store::PostgresStore;
use tracing::info;

use crate::api_config::ApiConfig;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    api_config::init_tracing();

    let config = ApiConfig::load()?;

    let Some(database_url) = config.database_url.clone() else {
        if config.migrate_only {
            return Err(AppError::Validation(
                "the migrate command requires DATABASE_URL".to_owned(),
            ));
        }

        let state = api_services::build_in_memory_state(config.frontend_url.clone());
        dev_seed::run(&state).await?;
        info!("DATABASE_URL not set; serving the seeded in-memory data set");

        let app = api_router::build_router(state)?
            .layer(session_layer(MemoryStore::default(), config.cookie_secure));
        return serve(app, &config).await;
    };

    let pool = api_services::connect_and_migrate(&database_url).await?;

    if config.migrate_only {
        info!("database migrations applied successfully");
        return Ok(());
    }

    let session_store = PostgresStore::new(pool.clone())
        .with_table_name("tower_sessions")
        .map_err(|error| {
            AppError::Validation(format!("invalid session table name configuration: {error}"))
        })?;
    session_store.migrate().await.map_err(|error| {
        AppError::Internal(format!("failed to initialize session store: {error}"))
    })?;

    let state = api_services::build_postgres_state(pool, config.frontend_url.clone());
    let app = api_router::build_router(state)?
        .layer(session_layer(session_store, config.cookie_secure));

    serve(app, &config).await
}

fn session_layer<Store: SessionStore>(
    store: Store,
    cookie_secure: bool,
) -> SessionManagerLayer<Store> {
    SessionManagerLayer::new(store)
        .with_secure(cookie_secure)
        .with_same_site(SameSite::Lax)
        .with_http_only(true)
        .with_expiry(Expiry::OnInactivity(Duration::minutes(30)))
}

async fn serve(app: Router, config: &ApiConfig) -> Result<(), AppError> {
    let address = config.socket_address()?;

    let listener = tokio::net::TcpListener::bind(address)
        .await
        .map_err(|error| AppError::Internal(format!("failed to bind listener: {error}")))?;

    info!(%address, "clearslip-api listening");

    axum::serve(listener, app)
        .await
        .map_err(|error| AppError::Internal(format!("api server error: {error}")))
}
