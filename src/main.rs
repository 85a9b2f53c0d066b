use anyhow::Context;
use axum::{routing::get, Json, Router};
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use dotenvy::dotenv;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_cookies::CookieManagerLayer;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

use quoteserver::api_router::configure_api_routes;
use quoteserver::config::AppConfig;
use quoteserver::shared::state::AppState;
use quoteserver::shared::utils::{create_conn, DbPool};

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

fn run_migrations(pool: &DbPool) -> anyhow::Result<()> {
    let mut conn = pool.get().context("no database connection for migrations")?;
    conn.run_pending_migrations(MIGRATIONS)
        .map_err(|e| anyhow::anyhow!("migrations failed: {e}"))?;
    Ok(())
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::from_env();
    let pool = create_conn(&config.database_url())?;
    run_migrations(&pool)?;

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let state = Arc::new(AppState { config, conn: pool });

    let app = Router::new()
        .route("/health", get(health))
        .merge(configure_api_routes())
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive())
                .layer(CookieManagerLayer::new()),
        )
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!("quoteserver listening on {addr}");
    axum::serve(listener, app).await.context("server exited")
}
