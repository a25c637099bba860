//! Pressnote - a small news feed with comments and a private notes application

use anyhow::Result;
use std::path::Path;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pressnote::{
    config::Config,
    db,
    web::{build_router, AppState},
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pressnote=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Pressnote...");

    // Load configuration
    let config = Config::load(Path::new("config.yml"))?;
    tracing::info!("Configuration loaded");

    // Initialize database
    let pool = db::create_pool(&config.database).await?;
    tracing::info!("Database connected: {}", config.database.url);

    // Run migrations
    db::migrations::run_migrations(&pool).await?;
    tracing::info!("Database migrations completed");

    // Build application state
    let state = AppState::build(pool, &config)?;

    // Purge expired sessions periodically
    {
        let user_service = state.user_service.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(tokio::time::Duration::from_secs(3600));
            loop {
                interval.tick().await;
                match user_service.purge_expired_sessions().await {
                    Ok(0) => {}
                    Ok(count) => tracing::debug!("Purged {} expired session(s)", count),
                    Err(err) => tracing::warn!("Failed to purge sessions: {:#}", err),
                }
            }
        });
    }

    // Build router
    let app = build_router(state);

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
