/// Registrar - student registration service
///
/// HTTP API for managing student records, course offerings, and course
/// enrollments, backed by SQLite.

mod account;
mod api;
mod auth;
mod config;
mod context;
mod courses;
mod db;
mod enrollment;
mod error;
mod pagination;
mod rate_limit;
mod server;
mod students;

use config::ServerConfig;
use context::AppContext;
use error::ApiResult;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> ApiResult<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "registrar=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = ServerConfig::from_env()?;

    // Create application context
    let ctx = AppContext::new(config).await?;

    // Start server
    server::serve(ctx).await?;

    Ok(())
}
