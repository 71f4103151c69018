use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use tracing::info;
use tracing_subscriber::EnvFilter;

use jobboard::{
    config::AppConfig,
    db,
    routes::create_router,
    s3,
    state::AppState,
    storage::S3Storage,
};

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::from_env()?;
    info!(database_url = %config.redacted_database_url(), "starting jobboard API");

    let pool = db::init_pool_with_size(&config.database_url, config.database_max_pool_size)?;

    {
        let mut conn = pool.get().context("failed to get connection for migrations")?;
        conn.run_pending_migrations(MIGRATIONS)
            .map_err(|err| anyhow::anyhow!("failed to run migrations: {err}"))?;
    }

    let s3_client = s3::build_client(&config).await?;
    let storage = Arc::new(S3Storage::new(s3_client, config.s3_bucket.clone()));

    let addr: SocketAddr = format!("{}:{}", config.server_host, config.server_port)
        .parse()
        .context("invalid SERVER_HOST/SERVER_PORT")?;

    let state = AppState::new(pool, config, storage);
    let app = create_router(state);

    info!(%addr, "listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
