use std::sync::Arc;

use anyhow::Context;
use chrono::{Duration, Utc};
use sqlx::PgPool;

use dreambook_api::app::{build_app, services::AppServices};
use dreambook_auth::TokenService;
use dreambook_infra::seed::{SeedOutcome, seed_sample_data};
use dreambook_infra::store::ensure_schema;
use dreambook_infra::{AppConfig, Stores};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dreambook_observability::init();

    let config = AppConfig::from_env();

    let stores = if config.use_persistent_stores {
        let pool = PgPool::connect(config.require_database_url()?)
            .await
            .context("failed to connect to DATABASE_URL")?;
        ensure_schema(&pool).await?;
        tracing::info!("using postgres-backed stores");
        Stores::postgres(pool)
    } else {
        tracing::info!("using in-memory stores");
        Stores::in_memory()
    };

    if config.seed_sample_data {
        match seed_sample_data(&stores, Utc::now()).await? {
            SeedOutcome::Applied(report) => tracing::info!(?report, "sample data seeded"),
            SeedOutcome::AlreadySeeded => tracing::info!("sample data already present"),
        }
    }

    let tokens = TokenService::new(
        &config.jwt_secret,
        Duration::seconds(config.access_token_ttl_secs),
        Duration::seconds(config.refresh_token_ttl_secs),
    );
    let app = build_app(Arc::new(AppServices::new(stores, tokens)));

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}
