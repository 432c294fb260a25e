use std::sync::Arc;

use anyhow::Context;
use axum::{routing::post, Extension, Router};
use sqlx::postgres::PgPoolOptions;

use community_graphql::config::AppConfig;
use community_graphql::logging::init_tracing;
use community_graphql::repository::{memory::MemoryStore, Repositories};
use community_graphql::{build_schema, graphql_handler};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load().context("failed to load configuration")?;
    init_tracing(&config)?;

    let repositories = if config.uses_memory_backend() {
        tracing::warn!("using in-memory data backend");
        Repositories::memory(Arc::new(MemoryStore::new()))
    } else {
        let pool = PgPoolOptions::new()
            .max_connections(config.database_max_connections)
            .connect(&config.database_url)
            .await
            .context("failed to connect to postgres")?;
        if config.run_migrations {
            sqlx::migrate!("./migrations")
                .run(&pool)
                .await
                .context("failed to run migrations")?;
        }
        Repositories::postgres(pool)
    };

    let schema = build_schema(repositories.clone());
    let app = Router::new()
        .route("/graphql", post(graphql_handler))
        .layer(Extension(schema))
        .layer(Extension(repositories));

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.port)).await?;
    tracing::info!(port = config.port, env = %config.app_env, "listening");
    axum::serve(listener, app).await?;

    Ok(())
}
