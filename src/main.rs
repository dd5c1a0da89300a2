use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use nextpick_api::{
    config::Config,
    db::{create_pool, PgStore},
    routes::{create_router, AppState},
    services::{
        providers::{build_http_client, OpenLibraryProvider, TmdbProvider},
        CandidateGenerator,
    },
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    let settings = config.pipeline_settings();

    let pool = create_pool(&config.database_url)
        .await
        .context("Failed to connect to database")?;
    let store = Arc::new(PgStore::new(pool));

    // One client for both catalogs so connections are reused
    let http_client = build_http_client(config.upstream_timeout())?;

    let books = Arc::new(OpenLibraryProvider::new(
        http_client.clone(),
        config.open_library_url.clone(),
        settings.clone(),
    ));
    let screen = Arc::new(TmdbProvider::new(
        http_client,
        config.tmdb_api_key.clone(),
        config.tmdb_api_url.clone(),
        settings.clone(),
    ));

    let state = Arc::new(AppState {
        history: store.clone(),
        sessions: store,
        generator: CandidateGenerator::new(books, screen, &settings),
    });

    let app = create_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    tracing::info!(
        address = %addr,
        upstream_timeout_ms = config.upstream_timeout_ms,
        "Server running"
    );

    axum::serve(listener, app).await?;

    Ok(())
}
