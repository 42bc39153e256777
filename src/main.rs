use anyhow::{Context, Result};
use locality_insights::config::Config;
use locality_insights::data::cache::DatasetCache;
use locality_insights::server::{build_app, AppState};

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Config::from_env().context("Failed to load configuration")?;
    log::info!("Dataset file: {}", config.data_file.display());

    let cache = DatasetCache::new(config.data_file.clone());
    // Warm the cache; a bad file is reported but the server still starts so
    // `/api/reload` can pick up a fixed one.
    if let Err(e) = cache.dataset() {
        log::warn!("Initial dataset load failed: {e}");
    }

    let app = build_app(AppState::new(cache, config.table_limit));

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {addr}"))?;
    log::info!("Listening on http://{addr}");

    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}
