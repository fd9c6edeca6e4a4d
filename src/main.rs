use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use lookbook_api::api::{create_router, AppState};
use lookbook_api::config::Config;
use lookbook_api::services::images::{HttpImageStore, ImageStore, MemoryImageStore};
use lookbook_api::store::{create_pool, PgStore, Store};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env()?;

    let pool = create_pool(&config.database_url).await?;
    sqlx::migrate!().run(&pool).await?;
    let store: Arc<dyn Store> = Arc::new(PgStore::new(pool));

    let images: Arc<dyn ImageStore> = match &config.image_store_url {
        Some(url) => Arc::new(HttpImageStore::new(url.clone())),
        None => {
            tracing::warn!("No image store configured, keeping images in memory");
            Arc::new(MemoryImageStore::new())
        }
    };

    let app = create_router(AppState::new(store, images));

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "Server running");
    axum::serve(listener, app).await?;

    Ok(())
}
