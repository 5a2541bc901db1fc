mod assistant;
mod config;
mod db;
mod drafts;
mod errors;
mod export;
mod letter;
mod llm_client;
mod models;
mod preview;
mod render;
mod routes;
mod session;
mod state;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::assistant::LlmAssistantProvider;
use crate::config::Config;
use crate::db::create_pool;
use crate::drafts::{DraftStore, MemoryDraftStore, PgDraftStore};
use crate::export::{ExportEngine, RusttypeRasterizer};
use crate::routes::build_router;
use crate::session::SessionStore;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={}",
                env!("CARGO_PKG_NAME").replace('-', "_"),
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting CV Fácil API v{}", env!("CARGO_PKG_VERSION"));

    // Drafts: Postgres when configured, memory otherwise
    let drafts: Arc<dyn DraftStore> = match &config.database_url {
        Some(url) => {
            let store = PgDraftStore::new(create_pool(url).await?);
            store.ensure_schema().await?;
            Arc::new(store)
        }
        None => {
            warn!("DATABASE_URL not set; drafts are kept in memory");
            Arc::new(MemoryDraftStore::new())
        }
    };

    // Raster fonts for the Modern and Creative captures
    let rasterizer = RusttypeRasterizer::load(&config.raster_font_regular, &config.raster_font_bold);
    if rasterizer.is_ready() {
        info!(regular = %config.raster_font_regular.display(), "raster fonts loaded");
    }

    if config.anthropic_api_key.is_none() {
        info!("No default ANTHROPIC_API_KEY; AI actions need an x-api-key header");
    }
    info!("LLM model: {}", llm_client::MODEL);

    let sessions = SessionStore::new(config.preview_debounce);
    sessions.spawn_sweeper(config.session_idle_ttl);
    info!(ttl_secs = config.session_idle_ttl.as_secs(), "idle session sweeper started");

    let state = AppState {
        sessions,
        drafts,
        assistants: Arc::new(LlmAssistantProvider::new(config.anthropic_api_key.clone())),
        export: ExportEngine::new(Arc::new(rasterizer)),
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
