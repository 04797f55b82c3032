mod analysis;
mod broker;
mod config;
mod cv;
mod db;
mod discovery;
mod errors;
mod llm_client;
mod routes;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::sync::Semaphore;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::db::create_pool;
use crate::discovery::source::AdzunaSource;
use crate::llm_client::LlmClient;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails fast on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting coach v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL
    let db = create_pool(&config.database_url, config.db_max_connections).await?;

    // Initialize Redis: one client for the subscription loop, one
    // multiplexed connection shared by all publishers
    let redis_client = redis::Client::open(config.redis_url.clone())?;
    let publisher = redis_client.get_multiplexed_async_connection().await?;
    info!("Redis connections established");

    // Initialize LLM client (absent key disables generation; pipelines
    // degrade to score-only output)
    let llm = LlmClient::new(
        config.openrouter_api_key.clone(),
        config.openrouter_base_url.clone(),
        config.openrouter_model.clone(),
        Duration::from_secs(config.openrouter_timeout_secs),
    )?;
    if llm.is_configured() {
        info!("LLM client initialized (model: {})", config.openrouter_model);
    } else {
        info!("LLM client disabled — no OPENROUTER_API_KEY");
    }

    // Initialize listings source
    let source = Arc::new(AdzunaSource::new(
        config.adzuna_app_id.clone(),
        config.adzuna_app_key.clone(),
        config.adzuna_country.clone(),
    )?);

    let state = AppState {
        db,
        publisher,
        llm,
        limiter: Arc::new(Semaphore::new(config.max_inflight_tasks)),
        source,
        config: config.clone(),
    };

    // Background: command dispatcher and periodic scan
    let dispatcher_state = state.clone();
    tokio::spawn(async move {
        if let Err(e) = broker::dispatcher::run(dispatcher_state, redis_client).await {
            error!("Dispatcher stopped: {e}");
        }
    });
    let _scan_scheduler = discovery::scheduler::spawn(state.clone());

    // HTTP surface: health + trigger endpoints
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
