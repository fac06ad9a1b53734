mod ai;
mod config;
mod errors;
mod extract;
mod llm_client;
mod pipeline;
mod render;
mod routes;
mod session;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::ai::LlmAtsEngine;
use crate::config::Config;
use crate::llm_client::LlmClient;
use crate::pipeline::controller::Pipeline;
use crate::render::PdfRenderer;
use crate::routes::build_router;
use crate::session::memory::InMemoryCaseStore;
use crate::session::{sweeper, CaseStore};
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize LLM client and the collaborator engine
    let llm = LlmClient::new(config.anthropic_api_key.clone());
    let engine = Arc::new(LlmAtsEngine::new(llm));
    info!("LLM engine initialized (model: {})", llm_client::MODEL);

    // Case store with sliding TTL, plus its background sweeper
    let store: Arc<dyn CaseStore> = Arc::new(InMemoryCaseStore::new(config.case_ttl));
    let sweep_period = sweeper::period_for_ttl(config.case_ttl);
    let _sweeper = sweeper::spawn(store.clone(), sweep_period);
    info!(
        "case store initialized (ttl: {:?}, sweep every {:?})",
        config.case_ttl, sweep_period
    );

    // Pipeline controller over store + engine
    let pipeline = Arc::new(Pipeline::new(store, engine, config.upstream_deadline));

    // Build app state
    let state = AppState {
        pipeline,
        renderer: Arc::new(PdfRenderer),
        config: config.clone(),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: tighten CORS in production

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
