use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use api::config::Config;
use api::embedding::HttpEmbedder;
use api::explain::ExplainPipeline;
use api::index::load_artifacts;
use api::llm_client::{self, LlmClient};
use api::matching::engine::MatchEngine;
use api::resume::{DocumentExtractor, ResumeParser};
use api::routes::build_router;
use api::state::AppState;

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

    info!("Starting job-match API v{}", env!("CARGO_PKG_VERSION"));

    // Load the index artifacts built offline by `build_index`. Fatal if the
    // blob and metadata are missing, malformed, or out of sync.
    let (vector_index, jobs) = load_artifacts(Path::new(&config.index_dir))?;
    info!(
        "Loaded index: {} jobs, dim {} from {}",
        vector_index.len(),
        vector_index.dim(),
        config.index_dir
    );

    // Providers
    let embedder = Arc::new(HttpEmbedder::new(&config)?);
    let llm = Arc::new(LlmClient::new(config.anthropic_api_key.clone())?);
    info!("LLM client initialized (model: {})", llm_client::MODEL);

    // Core services — all immutable after this point
    let engine = Arc::new(MatchEngine::new(vector_index, jobs, embedder)?);
    let explainer = Arc::new(ExplainPipeline::new(
        llm.clone(),
        config.explain_concurrency,
    ));
    let resume_parser = Arc::new(ResumeParser::new(Arc::new(DocumentExtractor), llm));

    let state = AppState {
        engine,
        explainer,
        resume_parser,
        config: config.clone(),
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: tighten CORS in production

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
