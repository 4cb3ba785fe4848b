mod config;
mod errors;
mod feedback;
mod llm_client;
mod routes;
mod state;
mod transform;
mod usage;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::feedback::log::FeedbackLog;
use crate::llm_client::{OpenAiClient, TextGenerator};
use crate::routes::build_router;
use crate::state::AppState;
use crate::usage::{InMemoryUsageStore, UsageGate};

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

    info!("Starting Biztone API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize LLM client
    let generator: Arc<dyn TextGenerator> =
        Arc::new(OpenAiClient::new(config.openai_api_key.clone()));
    info!("LLM client initialized");

    // Usage gate over the in-memory counter store (advisory daily quotas)
    let gate = UsageGate::new(Arc::new(InMemoryUsageStore::default()));

    // Append-only feedback log
    let feedback = Arc::new(FeedbackLog::new(config.feedback_log_path.clone()));
    info!("Feedback log at {}", config.feedback_log_path);

    // Build app state
    let state = AppState {
        generator,
        gate,
        feedback,
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
