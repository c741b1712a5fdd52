mod admission;
mod completion;
mod config;
mod errors;
mod models;
mod outreach;
mod routes;
mod scoring;
mod state;
mod storage;
mod store;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::admission::RateLimiter;
use crate::completion::CompletionClient;
use crate::config::Config;
use crate::outreach::{Debouncer, OutreachGuard, RetryPolicy};
use crate::routes::build_router;
use crate::scoring::{ScoringEngine, ScoringPolicy};
use crate::state::AppState;
use crate::storage::{JsonFileStorage, MemoryStorage, Storage};
use crate::store::parser::JobTextParser;
use crate::store::JobStore;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Sourcer v{}", env!("CARGO_PKG_VERSION"));

    let storage: Arc<dyn Storage> = match &config.storage_path {
        Some(path) => Arc::new(JsonFileStorage::open(path)?),
        None => {
            info!("No STORAGE_PATH configured; state will not survive restarts");
            Arc::new(MemoryStorage::new())
        }
    };

    let limiter = Arc::new(RateLimiter::new(config.rate_limits(), Arc::clone(&storage)));
    limiter.restore().await?;

    let completion = config
        .gemini_api_key
        .clone()
        .map(|key| Arc::new(CompletionClient::new(key)));
    match &completion {
        Some(_) => info!("Completion client initialized"),
        None => info!("No GEMINI_API_KEY set; AI scoring and parsing disabled"),
    }

    let jobs = Arc::new(JobStore::new(Arc::clone(&storage)));
    jobs.load().await?;

    let parser = Arc::new(JobTextParser::new(completion.clone(), Arc::clone(&limiter)));
    let scoring = Arc::new(ScoringEngine::new(
        ScoringPolicy::with_exclusion_penalty(config.exclusion_penalty),
        completion,
        Arc::clone(&limiter),
    ));

    let outreach = Arc::new(OutreachGuard::new(
        RetryPolicy::default(),
        config.min_action_interval,
        Arc::clone(&storage),
    ));
    outreach.load().await?;

    let debouncer = Arc::new(Debouncer::new(config.debounce_quiet_period));

    let state = AppState {
        jobs,
        parser,
        scoring,
        limiter,
        outreach,
        debouncer,
        default_use_ai: config.use_ai,
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
