mod config;
mod dashboard;
mod errors;
mod evaluation;
mod extraction;
mod ingestion;
mod llm_client;
mod routes;
mod scoring;
mod state;

use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::extraction::reader::HttpResumeReader;
use crate::extraction::ExtractorSet;
use crate::ingestion::hiring_client::HiringClient;
use crate::ingestion::listing_url::ListingUrlValidator;
use crate::llm_client::LlmClient;
use crate::routes::build_router;
use crate::scoring::scorer::ResumeScorer;
use crate::state::AppState;

const HTTP_TIMEOUT: Duration = Duration::from_secs(120);

#[tokio::main]
async fn main() -> Result<()> {
    // Missing credentials stop the process before anything is bound.
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting screener v{}", env!("CARGO_PKG_VERSION"));

    // One connection pool for the hiring API, résumé downloads and the model
    let http = reqwest::Client::builder()
        .timeout(HTTP_TIMEOUT)
        .build()
        .context("Failed to build HTTP client")?;

    let llm = LlmClient::new(
        http.clone(),
        config.google_api_key.clone(),
        config.gemini_model.clone(),
        config.llm_max_attempts,
    );
    info!(
        "LLM client initialized (model: {}, {}ms delay after each call)",
        llm.model(),
        config.scoring_delay.as_millis()
    );
    let scorer = ResumeScorer::new(Arc::new(llm), config.scoring_delay);

    let listing_urls = ListingUrlValidator::new(&config.hiring_host)
        .context("Failed to compile listing URL pattern")?;
    let hiring = HiringClient::new(http.clone(), &config);
    info!("Hiring API client initialized (host: {})", config.hiring_host);

    let extractors = ExtractorSet::default();
    let resumes = Arc::new(HttpResumeReader::new(http, extractors));

    let state = AppState {
        config: Arc::new(config.clone()),
        hiring,
        listing_urls: Arc::new(listing_urls),
        resumes,
        scorer,
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
