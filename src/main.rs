//! Caption chat - guided image description and social posts
//!
//! A Rust backend hosting a conversation state machine that walks a user from
//! an uploaded image to a description and, on request, social media posts.

mod analysis;
mod api;
mod config;
mod i18n;
mod runtime;
mod state_machine;
mod transcript;

use analysis::{HttpAnalysisService, LoggingService};
use api::{create_router, AppState};
use config::AppConfig;
use runtime::SessionManager;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "caption_chat=info,tower_http=debug".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false),
        )
        .init();

    let config = AppConfig::from_env();

    let http = HttpAnalysisService::new(&config.analysis_base_url)?;
    let analysis = Arc::new(LoggingService::new(Arc::new(http)));
    tracing::info!(url = %config.analysis_base_url, "Analysis backend configured");

    let sessions = Arc::new(
        SessionManager::new(analysis, config.default_language)
            .with_idle_timeout(config.session_idle_timeout),
    );
    let state = AppState::new(sessions, config.max_image_bytes);

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = create_router(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!(
        language = %config.default_language,
        max_image_bytes = config.max_image_bytes,
        "Caption chat server listening on {}",
        addr
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
