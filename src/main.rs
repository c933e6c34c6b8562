//! PromptLens - session-scoped image analysis backend

use anyhow::Result;
use chrono::Utc;
use std::path::Path;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use promptlens::{
    api::{self, AppState},
    config::Config,
    provider::create_provider,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "promptlens=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting PromptLens...");

    let config = Config::load_with_env(Path::new("config.yml"))?;
    tracing::info!("Configuration loaded");

    let provider = create_provider(&config.provider)?;
    tracing::info!("Analysis provider: {}", provider.name());

    let sweep_interval = config.session.sweep_interval();
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let state = AppState::new(config, provider);

    // Expired session sweep
    {
        let sessions = state.session_service.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(sweep_interval);
            loop {
                interval.tick().await;
                if let Err(e) = sessions.sweep_expired(Utc::now()).await {
                    tracing::warn!("Session sweep failed: {}", e);
                }
            }
        });
    }

    let app = api::build_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
