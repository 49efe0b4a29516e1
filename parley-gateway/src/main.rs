use std::sync::Arc;
use std::time::Duration;

use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use parley_gateway::providers::OpenAiCompatibleClient;
use parley_gateway::server;
use parley_gateway::state::AppState;
use parley_knowledge::KnowledgeEngine;

/// How often idle conversations are swept.
const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration first so the log level can come from it. Whether the
    // default file gets written is noted now and logged once tracing is up.
    let config_path = parley_core::Settings::config_path()?;
    let first_run = !config_path.exists();
    let config = parley_core::Config::load()?;

    // Initialize tracing
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| config.settings.logging.level.clone().into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    if first_run {
        info!("Created default configuration at {}", config_path.display());
    }
    info!(
        "Configuration loaded (model: {}, provider: {})",
        config.chat_model(),
        config.settings.providers.base_url
    );

    let api_key = config.openai_api_key().map(str::to_string);
    let timeout = config.provider_timeout();

    let provider = OpenAiCompatibleClient::new(
        config.settings.providers.base_url.clone(),
        api_key.clone(),
        config.chat_model(),
    )
    .with_timeout(timeout)?;

    let knowledge_settings = config.knowledge_settings();
    info!(
        "Knowledge engine using {} ({:?} similarity, top_k {})",
        knowledge_settings.embedding_model,
        knowledge_settings.similarity,
        knowledge_settings.top_k
    );
    let knowledge = KnowledgeEngine::with_http_embedder(knowledge_settings, api_key, timeout)?;

    let state = Arc::new(AppState::new(
        Arc::new(provider),
        Arc::new(knowledge),
        &config.settings,
    ));
    info!("Chat modes ready on model {}", state.model());

    let sweeper = Arc::clone(&state);
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(SWEEP_INTERVAL);
        loop {
            interval.tick().await;
            sweeper.sessions.sweep_idle().await;
        }
    });

    server::run(
        state,
        &config.bind_addr(),
        &config.settings.gateway.cors_origins,
    )
    .await
}
