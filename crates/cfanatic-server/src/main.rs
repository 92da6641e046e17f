mod configuration;
mod error;
mod routes;
mod state;

use cfanatic::agent::Agent;
use cfanatic::assistant::Assistant;
use cfanatic::codeforces::CodeforcesClient;
use cfanatic::knowledge::KeywordKnowledgeBase;
use cfanatic::systems::{CodeforcesSystem, KnowledgeSystem, ToolRegistry};
use configuration::Settings;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let settings = Settings::new()?;

    let client = CodeforcesClient::new(settings.codeforces.client_config())?;
    let knowledge = match &settings.knowledge.dir {
        Some(dir) => KeywordKnowledgeBase::from_dir(dir)?,
        None => KeywordKnowledgeBase::default(),
    };
    info!(documents = knowledge.len(), "Loaded knowledge base");

    let mut registry = ToolRegistry::new();
    registry.add_system(Box::new(CodeforcesSystem::new(client)))?;
    registry.add_system(Box::new(KnowledgeSystem::new(Arc::new(knowledge))))?;

    let agent = Agent::new(registry).with_max_iterations(settings.agent.max_iterations);
    info!(
        tools = agent.registry().tools().len(),
        max_iterations = agent.max_iterations(),
        "Agent ready"
    );
    let provider_config = settings.provider.into_config();
    let default_api_key = provider_config.api_key().to_string();
    let assistant = Assistant::new(agent, provider_config);
    let state = state::AppState::new(assistant, &default_api_key, settings.agent.turn_timeout());

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = routes::configure(state).layer(cors);

    let listener = tokio::net::TcpListener::bind(settings.server.socket_addr()?).await?;
    info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}
