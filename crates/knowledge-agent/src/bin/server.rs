//! Knowledge agent server binary
//!
//! Run with: cargo run -p knowledge-agent --bin knowledge-agent-server

use knowledge_agent::{config::RagConfig, server::RagServer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "knowledge_agent=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config_path =
        std::env::var("KNOWLEDGE_AGENT_CONFIG").unwrap_or_else(|_| "config.toml".to_string());
    let mut config = RagConfig::load_or_default(&config_path)?;
    config.apply_env_overrides();

    tracing::info!("Configuration loaded");
    tracing::info!("  - Vector store: {:?} ({})", config.vector_db.backend, config.vector_db.url);
    tracing::info!("  - Aleph Alpha model: {}", config.aleph_alpha.completion_model);
    tracing::info!("  - OpenAI model: {}", config.openai.completion_model);
    tracing::info!("  - GPT4All server: {}", config.gpt4all.base_url);
    tracing::info!("  - Chunk size: {}", config.chunking.chunk_size);

    let server = RagServer::new(config)?;
    server.initialize().await?;

    println!("\nServer starting...");
    println!("  API: http://{}", server.address());
    println!("\nEndpoints:");
    println!("  POST /embeddings/documents - Upload documents");
    println!("  POST /semantic/search      - Search documents");
    println!("  POST /rag                  - Ask questions");
    println!("\nPress Ctrl+C to stop\n");

    server.start().await?;

    Ok(())
}
