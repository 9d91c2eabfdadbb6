use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use querysmith::config::ServiceConfig;
use querysmith::db::PostgresExecutor;
use querysmith::llm::{AuditLog, CompletionStreamer, OllamaClient};
use querysmith::pipeline::QueryPipeline;
use querysmith::schema::SchemaLocator;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = ServiceConfig::from_env();
    info!(
        host = %config.server.host,
        port = config.server.port,
        "booting querysmith"
    );

    let executor = Arc::new(PostgresExecutor::connect(&config.database.url).await?);

    let client = Arc::new(OllamaClient::new(
        Some(config.llm.base_url.clone()),
        Some(config.llm.model.clone()),
    ));
    match client.health_check().await {
        Ok(true) => info!("Ollama reachable at {}", config.llm.base_url),
        _ => warn!(
            "Ollama not reachable at {}; generation will fail until it is up",
            config.llm.base_url
        ),
    }

    let streamer = CompletionStreamer::new(client).with_retry_policy(
        config.llm.max_retries,
        Duration::from_millis(config.llm.retry_delay_ms),
    );
    let locator = SchemaLocator::new(executor.clone(), &config.database.schema);
    let pipeline = QueryPipeline::new(
        locator,
        streamer,
        executor,
        Arc::new(AuditLog::default()),
    );

    querysmith::web::start_server(pipeline, &config.server.host, config.server.port).await
}
