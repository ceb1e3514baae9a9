// Ingestion engine binary entry point

use common::config::Settings;
use common::executor::HttpFetchExecutor;
use common::models::{
    AuthConfig, HttpMethod, IngestMode, Pagination, Schedule, SignalType, Source, SourceTemplate,
    TimeOfDay,
};
use common::registry::SourceRegistry;
use common::scheduler::{EngineConfig, IngestionEngine};
use common::transform::{InMemorySignalSink, PassthroughTransformer};
use common::{telemetry, webhook};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;
    settings
        .validate()
        .map_err(|e| anyhow::anyhow!("Invalid configuration: {}", e))?;

    telemetry::init_logging(&settings.observability.log_level)?;
    telemetry::init_metrics(settings.observability.metrics_port)?;

    info!("Starting Stories ingestion engine");

    let registry = Arc::new(SourceRegistry::new());
    seed_sources(&registry, &settings.webhook.public_host).await;

    let executor = Arc::new(
        HttpFetchExecutor::new(settings.http.timeout_seconds)
            .map_err(|e| anyhow::anyhow!("Failed to create fetch executor: {}", e))?,
    );

    // The AI transformer is an external service; until it is wired in, the
    // passthrough keeps the pipeline end-to-end runnable.
    let transformer = Arc::new(PassthroughTransformer);
    let sink = Arc::new(InMemorySignalSink::new());

    let engine = IngestionEngine::new(
        EngineConfig {
            tick_interval_seconds: settings.engine.tick_interval_seconds,
        },
        registry,
        executor,
        transformer,
        sink,
    );

    let engine_for_shutdown = engine.clone();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
            return;
        }
        info!("Received Ctrl+C signal, initiating graceful shutdown");
        engine_for_shutdown.stop();
    });

    engine.start().await;
    info!("Ingestion engine stopped");
    Ok(())
}

/// Seed the registry with the default sources shipped with the dashboard.
async fn seed_sources(registry: &Arc<SourceRegistry>, public_host: &str) {
    let competitor_feed = Source::new_polling(
        "Competitor Feed",
        SignalType::Market,
        common::models::PollingConfig {
            endpoint: "https://jsonplaceholder.typicode.com/posts".to_string(),
            method: HttpMethod::Get,
            headers: HashMap::new(),
            body: None,
            auth: AuthConfig::None,
            pagination: Pagination::None,
            template: SourceTemplate::Custom,
            mode: IngestMode::Polling,
        },
        Schedule::hourly(),
    );

    let tech_news = Source::new_web_search(
        "TechCrunch SaaS News",
        SignalType::Market,
        "https://techcrunch.com/category/startups/",
        Schedule::daily(TimeOfDay::new(8, 0).expect("valid seed time")),
    );

    for source in [competitor_feed, tech_news] {
        info!(
            source_id = %source.id,
            source_name = %source.name,
            webhook_url = %webhook::webhook_url(public_host, source.id),
            "Seeded source"
        );
        registry.add_source(source).await;
    }
}
