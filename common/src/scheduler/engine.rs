// Ingestion engine implementation
//
// A single periodic driver evaluates every active source once per tick.
// Due-checks are synchronous and cheap; each triggered run is spawned as an
// independent task, so the tick never waits on network I/O and one hung
// source cannot stall the loop. The recency guard is the only mechanism
// preventing overlapping triggers for the same source.

use crate::errors::RegistryError;
use crate::executor::{FetchExecutor, TestOutcome};
use crate::fallback::fallback_records;
use crate::models::{PollingConfig, RunStatus, Source, SourceConfig, WebSearchConfig};
use crate::registry::SourceRegistry;
use crate::runlog::{snippet, RunReport};
use crate::schedule::{is_due, ran_recently};
use crate::transform::{SignalSink, Transformer};
use crate::webhook;
use chrono::{DateTime, Utc};
use metrics::counter;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

/// Configuration for the ingestion engine
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Fixed tick period; must divide evenly into one minute or exact-minute
    /// schedules can be missed
    pub tick_interval_seconds: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tick_interval_seconds: 60,
        }
    }
}

/// The scheduler service owning the source registry.
///
/// Cheap to clone; all state is shared behind Arcs.
#[derive(Clone)]
pub struct IngestionEngine {
    config: EngineConfig,
    registry: Arc<SourceRegistry>,
    executor: Arc<dyn FetchExecutor>,
    transformer: Arc<dyn Transformer>,
    sink: Arc<dyn SignalSink>,
    shutdown_tx: tokio::sync::broadcast::Sender<()>,
}

impl IngestionEngine {
    pub fn new(
        config: EngineConfig,
        registry: Arc<SourceRegistry>,
        executor: Arc<dyn FetchExecutor>,
        transformer: Arc<dyn Transformer>,
        sink: Arc<dyn SignalSink>,
    ) -> Self {
        let (shutdown_tx, _shutdown_rx) = tokio::sync::broadcast::channel(1);

        Self {
            config,
            registry,
            executor,
            transformer,
            sink,
            shutdown_tx,
        }
    }

    pub fn registry(&self) -> &Arc<SourceRegistry> {
        &self.registry
    }

    pub fn shutdown_receiver(&self) -> tokio::sync::broadcast::Receiver<()> {
        self.shutdown_tx.subscribe()
    }

    /// Run the tick loop until a shutdown signal arrives.
    ///
    /// A failing source only ever produces an error log entry; the loop
    /// itself never stops ticking because of one source.
    #[instrument(skip(self))]
    pub async fn start(&self) {
        info!(
            tick_interval_seconds = self.config.tick_interval_seconds,
            "Starting ingestion engine"
        );

        let mut tick_interval =
            tokio::time::interval(Duration::from_secs(self.config.tick_interval_seconds));
        let mut shutdown_rx = self.shutdown_receiver();

        loop {
            tokio::select! {
                _ = tick_interval.tick() => {
                    let triggered = self.tick(Utc::now()).await;
                    if triggered > 0 {
                        info!(runs_triggered = triggered, "Tick complete");
                    } else {
                        debug!("No sources due");
                    }
                }
                _ = shutdown_rx.recv() => {
                    info!("Shutdown signal received, stopping ingestion engine");
                    break;
                }
            }
        }

        info!("Ingestion engine stopped");
    }

    /// Stop the engine gracefully
    pub fn stop(&self) {
        let _ = self.shutdown_tx.send(());
    }

    /// Evaluate every active source against `now` and spawn runs for those
    /// that are due. Returns the number of runs triggered.
    ///
    /// `now` is injected so ticks are deterministic under test.
    #[instrument(skip(self))]
    pub async fn tick(&self, now: DateTime<Utc>) -> usize {
        counter!("ingest_ticks_total").increment(1);

        let mut triggered = 0;

        for source in self.registry.active_sources().await {
            // Webhook sources only execute on external invocation
            if source.config.is_webhook() {
                continue;
            }

            if !is_due(&source.schedule, now) {
                continue;
            }

            if ran_recently(source.last_run, now) {
                debug!(
                    source_id = %source.id,
                    source_name = %source.name,
                    "Run suppressed by recency guard"
                );
                continue;
            }

            // Stamp the attempt time before the run is spawned so the next
            // tick sees it
            if let Err(e) = self.registry.mark_run_started(source.id, now).await {
                warn!(source_id = %source.id, error = %e, "Source vanished before run start");
                continue;
            }

            let engine = self.clone();
            let id = source.id;
            tokio::spawn(async move {
                engine.run_source(id, now).await;
            });
            triggered += 1;
        }

        triggered
    }

    /// Trigger one source immediately through the normal run path (logged)
    pub async fn run_source_now(&self, id: Uuid) -> Result<(), RegistryError> {
        let now = Utc::now();
        if self.registry.get(id).await.is_none() {
            return Err(RegistryError::SourceNotFound(id));
        }
        self.registry.mark_run_started(id, now).await?;
        self.run_source(id, now).await;
        Ok(())
    }

    /// Ingest an externally pushed webhook payload for a source.
    ///
    /// Returns the number of signals ingested; a payload or transform
    /// failure is recorded as an Error run and yields zero.
    #[instrument(skip(self, payload), fields(source_id = %id))]
    pub async fn ingest_webhook(&self, id: Uuid, payload: &str) -> Result<usize, RegistryError> {
        let started_at = Utc::now();
        let source = self
            .registry
            .get(id)
            .await
            .ok_or(RegistryError::SourceNotFound(id))?;

        counter!("ingest_webhooks_total").increment(1);

        let report = match webhook::ingest(
            &source.name,
            source.target,
            payload,
            self.transformer.as_ref(),
        )
        .await
        {
            Ok(signals) => {
                let count = signals.len();
                match self.sink.append(signals).await {
                    Ok(()) => RunReport::success(
                        started_at,
                        count,
                        format!("Webhook received. Parsed {} items.", count),
                        payload,
                    ),
                    Err(e) => RunReport::error(
                        started_at,
                        count,
                        format!("Webhook error: {}", e),
                        payload,
                    ),
                }
            }
            Err(e) => {
                warn!(source_name = %source.name, error = %e, "Webhook ingestion failed");
                RunReport::error(started_at, 0, format!("Webhook error: {}", e), payload)
            }
        };

        let ingested = if report.status == RunStatus::Success {
            report.items_count
        } else {
            0
        };
        self.record(id, report).await;
        Ok(ingested)
    }

    /// Probe a source's connectivity without ingesting or logging anything
    pub async fn test_source_connection(&self, id: Uuid) -> Result<TestOutcome, RegistryError> {
        let source = self
            .registry
            .get(id)
            .await
            .ok_or(RegistryError::SourceNotFound(id))?;

        match &source.config {
            SourceConfig::Polling(config) => Ok(self.executor.test_connection(config).await),
            SourceConfig::WebSearch(config) => {
                match self
                    .transformer
                    .research(&source.name, &config.url, source.target)
                    .await
                {
                    Ok(signals) => Ok(TestOutcome {
                        success: true,
                        message: format!("Web research found {} relevant signals.", signals.len()),
                        preview: serde_json::to_value(&signals).ok(),
                    }),
                    Err(e) => Ok(TestOutcome {
                        success: false,
                        message: format!("Error: {}", e),
                        preview: None,
                    }),
                }
            }
        }
    }

    /// Execute one run for a source whose last_run is already stamped
    #[instrument(skip(self), fields(source_id = %id))]
    async fn run_source(&self, id: Uuid, started_at: DateTime<Utc>) {
        // Re-read the source so edits made between trigger and run are seen
        let Some(source) = self.registry.get(id).await else {
            warn!("Source deleted before its run executed");
            return;
        };

        let report = match &source.config {
            SourceConfig::Polling(config) => {
                self.run_polling(&source, config, started_at).await
            }
            SourceConfig::WebSearch(config) => {
                self.run_web_search(&source, config, started_at).await
            }
        };

        counter!(
            "ingest_runs_total",
            "outcome" => report.status.to_string()
        )
        .increment(1);

        self.record(id, report).await;
    }

    /// Polling run: fetch, fall back on fetch failure, transform, append.
    ///
    /// A fetch failure backfills the data path with synthetic records but
    /// the run is still reported as an error; a transform failure after a
    /// successful fetch fails the run cleanly with no substitution.
    async fn run_polling(
        &self,
        source: &Source,
        config: &PollingConfig,
        started_at: DateTime<Utc>,
    ) -> RunReport {
        let mut status = RunStatus::Success;
        let mut message;

        let records = match self.executor.execute(config).await {
            Ok(records) => {
                message = format!("Fetched {} items.", records.len());
                records
            }
            Err(e) => {
                warn!(source_name = %source.name, error = %e, "Fetch failed, using fallback data");
                status = RunStatus::Error;
                message = format!("Fetch failed: {}. Using fallback data.", e);
                fallback_records(config.template, started_at)
            }
        };

        let items_count = records.len();
        let raw = Value::Array(records);
        let serialized = raw.to_string();

        match self
            .transformer
            .transform(&source.name, &raw, source.target)
            .await
        {
            Ok(signals) => {
                info!(
                    source_name = %source.name,
                    signals = signals.len(),
                    "Transformed ingested records"
                );
                if let Err(e) = self.sink.append(signals).await {
                    status = RunStatus::Error;
                    message.push_str(&format!(" Processing failed: {}", e));
                }
            }
            Err(e) => {
                error!(source_name = %source.name, error = %e, "Transformation failed");
                status = RunStatus::Error;
                message.push_str(&format!(" Processing failed: {}", e));
            }
        }

        RunReport {
            started_at,
            status,
            items_count,
            message,
            response_snippet: snippet(&serialized),
        }
    }

    /// Web/search run: research through the transformer, no fallback
    async fn run_web_search(
        &self,
        source: &Source,
        config: &WebSearchConfig,
        started_at: DateTime<Utc>,
    ) -> RunReport {
        match self
            .transformer
            .research(&source.name, &config.url, source.target)
            .await
        {
            Ok(signals) => {
                let count = signals.len();
                let preview = serde_json::to_string(&signals[..signals.len().min(2)])
                    .unwrap_or_default();
                let message = format!("Web research found {} relevant signals.", count);
                match self.sink.append(signals).await {
                    Ok(()) => RunReport::success(started_at, count, message, &preview),
                    Err(e) => RunReport::error(
                        started_at,
                        count,
                        format!("Error: {}", e),
                        &preview,
                    ),
                }
            }
            Err(e) => {
                error!(source_name = %source.name, error = %e, "Web research failed");
                RunReport::error(started_at, 0, format!("Error: {}", e), "")
            }
        }
    }

    async fn record(&self, id: Uuid, report: RunReport) {
        if let Err(e) = self.registry.record_outcome(id, &report).await {
            // Source deleted while its run was in flight; the outcome is lost
            // with the record, which matches whole-source deletion semantics
            warn!(source_id = %id, error = %e, "Could not record run outcome");
        }
    }
}
