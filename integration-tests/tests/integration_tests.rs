// End-to-end tests for the ingestion engine against a mock HTTP server

use async_trait::async_trait;
use common::errors::TransformError;
use common::executor::{FetchExecutor, HttpFetchExecutor};
use common::models::{
    AuthConfig, HttpMethod, IngestMode, Pagination, PollingConfig, RunStatus, Schedule, Signal,
    SignalType, Source, SourceStatus, SourceTemplate,
};
use common::registry::SourceRegistry;
use common::scheduler::{EngineConfig, IngestionEngine};
use common::transform::{InMemorySignalSink, Transformer};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Transformer stub that maps each raw record to one signal
struct RecordPerSignal;

#[async_trait]
impl Transformer for RecordPerSignal {
    async fn transform(
        &self,
        source_name: &str,
        raw: &Value,
        target: SignalType,
    ) -> Result<Vec<Signal>, TransformError> {
        let count = match raw {
            Value::Array(items) => items.len(),
            _ => 1,
        };
        Ok((0..count)
            .map(|n| Signal {
                id: format!("{}-{}", source_name, n),
                source: source_name.to_string(),
                content: format!("record {}", n),
                signal_type: target,
                date: "September 28, 2026".to_string(),
                author: None,
                url: None,
            })
            .collect())
    }

    async fn research(
        &self,
        _source_name: &str,
        _url: &str,
        _target: SignalType,
    ) -> Result<Vec<Signal>, TransformError> {
        Err(TransformError::ResearchFailed("not under test".to_string()))
    }
}

fn polling_config(
    endpoint: String,
    pagination: Pagination,
    template: SourceTemplate,
) -> PollingConfig {
    PollingConfig {
        endpoint,
        method: HttpMethod::Get,
        headers: HashMap::new(),
        body: None,
        auth: AuthConfig::None,
        pagination,
        template,
        mode: IngestMode::Polling,
    }
}

fn engine_for(registry: Arc<SourceRegistry>, sink: Arc<InMemorySignalSink>) -> IngestionEngine {
    IngestionEngine::new(
        EngineConfig::default(),
        registry,
        Arc::new(HttpFetchExecutor::new(5).expect("client builds")),
        Arc::new(RecordPerSignal),
        sink,
    )
}

fn full_freshdesk_page() -> Value {
    let tickets: Vec<Value> = (0..30)
        .map(|n| json!({ "description_text": format!("ticket {}", n), "id": n }))
        .collect();
    json!({ "results": tickets })
}

#[tokio::test]
async fn pagination_never_exceeds_five_requests() {
    let server = MockServer::start().await;
    // Every page is full, so the server never signals a last page
    Mock::given(method("GET"))
        .and(path("/tickets"))
        .respond_with(ResponseTemplate::new(200).set_body_json(full_freshdesk_page()))
        .mount(&server)
        .await;

    let executor = HttpFetchExecutor::new(5).unwrap();
    let config = polling_config(
        format!("{}/tickets", server.uri()),
        Pagination::PageParam,
        SourceTemplate::Freshdesk,
    );

    let records = executor.execute(&config).await.unwrap();
    assert_eq!(records.len(), 150);
    assert_eq!(server.received_requests().await.unwrap().len(), 5);
}

#[tokio::test]
async fn pagination_stops_on_empty_page() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/tickets"))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "results": [] })))
        .mount(&server)
        .await;

    let executor = HttpFetchExecutor::new(5).unwrap();
    let config = polling_config(
        format!("{}/tickets", server.uri()),
        Pagination::PageParam,
        SourceTemplate::Freshdesk,
    );

    let records = executor.execute(&config).await.unwrap();
    assert!(records.is_empty());
    assert_eq!(server.received_requests().await.unwrap().len(), 1);
}

#[tokio::test]
async fn pagination_stops_on_short_freshdesk_page() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/tickets"))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(full_freshdesk_page()))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/tickets"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(
            json!({ "results": [{ "description_text": "last one", "id": 99 }] }),
        ))
        .mount(&server)
        .await;

    let executor = HttpFetchExecutor::new(5).unwrap();
    let config = polling_config(
        format!("{}/tickets", server.uri()),
        Pagination::PageParam,
        SourceTemplate::Freshdesk,
    );

    let records = executor.execute(&config).await.unwrap();
    // A page below the 30-record full page ends the loop
    assert_eq!(records.len(), 31);
    assert_eq!(server.received_requests().await.unwrap().len(), 2);
}

#[tokio::test]
async fn no_pagination_issues_single_request_without_page_param() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/posts"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([{ "title": "a" }, { "title": "b" }])),
        )
        .mount(&server)
        .await;

    let executor = HttpFetchExecutor::new(5).unwrap();
    let config = polling_config(
        format!("{}/posts", server.uri()),
        Pagination::None,
        SourceTemplate::Custom,
    );

    let records = executor.execute(&config).await.unwrap();
    assert_eq!(records.len(), 2);

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    assert!(requests[0].url.query().is_none());
}

#[tokio::test]
async fn bearer_auth_and_default_content_type_are_sent() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/posts"))
        .and(header("Authorization", "Bearer tok-123"))
        .and(header("Content-Type", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let executor = HttpFetchExecutor::new(5).unwrap();
    let mut config = polling_config(
        format!("{}/posts", server.uri()),
        Pagination::None,
        SourceTemplate::Custom,
    );
    config.auth = AuthConfig::Bearer {
        token: "tok-123".to_string(),
    };

    assert!(executor.execute(&config).await.is_ok());
}

#[tokio::test]
async fn server_error_triggers_fallback_and_error_log() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/posts"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let registry = Arc::new(SourceRegistry::new());
    let sink = Arc::new(InMemorySignalSink::new());
    let engine = engine_for(registry.clone(), sink.clone());

    let source = Source::new_polling(
        "Flaky Feed",
        SignalType::Market,
        polling_config(
            format!("{}/posts", server.uri()),
            Pagination::None,
            SourceTemplate::Custom,
        ),
        Schedule::hourly(),
    );
    let id = source.id;
    registry.add_source(source).await;

    engine.run_source_now(id).await.unwrap();

    let source = registry.get(id).await.unwrap();
    assert_eq!(source.status, SourceStatus::Error);
    let log = &source.logs[0];
    assert_eq!(log.status, RunStatus::Error);
    // Items count reflects the fallback records, not zero
    assert_eq!(log.items_count, 2);
    assert!(log.message.contains("Fetch failed: API Error: 500"));
    assert!(log.response_snippet.len() <= 200);
    // The fallback data was still transformed and stored
    assert_eq!(sink.len().await, 2);
}

#[tokio::test]
async fn successful_run_appends_signals_and_success_log() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/posts"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "title": "Competitor launch" },
            { "title": "Pricing complaint" },
            { "title": "Feature request" }
        ])))
        .mount(&server)
        .await;

    let registry = Arc::new(SourceRegistry::new());
    let sink = Arc::new(InMemorySignalSink::new());
    let engine = engine_for(registry.clone(), sink.clone());

    let source = Source::new_polling(
        "Feed",
        SignalType::External,
        polling_config(
            format!("{}/posts", server.uri()),
            Pagination::None,
            SourceTemplate::Custom,
        ),
        Schedule::hourly(),
    );
    let id = source.id;
    registry.add_source(source).await;

    engine.run_source_now(id).await.unwrap();

    let source = registry.get(id).await.unwrap();
    assert_eq!(source.status, SourceStatus::Active);
    assert!(source.last_run.is_some());
    let log = &source.logs[0];
    assert_eq!(log.status, RunStatus::Success);
    assert_eq!(log.items_count, 3);
    assert_eq!(log.message, "Fetched 3 items.");
    assert_eq!(sink.len().await, 3);
}

#[tokio::test]
async fn webhook_ingestion_end_to_end() {
    let registry = Arc::new(SourceRegistry::new());
    let sink = Arc::new(InMemorySignalSink::new());
    let engine = engine_for(registry.clone(), sink.clone());

    let source = Source::new_polling(
        "Hooked Source",
        SignalType::Internal,
        polling_config(
            "https://unused.example.com".to_string(),
            Pagination::None,
            SourceTemplate::Custom,
        ),
        Schedule::hourly(),
    );
    let id = source.id;
    registry.add_source(source).await;

    // Invalid payload: nothing ingested, error logged
    let ingested = engine.ingest_webhook(id, "not json").await.unwrap();
    assert_eq!(ingested, 0);
    let logs = &registry.get(id).await.unwrap().logs;
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].status, RunStatus::Error);
    assert!(logs[0].message.contains("Invalid JSON"));

    // Valid payload: one object forwarded and stored
    let ingested = engine.ingest_webhook(id, r#"{"a":1}"#).await.unwrap();
    assert_eq!(ingested, 1);
    assert_eq!(sink.len().await, 1);
    let logs = &registry.get(id).await.unwrap().logs;
    assert_eq!(logs.len(), 2);
    assert_eq!(logs[1].status, RunStatus::Success);
}

#[tokio::test]
async fn test_connection_probes_first_page_without_logging() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/tickets"))
        .and(query_param("page", "1"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "results": [{ "id": 1 }] })),
        )
        .mount(&server)
        .await;

    let registry = Arc::new(SourceRegistry::new());
    let engine = engine_for(registry.clone(), Arc::new(InMemorySignalSink::new()));

    let source = Source::new_polling(
        "Probe",
        SignalType::Internal,
        polling_config(
            format!("{}/tickets", server.uri()),
            Pagination::PageParam,
            SourceTemplate::Freshdesk,
        ),
        Schedule::hourly(),
    );
    let id = source.id;
    registry.add_source(source).await;

    let outcome = engine.test_source_connection(id).await.unwrap();
    assert!(outcome.success);
    assert_eq!(outcome.message, "Connection successful! 200 OK");
    assert!(outcome.preview.is_some());
    // Probes are not runs and leave no log
    assert!(registry.get(id).await.unwrap().logs.is_empty());
    assert!(registry.get(id).await.unwrap().last_run.is_none());
}
