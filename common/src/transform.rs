// External collaborator seams: the AI transformer and the signal sink
//
// The engine only depends on these traits. The AI service that clusters
// signals into stories lives behind `Transformer`; the dashboard state that
// accumulates signals lives behind `SignalSink`.

use crate::errors::{SinkError, TransformError};
use crate::models::{format_standard_date, Signal, SignalType};
use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Transformer turns raw heterogeneous JSON into normalized signals, and
/// researches web/search sources.
#[async_trait]
pub trait Transformer: Send + Sync {
    /// Normalize raw fetched or pushed data into signals
    async fn transform(
        &self,
        source_name: &str,
        raw: &Value,
        target: SignalType,
    ) -> Result<Vec<Signal>, TransformError>;

    /// Research a web/search source and return the signals it yields
    async fn research(
        &self,
        source_name: &str,
        url: &str,
        target: SignalType,
    ) -> Result<Vec<Signal>, TransformError>;
}

/// SignalSink receives the signals produced by each run
#[async_trait]
pub trait SignalSink: Send + Sync {
    async fn append(&self, signals: Vec<Signal>) -> Result<(), SinkError>;
}

/// Stand-in transformer used until the AI service is wired in.
///
/// Maps each raw record to one signal with a best-effort content field; it
/// cannot research web sources.
pub struct PassthroughTransformer;

impl PassthroughTransformer {
    fn record_content(record: &Value) -> String {
        if let Some(text) = record.get("description_text").and_then(Value::as_str) {
            return text.to_string();
        }
        match (
            record.get("title").and_then(Value::as_str),
            record.get("body").and_then(Value::as_str),
        ) {
            (Some(title), Some(body)) => format!("{}: {}", title, body),
            (Some(title), None) => title.to_string(),
            (None, Some(body)) => body.to_string(),
            (None, None) => record.to_string(),
        }
    }

    fn record_author(record: &Value) -> Option<String> {
        record
            .get("requester")
            .and_then(|r| r.get("name"))
            .and_then(Value::as_str)
            .map(str::to_string)
    }
}

#[async_trait]
impl Transformer for PassthroughTransformer {
    async fn transform(
        &self,
        source_name: &str,
        raw: &Value,
        target: SignalType,
    ) -> Result<Vec<Signal>, TransformError> {
        let date = format_standard_date(Utc::now());
        let records: Vec<&Value> = match raw {
            Value::Array(items) => items.iter().collect(),
            other => vec![other],
        };

        Ok(records
            .into_iter()
            .map(|record| Signal {
                id: Uuid::new_v4().to_string(),
                source: source_name.to_string(),
                content: Self::record_content(record),
                signal_type: target,
                date: date.clone(),
                author: Self::record_author(record),
                url: record
                    .get("url")
                    .and_then(Value::as_str)
                    .map(str::to_string),
            })
            .collect())
    }

    async fn research(
        &self,
        _source_name: &str,
        url: &str,
        _target: SignalType,
    ) -> Result<Vec<Signal>, TransformError> {
        Err(TransformError::ResearchFailed(format!(
            "no research backend configured for {}",
            url
        )))
    }
}

/// In-memory signal sink backing the daemon and tests
#[derive(Default)]
pub struct InMemorySignalSink {
    signals: Arc<RwLock<Vec<Signal>>>,
}

impl InMemorySignalSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.signals.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.signals.read().await.is_empty()
    }

    pub async fn snapshot(&self) -> Vec<Signal> {
        self.signals.read().await.clone()
    }
}

#[async_trait]
impl SignalSink for InMemorySignalSink {
    async fn append(&self, signals: Vec<Signal>) -> Result<(), SinkError> {
        self.signals.write().await.extend(signals);
        Ok(())
    }
}
