// In-memory source registry owned by the scheduler engine.
//
// All mutations are whole-record replacements keyed by source id under one
// write lock; concurrent runs for different sources touch disjoint records.
// Nothing is persisted across restarts.

use crate::errors::RegistryError;
use crate::models::{Source, SourceStatus};
use crate::runlog::{self, RunReport};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Default)]
pub struct SourceRegistry {
    sources: RwLock<HashMap<Uuid, Source>>,
}

impl SourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_source(&self, source: Source) {
        self.sources.write().await.insert(source.id, source);
    }

    /// Replace a source's configuration; logs and lifecycle travel with the
    /// replacement record.
    pub async fn update_source(&self, source: Source) -> Result<(), RegistryError> {
        let mut sources = self.sources.write().await;
        if !sources.contains_key(&source.id) {
            return Err(RegistryError::SourceNotFound(source.id));
        }
        sources.insert(source.id, source);
        Ok(())
    }

    /// Delete a source and discard its logs
    pub async fn remove_source(&self, id: Uuid) -> Result<(), RegistryError> {
        self.sources
            .write()
            .await
            .remove(&id)
            .map(|_| ())
            .ok_or(RegistryError::SourceNotFound(id))
    }

    pub async fn get(&self, id: Uuid) -> Option<Source> {
        self.sources.read().await.get(&id).cloned()
    }

    pub async fn list(&self) -> Vec<Source> {
        self.sources.read().await.values().cloned().collect()
    }

    /// Sources eligible for scheduling this tick
    pub async fn active_sources(&self) -> Vec<Source> {
        self.sources
            .read()
            .await
            .values()
            .filter(|s| s.status == SourceStatus::Active)
            .cloned()
            .collect()
    }

    /// Stamp last_run at the start of a run, before the outcome is known,
    /// so the recency guard reflects attempt time.
    pub async fn mark_run_started(
        &self,
        id: Uuid,
        started_at: DateTime<Utc>,
    ) -> Result<(), RegistryError> {
        let mut sources = self.sources.write().await;
        let source = sources
            .get_mut(&id)
            .ok_or(RegistryError::SourceNotFound(id))?;
        source.last_run = Some(started_at);
        Ok(())
    }

    /// Record a completed run: last_run, log append and status transition
    /// happen under one write lock.
    pub async fn record_outcome(&self, id: Uuid, report: &RunReport) -> Result<(), RegistryError> {
        let mut sources = self.sources.write().await;
        let source = sources
            .get_mut(&id)
            .ok_or(RegistryError::SourceNotFound(id))?;
        runlog::apply(source, report);
        Ok(())
    }
}
