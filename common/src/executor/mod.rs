// Executor module for polling-source retrieval

pub mod http;

use crate::errors::FetchError;
use crate::models::PollingConfig;
use async_trait::async_trait;
use serde_json::Value;

pub use http::HttpFetchExecutor;

/// Result of an operator-initiated connection test
#[derive(Debug, Clone)]
pub struct TestOutcome {
    pub success: bool,
    pub message: String,
    /// First page of data for preview when the probe succeeded
    pub preview: Option<Value>,
}

/// FetchExecutor performs the network retrieval for a polling source
#[async_trait]
pub trait FetchExecutor: Send + Sync {
    /// Fetch all pages of raw records for a polling source
    async fn execute(&self, config: &PollingConfig) -> Result<Vec<Value>, FetchError>;

    /// Probe the first page without ingesting anything
    async fn test_connection(&self, config: &PollingConfig) -> TestOutcome;
}
