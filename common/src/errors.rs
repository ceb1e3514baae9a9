// Error types for the ingestion engine

use thiserror::Error;

/// Errors raised while fetching a polling source
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("HTTP request failed: {0}")]
    RequestFailed(String),

    #[error("API Error: {status} {reason}")]
    Status { status: u16, reason: String },

    #[error("Response was not valid JSON: {0}")]
    InvalidResponse(String),

    #[error("Invalid source configuration: {0}")]
    InvalidConfiguration(String),
}

/// Errors surfaced by the external transformer collaborator
#[derive(Error, Debug)]
pub enum TransformError {
    #[error("Transformation failed: {0}")]
    Failed(String),

    #[error("Web research failed: {0}")]
    ResearchFailed(String),
}

/// Errors raised while ingesting a webhook payload
#[derive(Error, Debug)]
pub enum WebhookError {
    #[error("Invalid JSON payload: {0}")]
    InvalidPayload(String),

    #[error("Transformation failed: {0}")]
    Transform(#[from] TransformError),
}

/// Errors raised by registry operations
#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("Source not found: {0}")]
    SourceNotFound(uuid::Uuid),
}

/// Errors raised when appending signals to the signal sink
#[derive(Error, Debug)]
pub enum SinkError {
    #[error("Failed to store signals: {0}")]
    StoreFailed(String),
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        FetchError::RequestFailed(err.to_string())
    }
}
