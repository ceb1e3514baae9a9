// HTTP fetch executor: variable substitution, auth headers, bounded
// pagination, raw-result aggregation.

use crate::errors::FetchError;
use crate::executor::{FetchExecutor, TestOutcome};
use crate::models::{AuthConfig, HttpMethod, Pagination, PollingConfig, SourceTemplate};
use crate::substitution::TemplateSubstitutor;
use async_trait::async_trait;
use base64::Engine as _;
use chrono::Utc;
use reqwest::{Client, Method};
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;

/// Hard safety cap on pagination requests per run, never exceeded
/// regardless of server signals.
pub const MAX_PAGES: u32 = 5;

/// A Freshdesk page shorter than this signals the last page.
const FRESHDESK_FULL_PAGE: usize = 30;

pub struct HttpFetchExecutor {
    client: Client,
    substitutor: TemplateSubstitutor,
}

impl HttpFetchExecutor {
    /// Create a new executor with the specified per-request timeout
    pub fn new(timeout_seconds: u64) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .build()
            .map_err(|e| {
                FetchError::RequestFailed(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self {
            client,
            substitutor: TemplateSubstitutor::new(),
        })
    }

    fn convert_method(method: HttpMethod) -> Method {
        match method {
            HttpMethod::Get => Method::GET,
            HttpMethod::Post => Method::POST,
        }
    }

    /// Merge user headers with the default content type and auth header
    fn build_headers(config: &PollingConfig) -> HashMap<String, String> {
        let mut headers = config.headers.clone();

        if !headers.contains_key("Content-Type") {
            headers.insert("Content-Type".to_string(), "application/json".to_string());
        }

        match &config.auth {
            AuthConfig::None => {}
            AuthConfig::Basic { api_key } => {
                // Freshdesk-style credential: the key is the user, "X" the password
                let token =
                    base64::engine::general_purpose::STANDARD.encode(format!("{}:X", api_key));
                headers.insert("Authorization".to_string(), format!("Basic {}", token));
            }
            AuthConfig::Bearer { token } => {
                headers.insert("Authorization".to_string(), format!("Bearer {}", token));
            }
        }

        headers
    }

    /// Append the page-number query parameter when the strategy requires it
    fn page_url(base: &str, pagination: Pagination, page: u32) -> String {
        match pagination {
            Pagination::None => base.to_string(),
            Pagination::PageParam => {
                let separator = if base.contains('?') { '&' } else { '?' };
                format!("{}{}page={}", base, separator, page)
            }
        }
    }

    /// Unwrap one page's records according to the source template
    fn unwrap_records(template: SourceTemplate, data: Value) -> Vec<Value> {
        if template == SourceTemplate::Freshdesk {
            if let Some(Value::Array(results)) = data.get("results").cloned() {
                return results;
            }
        }
        match data {
            Value::Array(items) => items,
            other => vec![other],
        }
    }

    async fn request_page(
        &self,
        config: &PollingConfig,
        url: &str,
        headers: &HashMap<String, String>,
        body: &str,
    ) -> Result<Value, FetchError> {
        let mut request = self
            .client
            .request(Self::convert_method(config.method), url);

        for (key, value) in headers {
            request = request.header(key, value);
        }

        if config.method == HttpMethod::Post && !body.is_empty() {
            request = request.body(body.to_string());
        }

        tracing::debug!(url, "Fetching page");
        let response = request.send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or("Unknown").to_string(),
            });
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| FetchError::InvalidResponse(e.to_string()))
    }
}

#[async_trait]
impl FetchExecutor for HttpFetchExecutor {
    #[tracing::instrument(skip(self, config), fields(endpoint = %config.endpoint))]
    async fn execute(&self, config: &PollingConfig) -> Result<Vec<Value>, FetchError> {
        let now = Utc::now();
        let url = self.substitutor.substitute(&config.endpoint, now);
        let body = self
            .substitutor
            .substitute(config.body.as_deref().unwrap_or(""), now);
        let headers = Self::build_headers(config);

        let mut all_records = Vec::new();
        let mut page = 1u32;

        while page <= MAX_PAGES {
            let page_url = Self::page_url(&url, config.pagination, page);
            let data = self.request_page(config, &page_url, &headers, &body).await?;

            let page_records = Self::unwrap_records(config.template, data);
            if page_records.is_empty() {
                break;
            }

            let page_len = page_records.len();
            all_records.extend(page_records);

            if config.pagination == Pagination::None {
                break;
            }
            if config.template == SourceTemplate::Freshdesk && page_len < FRESHDESK_FULL_PAGE {
                break;
            }

            page += 1;
        }

        tracing::info!(records = all_records.len(), pages = page.min(MAX_PAGES), "Fetch complete");
        Ok(all_records)
    }

    #[tracing::instrument(skip(self, config), fields(endpoint = %config.endpoint))]
    async fn test_connection(&self, config: &PollingConfig) -> TestOutcome {
        let now = Utc::now();
        let url = self.substitutor.substitute(&config.endpoint, now);
        let body = self
            .substitutor
            .substitute(config.body.as_deref().unwrap_or(""), now);
        let headers = Self::build_headers(config);
        let probe_url = Self::page_url(&url, config.pagination, 1);

        match self.request_page(config, &probe_url, &headers, &body).await {
            Ok(data) => TestOutcome {
                success: true,
                message: "Connection successful! 200 OK".to_string(),
                preview: Some(data),
            },
            Err(FetchError::Status { status, reason }) => TestOutcome {
                success: false,
                message: format!("Failed: {} {}", status, reason),
                preview: None,
            },
            Err(e) => TestOutcome {
                success: false,
                message: format!("Network Error: {}", e),
                preview: None,
            },
        }
    }
}
