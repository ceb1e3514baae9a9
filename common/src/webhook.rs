// Webhook ingestion: validate an externally pushed payload and hand it to
// the transformer. Webhook sources are never touched by the scheduler loop.

use crate::errors::WebhookError;
use crate::models::{Signal, SignalType};
use crate::transform::Transformer;
use serde_json::Value;
use uuid::Uuid;

/// Render the display URL an external system should POST payloads to
pub fn webhook_url(host: &str, source_id: Uuid) -> String {
    format!("https://{}/v1/hooks/{}", host, source_id)
}

/// Parse a raw payload and forward it to the transformer.
///
/// A parse failure aborts before any transformation; nothing is forwarded.
pub async fn ingest(
    source_name: &str,
    target: SignalType,
    payload_text: &str,
    transformer: &dyn Transformer,
) -> Result<Vec<Signal>, WebhookError> {
    let payload: Value = serde_json::from_str(payload_text)
        .map_err(|e| WebhookError::InvalidPayload(e.to_string()))?;

    let signals = transformer
        .transform(source_name, &payload, target)
        .await?;

    Ok(signals)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::PassthroughTransformer;

    #[test]
    fn test_webhook_url_format() {
        let id = Uuid::new_v4();
        assert_eq!(
            webhook_url("stories.example.com", id),
            format!("https://stories.example.com/v1/hooks/{}", id)
        );
    }

    #[tokio::test]
    async fn test_ingest_rejects_invalid_json() {
        let result = ingest(
            "Hook",
            SignalType::Internal,
            "not json",
            &PassthroughTransformer,
        )
        .await;
        match result {
            Err(WebhookError::InvalidPayload(_)) => {}
            other => panic!("Expected InvalidPayload, got {:?}", other.map(|s| s.len())),
        }
    }

    #[tokio::test]
    async fn test_ingest_forwards_single_object() {
        let signals = ingest(
            "Hook",
            SignalType::Internal,
            r#"{"a":1}"#,
            &PassthroughTransformer,
        )
        .await
        .unwrap();
        assert_eq!(signals.len(), 1);
    }
}
