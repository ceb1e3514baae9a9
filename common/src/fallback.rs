// Fallback policy: deterministic synthetic records used when a fetch fails,
// so downstream transformation and the dashboard always have something to
// show. The run itself is still recorded as an error.

use crate::models::SourceTemplate;
use chrono::{DateTime, Utc};
use serde_json::{json, Value};

/// Produce synthetic records appropriate to the source's template.
pub fn fallback_records(template: SourceTemplate, now: DateTime<Utc>) -> Vec<Value> {
    match template {
        SourceTemplate::Freshdesk => vec![
            json!({
                "description_text": "We need dark mode in the mobile app",
                "created_at": now.to_rfc3339(),
                "id": 991,
                "requester": { "name": "John Doe" }
            }),
            json!({
                "description_text": "The export to PDF is broken on Safari",
                "created_at": now.to_rfc3339(),
                "id": 992,
                "requester": { "name": "Jane Smith" }
            }),
        ],
        SourceTemplate::Custom => vec![
            json!({
                "title": "Competitor Y launched a new AI feature",
                "body": "It seems faster than ours.",
                "userId": 1
            }),
            json!({
                "title": "Customer complained about billing",
                "body": "The invoice was wrong.",
                "userId": 2
            }),
        ],
    }
}
