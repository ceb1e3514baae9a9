// Run log recording and the source status state machine.
//
// Every execution attempt produces a RunReport; applying it to a source
// stamps last_run with the run's start time, appends an immutable log entry
// and moves the status: Active on success, Error on failure. Entries are
// never edited or reordered.

use crate::models::{RunLog, RunStatus, Source, SourceStatus};
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Maximum stored length of a response snippet, in characters.
pub const SNIPPET_MAX_CHARS: usize = 200;

/// Truncate a raw response to the bounded diagnostic snippet.
pub fn snippet(raw: &str) -> String {
    raw.chars().take(SNIPPET_MAX_CHARS).collect()
}

/// Structured record of one completed execution attempt
#[derive(Debug, Clone)]
pub struct RunReport {
    /// Run start time; becomes the source's last_run
    pub started_at: DateTime<Utc>,
    pub status: RunStatus,
    pub items_count: usize,
    pub message: String,
    pub response_snippet: String,
}

impl RunReport {
    pub fn success(
        started_at: DateTime<Utc>,
        items_count: usize,
        message: impl Into<String>,
        raw_response: &str,
    ) -> Self {
        Self {
            started_at,
            status: RunStatus::Success,
            items_count,
            message: message.into(),
            response_snippet: snippet(raw_response),
        }
    }

    pub fn error(
        started_at: DateTime<Utc>,
        items_count: usize,
        message: impl Into<String>,
        raw_response: &str,
    ) -> Self {
        Self {
            started_at,
            status: RunStatus::Error,
            items_count,
            message: message.into(),
            response_snippet: snippet(raw_response),
        }
    }
}

/// Apply a completed run to a source: last_run, log append, status move.
pub fn apply(source: &mut Source, report: &RunReport) {
    source.last_run = Some(report.started_at);
    source.logs.push(RunLog {
        id: Uuid::new_v4(),
        timestamp: report.started_at,
        status: report.status,
        items_count: report.items_count,
        message: report.message.clone(),
        response_snippet: report.response_snippet.clone(),
    });
    source.status = match report.status {
        RunStatus::Success => SourceStatus::Active,
        RunStatus::Error => SourceStatus::Error,
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Schedule, SignalType, Source};

    fn source() -> Source {
        Source::new_web_search(
            "News",
            SignalType::Market,
            "https://example.com",
            Schedule::hourly(),
        )
    }

    #[test]
    fn test_snippet_bounded_at_200_chars() {
        let long = "x".repeat(500);
        assert_eq!(snippet(&long).chars().count(), 200);
        assert_eq!(snippet("short"), "short");
    }

    #[test]
    fn test_snippet_multibyte_safe() {
        let long = "é".repeat(300);
        let s = snippet(&long);
        assert_eq!(s.chars().count(), 200);
    }

    #[test]
    fn test_apply_success_recovers_from_error() {
        let mut src = source();
        src.status = SourceStatus::Error;
        let started = Utc::now();
        apply(&mut src, &RunReport::success(started, 3, "Fetched 3 items.", "[]"));
        assert_eq!(src.status, SourceStatus::Active);
        assert_eq!(src.last_run, Some(started));
        assert_eq!(src.logs.len(), 1);
        assert_eq!(src.logs[0].items_count, 3);
    }

    #[test]
    fn test_apply_error_transitions_status() {
        let mut src = source();
        apply(
            &mut src,
            &RunReport::error(Utc::now(), 0, "Fetch failed: boom.", "{}"),
        );
        assert_eq!(src.status, SourceStatus::Error);
        assert_eq!(src.logs[0].status, RunStatus::Error);
    }

    #[test]
    fn test_logs_are_append_only_in_order() {
        let mut src = source();
        for n in 0..4 {
            apply(
                &mut src,
                &RunReport::success(Utc::now(), n, format!("Fetched {} items.", n), "[]"),
            );
        }
        let counts: Vec<usize> = src.logs.iter().map(|l| l.items_count).collect();
        assert_eq!(counts, vec![0, 1, 2, 3]);
    }
}
