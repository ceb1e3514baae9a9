use chrono::{DateTime, NaiveDateTime, Utc, Weekday};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Standard long date: 'September 24, 2026'
pub fn format_standard_date(ts: DateTime<Utc>) -> String {
    ts.format("%B %-d, %Y").to_string()
}

/// Standard datetime: 'September 24, 2026 10:00:14 AM'
pub fn format_standard_datetime(ts: DateTime<Utc>) -> String {
    ts.format("%B %-d, %Y %-I:%M:%S %p").to_string()
}

// Run log timestamps are part of the operator-facing contract and serialize
// in the standard datetime format rather than RFC 3339.
fn serialize_standard_datetime<S>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&format_standard_datetime(*ts))
}

fn deserialize_standard_datetime<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    let naive = NaiveDateTime::parse_from_str(&s, "%B %-d, %Y %-I:%M:%S %p")
        .map_err(serde::de::Error::custom)?;
    Ok(DateTime::from_naive_utc_and_offset(naive, Utc))
}

// ============================================================================
// Signal Models
// ============================================================================

/// SignalType classifies where a signal originated relative to the product
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum SignalType {
    Internal,
    External,
    Market,
}

impl fmt::Display for SignalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignalType::Internal => write!(f, "Internal"),
            SignalType::External => write!(f, "External"),
            SignalType::Market => write!(f, "Market"),
        }
    }
}

/// Signal is a normalized unit of feedback produced by the transformer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Signal {
    pub id: String,
    /// Display name of the originating source, e.g. "Freshdesk"
    pub source: String,
    pub content: String,
    #[serde(rename = "type")]
    pub signal_type: SignalType,
    /// Standard long date, e.g. 'September 24, 2026'
    pub date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

// ============================================================================
// Schedule Models
// ============================================================================

/// Frequency defines the cadence class of a source's schedule
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Frequency {
    Hourly,
    Daily,
    Weekly,
    Monthly,
}

/// Time of day in 24-hour clock, minute precision
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct TimeOfDay {
    pub hour: u32,
    pub minute: u32,
}

impl TimeOfDay {
    pub fn new(hour: u32, minute: u32) -> Option<Self> {
        if hour < 24 && minute < 60 {
            Some(Self { hour, minute })
        } else {
            None
        }
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

impl FromStr for TimeOfDay {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (h, m) = s
            .split_once(':')
            .ok_or_else(|| format!("Invalid time of day: {}", s))?;
        let hour: u32 = h.parse().map_err(|_| format!("Invalid hour: {}", h))?;
        let minute: u32 = m.parse().map_err(|_| format!("Invalid minute: {}", m))?;
        TimeOfDay::new(hour, minute).ok_or_else(|| format!("Time of day out of range: {}", s))
    }
}

/// Day of week for weekly schedules, stored by full name
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum DayOfWeek {
    Sunday,
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
}

impl DayOfWeek {
    pub fn matches(&self, weekday: Weekday) -> bool {
        matches!(
            (self, weekday),
            (DayOfWeek::Sunday, Weekday::Sun)
                | (DayOfWeek::Monday, Weekday::Mon)
                | (DayOfWeek::Tuesday, Weekday::Tue)
                | (DayOfWeek::Wednesday, Weekday::Wed)
                | (DayOfWeek::Thursday, Weekday::Thu)
                | (DayOfWeek::Friday, Weekday::Fri)
                | (DayOfWeek::Saturday, Weekday::Sat)
        )
    }
}

/// Schedule defines when a poll-driven source should execute
///
/// The optional fields are required by some frequencies: Daily, Weekly and
/// Monthly need `time_of_day`; Weekly needs `day_of_week`; Monthly needs
/// `day_of_month` (1-31). Hourly ignores all of them and fires on the hour.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Schedule {
    pub frequency: Frequency,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_of_day: Option<TimeOfDay>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub day_of_week: Option<DayOfWeek>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub day_of_month: Option<u32>,
}

impl Schedule {
    pub fn hourly() -> Self {
        Self {
            frequency: Frequency::Hourly,
            time_of_day: None,
            day_of_week: None,
            day_of_month: None,
        }
    }

    pub fn daily(time_of_day: TimeOfDay) -> Self {
        Self {
            frequency: Frequency::Daily,
            time_of_day: Some(time_of_day),
            day_of_week: None,
            day_of_month: None,
        }
    }

    pub fn weekly(day_of_week: DayOfWeek, time_of_day: TimeOfDay) -> Self {
        Self {
            frequency: Frequency::Weekly,
            time_of_day: Some(time_of_day),
            day_of_week: Some(day_of_week),
            day_of_month: None,
        }
    }

    pub fn monthly(day_of_month: u32, time_of_day: TimeOfDay) -> Self {
        Self {
            frequency: Frequency::Monthly,
            time_of_day: Some(time_of_day),
            day_of_week: None,
            day_of_month: Some(day_of_month),
        }
    }
}

// ============================================================================
// Source Models
// ============================================================================

/// How a polling integration receives its data
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum IngestMode {
    Polling,
    Webhook,
}

/// HttpMethod represents supported HTTP request methods
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
}

/// AuthConfig represents outbound HTTP authentication for a polling source
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AuthConfig {
    None,
    Basic { api_key: String },
    Bearer { token: String },
}

/// Pagination strategy for multi-page API results
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Pagination {
    None,
    /// Append a `page=N` query parameter and advance until the last page
    PageParam,
}

/// SourceTemplate affects response unwrapping and full-page detection
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SourceTemplate {
    Custom,
    Freshdesk,
}

/// Configuration for a polling integration source
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollingConfig {
    pub endpoint: String,
    pub method: HttpMethod,
    #[serde(default)]
    pub headers: HashMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    pub auth: AuthConfig,
    pub pagination: Pagination,
    pub template: SourceTemplate,
    pub mode: IngestMode,
}

/// Configuration for a web/search source (always poll-driven)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebSearchConfig {
    /// The target URL to monitor or research
    pub url: String,
}

/// SourceConfig is the polymorphic part of a source definition
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SourceConfig {
    Polling(PollingConfig),
    WebSearch(WebSearchConfig),
}

impl SourceConfig {
    /// Webhook-mode sources only execute on external invocation
    pub fn is_webhook(&self) -> bool {
        matches!(
            self,
            SourceConfig::Polling(PollingConfig {
                mode: IngestMode::Webhook,
                ..
            })
        )
    }
}

/// SourceStatus is the tri-state lifecycle flag of a source
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum SourceStatus {
    Active,
    Inactive,
    Error,
}

impl fmt::Display for SourceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceStatus::Active => write!(f, "Active"),
            SourceStatus::Inactive => write!(f, "Inactive"),
            SourceStatus::Error => write!(f, "Error"),
        }
    }
}

impl FromStr for SourceStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Active" => Ok(SourceStatus::Active),
            "Inactive" => Ok(SourceStatus::Inactive),
            "Error" => Ok(SourceStatus::Error),
            _ => Err(format!("Invalid source status: {}", s)),
        }
    }
}

/// Source represents one configured origin of signals
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Source {
    pub id: Uuid,
    pub name: String,
    /// Signal class stamped on records ingested from this source
    pub target: SignalType,
    pub config: SourceConfig,
    pub schedule: Schedule,
    pub status: SourceStatus,
    /// Timestamp of the most recent execution start; None means "Never"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_run: Option<DateTime<Utc>>,
    /// Append-only; insertion order is chronological
    #[serde(default)]
    pub logs: Vec<RunLog>,
}

impl Source {
    /// Create a new polling integration with a fresh lifecycle
    pub fn new_polling(
        name: impl Into<String>,
        target: SignalType,
        config: PollingConfig,
        schedule: Schedule,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            target,
            config: SourceConfig::Polling(config),
            schedule,
            status: SourceStatus::Active,
            last_run: None,
            logs: Vec::new(),
        }
    }

    /// Create a new web/search source with a fresh lifecycle
    pub fn new_web_search(
        name: impl Into<String>,
        target: SignalType,
        url: impl Into<String>,
        schedule: Schedule,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            target,
            config: SourceConfig::WebSearch(WebSearchConfig { url: url.into() }),
            schedule,
            status: SourceStatus::Active,
            last_run: None,
            logs: Vec::new(),
        }
    }
}

// ============================================================================
// Run Log Models
// ============================================================================

/// Outcome of a single run
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum RunStatus {
    Success,
    Error,
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunStatus::Success => write!(f, "Success"),
            RunStatus::Error => write!(f, "Error"),
        }
    }
}

/// RunLog is an immutable record of one execution attempt
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunLog {
    pub id: Uuid,
    #[serde(
        serialize_with = "serialize_standard_datetime",
        deserialize_with = "deserialize_standard_datetime"
    )]
    pub timestamp: DateTime<Utc>,
    pub status: RunStatus,
    #[serde(rename = "itemsCount")]
    pub items_count: usize,
    pub message: String,
    /// First 200 characters of the serialized raw result
    #[serde(rename = "responseSnippet")]
    pub response_snippet: String,
}
