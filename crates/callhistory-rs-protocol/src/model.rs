//! Call, contact, query, and page models shared across crates.

use chrono::Weekday;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Placeholder used for call log rows without a number.
pub const UNKNOWN_NUMBER: &str = "Unknown";

/// Direction of a logged call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallType {
    /// Outgoing call placed by the user.
    Dialed,
    /// Incoming call that was answered.
    Received,
    /// Incoming call that was not answered.
    Missed,
    /// Anything the call log reports that we do not classify.
    Unknown,
}

impl CallType {
    /// Lowercase label used in logs and CLI output.
    pub fn as_str(self) -> &'static str {
        match self {
            CallType::Dialed => "dialed",
            CallType::Received => "received",
            CallType::Missed => "missed",
            CallType::Unknown => "unknown",
        }
    }
}

impl fmt::Display for CallType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Call type selection for the history list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeFilter {
    /// Keep every call.
    #[default]
    All,
    Dialed,
    Received,
    Missed,
}

impl TypeFilter {
    /// Whether a call of the given type passes this filter.
    pub fn accepts(self, call_type: CallType) -> bool {
        match self {
            TypeFilter::All => true,
            TypeFilter::Dialed => call_type == CallType::Dialed,
            TypeFilter::Received => call_type == CallType::Received,
            TypeFilter::Missed => call_type == CallType::Missed,
        }
    }
}

impl FromStr for TypeFilter {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(TypeFilter::All),
            "dialed" => Ok(TypeFilter::Dialed),
            "received" => Ok(TypeFilter::Received),
            "missed" => Ok(TypeFilter::Missed),
            other => Err(format!("unknown call type filter: {other}")),
        }
    }
}

/// Weekday selection for the history list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DayFilter {
    /// Keep every day.
    #[default]
    All,
    /// Keep only calls made on this weekday.
    Day(Weekday),
}

impl DayFilter {
    /// Whether a call on the given weekday passes this filter.
    pub fn accepts(self, weekday: Weekday) -> bool {
        match self {
            DayFilter::All => true,
            DayFilter::Day(day) => day == weekday,
        }
    }
}

impl FromStr for DayFilter {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let value = value.trim();
        if value.eq_ignore_ascii_case("all") {
            return Ok(DayFilter::All);
        }
        value
            .parse::<Weekday>()
            .map(DayFilter::Day)
            .map_err(|_| format!("unknown day filter: {value}"))
    }
}

/// A single call log entry with its display fields precomputed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallRecord {
    /// Call log identifier.
    pub id: i64,
    /// Number as stored by the call log, formatting included.
    pub number: String,
    /// Start of the call in epoch milliseconds.
    pub timestamp_ms: i64,
    /// Call direction.
    pub call_type: CallType,
    /// Duration in seconds.
    pub duration_sec: i64,
    /// Date header text, e.g. `05 Jan 2026`.
    pub formatted_date: String,
    /// Time text, e.g. `09:30 AM 05-Jan-26`.
    pub formatted_time: String,
    /// Weekday name, e.g. `Monday`.
    pub day_name: String,
    /// Weekday the call started on, in the display time zone.
    pub weekday: Weekday,
}

/// A contact directory entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactRecord {
    /// Directory identifier.
    pub id: i64,
    /// Name shown to the user.
    pub display_name: String,
    /// Phone number as stored in the directory.
    pub phone_number: String,
    /// Optional photo reference.
    #[serde(default)]
    pub photo_ref: Option<String>,
}

/// User-editable query driving suggestions and the history filters.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SuggestionQueryState {
    /// Digits typed on the dial pad.
    pub digits: String,
    /// Free text typed into the history search box.
    pub search_text: String,
    /// Call type filter.
    pub type_filter: TypeFilter,
    /// Weekday filter.
    pub day_filter: DayFilter,
}

impl SuggestionQueryState {
    /// Query with only the dial pad digits set.
    pub fn with_digits(digits: impl Into<String>) -> Self {
        Self {
            digits: digits.into(),
            ..Self::default()
        }
    }
}

/// One page of the call history list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    /// Records in canonical order.
    pub items: Vec<CallRecord>,
    /// Offset of the previous page, if any.
    pub prev_cursor: Option<usize>,
    /// Offset of the next page; `None` once the source ran dry.
    pub next_cursor: Option<usize>,
}

/// Where a suggestion came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "source", content = "call_type")]
pub enum SuggestionKind {
    /// A logged call.
    Call(CallType),
    /// A directory contact.
    Contact,
}

/// Ranked dial suggestion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suggestion {
    /// Call id, or a stable hash of the phone number for contacts.
    pub id: i64,
    /// Number to dial.
    pub number: String,
    /// Call start, `0` for contacts.
    pub timestamp_ms: i64,
    /// Call duration, `0` for contacts.
    pub duration_sec: i64,
    /// Origin of the suggestion.
    pub kind: SuggestionKind,
    /// Contact name when the suggestion came from the directory.
    #[serde(default)]
    pub display_name: Option<String>,
}

impl From<&CallRecord> for Suggestion {
    fn from(record: &CallRecord) -> Self {
        Self {
            id: record.id,
            number: record.number.clone(),
            timestamp_ms: record.timestamp_ms,
            duration_sec: record.duration_sec,
            kind: SuggestionKind::Call(record.call_type),
            display_name: None,
        }
    }
}
