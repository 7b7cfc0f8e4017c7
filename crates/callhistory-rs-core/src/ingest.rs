//! Conversion of raw call log rows into display-ready call records.

use callhistory_rs_config::DisplayConfig;
use callhistory_rs_protocol::{
    CallLogRow, CallRecord, CallType, INCOMING_TYPE, MISSED_TYPE, OUTGOING_TYPE, UNKNOWN_NUMBER,
};
use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, Datelike, Duration, FixedOffset, Local, Offset, Utc};
use log::warn;

const DAY_FORMAT: &str = "%A";
const SECTION_FORMAT: &str = "%A, %b %d";

/// Map a provider type code onto a call type. Unrecognised codes degrade to `Unknown`.
pub fn call_type_from_code(code: i32) -> CallType {
    match code {
        OUTGOING_TYPE => CallType::Dialed,
        INCOMING_TYPE => CallType::Received,
        MISSED_TYPE => CallType::Missed,
        _ => CallType::Unknown,
    }
}

/// Computes the derived display fields of a call once, at ingestion.
#[derive(Debug, Clone)]
pub struct RecordFormatter {
    offset: FixedOffset,
    date_format: String,
    time_format: String,
}

impl RecordFormatter {
    /// Build a formatter from display settings, falling back to the default
    /// patterns when a configured one is not valid strftime.
    pub fn from_config(display: &DisplayConfig) -> Self {
        let defaults = DisplayConfig::default();
        let offset = match display.utc_offset_minutes {
            Some(minutes) => minutes
                .checked_mul(60)
                .and_then(FixedOffset::east_opt)
                .unwrap_or_else(|| {
                    warn!("utc offset out of range, using UTC (minutes={minutes})");
                    Utc.fix()
                }),
            None => Local::now().offset().fix(),
        };
        Self {
            offset,
            date_format: checked_format(&display.date_format, defaults.date_format),
            time_format: checked_format(&display.time_format, defaults.time_format),
        }
    }

    /// Formatter with default patterns pinned to UTC.
    pub fn utc() -> Self {
        Self::from_config(&DisplayConfig {
            utc_offset_minutes: Some(0),
            ..DisplayConfig::default()
        })
    }

    /// Convert a single row. Rows without a number get the `Unknown` placeholder.
    pub fn record(&self, row: CallLogRow) -> CallRecord {
        let local = self.local_time(row.timestamp_ms);
        CallRecord {
            id: row.id,
            number: row.number.unwrap_or_else(|| UNKNOWN_NUMBER.to_string()),
            timestamp_ms: row.timestamp_ms,
            call_type: call_type_from_code(row.type_code),
            duration_sec: row.duration_sec.max(0),
            formatted_date: local.format(&self.date_format).to_string(),
            formatted_time: local.format(&self.time_format).to_string(),
            day_name: local.format(DAY_FORMAT).to_string(),
            weekday: local.weekday(),
        }
    }

    /// Convert a batch of rows into canonical (newest first) order.
    pub fn records(&self, rows: Vec<CallLogRow>) -> Vec<CallRecord> {
        let mut records: Vec<CallRecord> = rows.into_iter().map(|row| self.record(row)).collect();
        records.sort_by(|a, b| b.timestamp_ms.cmp(&a.timestamp_ms));
        records
    }

    /// Section header for grouping the history list: `Today`, `Yesterday`, or
    /// a dated label such as `Monday, Jan 05`.
    pub fn date_section(&self, timestamp_ms: i64, now_ms: i64) -> String {
        let call_day = self.local_time(timestamp_ms).date_naive();
        let today = self.local_time(now_ms).date_naive();
        if call_day == today {
            "Today".to_string()
        } else if Some(call_day) == today.checked_sub_signed(Duration::days(1)) {
            "Yesterday".to_string()
        } else {
            self.local_time(timestamp_ms)
                .format(SECTION_FORMAT)
                .to_string()
        }
    }

    fn local_time(&self, timestamp_ms: i64) -> DateTime<FixedOffset> {
        DateTime::from_timestamp_millis(timestamp_ms)
            .unwrap_or_default()
            .with_timezone(&self.offset)
    }
}

fn checked_format(pattern: &str, fallback: String) -> String {
    if StrftimeItems::new(pattern).any(|item| matches!(item, Item::Error)) {
        warn!("invalid display format, using default (pattern={pattern})");
        fallback
    } else {
        pattern.to_string()
    }
}
