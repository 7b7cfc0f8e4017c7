//! Shared data model and collaborator interfaces for call history and dial suggestions.

mod clock;
mod model;
mod source;

pub use clock::{Clock, SystemClock};

pub use model::{
    CallRecord, CallType, ContactRecord, DayFilter, Page, Suggestion, SuggestionKind,
    SuggestionQueryState, TypeFilter, UNKNOWN_NUMBER,
};
pub use source::{
    CallLogRow, CallLogSource, ContactDirectory, ContactMatch, DataSourceError, Dialer,
    INCOMING_TYPE, MISSED_TYPE, OUTGOING_TYPE,
};

/// Re-exported so downstream crates name weekdays with the same type.
pub use chrono::Weekday;
