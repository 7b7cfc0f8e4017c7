//! Call history paging and dial suggestion engine.
//!
//! The leaves are pure: T9 matching, history filters and ranking. On top of
//! them sit the contact name cache, the sequential history pager and the
//! suggestion engine, which runs as its own task and publishes snapshots.

pub mod contact_cache;
pub mod error;
pub mod filter;
pub mod history;
pub mod ingest;
pub mod paging;
pub mod refresh;
pub mod sources;
pub mod suggestions;
pub mod t9;

pub use contact_cache::{ContactCache, ContactCacheMap};
pub use error::CallHistoryError;
pub use filter::{HistoryFilter, by_day, by_text, by_type, filter_contacts};
pub use history::{CallDetails, CallHistoryView, DateSection, call_details};
pub use ingest::{RecordFormatter, call_type_from_code};
pub use paging::{HistoryPager, PageLoad, Paginator};
pub use refresh::{RefreshReason, RefreshSignal};
pub use sources::{FileCallLog, FileContactDirectory, LogDialer};
pub use suggestions::{
    DefaultRanker, QueryEdit, RankingInput, RankingLimits, SuggestionEngine,
    SuggestionEngineHandle, SuggestionRanker, SuggestionSnapshot, dialable,
};
