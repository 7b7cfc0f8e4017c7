//! Ranked dial suggestions.

mod engine;
pub mod ranking;

pub use engine::{
    QueryEdit, SuggestionEngine, SuggestionEngineHandle, SuggestionSnapshot, dialable,
};
pub use ranking::{
    DefaultRanker, RankingInput, RankingLimits, SuggestionRanker, rank, recent_suggestions,
    search_suggestions, stable_hash,
};
