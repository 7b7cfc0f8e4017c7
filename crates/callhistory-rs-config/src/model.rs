//! Configuration schema for call history and dial suggestions.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Root config for the call history runtime.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct CallHistoryConfig {
    #[serde(default, rename = "$schema")]
    pub schema: Option<String>,
    #[serde(default)]
    pub paging: PagingConfig,
    #[serde(default)]
    pub suggestions: SuggestionsConfig,
    #[serde(default)]
    pub display: DisplayConfig,
    #[serde(default)]
    pub refresh: RefreshConfig,
}

impl CallHistoryConfig {
    /// Start building a config programmatically with defaults applied.
    pub fn builder() -> CallHistoryConfigBuilder {
        CallHistoryConfigBuilder::new()
    }
}

/// Builder for assembling a `CallHistoryConfig` in code.
#[derive(Debug, Default, Clone)]
pub struct CallHistoryConfigBuilder {
    config: CallHistoryConfig,
}

impl CallHistoryConfigBuilder {
    /// Create a new builder seeded with default config values.
    pub fn new() -> Self {
        Self {
            config: CallHistoryConfig::default(),
        }
    }

    /// Replace the paging configuration.
    pub fn paging(mut self, paging: PagingConfig) -> Self {
        self.config.paging = paging;
        self
    }

    /// Replace the suggestion configuration.
    pub fn suggestions(mut self, suggestions: SuggestionsConfig) -> Self {
        self.config.suggestions = suggestions;
        self
    }

    /// Replace the display configuration.
    pub fn display(mut self, display: DisplayConfig) -> Self {
        self.config.display = display;
        self
    }

    /// Replace the refresh configuration.
    pub fn refresh(mut self, refresh: RefreshConfig) -> Self {
        self.config.refresh = refresh;
        self
    }

    /// Finalize and return the built `CallHistoryConfig`.
    pub fn build(self) -> CallHistoryConfig {
        self.config
    }
}

/// Paging for the full history list.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PagingConfig {
    #[serde(default = "default_page_size")]
    pub page_size: usize,
}

impl Default for PagingConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
        }
    }
}

fn default_page_size() -> usize {
    50
}

/// Dial suggestion tuning.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SuggestionsConfig {
    /// Quiet period after the last digit edit before recomputing.
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
    /// How far back the recent history reaches.
    #[serde(default = "default_recent_window_hours")]
    pub recent_window_hours: u32,
    /// Suggestions shown when nothing is typed.
    #[serde(default = "default_max_recent")]
    pub max_recent: usize,
    /// Suggestions shown while digits are typed.
    #[serde(default = "default_max_search")]
    pub max_search: usize,
}

impl SuggestionsConfig {
    /// Debounce window as a duration.
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    /// Recent history window in milliseconds.
    pub fn recent_window_ms(&self) -> i64 {
        i64::from(self.recent_window_hours) * 60 * 60 * 1000
    }
}

impl Default for SuggestionsConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
            recent_window_hours: default_recent_window_hours(),
            max_recent: default_max_recent(),
            max_search: default_max_search(),
        }
    }
}

fn default_debounce_ms() -> u64 {
    50
}

fn default_recent_window_hours() -> u32 {
    48
}

fn default_max_recent() -> usize {
    6
}

fn default_max_search() -> usize {
    10
}

/// Formatting of derived display fields.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DisplayConfig {
    /// Fixed offset from UTC; the local zone is used when unset.
    #[serde(default)]
    pub utc_offset_minutes: Option<i32>,
    /// strftime pattern for the date header.
    #[serde(default = "default_date_format")]
    pub date_format: String,
    /// strftime pattern for the call time.
    #[serde(default = "default_time_format")]
    pub time_format: String,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            utc_offset_minutes: None,
            date_format: default_date_format(),
            time_format: default_time_format(),
        }
    }
}

fn default_date_format() -> String {
    "%d %b %Y".to_string()
}

fn default_time_format() -> String {
    "%I:%M %p %d-%b-%y".to_string()
}

/// Refresh signal behaviour.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RefreshConfig {
    /// Delay between a call ending and the refresh firing, so the provider
    /// has committed the new row.
    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,
}

impl RefreshConfig {
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            settle_delay_ms: default_settle_delay_ms(),
        }
    }
}

fn default_settle_delay_ms() -> u64 {
    1000
}
