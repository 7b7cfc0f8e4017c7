//! Deterministic ranking of dial suggestions.

use crate::t9;
use async_trait::async_trait;
use callhistory_rs_config::SuggestionsConfig;
use callhistory_rs_protocol::{CallRecord, ContactRecord, Suggestion, SuggestionKind};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Bounds applied by the default ranking rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RankingLimits {
    pub recent_window_ms: i64,
    pub max_recent: usize,
    pub max_search: usize,
}

impl RankingLimits {
    pub fn from_config(config: &SuggestionsConfig) -> Self {
        Self {
            recent_window_ms: config.recent_window_ms(),
            max_recent: config.max_recent,
            max_search: config.max_search,
        }
    }
}

impl Default for RankingLimits {
    fn default() -> Self {
        Self::from_config(&SuggestionsConfig::default())
    }
}

/// Everything one ranking pass reads. Snapshots are shared, never copied.
#[derive(Debug, Clone)]
pub struct RankingInput {
    /// Recent call history, newest first.
    pub history: Arc<Vec<CallRecord>>,
    pub contacts: Arc<Vec<ContactRecord>>,
    pub digits: String,
    pub now_ms: i64,
}

/// Turns a ranking input into suggestions. Runs off the engine's coordinator.
#[async_trait]
pub trait SuggestionRanker: Send + Sync {
    async fn rank(&self, input: RankingInput) -> Vec<Suggestion>;
}

/// Recency ranking for an empty dial pad, call and contact search otherwise.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultRanker {
    limits: RankingLimits,
}

impl DefaultRanker {
    pub fn new(limits: RankingLimits) -> Self {
        Self { limits }
    }
}

#[async_trait]
impl SuggestionRanker for DefaultRanker {
    async fn rank(&self, input: RankingInput) -> Vec<Suggestion> {
        rank(&input, &self.limits)
    }
}

/// Apply the ranking rules to one input.
pub fn rank(input: &RankingInput, limits: &RankingLimits) -> Vec<Suggestion> {
    if input.digits.is_empty() {
        recent_suggestions(
            &input.history,
            input.now_ms,
            limits.recent_window_ms,
            limits.max_recent,
        )
    } else {
        search_suggestions(
            &input.history,
            &input.contacts,
            &input.digits,
            limits.max_search,
        )
    }
}

/// Most frequently called numbers inside the window.
///
/// Ties go to the number called most recently, then to the lower number. Each
/// group is represented by its newest call.
pub fn recent_suggestions(
    records: &[CallRecord],
    now_ms: i64,
    window_ms: i64,
    limit: usize,
) -> Vec<Suggestion> {
    let since_ms = now_ms.saturating_sub(window_ms);
    let mut groups: HashMap<&str, (usize, &CallRecord)> = HashMap::new();
    for record in records.iter().filter(|record| record.timestamp_ms >= since_ms) {
        let group = groups.entry(record.number.as_str()).or_insert((0, record));
        group.0 += 1;
        if record.timestamp_ms > group.1.timestamp_ms {
            group.1 = record;
        }
    }

    let mut groups: Vec<(usize, &CallRecord)> = groups.into_values().collect();
    groups.sort_by(|(a_count, a_latest), (b_count, b_latest)| {
        b_count
            .cmp(a_count)
            .then(b_latest.timestamp_ms.cmp(&a_latest.timestamp_ms))
            .then_with(|| a_latest.number.cmp(&b_latest.number))
    });
    groups
        .into_iter()
        .take(limit)
        .map(|(_, latest)| Suggestion::from(latest))
        .collect()
}

/// Calls whose number contains `digits`, followed by matching contacts, one
/// entry per number.
pub fn search_suggestions(
    records: &[CallRecord],
    contacts: &[ContactRecord],
    digits: &str,
    limit: usize,
) -> Vec<Suggestion> {
    let call_matches = records
        .iter()
        .filter(|record| number_contains(&record.number, digits))
        .map(Suggestion::from);
    let contact_matches = contacts
        .iter()
        .filter(|contact| {
            number_contains(&contact.phone_number, digits)
                || t9::find_match(&contact.display_name, digits).is_some()
        })
        .map(contact_suggestion);

    let mut seen = HashSet::new();
    call_matches
        .chain(contact_matches)
        .filter(|suggestion| seen.insert(suggestion.number.clone()))
        .take(limit)
        .collect()
}

fn number_contains(number: &str, digits: &str) -> bool {
    number.contains(digits) || t9::digits_only(number).contains(digits)
}

fn contact_suggestion(contact: &ContactRecord) -> Suggestion {
    Suggestion {
        id: stable_hash(&contact.phone_number),
        number: contact.phone_number.clone(),
        timestamp_ms: 0,
        duration_sec: 0,
        kind: SuggestionKind::Contact,
        display_name: Some(contact.display_name.clone()),
    }
}

/// 32-bit polynomial string hash (`h = 31 * h + unit` over UTF-16 units).
///
/// Stable across runs and platforms, unlike `std`'s randomized hasher.
pub fn stable_hash(value: &str) -> i64 {
    let hash = value
        .encode_utf16()
        .fold(0i32, |hash, unit| hash.wrapping_mul(31).wrapping_add(i32::from(unit)));
    i64::from(hash)
}

#[cfg(test)]
mod tests {
    use super::{
        RankingInput, RankingLimits, rank, recent_suggestions, search_suggestions, stable_hash,
    };
    use callhistory_rs_protocol::{
        CallRecord, CallType, ContactRecord, Suggestion, SuggestionKind, Weekday,
    };
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    const NOW: i64 = 10 * 24 * 60 * 60 * 1000;
    const HOUR: i64 = 60 * 60 * 1000;
    const WINDOW: i64 = 48 * HOUR;

    fn call(id: i64, number: &str, timestamp_ms: i64) -> CallRecord {
        CallRecord {
            id,
            number: number.to_string(),
            timestamp_ms,
            call_type: CallType::Dialed,
            duration_sec: 30,
            formatted_date: String::new(),
            formatted_time: String::new(),
            day_name: String::new(),
            weekday: Weekday::Mon,
        }
    }

    fn contact(id: i64, name: &str, phone: &str) -> ContactRecord {
        ContactRecord {
            id,
            display_name: name.to_string(),
            phone_number: phone.to_string(),
            photo_ref: None,
        }
    }

    fn numbers(suggestions: &[Suggestion]) -> Vec<&str> {
        suggestions.iter().map(|s| s.number.as_str()).collect()
    }

    fn sorted_desc(mut records: Vec<CallRecord>) -> Vec<CallRecord> {
        records.sort_by(|a, b| b.timestamp_ms.cmp(&a.timestamp_ms));
        records
    }

    #[test]
    fn recency_ranks_by_frequency_inside_window() {
        let records = sorted_desc(vec![
            call(1, "A", NOW - HOUR),
            call(2, "A", NOW - 2 * HOUR),
            call(3, "A", NOW - 3 * HOUR),
            call(4, "B", NOW - 3 * 24 * HOUR),
            call(5, "C", NOW - 4 * HOUR),
            call(6, "C", NOW - 5 * HOUR),
        ]);
        let suggestions = recent_suggestions(&records, NOW, WINDOW, 6);
        assert_eq!(numbers(&suggestions), vec!["A", "C"]);
        assert_eq!(suggestions[0].id, 1);
        assert_eq!(suggestions[1].id, 5);
    }

    #[test]
    fn recency_ties_break_on_latest_call_then_number() {
        let records = sorted_desc(vec![
            call(1, "Z", NOW - HOUR),
            call(2, "M", NOW - 2 * HOUR),
            call(3, "B", NOW - 2 * HOUR),
        ]);
        let suggestions = recent_suggestions(&records, NOW, WINDOW, 6);
        assert_eq!(numbers(&suggestions), vec!["Z", "B", "M"]);
    }

    #[test]
    fn recency_is_capped() {
        let records: Vec<CallRecord> = (0..10)
            .map(|i| call(i, &format!("555-{i:04}"), NOW - (i + 1) * HOUR))
            .collect();
        assert_eq!(recent_suggestions(&records, NOW, WINDOW, 6).len(), 6);
    }

    #[test]
    fn window_boundary_is_inclusive() {
        let records = vec![call(1, "A", NOW - WINDOW), call(2, "B", NOW - WINDOW - 1)];
        assert_eq!(
            numbers(&recent_suggestions(&records, NOW, WINDOW, 6)),
            vec!["A"]
        );
    }

    #[test]
    fn search_matches_number_substring() {
        let records = vec![call(1, "555-0100", NOW), call(2, "444-0100", NOW - 1)];
        let suggestions = search_suggestions(&records, &[], "555", 10);
        assert_eq!(numbers(&suggestions), vec!["555-0100"]);
    }

    #[test]
    fn search_matches_across_formatting() {
        let records = vec![call(1, "(555) 010-0100", NOW)];
        let suggestions = search_suggestions(&records, &[], "5550100", 10);
        assert_eq!(suggestions.len(), 1);
    }

    #[test]
    fn repeated_numbers_collapse_to_most_recent() {
        let records = vec![call(1, "555-0100", NOW), call(2, "555-0100", NOW - HOUR)];
        let suggestions = search_suggestions(&records, &[], "0100", 10);
        assert_eq!(suggestions.len(), 1);
        assert_eq!(suggestions[0].id, 1);
    }

    #[test]
    fn contacts_follow_calls_and_dedupe_by_number() {
        let records = vec![call(1, "555-0100", NOW)];
        let contacts = vec![
            contact(1, "Alice", "555-0100"),
            contact(2, "Jack", "777-0000"),
        ];
        // "5" matches Alice by number and Jack by name (j on 5).
        let suggestions = search_suggestions(&records, &contacts, "5", 10);
        assert_eq!(numbers(&suggestions), vec!["555-0100", "777-0000"]);
        assert_eq!(suggestions[0].kind, SuggestionKind::Call(CallType::Dialed));
        assert_eq!(suggestions[1].kind, SuggestionKind::Contact);
        assert_eq!(suggestions[1].timestamp_ms, 0);
        assert_eq!(suggestions[1].duration_sec, 0);
        assert_eq!(suggestions[1].display_name.as_deref(), Some("Jack"));
        assert_eq!(suggestions[1].id, stable_hash("777-0000"));
    }

    #[test]
    fn search_is_capped() {
        let records: Vec<CallRecord> = (0..20)
            .map(|i| call(i, &format!("555-{i:04}"), NOW - i))
            .collect();
        assert_eq!(search_suggestions(&records, &[], "555", 10).len(), 10);
    }

    #[test]
    fn mode_follows_digits() {
        let input = RankingInput {
            history: Arc::new(vec![call(1, "555-0100", NOW - 3 * 24 * HOUR)]),
            contacts: Arc::new(Vec::new()),
            digits: String::new(),
            now_ms: NOW,
        };
        assert!(rank(&input, &RankingLimits::default()).is_empty());

        let input = RankingInput {
            digits: "555".to_string(),
            ..input
        };
        assert_eq!(rank(&input, &RankingLimits::default()).len(), 1);
    }

    #[test]
    fn stable_hash_is_deterministic() {
        assert_eq!(stable_hash(""), 0);
        assert_eq!(stable_hash("a"), 97);
        assert_eq!(stable_hash("ab"), 97 * 31 + 98);
        assert_eq!(stable_hash("555-0100"), stable_hash("555-0100"));
    }
}
