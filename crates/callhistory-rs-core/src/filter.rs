//! Composable predicates over call records and contacts.

use crate::contact_cache::ContactCacheMap;
use callhistory_rs_protocol::{
    CallRecord, ContactRecord, DayFilter, SuggestionQueryState, TypeFilter,
};

/// Keep records whose number, or cached contact name, contains `query`
/// ignoring case. A blank query keeps everything.
pub fn by_text<'a>(
    query: &str,
    names: &'a ContactCacheMap,
) -> impl Fn(&CallRecord) -> bool + use<'a> {
    let needle = query.trim().to_lowercase();
    move |record| {
        if needle.is_empty() {
            return true;
        }
        if record.number.to_lowercase().contains(&needle) {
            return true;
        }
        names
            .get(&record.number)
            .and_then(Option::as_deref)
            .is_some_and(|name| name.to_lowercase().contains(&needle))
    }
}

/// Keep records of the selected call type.
pub fn by_type(type_filter: TypeFilter) -> impl Fn(&CallRecord) -> bool {
    move |record| type_filter.accepts(record.call_type)
}

/// Keep records placed on the selected weekday.
pub fn by_day(day_filter: DayFilter) -> impl Fn(&CallRecord) -> bool {
    move |record| day_filter.accepts(record.weekday)
}

/// The three history list filters applied together.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HistoryFilter {
    pub search_text: String,
    pub type_filter: TypeFilter,
    pub day_filter: DayFilter,
}

impl HistoryFilter {
    /// Filter settings taken from the current query state.
    pub fn from_query(query: &SuggestionQueryState) -> Self {
        Self {
            search_text: query.search_text.clone(),
            type_filter: query.type_filter,
            day_filter: query.day_filter,
        }
    }

    /// Records passing every filter, in their original order.
    pub fn apply(&self, records: &[CallRecord], names: &ContactCacheMap) -> Vec<CallRecord> {
        let text = by_text(&self.search_text, names);
        let call_type = by_type(self.type_filter);
        let day = by_day(self.day_filter);
        records
            .iter()
            .filter(|&record| text(record) && call_type(record) && day(record))
            .cloned()
            .collect()
    }
}

/// Contacts whose name or number contains `query` ignoring case.
pub fn filter_contacts(contacts: &[ContactRecord], query: &str) -> Vec<ContactRecord> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return contacts.to_vec();
    }
    contacts
        .iter()
        .filter(|contact| {
            contact.display_name.to_lowercase().contains(&needle)
                || contact.phone_number.to_lowercase().contains(&needle)
        })
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{HistoryFilter, by_day, by_text, by_type, filter_contacts};
    use crate::contact_cache::ContactCacheMap;
    use callhistory_rs_protocol::{
        CallRecord, CallType, ContactRecord, DayFilter, TypeFilter, Weekday,
    };
    use pretty_assertions::assert_eq;

    fn record(id: i64, number: &str, call_type: CallType, weekday: Weekday) -> CallRecord {
        CallRecord {
            id,
            number: number.to_string(),
            timestamp_ms: 1_000 - id,
            call_type,
            duration_sec: 0,
            formatted_date: String::new(),
            formatted_time: String::new(),
            day_name: weekday.to_string(),
            weekday,
        }
    }

    fn sample() -> Vec<CallRecord> {
        vec![
            record(1, "555-0100", CallType::Dialed, Weekday::Mon),
            record(2, "444-0100", CallType::Missed, Weekday::Tue),
            record(3, "555-0199", CallType::Received, Weekday::Mon),
            record(4, "Unknown", CallType::Unknown, Weekday::Sun),
        ]
    }

    fn ids(records: &[CallRecord]) -> Vec<i64> {
        records.iter().map(|record| record.id).collect()
    }

    #[test]
    fn all_filters_are_identity() {
        let records = sample();
        let kept: Vec<CallRecord> = records
            .iter()
            .filter(|&record| by_type(TypeFilter::All)(record) && by_day(DayFilter::All)(record))
            .cloned()
            .collect();
        assert_eq!(kept, records);
    }

    #[test]
    fn text_matches_number_or_cached_name() {
        let mut names = ContactCacheMap::new();
        names.insert("444-0100".to_string(), Some("Alice Doe".to_string()));
        names.insert("555-0100".to_string(), None);
        let records = sample();

        let by_name = by_text("  alice ", &names);
        let kept: Vec<i64> = records.iter().filter(|&r| by_name(r)).map(|r| r.id).collect();
        assert_eq!(kept, vec![2]);

        let by_number = by_text("0199", &names);
        let kept: Vec<i64> = records.iter().filter(|&r| by_number(r)).map(|r| r.id).collect();
        assert_eq!(kept, vec![3]);

        let blank = by_text("   ", &names);
        assert!(records.iter().all(|r| blank(r)));
    }

    #[test]
    fn filters_intersect() {
        let filter = HistoryFilter {
            search_text: "555".to_string(),
            type_filter: TypeFilter::All,
            day_filter: DayFilter::Day(Weekday::Mon),
        };
        let names = ContactCacheMap::new();
        assert_eq!(ids(&filter.apply(&sample(), &names)), vec![1, 3]);

        let filter = HistoryFilter {
            type_filter: TypeFilter::Received,
            ..filter
        };
        assert_eq!(ids(&filter.apply(&sample(), &names)), vec![3]);
    }

    #[test]
    fn contact_search_matches_name_or_number() {
        let contacts = vec![
            ContactRecord {
                id: 1,
                display_name: "Alice".to_string(),
                phone_number: "555-0100".to_string(),
                photo_ref: None,
            },
            ContactRecord {
                id: 2,
                display_name: "Bob".to_string(),
                phone_number: "444-0100".to_string(),
                photo_ref: None,
            },
        ];
        assert_eq!(filter_contacts(&contacts, "BOB").len(), 1);
        assert_eq!(filter_contacts(&contacts, "0100").len(), 2);
        assert_eq!(filter_contacts(&contacts, "").len(), 2);
        assert!(filter_contacts(&contacts, "carol").is_empty());
    }
}
