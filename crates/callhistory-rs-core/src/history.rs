//! Paged, filtered call history list with resolved contact names.

use crate::contact_cache::{ContactCache, ContactCacheMap};
use crate::error::CallHistoryError;
use crate::filter::HistoryFilter;
use crate::ingest::RecordFormatter;
use crate::paging::{HistoryPager, PageLoad, Paginator};
use callhistory_rs_protocol::{
    CallLogSource, CallRecord, ContactDirectory, DayFilter, SuggestionQueryState, TypeFilter,
};
use log::debug;
use parking_lot::Mutex;
use serde::Serialize;
use std::sync::Arc;

/// Records sharing a date header such as `Today` or `Monday, Jan 05`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DateSection {
    pub title: String,
    pub records: Vec<CallRecord>,
}

/// Every logged call with one number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CallDetails {
    pub number: String,
    pub display_name: Option<String>,
    pub calls: Vec<CallRecord>,
}

/// The history screen: pages from the call log, names from the contact
/// cache, and the text/type/day filters over everything loaded so far.
pub struct CallHistoryView {
    pager: HistoryPager,
    source: Arc<dyn CallLogSource>,
    directory: Arc<dyn ContactDirectory>,
    contacts: Arc<ContactCache>,
    formatter: RecordFormatter,
    filter: Mutex<HistoryFilter>,
}

impl CallHistoryView {
    pub fn new(
        source: Arc<dyn CallLogSource>,
        directory: Arc<dyn ContactDirectory>,
        contacts: Arc<ContactCache>,
        formatter: RecordFormatter,
        page_size: usize,
    ) -> Self {
        let paginator = Paginator::new(source.clone(), formatter.clone());
        Self {
            pager: HistoryPager::new(paginator, page_size, TypeFilter::All),
            source,
            directory,
            contacts,
            formatter,
            filter: Mutex::new(HistoryFilter::default()),
        }
    }

    pub fn pager(&self) -> &HistoryPager {
        &self.pager
    }

    pub fn filter(&self) -> HistoryFilter {
        self.filter.lock().clone()
    }

    /// Load the next page and resolve contact names for its numbers.
    pub async fn load_next(&self) -> Result<PageLoad, CallHistoryError> {
        let load = self.pager.load_next().await?;
        if let PageLoad::Loaded(page) = &load {
            self.contacts
                .resolve(
                    page.items.iter().map(|record| record.number.as_str()),
                    self.directory.as_ref(),
                )
                .await;
        }
        Ok(load)
    }

    /// Keep loading until the call log runs out.
    pub async fn load_all(&self) -> Result<usize, CallHistoryError> {
        loop {
            match self.load_next().await? {
                PageLoad::Loaded(_) => {}
                PageLoad::EndOfList | PageLoad::Superseded => break,
            }
        }
        Ok(self.pager.loaded_records().await.len())
    }

    /// Invalidate loaded pages; the next load starts over.
    pub fn refresh(&self) {
        self.pager.refresh();
    }

    pub fn set_search_text(&self, search_text: impl Into<String>) {
        self.filter.lock().search_text = search_text.into();
    }

    pub fn set_day_filter(&self, day_filter: DayFilter) {
        self.filter.lock().day_filter = day_filter;
    }

    /// Type filtering happens in the source, so a change restarts pagination.
    pub fn set_type_filter(&self, type_filter: TypeFilter) {
        self.filter.lock().type_filter = type_filter;
        if self.pager.set_type_filter(type_filter) {
            debug!("history type filter changed (filter={type_filter:?})");
        }
    }

    /// Adopt the list filters of a query state.
    pub fn apply_query(&self, query: &SuggestionQueryState) {
        self.set_search_text(query.search_text.clone());
        self.set_day_filter(query.day_filter);
        self.set_type_filter(query.type_filter);
    }

    /// Loaded records passing the current filters.
    pub async fn visible_records(&self) -> Vec<CallRecord> {
        let records = self.pager.loaded_records().await;
        let filter = self.filter();
        filter.apply(&records, &self.contacts.snapshot())
    }

    /// Visible records grouped under date headers, newest first.
    pub async fn sections(&self, now_ms: i64) -> Vec<DateSection> {
        let mut sections: Vec<DateSection> = Vec::new();
        for record in self.visible_records().await {
            let title = self.formatter.date_section(record.timestamp_ms, now_ms);
            match sections.last_mut() {
                Some(section) if section.title == title => section.records.push(record),
                _ => sections.push(DateSection {
                    title,
                    records: vec![record],
                }),
            }
        }
        sections
    }

    pub fn contact_name(&self, number: &str) -> Option<String> {
        self.contacts.name_for(number)
    }

    pub fn contact_names(&self) -> Arc<ContactCacheMap> {
        self.contacts.snapshot()
    }

    /// Every call with `number`, newest first, plus its contact name.
    pub async fn details(&self, number: &str) -> Result<CallDetails, CallHistoryError> {
        call_details(
            self.source.as_ref(),
            self.directory.as_ref(),
            &self.contacts,
            &self.formatter,
            number,
        )
        .await
    }
}

/// Load the full call history of one number.
pub async fn call_details(
    source: &dyn CallLogSource,
    directory: &dyn ContactDirectory,
    contacts: &ContactCache,
    formatter: &RecordFormatter,
    number: &str,
) -> Result<CallDetails, CallHistoryError> {
    let rows = source.query_by_number(number).await?;
    let names = contacts.resolve([number], directory).await;
    Ok(CallDetails {
        number: number.to_string(),
        display_name: names.get(number).cloned().flatten(),
        calls: formatter.records(rows),
    })
}

#[cfg(test)]
mod tests {
    use super::CallHistoryView;
    use crate::contact_cache::ContactCache;
    use crate::ingest::RecordFormatter;
    use crate::paging::PageLoad;
    use callhistory_rs_protocol::{
        DayFilter, INCOMING_TYPE, MISSED_TYPE, OUTGOING_TYPE, TypeFilter, Weekday,
    };
    use callhistory_rs_test_utils::{StubCallLog, StubDirectory, call_row, contact};
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    // 2026-01-05T09:30:00Z, a Monday.
    const MONDAY_MORNING: i64 = 1_767_605_400_000;
    const DAY_MS: i64 = 24 * 60 * 60 * 1000;

    fn view(log: &StubCallLog, directory: &StubDirectory, page_size: usize) -> CallHistoryView {
        CallHistoryView::new(
            Arc::new(log.clone()),
            Arc::new(directory.clone()),
            Arc::new(ContactCache::new()),
            RecordFormatter::utc(),
            page_size,
        )
    }

    fn sample_log() -> StubCallLog {
        StubCallLog::new(vec![
            call_row(1, "555-0100", MONDAY_MORNING, OUTGOING_TYPE),
            call_row(2, "444-0100", MONDAY_MORNING - 1_000, MISSED_TYPE),
            call_row(3, "555-0100", MONDAY_MORNING - DAY_MS, INCOMING_TYPE),
            call_row(4, "333-0100", MONDAY_MORNING - 3 * DAY_MS, OUTGOING_TYPE),
        ])
    }

    fn ids(records: &[callhistory_rs_protocol::CallRecord]) -> Vec<i64> {
        records.iter().map(|record| record.id).collect()
    }

    #[tokio::test]
    async fn loading_resolves_names_once_per_number() {
        let log = sample_log();
        let directory = StubDirectory::new(vec![contact(1, "Alice", "555-0100")]);
        let view = view(&log, &directory, 50);

        assert!(matches!(view.load_next().await.expect("load"), PageLoad::Loaded(_)));
        assert_eq!(view.contact_name("555-0100"), Some("Alice".to_string()));
        assert_eq!(directory.lookups().len(), 3);
    }

    #[tokio::test]
    async fn text_and_day_filters_apply_to_loaded_records() {
        let log = sample_log();
        let directory = StubDirectory::new(vec![contact(1, "Alice", "555-0100")]);
        let view = view(&log, &directory, 50);
        view.load_all().await.expect("load");

        view.set_search_text("alice");
        assert_eq!(ids(&view.visible_records().await), vec![1, 3]);

        view.set_day_filter(DayFilter::Day(Weekday::Mon));
        assert_eq!(ids(&view.visible_records().await), vec![1]);

        view.set_search_text("");
        view.set_day_filter(DayFilter::All);
        assert_eq!(ids(&view.visible_records().await), vec![1, 2, 3, 4]);
        assert_eq!(log.page_queries().len(), 1);
    }

    #[tokio::test]
    async fn type_filter_restarts_pagination() {
        let log = sample_log();
        let view = view(&log, &StubDirectory::default(), 50);
        view.load_all().await.expect("load");

        view.set_type_filter(TypeFilter::Missed);
        assert!(view.visible_records().await.is_empty());
        view.load_all().await.expect("reload");
        assert_eq!(ids(&view.visible_records().await), vec![2]);
        assert_eq!(
            log.page_queries().iter().filter(|query| query.1 == 0).count(),
            2
        );
    }

    #[tokio::test]
    async fn sections_group_by_day() {
        let log = sample_log();
        let view = view(&log, &StubDirectory::default(), 50);
        view.load_all().await.expect("load");

        let sections = view.sections(MONDAY_MORNING + 60_000).await;
        let titles: Vec<&str> = sections.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, vec!["Today", "Yesterday", "Friday, Jan 02"]);
        assert_eq!(ids(&sections[0].records), vec![1, 2]);
    }

    #[tokio::test]
    async fn details_list_every_call_for_a_number() {
        let log = sample_log();
        let directory = StubDirectory::new(vec![contact(1, "Alice", "555-0100")]);
        let view = view(&log, &directory, 50);

        let details = view.details("555-0100").await.expect("details");
        assert_eq!(details.display_name.as_deref(), Some("Alice"));
        assert_eq!(ids(&details.calls), vec![1, 3]);
    }
}
