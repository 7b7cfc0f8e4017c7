//! Offset-cursor pagination over the call log.
//!
//! Cursors are record offsets into the source's canonical ordering, not stable
//! keys. If the log changes between two loads a page may repeat or skip records.

mod pager;

pub use pager::{HistoryPager, PageLoad};

use crate::ingest::RecordFormatter;
use callhistory_rs_protocol::{CallLogSource, DataSourceError, Page, TypeFilter};
use log::debug;
use std::sync::Arc;

/// Stateless page loader.
#[derive(Clone)]
pub struct Paginator {
    source: Arc<dyn CallLogSource>,
    formatter: RecordFormatter,
}

impl Paginator {
    pub fn new(source: Arc<dyn CallLogSource>, formatter: RecordFormatter) -> Self {
        Self { source, formatter }
    }

    /// Load the page starting at `cursor` (`None` means the first page).
    ///
    /// `next_cursor` is `None` once fewer than `page_size` records come back;
    /// `prev_cursor` is `None` on the first page and clamped to zero otherwise.
    pub async fn load(
        &self,
        cursor: Option<usize>,
        page_size: usize,
        type_filter: TypeFilter,
    ) -> Result<Page, DataSourceError> {
        let cursor = cursor.unwrap_or(0);
        let page_size = page_size.max(1);
        let rows = self
            .source
            .query_page(type_filter, cursor, page_size)
            .await?;
        let mut items = self.formatter.records(rows);
        items.truncate(page_size);

        let prev_cursor = (cursor > 0).then(|| cursor.saturating_sub(page_size));
        let next_cursor = (items.len() >= page_size).then(|| cursor + page_size);
        debug!(
            "page loaded (cursor={cursor}, items={}, filter={type_filter:?})",
            items.len()
        );
        Ok(Page {
            items,
            prev_cursor,
            next_cursor,
        })
    }
}
