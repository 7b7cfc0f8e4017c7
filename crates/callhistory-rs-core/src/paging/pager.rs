use super::Paginator;
use callhistory_rs_protocol::{CallRecord, DataSourceError, Page, TypeFilter};
use log::{debug, info};
use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;

/// Outcome of asking a [`HistoryPager`] for the next page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageLoad {
    /// A new page was appended to the loaded records.
    Loaded(Page),
    /// The previous page was the last one.
    EndOfList,
    /// A refresh happened while this load was running; its result was dropped.
    Superseded,
}

/// Refresh bookkeeping, readable without waiting for an in-flight load.
struct PagerControl {
    epoch: u64,
    token: CancellationToken,
    type_filter: TypeFilter,
    anchor: usize,
}

/// Pages fetched since the last refresh.
struct PagerState {
    epoch: u64,
    next_cursor: Option<usize>,
    records: Vec<CallRecord>,
}

impl PagerState {
    fn fresh(epoch: u64) -> Self {
        Self {
            epoch,
            next_cursor: Some(0),
            records: Vec::new(),
        }
    }
}

/// Sequential pager for one history list.
///
/// Loads never overlap: each holds the state lock until it finishes. A refresh
/// cancels the running load, which then reports [`PageLoad::Superseded`], and the
/// next load starts again from cursor zero.
pub struct HistoryPager {
    paginator: Paginator,
    page_size: usize,
    state: tokio::sync::Mutex<PagerState>,
    control: Mutex<PagerControl>,
}

impl HistoryPager {
    pub fn new(paginator: Paginator, page_size: usize, type_filter: TypeFilter) -> Self {
        Self {
            paginator,
            page_size,
            state: tokio::sync::Mutex::new(PagerState::fresh(0)),
            control: Mutex::new(PagerControl {
                epoch: 0,
                token: CancellationToken::new(),
                type_filter,
                anchor: 0,
            }),
        }
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn type_filter(&self) -> TypeFilter {
        self.control.lock().type_filter
    }

    /// Fetch the page after the ones already loaded.
    ///
    /// On error nothing changes, so calling again retries the same cursor.
    pub async fn load_next(&self) -> Result<PageLoad, DataSourceError> {
        let mut state = self.state.lock().await;
        let (epoch, token, type_filter) = {
            let control = self.control.lock();
            (control.epoch, control.token.clone(), control.type_filter)
        };
        if state.epoch != epoch {
            *state = PagerState::fresh(epoch);
        }
        let Some(cursor) = state.next_cursor else {
            return Ok(PageLoad::EndOfList);
        };

        let page = tokio::select! {
            biased;
            _ = token.cancelled() => {
                debug!("page load superseded (cursor={cursor}, epoch={epoch})");
                return Ok(PageLoad::Superseded);
            }
            result = self.paginator.load(Some(cursor), self.page_size, type_filter) => result?,
        };
        if self.control.lock().epoch != epoch {
            return Ok(PageLoad::Superseded);
        }

        state.next_cursor = page.next_cursor;
        state.records.extend(page.items.iter().cloned());
        Ok(PageLoad::Loaded(page))
    }

    /// Drop every loaded page and cancel the running load.
    pub fn refresh(&self) {
        let mut control = self.control.lock();
        control.token.cancel();
        control.token = CancellationToken::new();
        control.epoch += 1;
        info!(
            "history pager refreshed (epoch={}, anchor={})",
            control.epoch, control.anchor
        );
    }

    /// Switch the source-side type filter. Returns false when it was already set.
    pub fn set_type_filter(&self, type_filter: TypeFilter) -> bool {
        {
            let mut control = self.control.lock();
            if control.type_filter == type_filter {
                return false;
            }
            control.type_filter = type_filter;
            control.anchor = 0;
        }
        self.refresh();
        true
    }

    /// Remember the first visible row so a refresh can try to return to it.
    pub fn record_scroll_position(&self, index: usize) {
        self.control.lock().anchor = index;
    }

    /// Last recorded scroll position. Best effort: the row at this offset may
    /// differ after the log changed.
    pub fn refresh_anchor(&self) -> usize {
        self.control.lock().anchor
    }

    /// Every record loaded since the last refresh, in canonical order.
    pub async fn loaded_records(&self) -> Vec<CallRecord> {
        let state = self.state.lock().await;
        if state.epoch != self.control.lock().epoch {
            return Vec::new();
        }
        state.records.clone()
    }

    /// Whether the last page has been reached.
    pub async fn is_exhausted(&self) -> bool {
        let state = self.state.lock().await;
        state.epoch == self.control.lock().epoch && state.next_cursor.is_none()
    }
}
