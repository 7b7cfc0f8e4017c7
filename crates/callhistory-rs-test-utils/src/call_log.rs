use async_trait::async_trait;
use callhistory_rs_protocol::{
    CallLogRow, CallLogSource, DataSourceError, INCOMING_TYPE, MISSED_TYPE, OUTGOING_TYPE,
    TypeFilter,
};
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Build a row with a fixed ten second duration.
pub fn call_row(id: i64, number: &str, timestamp_ms: i64, type_code: i32) -> CallLogRow {
    CallLogRow {
        id,
        number: Some(number.to_string()),
        timestamp_ms,
        type_code,
        duration_sec: 10,
    }
}

/// `count` outgoing calls to distinct numbers, newest first, one `step_ms` apart
/// going back from `newest_ms`.
pub fn numbered_rows(count: usize, newest_ms: i64, step_ms: i64) -> Vec<CallLogRow> {
    (0..count)
        .map(|index| {
            let id = index as i64 + 1;
            call_row(
                id,
                &format!("555-{id:04}"),
                newest_ms - index as i64 * step_ms,
                OUTGOING_TYPE,
            )
        })
        .collect()
}

fn type_accepts(type_filter: TypeFilter, type_code: i32) -> bool {
    match type_filter {
        TypeFilter::All => true,
        TypeFilter::Dialed => type_code == OUTGOING_TYPE,
        TypeFilter::Received => type_code == INCOMING_TYPE,
        TypeFilter::Missed => type_code == MISSED_TYPE,
    }
}

/// In-memory call log with switchable failures, latency and query counters.
#[derive(Debug, Clone, Default)]
pub struct StubCallLog {
    rows: Arc<Mutex<Vec<CallLogRow>>>,
    failure: Arc<Mutex<Option<DataSourceError>>>,
    delay: Arc<Mutex<Option<Duration>>>,
    page_queries: Arc<Mutex<Vec<(TypeFilter, usize, usize)>>>,
    recent_queries: Arc<AtomicUsize>,
}

impl StubCallLog {
    pub fn new(rows: Vec<CallLogRow>) -> Self {
        let log = Self::default();
        log.set_rows(rows);
        log
    }

    /// Replace the stored rows, keeping them newest first.
    pub fn set_rows(&self, mut rows: Vec<CallLogRow>) {
        rows.sort_by(|a, b| b.timestamp_ms.cmp(&a.timestamp_ms));
        *self.rows.lock() = rows;
    }

    pub fn push(&self, row: CallLogRow) {
        let mut rows = self.rows.lock().clone();
        rows.push(row);
        self.set_rows(rows);
    }

    /// Make every query fail with `error` until cleared with `None`.
    pub fn fail_with(&self, error: Option<DataSourceError>) {
        *self.failure.lock() = error;
    }

    /// Sleep this long inside every query.
    pub fn set_delay(&self, delay: Option<Duration>) {
        *self.delay.lock() = delay;
    }

    /// `(type_filter, offset, limit)` of every page query so far.
    pub fn page_queries(&self) -> Vec<(TypeFilter, usize, usize)> {
        self.page_queries.lock().clone()
    }

    pub fn recent_query_count(&self) -> usize {
        self.recent_queries.load(Ordering::SeqCst)
    }

    async fn begin(&self) -> Result<(), DataSourceError> {
        let delay = *self.delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        match self.failure.lock().clone() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl CallLogSource for StubCallLog {
    async fn query_page(
        &self,
        type_filter: TypeFilter,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<CallLogRow>, DataSourceError> {
        self.page_queries.lock().push((type_filter, offset, limit));
        self.begin().await?;
        Ok(self
            .rows
            .lock()
            .iter()
            .filter(|row| type_accepts(type_filter, row.type_code))
            .skip(offset)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn query_recent(&self, since_ms: i64) -> Result<Vec<CallLogRow>, DataSourceError> {
        self.recent_queries.fetch_add(1, Ordering::SeqCst);
        self.begin().await?;
        Ok(self
            .rows
            .lock()
            .iter()
            .filter(|row| row.timestamp_ms >= since_ms)
            .cloned()
            .collect())
    }

    async fn query_by_number(&self, number: &str) -> Result<Vec<CallLogRow>, DataSourceError> {
        self.begin().await?;
        Ok(self
            .rows
            .lock()
            .iter()
            .filter(|row| row.number.as_deref() == Some(number))
            .cloned()
            .collect())
    }
}
