use callhistory_rs_config::CallHistoryConfig;
use callhistory_rs_core::{
    CallDetails, CallHistoryError, CallHistoryView, ContactCache, RecordFormatter, RefreshReason,
    RefreshSignal, SuggestionEngine, SuggestionEngineHandle, SuggestionSnapshot, call_details,
    dialable, filter_contacts,
};
use callhistory_rs_protocol::{
    CallLogSource, Clock, ContactDirectory, ContactRecord, Dialer, SystemClock,
};
use log::{debug, info};
use std::sync::{Arc, Weak};
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;

/// Composition root: owns the config and collaborators and hands them to
/// every view and engine it creates.
#[derive(Clone)]
pub struct CallHistoryRuntime {
    config: Arc<CallHistoryConfig>,
    source: Arc<dyn CallLogSource>,
    directory: Arc<dyn ContactDirectory>,
    dialer: Arc<dyn Dialer>,
    clock: Arc<dyn Clock>,
    contacts: Arc<ContactCache>,
    refresh: RefreshSignal,
    formatter: RecordFormatter,
}

impl CallHistoryRuntime {
    pub fn new(
        config: CallHistoryConfig,
        source: Arc<dyn CallLogSource>,
        directory: Arc<dyn ContactDirectory>,
        dialer: Arc<dyn Dialer>,
    ) -> Self {
        let formatter = RecordFormatter::from_config(&config.display);
        Self {
            config: Arc::new(config),
            source,
            directory,
            dialer,
            clock: Arc::new(SystemClock),
            contacts: Arc::new(ContactCache::new()),
            refresh: RefreshSignal::new(),
            formatter,
        }
    }

    /// Replace the wall clock, e.g. with a fixed one in tests.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn config(&self) -> &CallHistoryConfig {
        &self.config
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    pub fn formatter(&self) -> &RecordFormatter {
        &self.formatter
    }

    pub fn refresh_signal(&self) -> &RefreshSignal {
        &self.refresh
    }

    /// Contact names resolved so far, shared by every view.
    pub fn contacts(&self) -> Arc<ContactCache> {
        self.contacts.clone()
    }

    /// A history list that drops its pages whenever the refresh signal fires.
    pub fn history_view(&self) -> Arc<CallHistoryView> {
        let view = Arc::new(CallHistoryView::new(
            self.source.clone(),
            self.directory.clone(),
            self.contacts.clone(),
            self.formatter.clone(),
            self.config.paging.page_size,
        ));
        self.spawn_history_refresh(Arc::downgrade(&view));
        view
    }

    fn spawn_history_refresh(&self, view: Weak<CallHistoryView>) -> JoinHandle<()> {
        let mut receiver = self.refresh.subscribe();
        tokio::spawn(async move {
            loop {
                match receiver.recv().await {
                    Ok(_) | Err(RecvError::Lagged(_)) => {
                        let Some(view) = view.upgrade() else {
                            break;
                        };
                        view.refresh();
                    }
                    Err(RecvError::Closed) => break,
                }
            }
            debug!("history refresh listener stopped");
        })
    }

    /// Start a suggestion engine that reloads history on every refresh.
    pub fn spawn_suggestions(&self) -> SuggestionEngineHandle {
        let mut engine = SuggestionEngine::new(
            self.source.clone(),
            self.directory.clone(),
            self.clock.clone(),
            self.formatter.clone(),
            &self.config.suggestions,
        )
        .spawn();
        engine.follow_refresh(&self.refresh);
        engine
    }

    /// Rank suggestions once for `number` as typed, formatting included.
    ///
    /// Resolves with the first snapshot computed for the dial pad digits, or
    /// with the snapshot carrying the history error if history never loaded.
    pub async fn suggestions_for(
        &self,
        number: &str,
    ) -> Result<SuggestionSnapshot, CallHistoryError> {
        let digits = dialable(number);
        let engine = self.spawn_suggestions();
        if !digits.is_empty() {
            engine.set_number(digits.clone()).await?;
        }
        let mut snapshots = engine.subscribe();
        let snapshot = snapshots
            .wait_for(|snapshot| {
                snapshot.history_error.is_some()
                    || (snapshot.generation > 0 && snapshot.query.digits == digits)
            })
            .await
            .map_err(|_| CallHistoryError::EngineClosed)?
            .clone();
        engine.shutdown().await?;
        Ok(snapshot)
    }

    /// Hand the number to the dialer and refresh once the call has had time
    /// to land in the log.
    pub fn place_call(&self, number: &str) -> JoinHandle<()> {
        info!("dialing (number={number})");
        self.dialer.place_call(number);
        self.refresh
            .fire_after(self.config.refresh.settle_delay(), RefreshReason::CallEnded)
    }

    /// Refresh every view now.
    pub fn refresh_now(&self) -> usize {
        self.refresh.fire(RefreshReason::Manual)
    }

    pub async fn call_details(&self, number: &str) -> Result<CallDetails, CallHistoryError> {
        call_details(
            self.source.as_ref(),
            self.directory.as_ref(),
            &self.contacts,
            &self.formatter,
            number,
        )
        .await
    }

    /// Directory contacts whose name or number contains `query`.
    pub async fn search_contacts(
        &self,
        query: &str,
    ) -> Result<Vec<ContactRecord>, CallHistoryError> {
        let contacts = self.directory.list_all().await?;
        Ok(filter_contacts(&contacts, query))
    }
}
