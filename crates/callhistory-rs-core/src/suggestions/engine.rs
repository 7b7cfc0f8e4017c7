use super::ranking::{DefaultRanker, RankingInput, RankingLimits, SuggestionRanker};
use crate::error::CallHistoryError;
use crate::ingest::RecordFormatter;
use crate::refresh::RefreshSignal;
use callhistory_rs_config::SuggestionsConfig;
use callhistory_rs_protocol::{
    CallLogSource, CallRecord, Clock, ContactDirectory, ContactRecord, DataSourceError,
    Suggestion, SuggestionQueryState,
};
use log::{debug, info, warn};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_stream::wrappers::WatchStream;
use tokio_util::sync::CancellationToken;

const INPUT_BUFFER: usize = 64;

/// Characters accepted from the dial pad.
fn is_dial_char(ch: char) -> bool {
    ch.is_ascii_digit() || matches!(ch, '*' | '#' | '+')
}

/// `number` as the dial pad would hold it: only `0-9*#+` survive.
pub fn dialable(number: &str) -> String {
    number.chars().filter(|ch| is_dial_char(*ch)).collect()
}

/// An edit to the query state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryEdit {
    /// Press a dial pad key. Keys outside `0-9*#+` are ignored.
    AppendDigit(char),
    /// Delete the last digit.
    Backspace,
    /// Empty the dial pad.
    Clear,
    /// Put a whole number on the dial pad, e.g. from a history entry.
    SetNumber(String),
    /// Swap in a new query state wholesale.
    Replace(SuggestionQueryState),
}

impl QueryEdit {
    /// Apply the edit. Returns false when nothing changed.
    pub fn apply(self, query: &mut SuggestionQueryState) -> bool {
        let before = query.clone();
        match self {
            QueryEdit::AppendDigit(ch) => {
                if is_dial_char(ch) {
                    query.digits.push(ch);
                } else {
                    debug!("ignored dial pad key (key={ch:?})");
                }
            }
            QueryEdit::Backspace => {
                query.digits.pop();
            }
            QueryEdit::Clear => query.digits.clear(),
            QueryEdit::SetNumber(number) => {
                query.digits = dialable(&number);
            }
            QueryEdit::Replace(next) => *query = next,
        }
        *query != before
    }
}

/// Latest published suggestions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SuggestionSnapshot {
    /// Ranking pass that produced this snapshot; `0` before the first one.
    pub generation: u64,
    /// Query the suggestions were computed for.
    pub query: SuggestionQueryState,
    pub suggestions: Vec<Suggestion>,
    /// Set while the most recent history reload failed. The suggestions are
    /// then computed from the previous history snapshot.
    pub history_error: Option<DataSourceError>,
}

enum EngineInput {
    Edit(QueryEdit),
    Refresh,
    ReloadContacts,
    Shutdown,
}

enum Completion {
    HistoryLoaded {
        generation: u64,
        result: Result<Vec<CallRecord>, DataSourceError>,
    },
    ContactsLoaded {
        generation: u64,
        result: Result<Vec<ContactRecord>, DataSourceError>,
    },
    Ranked {
        generation: u64,
        query: SuggestionQueryState,
        suggestions: Vec<Suggestion>,
    },
}

/// One kind of supersedable background job: a generation counter and the
/// token of the job currently running.
#[derive(Default)]
struct JobSlot {
    generation: u64,
    token: CancellationToken,
}

impl JobSlot {
    /// Cancel the running job and hand out the next generation.
    fn supersede(&mut self) -> (u64, CancellationToken) {
        self.token.cancel();
        self.token = CancellationToken::new();
        self.generation += 1;
        (self.generation, self.token.clone())
    }

    fn is_current(&self, generation: u64) -> bool {
        self.generation == generation
    }

    fn cancel(&self) {
        self.token.cancel();
    }
}

/// Live dial suggestions over the recent call history and the contact directory.
///
/// [`SuggestionEngine::spawn`] starts a coordinator task that owns all state.
/// Query edits are debounced; history and contact reloads trigger a new ranking
/// pass right away. Every pass supersedes the previous one, and results from
/// superseded passes are never published.
pub struct SuggestionEngine {
    source: Arc<dyn CallLogSource>,
    directory: Arc<dyn ContactDirectory>,
    clock: Arc<dyn Clock>,
    formatter: RecordFormatter,
    ranker: Arc<dyn SuggestionRanker>,
    debounce: Duration,
    recent_window_ms: i64,
}

impl SuggestionEngine {
    pub fn new(
        source: Arc<dyn CallLogSource>,
        directory: Arc<dyn ContactDirectory>,
        clock: Arc<dyn Clock>,
        formatter: RecordFormatter,
        config: &SuggestionsConfig,
    ) -> Self {
        Self {
            source,
            directory,
            clock,
            formatter,
            ranker: Arc::new(DefaultRanker::new(RankingLimits::from_config(config))),
            debounce: config.debounce(),
            recent_window_ms: config.recent_window_ms(),
        }
    }

    /// Replace the ranking rules.
    pub fn with_ranker(mut self, ranker: Arc<dyn SuggestionRanker>) -> Self {
        self.ranker = ranker;
        self
    }

    /// Start the coordinator and the initial history and contact loads.
    pub fn spawn(self) -> SuggestionEngineHandle {
        let (input_tx, input_rx) = mpsc::channel(INPUT_BUFFER);
        let (completion_tx, completion_rx) = mpsc::unbounded_channel();
        let (snapshot_tx, snapshot_rx) = watch::channel(SuggestionSnapshot::default());
        let coordinator = Coordinator {
            engine: self,
            query: SuggestionQueryState::default(),
            history: None,
            history_error: None,
            contacts: Arc::new(Vec::new()),
            history_job: JobSlot::default(),
            contacts_job: JobSlot::default(),
            rank_job: JobSlot::default(),
            deadline: None,
            completions: completion_tx,
            snapshots: snapshot_tx,
        };
        let task = tokio::spawn(coordinator.run(input_rx, completion_rx));
        SuggestionEngineHandle {
            inputs: input_tx,
            snapshots: snapshot_rx,
            task,
            refresh_task: None,
        }
    }
}

struct Coordinator {
    engine: SuggestionEngine,
    query: SuggestionQueryState,
    /// `None` until the first history load succeeds.
    history: Option<Arc<Vec<CallRecord>>>,
    history_error: Option<DataSourceError>,
    contacts: Arc<Vec<ContactRecord>>,
    history_job: JobSlot,
    contacts_job: JobSlot,
    rank_job: JobSlot,
    /// When the pending debounced edit settles.
    deadline: Option<Instant>,
    completions: mpsc::UnboundedSender<Completion>,
    snapshots: watch::Sender<SuggestionSnapshot>,
}

impl Coordinator {
    async fn run(
        mut self,
        mut inputs: mpsc::Receiver<EngineInput>,
        mut completions: mpsc::UnboundedReceiver<Completion>,
    ) {
        info!("suggestion engine started");
        self.reload_history();
        self.reload_contacts();
        loop {
            let deadline = self.deadline;
            tokio::select! {
                input = inputs.recv() => match input {
                    Some(EngineInput::Edit(edit)) => self.on_edit(edit),
                    Some(EngineInput::Refresh) => self.reload_history(),
                    Some(EngineInput::ReloadContacts) => self.reload_contacts(),
                    Some(EngineInput::Shutdown) | None => break,
                },
                Some(completion) = completions.recv() => self.on_completion(completion),
                _ = tokio::time::sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                    self.deadline = None;
                    self.recompute();
                }
            }
        }
        self.history_job.cancel();
        self.contacts_job.cancel();
        self.rank_job.cancel();
        info!("suggestion engine stopped");
    }

    fn on_edit(&mut self, edit: QueryEdit) {
        if edit.apply(&mut self.query) {
            let now = Instant::now();
            self.deadline = Some(now.checked_add(self.engine.debounce).unwrap_or(now));
        }
    }

    fn on_completion(&mut self, completion: Completion) {
        match completion {
            Completion::HistoryLoaded { generation, result } => {
                if !self.history_job.is_current(generation) {
                    debug!("dropped stale history load (generation={generation})");
                    return;
                }
                match result {
                    Ok(records) => {
                        debug!("history loaded (records={})", records.len());
                        self.history = Some(Arc::new(records));
                        self.history_error = None;
                        self.recompute_unless_debouncing();
                    }
                    Err(err) => {
                        warn!("history reload failed (error={err})");
                        self.history_error = Some(err.clone());
                        self.snapshots
                            .send_modify(|snapshot| snapshot.history_error = Some(err));
                    }
                }
            }
            Completion::ContactsLoaded { generation, result } => {
                if !self.contacts_job.is_current(generation) {
                    debug!("dropped stale contacts load (generation={generation})");
                    return;
                }
                match result {
                    Ok(contacts) => {
                        debug!("contacts loaded (contacts={})", contacts.len());
                        self.contacts = Arc::new(contacts);
                        self.recompute_unless_debouncing();
                    }
                    Err(err) => warn!("contacts reload failed (error={err})"),
                }
            }
            Completion::Ranked {
                generation,
                query,
                suggestions,
            } => {
                if !self.rank_job.is_current(generation) {
                    debug!("dropped stale suggestions (generation={generation})");
                    return;
                }
                debug!(
                    "suggestions published (generation={generation}, count={})",
                    suggestions.len()
                );
                self.snapshots.send_replace(SuggestionSnapshot {
                    generation,
                    query,
                    suggestions,
                    history_error: self.history_error.clone(),
                });
            }
        }
    }

    /// A pending debounce will recompute with the newest inputs anyway.
    fn recompute_unless_debouncing(&mut self) {
        if self.deadline.is_none() {
            self.recompute();
        }
    }

    fn recompute(&mut self) {
        let Some(history) = self.history.clone() else {
            debug!("ranking deferred until history is loaded");
            return;
        };
        let (generation, token) = self.rank_job.supersede();
        let query = self.query.clone();
        let input = RankingInput {
            history,
            contacts: self.contacts.clone(),
            digits: query.digits.clone(),
            now_ms: self.engine.clock.now_ms(),
        };
        let ranker = self.engine.ranker.clone();
        let completions = self.completions.clone();
        tokio::spawn(async move {
            tokio::select! {
                biased;
                _ = token.cancelled() => {
                    debug!("ranking cancelled (generation={generation})");
                }
                suggestions = ranker.rank(input) => {
                    let _ = completions.send(Completion::Ranked { generation, query, suggestions });
                }
            }
        });
    }

    fn reload_history(&mut self) {
        let (generation, token) = self.history_job.supersede();
        let source = self.engine.source.clone();
        let formatter = self.engine.formatter.clone();
        let since_ms = self
            .engine
            .clock
            .now_ms()
            .saturating_sub(self.engine.recent_window_ms);
        let completions = self.completions.clone();
        tokio::spawn(async move {
            tokio::select! {
                biased;
                _ = token.cancelled() => {
                    debug!("history load cancelled (generation={generation})");
                }
                result = source.query_recent(since_ms) => {
                    let result = result.map(|rows| formatter.records(rows));
                    let _ = completions.send(Completion::HistoryLoaded { generation, result });
                }
            }
        });
    }

    fn reload_contacts(&mut self) {
        let (generation, token) = self.contacts_job.supersede();
        let directory = self.engine.directory.clone();
        let completions = self.completions.clone();
        tokio::spawn(async move {
            tokio::select! {
                biased;
                _ = token.cancelled() => {
                    debug!("contacts load cancelled (generation={generation})");
                }
                result = directory.list_all() => {
                    let _ = completions.send(Completion::ContactsLoaded { generation, result });
                }
            }
        });
    }
}

/// Control side of a running [`SuggestionEngine`].
///
/// Dropping the handle stops the engine once its input channel drains.
pub struct SuggestionEngineHandle {
    inputs: mpsc::Sender<EngineInput>,
    snapshots: watch::Receiver<SuggestionSnapshot>,
    task: JoinHandle<()>,
    refresh_task: Option<JoinHandle<()>>,
}

impl SuggestionEngineHandle {
    async fn send(&self, input: EngineInput) -> Result<(), CallHistoryError> {
        self.inputs
            .send(input)
            .await
            .map_err(|_| CallHistoryError::EngineClosed)
    }

    pub async fn update_query(&self, edit: QueryEdit) -> Result<(), CallHistoryError> {
        self.send(EngineInput::Edit(edit)).await
    }

    pub async fn append_digit(&self, digit: char) -> Result<(), CallHistoryError> {
        self.update_query(QueryEdit::AppendDigit(digit)).await
    }

    pub async fn backspace(&self) -> Result<(), CallHistoryError> {
        self.update_query(QueryEdit::Backspace).await
    }

    pub async fn clear(&self) -> Result<(), CallHistoryError> {
        self.update_query(QueryEdit::Clear).await
    }

    pub async fn set_number(&self, number: impl Into<String>) -> Result<(), CallHistoryError> {
        self.update_query(QueryEdit::SetNumber(number.into())).await
    }

    /// Reload the recent call history.
    pub async fn refresh(&self) -> Result<(), CallHistoryError> {
        self.send(EngineInput::Refresh).await
    }

    /// Reload the contact directory.
    pub async fn refresh_contacts(&self) -> Result<(), CallHistoryError> {
        self.send(EngineInput::ReloadContacts).await
    }

    /// Reload history whenever `signal` fires.
    pub fn follow_refresh(&mut self, signal: &RefreshSignal) {
        if let Some(previous) = self.refresh_task.take() {
            previous.abort();
        }
        let mut receiver = signal.subscribe();
        let inputs = self.inputs.downgrade();
        self.refresh_task = Some(tokio::spawn(async move {
            loop {
                match receiver.recv().await {
                    Ok(_) | Err(RecvError::Lagged(_)) => {
                        let Some(inputs) = inputs.upgrade() else {
                            break;
                        };
                        if inputs.send(EngineInput::Refresh).await.is_err() {
                            break;
                        }
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        }));
    }

    /// Most recently published snapshot.
    pub fn current(&self) -> SuggestionSnapshot {
        self.snapshots.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SuggestionSnapshot> {
        self.snapshots.clone()
    }

    /// Stream of snapshots, starting with the current one.
    pub fn updates(&self) -> WatchStream<SuggestionSnapshot> {
        WatchStream::new(self.snapshots.clone())
    }

    /// Stop the engine and wait for the coordinator to exit.
    pub async fn shutdown(mut self) -> Result<(), CallHistoryError> {
        if let Some(refresh_task) = self.refresh_task.take() {
            refresh_task.abort();
        }
        let _ = self.inputs.send(EngineInput::Shutdown).await;
        self.task.await.map_err(|_| CallHistoryError::EngineClosed)
    }
}

#[cfg(test)]
mod tests {
    use super::{QueryEdit, dialable};
    use callhistory_rs_protocol::{SuggestionQueryState, TypeFilter};
    use pretty_assertions::assert_eq;

    #[test]
    fn dial_pad_edits() {
        let mut query = SuggestionQueryState::default();
        assert!(QueryEdit::AppendDigit('5').apply(&mut query));
        assert!(QueryEdit::AppendDigit('#').apply(&mut query));
        assert!(!QueryEdit::AppendDigit('x').apply(&mut query));
        assert_eq!(query.digits, "5#");

        assert!(QueryEdit::Backspace.apply(&mut query));
        assert_eq!(query.digits, "5");
        assert!(QueryEdit::Clear.apply(&mut query));
        assert!(!QueryEdit::Backspace.apply(&mut query));
        assert!(!QueryEdit::Clear.apply(&mut query));
    }

    #[test]
    fn set_number_keeps_dialable_characters() {
        let mut query = SuggestionQueryState::default();
        QueryEdit::SetNumber("+1 (555) 010-0100".to_string()).apply(&mut query);
        assert_eq!(query.digits, "+15550100100");
    }

    #[test]
    fn dialable_drops_formatting() {
        assert_eq!(dialable("(555) 010-0100"), "5550100100");
        assert_eq!(dialable("*#+1 ext. 2"), "*#+12");
        assert_eq!(dialable("Alice"), "");
    }

    #[test]
    fn replace_swaps_the_whole_state() {
        let mut query = SuggestionQueryState::with_digits("12");
        let next = SuggestionQueryState {
            type_filter: TypeFilter::Missed,
            ..SuggestionQueryState::with_digits("9")
        };
        assert!(QueryEdit::Replace(next.clone()).apply(&mut query));
        assert_eq!(query, next);
        assert!(!QueryEdit::Replace(next).apply(&mut query));
    }
}
