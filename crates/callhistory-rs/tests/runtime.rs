//! Runtime wiring tests: dialing, refresh fan-out and contact search.

use callhistory_rs::CallHistoryRuntime;
use callhistory_rs::config::{CallHistoryConfig, DisplayConfig, PagingConfig};
use callhistory_rs::core::PageLoad;
use callhistory_rs::protocol::DataSourceError;
use callhistory_rs_test_utils::{
    FixedClock, RecordingDialer, StubCallLog, StubDirectory, call_row, contact, numbered_rows,
};
use pretty_assertions::assert_eq;
use std::sync::Arc;
use std::time::Duration;

// 2026-01-05T09:30:00Z
const NOW: i64 = 1_767_605_400_000;

fn runtime(
    log: &StubCallLog,
    directory: &StubDirectory,
    dialer: &RecordingDialer,
) -> CallHistoryRuntime {
    let config = CallHistoryConfig::builder()
        .paging(PagingConfig { page_size: 5 })
        .display(DisplayConfig {
            utc_offset_minutes: Some(0),
            ..DisplayConfig::default()
        })
        .build();
    CallHistoryRuntime::new(
        config,
        Arc::new(log.clone()),
        Arc::new(directory.clone()),
        Arc::new(dialer.clone()),
    )
    .with_clock(Arc::new(FixedClock::new(NOW)))
}

/// Placing a call dials right away and refreshes after the settle delay.
#[tokio::test(start_paused = true)]
async fn place_call_refreshes_after_settle_delay() {
    let log = StubCallLog::new(numbered_rows(3, NOW - 1_000, 1_000));
    let dialer = RecordingDialer::new();
    let runtime = runtime(&log, &StubDirectory::default(), &dialer);
    let engine = runtime.spawn_suggestions();
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(log.recent_query_count(), 1);

    let pending = runtime.place_call("555-0100");
    assert_eq!(dialer.calls(), vec!["555-0100"]);

    tokio::time::sleep(Duration::from_millis(900)).await;
    assert_eq!(log.recent_query_count(), 1);

    log.push(call_row(50, "555-0100", NOW, 2));
    pending.await.expect("settle");
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(log.recent_query_count(), 2);
    assert_eq!(engine.current().suggestions[0].number, "555-0100");

    engine.shutdown().await.expect("shutdown");
}

/// History views drop their pages when the runtime refreshes.
#[tokio::test]
async fn refresh_restarts_history_views() {
    let log = StubCallLog::new(numbered_rows(8, NOW, 1_000));
    let runtime = runtime(&log, &StubDirectory::default(), &RecordingDialer::new());
    let view = runtime.history_view();

    assert!(matches!(view.load_next().await.expect("page"), PageLoad::Loaded(_)));
    assert_eq!(view.visible_records().await.len(), 5);

    assert_eq!(runtime.refresh_now(), 1);
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert!(view.visible_records().await.is_empty());
}

/// Details and contact search go through the shared collaborators.
#[tokio::test]
async fn details_and_contact_search() {
    let log = StubCallLog::new(vec![
        call_row(1, "555-0100", NOW, 2),
        call_row(2, "555-0100", NOW - 1_000, 3),
        call_row(3, "444-0100", NOW - 2_000, 1),
    ]);
    let directory = StubDirectory::new(vec![
        contact(1, "Alice", "555-0100"),
        contact(2, "Bob", "444-0100"),
    ]);
    let runtime = runtime(&log, &directory, &RecordingDialer::new());

    let details = runtime.call_details("555-0100").await.expect("details");
    assert_eq!(details.display_name.as_deref(), Some("Alice"));
    assert_eq!(details.calls.len(), 2);
    assert_eq!(
        runtime.contacts().name_for("555-0100"),
        Some("Alice".to_string())
    );

    let found = runtime.search_contacts("bo").await.expect("search");
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].display_name, "Bob");
}

/// Formatted numbers rank the same as the bare digits.
#[tokio::test(start_paused = true)]
async fn suggestions_for_a_formatted_number() {
    let log = StubCallLog::new(vec![
        call_row(1, "555-0100", NOW - 1_000, 2),
        call_row(2, "444-0100", NOW - 2_000, 2),
    ]);
    let runtime = runtime(&log, &StubDirectory::default(), &RecordingDialer::new());

    let snapshot = runtime.suggestions_for("(555) 01").await.expect("suggestions");
    assert_eq!(snapshot.query.digits, "55501");
    let numbers: Vec<&str> = snapshot.suggestions.iter().map(|s| s.number.as_str()).collect();
    assert_eq!(numbers, vec!["555-0100"]);

    let snapshot = runtime.suggestions_for("ext.").await.expect("recent");
    assert_eq!(snapshot.query.digits, "");
    assert_eq!(snapshot.suggestions.len(), 2);
}

/// A call log that cannot be read surfaces instead of hanging.
#[tokio::test(start_paused = true)]
async fn suggestions_report_unreadable_history() {
    let log = StubCallLog::new(Vec::new());
    log.fail_with(Some(DataSourceError::PermissionDenied("call log".into())));
    let runtime = runtime(&log, &StubDirectory::default(), &RecordingDialer::new());

    let snapshot = runtime.suggestions_for("555").await.expect("snapshot");
    assert_eq!(
        snapshot.history_error,
        Some(DataSourceError::PermissionDenied("call log".into()))
    );
    assert!(snapshot.suggestions.is_empty());
}
