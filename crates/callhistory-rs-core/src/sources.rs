//! File-backed call log and contact directory, and a dialer that only logs.

use crate::ingest::call_type_from_code;
use crate::t9::digits_only;
use async_trait::async_trait;
use callhistory_rs_protocol::{
    CallLogRow, CallLogSource, ContactDirectory, ContactMatch, ContactRecord, DataSourceError,
    Dialer, TypeFilter,
};
use log::{debug, info};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

fn read_error(path: &Path, err: std::io::Error) -> DataSourceError {
    let message = format!("{}: {err}", path.display());
    match err.kind() {
        ErrorKind::PermissionDenied => DataSourceError::PermissionDenied(message),
        _ => DataSourceError::QueryFailed(message),
    }
}

/// Call log stored as one JSON row per line.
///
/// The file is re-read on every query so external appends show up on refresh.
#[derive(Debug, Clone)]
pub struct FileCallLog {
    path: PathBuf,
}

impl FileCallLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Every row in the file, newest first. Blank lines are skipped.
    pub async fn read_rows(&self) -> Result<Vec<CallLogRow>, DataSourceError> {
        let contents = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|err| read_error(&self.path, err))?;
        let mut rows = parse_rows(&contents)?;
        rows.sort_by(|a, b| b.timestamp_ms.cmp(&a.timestamp_ms));
        debug!(
            "call log read (path={}, rows={})",
            self.path.display(),
            rows.len()
        );
        Ok(rows)
    }
}

/// Parse JSON lines into rows, naming the first bad line.
pub fn parse_rows(contents: &str) -> Result<Vec<CallLogRow>, DataSourceError> {
    contents
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(index, line)| {
            serde_json::from_str(line)
                .map_err(|err| DataSourceError::Malformed(format!("line {}: {err}", index + 1)))
        })
        .collect()
}

#[async_trait]
impl CallLogSource for FileCallLog {
    async fn query_page(
        &self,
        type_filter: TypeFilter,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<CallLogRow>, DataSourceError> {
        Ok(self
            .read_rows()
            .await?
            .into_iter()
            .filter(|row| type_filter.accepts(call_type_from_code(row.type_code)))
            .skip(offset)
            .take(limit)
            .collect())
    }

    async fn query_recent(&self, since_ms: i64) -> Result<Vec<CallLogRow>, DataSourceError> {
        Ok(self
            .read_rows()
            .await?
            .into_iter()
            .filter(|row| row.timestamp_ms >= since_ms)
            .collect())
    }

    async fn query_by_number(&self, number: &str) -> Result<Vec<CallLogRow>, DataSourceError> {
        Ok(self
            .read_rows()
            .await?
            .into_iter()
            .filter(|row| row.number.as_deref() == Some(number))
            .collect())
    }
}

/// Contact directory stored as a JSON array of contacts.
#[derive(Debug, Clone)]
pub struct FileContactDirectory {
    path: PathBuf,
}

impl FileContactDirectory {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    async fn read_contacts(&self) -> Result<Vec<ContactRecord>, DataSourceError> {
        let contents = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|err| read_error(&self.path, err))?;
        serde_json::from_str(&contents).map_err(|err| {
            DataSourceError::Malformed(format!("{}: {err}", self.path.display()))
        })
    }
}

#[async_trait]
impl ContactDirectory for FileContactDirectory {
    /// Exact number match first, then a match ignoring formatting.
    async fn lookup_by_number(
        &self,
        number: &str,
    ) -> Result<Option<ContactMatch>, DataSourceError> {
        let contacts = self.read_contacts().await?;
        let wanted = digits_only(number);
        let found = contacts
            .iter()
            .find(|contact| contact.phone_number == number)
            .or_else(|| {
                contacts.iter().find(|contact| {
                    !wanted.is_empty() && digits_only(&contact.phone_number) == wanted
                })
            });
        Ok(found.map(|contact| ContactMatch {
            name: contact.display_name.clone(),
            photo_ref: contact.photo_ref.clone(),
        }))
    }

    async fn list_all(&self) -> Result<Vec<ContactRecord>, DataSourceError> {
        let mut contacts = self.read_contacts().await?;
        contacts.sort_by_key(|contact| contact.display_name.to_lowercase());
        Ok(contacts)
    }
}

/// Dialer that records the request in the log and nothing else.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogDialer;

impl Dialer for LogDialer {
    fn place_call(&self, number: &str) {
        info!("placing call (number={number})");
    }
}

#[cfg(test)]
mod tests {
    use super::{FileCallLog, FileContactDirectory, parse_rows};
    use callhistory_rs_protocol::{
        CallLogSource, ContactDirectory, DataSourceError, TypeFilter,
    };
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::TempDir;

    const ROWS: &str = r#"
{"id": 1, "number": "555-0100", "timestamp_ms": 1000, "type_code": 2, "duration_sec": 60}
{"id": 2, "timestamp_ms": 3000, "type_code": 3}

{"id": 3, "number": "444-0100", "timestamp_ms": 2000, "type_code": 1, "duration_sec": 5}
"#;

    const CONTACTS: &str = r#"[
        {"id": 1, "display_name": "bob", "phone_number": "444-0100"},
        {"id": 2, "display_name": "Alice", "phone_number": "+1 555 0100", "photo_ref": "alice.png"}
    ]"#;

    #[test]
    fn parse_rows_reports_the_bad_line() {
        let err = parse_rows("{\"id\": 1, \"timestamp_ms\": 1, \"type_code\": 1}\nnot json")
            .unwrap_err();
        assert!(matches!(err, DataSourceError::Malformed(message) if message.starts_with("line 2")));
    }

    #[tokio::test]
    async fn call_log_queries() {
        let temp = TempDir::new().expect("tmp");
        let path = temp.path().join("calls.jsonl");
        fs::write(&path, ROWS).expect("write");
        let log = FileCallLog::new(&path);

        let all = log.query_page(TypeFilter::All, 0, 10).await.expect("page");
        let ids: Vec<i64> = all.iter().map(|row| row.id).collect();
        assert_eq!(ids, vec![2, 3, 1]);
        assert_eq!(all[0].number, None);

        let missed = log.query_page(TypeFilter::Missed, 0, 10).await.expect("missed");
        assert_eq!(missed.len(), 1);
        assert_eq!(log.query_page(TypeFilter::All, 1, 1).await.expect("skip")[0].id, 3);

        assert_eq!(log.query_recent(2000).await.expect("recent").len(), 2);
        assert_eq!(log.query_by_number("555-0100").await.expect("details").len(), 1);
    }

    #[tokio::test]
    async fn missing_call_log_is_a_query_failure() {
        let temp = TempDir::new().expect("tmp");
        let log = FileCallLog::new(temp.path().join("absent.jsonl"));
        let err = log.query_recent(0).await.unwrap_err();
        assert!(matches!(err, DataSourceError::QueryFailed(_)));
    }

    #[tokio::test]
    async fn contact_lookup_ignores_formatting() {
        let temp = TempDir::new().expect("tmp");
        let path = temp.path().join("contacts.json");
        fs::write(&path, CONTACTS).expect("write");
        let directory = FileContactDirectory::new(&path);

        let alice = directory
            .lookup_by_number("+15550100")
            .await
            .expect("lookup")
            .expect("alice");
        assert_eq!(alice.name, "Alice");
        assert_eq!(alice.photo_ref.as_deref(), Some("alice.png"));
        assert_eq!(directory.lookup_by_number("999").await.expect("lookup"), None);

        let names: Vec<String> = directory
            .list_all()
            .await
            .expect("list")
            .into_iter()
            .map(|contact| contact.display_name)
            .collect();
        assert_eq!(names, vec!["Alice", "bob"]);
    }
}
