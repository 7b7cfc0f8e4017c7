//! Collaborator interfaces for the call log, contact directory, and dialer.

use crate::model::{ContactRecord, TypeFilter};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Call log type code for incoming calls.
pub const INCOMING_TYPE: i32 = 1;
/// Call log type code for outgoing calls.
pub const OUTGOING_TYPE: i32 = 2;
/// Call log type code for missed calls.
pub const MISSED_TYPE: i32 = 3;

/// Raw call log row as returned by a [`CallLogSource`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallLogRow {
    pub id: i64,
    /// Absent when the provider has no number for the call.
    #[serde(default)]
    pub number: Option<String>,
    pub timestamp_ms: i64,
    pub type_code: i32,
    #[serde(default)]
    pub duration_sec: i64,
}

/// Result of a directory lookup for a single number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactMatch {
    pub name: String,
    #[serde(default)]
    pub photo_ref: Option<String>,
}

/// Failure reported by a call log or contact provider.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DataSourceError {
    /// Read access was revoked or never granted.
    #[error("permission denied: {0}")]
    PermissionDenied(String),
    /// The provider query failed.
    #[error("query failed: {0}")]
    QueryFailed(String),
    /// The provider returned data we could not decode.
    #[error("malformed data: {0}")]
    Malformed(String),
}

/// Ordered call log provider. Every query returns rows newest first.
#[async_trait]
pub trait CallLogSource: Send + Sync {
    /// Rows matching `type_filter`, skipping `offset` and returning at most `limit`.
    async fn query_page(
        &self,
        type_filter: TypeFilter,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<CallLogRow>, DataSourceError>;

    /// All rows at or after `since_ms`.
    async fn query_recent(&self, since_ms: i64) -> Result<Vec<CallLogRow>, DataSourceError>;

    /// All rows for exactly this number.
    async fn query_by_number(&self, number: &str) -> Result<Vec<CallLogRow>, DataSourceError>;
}

/// Contact directory provider.
#[async_trait]
pub trait ContactDirectory: Send + Sync {
    /// Resolve a phone number to a contact, if one exists.
    async fn lookup_by_number(&self, number: &str)
    -> Result<Option<ContactMatch>, DataSourceError>;

    /// Every contact, ordered by display name.
    async fn list_all(&self) -> Result<Vec<ContactRecord>, DataSourceError>;
}

/// Outbound call placement. Fire-and-forget: the outcome is never observed.
pub trait Dialer: Send + Sync {
    fn place_call(&self, number: &str);
}
