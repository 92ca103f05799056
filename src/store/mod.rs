// Document store abstraction
//
// Documents live at slash-separated paths such as
// `users/{uid}/journals/{journalId}` and hold a JSON object of fields.
// Writes merge top-level fields: a written field replaces the stored field
// of the same name, unrelated fields are left alone. Every write bumps the
// document version, which callers can use as an optimistic-concurrency
// precondition.

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use thiserror::Error;

mod field;
mod file;
mod memory;

pub use field::{FieldValue, Fields};
pub use file::FileDocumentStore;
pub use memory::MemoryDocumentStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Document not found: {0}")]
    NotFound(String),

    #[error("Write precondition failed for {0}")]
    Conflict(String),

    #[error("Invalid document path: {0}")]
    InvalidPath(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Store task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Slash-separated document location
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DocumentPath {
    segments: Vec<String>,
}

impl DocumentPath {
    /// Build a path from segments
    ///
    /// Segments must be non-blank, must not contain `/`, and must not be
    /// `.` or `..`.
    pub fn new<I, S>(segments: I) -> Result<Self, StoreError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let segments: Vec<String> = segments.into_iter().map(Into::into).collect();

        if segments.is_empty() {
            return Err(StoreError::InvalidPath(String::new()));
        }
        if let Some(bad) = segments.iter().find(|s| !is_valid_segment(s)) {
            return Err(StoreError::InvalidPath(format!(
                "{} (bad segment {:?})",
                segments.join("/"),
                bad
            )));
        }

        Ok(Self { segments })
    }

    /// `users/{uid}/journals/{journal_id}`
    pub fn journal(uid: &str, journal_id: &str) -> Result<Self, StoreError> {
        Self::new(["users", uid, "journals", journal_id])
    }

    /// `users/{uid}/chats/{chat_id}`
    pub fn chat(uid: &str, chat_id: &str) -> Result<Self, StoreError> {
        Self::new(["users", uid, "chats", chat_id])
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }
}

/// Whether `segment` can be used as one component of a document path
pub fn is_valid_segment(segment: &str) -> bool {
    !segment.trim().is_empty() && !segment.contains('/') && segment != "." && segment != ".."
}

impl fmt::Display for DocumentPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join("/"))
    }
}

/// Condition checked atomically with a `set_merge` write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Precondition {
    None,
    /// Fail unless the document does not exist yet
    MustNotExist,
    /// Fail unless the document exists at exactly this version
    Version(u64),
}

/// Document contents at read time
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub fields: Map<String, Value>,
    pub version: u64,
    pub update_time: DateTime<Utc>,
}

impl Snapshot {
    /// Decode one top-level field; `Ok(None)` when it is absent or null
    pub fn field<T: DeserializeOwned>(&self, name: &str) -> Result<Option<T>, StoreError> {
        match self.fields.get(name) {
            None | Some(Value::Null) => Ok(None),
            Some(value) => Ok(Some(serde_json::from_value(value.clone())?)),
        }
    }
}

/// Outcome of a successful write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteResult {
    pub version: u64,
    /// Time substituted for every `ServerTimestamp` in the write
    pub update_time: DateTime<Utc>,
}

/// Persistent document store
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Read a document, `None` if it does not exist
    async fn get(&self, path: &DocumentPath) -> Result<Option<Snapshot>, StoreError>;

    /// Merge fields into an existing document
    ///
    /// Fails with `NotFound` if the document does not exist.
    async fn update(&self, path: &DocumentPath, fields: Fields) -> Result<WriteResult, StoreError>;

    /// Create the document or merge fields into it
    ///
    /// Fails with `Conflict` if `precondition` does not hold.
    async fn set_merge(
        &self,
        path: &DocumentPath,
        fields: Fields,
        precondition: Precondition,
    ) -> Result<WriteResult, StoreError>;
}

/// On-disk and in-memory representation of one document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct StoredDocument {
    pub version: u64,
    pub update_time: DateTime<Utc>,
    pub fields: Map<String, Value>,
}

impl StoredDocument {
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            fields: self.fields.clone(),
            version: self.version,
            update_time: self.update_time,
        }
    }
}

/// Wire format of server-assigned timestamps (RFC 3339, microseconds, `Z`)
pub fn format_timestamp(time: &DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Which kind of write is being applied
#[derive(Debug, Clone, Copy)]
pub(crate) enum WriteMode {
    Update,
    SetMerge(Precondition),
}

/// Check the write against the current document and produce the new one
pub(crate) fn apply_write(
    path: &DocumentPath,
    current: Option<&StoredDocument>,
    fields: Fields,
    mode: WriteMode,
) -> Result<StoredDocument, StoreError> {
    match (mode, current) {
        (WriteMode::Update, None) => return Err(StoreError::NotFound(path.to_string())),
        (WriteMode::SetMerge(Precondition::MustNotExist), Some(_)) => {
            return Err(StoreError::Conflict(path.to_string()))
        }
        (WriteMode::SetMerge(Precondition::Version(expected)), current) => {
            if current.map(|doc| doc.version) != Some(expected) {
                return Err(StoreError::Conflict(path.to_string()));
            }
        }
        _ => {}
    }

    // Truncated so the stored stamp and `update_time` compare equal
    let now = Utc::now().trunc_subsecs(6);
    let stamp = format_timestamp(&now);

    let mut document = current.cloned().unwrap_or_else(|| StoredDocument {
        version: 0,
        update_time: now,
        fields: Map::new(),
    });
    document.fields.extend(field::resolve_fields(fields, &stamp));
    document.version += 1;
    document.update_time = now;

    Ok(document)
}
