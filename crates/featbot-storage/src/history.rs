//! JSON-file history store.
//!
//! The file holds one JSON object mapping session IDs to the ordered list of
//! turn records for that session:
//!
//! ```text
//! {
//!     "server_1234": [
//!         { "question": "...", "response": "...", "sources": [ { ... } ] }
//!     ]
//! }
//! ```
//!
//! `load` never fails: a missing, unreadable, or corrupt file is an empty
//! store. `try_load` reports unreadable and corrupt files instead. Writes
//! rewrite the whole document; a corrupt file is replaced, but a file that
//! exists and cannot be read is never overwritten. There is no locking, so
//! only one process may write at a time.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use featbot_core::models::turn::TurnRecord;

use crate::error::StorageError;

type Document = Map<String, Value>;

/// History for a single chat front-end, bound to one default session.
#[derive(Debug, Clone)]
pub struct HistoryStore {
    path: PathBuf,
    session_id: String,
}

impl HistoryStore {
    pub fn new(path: impl Into<PathBuf>, session_id: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            session_id: session_id.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Whether the history file exists on disk.
    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Load the default session's records, keeping only the newest `limit`
    /// when given.
    pub fn load(&self, limit: Option<usize>) -> Vec<TurnRecord> {
        self.load_session(&self.session_id, limit)
    }

    /// Load a session's records, keeping only the newest `limit` when given.
    ///
    /// Entries that are not valid turn records are skipped. A session entry
    /// that is not a list yields no records.
    pub fn load_session(&self, session_id: &str, limit: Option<usize>) -> Vec<TurnRecord> {
        session_records(self.read_document(), session_id, limit)
    }

    /// Like [`load`](Self::load), but an unreadable or corrupt file is an
    /// error instead of an empty history. A missing file is still empty.
    pub fn try_load(&self, limit: Option<usize>) -> Result<Vec<TurnRecord>, StorageError> {
        let document = self.parse_document()?;
        Ok(session_records(document, &self.session_id, limit))
    }

    /// Replace a session's record list wholesale. Other sessions are written
    /// back untouched.
    pub fn save(&self, session_id: &str, records: &[TurnRecord]) -> Result<(), StorageError> {
        let mut document = self.document_for_write()?;
        document.insert(session_id.to_string(), serde_json::to_value(records)?);
        self.write_document(&document)
    }

    /// Append one record to the end of a session's list.
    pub fn append(&self, session_id: &str, record: &TurnRecord) -> Result<(), StorageError> {
        let mut document = self.document_for_write()?;
        let entry = document
            .entry(session_id.to_string())
            .or_insert_with(|| Value::Array(Vec::new()));
        if !entry.is_array() {
            warn!(session_id, "history entry is not a list, replacing it");
            *entry = Value::Array(Vec::new());
        }
        if let Value::Array(entries) = entry {
            entries.push(serde_json::to_value(record)?);
        }
        self.write_document(&document)
    }

    /// Truncate a session to an empty list. The session key is kept.
    pub fn clear(&self, session_id: &str) -> Result<(), StorageError> {
        self.save(session_id, &[])
    }

    /// Missing file is an empty document. Read failures and unparseable
    /// contents are errors.
    fn parse_document(&self) -> Result<Document, StorageError> {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no history file, starting empty");
                return Ok(Document::new());
            }
            Err(source) => {
                return Err(StorageError::Read {
                    path: self.path.clone(),
                    source,
                });
            }
        };

        match serde_json::from_str::<Value>(&contents) {
            Ok(Value::Object(document)) => Ok(document),
            Ok(_) => Err(StorageError::Corrupt {
                path: self.path.clone(),
                reason: "not a JSON object".to_string(),
            }),
            Err(e) => Err(StorageError::Corrupt {
                path: self.path.clone(),
                reason: e.to_string(),
            }),
        }
    }

    fn read_document(&self) -> Document {
        self.parse_document().unwrap_or_else(|e| {
            warn!(error = %e, "failed to load history, starting empty");
            Document::new()
        })
    }

    /// The document a write starts from. A corrupt file is replaced; an
    /// unreadable one is an error and is left on disk as is.
    fn document_for_write(&self) -> Result<Document, StorageError> {
        match self.parse_document() {
            Err(e @ StorageError::Corrupt { .. }) => {
                warn!(error = %e, "overwriting corrupt history file");
                Ok(Document::new())
            }
            other => other,
        }
    }

    /// Pretty-print with a 4-space indent, write to a temp file, then rename
    /// over the original.
    fn write_document(&self, document: &Document) -> Result<(), StorageError> {
        let mut body = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut body, formatter);
        document.serialize(&mut serializer)?;

        let io_err = |source| StorageError::Write {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }

        let tmp_path = self.path.with_extension("json.tmp");
        std::fs::write(&tmp_path, &body).map_err(io_err)?;
        std::fs::rename(&tmp_path, &self.path).map_err(io_err)?;

        debug!(path = %self.path.display(), sessions = document.len(), "history written");
        Ok(())
    }
}

fn session_records(
    mut document: Document,
    session_id: &str,
    limit: Option<usize>,
) -> Vec<TurnRecord> {
    let Some(entry) = document.remove(session_id) else {
        return Vec::new();
    };

    let Value::Array(entries) = entry else {
        warn!(session_id, "history entry is not a list, ignoring");
        return Vec::new();
    };

    let mut records: Vec<TurnRecord> = entries
        .into_iter()
        .filter_map(|entry| match serde_json::from_value(entry) {
            Ok(record) => Some(record),
            Err(e) => {
                debug!(session_id, error = %e, "skipping malformed history entry");
                None
            }
        })
        .collect();

    if let Some(limit) = limit {
        let skip = records.len().saturating_sub(limit);
        records.drain(..skip);
    }

    records
}
