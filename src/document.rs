use futures_core::future::BoxFuture;
use serde_json::{Map, Value};
use thiserror::Error;

/// A stored document: named fields holding arbitrary JSON values.
pub type Document = Map<String, Value>;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("migration failed: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),
    #[error("malformed document {path}: {source}")]
    Malformed {
        path: String,
        source: serde_json::Error,
    },
    #[error("document {0} was modified concurrently")]
    Conflict(String),
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// A document as read, together with the version it was read at.
///
/// A document that does not exist has version 0.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    pub document: Option<Document>,
    pub version: u64,
}

impl Snapshot {
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.document.as_ref().and_then(|doc| doc.get(name))
    }
}

/// Storage addressed by document path.
///
/// Each individual fetch and write is atomic. Nothing spanning several calls is.
pub trait DocumentStore: Send + Sync {
    fn fetch_document<'a>(&'a self, path: &'a str) -> BoxFuture<'a, Result<Snapshot, StorageError>>;

    /// Replaces the whole document at `path`.
    ///
    /// With `precondition: Some(version)` the write only succeeds if the
    /// stored version still equals `version` (0 meaning "does not exist"),
    /// otherwise it fails with [`StorageError::Conflict`]. `None` overwrites
    /// unconditionally.
    fn write_document<'a>(
        &'a self,
        path: &'a str,
        document: Document,
        precondition: Option<u64>,
    ) -> BoxFuture<'a, Result<(), StorageError>>;
}
