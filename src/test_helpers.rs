use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use futures_core::future::BoxFuture;
use teloxide::types::ChatId;

use crate::document::{Document, DocumentStore, Snapshot, StorageError};
use crate::reply_queue::Transport;

#[derive(Clone, Default)]
pub struct MemoryStore {
    documents: Arc<Mutex<HashMap<String, (Document, u64)>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_document(path: &str, document: serde_json::Value) -> Self {
        let store = Self::new();
        let document = document.as_object().unwrap().clone();
        store
            .documents
            .lock()
            .unwrap()
            .insert(path.to_owned(), (document, 1));
        store
    }

    pub fn fetch(&self, path: &str) -> Snapshot {
        match self.documents.lock().unwrap().get(path) {
            Some((document, version)) => Snapshot {
                document: Some(document.clone()),
                version: *version,
            },
            None => Snapshot::default(),
        }
    }

    pub fn write(
        &self,
        path: &str,
        document: Document,
        precondition: Option<u64>,
    ) -> Result<(), StorageError> {
        let mut documents = self.documents.lock().unwrap();
        let current = documents.get(path).map(|(_, v)| *v).unwrap_or(0);

        if precondition.is_some_and(|expected| expected != current) {
            return Err(StorageError::Conflict(path.to_owned()));
        }

        documents.insert(path.to_owned(), (document, current + 1));
        Ok(())
    }
}

impl DocumentStore for MemoryStore {
    fn fetch_document<'a>(&'a self, path: &'a str) -> BoxFuture<'a, Result<Snapshot, StorageError>> {
        Box::pin(async move { Ok(self.fetch(path)) })
    }

    fn write_document<'a>(
        &'a self,
        path: &'a str,
        document: Document,
        precondition: Option<u64>,
    ) -> BoxFuture<'a, Result<(), StorageError>> {
        Box::pin(async move { self.write(path, document, precondition) })
    }
}

/// Yields to the scheduler after every fetch, so that concurrent
/// read-modify-write sequences interleave.
#[derive(Clone, Default)]
pub struct YieldingStore(pub MemoryStore);

impl DocumentStore for YieldingStore {
    fn fetch_document<'a>(&'a self, path: &'a str) -> BoxFuture<'a, Result<Snapshot, StorageError>> {
        Box::pin(async move {
            let snapshot = self.0.fetch(path);
            tokio::task::yield_now().await;
            Ok(snapshot)
        })
    }

    fn write_document<'a>(
        &'a self,
        path: &'a str,
        document: Document,
        precondition: Option<u64>,
    ) -> BoxFuture<'a, Result<(), StorageError>> {
        Box::pin(async move { self.0.write(path, document, precondition) })
    }
}

pub struct FailingStore;

impl DocumentStore for FailingStore {
    fn fetch_document<'a>(&'a self, _path: &'a str) -> BoxFuture<'a, Result<Snapshot, StorageError>> {
        Box::pin(async { Err(StorageError::Unavailable("offline".to_owned())) })
    }

    fn write_document<'a>(
        &'a self,
        _path: &'a str,
        _document: Document,
        _precondition: Option<u64>,
    ) -> BoxFuture<'a, Result<(), StorageError>> {
        Box::pin(async { Err(StorageError::Unavailable("offline".to_owned())) })
    }
}

/// Every write loses against some other writer.
#[derive(Default)]
pub struct ConflictingStore {
    writes: AtomicUsize,
}

impl ConflictingStore {
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

impl DocumentStore for ConflictingStore {
    fn fetch_document<'a>(&'a self, _path: &'a str) -> BoxFuture<'a, Result<Snapshot, StorageError>> {
        Box::pin(async { Ok(Snapshot::default()) })
    }

    fn write_document<'a>(
        &'a self,
        path: &'a str,
        _document: Document,
        _precondition: Option<u64>,
    ) -> BoxFuture<'a, Result<(), StorageError>> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        Box::pin(async move { Err(StorageError::Conflict(path.to_owned())) })
    }
}

/// Reads from the wrapped store, refuses every write.
#[derive(Clone, Default)]
pub struct ReadOnlyStore(pub MemoryStore);

impl DocumentStore for ReadOnlyStore {
    fn fetch_document<'a>(&'a self, path: &'a str) -> BoxFuture<'a, Result<Snapshot, StorageError>> {
        Box::pin(async move { Ok(self.0.fetch(path)) })
    }

    fn write_document<'a>(
        &'a self,
        _path: &'a str,
        _document: Document,
        _precondition: Option<u64>,
    ) -> BoxFuture<'a, Result<(), StorageError>> {
        Box::pin(async { Err(StorageError::Unavailable("read only".to_owned())) })
    }
}

#[derive(Clone, Default)]
pub struct RecordingTransport {
    sent: Arc<Mutex<Vec<(ChatId, String)>>>,
}

impl RecordingTransport {
    pub fn sent(&self) -> Vec<(ChatId, String)> {
        self.sent.lock().unwrap().clone()
    }
}

impl Transport for RecordingTransport {
    fn send_message(&self, chat_id: ChatId, text: String) {
        self.sent.lock().unwrap().push((chat_id, text));
    }
}
