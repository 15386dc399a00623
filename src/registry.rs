use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use teloxide::types::ChatId;

use crate::document::{Document, DocumentStore, Snapshot, StorageError};

/// Field of the registry document holding the list of chats.
pub const CHATS_FIELD: &str = "ids";

const MAX_WRITE_ATTEMPTS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatChance {
    pub chat_id: ChatId,
    pub chance: u8,
}

/// The per-chat chances, kept as one list inside a single document.
///
/// Chats without an entry have a chance of 0.
///
/// Every mutation reads the whole list and writes it back. [`upsert`] and
/// [`remove`] write conditionally on the version they read and start over
/// when another writer got in between; [`replace_chats`] overwrites blindly.
///
/// [`upsert`]: ChanceRegistry::upsert
/// [`remove`]: ChanceRegistry::remove
/// [`replace_chats`]: ChanceRegistry::replace_chats
#[derive(Clone)]
pub struct ChanceRegistry {
    store: Arc<dyn DocumentStore>,
    path: String,
}

impl ChanceRegistry {
    pub fn new(store: Arc<dyn DocumentStore>, path: impl Into<String>) -> Self {
        Self {
            store,
            path: path.into(),
        }
    }

    fn decode(&self, snapshot: &Snapshot) -> Result<Vec<ChatChance>, StorageError> {
        match snapshot.field(CHATS_FIELD) {
            None | Some(Value::Null) => Ok(Vec::new()),
            Some(value) => {
                serde_json::from_value(value.clone()).map_err(|source| StorageError::Malformed {
                    path: self.path.clone(),
                    source,
                })
            }
        }
    }

    fn encode(&self, chats: &[ChatChance]) -> Result<Value, StorageError> {
        serde_json::to_value(chats).map_err(|source| StorageError::Malformed {
            path: self.path.clone(),
            source,
        })
    }

    pub async fn list_chats(&self) -> Result<Vec<ChatChance>, StorageError> {
        let snapshot = self.store.fetch_document(&self.path).await?;
        self.decode(&snapshot)
    }

    pub async fn replace_chats(&self, chats: &[ChatChance]) -> Result<(), StorageError> {
        let mut document = Document::new();
        document.insert(CHATS_FIELD.to_owned(), self.encode(chats)?);
        self.store.write_document(&self.path, document, None).await
    }

    pub async fn index_of(&self, chat_id: ChatId) -> Result<Option<usize>, StorageError> {
        let chats = self.list_chats().await?;
        Ok(chats.iter().position(|c| c.chat_id == chat_id))
    }

    pub async fn get_chance_for(&self, chat_id: ChatId) -> Result<u8, StorageError> {
        let chats = self.list_chats().await?;
        Ok(chats
            .iter()
            .find(|c| c.chat_id == chat_id)
            .map_or(0, |c| c.chance))
    }

    /// Puts `record` in front of the list, dropping any older entry for the same chat.
    pub async fn upsert(&self, record: ChatChance) -> Result<(), StorageError> {
        self.modify(|chats| {
            chats.retain(|c| c.chat_id != record.chat_id);
            chats.insert(0, record);
        })
        .await
    }

    pub async fn remove(&self, chat_id: ChatId) -> Result<(), StorageError> {
        self.modify(|chats| chats.retain(|c| c.chat_id != chat_id))
            .await
    }

    async fn modify(&self, f: impl Fn(&mut Vec<ChatChance>)) -> Result<(), StorageError> {
        let mut attempt = 1;
        loop {
            let snapshot = self.store.fetch_document(&self.path).await?;
            let mut chats = self.decode(&snapshot)?;
            f(&mut chats);

            let mut document = snapshot.document.unwrap_or_default();
            document.insert(CHATS_FIELD.to_owned(), self.encode(&chats)?);

            match self
                .store
                .write_document(&self.path, document, Some(snapshot.version))
                .await
            {
                Err(StorageError::Conflict(_)) if attempt < MAX_WRITE_ATTEMPTS => {
                    log::debug!("{}: concurrent write, retrying (attempt {attempt})", self.path);
                    attempt += 1;
                }
                result => return result,
            }
        }
    }
}
