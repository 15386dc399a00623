use std::str::FromStr;

use chrono::Utc;
use futures_core::future::BoxFuture;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool};
use sqlx::{query, query_as};

use crate::document::{Document, DocumentStore, Snapshot, StorageError};

/// Document store on top of SQLite: one JSON blob per path plus a version
/// counter that is bumped on every write.
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub async fn connect(database_url: &str) -> Result<Self, StorageError> {
        let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        let pool = SqlitePool::connect_with(options).await?;
        Self::from_pool(pool).await
    }

    pub async fn from_pool(pool: SqlitePool) -> Result<Self, StorageError> {
        sqlx::migrate!().run(&pool).await?;
        Ok(Self { pool })
    }

    async fn fetch(&self, path: &str) -> Result<Snapshot, StorageError> {
        let row: Option<(String, i64)> =
            query_as("SELECT data, version FROM documents WHERE path = ?")
                .bind(path)
                .fetch_optional(&self.pool)
                .await?;

        let Some((data, version)) = row else {
            return Ok(Snapshot::default());
        };

        let document = serde_json::from_str(&data).map_err(|source| StorageError::Malformed {
            path: path.to_owned(),
            source,
        })?;

        Ok(Snapshot {
            document: Some(document),
            version: version as u64,
        })
    }

    async fn write(
        &self,
        path: &str,
        document: &Document,
        precondition: Option<u64>,
    ) -> Result<(), StorageError> {
        let data = serde_json::to_string(document).map_err(|source| StorageError::Malformed {
            path: path.to_owned(),
            source,
        })?;
        let now = Utc::now();

        let rows_affected = match precondition {
            None => query(
                "INSERT INTO documents (path, data, version, updated_at)
                VALUES (?, ?, 1, ?)
                ON CONFLICT(path)
                DO UPDATE SET data = ?, version = documents.version + 1, updated_at = ?",
            )
            .bind(path)
            .bind(&data)
            .bind(now)
            .bind(&data)
            .bind(now)
            .execute(&self.pool)
            .await?
            .rows_affected(),
            Some(0) => query(
                "INSERT INTO documents (path, data, version, updated_at)
                VALUES (?, ?, 1, ?)
                ON CONFLICT(path) DO NOTHING",
            )
            .bind(path)
            .bind(&data)
            .bind(now)
            .execute(&self.pool)
            .await?
            .rows_affected(),
            Some(version) => query(
                "UPDATE documents SET data = ?, version = version + 1, updated_at = ?
                WHERE path = ? AND version = ?",
            )
            .bind(&data)
            .bind(now)
            .bind(path)
            .bind(version as i64)
            .execute(&self.pool)
            .await?
            .rows_affected(),
        };

        if rows_affected == 0 {
            return Err(StorageError::Conflict(path.to_owned()));
        }

        Ok(())
    }
}

impl DocumentStore for SqliteStore {
    fn fetch_document<'a>(&'a self, path: &'a str) -> BoxFuture<'a, Result<Snapshot, StorageError>> {
        Box::pin(self.fetch(path))
    }

    fn write_document<'a>(
        &'a self,
        path: &'a str,
        document: Document,
        precondition: Option<u64>,
    ) -> BoxFuture<'a, Result<(), StorageError>> {
        Box::pin(async move { self.write(path, &document, precondition).await })
    }
}
