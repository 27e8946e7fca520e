// src/remote/sqlite.rs
use crate::{
    models::document::{Collection, RemoteDocument},
    remote::{
        merge_fields, spawn_snapshot_feed, DocumentStore, RemoteError, SnapshotEvent, Subscription,
        CHANGE_BUFFER,
    },
};
use async_trait::async_trait;
use chrono::Utc;
use serde_json::{Map, Value};
use sqlx::SqlitePool;
use tokio::sync::broadcast;

/// Armazenamento de documentos sobre a tabela `documents` da base SQLite.
#[derive(Debug, Clone)]
pub struct SqliteDocumentStore {
    pool: SqlitePool,
    changes: broadcast::Sender<Collection>,
}

impl SqliteDocumentStore {
    pub fn new(pool: SqlitePool) -> Self {
        let (changes, _) = broadcast::channel(CHANGE_BUFFER);
        Self { pool, changes }
    }

    async fn load(pool: &SqlitePool, collection: Collection) -> SnapshotEvent {
        let rows: Vec<(String, String)> = sqlx::query_as(
            r#"
            SELECT id, data FROM documents
            WHERE collection = ?1
            ORDER BY id ASC
            "#,
        )
        .bind(collection.as_str())
        .fetch_all(pool)
        .await
        .map_err(classify)?;

        Ok(rows
            .into_iter()
            .map(|(id, raw)| {
                // Dados corrompidos chegam vazios: a validação a jusante rejeita-os
                let data = parse_object(&raw).unwrap_or_else(|| {
                    tracing::warn!("Documento '{}/{}' com JSON inválido.", collection, id);
                    Map::new()
                });
                RemoteDocument::new(id, data)
            })
            .collect())
    }
}

fn parse_object(raw: &str) -> Option<Map<String, Value>> {
    serde_json::from_str::<Map<String, Value>>(raw).ok()
}

/// Mapeia erros do sqlx para a taxonomia do armazenamento remoto.
pub fn classify(err: sqlx::Error) -> RemoteError {
    match &err {
        sqlx::Error::Database(db_err) => {
            // SQLite devolve o código estendido; o byte baixo é o código primário
            let primary = db_err
                .code()
                .and_then(|code| code.parse::<i32>().ok())
                .map(|code| code & 0xff);
            match primary {
                // SQLITE_PERM, SQLITE_READONLY, SQLITE_AUTH
                Some(3) | Some(8) | Some(23) => RemoteError::PermissionDenied(db_err.message().to_string()),
                // SQLITE_CANTOPEN
                Some(14) => RemoteError::Unavailable(db_err.message().to_string()),
                _ => RemoteError::Other(err.to_string()),
            }
        }
        sqlx::Error::Io(_)
        | sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed => RemoteError::Unavailable(err.to_string()),
        _ => RemoteError::Other(err.to_string()),
    }
}

#[async_trait]
impl DocumentStore for SqliteDocumentStore {
    fn subscribe(&self, collection: Collection) -> Subscription {
        let pool = self.pool.clone();
        tracing::debug!("Nova subscrição SQLite para '{}'.", collection);
        spawn_snapshot_feed(collection, self.changes.subscribe(), move || {
            let pool = pool.clone();
            async move { Self::load(&pool, collection).await }
        })
    }

    async fn set_merge(
        &self,
        collection: Collection,
        id: &str,
        fields: Map<String, Value>,
    ) -> Result<(), RemoteError> {
        let mut tx = self.pool.begin().await.map_err(classify)?;

        let existing: Option<String> = sqlx::query_scalar(
            r#"
            SELECT data FROM documents WHERE collection = ?1 AND id = ?2
            "#,
        )
        .bind(collection.as_str())
        .bind(id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(classify)?;

        let mut data = existing.as_deref().and_then(parse_object).unwrap_or_default();
        merge_fields(&mut data, fields);
        let raw = serde_json::to_string(&data).map_err(|e| RemoteError::Other(e.to_string()))?;

        sqlx::query(
            r#"
            INSERT INTO documents (collection, id, data, updated_at)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(collection, id) DO UPDATE SET
               data = excluded.data,
               updated_at = excluded.updated_at
            "#,
        )
        .bind(collection.as_str())
        .bind(id)
        .bind(raw)
        .bind(Utc::now().to_rfc3339())
        .execute(&mut *tx)
        .await
        .map_err(classify)?;

        tx.commit().await.map_err(classify)?;

        // Sem assinantes o envio falha, o que não é problema
        let _ = self.changes.send(collection);
        Ok(())
    }

    async fn delete(&self, collection: Collection, id: &str) -> Result<(), RemoteError> {
        sqlx::query(
            r#"
            DELETE FROM documents WHERE collection = ?1 AND id = ?2
            "#,
        )
        .bind(collection.as_str())
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(classify)?;

        let _ = self.changes.send(collection);
        Ok(())
    }
}
