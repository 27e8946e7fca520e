// src/remote/mod.rs
//! Armazenamento de documentos "remoto": coleções de documentos JSON planos,
//! com subscrições que entregam a coleção inteira a cada alteração.

pub mod memory;
pub mod sqlite;

use crate::models::document::{Collection, RemoteDocument};
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::future::Future;
use thiserror::Error;
use tokio::sync::{broadcast, mpsc};

/// Capacidade do canal de cada subscrição.
pub const SUBSCRIPTION_BUFFER: usize = 16;
/// Capacidade do canal interno de notificações de alteração.
pub const CHANGE_BUFFER: usize = 64;

/// Falhas do armazenamento remoto, já classificadas.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RemoteError {
    #[error("permissão negada: {0}")]
    PermissionDenied(String),

    #[error("serviço indisponível: {0}")]
    Unavailable(String),

    #[error("{0}")]
    Other(String),
}

/// Um snapshot completo da coleção, ou o erro que encerrou a subscrição.
pub type SnapshotEvent = Result<Vec<RemoteDocument>, RemoteError>;

/// Lado recetor de uma subscrição. Largar o valor termina o listener remoto.
#[derive(Debug)]
pub struct Subscription {
    rx: mpsc::Receiver<SnapshotEvent>,
}

impl Subscription {
    pub fn new(rx: mpsc::Receiver<SnapshotEvent>) -> Self {
        Self { rx }
    }

    pub async fn next(&mut self) -> Option<SnapshotEvent> {
        self.rx.recv().await
    }
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Entrega o snapshot inicial e depois um snapshot completo a cada alteração.
    /// Um erro é sempre o último evento. Exige um runtime tokio ativo.
    fn subscribe(&self, collection: Collection) -> Subscription;

    /// Escrita com merge: só os campos indicados são substituídos.
    async fn set_merge(
        &self,
        collection: Collection,
        id: &str,
        fields: Map<String, Value>,
    ) -> Result<(), RemoteError>;

    /// Remove o documento; remover um documento inexistente não é erro.
    async fn delete(&self, collection: Collection, id: &str) -> Result<(), RemoteError>;
}

/// Merge de primeiro nível, como as escritas `merge` do armazenamento remoto.
pub fn merge_fields(target: &mut Map<String, Value>, fields: Map<String, Value>) {
    for (key, value) in fields {
        target.insert(key, value);
    }
}

/// Task comum aos backends: lê a coleção, envia, espera pela próxima alteração.
pub(crate) fn spawn_snapshot_feed<F, Fut>(
    collection: Collection,
    mut changes: broadcast::Receiver<Collection>,
    load: F,
) -> Subscription
where
    F: Fn() -> Fut + Send + 'static,
    Fut: Future<Output = SnapshotEvent> + Send + 'static,
{
    let (tx, rx) = mpsc::channel(SUBSCRIPTION_BUFFER);

    tokio::spawn(async move {
        loop {
            let event = load().await;
            let failed = event.is_err();
            if tx.send(event).await.is_err() {
                tracing::debug!("Subscrição de '{}' largada pelo assinante.", collection);
                return;
            }
            if failed {
                return;
            }

            loop {
                tokio::select! {
                    _ = tx.closed() => return,
                    change = changes.recv() => match change {
                        Ok(changed) if changed == collection => break,
                        Ok(_) => continue,
                        // Perdemos notificações: relê a coleção para não ficar desatualizado
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            tracing::trace!("Feed de '{}' atrasado ({} notificações).", collection, skipped);
                            break;
                        }
                        Err(broadcast::error::RecvError::Closed) => return,
                    },
                }
            }
        }
    });

    Subscription::new(rx)
}
