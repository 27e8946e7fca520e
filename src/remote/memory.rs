// src/remote/memory.rs
use crate::{
    models::document::{Collection, RemoteDocument},
    remote::{
        merge_fields, spawn_snapshot_feed, DocumentStore, RemoteError, Subscription, CHANGE_BUFFER,
    },
};
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::{
    collections::{BTreeMap, HashMap},
    sync::Arc,
};
use tokio::sync::{broadcast, Mutex};

type Documents = HashMap<Collection, BTreeMap<String, Map<String, Value>>>;

/// Armazenamento de documentos em memória (modo demonstração e testes).
///
/// Permite injetar falhas por coleção: enquanto uma falha estiver ativa, as
/// leituras e escritas nessa coleção devolvem o erro configurado.
#[derive(Debug, Clone)]
pub struct InMemoryDocumentStore {
    documents: Arc<Mutex<Documents>>,
    faults: Arc<Mutex<HashMap<Collection, RemoteError>>>,
    changes: broadcast::Sender<Collection>,
}

impl Default for InMemoryDocumentStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        let (changes, _) = broadcast::channel(CHANGE_BUFFER);
        Self {
            documents: Arc::default(),
            faults: Arc::default(),
            changes,
        }
    }

    /// Passa a recusar a coleção com "permissão negada".
    pub async fn deny(&self, collection: Collection) {
        self.inject(collection, RemoteError::PermissionDenied(format!(
            "acesso à coleção '{}' recusado pelas regras",
            collection
        )))
        .await;
    }

    /// Simula a perda de ligação em todas as coleções.
    pub async fn take_offline(&self) {
        for collection in Collection::ALL {
            self.inject(collection, RemoteError::Unavailable("sem ligação".into())).await;
        }
    }

    /// Remove todas as falhas injetadas.
    pub async fn restore(&self) {
        self.faults.lock().await.clear();
    }

    /// Número de feeds de subscrição ainda ativos.
    pub fn listener_count(&self) -> usize {
        self.changes.receiver_count()
    }

    async fn inject(&self, collection: Collection, err: RemoteError) {
        tracing::debug!("Falha injetada em '{}': {}", collection, err);
        self.faults.lock().await.insert(collection, err);
        // Acorda os feeds ativos para que recebam o erro
        let _ = self.changes.send(collection);
    }

    async fn check(&self, collection: Collection) -> Result<(), RemoteError> {
        match self.faults.lock().await.get(&collection) {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    fn subscribe(&self, collection: Collection) -> Subscription {
        let store = self.clone();
        spawn_snapshot_feed(collection, self.changes.subscribe(), move || {
            let store = store.clone();
            async move {
                store.check(collection).await?;
                let documents = store.documents.lock().await;
                let snapshot: Vec<RemoteDocument> = documents
                    .get(&collection)
                    .map(|docs| {
                        docs.iter()
                            .map(|(id, data)| RemoteDocument::new(id.clone(), data.clone()))
                            .collect()
                    })
                    .unwrap_or_default();
                Ok(snapshot)
            }
        })
    }

    async fn set_merge(
        &self,
        collection: Collection,
        id: &str,
        fields: Map<String, Value>,
    ) -> Result<(), RemoteError> {
        self.check(collection).await?;
        {
            let mut documents = self.documents.lock().await;
            let data = documents
                .entry(collection)
                .or_default()
                .entry(id.to_string())
                .or_default();
            merge_fields(data, fields);
        }
        let _ = self.changes.send(collection);
        Ok(())
    }

    async fn delete(&self, collection: Collection, id: &str) -> Result<(), RemoteError> {
        self.check(collection).await?;
        if let Some(docs) = self.documents.lock().await.get_mut(&collection) {
            docs.remove(id);
        }
        let _ = self.changes.send(collection);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fields(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("esperava um objeto"),
        }
    }

    #[tokio::test]
    async fn denied_collection_fails_writes_and_active_feeds() {
        let store = InMemoryDocumentStore::new();
        let mut sub = store.subscribe(Collection::Users);
        assert!(sub.next().await.unwrap().unwrap().is_empty());

        store.deny(Collection::Users).await;
        let event = sub.next().await.unwrap();
        assert!(matches!(event, Err(RemoteError::PermissionDenied(_))));
        assert!(sub.next().await.is_none());

        let write = store
            .set_merge(Collection::Users, "usr-1", fields(json!({ "nome": "Ana" })))
            .await;
        assert!(matches!(write, Err(RemoteError::PermissionDenied(_))));

        // Outras coleções continuam a funcionar
        store
            .set_merge(Collection::Schools, "esc-1", fields(json!({ "nome": "Central" })))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn dropping_the_subscription_stops_the_feed() {
        let store = InMemoryDocumentStore::new();
        let mut sub = store.subscribe(Collection::Lessons);
        sub.next().await.unwrap().unwrap();
        assert_eq!(store.listener_count(), 1);

        drop(sub);
        // O feed só repara no fecho na próxima espera; uma alteração força a verificação
        let _ = store.delete(Collection::Lessons, "nada").await;
        for _ in 0..50 {
            if store.listener_count() == 0 {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        assert_eq!(store.listener_count(), 0);
    }
}
