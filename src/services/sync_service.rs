// src/services/sync_service.rs
//! Espelho local das sete coleções remotas.
//!
//! Cada coleção tem uma task listener que recebe snapshots completos do
//! armazenamento remoto, valida cada documento e substitui a lista local
//! inteira (canal `watch`). O estado partilhado (`SyncStatus`) guarda o
//! indicador de carregamento, o primeiro erro e os documentos rejeitados.

use crate::{
    error::AppResult,
    models::{
        aluno::Aluno,
        aula::Aula,
        document::{Collection, Document, RemoteDocument},
        escola::Escola,
        invite::Invite,
        presenca::Presenca,
        turma::Turma,
        user::User,
    },
    remote::{DocumentStore, RemoteError},
};
use futures_util::future::join_all;
use serde_json::{Map, Value};
use std::{
    collections::{BTreeMap, BTreeSet},
    sync::{Arc, Mutex},
};
use tokio::{sync::watch, task::JoinHandle};

/// Estado partilhado da sincronização.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SyncStatus {
    /// Verdadeiro até à primeira entrega (snapshot ou erro) da coleção `users`.
    pub loading: bool,
    /// Primeiro erro observado em qualquer subscrição.
    pub error: Option<String>,
    /// Coleções que já entregaram pelo menos um snapshot.
    pub delivered: BTreeSet<Collection>,
    /// Ids dos documentos rejeitados no último snapshot de cada coleção.
    pub rejected: BTreeMap<Collection, Vec<String>>,
}

impl SyncStatus {
    fn starting() -> Self {
        Self {
            loading: true,
            ..Self::default()
        }
    }

    pub fn is_ready(&self) -> bool {
        !self.loading && self.error.is_none()
    }

    pub fn all_delivered(&self) -> bool {
        self.delivered.len() == Collection::ALL.len()
    }
}

/// Mensagem mostrada ao utilizador para cada classe de falha.
pub fn failure_message(err: &RemoteError, project_id: &str) -> String {
    match err {
        RemoteError::PermissionDenied(_) => format!(
            "Permissão negada pelo armazenamento de documentos do projeto '{}'. \
             Ajuste as regras de acesso (modo de teste) para permitir leitura e escrita.",
            project_id
        ),
        RemoteError::Unavailable(_) => {
            "Não foi possível ligar ao armazenamento de documentos. Verifique a sua ligação à internet."
                .to_string()
        }
        RemoteError::Other(message) => message.clone(),
    }
}

/// Uma lista viva por coleção.
#[derive(Debug)]
pub struct LiveLists {
    users: watch::Sender<Arc<Vec<User>>>,
    schools: watch::Sender<Arc<Vec<Escola>>>,
    classes: watch::Sender<Arc<Vec<Turma>>>,
    students: watch::Sender<Arc<Vec<Aluno>>>,
    lessons: watch::Sender<Arc<Vec<Aula>>>,
    attendance: watch::Sender<Arc<Vec<Presenca>>>,
    invites: watch::Sender<Arc<Vec<Invite>>>,
}

impl LiveLists {
    fn new() -> Self {
        Self {
            users: watch::channel(Arc::default()).0,
            schools: watch::channel(Arc::default()).0,
            classes: watch::channel(Arc::default()).0,
            students: watch::channel(Arc::default()).0,
            lessons: watch::channel(Arc::default()).0,
            attendance: watch::channel(Arc::default()).0,
            invites: watch::channel(Arc::default()).0,
        }
    }
}

/// Liga cada tipo de registo ao seu canal em `LiveLists`.
pub trait Synced: Document {
    fn channel(lists: &LiveLists) -> &watch::Sender<Arc<Vec<Self>>>;
}

impl Synced for User {
    fn channel(lists: &LiveLists) -> &watch::Sender<Arc<Vec<Self>>> {
        &lists.users
    }
}

impl Synced for Escola {
    fn channel(lists: &LiveLists) -> &watch::Sender<Arc<Vec<Self>>> {
        &lists.schools
    }
}

impl Synced for Turma {
    fn channel(lists: &LiveLists) -> &watch::Sender<Arc<Vec<Self>>> {
        &lists.classes
    }
}

impl Synced for Aluno {
    fn channel(lists: &LiveLists) -> &watch::Sender<Arc<Vec<Self>>> {
        &lists.students
    }
}

impl Synced for Aula {
    fn channel(lists: &LiveLists) -> &watch::Sender<Arc<Vec<Self>>> {
        &lists.lessons
    }
}

impl Synced for Presenca {
    fn channel(lists: &LiveLists) -> &watch::Sender<Arc<Vec<Self>>> {
        &lists.attendance
    }
}

impl Synced for Invite {
    fn channel(lists: &LiveLists) -> &watch::Sender<Arc<Vec<Self>>> {
        &lists.invites
    }
}

/// Valida um snapshot: devolve os registos válidos e os ids rejeitados.
pub fn decode_snapshot<T: Document>(docs: &[RemoteDocument]) -> (Vec<T>, Vec<String>) {
    let mut records = Vec::with_capacity(docs.len());
    let mut rejected = Vec::new();
    for doc in docs {
        match T::decode(doc) {
            Ok(record) => records.push(record),
            Err(e) => {
                tracing::warn!("Documento rejeitado: {}", e);
                rejected.push(doc.id.clone());
            }
        }
    }
    (records, rejected)
}

/// Sincronização com o armazenamento remoto. Criada com `start`, terminada
/// com `dispose` (ou ao ser largada).
pub struct SyncService {
    remote: Arc<dyn DocumentStore>,
    project_id: Arc<str>,
    lists: Arc<LiveLists>,
    status: Arc<watch::Sender<SyncStatus>>,
    listeners: Mutex<Vec<JoinHandle<()>>>,
}

impl SyncService {
    /// Abre as sete subscrições. Exige um runtime tokio ativo.
    pub fn start(remote: Arc<dyn DocumentStore>, project_id: impl Into<Arc<str>>) -> Self {
        let service = Self {
            remote,
            project_id: project_id.into(),
            lists: Arc::new(LiveLists::new()),
            status: Arc::new(watch::channel(SyncStatus::starting()).0),
            listeners: Mutex::new(Vec::new()),
        };

        let handles = vec![
            service.listen::<User>(),
            service.listen::<Escola>(),
            service.listen::<Turma>(),
            service.listen::<Aluno>(),
            service.listen::<Aula>(),
            service.listen::<Presenca>(),
            service.listen::<Invite>(),
        ];
        if let Ok(mut listeners) = service.listeners.lock() {
            *listeners = handles;
        }

        tracing::info!("🔄 Sincronização iniciada ({} coleções).", Collection::ALL.len());
        service
    }

    fn listen<T: Synced>(&self) -> JoinHandle<()> {
        let mut subscription = self.remote.subscribe(T::COLLECTION);
        let lists = Arc::clone(&self.lists);
        let status = Arc::clone(&self.status);
        let project_id = Arc::clone(&self.project_id);

        tokio::spawn(async move {
            while let Some(event) = subscription.next().await {
                match event {
                    Ok(docs) => {
                        let (records, rejected) = decode_snapshot::<T>(&docs);
                        tracing::debug!(
                            "Snapshot de '{}': {} registos ({} rejeitados).",
                            T::COLLECTION,
                            records.len(),
                            rejected.len()
                        );
                        T::channel(&lists).send_replace(Arc::new(records));
                        status.send_modify(|s| {
                            s.delivered.insert(T::COLLECTION);
                            if rejected.is_empty() {
                                s.rejected.remove(&T::COLLECTION);
                            } else {
                                s.rejected.insert(T::COLLECTION, rejected);
                            }
                            if T::COLLECTION == Collection::Users {
                                s.loading = false;
                            }
                        });
                    }
                    Err(err) => {
                        tracing::error!("❌ Subscrição de '{}' falhou: {}", T::COLLECTION, err);
                        let message = failure_message(&err, &project_id);
                        status.send_modify(|s| {
                            if s.error.is_none() {
                                s.error = Some(message);
                            }
                            if T::COLLECTION == Collection::Users {
                                s.loading = false;
                            }
                        });
                        break;
                    }
                }
            }
        })
    }

    pub fn status(&self) -> SyncStatus {
        (*self.status.borrow()).clone()
    }

    pub fn watch_status(&self) -> watch::Receiver<SyncStatus> {
        self.status.subscribe()
    }

    /// Lista atual da coleção do tipo `T`.
    pub fn list<T: Synced>(&self) -> Arc<Vec<T>> {
        let current = T::channel(&self.lists).borrow();
        Arc::clone(&*current)
    }

    pub fn watch<T: Synced>(&self) -> watch::Receiver<Arc<Vec<T>>> {
        T::channel(&self.lists).subscribe()
    }

    /// Escrita com merge de campos arbitrários.
    pub async fn upsert_fields(
        &self,
        collection: Collection,
        id: &str,
        fields: Map<String, Value>,
    ) -> AppResult<()> {
        tracing::debug!("Gravando '{}/{}' ({} campos).", collection, id, fields.len());
        self.remote
            .set_merge(collection, id, fields)
            .await
            .map_err(|e| {
                tracing::error!("Erro ao gravar '{}/{}': {}", collection, id, e);
                e.into()
            })
    }

    /// Grava o registo no documento identificado pela sua chave.
    pub async fn upsert<T: Document>(&self, record: &T) -> AppResult<()> {
        let fields = record.encode()?;
        self.upsert_fields(T::COLLECTION, record.key(), fields).await
    }

    pub async fn delete(&self, collection: Collection, id: &str) -> AppResult<()> {
        tracing::debug!("Removendo '{}/{}'.", collection, id);
        self.remote.delete(collection, id).await.map_err(|e| {
            tracing::error!("Erro ao remover '{}/{}': {}", collection, id, e);
            e.into()
        })
    }

    /// Termina todas as subscrições e espera que os listeners acabem.
    pub async fn dispose(&self) {
        let handles = match self.listeners.lock() {
            Ok(mut listeners) => std::mem::take(&mut *listeners),
            Err(_) => return,
        };
        if handles.is_empty() {
            return;
        }
        for handle in &handles {
            handle.abort();
        }
        join_all(handles).await;
        tracing::info!("🛑 Sincronização terminada.");
    }

    pub fn is_disposed(&self) -> bool {
        self.listeners.lock().map(|l| l.is_empty()).unwrap_or(true)
    }
}

impl Drop for SyncService {
    fn drop(&mut self) {
        if let Ok(listeners) = self.listeners.get_mut() {
            for handle in listeners.drain(..) {
                handle.abort();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{models::user::Role, remote::memory::InMemoryDocumentStore};
    use serde_json::json;
    use std::time::Duration;
    use tokio::time::timeout;

    const WAIT: Duration = Duration::from_secs(2);

    fn fields(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("esperava um objeto"),
        }
    }

    fn start(store: &InMemoryDocumentStore) -> SyncService {
        SyncService::start(Arc::new(store.clone()), "edusync-teste")
    }

    async fn wait_status(sync: &SyncService, pred: impl FnMut(&SyncStatus) -> bool) -> SyncStatus {
        let mut rx = sync.watch_status();
        let status: SyncStatus = (*timeout(WAIT, rx.wait_for(pred)).await.unwrap().unwrap()).clone();
        status
    }

    async fn wait_list<T: Synced>(sync: &SyncService, pred: impl FnMut(&Arc<Vec<T>>) -> bool) -> Arc<Vec<T>> {
        let mut rx = sync.watch::<T>();
        let list: Arc<Vec<T>> = Arc::clone(&*timeout(WAIT, rx.wait_for(pred)).await.unwrap().unwrap());
        list
    }

    #[tokio::test]
    async fn loading_clears_after_first_user_snapshot() {
        let store = InMemoryDocumentStore::new();
        let sync = start(&store);

        let status = wait_status(&sync, |s| !s.loading).await;
        assert!(status.error.is_none());
        assert!(status.delivered.contains(&Collection::Users));

        let status = wait_status(&sync, SyncStatus::all_delivered).await;
        assert!(status.is_ready());
    }

    #[tokio::test]
    async fn upsert_then_snapshot_yields_the_record_with_merged_fields() {
        let store = InMemoryDocumentStore::new();
        let sync = start(&store);
        wait_status(&sync, |s| s.delivered.contains(&Collection::Schools)).await;

        sync.upsert_fields(
            Collection::Schools,
            "esc-9",
            fields(json!({ "nome": "Nova", "endereco": "Rua 1", "ativa": true })),
        )
        .await
        .unwrap();
        sync.upsert_fields(Collection::Schools, "esc-9", fields(json!({ "ativa": false })))
            .await
            .unwrap();

        let schools = wait_list::<Escola>(&sync, |l| l.iter().any(|e| e.id == "esc-9" && !e.ativa)).await;
        let escola = schools.iter().find(|e| e.id == "esc-9").unwrap();
        assert_eq!(escola.nome, "Nova");
        assert_eq!(escola.endereco, "Rua 1");
    }

    #[tokio::test]
    async fn delete_then_snapshot_drops_the_record() {
        let store = InMemoryDocumentStore::new();
        let sync = start(&store);
        let user = User {
            id: "usr-7".into(),
            email: "x@escola".into(),
            nome: "X".into(),
            role: Role::Professor,
            escola_id: Some("esc-1".into()),
            must_change_password: None,
            ativa: true,
        };
        sync.upsert(&user).await.unwrap();
        wait_list::<User>(&sync, |l| l.iter().any(|u| u.id == "usr-7")).await;

        sync.delete(Collection::Users, "usr-7").await.unwrap();
        let users = wait_list::<User>(&sync, |l| l.iter().all(|u| u.id != "usr-7")).await;
        assert!(users.is_empty());
    }

    #[tokio::test]
    async fn invalid_documents_are_rejected_and_reported() {
        let store = InMemoryDocumentStore::new();
        store
            .set_merge(Collection::Classes, "tur-1", fields(json!({ "escola_id": "esc-1", "nome": "9º A", "turno": "Manhã" })))
            .await
            .unwrap();
        store
            .set_merge(Collection::Classes, "tur-2", fields(json!({ "nome": "sem escola", "turno": "Madrugada" })))
            .await
            .unwrap();

        let sync = start(&store);
        let status = wait_status(&sync, |s| s.delivered.contains(&Collection::Classes)).await;
        assert_eq!(status.rejected.get(&Collection::Classes), Some(&vec!["tur-2".to_string()]));

        let classes = sync.list::<Turma>();
        assert_eq!(classes.len(), 1);
        assert_eq!(classes[0].id, "tur-1");

        // Corrigido o documento, o registo aparece e a rejeição desaparece
        sync.upsert_fields(Collection::Classes, "tur-2", fields(json!({ "escola_id": "esc-1", "turno": "Noite" })))
            .await
            .unwrap();
        let status = wait_status(&sync, |s| !s.rejected.contains_key(&Collection::Classes)).await;
        assert!(status.rejected.is_empty());
        assert_eq!(sync.list::<Turma>().len(), 2);
    }

    #[tokio::test]
    async fn permission_denied_on_users_blocks_readiness() {
        let store = InMemoryDocumentStore::new();
        store.deny(Collection::Users).await;
        let sync = start(&store);

        let status = wait_status(&sync, |s| s.error.is_some()).await;
        let message = status.error.clone().unwrap();
        assert!(message.contains("regras de acesso"), "{message}");
        assert!(message.contains("edusync-teste"), "{message}");
        assert!(!status.is_ready());

        let status = wait_status(&sync, |s| !s.loading).await;
        assert!(!status.is_ready());
        assert!(!status.delivered.contains(&Collection::Users));
    }

    #[tokio::test]
    async fn first_error_wins() {
        let store = InMemoryDocumentStore::new();
        let sync = start(&store);
        wait_status(&sync, SyncStatus::all_delivered).await;

        store.take_offline().await;
        let status = wait_status(&sync, |s| s.error.is_some()).await;
        assert!(status.error.unwrap().contains("ligação"));

        // Um erro posterior de outro tipo não substitui o primeiro
        store.restore().await;
        store.deny(Collection::Invites).await;
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(sync.status().error.unwrap().contains("ligação"));
    }

    #[tokio::test]
    async fn write_failures_are_returned() {
        let store = InMemoryDocumentStore::new();
        let sync = start(&store);
        store.deny(Collection::Lessons).await;

        let err = sync
            .upsert_fields(Collection::Lessons, "aula-1", fields(json!({ "turma_id": "tur-1" })))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            crate::error::AppError::RemoteError(RemoteError::PermissionDenied(_))
        ));
    }

    #[tokio::test]
    async fn dispose_stops_every_listener() {
        let store = InMemoryDocumentStore::new();
        let sync = start(&store);
        wait_status(&sync, SyncStatus::all_delivered).await;
        assert_eq!(store.listener_count(), Collection::ALL.len());

        sync.dispose().await;
        assert!(sync.is_disposed());
        for _ in 0..50 {
            if store.listener_count() == 0 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(store.listener_count(), 0);
    }
}
