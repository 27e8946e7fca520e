// src/services/data_service.rs
use crate::{
    error::AppResult,
    models::{
        aluno::Aluno,
        aula::Aula,
        document::Collection,
        escola::Escola,
        invite::Invite,
        presenca::Presenca,
        turma::Turma,
        user::User,
    },
    services::sync_service::{SyncService, SyncStatus},
};
use serde_json::{Map, Value};
use std::sync::Arc;
use tokio::sync::watch;

/// Fachada de dados da aplicação: as sete listas vivas e os verbos de escrita.
/// Não acrescenta regras de negócio.
#[derive(Clone)]
pub struct SchoolData {
    sync: Arc<SyncService>,
}

impl SchoolData {
    pub fn new(sync: Arc<SyncService>) -> Self {
        Self { sync }
    }

    pub fn sync(&self) -> &SyncService {
        &self.sync
    }

    pub fn status(&self) -> SyncStatus {
        self.sync.status()
    }

    pub fn watch_status(&self) -> watch::Receiver<SyncStatus> {
        self.sync.watch_status()
    }

    // --- Leituras ---

    pub fn users(&self) -> Arc<Vec<User>> {
        self.sync.list::<User>()
    }

    pub fn schools(&self) -> Arc<Vec<Escola>> {
        self.sync.list::<Escola>()
    }

    pub fn classes(&self) -> Arc<Vec<Turma>> {
        self.sync.list::<Turma>()
    }

    pub fn students(&self) -> Arc<Vec<Aluno>> {
        self.sync.list::<Aluno>()
    }

    pub fn lessons(&self) -> Arc<Vec<Aula>> {
        self.sync.list::<Aula>()
    }

    pub fn attendance(&self) -> Arc<Vec<Presenca>> {
        self.sync.list::<Presenca>()
    }

    pub fn invites(&self) -> Arc<Vec<Invite>> {
        self.sync.list::<Invite>()
    }

    pub fn find_user(&self, id: &str) -> Option<User> {
        self.users().iter().find(|u| u.id == id).cloned()
    }

    pub fn find_school(&self, id: &str) -> Option<Escola> {
        self.schools().iter().find(|e| e.id == id).cloned()
    }

    pub fn find_class(&self, id: &str) -> Option<Turma> {
        self.classes().iter().find(|t| t.id == id).cloned()
    }

    // --- Escritas ---

    pub async fn upsert_user(&self, user: &User) -> AppResult<()> {
        self.sync.upsert(user).await
    }

    pub async fn delete_user(&self, id: &str) -> AppResult<()> {
        self.sync.delete(Collection::Users, id).await
    }

    pub async fn upsert_school(&self, escola: &Escola) -> AppResult<()> {
        self.sync.upsert(escola).await
    }

    pub async fn upsert_class(&self, turma: &Turma) -> AppResult<()> {
        self.sync.upsert(turma).await
    }

    pub async fn upsert_student(&self, aluno: &Aluno) -> AppResult<()> {
        self.sync.upsert(aluno).await
    }

    pub async fn upsert_lesson(&self, aula: &Aula) -> AppResult<()> {
        self.sync.upsert(aula).await
    }

    pub async fn upsert_attendance(&self, presenca: &Presenca) -> AppResult<()> {
        self.sync.upsert(presenca).await
    }

    /// O e-mail é o identificador do documento; um segundo convite para o
    /// mesmo e-mail substitui o perfil do primeiro.
    pub async fn upsert_invite(&self, invite: &Invite) -> AppResult<()> {
        let mut fields = Map::new();
        fields.insert("role".to_string(), Value::String(invite.role.as_str().to_string()));
        self.sync.upsert_fields(Collection::Invites, &invite.email, fields).await
    }

    pub async fn remove_invite(&self, email: &str) -> AppResult<()> {
        self.sync.delete(Collection::Invites, email).await
    }
}
