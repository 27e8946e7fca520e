// src/services/session_service.rs
use crate::{
    error::{AppError, AppResult},
    models::user::User,
};
use async_trait::async_trait;
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;

/// Chave única onde o registo `{user, timestamp}` é guardado.
pub const SESSION_KEY: &str = "edusync_session";
/// Tempo de vida da sessão desde a última atividade.
pub const SESSION_TTL_HOURS: i64 = 48;

pub fn session_ttl() -> Duration {
    Duration::hours(SESSION_TTL_HOURS)
}

/// Armazenamento local chave/valor (strings), do lado do navegador.
///
/// As leituras nunca falham: qualquer erro é registado e tratado como ausência.
#[async_trait]
pub trait LocalStorage: Send + Sync {
    async fn get_item(&self, key: &str) -> Option<String>;
    async fn set_item(&self, key: &str, value: String) -> AppResult<()>;
    async fn remove_item(&self, key: &str) -> AppResult<()>;
}

/// `LocalStorage` sobre a sessão tower-sessions do navegador atual.
#[derive(Debug, Clone)]
pub struct TowerSessionStorage {
    session: Session,
}

impl TowerSessionStorage {
    pub fn new(session: Session) -> Self {
        Self { session }
    }
}

#[async_trait]
impl LocalStorage for TowerSessionStorage {
    async fn get_item(&self, key: &str) -> Option<String> {
        match self.session.get::<String>(key).await {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!("Valor ilegível na sessão ('{}'): {}", key, e);
                None
            }
        }
    }

    async fn set_item(&self, key: &str, value: String) -> AppResult<()> {
        self.session
            .insert(key, value)
            .await
            .map_err(|e| AppError::SessionError(format!("Falha ao inserir na sessão: {}", e)))
    }

    async fn remove_item(&self, key: &str) -> AppResult<()> {
        self.session
            .remove_value(key)
            .await
            .map(|_| ())
            .map_err(|e| AppError::SessionError(format!("Falha ao remover da sessão: {}", e)))
    }
}

/// Fonte do instante atual, em milissegundos desde a época.
pub trait Clock: Send + Sync {
    fn now_millis(&self) -> i64;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        Utc::now().timestamp_millis()
    }
}

/// Registo persistido: snapshot do utilizador + instante da última atividade.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct SessionRecord {
    user: User,
    timestamp: i64,
}

/// Gestor da sessão local, independente do armazenamento remoto.
pub struct SessionManager<S, C = SystemClock> {
    storage: S,
    clock: C,
}

impl<S: LocalStorage> SessionManager<S> {
    pub fn new(storage: S) -> Self {
        Self::with_clock(storage, SystemClock)
    }
}

impl<S: LocalStorage, C: Clock> SessionManager<S, C> {
    pub fn with_clock(storage: S, clock: C) -> Self {
        Self { storage, clock }
    }

    async fn read_record(&self) -> Option<SessionRecord> {
        let raw = self.storage.get_item(SESSION_KEY).await?;
        match serde_json::from_str::<SessionRecord>(&raw) {
            Ok(record) => Some(record),
            Err(e) => {
                tracing::warn!("Registo de sessão malformado ignorado: {}", e);
                None
            }
        }
    }

    async fn write_record(&self, record: &SessionRecord) -> AppResult<()> {
        let raw = serde_json::to_string(record)
            .map_err(|e| AppError::SessionError(format!("Falha ao serializar sessão: {}", e)))?;
        self.storage.set_item(SESSION_KEY, raw).await
    }

    /// Utilizador da sessão, ou `None` se não houver sessão ou se expirou.
    /// Uma sessão expirada é apagada.
    pub async fn get_session(&self) -> Option<User> {
        let record = self.read_record().await?;

        let age = self.clock.now_millis() - record.timestamp;
        if age > session_ttl().num_milliseconds() {
            tracing::info!("⌛ Sessão de '{}' expirada, a remover.", record.user.email);
            if let Err(e) = self.storage.remove_item(SESSION_KEY).await {
                tracing::warn!("Não foi possível remover a sessão expirada: {:?}", e);
            }
            return None;
        }

        Some(record.user)
    }

    /// `None` limpa a sessão; `Some` grava `{user, timestamp: agora}`.
    pub async fn set_session(&self, user: Option<&User>) -> AppResult<()> {
        match user {
            None => self.storage.remove_item(SESSION_KEY).await,
            Some(user) => {
                let record = SessionRecord {
                    user: user.clone(),
                    timestamp: self.clock.now_millis(),
                };
                self.write_record(&record).await
            }
        }
    }

    /// Renova apenas o timestamp; o snapshot do utilizador fica como estava.
    pub async fn update_session_timestamp(&self) -> AppResult<()> {
        let Some(mut record) = self.read_record().await else {
            return Ok(());
        };
        record.timestamp = self.clock.now_millis();
        self.write_record(&record).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::user::Role;
    use std::{
        collections::HashMap,
        sync::{
            atomic::{AtomicI64, Ordering},
            Arc, Mutex,
        },
    };

    #[derive(Clone, Default)]
    struct MemoryStorage {
        items: Arc<Mutex<HashMap<String, String>>>,
    }

    impl MemoryStorage {
        fn raw(&self) -> Option<String> {
            self.items.lock().unwrap().get(SESSION_KEY).cloned()
        }
    }

    #[async_trait]
    impl LocalStorage for MemoryStorage {
        async fn get_item(&self, key: &str) -> Option<String> {
            self.items.lock().unwrap().get(key).cloned()
        }

        async fn set_item(&self, key: &str, value: String) -> AppResult<()> {
            self.items.lock().unwrap().insert(key.to_string(), value);
            Ok(())
        }

        async fn remove_item(&self, key: &str) -> AppResult<()> {
            self.items.lock().unwrap().remove(key);
            Ok(())
        }
    }

    #[derive(Clone, Default)]
    struct ManualClock(Arc<AtomicI64>);

    impl ManualClock {
        fn advance(&self, by: Duration) {
            self.0.fetch_add(by.num_milliseconds(), Ordering::SeqCst);
        }
    }

    impl Clock for ManualClock {
        fn now_millis(&self) -> i64 {
            self.0.load(Ordering::SeqCst)
        }
    }

    fn professora() -> User {
        User {
            id: "usr-3".into(),
            email: "prof@escola".into(),
            nome: "Maria".into(),
            role: Role::Professor,
            escola_id: Some("esc-1".into()),
            must_change_password: None,
            ativa: true,
        }
    }

    fn manager() -> (SessionManager<MemoryStorage, ManualClock>, MemoryStorage, ManualClock) {
        let storage = MemoryStorage::default();
        let clock = ManualClock::default();
        clock.advance(Duration::days(365));
        (SessionManager::with_clock(storage.clone(), clock.clone()), storage, clock)
    }

    #[tokio::test]
    async fn set_then_get_returns_the_same_user() {
        let (sessions, _, _) = manager();
        sessions.set_session(Some(&professora())).await.unwrap();
        assert_eq!(sessions.get_session().await, Some(professora()));
    }

    #[tokio::test]
    async fn session_survives_until_48_hours() {
        let (sessions, storage, clock) = manager();
        sessions.set_session(Some(&professora())).await.unwrap();

        clock.advance(Duration::hours(47) + Duration::minutes(59));
        assert_eq!(sessions.get_session().await, Some(professora()));
        assert!(storage.raw().is_some());

        // Exatamente 48 h ainda é válida; só expira depois
        clock.advance(Duration::minutes(1));
        assert_eq!(sessions.get_session().await, Some(professora()));

        clock.advance(Duration::milliseconds(1));
        assert_eq!(sessions.get_session().await, None);
        assert!(storage.raw().is_none(), "sessão expirada deve ser apagada");
    }

    #[tokio::test]
    async fn update_timestamp_extends_the_session() {
        let (sessions, _, clock) = manager();
        sessions.set_session(Some(&professora())).await.unwrap();

        clock.advance(Duration::hours(40));
        sessions.update_session_timestamp().await.unwrap();
        clock.advance(Duration::hours(40));
        assert_eq!(sessions.get_session().await, Some(professora()));
    }

    #[tokio::test]
    async fn update_timestamp_without_session_is_a_noop() {
        let (sessions, storage, _) = manager();
        sessions.update_session_timestamp().await.unwrap();
        assert!(storage.raw().is_none());
        assert_eq!(sessions.get_session().await, None);
    }

    #[tokio::test]
    async fn update_timestamp_keeps_the_stored_snapshot() {
        let (sessions, storage, clock) = manager();
        sessions.set_session(Some(&professora())).await.unwrap();
        let before: serde_json::Value = serde_json::from_str(&storage.raw().unwrap()).unwrap();

        clock.advance(Duration::minutes(5));
        sessions.update_session_timestamp().await.unwrap();
        let after: serde_json::Value = serde_json::from_str(&storage.raw().unwrap()).unwrap();

        assert_eq!(before["user"], after["user"]);
        assert_eq!(
            after["timestamp"].as_i64().unwrap() - before["timestamp"].as_i64().unwrap(),
            Duration::minutes(5).num_milliseconds()
        );
    }

    #[tokio::test]
    async fn clearing_the_session_removes_the_record() {
        let (sessions, storage, _) = manager();
        sessions.set_session(Some(&professora())).await.unwrap();
        sessions.set_session(None).await.unwrap();
        assert!(storage.raw().is_none());
        assert_eq!(sessions.get_session().await, None);
    }

    #[tokio::test]
    async fn malformed_record_is_treated_as_absent() {
        let (sessions, storage, _) = manager();
        storage.set_item(SESSION_KEY, "{not json".into()).await.unwrap();
        assert_eq!(sessions.get_session().await, None);

        storage
            .set_item(SESSION_KEY, r#"{"user":{"id":"x"},"timestamp":"ontem"}"#.into())
            .await
            .unwrap();
        assert_eq!(sessions.get_session().await, None);
    }
}
