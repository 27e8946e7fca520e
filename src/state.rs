// src/state.rs
use crate::services::{auth_service::AccessPasswords, data_service::SchoolData};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    // Fachada sobre as listas sincronizadas
    pub data: SchoolData,
    pub passwords: Arc<AccessPasswords>,
    // Usado nas mensagens de remediação da página de erro
    pub project_id: Arc<str>,
}

// Permite extrair a fachada diretamente
impl axum::extract::FromRef<AppState> for SchoolData {
    fn from_ref(state: &AppState) -> SchoolData {
        state.data.clone()
    }
}
