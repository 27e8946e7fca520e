// src/web/feedback.rs
use crate::error::AppError;
use axum::response::Redirect;
use serde::Deserialize;

// Mensagens de feedback passadas na query string depois de um POST
#[derive(Deserialize, Debug, Default)]
pub struct FeedbackParams {
    pub success: Option<String>,
    pub error: Option<String>,
}

pub fn redirect_success(path: &str, message: &str) -> Redirect {
    Redirect::to(&format!("{}?success={}", path, urlencoding::encode(message)))
}

pub fn redirect_error(path: &str, message: &str) -> Redirect {
    Redirect::to(&format!("{}?error={}", path, urlencoding::encode(message)))
}

/// Caminho `/schools/{id}` com o id codificado (o id pode vir da URL).
pub fn school_path(escola_id: &str) -> String {
    format!("/schools/{}", urlencoding::encode(escola_id))
}

/// Caminho do formulário de edição de um utilizador.
pub fn edit_user_path(escola_id: &str, user_id: &str) -> String {
    format!("{}/users/{}/edit", school_path(escola_id), urlencoding::encode(user_id))
}

/// Mensagem para uma escrita recusada pelo armazenamento.
pub fn write_failure(err: &AppError) -> String {
    match err {
        AppError::ValidationError(message) => message.clone(),
        other => format!("Não foi possível guardar as alterações ({}).", other),
    }
}
