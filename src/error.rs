// src/error.rs
use crate::{models::document::DocumentError, remote::RemoteError};
use axum::{http::StatusCode, response::Html, response::IntoResponse};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Erro na base de dados: {0}")]
    SqlxError(#[from] sqlx::Error),

    #[error("Erro de migração da base de dados: {0}")]
    SqlxMigrateError(#[from] sqlx::migrate::MigrateError),

    #[error("Erro de variável de ambiente: {0}")]
    EnvVarError(#[from] std::env::VarError),

    #[error("Configuração inválida: {0}")]
    ConfigError(String),

    // Falhas do armazenamento de documentos (permissão, ligação, outras)
    #[error("Erro no armazenamento de documentos: {0}")]
    RemoteError(#[from] RemoteError),

    #[error("Documento inválido: {0}")]
    DocumentError(#[from] DocumentError),

    #[error("Erro ao processar password")]
    PasswordHashingError,

    #[error("Erro na sessão: {0}")]
    SessionError(String),

    #[error("Erro ao renderizar página: {0}")]
    TemplateError(#[from] askama::Error),

    // Dados de formulário recusados; a mensagem é mostrada ao utilizador
    #[error("{0}")]
    ValidationError(String),

    #[error("Não encontrado: {0}")]
    NotFound(String),

    #[error("Erro interno inesperado")]
    InternalServerError,

    #[error("Não autorizado")]
    Unauthorized,
}

// Como converter AppError numa resposta HTTP
impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        // Loga o erro detalhado no servidor
        tracing::error!("Erro processado: {:?}", self);

        let (status, user_message) = match &self {
            AppError::SqlxError(_) | AppError::SqlxMigrateError(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Erro ao aceder aos dados.".to_string())
            }
            AppError::EnvVarError(_) | AppError::ConfigError(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Erro de configuração.".to_string())
            }
            AppError::RemoteError(_) => (
                StatusCode::BAD_GATEWAY,
                "Erro ao sincronizar com o armazenamento online. Verifique a sua ligação.".to_string(),
            ),
            AppError::DocumentError(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Registo com formato inválido.".to_string())
            }
            AppError::PasswordHashingError => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Erro ao processar credenciais.".to_string())
            }
            AppError::SessionError(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Erro na gestão da sua sessão.".to_string())
            }
            AppError::ValidationError(message) => (StatusCode::BAD_REQUEST, message.clone()),
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, "Registo não encontrado.".to_string()),
            AppError::Unauthorized => (StatusCode::FORBIDDEN, "Acesso não autorizado.".to_string()),
            AppError::TemplateError(_) | AppError::InternalServerError => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Ocorreu um erro inesperado.".to_string())
            }
        };

        // Página HTML simples; a mensagem é escapada antes de entrar no HTML
        (status, Html(format!(r#"
            <!DOCTYPE html><html><head><title>Erro</title><style>body{{font-family:sans-serif;}}</style></head>
            <body><h1>Erro {status_code}</h1><p>{message}</p><a href="javascript:history.back()">Voltar</a></body></html>
         "#, status_code=status.as_u16(), message=escape_html(&user_message)))).into_response()
    }
}

fn escape_html(raw: &str) -> String {
    raw.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

// Tipo Result padrão para a aplicação
pub type AppResult<T = ()> = Result<T, AppError>;
