// src/web/mw_auth.rs
use crate::{
    error::AppError,
    models::user::User,
    services::session_service::{SessionManager, TowerSessionStorage},
};
use axum::{
    extract::Request,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

// Middleware que verifica se existe uma sessão válida (menos de 48 h)
pub async fn require_auth(
    session: Session,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let manager = SessionManager::new(TowerSessionStorage::new(session));

    match manager.get_session().await {
        Some(user) => {
            tracing::debug!(
                "Autenticação MW: '{}' autenticado em {}. Renovando sessão...",
                user.email,
                request.uri().path()
            );
            // Cada navegação renova o timestamp da sessão
            manager.update_session_timestamp().await?;
            request.extensions_mut().insert(CurrentUser(user));
            Ok(next.run(request).await)
        }
        None => {
            tracing::debug!("Autenticação MW: Não autenticado. Redirecionando para /login");
            Ok(Redirect::to("/login").into_response())
        }
    }
}

// Snapshot do utilizador guardado na sessão
#[derive(Clone, Debug)]
pub struct CurrentUser(pub User);
