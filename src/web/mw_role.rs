// src/web/mw_role.rs
use crate::{error::AppError, web::mw_auth::CurrentUser};
use axum::{
    extract::{Extension, Request},
    middleware::Next,
    response::Response,
};

/// Escolas, utilizadores e convites: só `super_admin`.
/// Deve ser executado *depois* de `require_auth`.
pub async fn require_super_admin(
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    if user.role.can_manage_schools() {
        Ok(next.run(request).await)
    } else {
        tracing::warn!("Role MW: Acesso negado para {} (perfil {}).", user.email, user.role.as_str());
        Err(AppError::Unauthorized)
    }
}

/// Turmas e chamada: `professor` ou `gestor`.
pub async fn require_class_access(
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    if user.role.can_take_attendance() {
        Ok(next.run(request).await)
    } else {
        tracing::warn!("Role MW: Acesso às turmas negado para {} (perfil {}).", user.email, user.role.as_str());
        Err(AppError::Unauthorized)
    }
}
