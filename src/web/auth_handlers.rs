// src/web/auth_handlers.rs
use crate::{
    error::{AppError, AppResult},
    models::user::{LoginForm, RegisterForm},
    services::{
        auth_service::{self, LoginOutcome, Registration},
        session_service::{SessionManager, TowerSessionStorage},
    },
    state::AppState,
    templates::{render, LoginPage, RegisterPage, SelectOption},
    web::feedback::{redirect_error, write_failure, FeedbackParams},
};
use axum::{
    extract::{Form, Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;

#[derive(Deserialize, Debug, Default)]
pub struct LoginParams {
    #[serde(default)]
    email: String,
    success: Option<String>,
    error: Option<String>,
}

// GET /login
pub async fn show_login_form(
    session: Session,
    Query(params): Query<LoginParams>,
) -> AppResult<Response> {
    let manager = SessionManager::new(TowerSessionStorage::new(session));
    if manager.get_session().await.is_some() {
        tracing::debug!("GET /login: Utilizador já logado, redirecionando para /dashboard");
        return Ok(Redirect::to("/dashboard").into_response());
    }

    let page = LoginPage {
        email: params.email,
        error: params.error,
        success: params.success,
    };
    Ok(render(&page)?.into_response())
}

// POST /login
pub async fn handle_login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> AppResult<Response> {
    let email = form.email.trim().to_string();
    tracing::info!("Tentativa de login para: {}", email);

    match auth_service::authenticate(&state.data, &state.passwords, &email, &form.password).await? {
        LoginOutcome::Success(user) => {
            // Gera novo ID de sessão antes de gravar o utilizador
            session
                .cycle_id()
                .await
                .map_err(|e| AppError::SessionError(format!("Falha ao rodar ID: {}", e)))?;
            SessionManager::new(TowerSessionStorage::new(session))
                .set_session(Some(&user))
                .await?;
            Ok(Redirect::to("/dashboard").into_response())
        }
        outcome => {
            let page = LoginPage {
                email,
                error: outcome.message().map(str::to_string),
                success: None,
            };
            Ok(render(&page)?.into_response())
        }
    }
}

// GET /register
pub async fn show_register_form(
    State(state): State<AppState>,
    Query(params): Query<FeedbackParams>,
) -> AppResult<Response> {
    let page = RegisterPage {
        escolas: SelectOption::schools(&state.data.schools(), None),
        error: params.error,
    };
    Ok(render(&page)?.into_response())
}

// POST /register (a senha do formulário não é guardada)
pub async fn handle_register(
    State(state): State<AppState>,
    Form(form): Form<RegisterForm>,
) -> AppResult<Redirect> {
    let registration = Registration {
        nome: form.nome,
        email: form.email,
        escola_id: form.escola_id,
    };

    match auth_service::register(&state.data, registration).await {
        Ok(user) => Ok(Redirect::to(&format!(
            "/login?email={}&success={}",
            urlencoding::encode(&user.email),
            urlencoding::encode("Conta criada. Já pode entrar.")
        ))),
        Err(AppError::ValidationError(message)) => Ok(redirect_error("/register", &message)),
        Err(e) => {
            tracing::error!("Falha no registo: {:?}", e);
            Ok(redirect_error("/register", &write_failure(&e)))
        }
    }
}

// GET /logout
pub async fn handle_logout(session: Session) -> AppResult<Redirect> {
    let manager = SessionManager::new(TowerSessionStorage::new(session));
    match manager.get_session().await {
        Some(user) => tracing::info!("🚪 Utilizador '{}' desligado.", user.email),
        None => tracing::info!("🚪 Sessão anónima desligada."),
    }
    manager.set_session(None).await?;

    Ok(Redirect::to("/login"))
}
