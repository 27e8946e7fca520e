// src/web/school_handlers.rs
use crate::{
    error::{AppError, AppResult},
    models::{
        document::new_id,
        escola::{Escola, NovaEscolaForm},
        user::Role,
    },
    state::AppState,
    templates::{render, EditUserPage, NavContext, SchoolDetailPage, SchoolsPage, SelectOption},
    web::{
        feedback::{
            edit_user_path, redirect_error, redirect_success, school_path, write_failure,
            FeedbackParams,
        },
        mw_auth::CurrentUser,
    },
};
use axum::{
    extract::{Extension, Form, Path, Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;

#[derive(Deserialize, Debug)]
pub struct EditUserForm {
    nome: String,
    role: Role,
    #[serde(default)]
    escola_id: String,
}

/// GET /schools
pub async fn list_schools(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Query(params): Query<FeedbackParams>,
) -> AppResult<Response> {
    let mut escolas = state.data.schools().as_ref().clone();
    escolas.sort_by(|a, b| a.nome.cmp(&b.nome));

    let page = SchoolsPage {
        nav: NavContext::for_user(&user),
        escolas,
        success_message: params.success,
        error_message: params.error,
    };
    Ok(render(&page)?.into_response())
}

/// POST /schools
pub async fn create_school(
    State(state): State<AppState>,
    Form(form): Form<NovaEscolaForm>,
) -> Redirect {
    let nome = form.nome.trim();
    if nome.is_empty() {
        return redirect_error("/schools", "Indique o nome da escola.");
    }

    let escola = Escola {
        id: new_id("esc"),
        nome: nome.to_string(),
        endereco: form.endereco.trim().to_string(),
        ativa: true,
    };
    match state.data.upsert_school(&escola).await {
        Ok(()) => {
            tracing::info!("🏫 Escola '{}' criada ({}).", escola.nome, escola.id);
            redirect_success("/schools", &format!("Escola '{}' criada.", escola.nome))
        }
        Err(e) => redirect_error("/schools", &write_failure(&e)),
    }
}

/// GET /schools/{id}
pub async fn show_school(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(escola_id): Path<String>,
    Query(params): Query<FeedbackParams>,
) -> AppResult<Response> {
    let escola = state
        .data
        .find_school(&escola_id)
        .ok_or_else(|| AppError::NotFound(format!("escola {}", escola_id)))?;

    let mut users: Vec<_> = state
        .data
        .users()
        .iter()
        .filter(|u| u.escola_id.as_deref() == Some(escola.id.as_str()))
        .cloned()
        .collect();
    users.sort_by(|a, b| a.nome.cmp(&b.nome));

    let page = SchoolDetailPage {
        nav: NavContext::for_user(&user),
        escola,
        users,
        success_message: params.success,
        error_message: params.error,
    };
    Ok(render(&page)?.into_response())
}

/// POST /schools/{id}/users/{user_id}/toggle
pub async fn toggle_user(
    State(state): State<AppState>,
    Path((escola_id, user_id)): Path<(String, String)>,
) -> AppResult<Redirect> {
    let back = school_path(&escola_id);
    let mut target = state
        .data
        .find_user(&user_id)
        .ok_or_else(|| AppError::NotFound(format!("utilizador {}", user_id)))?;

    target.ativa = !target.ativa;
    Ok(match state.data.upsert_user(&target).await {
        Ok(()) => {
            let estado = if target.ativa { "ativado" } else { "desativado" };
            tracing::info!("Utilizador '{}' {}.", target.email, estado);
            redirect_success(&back, &format!("{} {}.", target.nome, estado))
        }
        Err(e) => redirect_error(&back, &write_failure(&e)),
    })
}

/// POST /schools/{id}/users/{user_id}/delete
pub async fn delete_user(
    State(state): State<AppState>,
    Extension(CurrentUser(current)): Extension<CurrentUser>,
    Path((escola_id, user_id)): Path<(String, String)>,
) -> Redirect {
    let back = school_path(&escola_id);
    if current.id == user_id {
        return redirect_error(&back, "Não pode apagar o seu próprio utilizador.");
    }

    match state.data.delete_user(&user_id).await {
        Ok(()) => {
            tracing::info!("🗑️ Utilizador '{}' apagado.", user_id);
            redirect_success(&back, "Utilizador apagado.")
        }
        Err(e) => redirect_error(&back, &write_failure(&e)),
    }
}

/// GET /schools/{id}/users/{user_id}/edit
pub async fn show_edit_user(
    State(state): State<AppState>,
    Extension(CurrentUser(current)): Extension<CurrentUser>,
    Path((escola_id, user_id)): Path<(String, String)>,
    Query(params): Query<FeedbackParams>,
) -> AppResult<Response> {
    let user = state
        .data
        .find_user(&user_id)
        .ok_or_else(|| AppError::NotFound(format!("utilizador {}", user_id)))?;

    let page = EditUserPage {
        nav: NavContext::for_user(&current),
        escola_id,
        roles: SelectOption::roles(Some(user.role)),
        escolas: SelectOption::schools(&state.data.schools(), user.escola_id.as_deref()),
        user,
        error_message: params.error,
    };
    Ok(render(&page)?.into_response())
}

/// POST /schools/{id}/users/{user_id}/edit
pub async fn handle_edit_user(
    State(state): State<AppState>,
    Path((escola_id, user_id)): Path<(String, String)>,
    Form(form): Form<EditUserForm>,
) -> AppResult<Redirect> {
    let edit_path = edit_user_path(&escola_id, &user_id);
    let mut target = state
        .data
        .find_user(&user_id)
        .ok_or_else(|| AppError::NotFound(format!("utilizador {}", user_id)))?;

    let nome = form.nome.trim();
    let nova_escola = form.escola_id.trim();
    if nome.is_empty() {
        return Ok(redirect_error(&edit_path, "Indique o nome."));
    }
    // Só o super_admin pode ficar sem escola
    if nova_escola.is_empty() && form.role != Role::SuperAdmin {
        return Ok(redirect_error(&edit_path, "Selecione uma escola."));
    }
    if !nova_escola.is_empty() && state.data.find_school(nova_escola).is_none() {
        tracing::warn!("Edição de '{}' recusada: escola '{}' inexistente.", target.email, nova_escola);
        return Ok(redirect_error(&edit_path, "Escola inexistente."));
    }

    target.nome = nome.to_string();
    target.role = form.role;
    target.escola_id = (!nova_escola.is_empty()).then(|| nova_escola.to_string());

    let back = school_path(target.escola_id.as_deref().unwrap_or(&escola_id));
    Ok(match state.data.upsert_user(&target).await {
        Ok(()) => {
            tracing::info!("Utilizador '{}' atualizado ({}).", target.email, target.role.as_str());
            redirect_success(&back, "Utilizador atualizado.")
        }
        Err(e) => redirect_error(&edit_path, &write_failure(&e)),
    })
}
