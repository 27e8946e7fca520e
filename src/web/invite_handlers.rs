// src/web/invite_handlers.rs
use crate::{
    error::AppResult,
    models::{
        invite::{Invite, InviteForm},
        user::Role,
    },
    state::AppState,
    templates::{render, InvitesPage, NavContext, SelectOption},
    web::{
        feedback::{redirect_error, redirect_success, write_failure, FeedbackParams},
        mw_auth::CurrentUser,
    },
};
use axum::{
    extract::{Extension, Form, Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;

#[derive(Deserialize, Debug)]
pub struct RemoveInviteForm {
    email: String,
}

/// GET /invites
pub async fn list_invites(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Query(params): Query<FeedbackParams>,
) -> AppResult<Response> {
    let mut invites = state.data.invites().as_ref().clone();
    invites.sort_by(|a, b| a.email.cmp(&b.email));

    let page = InvitesPage {
        nav: NavContext::for_user(&user),
        invites,
        roles: SelectOption::roles(Some(Role::Professor)),
        success_message: params.success,
        error_message: params.error,
    };
    Ok(render(&page)?.into_response())
}

/// POST /invites; um novo convite para o mesmo e-mail substitui o anterior.
pub async fn create_invite(State(state): State<AppState>, Form(form): Form<InviteForm>) -> Redirect {
    let email = form.email.trim();
    if email.is_empty() {
        return redirect_error("/invites", "Indique o e-mail.");
    }

    let invite = Invite {
        email: email.to_string(),
        role: form.role,
    };
    match state.data.upsert_invite(&invite).await {
        Ok(()) => {
            tracing::info!("✉️ Convite para '{}' como {}.", invite.email, invite.role.as_str());
            redirect_success("/invites", &format!("Convite enviado para {}.", invite.email))
        }
        Err(e) => redirect_error("/invites", &write_failure(&e)),
    }
}

/// POST /invites/remove
pub async fn remove_invite(State(state): State<AppState>, Form(form): Form<RemoveInviteForm>) -> Redirect {
    match state.data.remove_invite(form.email.trim()).await {
        Ok(()) => redirect_success("/invites", "Convite removido."),
        Err(e) => redirect_error("/invites", &write_failure(&e)),
    }
}
