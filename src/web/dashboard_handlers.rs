// src/web/dashboard_handlers.rs
use crate::{
    error::AppResult,
    services::dashboard_service::{summarize, DashboardInput, DashboardSummary},
    state::AppState,
    templates::{render, DashboardPage, NavContext},
    web::mw_auth::CurrentUser,
};
use axum::{
    extract::{Extension, State},
    response::{IntoResponse, Response},
};

// GET /dashboard
pub async fn show_dashboard(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> AppResult<Response> {
    let data = &state.data;
    let (escolas, users, turmas) = (data.schools(), data.users(), data.classes());
    let (alunos, aulas, presencas) = (data.students(), data.lessons(), data.attendance());

    let input = DashboardInput {
        escolas: &escolas,
        users: &users,
        turmas: &turmas,
        alunos: &alunos,
        aulas: &aulas,
        presencas: &presencas,
    };

    let mut page = DashboardPage {
        nav: NavContext::for_user(&user),
        global: None,
        escola: None,
        escola_nome: None,
    };
    match summarize(&user, &input) {
        DashboardSummary::Global(global) => page.global = Some(global),
        DashboardSummary::Escola(summary) => {
            page.escola = Some(summary);
            page.escola_nome = user
                .escola_id
                .as_deref()
                .and_then(|id| data.find_school(id))
                .map(|e| e.nome);
        }
    }

    Ok(render(&page)?.into_response())
}
