// src/web/class_handlers.rs
use crate::{
    error::{AppError, AppResult},
    models::{presenca::PresencaStatus, turma::Turma, user::User},
    services::attendance_service::{self, Chamada},
    state::AppState,
    templates::{render, AttendancePage, ClassesPage, LinhaChamada, NavContext, TurmaRow},
    web::{
        feedback::{redirect_error, redirect_success, write_failure, FeedbackParams},
        mw_auth::CurrentUser,
    },
};
use axum::{
    extract::{Extension, Form, Path, Query, State},
    response::{IntoResponse, Redirect, Response},
};
use chrono::NaiveDate;
use std::collections::HashMap;

fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

// A turma tem de existir e pertencer à escola do utilizador
fn class_of_user(state: &AppState, user: &User, turma_id: &str) -> AppResult<Turma> {
    let turma = state
        .data
        .find_class(turma_id)
        .ok_or_else(|| AppError::NotFound(format!("turma {}", turma_id)))?;
    if user.escola_id.as_deref() != Some(turma.escola_id.as_str()) {
        tracing::warn!("Turma '{}' fora da escola de {}.", turma.id, user.email);
        return Err(AppError::Unauthorized);
    }
    Ok(turma)
}

/// GET /classes
pub async fn list_classes(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> AppResult<Response> {
    let alunos = state.data.students();
    let mut turmas: Vec<TurmaRow> = state
        .data
        .classes()
        .iter()
        .filter(|t| user.escola_id.as_deref() == Some(t.escola_id.as_str()))
        .map(|t| TurmaRow {
            turno: t.turno.label(),
            alunos: alunos.iter().filter(|a| a.turma_id == t.id).count(),
            turma: t.clone(),
        })
        .collect();
    turmas.sort_by(|a, b| a.turma.nome.cmp(&b.turma.nome));

    let page = ClassesPage {
        escola_nome: user
            .escola_id
            .as_deref()
            .and_then(|id| state.data.find_school(id))
            .map(|e| e.nome),
        nav: NavContext::for_user(&user),
        turmas,
    };
    Ok(render(&page)?.into_response())
}

/// GET /classes/{id}/attendance
pub async fn show_attendance(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(turma_id): Path<String>,
    Query(params): Query<FeedbackParams>,
) -> AppResult<Response> {
    let turma = class_of_user(&state, &user, &turma_id)?;
    let roster = attendance_service::alunos_da_turma(&turma.id, &state.data.students());

    // Todos começam como presentes
    let marcacoes: Vec<_> = roster
        .iter()
        .map(|a| (a.id.clone(), PresencaStatus::Presente))
        .collect();
    let linhas = roster
        .iter()
        .map(|a| LinhaChamada {
            aluno_id: a.id.clone(),
            numero: a.numero_chamada,
            nome: a.nome_completo.clone(),
            situacao: a.status.label(),
            presente: true,
        })
        .collect();

    let page = AttendancePage {
        nav: NavContext::for_user(&user),
        turno: turma.turno.label(),
        turma,
        data_hoje: today().format("%Y-%m-%d").to_string(),
        linhas,
        resumo: attendance_service::resumir(&marcacoes),
        valor_presente: PresencaStatus::Presente.as_str(),
        valor_falta: PresencaStatus::Falta.as_str(),
        success_message: params.success,
        error_message: params.error,
    };
    Ok(render(&page)?.into_response())
}

/// POST /classes/{id}/attendance
///
/// Campos: `data`, `conteudo` e um `p_{aluno_id}` (`presente` | `falta`) por aluno.
/// Alunos sem campo ficam como presentes.
pub async fn save_attendance(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(turma_id): Path<String>,
    Form(form): Form<HashMap<String, String>>,
) -> AppResult<Redirect> {
    let turma = class_of_user(&state, &user, &turma_id)?;
    let back = format!("/classes/{}/attendance", urlencoding::encode(&turma.id));

    let data = match form.get("data").map(|raw| raw.trim()).filter(|raw| !raw.is_empty()) {
        None => today(),
        Some(raw) => match NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
            Ok(date) => date,
            Err(_) => return Ok(redirect_error(&back, "Data inválida.")),
        },
    };

    let marcacoes = attendance_service::alunos_da_turma(&turma.id, &state.data.students())
        .into_iter()
        .map(|aluno| {
            let status = form
                .get(&format!("p_{}", aluno.id))
                .and_then(|raw| PresencaStatus::parse(raw))
                .unwrap_or(PresencaStatus::Presente);
            (aluno.id, status)
        })
        .collect::<Vec<_>>();
    let resumo = attendance_service::resumir(&marcacoes);

    let chamada = Chamada {
        turma_id: turma.id.clone(),
        data,
        conteudo: form.get("conteudo").map(|c| c.trim().to_string()).unwrap_or_default(),
        marcacoes,
    };

    Ok(match attendance_service::registrar_chamada(&state.data, chamada).await {
        Ok(aula) => {
            tracing::info!("📋 Chamada de '{}' em {} guardada por {}.", turma.nome, aula.data, user.email);
            redirect_success(
                &back,
                &format!(
                    "Chamada guardada: {} alunos, {} presentes, {} faltas.",
                    resumo.total, resumo.presentes, resumo.faltas
                ),
            )
        }
        Err(e) => redirect_error(&back, &write_failure(&e)),
    })
}
