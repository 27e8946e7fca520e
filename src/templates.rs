// src/templates.rs
use crate::{
    error::AppResult,
    models::{
        escola::Escola,
        invite::Invite,
        turma::Turma,
        user::{Role, User},
    },
    services::{
        attendance_service::ResumoChamada,
        dashboard_service::{GlobalSummary, SchoolSummary},
    },
};
use askama::Template;
use axum::response::Html;

/// Renderiza um template; a falha é registada e devolvida como `AppError`.
pub fn render<T: Template>(template: &T) -> AppResult<Html<String>> {
    match template.render() {
        Ok(html) => Ok(Html(html)),
        Err(e) => {
            tracing::error!("Falha ao renderizar template: {}", e);
            Err(e.into())
        }
    }
}

// Dados do menu lateral, comuns às páginas autenticadas
#[derive(Clone, Debug)]
pub struct NavContext {
    pub nome: String,
    pub role_label: &'static str,
    pub can_manage_schools: bool,
    pub can_take_attendance: bool,
}

impl NavContext {
    pub fn for_user(user: &User) -> Self {
        Self {
            nome: user.nome.clone(),
            role_label: user.role.label(),
            can_manage_schools: user.role.can_manage_schools(),
            can_take_attendance: user.role.can_take_attendance(),
        }
    }
}

/// Opção de um `<select>`.
#[derive(Clone, Debug)]
pub struct SelectOption {
    pub value: String,
    pub label: String,
    pub selected: bool,
}

impl SelectOption {
    pub fn roles(current: Option<Role>) -> Vec<SelectOption> {
        Role::ALL
            .iter()
            .map(|role| SelectOption {
                value: role.as_str().to_string(),
                label: role.label().to_string(),
                selected: Some(*role) == current,
            })
            .collect()
    }

    pub fn schools(escolas: &[Escola], current: Option<&str>) -> Vec<SelectOption> {
        escolas
            .iter()
            .map(|escola| SelectOption {
                value: escola.id.clone(),
                label: escola.nome.clone(),
                selected: Some(escola.id.as_str()) == current,
            })
            .collect()
    }
}

#[derive(Template)]
#[template(path = "login.html")]
pub struct LoginPage {
    pub email: String,
    pub error: Option<String>,
    pub success: Option<String>,
}

#[derive(Template)]
#[template(path = "register.html")]
pub struct RegisterPage {
    pub escolas: Vec<SelectOption>,
    pub error: Option<String>,
}

#[derive(Template)]
#[template(path = "dashboard.html")]
pub struct DashboardPage {
    pub nav: NavContext,
    pub global: Option<GlobalSummary>,
    pub escola: Option<SchoolSummary>,
    pub escola_nome: Option<String>,
}

#[derive(Template)]
#[template(path = "schools.html")]
pub struct SchoolsPage {
    pub nav: NavContext,
    pub escolas: Vec<Escola>,
    pub success_message: Option<String>,
    pub error_message: Option<String>,
}

#[derive(Template)]
#[template(path = "school_detail.html")]
pub struct SchoolDetailPage {
    pub nav: NavContext,
    pub escola: Escola,
    pub users: Vec<User>,
    pub success_message: Option<String>,
    pub error_message: Option<String>,
}

#[derive(Template)]
#[template(path = "edit_user.html")]
pub struct EditUserPage {
    pub nav: NavContext,
    pub escola_id: String,
    pub user: User,
    pub roles: Vec<SelectOption>,
    pub escolas: Vec<SelectOption>,
    pub error_message: Option<String>,
}

/// Linha da lista de turmas.
#[derive(Clone, Debug)]
pub struct TurmaRow {
    pub turma: Turma,
    pub turno: &'static str,
    pub alunos: usize,
}

#[derive(Template)]
#[template(path = "classes.html")]
pub struct ClassesPage {
    pub nav: NavContext,
    pub escola_nome: Option<String>,
    pub turmas: Vec<TurmaRow>,
}

/// Linha do formulário de chamada.
#[derive(Clone, Debug)]
pub struct LinhaChamada {
    pub aluno_id: String,
    pub numero: i64,
    pub nome: String,
    pub situacao: &'static str,
    pub presente: bool,
}

#[derive(Template)]
#[template(path = "attendance.html")]
pub struct AttendancePage {
    pub nav: NavContext,
    pub turma: Turma,
    pub turno: &'static str,
    pub data_hoje: String,
    pub linhas: Vec<LinhaChamada>,
    pub resumo: ResumoChamada,
    // Valores dos botões de rádio, lidos de volta por `PresencaStatus::parse`
    pub valor_presente: &'static str,
    pub valor_falta: &'static str,
    pub success_message: Option<String>,
    pub error_message: Option<String>,
}

#[derive(Template)]
#[template(path = "invites.html")]
pub struct InvitesPage {
    pub nav: NavContext,
    pub invites: Vec<Invite>,
    pub roles: Vec<SelectOption>,
    pub success_message: Option<String>,
    pub error_message: Option<String>,
}

#[derive(Template)]
#[template(path = "sync_error.html")]
pub struct SyncErrorPage {
    pub message: String,
    pub project_id: String,
}

#[derive(Template)]
#[template(path = "loading.html")]
pub struct LoadingPage {
    // Intervalo do meta refresh enquanto a primeira sincronização não chega
    pub refresh_secs: u32,
}
