// src/services/dashboard_service.rs
use crate::models::{
    aluno::Aluno,
    aula::Aula,
    escola::Escola,
    presenca::{Presenca, PresencaStatus},
    turma::Turma,
    user::{Role, User},
};
use std::collections::HashSet;

/// Visão da rede inteira (super_admin).
#[derive(Debug, Clone, PartialEq)]
pub struct GlobalSummary {
    pub total_escolas: usize,
    pub gestores_ativos: usize,
    pub total_alunos: usize,
}

/// Visão da escola do utilizador.
#[derive(Debug, Clone, PartialEq)]
pub struct SchoolSummary {
    pub turmas_ativas: usize,
    pub meus_alunos: usize,
    /// Percentagem de presenças sobre os registos de chamada das turmas da escola.
    pub frequencia_media: Option<f64>,
}

impl SchoolSummary {
    pub fn frequencia_label(&self) -> String {
        match self.frequencia_media {
            Some(rate) => format!("{:.0}%", rate),
            None => "—".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DashboardSummary {
    Global(GlobalSummary),
    Escola(SchoolSummary),
}

/// Dados com que o painel é calculado (as listas vivas do momento).
pub struct DashboardInput<'a> {
    pub escolas: &'a [Escola],
    pub users: &'a [User],
    pub turmas: &'a [Turma],
    pub alunos: &'a [Aluno],
    pub aulas: &'a [Aula],
    pub presencas: &'a [Presenca],
}

pub fn summarize(user: &User, input: &DashboardInput<'_>) -> DashboardSummary {
    if user.role == Role::SuperAdmin {
        return DashboardSummary::Global(GlobalSummary {
            total_escolas: input.escolas.len(),
            gestores_ativos: input
                .users
                .iter()
                .filter(|u| u.role == Role::Gestor && u.ativa)
                .count(),
            total_alunos: input.alunos.len(),
        });
    }

    let escola_id = user.escola_id.as_deref();
    let turma_ids: HashSet<&str> = input
        .turmas
        .iter()
        .filter(|t| Some(t.escola_id.as_str()) == escola_id)
        .map(|t| t.id.as_str())
        .collect();

    DashboardSummary::Escola(SchoolSummary {
        turmas_ativas: turma_ids.len(),
        meus_alunos: school_students(&turma_ids, input.alunos).len(),
        frequencia_media: attendance_rate(&turma_ids, input.aulas, input.presencas),
    })
}

/// Alunos cuja turma pertence ao conjunto; referências pendentes ficam de fora.
pub fn school_students<'a>(turma_ids: &HashSet<&str>, alunos: &'a [Aluno]) -> Vec<&'a Aluno> {
    alunos
        .iter()
        .filter(|a| turma_ids.contains(a.turma_id.as_str()))
        .collect()
}

pub fn attendance_rate(turma_ids: &HashSet<&str>, aulas: &[Aula], presencas: &[Presenca]) -> Option<f64> {
    let aula_ids: HashSet<&str> = aulas
        .iter()
        .filter(|a| turma_ids.contains(a.turma_id.as_str()))
        .map(|a| a.id.as_str())
        .collect();

    let (total, presentes) = presencas
        .iter()
        .filter(|p| aula_ids.contains(p.aula_id.as_str()))
        .fold((0usize, 0usize), |(total, presentes), p| {
            (total + 1, presentes + usize::from(p.status == PresencaStatus::Presente))
        });

    if total == 0 {
        None
    } else {
        Some(presentes as f64 * 100.0 / total as f64)
    }
}
