// src/services/seed_service.rs
use crate::{
    error::AppResult,
    models::{
        aluno::{Aluno, AlunoStatus},
        escola::Escola,
        turma::{Turma, Turno},
        user::{Role, User},
    },
    services::data_service::SchoolData,
};

/// Dados de demonstração: duas escolas, um utilizador por perfil, duas turmas e três alunos.
pub async fn seed_demo(data: &SchoolData) -> AppResult<()> {
    tracing::info!("🌱 A carregar dados de demonstração...");

    let escolas = [
        Escola {
            id: "esc-1".into(),
            nome: "Escola Municipal Central".into(),
            endereco: "Rua Principal, 123".into(),
            ativa: true,
        },
        Escola {
            id: "esc-2".into(),
            nome: "Colégio Estadual do Futuro".into(),
            endereco: "Av. Brasil, 456".into(),
            ativa: true,
        },
    ];
    let users = [
        user("usr-1", "admin@edusync", "Administrador", Role::SuperAdmin, None),
        user("usr-2", "gestor@escola", "Gestor da Unidade", Role::Gestor, Some("esc-1")),
        user("usr-3", "prof@escola", "Professora Titular", Role::Professor, Some("esc-1")),
    ];
    let turmas = [
        Turma { id: "tur-1".into(), escola_id: "esc-1".into(), nome: "9º A".into(), turno: Turno::Manha },
        Turma { id: "tur-2".into(), escola_id: "esc-1".into(), nome: "1º Médio B".into(), turno: Turno::Tarde },
    ];
    let alunos = [
        aluno("alu-1", "tur-1", "Ana Silva", 1),
        aluno("alu-2", "tur-1", "Bruno Souza", 2),
        aluno("alu-3", "tur-2", "Carla Dias", 1),
    ];

    for escola in &escolas {
        data.upsert_school(escola).await?;
    }
    for user in &users {
        data.upsert_user(user).await?;
    }
    for turma in &turmas {
        data.upsert_class(turma).await?;
    }
    for aluno in &alunos {
        data.upsert_student(aluno).await?;
    }

    tracing::info!("✅ Dados de demonstração carregados.");
    Ok(())
}

fn user(id: &str, email: &str, nome: &str, role: Role, escola_id: Option<&str>) -> User {
    User {
        id: id.into(),
        email: email.into(),
        nome: nome.into(),
        role,
        escola_id: escola_id.map(str::to_string),
        must_change_password: None,
        ativa: true,
    }
}

fn aluno(id: &str, turma_id: &str, nome: &str, numero: i64) -> Aluno {
    Aluno {
        id: id.into(),
        turma_id: turma_id.into(),
        nome_completo: nome.into(),
        numero_chamada: numero,
        status: AlunoStatus::Ativo,
    }
}
