// src/services/attendance_service.rs
use crate::{
    error::AppResult,
    models::{
        aluno::Aluno,
        aula::Aula,
        document::new_id,
        presenca::{Presenca, PresencaStatus},
    },
    services::data_service::SchoolData,
};
use chrono::NaiveDate;

/// Uma chamada a gravar: a aula e a marcação de cada aluno.
#[derive(Debug, Clone)]
pub struct Chamada {
    pub turma_id: String,
    pub data: NaiveDate,
    pub conteudo: String,
    pub marcacoes: Vec<(String, PresencaStatus)>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResumoChamada {
    pub total: usize,
    pub presentes: usize,
    pub faltas: usize,
}

/// Alunos da turma ordenados pelo número de chamada.
pub fn alunos_da_turma(turma_id: &str, alunos: &[Aluno]) -> Vec<Aluno> {
    let mut lista: Vec<Aluno> = alunos.iter().filter(|a| a.turma_id == turma_id).cloned().collect();
    lista.sort_by_key(|a| a.numero_chamada);
    lista
}

pub fn resumir(marcacoes: &[(String, PresencaStatus)]) -> ResumoChamada {
    let presentes = marcacoes
        .iter()
        .filter(|(_, status)| *status == PresencaStatus::Presente)
        .count();
    let total = marcacoes.len();
    ResumoChamada {
        total,
        presentes,
        faltas: total - presentes,
    }
}

/// Grava a aula e depois uma presença por aluno, uma escrita de cada vez.
/// Se uma escrita falhar, as anteriores ficam gravadas (não há rollback).
pub async fn registrar_chamada(data: &SchoolData, chamada: Chamada) -> AppResult<Aula> {
    let aula = Aula {
        id: new_id("aula"),
        turma_id: chamada.turma_id,
        data: chamada.data,
        conteudo: chamada.conteudo,
        chamada_realizada: true,
    };
    data.upsert_lesson(&aula).await?;

    let resumo = resumir(&chamada.marcacoes);
    for (aluno_id, status) in chamada.marcacoes {
        let presenca = Presenca {
            id: new_id("p"),
            aula_id: aula.id.clone(),
            aluno_id,
            status,
        };
        data.upsert_attendance(&presenca).await?;
    }

    tracing::info!(
        "✅ Chamada gravada: aula {} ({} presentes, {} faltas).",
        aula.id,
        resumo.presentes,
        resumo.faltas
    );
    Ok(aula)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        models::{aluno::AlunoStatus, document::Collection},
        remote::memory::InMemoryDocumentStore,
        services::sync_service::SyncService,
    };
    use std::{sync::Arc, time::Duration};

    fn aluno(id: &str, turma_id: &str, numero: i64) -> Aluno {
        Aluno {
            id: id.into(),
            turma_id: turma_id.into(),
            nome_completo: id.into(),
            numero_chamada: numero,
            status: AlunoStatus::Ativo,
        }
    }

    fn chamada() -> Chamada {
        Chamada {
            turma_id: "tur-1".into(),
            data: NaiveDate::from_ymd_opt(2025, 3, 10).unwrap(),
            conteudo: "Frações".into(),
            marcacoes: vec![
                ("alu-1".into(), PresencaStatus::Presente),
                ("alu-2".into(), PresencaStatus::Falta),
                ("alu-3".into(), PresencaStatus::Presente),
            ],
        }
    }

    #[test]
    fn roster_is_filtered_and_sorted_by_roll_number() {
        let alunos = [aluno("c", "tur-1", 3), aluno("x", "tur-2", 1), aluno("a", "tur-1", 1)];
        let ids: Vec<String> = alunos_da_turma("tur-1", &alunos).into_iter().map(|a| a.id).collect();
        assert_eq!(ids, ["a", "c"]);
    }

    #[test]
    fn summary_counts_presences_and_absences() {
        assert_eq!(resumir(&chamada().marcacoes), ResumoChamada { total: 3, presentes: 2, faltas: 1 });
    }

    #[tokio::test]
    async fn saving_writes_one_lesson_and_one_record_per_student() {
        let data = SchoolData::new(Arc::new(SyncService::start(Arc::new(InMemoryDocumentStore::new()), "teste")));
        let aula = registrar_chamada(&data, chamada()).await.unwrap();
        assert!(aula.chamada_realizada);

        let mut rx = data.sync().watch::<Presenca>();
        tokio::time::timeout(Duration::from_secs(2), rx.wait_for(|l| l.len() == 3))
            .await
            .unwrap()
            .unwrap();
        assert!(data.attendance().iter().all(|p| p.aula_id == aula.id));
        assert_eq!(
            data.attendance().iter().filter(|p| p.status == PresencaStatus::Falta).count(),
            1
        );
    }

    #[tokio::test]
    async fn failed_presence_write_keeps_the_lesson() {
        let store = InMemoryDocumentStore::new();
        let data = SchoolData::new(Arc::new(SyncService::start(Arc::new(store.clone()), "teste")));
        store.deny(Collection::Attendance).await;

        assert!(registrar_chamada(&data, chamada()).await.is_err());

        let mut rx = data.sync().watch::<Aula>();
        tokio::time::timeout(Duration::from_secs(2), rx.wait_for(|l| l.len() == 1))
            .await
            .unwrap()
            .unwrap();
        assert!(data.attendance().is_empty());
    }
}
