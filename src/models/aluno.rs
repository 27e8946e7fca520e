// src/models/aluno.rs
use crate::models::document::{Collection, Document};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlunoStatus {
    Ativo,
    #[serde(rename = "Baixa/Transferência")]
    BaixaTransferencia,
    Transferido,
    #[serde(rename = "NCOM")]
    Ncom,
}

impl AlunoStatus {
    pub fn label(&self) -> &'static str {
        match self {
            AlunoStatus::Ativo => "Ativo",
            AlunoStatus::BaixaTransferencia => "Baixa/Transferência",
            AlunoStatus::Transferido => "Transferido",
            AlunoStatus::Ncom => "NCOM",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Aluno {
    pub id: String,
    pub turma_id: String,
    pub nome_completo: String,
    pub numero_chamada: i64,
    pub status: AlunoStatus,
}

impl Document for Aluno {
    const COLLECTION: Collection = Collection::Students;

    fn key(&self) -> &str {
        &self.id
    }
}
