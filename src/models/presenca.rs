// src/models/presenca.rs
use crate::models::document::{Collection, Document};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PresencaStatus {
    Presente,
    Falta,
}

impl PresencaStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PresencaStatus::Presente => "presente",
            PresencaStatus::Falta => "falta",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "presente" => Some(PresencaStatus::Presente),
            "falta" => Some(PresencaStatus::Falta),
            _ => None,
        }
    }
}

/// Registo de presença/falta de um aluno numa aula.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Presenca {
    pub id: String,
    pub aula_id: String,
    pub aluno_id: String,
    pub status: PresencaStatus,
}

impl Document for Presenca {
    const COLLECTION: Collection = Collection::Attendance;

    fn key(&self) -> &str {
        &self.id
    }
}
