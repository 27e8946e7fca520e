// src/models/turma.rs
use crate::models::document::{Collection, Document};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Turno {
    #[serde(rename = "Manhã")]
    Manha,
    Tarde,
    Noite,
    Integral,
}

impl Turno {
    pub fn label(&self) -> &'static str {
        match self {
            Turno::Manha => "Manhã",
            Turno::Tarde => "Tarde",
            Turno::Noite => "Noite",
            Turno::Integral => "Integral",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turma {
    pub id: String,
    pub escola_id: String,
    pub nome: String,
    pub turno: Turno,
}

impl Document for Turma {
    const COLLECTION: Collection = Collection::Classes;

    fn key(&self) -> &str {
        &self.id
    }
}
