// src/models/aula.rs
use crate::models::document::{Collection, Document};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Uma aula dada numa turma; `chamada_realizada` indica que a chamada foi feita.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Aula {
    pub id: String,
    pub turma_id: String,
    pub data: NaiveDate, // YYYY-MM-DD
    #[serde(default)]
    pub conteudo: String,
    pub chamada_realizada: bool,
}

impl Document for Aula {
    const COLLECTION: Collection = Collection::Lessons;

    fn key(&self) -> &str {
        &self.id
    }
}
