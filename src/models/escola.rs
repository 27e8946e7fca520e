// src/models/escola.rs
use crate::models::document::{Collection, Document};
use serde::{Deserialize, Serialize};

/// Unidade escolar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Escola {
    pub id: String,
    pub nome: String,
    #[serde(default)]
    pub endereco: String,
    pub ativa: bool,
}

impl Document for Escola {
    const COLLECTION: Collection = Collection::Schools;

    fn key(&self) -> &str {
        &self.id
    }
}

#[derive(Debug, Deserialize)]
pub struct NovaEscolaForm {
    pub nome: String,
    #[serde(default)]
    pub endereco: String,
}
