// src/models/document.rs
use serde::{de::DeserializeOwned, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

/// As sete coleções do armazenamento de documentos.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Collection {
    Users,
    Schools,
    Classes,
    Students,
    Lessons,
    Attendance,
    Invites,
}

impl Collection {
    pub const ALL: [Collection; 7] = [
        Collection::Users,
        Collection::Schools,
        Collection::Classes,
        Collection::Students,
        Collection::Lessons,
        Collection::Attendance,
        Collection::Invites,
    ];

    /// Nome da coleção no armazenamento remoto.
    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::Users => "users",
            Collection::Schools => "schools",
            Collection::Classes => "classes",
            Collection::Students => "students",
            Collection::Lessons => "lessons",
            Collection::Attendance => "attendance",
            Collection::Invites => "invites",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Documento tal como chega do armazenamento remoto: identificador + campos.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteDocument {
    pub id: String,
    pub data: Map<String, Value>,
}

impl RemoteDocument {
    pub fn new(id: impl Into<String>, data: Map<String, Value>) -> Self {
        Self { id: id.into(), data }
    }
}

#[derive(Error, Debug)]
pub enum DocumentError {
    #[error("documento '{id}' da coleção '{collection}' inválido: {source}")]
    Invalid {
        collection: Collection,
        id: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("registo da coleção '{0}' não serializa para um objeto")]
    NotAnObject(Collection),

    #[error("falha ao serializar registo: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Um registo tipado que vive numa coleção remota.
///
/// O identificador do documento é guardado fora dos campos; na leitura é
/// reposto em `KEY_FIELD` antes da validação pelo serde, substituindo
/// qualquer valor que os campos tragam com o mesmo nome.
pub trait Document: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    const COLLECTION: Collection;
    const KEY_FIELD: &'static str = "id";

    fn key(&self) -> &str;

    fn decode(doc: &RemoteDocument) -> Result<Self, DocumentError> {
        let mut fields = doc.data.clone();
        fields.insert(Self::KEY_FIELD.to_string(), Value::String(doc.id.clone()));
        serde_json::from_value(Value::Object(fields)).map_err(|source| DocumentError::Invalid {
            collection: Self::COLLECTION,
            id: doc.id.clone(),
            source,
        })
    }

    /// Campos a gravar (sem a chave, que vai no identificador do documento).
    fn encode(&self) -> Result<Map<String, Value>, DocumentError> {
        match serde_json::to_value(self)? {
            Value::Object(mut fields) => {
                fields.remove(Self::KEY_FIELD);
                Ok(fields)
            }
            _ => Err(DocumentError::NotAnObject(Self::COLLECTION)),
        }
    }
}

/// Gera um identificador local com prefixo, ex: `usr-3f2a...`.
pub fn new_id(prefix: &str) -> String {
    format!("{}-{}", prefix, Uuid::new_v4().simple())
}
