// src/models/invite.rs
use crate::models::{
    document::{Collection, Document},
    user::Role,
};
use serde::{Deserialize, Serialize};

/// Convite pendente: o e-mail é o próprio identificador do documento.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Invite {
    pub email: String,
    pub role: Role,
}

impl Document for Invite {
    const COLLECTION: Collection = Collection::Invites;
    const KEY_FIELD: &'static str = "email";

    fn key(&self) -> &str {
        &self.email
    }
}

#[derive(Debug, Deserialize)]
pub struct InviteForm {
    pub email: String,
    pub role: Role,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::document::RemoteDocument;
    use serde_json::{json, Map};

    #[test]
    fn email_comes_from_the_document_id() {
        let mut data = Map::new();
        data.insert("role".into(), json!("gestor"));
        let invite = Invite::decode(&RemoteDocument::new("nova@escola", data)).unwrap();
        assert_eq!(invite.email, "nova@escola");
        assert_eq!(invite.role, Role::Gestor);

        let fields = invite.encode().unwrap();
        assert_eq!(fields.len(), 1);
        assert_eq!(fields["role"], json!("gestor"));
    }
}
