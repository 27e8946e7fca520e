// src/models/user.rs
use crate::models::document::{Collection, Document};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Perfis de acesso (conjunto fechado).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Professor,
    Gestor,
    SuperAdmin,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Professor, Role::Gestor, Role::SuperAdmin];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Professor => "professor",
            Role::Gestor => "gestor",
            Role::SuperAdmin => "super_admin",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Role::Professor => "Professor",
            Role::Gestor => "Gestor",
            Role::SuperAdmin => "Super Admin",
        }
    }

    /// Acesso à gestão de escolas, utilizadores e convites.
    pub fn can_manage_schools(&self) -> bool {
        matches!(self, Role::SuperAdmin)
    }

    /// Acesso às turmas e à chamada.
    pub fn can_take_attendance(&self) -> bool {
        matches!(self, Role::Professor | Role::Gestor)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// Representa um utilizador da coleção 'users'
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    pub nome: String,
    pub role: Role,
    // Opcional apenas para super_admin
    #[serde(default)]
    pub escola_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub must_change_password: Option<bool>,
    pub ativa: bool,
}

impl Document for User {
    const COLLECTION: Collection = Collection::Users;

    fn key(&self) -> &str {
        &self.id
    }
}

// Struct para dados do formulário de login
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

// Formulário de auto-registo
#[derive(Debug, Deserialize)]
pub struct RegisterForm {
    pub nome: String,
    pub email: String,
    #[serde(default)]
    pub escola_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::document::RemoteDocument;
    use serde_json::json;

    fn doc(id: &str, value: serde_json::Value) -> RemoteDocument {
        match value {
            serde_json::Value::Object(map) => RemoteDocument::new(id, map),
            _ => panic!("esperava um objeto"),
        }
    }

    #[test]
    fn decode_merges_remote_id_into_fields() {
        let user = User::decode(&doc(
            "usr-1",
            json!({ "id": "outro", "email": "a@b", "nome": "Ana", "role": "gestor", "escola_id": "esc-1", "ativa": true }),
        ))
        .unwrap();
        assert_eq!(user.id, "usr-1");
        assert_eq!(user.role, Role::Gestor);
        assert_eq!(user.escola_id.as_deref(), Some("esc-1"));
        assert_eq!(user.must_change_password, None);
    }

    #[test]
    fn decode_rejects_unknown_role_and_missing_fields() {
        let unknown = doc("usr-2", json!({ "email": "a@b", "nome": "Ana", "role": "diretor", "ativa": true }));
        assert!(User::decode(&unknown).is_err());

        let missing = doc("usr-3", json!({ "email": "a@b", "role": "professor" }));
        let err = User::decode(&missing).unwrap_err().to_string();
        assert!(err.contains("usr-3"), "{err}");
    }

    #[test]
    fn super_admin_may_omit_school() {
        let user = User::decode(&doc(
            "usr-4",
            json!({ "email": "adm@edusync", "nome": "Admin", "role": "super_admin", "ativa": true }),
        ))
        .unwrap();
        assert_eq!(user.escola_id, None);
        assert!(user.role.can_manage_schools());
        assert!(!user.role.can_take_attendance());
    }

    #[test]
    fn encode_drops_the_key_field() {
        let user = User {
            id: "usr-5".into(),
            email: "p@e".into(),
            nome: "Paula".into(),
            role: Role::Professor,
            escola_id: Some("esc-1".into()),
            must_change_password: None,
            ativa: true,
        };
        let fields = user.encode().unwrap();
        assert!(!fields.contains_key("id"));
        assert_eq!(fields["role"], json!("professor"));
        assert!(!fields.contains_key("must_change_password"));
    }
}
