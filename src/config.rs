// src/config.rs
use crate::error::{AppError, AppResult};
use std::net::SocketAddr;

/// Backend do armazenamento de documentos.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentBackend {
    Sqlite,
    Memory,
}

/// Parâmetros de ligação do projeto (identificador, chave de API, domínio).
#[derive(Clone)]
pub struct ConnectionParams {
    pub project_id: String,
    pub api_key: Option<String>,
    pub auth_domain: Option<String>,
}

impl ConnectionParams {
    /// Chave de API mascarada para os logs.
    pub fn masked_api_key(&self) -> String {
        match &self.api_key {
            Some(key) if key.chars().count() > 4 => format!("{}…", key.chars().take(4).collect::<String>()),
            Some(_) => "…".to_string(),
            None => "(não definida)".to_string(),
        }
    }
}

pub struct Config {
    pub database_url: String,
    pub backend: DocumentBackend,
    pub connection: ConnectionParams,
    pub session_secret: String,
    pub access_passwords: Vec<String>,
    pub bind_addr: SocketAddr,
    pub seed_demo: bool,
}

impl Config {
    pub fn from_env() -> AppResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Lê a configuração a partir de uma função de consulta (ambiente, testes).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> AppResult<Self> {
        let backend = match lookup("DOCUMENT_BACKEND").as_deref().map(str::trim) {
            None | Some("") | Some("sqlite") => DocumentBackend::Sqlite,
            Some("memory") => DocumentBackend::Memory,
            Some(other) => {
                return Err(AppError::ConfigError(format!("DOCUMENT_BACKEND desconhecido: '{}'", other)));
            }
        };

        // As sessões ficam sempre em SQLite; no modo em memória basta uma base volátil
        let database_url = match (lookup("DATABASE_URL"), backend) {
            (Some(url), _) => url,
            (None, DocumentBackend::Memory) => "sqlite::memory:".to_string(),
            (None, DocumentBackend::Sqlite) => {
                return Err(AppError::ConfigError("DATABASE_URL não definida".to_string()));
            }
        };

        let session_secret = lookup("SESSION_SECRET")
            .ok_or_else(|| AppError::ConfigError("SESSION_SECRET não definida".to_string()))?;
        if session_secret.len() < 64 {
            return Err(AppError::ConfigError(
                "SESSION_SECRET precisa de pelo menos 64 bytes".to_string(),
            ));
        }

        let mut access_passwords = parse_list(lookup("ACCESS_PASSWORDS").as_deref().unwrap_or(""));
        if access_passwords.is_empty() {
            tracing::warn!("⚠️ ACCESS_PASSWORDS não definida, a usar a senha de acesso padrão.");
            access_passwords.push("admin".to_string());
        }

        let bind_addr = lookup("BIND_ADDR")
            .unwrap_or_else(|| "0.0.0.0:3000".to_string())
            .parse::<SocketAddr>()
            .map_err(|e| AppError::ConfigError(format!("BIND_ADDR inválido: {}", e)))?;

        let seed_demo = match lookup("SEED_DEMO") {
            Some(raw) => matches!(raw.trim(), "1" | "true" | "yes"),
            // O modo em memória começa vazio sem os dados de demonstração
            None => backend == DocumentBackend::Memory,
        };

        Ok(Self {
            database_url,
            backend,
            connection: ConnectionParams {
                project_id: lookup("PROJECT_ID").unwrap_or_else(|| "edusync".to_string()),
                api_key: lookup("API_KEY"),
                auth_domain: lookup("AUTH_DOMAIN"),
            },
            session_secret,
            access_passwords,
            bind_addr,
            seed_demo,
        })
    }
}

fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(pairs: &[(&str, &str)]) -> AppResult<Config> {
        let env: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        Config::from_lookup(|key| env.get(key).cloned())
    }

    fn secret() -> String {
        "s".repeat(64)
    }

    #[test]
    fn defaults_apply() {
        let secret = secret();
        let cfg = config(&[("DATABASE_URL", "sqlite://edusync.db"), ("SESSION_SECRET", &secret)]).unwrap();
        assert_eq!(cfg.backend, DocumentBackend::Sqlite);
        assert_eq!(cfg.connection.project_id, "edusync");
        assert_eq!(cfg.access_passwords, vec!["admin".to_string()]);
        assert_eq!(cfg.bind_addr.port(), 3000);
        assert!(!cfg.seed_demo);
    }

    #[test]
    fn memory_backend_seeds_by_default() {
        let secret = secret();
        let cfg = config(&[
            ("SESSION_SECRET", &secret),
            ("DOCUMENT_BACKEND", "memory"),
            ("ACCESS_PASSWORDS", " um, dois ,,"),
        ])
        .unwrap();
        assert_eq!(cfg.backend, DocumentBackend::Memory);
        assert!(cfg.seed_demo);
        assert_eq!(cfg.database_url, "sqlite::memory:");
        assert_eq!(cfg.access_passwords, vec!["um".to_string(), "dois".to_string()]);
    }

    #[test]
    fn short_secret_and_unknown_backend_are_rejected() {
        assert!(matches!(config(&[("SESSION_SECRET", &secret())]), Err(AppError::ConfigError(_))));
        assert!(matches!(
            config(&[("DATABASE_URL", "x"), ("SESSION_SECRET", "curta")]),
            Err(AppError::ConfigError(_))
        ));
        let secret = secret();
        assert!(matches!(
            config(&[("DATABASE_URL", "x"), ("SESSION_SECRET", &secret), ("DOCUMENT_BACKEND", "firestore")]),
            Err(AppError::ConfigError(_))
        ));
    }

    #[test]
    fn api_key_is_masked() {
        let params = ConnectionParams {
            project_id: "p".into(),
            api_key: Some("AIzaSecreta".into()),
            auth_domain: None,
        };
        assert_eq!(params.masked_api_key(), "AIza…");

        let multibyte = ConnectionParams {
            api_key: Some("çãõéíchave".into()),
            ..params
        };
        assert_eq!(multibyte.masked_api_key(), "çãõé…");
    }
}
