// src/services/auth_service.rs
use crate::{
    error::{AppError, AppResult},
    models::{
        document::new_id,
        user::{Role, User},
    },
    services::data_service::SchoolData,
};

/// Verifica se a senha fornecida corresponde ao hash guardado.
pub async fn verify_password(password: &str, stored_hash: &str) -> AppResult<bool> {
    let password = password.to_string();
    let stored_hash = stored_hash.to_string();
    tokio::task::spawn_blocking(move || {
        tracing::debug!("Verificando hash bcrypt...");
        bcrypt::verify(&password, &stored_hash)
    })
    .await
    .map_err(|e| {
        tracing::error!("Erro na task spawn_blocking (verify_password): {:?}", e);
        AppError::InternalServerError
    })?
    .map_err(|e| {
        tracing::error!("Erro bcrypt ao verificar senha: {:?}", e);
        AppError::PasswordHashingError
    })
}

/// Gera um hash bcrypt para uma senha.
pub async fn hash_password(password: &str, cost: u32) -> AppResult<String> {
    let password = password.to_string();
    tokio::task::spawn_blocking(move || {
        tracing::debug!("Gerando hash bcrypt...");
        bcrypt::hash(&password, cost)
    })
    .await
    .map_err(|e| {
        tracing::error!("Erro na task spawn_blocking (hash_password): {:?}", e);
        AppError::InternalServerError
    })?
    .map_err(|e| {
        tracing::error!("Erro bcrypt ao gerar hash: {:?}", e);
        AppError::PasswordHashingError
    })
}

/// Conjunto fixo de senhas de acesso aceites, guardadas só como hash.
#[derive(Debug, Clone)]
pub struct AccessPasswords {
    hashes: Vec<String>,
}

impl AccessPasswords {
    pub async fn from_plain(passwords: &[String], cost: u32) -> AppResult<Self> {
        let mut hashes = Vec::with_capacity(passwords.len());
        for password in passwords {
            hashes.push(hash_password(password, cost).await?);
        }
        Ok(Self { hashes })
    }

    pub async fn accepts(&self, candidate: &str) -> AppResult<bool> {
        for hash in &self.hashes {
            if verify_password(candidate, hash).await? {
                return Ok(true);
            }
        }
        Ok(false)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum LoginOutcome {
    Success(User),
    Inactive,
    InvalidCredentials,
}

impl LoginOutcome {
    /// Mensagem para o formulário de login (sucesso não tem mensagem).
    pub fn message(&self) -> Option<&'static str> {
        match self {
            LoginOutcome::Success(_) => None,
            LoginOutcome::Inactive => Some("Perfil inativo."),
            LoginOutcome::InvalidCredentials => Some("E-mail ou senha inválidos."),
        }
    }
}

/// Procura o e-mail na lista viva de utilizadores e valida a senha de acesso.
pub async fn authenticate(
    data: &SchoolData,
    passwords: &AccessPasswords,
    email: &str,
    password: &str,
) -> AppResult<LoginOutcome> {
    let users = data.users();
    let Some(user) = users.iter().find(|u| u.email == email) else {
        tracing::warn!("Utilizador não encontrado: {}", email);
        return Ok(LoginOutcome::InvalidCredentials);
    };

    if !user.ativa {
        tracing::warn!("Login recusado para perfil inativo: {}", email);
        return Ok(LoginOutcome::Inactive);
    }

    if passwords.accepts(password).await? {
        tracing::info!("✅ Login bem-sucedido para: {}", user.email);
        Ok(LoginOutcome::Success(user.clone()))
    } else {
        tracing::warn!("Senha incorreta para: {}", email);
        Ok(LoginOutcome::InvalidCredentials)
    }
}

#[derive(Debug, Clone)]
pub struct Registration {
    pub nome: String,
    pub email: String,
    pub escola_id: String,
}

/// Auto-registo: o perfil vem do convite pendente para o e-mail (que é
/// consumido), ou `professor` na ausência de convite.
pub async fn register(data: &SchoolData, registration: Registration) -> AppResult<User> {
    let escola_id = registration.escola_id.trim();
    if escola_id.is_empty() {
        return Err(AppError::ValidationError("Selecione uma escola.".to_string()));
    }
    // O id tem de vir da lista viva de escolas (o formulário só oferece essas)
    if !data.schools().iter().any(|e| e.id == escola_id) {
        tracing::warn!("Registo recusado: escola '{}' inexistente.", escola_id);
        return Err(AppError::ValidationError("Escola inexistente.".to_string()));
    }
    let email = registration.email.trim();
    if email.is_empty() || registration.nome.trim().is_empty() {
        return Err(AppError::ValidationError("Preencha o nome e o e-mail.".to_string()));
    }

    let invite = data.invites().iter().find(|i| i.email == email).cloned();
    let role = invite.as_ref().map_or(Role::Professor, |i| i.role);

    let user = User {
        id: new_id("usr"),
        email: email.to_string(),
        nome: registration.nome.trim().to_string(),
        role,
        escola_id: Some(escola_id.to_string()),
        must_change_password: None,
        ativa: true,
    };
    data.upsert_user(&user).await?;

    if let Some(invite) = invite {
        tracing::info!("Convite de '{}' consumido ({}).", invite.email, invite.role.as_str());
        data.remove_invite(&invite.email).await?;
    }

    tracing::info!("✅ Utilizador '{}' registado como {}.", user.email, user.role.as_str());
    Ok(user)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        models::{escola::Escola, invite::Invite},
        remote::memory::InMemoryDocumentStore,
        services::sync_service::SyncService,
    };
    use std::{sync::Arc, time::Duration};
    use tokio::time::timeout;

    const WAIT: Duration = Duration::from_secs(2);

    const TEST_COST: u32 = 4;

    async fn school_data() -> SchoolData {
        let data = SchoolData::new(Arc::new(SyncService::start(Arc::new(InMemoryDocumentStore::new()), "teste")));
        let escola = Escola {
            id: "esc-1".into(),
            nome: "Escola Municipal Central".into(),
            endereco: String::new(),
            ativa: true,
        };
        data.upsert_school(&escola).await.unwrap();
        let mut rx = data.sync().watch::<Escola>();
        timeout(WAIT, rx.wait_for(|l| l.len() == 1)).await.unwrap().unwrap();
        data
    }

    async fn wait_users(data: &SchoolData, pred: impl FnMut(&Arc<Vec<User>>) -> bool) -> Arc<Vec<User>> {
        let mut rx = data.sync().watch::<User>();
        let users: Arc<Vec<User>> = Arc::clone(&*timeout(WAIT, rx.wait_for(pred)).await.unwrap().unwrap());
        users
    }

    async fn wait_invites(data: &SchoolData, pred: impl FnMut(&Arc<Vec<Invite>>) -> bool) {
        let mut rx = data.sync().watch::<Invite>();
        timeout(WAIT, rx.wait_for(pred)).await.unwrap().unwrap();
    }

    fn registration(email: &str) -> Registration {
        Registration {
            nome: "Nova Pessoa".into(),
            email: email.into(),
            escola_id: "esc-1".into(),
        }
    }

    #[tokio::test]
    async fn registration_consumes_a_matching_invite() {
        let data = school_data().await;
        data.upsert_invite(&Invite { email: "gestora@escola".into(), role: Role::Gestor })
            .await
            .unwrap();
        wait_invites(&data, |l| l.len() == 1).await;

        let user = register(&data, registration("gestora@escola")).await.unwrap();
        assert_eq!(user.role, Role::Gestor);
        assert!(user.ativa);
        assert!(user.id.starts_with("usr-"));

        wait_invites(&data, |l| l.is_empty()).await;
        let users = wait_users(&data, |l| !l.is_empty()).await;
        assert_eq!(users[0].email, "gestora@escola");
        assert_eq!(users[0].role, Role::Gestor);
    }

    #[tokio::test]
    async fn registration_without_invite_gets_the_default_role() {
        let data = school_data().await;
        data.upsert_invite(&Invite { email: "outra@escola".into(), role: Role::SuperAdmin })
            .await
            .unwrap();
        wait_invites(&data, |l| l.len() == 1).await;

        let user = register(&data, registration("prof@escola")).await.unwrap();
        assert_eq!(user.role, Role::Professor);
        assert_eq!(user.escola_id.as_deref(), Some("esc-1"));
        // O convite de outro e-mail fica intacto
        assert_eq!(data.invites().len(), 1);
    }

    #[tokio::test]
    async fn registration_requires_a_school() {
        let data = school_data().await;
        let mut reg = registration("prof@escola");
        reg.escola_id = "  ".into();
        let err = register(&data, reg).await.unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
    }

    #[tokio::test]
    async fn registration_rejects_an_unknown_school() {
        let data = school_data().await;
        let mut reg = registration("prof@escola");
        reg.escola_id = "a\nb".into();
        let err = register(&data, reg).await.unwrap_err();
        assert!(matches!(err, AppError::ValidationError(ref m) if m == "Escola inexistente."));
        assert!(data.users().is_empty());
    }

    #[tokio::test]
    async fn login_checks_activity_and_password() {
        let data = school_data().await;
        let passwords = AccessPasswords::from_plain(&["segredo".to_string()], TEST_COST)
            .await
            .unwrap();

        let ativa = register(&data, registration("ativa@escola")).await.unwrap();
        let mut inativa = register(&data, registration("inativa@escola")).await.unwrap();
        inativa.ativa = false;
        data.upsert_user(&inativa).await.unwrap();
        wait_users(&data, |l| l.len() == 2 && l.iter().any(|u| !u.ativa)).await;

        let ok = authenticate(&data, &passwords, "ativa@escola", "segredo").await.unwrap();
        assert_eq!(ok, LoginOutcome::Success(ativa));

        let wrong = authenticate(&data, &passwords, "ativa@escola", "errada").await.unwrap();
        assert_eq!(wrong, LoginOutcome::InvalidCredentials);

        let inactive = authenticate(&data, &passwords, "inativa@escola", "segredo").await.unwrap();
        assert_eq!(inactive.message(), Some("Perfil inativo."));

        let unknown = authenticate(&data, &passwords, "ninguem@escola", "segredo").await.unwrap();
        assert_eq!(unknown, LoginOutcome::InvalidCredentials);
    }
}
