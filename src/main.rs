// src/main.rs

// --- Declaração dos Módulos ---
mod config;
mod db;
mod error;
mod models;
mod remote;
mod services;
mod state;
mod templates;
mod web;

// --- Imports ---
use crate::{
    config::{Config, DocumentBackend},
    remote::{memory::InMemoryDocumentStore, sqlite::SqliteDocumentStore, DocumentStore},
    services::{
        auth_service::AccessPasswords, data_service::SchoolData, seed_service,
        sync_service::SyncService,
    },
    state::AppState,
};
use axum::serve;
use std::{env, sync::Arc};
use time::Duration;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tower_sessions::{cookie::Key, ExpiredDeletion, Expiry, SessionManagerLayer};
use tower_sessions_sqlx_store::SqliteStore;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // --- Configuração do Logging (Tracing) ---
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                env::var("RUST_LOG")
                    .unwrap_or_else(|_| "edusync=debug,tower_http=info,sqlx=warn,tower_sessions=info".into())
                    .into()
            }),
        )
        .with(fmt::layer())
        .init();

    tracing::info!("🚀 Iniciando EduSync...");

    let config = Config::from_env().map_err(|e| anyhow::anyhow!("Configuração inválida: {}", e))?;
    tracing::info!(
        "🔧 Projeto '{}' (api key {}, domínio {}), backend {:?}.",
        config.connection.project_id,
        config.connection.masked_api_key(),
        config.connection.auth_domain.as_deref().unwrap_or("(não definido)"),
        config.backend
    );

    // --- Configuração da Base de Dados ---
    let db_pool = match db::create_db_pool(&config.database_url).await {
        Ok(pool) => pool,
        Err(e) => {
            tracing::error!("❌ Falha crítica ao inicializar a base de dados: {}", e);
            return Err(anyhow::anyhow!("Falha ao conectar/migrar DB: {}", e));
        }
    };

    // --- Armazenamento de documentos e sincronização ---
    let remote: Arc<dyn DocumentStore> = match config.backend {
        DocumentBackend::Sqlite => Arc::new(SqliteDocumentStore::new(db_pool.clone())),
        DocumentBackend::Memory => Arc::new(InMemoryDocumentStore::new()),
    };
    let sync = Arc::new(SyncService::start(remote, config.connection.project_id.as_str()));
    let data = SchoolData::new(sync.clone());

    if config.seed_demo {
        seed_service::seed_demo(&data)
            .await
            .map_err(|e| anyhow::anyhow!("Falha ao carregar dados de demonstração: {}", e))?;
    }

    let passwords = AccessPasswords::from_plain(&config.access_passwords, bcrypt::DEFAULT_COST)
        .await
        .map_err(|e| anyhow::anyhow!("Falha ao preparar senhas de acesso: {}", e))?;
    tracing::info!("🔐 {} senha(s) de acesso configurada(s).", config.access_passwords.len());

    // --- Configuração das Sessões ---
    let session_store = SqliteStore::new(db_pool.clone())
        .with_table_name("sessions")
        .map_err(|e| anyhow::anyhow!("Falha ao criar session store: {}", e))?;
    session_store
        .migrate()
        .await
        .map_err(|e| anyhow::anyhow!("Falha ao migrar tabela de sessões: {}", e))?;

    let session_store_clone = session_store.clone();
    tokio::spawn(async move {
        if let Err(e) = session_store_clone
            .continuously_delete_expired(tokio::time::Duration::from_secs(60 * 60))
            .await
        {
            tracing::error!("Erro na task de limpeza de sessões: {:?}", e);
        }
    });
    tracing::info!("🧹 Tarefa de limpeza de sessões iniciada.");

    let key = Key::try_from(config.session_secret.as_bytes())
        .map_err(|e| anyhow::anyhow!("SESSION_SECRET inválida: {}", e))?;

    // A validade de 48 h é verificada pelo SessionManager; a expiração do cookie é o limite exterior
    let session_layer = SessionManagerLayer::new(session_store)
        .with_secure(false)
        .with_http_only(true)
        .with_signed(key)
        .with_expiry(Expiry::OnInactivity(Duration::hours(48)));

    tracing::info!("🔑 Camada de sessão configurada.");

    // --- Criação do Estado da Aplicação ---
    let app_state = AppState {
        data,
        passwords: Arc::new(passwords),
        project_id: Arc::from(config.connection.project_id.as_str()),
    };

    // --- Configuração do Endereço e Listener ---
    let addr = config.bind_addr;
    tracing::info!("📡 Servidor escutando em http://{}", addr);
    let listener = match TcpListener::bind(addr).await {
        Ok(l) => l,
        Err(e) => {
            tracing::error!("❌ Falha ao iniciar listener em {}: {}", addr, e);
            return Err(e.into());
        }
    };

    // --- Criação do Router e Aplicação das Camadas (Middlewares) ---
    tracing::info!("🛠️ Construindo router e aplicando middlewares...");
    let app = web::routes::create_router(app_state).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(session_layer),
    );
    tracing::info!("✅ Router e middlewares configurados.");

    // --- Início do Servidor ---
    tracing::info!("👂 Servidor pronto para aceitar conexões...");
    let served = serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await;

    sync.dispose().await;

    if let Err(e) = served {
        tracing::error!("❌ Erro fatal no servidor: {}", e);
        return Err(e.into());
    }

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Falha ao escutar o sinal de término: {}", e);
        return;
    }
    tracing::info!("⏹️ Sinal de término recebido, encerrando...");
}
