// src/web/mw_sync.rs
use crate::{
    state::AppState,
    templates::{render, LoadingPage, SyncErrorPage},
};
use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};

// Enquanto a sincronização tiver um erro (ou ainda estiver a carregar) nenhuma página é servida
pub async fn require_sync_ready(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let status = state.data.status();

    if let Some(message) = status.error {
        tracing::debug!("Sync MW: Bloqueado por erro de sincronização: {}", message);
        let page = SyncErrorPage {
            message,
            project_id: state.project_id.to_string(),
        };
        return match render(&page) {
            Ok(html) => (StatusCode::SERVICE_UNAVAILABLE, html).into_response(),
            Err(e) => e.into_response(),
        };
    }

    if status.loading {
        return match render(&LoadingPage { refresh_secs: 1 }) {
            Ok(html) => (StatusCode::SERVICE_UNAVAILABLE, html).into_response(),
            Err(e) => e.into_response(),
        };
    }

    next.run(request).await
}
